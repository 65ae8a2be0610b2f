//! Share links and public share views.
//!
//! Share links are constructed client-side as
//! `<origin>/share/page/<pageId>` and `<origin>/share/workspace/<workspaceId>`.
//! Resolving a link is the router's job; the data it needs comes from
//! [`load_shared_page`] / [`load_shared_workspace`], which go through the
//! datastore's public-filtered queries — visibility is enforced by the
//! query, not here, so a private entity resolves exactly like a missing one.

use crate::datastore::{AttachmentRecord, Datastore, PageRecord, WorkspaceRecord};
use crate::error::Result;

/// Builder for share URLs against a fixed origin.
#[derive(Debug, Clone)]
pub struct ShareLinks {
    origin: String,
}

impl ShareLinks {
    /// Create a link builder for the given origin (trailing slashes are trimmed).
    pub fn new(origin: impl Into<String>) -> Self {
        let mut origin = origin.into();
        while origin.ends_with('/') {
            origin.pop();
        }
        Self { origin }
    }

    /// The configured origin.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Public URL for a page.
    pub fn page_url(&self, page_id: &str) -> String {
        format!("{}/share/page/{}", self.origin, page_id)
    }

    /// Public URL for a workspace.
    pub fn workspace_url(&self, workspace_id: &str) -> String {
        format!("{}/share/workspace/{}", self.origin, workspace_id)
    }
}

/// A publicly viewable page with its attachments.
#[derive(Debug, Clone)]
pub struct SharedPage {
    /// The page row
    pub page: PageRecord,
    /// Its attachments, in creation order
    pub attachments: Vec<AttachmentRecord>,
}

/// A publicly viewable workspace with its pages.
///
/// The workspace-level flag gates the whole view; page-level flags only
/// gate page share links.
#[derive(Debug, Clone)]
pub struct SharedWorkspace {
    /// The workspace row
    pub workspace: WorkspaceRecord,
    /// Its pages, in creation order
    pub pages: Vec<PageRecord>,
}

/// Load the share view of a page, or `None` when the page is missing or private.
pub async fn load_shared_page(
    datastore: &dyn Datastore,
    page_id: &str,
) -> Result<Option<SharedPage>> {
    let Some(page) = datastore.get_public_page(page_id).await? else {
        return Ok(None);
    };
    let attachments = datastore.list_attachments(&page.id).await?;
    Ok(Some(SharedPage { page, attachments }))
}

/// Load the share view of a workspace, or `None` when it is missing or private.
pub async fn load_shared_workspace(
    datastore: &dyn Datastore,
    workspace_id: &str,
) -> Result<Option<SharedWorkspace>> {
    let Some(workspace) = datastore.get_public_workspace(workspace_id).await? else {
        return Ok(None);
    };
    let pages = datastore.list_pages(&workspace.id).await?;
    Ok(Some(SharedWorkspace { workspace, pages }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datastore::MemoryDatastore;
    use crate::model::PageUpdate;
    use chrono::Utc;
    use futures_lite::future::block_on;

    #[test]
    fn test_url_shapes() {
        let links = ShareLinks::new("https://app.workpad.dev/");
        assert_eq!(
            links.page_url("p1"),
            "https://app.workpad.dev/share/page/p1"
        );
        assert_eq!(
            links.workspace_url("w1"),
            "https://app.workpad.dev/share/workspace/w1"
        );
    }

    #[test]
    fn test_private_page_resolves_like_missing() {
        let ds = MemoryDatastore::new();
        let now = Utc::now();
        block_on(ds.insert_page(&PageRecord {
            id: "p1".into(),
            workspace_id: "w1".into(),
            title: "Todo".into(),
            body: String::new(),
            public: false,
            created_at: now,
        }))
        .unwrap();

        assert!(block_on(load_shared_page(&ds, "p1")).unwrap().is_none());
        assert!(block_on(load_shared_page(&ds, "missing")).unwrap().is_none());

        block_on(ds.update_page("p1", &PageUpdate::new().public(true))).unwrap();
        let shared = block_on(load_shared_page(&ds, "p1")).unwrap().unwrap();
        assert_eq!(shared.page.title, "Todo");
        assert!(shared.attachments.is_empty());
    }
}
