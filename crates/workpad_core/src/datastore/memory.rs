//! In-memory datastore implementation for testing and development.
//!
//! This provides a simple in-memory implementation of [`Datastore`] for use
//! in unit tests and development. Write and page-list failures can be
//! injected to exercise the store's remote-failure semantics.

use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};

use super::{AttachmentRecord, BoxFuture, Datastore, DatastoreResult, PageRecord, WorkspaceRecord};
use crate::error::WorkpadError;
use crate::model::PageUpdate;

/// In-memory datastore for testing.
///
/// All rows live in `RwLock`'d vectors and are lost when dropped. The
/// failure switches simulate an unreachable remote store.
#[derive(Debug, Default)]
pub struct MemoryDatastore {
    workspaces: RwLock<Vec<WorkspaceRecord>>,
    pages: RwLock<Vec<PageRecord>>,
    attachments: RwLock<Vec<AttachmentRecord>>,

    /// When set, every mutating call fails
    fail_writes: AtomicBool,
    /// When set, `list_pages` fails for this workspace id
    fail_pages_for: RwLock<Option<String>>,
}

impl MemoryDatastore {
    /// Create a new empty in-memory datastore.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent mutating call fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make `list_pages` fail for the given workspace id, or clear with `None`.
    pub fn set_fail_pages_for(&self, workspace_id: Option<&str>) {
        *self.fail_pages_for.write().unwrap() = workspace_id.map(str::to_string);
    }

    /// Number of workspace rows currently stored (test inspection).
    pub fn workspace_count(&self) -> usize {
        self.workspaces.read().unwrap().len()
    }

    /// Number of page rows currently stored (test inspection).
    pub fn page_count(&self) -> usize {
        self.pages.read().unwrap().len()
    }

    /// Number of attachment rows currently stored (test inspection).
    pub fn attachment_count(&self) -> usize {
        self.attachments.read().unwrap().len()
    }

    fn check_writable(&self) -> DatastoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(WorkpadError::Storage(
                "simulated datastore write failure".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

fn by_created_at<T, F: Fn(&T) -> DateTime<Utc>>(rows: &mut [T], key: F) {
    rows.sort_by_key(|r| key(r));
}

impl Datastore for MemoryDatastore {
    fn list_workspaces<'a>(
        &'a self,
        user_id: &'a str,
    ) -> BoxFuture<'a, DatastoreResult<Vec<WorkspaceRecord>>> {
        Box::pin(async move {
            let workspaces = self.workspaces.read().unwrap();
            let mut rows: Vec<WorkspaceRecord> = workspaces
                .iter()
                .filter(|w| w.user_id == user_id)
                .cloned()
                .collect();
            by_created_at(&mut rows, |w| w.created_at);
            Ok(rows)
        })
    }

    fn insert_workspace<'a>(
        &'a self,
        record: &'a WorkspaceRecord,
    ) -> BoxFuture<'a, DatastoreResult<()>> {
        Box::pin(async move {
            self.check_writable()?;
            self.workspaces.write().unwrap().push(record.clone());
            Ok(())
        })
    }

    fn update_workspace_name<'a>(
        &'a self,
        id: &'a str,
        name: &'a str,
        updated_at: DateTime<Utc>,
    ) -> BoxFuture<'a, DatastoreResult<()>> {
        Box::pin(async move {
            self.check_writable()?;
            let mut workspaces = self.workspaces.write().unwrap();
            if let Some(row) = workspaces.iter_mut().find(|w| w.id == id) {
                row.name = name.to_string();
                row.updated_at = updated_at;
            }
            Ok(())
        })
    }

    fn set_workspace_public<'a>(
        &'a self,
        id: &'a str,
        public: bool,
    ) -> BoxFuture<'a, DatastoreResult<()>> {
        Box::pin(async move {
            self.check_writable()?;
            let mut workspaces = self.workspaces.write().unwrap();
            if let Some(row) = workspaces.iter_mut().find(|w| w.id == id) {
                row.public = public;
            }
            Ok(())
        })
    }

    fn delete_workspace<'a>(&'a self, id: &'a str) -> BoxFuture<'a, DatastoreResult<()>> {
        Box::pin(async move {
            self.check_writable()?;
            self.workspaces.write().unwrap().retain(|w| w.id != id);

            // Cascade: pages of the workspace, then their attachments
            let removed_pages: Vec<String> = {
                let mut pages = self.pages.write().unwrap();
                let removed = pages
                    .iter()
                    .filter(|p| p.workspace_id == id)
                    .map(|p| p.id.clone())
                    .collect();
                pages.retain(|p| p.workspace_id != id);
                removed
            };
            self.attachments
                .write()
                .unwrap()
                .retain(|a| !removed_pages.contains(&a.page_id));
            Ok(())
        })
    }

    fn list_pages<'a>(
        &'a self,
        workspace_id: &'a str,
    ) -> BoxFuture<'a, DatastoreResult<Vec<PageRecord>>> {
        Box::pin(async move {
            if self.fail_pages_for.read().unwrap().as_deref() == Some(workspace_id) {
                return Err(WorkpadError::Storage(
                    "simulated page fetch failure".to_string(),
                ));
            }
            let pages = self.pages.read().unwrap();
            let mut rows: Vec<PageRecord> = pages
                .iter()
                .filter(|p| p.workspace_id == workspace_id)
                .cloned()
                .collect();
            by_created_at(&mut rows, |p| p.created_at);
            Ok(rows)
        })
    }

    fn insert_page<'a>(&'a self, record: &'a PageRecord) -> BoxFuture<'a, DatastoreResult<()>> {
        Box::pin(async move {
            self.check_writable()?;
            self.pages.write().unwrap().push(record.clone());
            Ok(())
        })
    }

    fn update_page<'a>(
        &'a self,
        id: &'a str,
        update: &'a PageUpdate,
    ) -> BoxFuture<'a, DatastoreResult<()>> {
        Box::pin(async move {
            self.check_writable()?;
            let mut pages = self.pages.write().unwrap();
            if let Some(row) = pages.iter_mut().find(|p| p.id == id) {
                if let Some(title) = &update.title {
                    row.title = title.clone();
                }
                if let Some(body) = &update.body {
                    row.body = body.clone();
                }
                if let Some(public) = update.public {
                    row.public = public;
                }
            }
            Ok(())
        })
    }

    fn delete_page<'a>(&'a self, id: &'a str) -> BoxFuture<'a, DatastoreResult<()>> {
        Box::pin(async move {
            self.check_writable()?;
            self.pages.write().unwrap().retain(|p| p.id != id);
            self.attachments.write().unwrap().retain(|a| a.page_id != id);
            Ok(())
        })
    }

    fn list_attachments<'a>(
        &'a self,
        page_id: &'a str,
    ) -> BoxFuture<'a, DatastoreResult<Vec<AttachmentRecord>>> {
        Box::pin(async move {
            let attachments = self.attachments.read().unwrap();
            let mut rows: Vec<AttachmentRecord> = attachments
                .iter()
                .filter(|a| a.page_id == page_id)
                .cloned()
                .collect();
            by_created_at(&mut rows, |a| a.created_at);
            Ok(rows)
        })
    }

    fn insert_attachment<'a>(
        &'a self,
        record: &'a AttachmentRecord,
    ) -> BoxFuture<'a, DatastoreResult<()>> {
        Box::pin(async move {
            self.check_writable()?;
            self.attachments.write().unwrap().push(record.clone());
            Ok(())
        })
    }

    fn delete_attachment<'a>(&'a self, id: &'a str) -> BoxFuture<'a, DatastoreResult<()>> {
        Box::pin(async move {
            self.check_writable()?;
            self.attachments.write().unwrap().retain(|a| a.id != id);
            Ok(())
        })
    }

    fn get_public_page<'a>(
        &'a self,
        page_id: &'a str,
    ) -> BoxFuture<'a, DatastoreResult<Option<PageRecord>>> {
        Box::pin(async move {
            let pages = self.pages.read().unwrap();
            Ok(pages.iter().find(|p| p.id == page_id && p.public).cloned())
        })
    }

    fn get_public_workspace<'a>(
        &'a self,
        workspace_id: &'a str,
    ) -> BoxFuture<'a, DatastoreResult<Option<WorkspaceRecord>>> {
        Box::pin(async move {
            let workspaces = self.workspaces.read().unwrap();
            Ok(workspaces
                .iter()
                .find(|w| w.id == workspace_id && w.public)
                .cloned())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use futures_lite::future::block_on;

    fn workspace(id: &str, user: &str, created_at: DateTime<Utc>) -> WorkspaceRecord {
        WorkspaceRecord {
            id: id.to_string(),
            user_id: user.to_string(),
            name: format!("ws {id}"),
            public: false,
            created_at,
            updated_at: created_at,
        }
    }

    fn page(id: &str, workspace: &str, created_at: DateTime<Utc>) -> PageRecord {
        PageRecord {
            id: id.to_string(),
            workspace_id: workspace.to_string(),
            title: format!("page {id}"),
            body: String::new(),
            public: false,
            created_at,
        }
    }

    fn attachment(id: &str, page: &str) -> AttachmentRecord {
        AttachmentRecord {
            id: id.to_string(),
            page_id: page.to_string(),
            kind: "image".to_string(),
            url: "data:image/png;base64,".to_string(),
            name: format!("{id}.png"),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_list_workspaces_scoped_and_ordered() {
        let ds = MemoryDatastore::new();
        let t0 = Utc::now();

        block_on(ds.insert_workspace(&workspace("w2", "alice", t0 + TimeDelta::seconds(1))))
            .unwrap();
        block_on(ds.insert_workspace(&workspace("w1", "alice", t0))).unwrap();
        block_on(ds.insert_workspace(&workspace("w3", "bob", t0))).unwrap();

        let rows = block_on(ds.list_workspaces("alice")).unwrap();
        let ids: Vec<&str> = rows.iter().map(|w| w.id.as_str()).collect();
        assert_eq!(ids, vec!["w1", "w2"]);
    }

    #[test]
    fn test_delete_workspace_cascades() {
        let ds = MemoryDatastore::new();
        let now = Utc::now();

        block_on(ds.insert_workspace(&workspace("w1", "alice", now))).unwrap();
        block_on(ds.insert_page(&page("p1", "w1", now))).unwrap();
        block_on(ds.insert_attachment(&attachment("a1", "p1"))).unwrap();
        block_on(ds.insert_page(&page("p2", "w2", now))).unwrap();

        block_on(ds.delete_workspace("w1")).unwrap();

        assert_eq!(ds.workspace_count(), 0);
        assert_eq!(ds.page_count(), 1); // p2 belongs to another workspace
        assert_eq!(ds.attachment_count(), 0);
    }

    #[test]
    fn test_update_page_partial() {
        let ds = MemoryDatastore::new();
        let now = Utc::now();
        let mut p = page("p1", "w1", now);
        p.body = "hello".to_string();
        block_on(ds.insert_page(&p)).unwrap();

        block_on(ds.update_page("p1", &PageUpdate::new().title("X"))).unwrap();

        let rows = block_on(ds.list_pages("w1")).unwrap();
        assert_eq!(rows[0].title, "X");
        assert_eq!(rows[0].body, "hello");
        assert!(!rows[0].public);
    }

    #[test]
    fn test_public_filter() {
        let ds = MemoryDatastore::new();
        let now = Utc::now();
        block_on(ds.insert_page(&page("p1", "w1", now))).unwrap();

        assert!(block_on(ds.get_public_page("p1")).unwrap().is_none());

        block_on(ds.update_page("p1", &PageUpdate::new().public(true))).unwrap();
        assert!(block_on(ds.get_public_page("p1")).unwrap().is_some());

        block_on(ds.update_page("p1", &PageUpdate::new().public(false))).unwrap();
        assert!(block_on(ds.get_public_page("p1")).unwrap().is_none());
    }

    #[test]
    fn test_fail_writes_rejects_mutations_but_not_reads() {
        let ds = MemoryDatastore::new();
        let now = Utc::now();
        block_on(ds.insert_workspace(&workspace("w1", "alice", now))).unwrap();

        ds.set_fail_writes(true);
        assert!(block_on(ds.insert_workspace(&workspace("w2", "alice", now))).is_err());
        assert!(block_on(ds.delete_workspace("w1")).is_err());
        assert_eq!(block_on(ds.list_workspaces("alice")).unwrap().len(), 1);

        ds.set_fail_writes(false);
        assert!(block_on(ds.insert_workspace(&workspace("w2", "alice", now))).is_ok());
    }
}
