//! Workspace/page data-sync core.
//!
//! [`WorkspaceStore`] maintains the in-memory mirror of a user's
//! workspaces, pages, and attachments — the single source of truth for
//! presentation code — and keeps it synchronized with a [`Datastore`].
//!
//! # Synchronization model
//!
//! Every mutating operation applies its change to the mirror first, then
//! issues the matching remote write. A failed remote write never rolls the
//! optimistic mutation back: the failure is logged, surfaced as a
//! [`StoreEvent::RemoteWriteFailed`] notification, and the mirror is
//! allowed to run ahead of the datastore until the next full load.
//!
//! There is one logical thread of control: operations suspend on remote
//! I/O without holding the state lock, and two racing updates to the same
//! entity resolve as last-write-wins, locally and remotely. No retry,
//! cancellation, or batching exists at this layer.

use std::sync::{Arc, RwLock};

use chrono::Utc;
use indexmap::IndexMap;
use log::warn;

use crate::datastore::{AttachmentRecord, Datastore, PageRecord, WorkspaceRecord};
use crate::error::{Result, WorkpadError};
use crate::events::{CallbackRegistry, EventCallback, StoreEvent, SubscriptionId};
use crate::model::{
    Attachment, AttachmentKind, ContentKind, NewContentItem, Page, PageUpdate, User, Workspace,
    new_id,
};
use crate::share::ShareLinks;

/// The mirror plus the selection pointers. Mutated only under the store's
/// lock, never across a suspension point.
struct StoreState {
    user: Option<User>,
    /// Workspaces keyed by id, in creation order
    workspaces: IndexMap<String, Workspace>,
    current_workspace_id: Option<String>,
}

/// The workspace/page data-sync core.
///
/// Explicitly owned and injectable: consumers hold it behind an `Arc` and
/// all mutation funnels through its methods.
pub struct WorkspaceStore {
    datastore: Arc<dyn Datastore>,
    links: ShareLinks,
    state: RwLock<StoreState>,
    events: CallbackRegistry,
}

fn attachment_from_record(record: AttachmentRecord) -> Attachment {
    Attachment {
        id: record.id,
        kind: AttachmentKind::Image,
        url: record.url,
        name: record.name,
        created_at: record.created_at,
    }
}

fn page_from_record(record: PageRecord, attachments: Vec<Attachment>) -> Page {
    Page {
        id: record.id,
        title: record.title,
        body: record.body,
        public: record.public,
        created_at: record.created_at,
        attachments,
    }
}

fn workspace_from_record(record: WorkspaceRecord, pages: Vec<Page>) -> Workspace {
    Workspace {
        id: record.id,
        name: record.name,
        public: record.public,
        created_at: record.created_at,
        updated_at: record.updated_at,
        current_page_id: None,
        pages,
    }
}

impl WorkspaceStore {
    /// Create a store over the given datastore and share-link origin.
    pub fn new(datastore: Arc<dyn Datastore>, links: ShareLinks) -> Self {
        Self {
            datastore,
            links,
            state: RwLock::new(StoreState {
                user: None,
                workspaces: IndexMap::new(),
                current_workspace_id: None,
            }),
            events: CallbackRegistry::new(),
        }
    }

    /// The datastore handle (for share-view loading and the like).
    pub fn datastore(&self) -> Arc<dyn Datastore> {
        Arc::clone(&self.datastore)
    }

    /// The share-link builder this store was configured with.
    pub fn share_links(&self) -> &ShareLinks {
        &self.links
    }

    // ==================== Events ====================

    /// Subscribe to store events. Returns an id for [`Self::unsubscribe`].
    pub fn subscribe(&self, callback: EventCallback) -> SubscriptionId {
        self.events.subscribe(callback)
    }

    /// Remove a subscription.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    fn emit_changed(&self) {
        self.events.emit(&StoreEvent::WorkspacesChanged);
    }

    fn report_remote_failure(&self, operation: &str, err: &WorkpadError) {
        warn!("{operation}: remote write failed, local state kept: {err}");
        self.events.emit(&StoreEvent::RemoteWriteFailed {
            operation: operation.to_string(),
            message: err.to_string(),
        });
    }

    // ==================== Identity & loading ====================

    /// The identity the mirror is currently scoped to.
    pub fn current_user(&self) -> Option<User> {
        self.state.read().unwrap().user.clone()
    }

    /// Switch the active identity.
    ///
    /// With `Some(user)`, the mirror is rebuilt from the datastore via
    /// [`Self::reload`]. With `None` (logout), local state is cleared with
    /// no network I/O.
    pub async fn set_identity(&self, user: Option<User>) {
        let user_id = user.as_ref().map(|u| u.id.clone());
        {
            let mut state = self.state.write().unwrap();
            state.user = user;
            state.workspaces = IndexMap::new();
            state.current_workspace_id = None;
        }
        self.events.emit(&StoreEvent::IdentityChanged {
            user_id: user_id.clone(),
        });

        if user_id.is_some() {
            self.reload().await;
        } else {
            self.emit_changed();
        }
    }

    /// Rebuild the mirror from the datastore for the current identity.
    ///
    /// The fan-out is sequential and nested: workspaces, then each
    /// workspace's pages, then each page's attachments. A fetch failure for
    /// one workspace's (or page's) children degrades that entry to empty
    /// children instead of failing the whole load; a failure listing the
    /// workspaces themselves leaves the mirror empty.
    pub async fn reload(&self) {
        let Some(user) = self.current_user() else {
            return;
        };

        let records = match self.datastore.list_workspaces(&user.id).await {
            Ok(records) => records,
            Err(e) => {
                self.report_remote_failure("load_workspaces", &e);
                let mut state = self.state.write().unwrap();
                state.workspaces = IndexMap::new();
                state.current_workspace_id = None;
                drop(state);
                self.emit_changed();
                return;
            }
        };

        let mut workspaces = IndexMap::with_capacity(records.len());
        for record in records {
            let pages = match self.datastore.list_pages(&record.id).await {
                Ok(rows) => {
                    let mut pages = Vec::with_capacity(rows.len());
                    for row in rows {
                        let attachments = match self.datastore.list_attachments(&row.id).await {
                            Ok(rows) => rows.into_iter().map(attachment_from_record).collect(),
                            Err(e) => {
                                warn!("reload: attachment fetch failed for page {}: {e}", row.id);
                                Vec::new()
                            }
                        };
                        pages.push(page_from_record(row, attachments));
                    }
                    pages
                }
                Err(e) => {
                    warn!("reload: page fetch failed for workspace {}: {e}", record.id);
                    Vec::new()
                }
            };
            workspaces.insert(record.id.clone(), workspace_from_record(record, pages));
        }

        {
            // Whole-collection replacement keeps view derivation simple
            let mut state = self.state.write().unwrap();
            let selection_survives = state
                .current_workspace_id
                .as_deref()
                .is_some_and(|id| workspaces.contains_key(id));
            if !selection_survives {
                state.current_workspace_id = None;
            }
            state.workspaces = workspaces;
        }
        self.emit_changed();
    }

    // ==================== Mirror access ====================

    /// All workspaces, in creation order (cloned snapshot).
    pub fn workspaces(&self) -> Vec<Workspace> {
        self.state
            .read()
            .unwrap()
            .workspaces
            .values()
            .cloned()
            .collect()
    }

    /// A workspace by id (cloned snapshot).
    pub fn workspace(&self, workspace_id: &str) -> Option<Workspace> {
        self.state
            .read()
            .unwrap()
            .workspaces
            .get(workspace_id)
            .cloned()
    }

    /// Id of the currently selected workspace.
    pub fn current_workspace_id(&self) -> Option<String> {
        self.state.read().unwrap().current_workspace_id.clone()
    }

    /// The currently selected workspace (cloned snapshot).
    pub fn current_workspace(&self) -> Option<Workspace> {
        let state = self.state.read().unwrap();
        state
            .current_workspace_id
            .as_deref()
            .and_then(|id| state.workspaces.get(id))
            .cloned()
    }

    /// The selected page of a workspace (cloned snapshot).
    pub fn selected_page(&self, workspace_id: &str) -> Option<Page> {
        let state = self.state.read().unwrap();
        state
            .workspaces
            .get(workspace_id)
            .and_then(|ws| ws.current_page())
            .cloned()
    }

    // ==================== Workspace operations ====================

    /// Create a workspace and select it.
    ///
    /// Requires a non-empty name and an active identity. The workspace is
    /// appended to the mirror before the remote insert; a failed insert is
    /// reported but does not undo the append.
    pub async fn create_workspace(&self, name: &str) -> Result<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(WorkpadError::EmptyWorkspaceName);
        }
        let user = self.current_user().ok_or(WorkpadError::NotLoggedIn)?;

        let now = Utc::now();
        let record = WorkspaceRecord {
            id: new_id(),
            user_id: user.id,
            name: name.to_string(),
            public: false,
            created_at: now,
            updated_at: now,
        };

        {
            let mut state = self.state.write().unwrap();
            state.workspaces.insert(
                record.id.clone(),
                Workspace {
                    id: record.id.clone(),
                    name: record.name.clone(),
                    public: false,
                    created_at: now,
                    updated_at: now,
                    current_page_id: None,
                    pages: Vec::new(),
                },
            );
            state.current_workspace_id = Some(record.id.clone());
        }
        self.emit_changed();

        if let Err(e) = self.datastore.insert_workspace(&record).await {
            self.report_remote_failure("create_workspace", &e);
        }
        Ok(record.id)
    }

    /// Rename a workspace. Unknown ids are a silent no-op.
    pub async fn rename_workspace(&self, workspace_id: &str, new_name: &str) -> Result<()> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(WorkpadError::EmptyWorkspaceName);
        }

        let now = Utc::now();
        let found = {
            let mut state = self.state.write().unwrap();
            match state.workspaces.get_mut(workspace_id) {
                Some(ws) => {
                    ws.name = new_name.to_string();
                    ws.updated_at = now;
                    true
                }
                None => false,
            }
        };
        if !found {
            return Ok(());
        }
        self.emit_changed();

        if let Err(e) = self
            .datastore
            .update_workspace_name(workspace_id, new_name, now)
            .await
        {
            self.report_remote_failure("rename_workspace", &e);
        }
        Ok(())
    }

    /// Delete a workspace; the datastore cascade removes its children.
    ///
    /// If the deleted workspace was selected, selection falls back to the
    /// first remaining workspace (or none). Unknown ids are a silent no-op.
    pub async fn delete_workspace(&self, workspace_id: &str) -> Result<()> {
        let found = {
            let mut state = self.state.write().unwrap();
            let removed = state.workspaces.shift_remove(workspace_id).is_some();
            if removed && state.current_workspace_id.as_deref() == Some(workspace_id) {
                state.current_workspace_id = state.workspaces.keys().next().cloned();
            }
            removed
        };
        if !found {
            return Ok(());
        }
        self.emit_changed();

        if let Err(e) = self.datastore.delete_workspace(workspace_id).await {
            self.report_remote_failure("delete_workspace", &e);
        }
        Ok(())
    }

    /// Select a workspace, or clear the selection if the id is unknown.
    /// Pure local operation; never touches the datastore.
    pub fn select_workspace(&self, workspace_id: &str) {
        {
            let mut state = self.state.write().unwrap();
            state.current_workspace_id = state
                .workspaces
                .contains_key(workspace_id)
                .then(|| workspace_id.to_string());
        }
        self.emit_changed();
    }

    // ==================== Page operations ====================

    /// Create a page with an empty body and select it within its workspace.
    ///
    /// Returns the new page id. Unlike the other mutations, a failed remote
    /// insert is returned to the caller as well as reported — the caller
    /// navigates to the new page on success. The optimistic local append
    /// stands either way.
    pub async fn create_page(&self, workspace_id: &str, title: &str) -> Result<String> {
        let title = title.trim();
        if title.is_empty() {
            return Err(WorkpadError::EmptyPageTitle);
        }

        let now = Utc::now();
        let record = PageRecord {
            id: new_id(),
            workspace_id: workspace_id.to_string(),
            title: title.to_string(),
            body: String::new(),
            public: false,
            created_at: now,
        };

        {
            let mut state = self.state.write().unwrap();
            let Some(ws) = state.workspaces.get_mut(workspace_id) else {
                return Err(WorkpadError::WorkspaceNotFound(workspace_id.to_string()));
            };
            ws.pages.push(Page {
                id: record.id.clone(),
                title: record.title.clone(),
                body: String::new(),
                public: false,
                created_at: now,
                attachments: Vec::new(),
            });
            ws.current_page_id = Some(record.id.clone());
        }
        self.emit_changed();

        if let Err(e) = self.datastore.insert_page(&record).await {
            self.report_remote_failure("create_page", &e);
            return Err(e);
        }
        Ok(record.id)
    }

    /// Apply a partial update to a page.
    ///
    /// Only the fields present in `update` are touched, locally and
    /// remotely. Unknown workspace/page ids are a silent no-op.
    pub async fn update_page(
        &self,
        workspace_id: &str,
        page_id: &str,
        update: PageUpdate,
    ) -> Result<()> {
        if let Some(title) = &update.title
            && title.trim().is_empty()
        {
            return Err(WorkpadError::EmptyPageTitle);
        }
        if update.is_empty() {
            return Ok(());
        }

        let found = {
            let mut state = self.state.write().unwrap();
            state
                .workspaces
                .get_mut(workspace_id)
                .and_then(|ws| ws.page_mut(page_id))
                .map(|page| {
                    if let Some(title) = &update.title {
                        page.title = title.clone();
                    }
                    if let Some(body) = &update.body {
                        page.body = body.clone();
                    }
                    if let Some(public) = update.public {
                        page.public = public;
                    }
                })
                .is_some()
        };
        if !found {
            return Ok(());
        }
        self.emit_changed();

        if let Err(e) = self.datastore.update_page(page_id, &update).await {
            self.report_remote_failure("update_page", &e);
        }
        Ok(())
    }

    /// Delete a page and, with it, its attachments.
    ///
    /// If the page was selected, selection moves to the first remaining
    /// page or clears — never a dangling id. Unknown ids are a silent no-op.
    pub async fn delete_page(&self, workspace_id: &str, page_id: &str) -> Result<()> {
        let found = {
            let mut state = self.state.write().unwrap();
            match state.workspaces.get_mut(workspace_id) {
                Some(ws) => {
                    let before = ws.pages.len();
                    ws.pages.retain(|p| p.id != page_id);
                    let removed = ws.pages.len() != before;
                    if removed && ws.current_page_id.as_deref() == Some(page_id) {
                        ws.current_page_id = ws.pages.first().map(|p| p.id.clone());
                    }
                    removed
                }
                None => false,
            }
        };
        if !found {
            return Ok(());
        }
        self.emit_changed();

        if let Err(e) = self.datastore.delete_page(page_id).await {
            self.report_remote_failure("delete_page", &e);
        }
        Ok(())
    }

    // ==================== Attachment operations ====================

    /// Attach an image to a page, storing the bytes as an inline data URI.
    /// Returns the new attachment id.
    pub async fn add_attachment(
        &self,
        workspace_id: &str,
        page_id: &str,
        bytes: &[u8],
        name: &str,
    ) -> Result<String> {
        let now = Utc::now();
        let record = AttachmentRecord {
            id: new_id(),
            page_id: page_id.to_string(),
            kind: "image".to_string(),
            url: Attachment::data_uri(bytes, name),
            name: name.to_string(),
            created_at: now,
        };

        let found = {
            let mut state = self.state.write().unwrap();
            state
                .workspaces
                .get_mut(workspace_id)
                .and_then(|ws| ws.page_mut(page_id))
                .map(|page| {
                    page.attachments.push(Attachment {
                        id: record.id.clone(),
                        kind: AttachmentKind::Image,
                        url: record.url.clone(),
                        name: record.name.clone(),
                        created_at: now,
                    });
                })
                .is_some()
        };
        if !found {
            return Err(WorkpadError::PageNotFound(page_id.to_string()));
        }
        self.emit_changed();

        if let Err(e) = self.datastore.insert_attachment(&record).await {
            self.report_remote_failure("add_attachment", &e);
        }
        Ok(record.id)
    }

    /// Remove an attachment by id. Unknown ids are a silent no-op.
    pub async fn remove_attachment(
        &self,
        workspace_id: &str,
        page_id: &str,
        attachment_id: &str,
    ) -> Result<()> {
        let found = {
            let mut state = self.state.write().unwrap();
            state
                .workspaces
                .get_mut(workspace_id)
                .and_then(|ws| ws.page_mut(page_id))
                .and_then(|page| {
                    page.attachment_index(attachment_id)
                        .map(|idx| page.attachments.remove(idx))
                })
                .is_some()
        };
        if !found {
            return Ok(());
        }
        self.emit_changed();

        if let Err(e) = self.datastore.delete_attachment(attachment_id).await {
            self.report_remote_failure("remove_attachment", &e);
        }
        Ok(())
    }

    // ==================== Content items ====================

    /// Add a flattened content item to a workspace.
    ///
    /// A note becomes a page with the item's text as its body; an image
    /// becomes a page with one embedded attachment carrying the payload.
    /// Returns the created page id. The remote inserts are awaited; their
    /// failures are logged and surfaced but not returned.
    pub async fn add_content_item(&self, workspace_id: &str, item: NewContentItem) -> Result<String> {
        let title = item.title.trim();
        if title.is_empty() {
            return Err(WorkpadError::EmptyPageTitle);
        }

        let now = Utc::now();
        let page_id = new_id();
        let (body, attachment) = match item.kind {
            ContentKind::Note => (item.content.clone(), None),
            ContentKind::Image => (
                String::new(),
                Some(AttachmentRecord {
                    id: new_id(),
                    page_id: page_id.clone(),
                    kind: "image".to_string(),
                    url: item.content.clone(),
                    name: title.to_string(),
                    created_at: now,
                }),
            ),
        };
        let record = PageRecord {
            id: page_id.clone(),
            workspace_id: workspace_id.to_string(),
            title: title.to_string(),
            body: body.clone(),
            public: false,
            created_at: now,
        };

        {
            let mut state = self.state.write().unwrap();
            let Some(ws) = state.workspaces.get_mut(workspace_id) else {
                return Err(WorkpadError::WorkspaceNotFound(workspace_id.to_string()));
            };
            ws.pages.push(Page {
                id: page_id.clone(),
                title: record.title.clone(),
                body,
                public: false,
                created_at: now,
                attachments: attachment
                    .clone()
                    .map(attachment_from_record)
                    .into_iter()
                    .collect(),
            });
        }
        self.emit_changed();

        if let Err(e) = self.datastore.insert_page(&record).await {
            self.report_remote_failure("add_content_item", &e);
        }
        if let Some(attachment) = &attachment
            && let Err(e) = self.datastore.insert_attachment(attachment).await
        {
            self.report_remote_failure("add_content_item", &e);
        }
        Ok(page_id)
    }

    // ==================== Visibility & share links ====================

    /// Set a page's public visibility flag, locally and remotely.
    /// Unknown ids are a silent no-op.
    pub async fn set_page_visibility(
        &self,
        workspace_id: &str,
        page_id: &str,
        public: bool,
    ) -> Result<()> {
        self.update_page(workspace_id, page_id, PageUpdate::new().public(public))
            .await
    }

    /// Set a workspace's public visibility flag, locally and remotely.
    /// Unknown ids are a silent no-op.
    pub async fn set_workspace_visibility(&self, workspace_id: &str, public: bool) -> Result<()> {
        let found = {
            let mut state = self.state.write().unwrap();
            match state.workspaces.get_mut(workspace_id) {
                Some(ws) => {
                    ws.public = public;
                    true
                }
                None => false,
            }
        };
        if !found {
            return Ok(());
        }
        self.emit_changed();

        if let Err(e) = self
            .datastore
            .set_workspace_public(workspace_id, public)
            .await
        {
            self.report_remote_failure("set_workspace_visibility", &e);
        }
        Ok(())
    }

    /// Share link for a page.
    ///
    /// Generating a link publishes the page as a side effect if it is
    /// still private.
    pub async fn page_share_link(&self, workspace_id: &str, page_id: &str) -> Result<String> {
        let needs_publish = {
            let state = self.state.read().unwrap();
            match state
                .workspaces
                .get(workspace_id)
                .and_then(|ws| ws.page(page_id))
            {
                Some(page) => !page.public,
                None => return Err(WorkpadError::PageNotFound(page_id.to_string())),
            }
        };
        if needs_publish {
            self.set_page_visibility(workspace_id, page_id, true).await?;
        }
        Ok(self.links.page_url(page_id))
    }

    /// Share link for a workspace.
    ///
    /// Generating a link publishes the workspace as a side effect if it is
    /// still private.
    pub async fn workspace_share_link(&self, workspace_id: &str) -> Result<String> {
        let needs_publish = {
            let state = self.state.read().unwrap();
            match state.workspaces.get(workspace_id) {
                Some(ws) => !ws.public,
                None => return Err(WorkpadError::WorkspaceNotFound(workspace_id.to_string())),
            }
        };
        if needs_publish {
            self.set_workspace_visibility(workspace_id, true).await?;
        }
        Ok(self.links.workspace_url(workspace_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datastore::MemoryDatastore;
    use futures_lite::future::block_on;

    fn store() -> WorkspaceStore {
        WorkspaceStore::new(
            Arc::new(MemoryDatastore::new()),
            ShareLinks::new("https://app.workpad.dev"),
        )
    }

    fn login(store: &WorkspaceStore) {
        block_on(store.set_identity(Some(User {
            id: "u1".into(),
            email: "ada@example.com".into(),
        })));
    }

    #[test]
    fn test_create_workspace_requires_identity() {
        let store = store();
        assert!(matches!(
            block_on(store.create_workspace("Notes")),
            Err(WorkpadError::NotLoggedIn)
        ));
    }

    #[test]
    fn test_create_workspace_requires_name() {
        let store = store();
        login(&store);
        assert!(matches!(
            block_on(store.create_workspace("   ")),
            Err(WorkpadError::EmptyWorkspaceName)
        ));
    }

    #[test]
    fn test_select_workspace_unknown_id_clears_selection() {
        let store = store();
        login(&store);
        let id = block_on(store.create_workspace("Notes")).unwrap();
        assert_eq!(store.current_workspace_id(), Some(id));

        store.select_workspace("missing");
        assert_eq!(store.current_workspace_id(), None);
    }

    #[test]
    fn test_logout_clears_mirror_without_io() {
        let store = store();
        login(&store);
        block_on(store.create_workspace("Notes")).unwrap();
        assert_eq!(store.workspaces().len(), 1);

        block_on(store.set_identity(None));
        assert!(store.workspaces().is_empty());
        assert!(store.current_user().is_none());
        assert!(store.current_workspace_id().is_none());
    }

    #[test]
    fn test_share_link_publishes_private_page() {
        let store = store();
        login(&store);
        let ws = block_on(store.create_workspace("Notes")).unwrap();
        let page = block_on(store.create_page(&ws, "Todo")).unwrap();

        let url = block_on(store.page_share_link(&ws, &page)).unwrap();
        assert_eq!(url, format!("https://app.workpad.dev/share/page/{page}"));
        assert!(store.workspace(&ws).unwrap().page(&page).unwrap().public);

        // Already-public pages are left alone
        let url_again = block_on(store.page_share_link(&ws, &page)).unwrap();
        assert_eq!(url, url_again);
    }
}
