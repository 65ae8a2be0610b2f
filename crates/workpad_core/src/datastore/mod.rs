//! Datastore abstraction for workspace persistence.
//!
//! This module defines the [`Datastore`] trait which abstracts over the
//! remote persistence collaborator: a row-oriented
//! query/insert/update/delete interface over the workspaces, pages, and
//! attachments tables, filtered by equality predicates and ordered by
//! creation timestamp.
//!
//! Implementations:
//! - [`MemoryDatastore`] — in-memory, for tests and development
//! - [`LocalDatastore`] — browser-local-storage variant: one JSON document
//!   per user holding the entire serialized workspace collection
//! - `SqliteDatastore` — relational backend (feature `sqlite`, native only)
//!
//! ## Object safety
//!
//! `Datastore` is designed to be object-safe so the store can hold it as
//! `Arc<dyn Datastore>`. To enable this, all methods return boxed futures.

mod local;
mod memory;
#[cfg(all(feature = "sqlite", not(target_arch = "wasm32")))]
mod sqlite;

pub use local::LocalDatastore;
pub use memory::MemoryDatastore;
#[cfg(all(feature = "sqlite", not(target_arch = "wasm32")))]
pub use sqlite::SqliteDatastore;

use std::future::Future;
use std::pin::Pin;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::WorkpadError;
use crate::model::PageUpdate;

/// Result type for datastore operations.
pub type DatastoreResult<T> = Result<T, WorkpadError>;

/// A boxed future for object-safe async methods.
///
/// On native targets, futures are `Send` for compatibility with multi-threaded runtimes.
/// On WASM, there's no `Send` requirement since JavaScript is single-threaded.
#[cfg(not(target_arch = "wasm32"))]
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A boxed future for object-safe async methods.
///
/// WASM version without `Send` requirement - JavaScript is single-threaded.
#[cfg(target_arch = "wasm32")]
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// A row in the workspaces table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceRecord {
    /// Workspace identifier
    pub id: String,
    /// Owning user (scope key for list queries)
    pub user_id: String,
    /// Display name
    pub name: String,
    /// Public visibility flag
    pub public: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

/// A row in the pages table, foreign-keyed to its workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    /// Page identifier
    pub id: String,
    /// Owning workspace
    pub workspace_id: String,
    /// Title
    pub title: String,
    /// HTML body
    pub body: String,
    /// Public visibility flag
    pub public: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// A row in the attachments table, foreign-keyed to its page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRecord {
    /// Attachment identifier
    pub id: String,
    /// Owning page
    pub page_id: String,
    /// Payload kind (currently always "image")
    pub kind: String,
    /// URL or inline data URI
    pub url: String,
    /// Display name
    pub name: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Trait for workspace persistence backends.
///
/// Every call either returns a result set/row or an error, never both.
/// Deleting a workspace or page must cascade to its owned children;
/// list queries return rows ordered by creation timestamp.
pub trait Datastore: Send + Sync {
    // ===== Workspace rows =====

    /// All workspaces owned by `user_id`, ordered by creation timestamp.
    fn list_workspaces<'a>(
        &'a self,
        user_id: &'a str,
    ) -> BoxFuture<'a, DatastoreResult<Vec<WorkspaceRecord>>>;

    /// Insert a new workspace row.
    fn insert_workspace<'a>(
        &'a self,
        record: &'a WorkspaceRecord,
    ) -> BoxFuture<'a, DatastoreResult<()>>;

    /// Update a workspace's display name and modification timestamp.
    fn update_workspace_name<'a>(
        &'a self,
        id: &'a str,
        name: &'a str,
        updated_at: DateTime<Utc>,
    ) -> BoxFuture<'a, DatastoreResult<()>>;

    /// Set a workspace's public visibility flag.
    fn set_workspace_public<'a>(
        &'a self,
        id: &'a str,
        public: bool,
    ) -> BoxFuture<'a, DatastoreResult<()>>;

    /// Delete a workspace row, cascading to its pages and their attachments.
    fn delete_workspace<'a>(&'a self, id: &'a str) -> BoxFuture<'a, DatastoreResult<()>>;

    // ===== Page rows =====

    /// All pages in `workspace_id`, ordered by creation timestamp.
    fn list_pages<'a>(
        &'a self,
        workspace_id: &'a str,
    ) -> BoxFuture<'a, DatastoreResult<Vec<PageRecord>>>;

    /// Insert a new page row.
    fn insert_page<'a>(&'a self, record: &'a PageRecord) -> BoxFuture<'a, DatastoreResult<()>>;

    /// Apply a partial update to a page row. Only the fields present in
    /// `update` are written; absent fields keep their stored values.
    fn update_page<'a>(
        &'a self,
        id: &'a str,
        update: &'a PageUpdate,
    ) -> BoxFuture<'a, DatastoreResult<()>>;

    /// Delete a page row, cascading to its attachments.
    fn delete_page<'a>(&'a self, id: &'a str) -> BoxFuture<'a, DatastoreResult<()>>;

    // ===== Attachment rows =====

    /// All attachments on `page_id`, ordered by creation timestamp.
    fn list_attachments<'a>(
        &'a self,
        page_id: &'a str,
    ) -> BoxFuture<'a, DatastoreResult<Vec<AttachmentRecord>>>;

    /// Insert a new attachment row.
    fn insert_attachment<'a>(
        &'a self,
        record: &'a AttachmentRecord,
    ) -> BoxFuture<'a, DatastoreResult<()>>;

    /// Delete an attachment row.
    fn delete_attachment<'a>(&'a self, id: &'a str) -> BoxFuture<'a, DatastoreResult<()>>;

    // ===== Public share-view queries =====
    //
    // Visibility is enforced here, by the query filter, not by the caller:
    // a private row is indistinguishable from a missing one.

    /// Fetch a page by id only if its public flag is set.
    fn get_public_page<'a>(
        &'a self,
        page_id: &'a str,
    ) -> BoxFuture<'a, DatastoreResult<Option<PageRecord>>>;

    /// Fetch a workspace by id only if its public flag is set.
    fn get_public_workspace<'a>(
        &'a self,
        workspace_id: &'a str,
    ) -> BoxFuture<'a, DatastoreResult<Option<WorkspaceRecord>>>;
}

#[cfg(test)]
mod tests {
    // Backend contract tests live with the implementations; see memory.rs,
    // local.rs and sqlite.rs.
}
