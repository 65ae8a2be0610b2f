//! Local-storage datastore implementation.
//!
//! This is the browser-local-storage variant of the persistence
//! collaborator: each user's entire workspace collection is serialized as
//! one JSON document under the key pattern `workspaces-<userId>.json`. The
//! document is read on demand and rewritten in full on every mutation.
//!
//! The backend is written against the [`FileSystem`] abstraction so it runs
//! unchanged over the real filesystem, an in-memory map in tests, or a
//! browser storage shim.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use super::{AttachmentRecord, BoxFuture, Datastore, DatastoreResult, PageRecord, WorkspaceRecord};
use crate::error::WorkpadError;
use crate::fs::FileSystem;
use crate::model::PageUpdate;

const KEY_PREFIX: &str = "workspaces-";
const KEY_SUFFIX: &str = ".json";

/// One page with its owned attachments, as nested in the JSON document.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredPage {
    #[serde(flatten)]
    record: PageRecord,
    #[serde(default)]
    attachments: Vec<AttachmentRecord>,
}

/// One workspace with its owned pages, as nested in the JSON document.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredWorkspace {
    #[serde(flatten)]
    record: WorkspaceRecord,
    #[serde(default)]
    pages: Vec<StoredPage>,
}

/// Datastore persisting each user's workspace collection as a single JSON
/// document (`workspaces-<userId>.json`) through a [`FileSystem`].
pub struct LocalDatastore {
    fs: Arc<dyn FileSystem>,
    dir: PathBuf,
    // Serializes read-modify-write cycles on the JSON documents
    write_lock: Mutex<()>,
}

impl LocalDatastore {
    /// Create a datastore rooted at `dir` on the given filesystem.
    pub fn new(fs: Arc<dyn FileSystem>, dir: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    fn doc_path(&self, user_id: &str) -> PathBuf {
        self.dir.join(format!("{KEY_PREFIX}{user_id}{KEY_SUFFIX}"))
    }

    fn load_doc(&self, user_id: &str) -> DatastoreResult<Vec<StoredWorkspace>> {
        let path = self.doc_path(user_id);
        if !self.fs.exists(&path) {
            return Ok(Vec::new());
        }
        let content = self
            .fs
            .read_to_string(&path)
            .map_err(|e| WorkpadError::FileRead { path, source: e })?;
        Ok(serde_json::from_str(&content)?)
    }

    fn save_doc(&self, user_id: &str, doc: &[StoredWorkspace]) -> DatastoreResult<()> {
        let path = self.doc_path(user_id);
        self.fs.create_dir_all(&self.dir)?;
        let content = serde_json::to_string_pretty(doc)?;
        self.fs
            .write_file(&path, &content)
            .map_err(|e| WorkpadError::FileWrite { path, source: e })
    }

    /// User ids with a stored document, derived from the key pattern.
    fn user_ids(&self) -> DatastoreResult<Vec<String>> {
        let mut ids = Vec::new();
        for path in self.fs.list_files(&self.dir)? {
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if let Some(stem) = name
                .strip_prefix(KEY_PREFIX)
                .and_then(|s| s.strip_suffix(KEY_SUFFIX))
                && !stem.is_empty()
            {
                ids.push(stem.to_string());
            }
        }
        Ok(ids)
    }

    /// Load the document containing `workspace_id`, if any.
    fn doc_with_workspace(
        &self,
        workspace_id: &str,
    ) -> DatastoreResult<Option<(String, Vec<StoredWorkspace>)>> {
        for user_id in self.user_ids()? {
            let doc = self.load_doc(&user_id)?;
            if doc.iter().any(|w| w.record.id == workspace_id) {
                return Ok(Some((user_id, doc)));
            }
        }
        Ok(None)
    }

    /// Load the document containing `page_id`, if any.
    fn doc_with_page(&self, page_id: &str) -> DatastoreResult<Option<(String, Vec<StoredWorkspace>)>> {
        for user_id in self.user_ids()? {
            let doc = self.load_doc(&user_id)?;
            if doc
                .iter()
                .any(|w| w.pages.iter().any(|p| p.record.id == page_id))
            {
                return Ok(Some((user_id, doc)));
            }
        }
        Ok(None)
    }

    /// Load the document containing an attachment, if any.
    fn doc_with_attachment(
        &self,
        attachment_id: &str,
    ) -> DatastoreResult<Option<(String, Vec<StoredWorkspace>)>> {
        for user_id in self.user_ids()? {
            let doc = self.load_doc(&user_id)?;
            let found = doc.iter().any(|w| {
                w.pages
                    .iter()
                    .any(|p| p.attachments.iter().any(|a| a.id == attachment_id))
            });
            if found {
                return Ok(Some((user_id, doc)));
            }
        }
        Ok(None)
    }
}

impl Datastore for LocalDatastore {
    fn list_workspaces<'a>(
        &'a self,
        user_id: &'a str,
    ) -> BoxFuture<'a, DatastoreResult<Vec<WorkspaceRecord>>> {
        Box::pin(async move {
            let mut rows: Vec<WorkspaceRecord> = self
                .load_doc(user_id)?
                .into_iter()
                .map(|w| w.record)
                .collect();
            rows.sort_by_key(|w| w.created_at);
            Ok(rows)
        })
    }

    fn insert_workspace<'a>(
        &'a self,
        record: &'a WorkspaceRecord,
    ) -> BoxFuture<'a, DatastoreResult<()>> {
        Box::pin(async move {
            let _guard = self.write_lock.lock().unwrap();
            let mut doc = self.load_doc(&record.user_id)?;
            doc.push(StoredWorkspace {
                record: record.clone(),
                pages: Vec::new(),
            });
            self.save_doc(&record.user_id, &doc)
        })
    }

    fn update_workspace_name<'a>(
        &'a self,
        id: &'a str,
        name: &'a str,
        updated_at: chrono::DateTime<chrono::Utc>,
    ) -> BoxFuture<'a, DatastoreResult<()>> {
        Box::pin(async move {
            let _guard = self.write_lock.lock().unwrap();
            if let Some((user_id, mut doc)) = self.doc_with_workspace(id)? {
                for w in doc.iter_mut().filter(|w| w.record.id == id) {
                    w.record.name = name.to_string();
                    w.record.updated_at = updated_at;
                }
                self.save_doc(&user_id, &doc)?;
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
            let _guard = self.write_lock.lock().unwrap();
            if let Some((user_id, mut doc)) = self.doc_with_workspace(id)? {
                for w in doc.iter_mut().filter(|w| w.record.id == id) {
                    w.record.public = public;
                }
                self.save_doc(&user_id, &doc)?;
            }
            Ok(())
        })
    }

    fn delete_workspace<'a>(&'a self, id: &'a str) -> BoxFuture<'a, DatastoreResult<()>> {
        Box::pin(async move {
            let _guard = self.write_lock.lock().unwrap();
            if let Some((user_id, mut doc)) = self.doc_with_workspace(id)? {
                // Removing the nested workspace drops its pages and
                // attachments with it; the cascade is structural here.
                doc.retain(|w| w.record.id != id);
                self.save_doc(&user_id, &doc)?;
            }
            Ok(())
        })
    }

    fn list_pages<'a>(
        &'a self,
        workspace_id: &'a str,
    ) -> BoxFuture<'a, DatastoreResult<Vec<PageRecord>>> {
        Box::pin(async move {
            let Some((_, doc)) = self.doc_with_workspace(workspace_id)? else {
                return Ok(Vec::new());
            };
            let mut rows: Vec<PageRecord> = doc
                .into_iter()
                .filter(|w| w.record.id == workspace_id)
                .flat_map(|w| w.pages)
                .map(|p| p.record)
                .collect();
            rows.sort_by_key(|p| p.created_at);
            Ok(rows)
        })
    }

    fn insert_page<'a>(&'a self, record: &'a PageRecord) -> BoxFuture<'a, DatastoreResult<()>> {
        Box::pin(async move {
            let _guard = self.write_lock.lock().unwrap();
            if let Some((user_id, mut doc)) = self.doc_with_workspace(&record.workspace_id)? {
                for w in doc
                    .iter_mut()
                    .filter(|w| w.record.id == record.workspace_id)
                {
                    w.pages.push(StoredPage {
                        record: record.clone(),
                        attachments: Vec::new(),
                    });
                }
                self.save_doc(&user_id, &doc)?;
            }
            Ok(())
        })
    }

    fn update_page<'a>(
        &'a self,
        id: &'a str,
        update: &'a PageUpdate,
    ) -> BoxFuture<'a, DatastoreResult<()>> {
        Box::pin(async move {
            let _guard = self.write_lock.lock().unwrap();
            if let Some((user_id, mut doc)) = self.doc_with_page(id)? {
                for w in doc.iter_mut() {
                    for p in w.pages.iter_mut().filter(|p| p.record.id == id) {
                        if let Some(title) = &update.title {
                            p.record.title = title.clone();
                        }
                        if let Some(body) = &update.body {
                            p.record.body = body.clone();
                        }
                        if let Some(public) = update.public {
                            p.record.public = public;
                        }
                    }
                }
                self.save_doc(&user_id, &doc)?;
            }
            Ok(())
        })
    }

    fn delete_page<'a>(&'a self, id: &'a str) -> BoxFuture<'a, DatastoreResult<()>> {
        Box::pin(async move {
            let _guard = self.write_lock.lock().unwrap();
            if let Some((user_id, mut doc)) = self.doc_with_page(id)? {
                for w in doc.iter_mut() {
                    w.pages.retain(|p| p.record.id != id);
                }
                self.save_doc(&user_id, &doc)?;
            }
            Ok(())
        })
    }

    fn list_attachments<'a>(
        &'a self,
        page_id: &'a str,
    ) -> BoxFuture<'a, DatastoreResult<Vec<AttachmentRecord>>> {
        Box::pin(async move {
            let Some((_, doc)) = self.doc_with_page(page_id)? else {
                return Ok(Vec::new());
            };
            let mut rows: Vec<AttachmentRecord> = doc
                .into_iter()
                .flat_map(|w| w.pages)
                .filter(|p| p.record.id == page_id)
                .flat_map(|p| p.attachments)
                .collect();
            rows.sort_by_key(|a| a.created_at);
            Ok(rows)
        })
    }

    fn insert_attachment<'a>(
        &'a self,
        record: &'a AttachmentRecord,
    ) -> BoxFuture<'a, DatastoreResult<()>> {
        Box::pin(async move {
            let _guard = self.write_lock.lock().unwrap();
            if let Some((user_id, mut doc)) = self.doc_with_page(&record.page_id)? {
                for w in doc.iter_mut() {
                    for p in w.pages.iter_mut().filter(|p| p.record.id == record.page_id) {
                        p.attachments.push(record.clone());
                    }
                }
                self.save_doc(&user_id, &doc)?;
            }
            Ok(())
        })
    }

    fn delete_attachment<'a>(&'a self, id: &'a str) -> BoxFuture<'a, DatastoreResult<()>> {
        Box::pin(async move {
            let _guard = self.write_lock.lock().unwrap();
            if let Some((user_id, mut doc)) = self.doc_with_attachment(id)? {
                for w in doc.iter_mut() {
                    for p in w.pages.iter_mut() {
                        p.attachments.retain(|a| a.id != id);
                    }
                }
                self.save_doc(&user_id, &doc)?;
            }
            Ok(())
        })
    }

    fn get_public_page<'a>(
        &'a self,
        page_id: &'a str,
    ) -> BoxFuture<'a, DatastoreResult<Option<PageRecord>>> {
        Box::pin(async move {
            let Some((_, doc)) = self.doc_with_page(page_id)? else {
                return Ok(None);
            };
            Ok(doc
                .into_iter()
                .flat_map(|w| w.pages)
                .map(|p| p.record)
                .find(|p| p.id == page_id && p.public))
        })
    }

    fn get_public_workspace<'a>(
        &'a self,
        workspace_id: &'a str,
    ) -> BoxFuture<'a, DatastoreResult<Option<WorkspaceRecord>>> {
        Box::pin(async move {
            let Some((_, doc)) = self.doc_with_workspace(workspace_id)? else {
                return Ok(None);
            };
            Ok(doc
                .into_iter()
                .map(|w| w.record)
                .find(|w| w.id == workspace_id && w.public))
        })
    }
}
