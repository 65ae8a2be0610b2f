//! SQLite datastore implementation.
//!
//! Stand-in for the hosted relational datastore: rows in `workspaces`,
//! `pages`, and `attachments` tables with foreign keys and
//! `ON DELETE CASCADE`, so child cleanup happens store-side exactly as the
//! hosted backend does it. Native only, behind the `sqlite` feature.

use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, ToSql, params};

use super::{AttachmentRecord, BoxFuture, Datastore, DatastoreResult, PageRecord, WorkspaceRecord};
use crate::error::WorkpadError;
use crate::model::PageUpdate;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS workspaces (
    id         TEXT PRIMARY KEY,
    user_id    TEXT NOT NULL,
    name       TEXT NOT NULL,
    public     INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_workspaces_user ON workspaces(user_id);

CREATE TABLE IF NOT EXISTS pages (
    id           TEXT PRIMARY KEY,
    workspace_id TEXT NOT NULL REFERENCES workspaces(id) ON DELETE CASCADE,
    title        TEXT NOT NULL,
    body         TEXT NOT NULL DEFAULT '',
    public       INTEGER NOT NULL DEFAULT 0,
    created_at   INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_pages_workspace ON pages(workspace_id);

CREATE TABLE IF NOT EXISTS attachments (
    id         TEXT PRIMARY KEY,
    page_id    TEXT NOT NULL REFERENCES pages(id) ON DELETE CASCADE,
    kind       TEXT NOT NULL,
    url        TEXT NOT NULL,
    name       TEXT NOT NULL,
    created_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_attachments_page ON attachments(page_id);
";

/// SQLite-backed datastore.
pub struct SqliteDatastore {
    conn: Arc<Mutex<Connection>>,
}

fn db_err(e: rusqlite::Error) -> WorkpadError {
    WorkpadError::Storage(e.to_string())
}

fn timestamp_to_datetime(ts: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(ts, 0).unwrap_or_default()
}

impl SqliteDatastore {
    /// Open (or create) a datastore at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> DatastoreResult<Self> {
        let conn = Connection::open(path).map_err(db_err)?;
        Self::with_connection(conn)
    }

    /// Open a transient in-memory datastore (tests).
    pub fn open_in_memory() -> DatastoreResult<Self> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> DatastoreResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(db_err)?;
        conn.execute_batch(SCHEMA).map_err(db_err)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn map_workspace(row: &rusqlite::Row<'_>) -> rusqlite::Result<WorkspaceRecord> {
        Ok(WorkspaceRecord {
            id: row.get(0)?,
            user_id: row.get(1)?,
            name: row.get(2)?,
            public: row.get(3)?,
            created_at: timestamp_to_datetime(row.get(4)?),
            updated_at: timestamp_to_datetime(row.get(5)?),
        })
    }

    fn map_page(row: &rusqlite::Row<'_>) -> rusqlite::Result<PageRecord> {
        Ok(PageRecord {
            id: row.get(0)?,
            workspace_id: row.get(1)?,
            title: row.get(2)?,
            body: row.get(3)?,
            public: row.get(4)?,
            created_at: timestamp_to_datetime(row.get(5)?),
        })
    }

    fn map_attachment(row: &rusqlite::Row<'_>) -> rusqlite::Result<AttachmentRecord> {
        Ok(AttachmentRecord {
            id: row.get(0)?,
            page_id: row.get(1)?,
            kind: row.get(2)?,
            url: row.get(3)?,
            name: row.get(4)?,
            created_at: timestamp_to_datetime(row.get(5)?),
        })
    }
}

impl Datastore for SqliteDatastore {
    fn list_workspaces<'a>(
        &'a self,
        user_id: &'a str,
    ) -> BoxFuture<'a, DatastoreResult<Vec<WorkspaceRecord>>> {
        Box::pin(async move {
            let conn = self.conn.lock().unwrap();
            let mut stmt = conn
                .prepare(
                    "SELECT id, user_id, name, public, created_at, updated_at
                     FROM workspaces WHERE user_id = ? ORDER BY created_at",
                )
                .map_err(db_err)?;
            let rows = stmt
                .query_map([user_id], Self::map_workspace)
                .map_err(db_err)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(db_err)?;
            Ok(rows)
        })
    }

    fn insert_workspace<'a>(
        &'a self,
        record: &'a WorkspaceRecord,
    ) -> BoxFuture<'a, DatastoreResult<()>> {
        Box::pin(async move {
            let conn = self.conn.lock().unwrap();
            conn.execute(
                "INSERT INTO workspaces (id, user_id, name, public, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?)",
                params![
                    record.id,
                    record.user_id,
                    record.name,
                    record.public,
                    record.created_at.timestamp(),
                    record.updated_at.timestamp(),
                ],
            )
            .map_err(db_err)?;
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
            let conn = self.conn.lock().unwrap();
            conn.execute(
                "UPDATE workspaces SET name = ?, updated_at = ? WHERE id = ?",
                params![name, updated_at.timestamp(), id],
            )
            .map_err(db_err)?;
            Ok(())
        })
    }

    fn set_workspace_public<'a>(
        &'a self,
        id: &'a str,
        public: bool,
    ) -> BoxFuture<'a, DatastoreResult<()>> {
        Box::pin(async move {
            let conn = self.conn.lock().unwrap();
            conn.execute(
                "UPDATE workspaces SET public = ? WHERE id = ?",
                params![public, id],
            )
            .map_err(db_err)?;
            Ok(())
        })
    }

    fn delete_workspace<'a>(&'a self, id: &'a str) -> BoxFuture<'a, DatastoreResult<()>> {
        Box::pin(async move {
            let conn = self.conn.lock().unwrap();
            // Pages and attachments go with it via ON DELETE CASCADE
            conn.execute("DELETE FROM workspaces WHERE id = ?", [id])
                .map_err(db_err)?;
            Ok(())
        })
    }

    fn list_pages<'a>(
        &'a self,
        workspace_id: &'a str,
    ) -> BoxFuture<'a, DatastoreResult<Vec<PageRecord>>> {
        Box::pin(async move {
            let conn = self.conn.lock().unwrap();
            let mut stmt = conn
                .prepare(
                    "SELECT id, workspace_id, title, body, public, created_at
                     FROM pages WHERE workspace_id = ? ORDER BY created_at",
                )
                .map_err(db_err)?;
            let rows = stmt
                .query_map([workspace_id], Self::map_page)
                .map_err(db_err)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(db_err)?;
            Ok(rows)
        })
    }

    fn insert_page<'a>(&'a self, record: &'a PageRecord) -> BoxFuture<'a, DatastoreResult<()>> {
        Box::pin(async move {
            let conn = self.conn.lock().unwrap();
            conn.execute(
                "INSERT INTO pages (id, workspace_id, title, body, public, created_at)
                 VALUES (?, ?, ?, ?, ?, ?)",
                params![
                    record.id,
                    record.workspace_id,
                    record.title,
                    record.body,
                    record.public,
                    record.created_at.timestamp(),
                ],
            )
            .map_err(db_err)?;
            Ok(())
        })
    }

    fn update_page<'a>(
        &'a self,
        id: &'a str,
        update: &'a PageUpdate,
    ) -> BoxFuture<'a, DatastoreResult<()>> {
        Box::pin(async move {
            // Carry only the fields present in the update
            let mut sets: Vec<&str> = Vec::new();
            let mut values: Vec<&dyn ToSql> = Vec::new();
            if let Some(title) = &update.title {
                sets.push("title = ?");
                values.push(title);
            }
            if let Some(body) = &update.body {
                sets.push("body = ?");
                values.push(body);
            }
            if let Some(public) = &update.public {
                sets.push("public = ?");
                values.push(public);
            }
            if sets.is_empty() {
                return Ok(());
            }
            let id_owned = id.to_string();
            values.push(&id_owned);

            let sql = format!("UPDATE pages SET {} WHERE id = ?", sets.join(", "));
            let conn = self.conn.lock().unwrap();
            conn.execute(&sql, &values[..]).map_err(db_err)?;
            Ok(())
        })
    }

    fn delete_page<'a>(&'a self, id: &'a str) -> BoxFuture<'a, DatastoreResult<()>> {
        Box::pin(async move {
            let conn = self.conn.lock().unwrap();
            conn.execute("DELETE FROM pages WHERE id = ?", [id])
                .map_err(db_err)?;
            Ok(())
        })
    }

    fn list_attachments<'a>(
        &'a self,
        page_id: &'a str,
    ) -> BoxFuture<'a, DatastoreResult<Vec<AttachmentRecord>>> {
        Box::pin(async move {
            let conn = self.conn.lock().unwrap();
            let mut stmt = conn
                .prepare(
                    "SELECT id, page_id, kind, url, name, created_at
                     FROM attachments WHERE page_id = ? ORDER BY created_at",
                )
                .map_err(db_err)?;
            let rows = stmt
                .query_map([page_id], Self::map_attachment)
                .map_err(db_err)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(db_err)?;
            Ok(rows)
        })
    }

    fn insert_attachment<'a>(
        &'a self,
        record: &'a AttachmentRecord,
    ) -> BoxFuture<'a, DatastoreResult<()>> {
        Box::pin(async move {
            let conn = self.conn.lock().unwrap();
            conn.execute(
                "INSERT INTO attachments (id, page_id, kind, url, name, created_at)
                 VALUES (?, ?, ?, ?, ?, ?)",
                params![
                    record.id,
                    record.page_id,
                    record.kind,
                    record.url,
                    record.name,
                    record.created_at.timestamp(),
                ],
            )
            .map_err(db_err)?;
            Ok(())
        })
    }

    fn delete_attachment<'a>(&'a self, id: &'a str) -> BoxFuture<'a, DatastoreResult<()>> {
        Box::pin(async move {
            let conn = self.conn.lock().unwrap();
            conn.execute("DELETE FROM attachments WHERE id = ?", [id])
                .map_err(db_err)?;
            Ok(())
        })
    }

    fn get_public_page<'a>(
        &'a self,
        page_id: &'a str,
    ) -> BoxFuture<'a, DatastoreResult<Option<PageRecord>>> {
        Box::pin(async move {
            let conn = self.conn.lock().unwrap();
            conn.query_row(
                "SELECT id, workspace_id, title, body, public, created_at
                 FROM pages WHERE id = ? AND public = 1",
                [page_id],
                Self::map_page,
            )
            .optional()
            .map_err(db_err)
        })
    }

    fn get_public_workspace<'a>(
        &'a self,
        workspace_id: &'a str,
    ) -> BoxFuture<'a, DatastoreResult<Option<WorkspaceRecord>>> {
        Box::pin(async move {
            let conn = self.conn.lock().unwrap();
            conn.query_row(
                "SELECT id, user_id, name, public, created_at, updated_at
                 FROM workspaces WHERE id = ? AND public = 1",
                [workspace_id],
                Self::map_workspace,
            )
            .optional()
            .map_err(db_err)
        })
    }
}
