//! Identity collaborator.
//!
//! The store only ever reads the current identity to scope (or clear) its
//! mirror; authentication itself belongs to the provider behind
//! [`IdentityProvider`]. [`LocalIdentity`] is the locally-mocked variant:
//! a passwordless user table held in memory and optionally persisted as
//! JSON through the filesystem abstraction so sessions behave coherently
//! across process runs.

use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use crate::datastore::BoxFuture;
use crate::error::{Result, WorkpadError};
use crate::fs::FileSystem;
use crate::model::{User, new_id};

/// Trait for identity providers.
///
/// Login/signup/logout return success or an error; `current_user` reports
/// the active identity or `None` when logged out.
pub trait IdentityProvider: Send + Sync {
    /// The active user, if any.
    fn current_user(&self) -> Option<User>;

    /// Log in an existing account by email.
    fn login<'a>(&'a self, email: &'a str) -> BoxFuture<'a, Result<User>>;

    /// Create an account and log it in.
    fn signup<'a>(&'a self, email: &'a str) -> BoxFuture<'a, Result<User>>;

    /// End the active session.
    fn logout<'a>(&'a self) -> BoxFuture<'a, Result<()>>;
}

/// Locally-mocked identity provider.
pub struct LocalIdentity {
    users: RwLock<Vec<User>>,
    current: RwLock<Option<User>>,
    persist: Option<(Arc<dyn FileSystem>, PathBuf)>,
}

impl LocalIdentity {
    /// Provider with no persistence; accounts last for the process lifetime.
    pub fn in_memory() -> Self {
        Self {
            users: RwLock::new(Vec::new()),
            current: RwLock::new(None),
            persist: None,
        }
    }

    /// Provider persisting its user table as JSON at `path`.
    ///
    /// An unreadable or missing file starts an empty table.
    pub fn with_storage(fs: Arc<dyn FileSystem>, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let users = fs
            .read_to_string(&path)
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_default();

        Self {
            users: RwLock::new(users),
            current: RwLock::new(None),
            persist: Some((fs, path)),
        }
    }

    /// Restore a previously persisted session without re-authenticating.
    ///
    /// Unknown users are added to the table so a restored session and a
    /// fresh signup behave the same.
    pub fn restore_session(&self, user: User) {
        {
            let mut users = self.users.write().unwrap();
            if !users.iter().any(|u| u.id == user.id) {
                users.push(user.clone());
            }
        }
        *self.current.write().unwrap() = Some(user);
    }

    fn save_users(&self) -> Result<()> {
        if let Some((fs, path)) = &self.persist {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                fs.create_dir_all(parent)?;
            }
            let users = self.users.read().unwrap();
            let content = serde_json::to_string_pretty(&*users)?;
            fs.write_file(path, &content)
                .map_err(|e| WorkpadError::FileWrite {
                    path: path.clone(),
                    source: e,
                })?;
        }
        Ok(())
    }
}

impl IdentityProvider for LocalIdentity {
    fn current_user(&self) -> Option<User> {
        self.current.read().unwrap().clone()
    }

    fn login<'a>(&'a self, email: &'a str) -> BoxFuture<'a, Result<User>> {
        Box::pin(async move {
            let user = {
                let users = self.users.read().unwrap();
                users.iter().find(|u| u.email == email).cloned()
            };
            let user = user.ok_or_else(|| WorkpadError::UnknownUser(email.to_string()))?;
            *self.current.write().unwrap() = Some(user.clone());
            Ok(user)
        })
    }

    fn signup<'a>(&'a self, email: &'a str) -> BoxFuture<'a, Result<User>> {
        Box::pin(async move {
            {
                let users = self.users.read().unwrap();
                if users.iter().any(|u| u.email == email) {
                    return Err(WorkpadError::UserAlreadyExists(email.to_string()));
                }
            }
            let user = User {
                id: new_id(),
                email: email.to_string(),
            };
            self.users.write().unwrap().push(user.clone());
            self.save_users()?;
            *self.current.write().unwrap() = Some(user.clone());
            Ok(user)
        })
    }

    fn logout<'a>(&'a self) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            *self.current.write().unwrap() = None;
            Ok(())
        })
    }
}
