#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Configuration options
pub mod config;

/// Datastore collaborator (row-oriented persistence backends)
pub mod datastore;

/// Error (common error types)
pub mod error;

/// Store events and subscriptions
pub mod events;

/// Filesystem abstraction
pub mod fs;

/// Identity collaborator
pub mod identity;

/// Data model (workspaces, pages, attachments)
pub mod model;

/// Share links and public share views
pub mod share;

/// Workspace/page data-sync core
pub mod store;
