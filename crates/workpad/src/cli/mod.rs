//! Command-line interface wiring.
//!
//! Each subcommand maps onto one store or identity operation; the CLI owns
//! no state of its own beyond the persisted config.

mod attach;
mod auth;
mod item;
mod page;
mod share;
mod workspace;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use futures_lite::future::block_on;

use workpad_core::config::{Backend, Config};
use workpad_core::datastore::{Datastore, LocalDatastore, SqliteDatastore};
use workpad_core::error::Result;
use workpad_core::events::StoreEvent;
use workpad_core::fs::RealFileSystem;
use workpad_core::identity::{IdentityProvider, LocalIdentity};
use workpad_core::share::ShareLinks;
use workpad_core::store::WorkspaceStore;

#[derive(Parser)]
#[command(name = "workpad", version, about = "Workspace note/image organizer")]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create an account and log in
    Signup {
        /// Email address for the new account
        email: String,
    },
    /// Log in to an existing account
    Login {
        /// Email address of the account
        email: String,
    },
    /// End the current session
    Logout,
    /// Show the active account
    Whoami,
    /// Manage workspaces
    #[command(subcommand)]
    Workspace(workspace::WorkspaceCommand),
    /// Manage pages within a workspace
    #[command(subcommand)]
    Page(page::PageCommand),
    /// Add flattened note/image items to a workspace
    #[command(subcommand)]
    Item(item::ItemCommand),
    /// Manage page attachments
    #[command(subcommand)]
    Attach(attach::AttachCommand),
    /// Share links and public views
    #[command(subcommand)]
    Share(share::ShareCommand),
}

/// Everything a command handler needs: the loaded config, the identity
/// provider, and the store wired to the configured backend.
pub struct AppContext {
    pub config: Config,
    pub identity: LocalIdentity,
    pub store: WorkspaceStore,
}

impl AppContext {
    fn build() -> Result<Self> {
        let config = Config::load()?;
        std::fs::create_dir_all(&config.data_dir)?;
        log::debug!("using {:?} backend under {:?}", config.backend, config.data_dir);

        let fs = Arc::new(RealFileSystem);
        let datastore: Arc<dyn Datastore> = match config.backend {
            Backend::Sqlite => Arc::new(SqliteDatastore::open(config.data_dir.join("workpad.db"))?),
            Backend::Local => Arc::new(LocalDatastore::new(fs.clone(), config.data_dir.clone())),
        };

        let identity = LocalIdentity::with_storage(fs, config.data_dir.join("users.json"));
        if let Some(user) = config.session_user() {
            identity.restore_session(user);
        }

        let store = WorkspaceStore::new(datastore, ShareLinks::new(config.share_origin.clone()));
        store.subscribe(Arc::new(|event| {
            if let StoreEvent::RemoteWriteFailed { operation, message } = event {
                eprintln!("warning: {operation} failed in the datastore: {message}");
            }
        }));
        block_on(store.set_identity(identity.current_user()));

        Ok(Self {
            config,
            identity,
            store,
        })
    }
}

/// Parse arguments and dispatch to the matching handler.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let mut ctx = AppContext::build()?;

    match cli.command {
        Command::Signup { email } => auth::signup(&mut ctx, &email),
        Command::Login { email } => auth::login(&mut ctx, &email),
        Command::Logout => auth::logout(&mut ctx),
        Command::Whoami => auth::whoami(&ctx),
        Command::Workspace(cmd) => workspace::run(&ctx, cmd),
        Command::Page(cmd) => page::run(&ctx, cmd),
        Command::Item(cmd) => item::run(&ctx, cmd),
        Command::Attach(cmd) => attach::run(&ctx, cmd),
        Command::Share(cmd) => share::run(&ctx, cmd),
    }
}
