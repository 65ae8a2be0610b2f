//! Share-link subcommands.
//!
//! `link-*` prints a share URL, publishing the entity first if it is still
//! private. `view-*` resolves a share the way the public routes do: through
//! the datastore's public-filtered queries, so private entities read as
//! not shared.

use clap::Subcommand;
use futures_lite::future::block_on;

use workpad_core::error::Result;
use workpad_core::share::{load_shared_page, load_shared_workspace};

use super::AppContext;

#[derive(Subcommand)]
pub enum ShareCommand {
    /// Print the share link for a page (publishes it if private)
    LinkPage {
        /// Workspace id
        workspace: String,
        /// Page id
        page: String,
    },
    /// Print the share link for a workspace (publishes it if private)
    LinkWorkspace {
        /// Workspace id
        workspace: String,
    },
    /// Resolve a page share view by page id
    ViewPage {
        /// Page id
        page: String,
    },
    /// Resolve a workspace share view by workspace id
    ViewWorkspace {
        /// Workspace id
        workspace: String,
    },
}

pub fn run(ctx: &AppContext, cmd: ShareCommand) -> Result<()> {
    match cmd {
        ShareCommand::LinkPage { workspace, page } => {
            let url = block_on(ctx.store.page_share_link(&workspace, &page))?;
            println!("{url}");
            Ok(())
        }
        ShareCommand::LinkWorkspace { workspace } => {
            let url = block_on(ctx.store.workspace_share_link(&workspace))?;
            println!("{url}");
            Ok(())
        }
        ShareCommand::ViewPage { page } => {
            let datastore = ctx.store.datastore();
            match block_on(load_shared_page(&*datastore, &page))? {
                Some(shared) => {
                    println!("# {}", shared.page.title);
                    println!("{}", shared.page.body);
                    for attachment in &shared.attachments {
                        println!("[attachment] {}", attachment.name);
                    }
                }
                None => println!("Not shared"),
            }
            Ok(())
        }
        ShareCommand::ViewWorkspace { workspace } => {
            let datastore = ctx.store.datastore();
            match block_on(load_shared_workspace(&*datastore, &workspace))? {
                Some(shared) => {
                    println!("# {}", shared.workspace.name);
                    for page in &shared.pages {
                        println!("  {}  {}", page.id, page.title);
                    }
                }
                None => println!("Not shared"),
            }
            Ok(())
        }
    }
}
