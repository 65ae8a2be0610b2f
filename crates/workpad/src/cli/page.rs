//! Page subcommands.

use std::path::PathBuf;

use clap::Subcommand;
use futures_lite::future::block_on;

use workpad_core::error::Result;
use workpad_core::model::PageUpdate;

use super::AppContext;

#[derive(Subcommand)]
pub enum PageCommand {
    /// Create a page with an empty body and select it
    Create {
        /// Workspace id
        workspace: String,
        /// Page title
        title: String,
    },
    /// Update any subset of a page's title, body, and visibility
    Edit {
        /// Workspace id
        workspace: String,
        /// Page id
        page: String,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New HTML body
        #[arg(long, conflicts_with = "body_file")]
        body: Option<String>,
        /// Read the new HTML body from a file
        #[arg(long)]
        body_file: Option<PathBuf>,
    },
    /// Delete a page and its attachments
    Delete {
        /// Workspace id
        workspace: String,
        /// Page id
        page: String,
    },
    /// Print a page's body
    Show {
        /// Workspace id
        workspace: String,
        /// Page id
        page: String,
    },
    /// Make a page publicly viewable, or private again with --off
    Publish {
        /// Workspace id
        workspace: String,
        /// Page id
        page: String,
        /// Make the page private instead
        #[arg(long)]
        off: bool,
    },
}

pub fn run(ctx: &AppContext, cmd: PageCommand) -> Result<()> {
    match cmd {
        PageCommand::Create { workspace, title } => {
            let id = block_on(ctx.store.create_page(&workspace, &title))?;
            println!("Created page {id}");
            Ok(())
        }
        PageCommand::Edit {
            workspace,
            page,
            title,
            body,
            body_file,
        } => {
            let mut update = PageUpdate::new();
            if let Some(title) = title {
                update = update.title(title);
            }
            if let Some(body) = body {
                update = update.body(body);
            }
            if let Some(path) = body_file {
                update = update.body(std::fs::read_to_string(path)?);
            }
            if update.is_empty() {
                println!("Nothing to change");
                return Ok(());
            }
            block_on(ctx.store.update_page(&workspace, &page, update))?;
            println!("Updated {page}");
            Ok(())
        }
        PageCommand::Delete { workspace, page } => {
            block_on(ctx.store.delete_page(&workspace, &page))?;
            println!("Deleted {page}");
            Ok(())
        }
        PageCommand::Show { workspace, page } => {
            let Some(found) = ctx
                .store
                .workspace(&workspace)
                .and_then(|ws| ws.page(&page).cloned())
            else {
                println!("No page with id {page}");
                return Ok(());
            };
            let visibility = if found.public { "public" } else { "private" };
            println!("# {}  ({visibility})", found.title);
            println!("{}", found.body);
            for attachment in &found.attachments {
                println!("[attachment] {}  {}", attachment.id, attachment.name);
            }
            Ok(())
        }
        PageCommand::Publish {
            workspace,
            page,
            off,
        } => {
            block_on(ctx.store.set_page_visibility(&workspace, &page, !off))?;
            println!("{} {page}", if off { "Unpublished" } else { "Published" });
            Ok(())
        }
    }
}
