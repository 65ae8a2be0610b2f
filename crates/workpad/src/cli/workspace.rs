//! Workspace subcommands.

use clap::Subcommand;
use futures_lite::future::block_on;

use workpad_core::error::Result;

use super::AppContext;

#[derive(Subcommand)]
pub enum WorkspaceCommand {
    /// List all workspaces
    List,
    /// Create a workspace and select it
    Create {
        /// Display name
        name: String,
    },
    /// Rename a workspace
    Rename {
        /// Workspace id
        id: String,
        /// New display name
        name: String,
    },
    /// Delete a workspace and everything in it
    Delete {
        /// Workspace id
        id: String,
    },
    /// Show a workspace and its pages
    Show {
        /// Workspace id
        id: String,
    },
}

pub fn run(ctx: &AppContext, cmd: WorkspaceCommand) -> Result<()> {
    match cmd {
        WorkspaceCommand::List => {
            let workspaces = ctx.store.workspaces();
            if workspaces.is_empty() {
                println!("No workspaces");
                return Ok(());
            }
            let selected = ctx.store.current_workspace_id();
            for ws in workspaces {
                let marker = if selected.as_deref() == Some(ws.id.as_str()) {
                    "*"
                } else {
                    " "
                };
                let visibility = if ws.public { "public" } else { "private" };
                println!(
                    "{marker} {}  {}  ({} pages, {visibility})",
                    ws.id,
                    ws.name,
                    ws.pages.len()
                );
            }
            Ok(())
        }
        WorkspaceCommand::Create { name } => {
            let id = block_on(ctx.store.create_workspace(&name))?;
            println!("Created workspace {id}");
            Ok(())
        }
        WorkspaceCommand::Rename { id, name } => {
            block_on(ctx.store.rename_workspace(&id, &name))?;
            println!("Renamed {id}");
            Ok(())
        }
        WorkspaceCommand::Delete { id } => {
            block_on(ctx.store.delete_workspace(&id))?;
            println!("Deleted {id}");
            Ok(())
        }
        WorkspaceCommand::Show { id } => {
            let Some(ws) = ctx.store.workspace(&id) else {
                println!("No workspace with id {id}");
                return Ok(());
            };
            let visibility = if ws.public { "public" } else { "private" };
            println!("{}  {}  ({visibility})", ws.id, ws.name);
            for page in &ws.pages {
                let marker = if ws.current_page_id.as_deref() == Some(page.id.as_str()) {
                    "*"
                } else {
                    " "
                };
                println!(
                    "  {marker} {}  {}  ({} attachments)",
                    page.id,
                    page.title,
                    page.attachments.len()
                );
            }
            Ok(())
        }
    }
}
