//! Attachment subcommands.

use std::path::PathBuf;

use clap::Subcommand;
use futures_lite::future::block_on;

use workpad_core::error::Result;

use super::AppContext;

#[derive(Subcommand)]
pub enum AttachCommand {
    /// Attach an image file to a page
    Add {
        /// Workspace id
        workspace: String,
        /// Page id
        page: String,
        /// Path to the image file
        file: PathBuf,
        /// Display name (defaults to the filename)
        #[arg(long)]
        name: Option<String>,
    },
    /// Remove an attachment from a page
    Remove {
        /// Workspace id
        workspace: String,
        /// Page id
        page: String,
        /// Attachment id
        attachment: String,
    },
}

pub fn run(ctx: &AppContext, cmd: AttachCommand) -> Result<()> {
    match cmd {
        AttachCommand::Add {
            workspace,
            page,
            file,
            name,
        } => {
            let bytes = std::fs::read(&file)?;
            let name = name.unwrap_or_else(|| {
                file.file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("image.png")
                    .to_string()
            });
            let id = block_on(ctx.store.add_attachment(&workspace, &page, &bytes, &name))?;
            println!("Attached {name} as {id}");
            Ok(())
        }
        AttachCommand::Remove {
            workspace,
            page,
            attachment,
        } => {
            block_on(ctx.store.remove_attachment(&workspace, &page, &attachment))?;
            println!("Removed {attachment}");
            Ok(())
        }
    }
}
