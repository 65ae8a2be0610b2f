//! Flattened content-item subcommands.

use std::path::PathBuf;

use clap::Subcommand;
use futures_lite::future::block_on;

use workpad_core::error::Result;
use workpad_core::model::{Attachment, ContentKind, NewContentItem};

use super::AppContext;

#[derive(Subcommand)]
pub enum ItemCommand {
    /// Add a note item (becomes a page with the text as its body)
    AddNote {
        /// Workspace id
        workspace: String,
        /// Item title
        title: String,
        /// Note text
        content: String,
    },
    /// Add an image item (becomes a page with one embedded attachment)
    AddImage {
        /// Workspace id
        workspace: String,
        /// Item title
        title: String,
        /// Path to the image file
        file: PathBuf,
    },
}

pub fn run(ctx: &AppContext, cmd: ItemCommand) -> Result<()> {
    match cmd {
        ItemCommand::AddNote {
            workspace,
            title,
            content,
        } => {
            let id = block_on(ctx.store.add_content_item(
                &workspace,
                NewContentItem {
                    kind: ContentKind::Note,
                    title,
                    content,
                },
            ))?;
            println!("Added note as page {id}");
            Ok(())
        }
        ItemCommand::AddImage {
            workspace,
            title,
            file,
        } => {
            let bytes = std::fs::read(&file)?;
            let name = file
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("image.png");
            let id = block_on(ctx.store.add_content_item(
                &workspace,
                NewContentItem {
                    kind: ContentKind::Image,
                    title,
                    content: Attachment::data_uri(&bytes, name),
                },
            ))?;
            println!("Added image as page {id}");
            Ok(())
        }
    }
}
