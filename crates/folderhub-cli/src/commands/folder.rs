//! Folder management CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use folderhub_core::config::AppConfig;
use folderhub_core::error::AppError;
use folderhub_core::types::{FolderId, OwnerId};
use folderhub_entity::folder::Folder;
use folderhub_service::{
    CopyFolderRequest, CreateFolderRequest, FolderService, MoveFolderRequest, RequestContext,
    TreeService, UpdateFolderRequest,
};

/// Arguments for folder commands
#[derive(Debug, Args)]
pub struct FolderArgs {
    /// Account that owns the folders
    #[arg(short, long, global = true, env = "FOLDERHUB_OWNER")]
    pub owner: Option<OwnerId>,

    /// Folder subcommand
    #[command(subcommand)]
    pub command: FolderCommand,
}

/// Folder subcommands
#[derive(Debug, Subcommand)]
pub enum FolderCommand {
    /// List the children of a folder (default: the root)
    List {
        /// Parent folder ID
        #[arg(short, long)]
        parent_id: Option<FolderId>,
    },
    /// Show a single folder
    Get {
        /// Folder ID
        id: FolderId,
    },
    /// Create a new folder
    Create {
        /// Folder name
        #[arg(short, long)]
        name: String,
        /// Parent folder ID (omit for the root)
        #[arg(short, long)]
        parent_id: Option<FolderId>,
        /// Display color
        #[arg(long)]
        color: Option<String>,
        /// Description
        #[arg(long)]
        description: Option<String>,
    },
    /// Rename a folder and/or change its attributes
    #[command(alias = "rename")]
    Update {
        /// Folder ID
        id: FolderId,
        /// New name
        #[arg(short, long)]
        name: Option<String>,
        /// New display color
        #[arg(long)]
        color: Option<String>,
        /// New description
        #[arg(long)]
        description: Option<String>,
    },
    /// Move a folder under another parent
    Move {
        /// Folder ID
        id: FolderId,
        /// Destination folder ID (omit for the root)
        #[arg(short, long)]
        to: Option<FolderId>,
    },
    /// Create an empty copy of a folder
    Copy {
        /// Folder ID
        id: FolderId,
        /// Destination folder ID (omit to copy next to the source)
        #[arg(short, long)]
        to: Option<FolderId>,
        /// Name for the copy
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Move a folder to the trash
    Trash {
        /// Folder ID
        id: FolderId,
    },
    /// Restore a folder from the trash
    Restore {
        /// Folder ID
        id: FolderId,
    },
    /// Permanently delete a folder and everything below it
    Delete {
        /// Folder ID
        id: FolderId,
        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },
    /// Star a folder
    Star {
        /// Folder ID
        id: FolderId,
    },
    /// Unstar a folder
    Unstar {
        /// Folder ID
        id: FolderId,
    },
    /// List starred folders
    Starred,
    /// List trashed folders
    Trashed,
    /// Search folders by name
    Search {
        /// Text to look for
        query: String,
    },
    /// Show the ancestor chain of a folder
    Path {
        /// Folder ID
        id: FolderId,
    },
    /// Show the folder tree
    Tree {
        /// Folder to start from (default: the root)
        #[arg(short, long)]
        root_id: Option<FolderId>,
        /// Max depth to print
        #[arg(short, long)]
        depth: Option<usize>,
    },
}

/// Folder display row
#[derive(Debug, Serialize, Tabled)]
struct FolderRow {
    /// Folder ID
    id: String,
    /// Name
    name: String,
    /// Path
    path: String,
    /// Depth
    depth: i32,
    /// Starred
    starred: bool,
    /// Trashed
    trashed: bool,
    /// Updated at
    updated_at: String,
}

impl From<&Folder> for FolderRow {
    fn from(f: &Folder) -> Self {
        Self {
            id: f.id.to_string(),
            name: if f.is_root { "/".to_string() } else { f.name.clone() },
            path: f.path.clone(),
            depth: f.depth,
            starred: f.starred,
            trashed: f.trashed,
            updated_at: f.updated_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

fn rows(folders: &[Folder]) -> Vec<FolderRow> {
    folders.iter().map(FolderRow::from).collect()
}

/// Execute folder commands
pub async fn execute(
    args: &FolderArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let owner = args
        .owner
        .ok_or_else(|| AppError::validation("An owner is required (--owner or FOLDERHUB_OWNER)"))?;
    let ctx = RequestContext::new(owner);
    let (folders, tree) = super::create_services(config).await?;

    let result = run(&args.command, &ctx, &folders, &tree, format).await;
    // Activity is recorded in the background; let it land before exiting.
    folders.shutdown().await;
    result
}

async fn run(
    command: &FolderCommand,
    ctx: &RequestContext,
    folders: &FolderService,
    tree: &TreeService,
    format: OutputFormat,
) -> Result<(), AppError> {
    match command {
        FolderCommand::List { parent_id } => {
            let children = folders.list(ctx, *parent_id).await?;
            output::print_list(&rows(&children), format);
        }
        FolderCommand::Get { id } => {
            let folder = folders.get(ctx, *id).await?;
            output::print_item(&FolderRow::from(&folder), format);
        }
        FolderCommand::Create {
            name,
            parent_id,
            color,
            description,
        } => {
            let folder = folders
                .create(
                    ctx,
                    CreateFolderRequest {
                        name: name.clone(),
                        parent_id: *parent_id,
                        color: color.clone(),
                        description: description.clone(),
                    },
                )
                .await?;
            output::print_success(&format!("Folder '{}' created (id: {})", folder.path, folder.id));
        }
        FolderCommand::Update {
            id,
            name,
            color,
            description,
        } => {
            let folder = folders
                .update(
                    ctx,
                    *id,
                    UpdateFolderRequest {
                        name: name.clone(),
                        color: color.clone(),
                        description: description.clone(),
                    },
                )
                .await?;
            output::print_success(&format!("Folder updated: {}", folder.path));
        }
        FolderCommand::Move { id, to } => {
            let folder = folders
                .move_folder(ctx, *id, MoveFolderRequest { parent_id: *to })
                .await?;
            output::print_success(&format!("Folder moved to {}", folder.path));
        }
        FolderCommand::Copy { id, to, name } => {
            let copy = folders
                .copy(
                    ctx,
                    *id,
                    CopyFolderRequest {
                        parent_id: *to,
                        name: name.clone(),
                    },
                )
                .await?;
            output::print_success(&format!("Folder copied to {} (id: {})", copy.path, copy.id));
        }
        FolderCommand::Trash { id } => {
            let folder = folders.trash(ctx, *id).await?;
            output::print_success(&format!("Folder trashed: {}", folder.path));
        }
        FolderCommand::Restore { id } => {
            let folder = folders.restore(ctx, *id).await?;
            output::print_success(&format!("Folder restored: {}", folder.path));
        }
        FolderCommand::Delete { id, force } => {
            let folder = folders.get(ctx, *id).await?;
            if !force {
                let confirm = dialoguer::Confirm::new()
                    .with_prompt(format!(
                        "Permanently delete '{}' and everything below it?",
                        folder.path
                    ))
                    .default(false)
                    .interact()
                    .map_err(|e| AppError::internal(format!("Input error: {e}")))?;

                if !confirm {
                    println!("Cancelled.");
                    return Ok(());
                }
            }

            let affected = folders.delete(ctx, *id).await?;
            output::print_success(&format!(
                "Deleted {} ({affected} folder(s) removed)",
                folder.path
            ));
        }
        FolderCommand::Star { id } => {
            let folder = folders.star(ctx, *id).await?;
            output::print_success(&format!("Starred {}", folder.path));
        }
        FolderCommand::Unstar { id } => {
            let folder = folders.unstar(ctx, *id).await?;
            output::print_success(&format!("Unstarred {}", folder.path));
        }
        FolderCommand::Starred => {
            let starred = folders.list_starred(ctx).await?;
            output::print_list(&rows(&starred), format);
        }
        FolderCommand::Trashed => {
            let trashed = folders.list_trashed(ctx).await?;
            output::print_list(&rows(&trashed), format);
        }
        FolderCommand::Search { query } => {
            let found = folders.search(ctx, query).await?;
            output::print_list(&rows(&found), format);
        }
        FolderCommand::Path { id } => {
            let chain = folders.get_path(ctx, *id).await?;
            output::print_list(&rows(&chain), format);
        }
        FolderCommand::Tree { root_id, depth } => {
            let view = tree.get_tree(ctx, *root_id).await?;
            match format {
                OutputFormat::Json => {
                    let json = serde_json::to_string_pretty(&view)
                        .map_err(|e| AppError::internal(format!("Failed to encode tree: {e}")))?;
                    println!("{json}");
                }
                OutputFormat::Table => output::print_tree(&view.root, *depth),
            }
            if !view.is_complete() {
                output::print_warning(&format!(
                    "{} folder(s) could not be read; their children are missing",
                    view.failed.len()
                ));
            }
        }
    }

    Ok(())
}
