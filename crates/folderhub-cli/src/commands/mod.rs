//! CLI command definitions and dispatch.

pub mod folder;
pub mod migrate;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use folderhub_core::config::AppConfig;
use folderhub_core::error::AppError;
use folderhub_database::{DatabasePool, FolderStore, PgActivityLog, PgFolderStore};
use folderhub_service::{ActivityDispatcher, FolderService, TreeService};

use crate::output::OutputFormat;

/// FolderHub: per-account folder hierarchies
#[derive(Debug, Parser)]
#[command(name = "folderhub", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Database migration management
    Migrate(migrate::MigrateArgs),
    /// Folder management
    Folder(folder::FolderArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self, config: &AppConfig) -> Result<(), AppError> {
        match &self.command {
            Commands::Migrate(args) => migrate::execute(args, config).await,
            Commands::Folder(args) => folder::execute(args, config, self.format).await,
        }
    }
}

/// Helper: load configuration from file
pub fn load_config(config_path: &str) -> Result<AppConfig, AppError> {
    AppConfig::load(config_path)
}

/// Helper: create database pool from config
pub async fn create_db_pool(config: &AppConfig) -> Result<sqlx::PgPool, AppError> {
    let pool = DatabasePool::connect(&config.database).await?;
    Ok(pool.into_pool())
}

/// Helper: wire the folder services against PostgreSQL
pub async fn create_services(config: &AppConfig) -> Result<(FolderService, TreeService), AppError> {
    let pool = create_db_pool(config).await?;
    let store: Arc<dyn FolderStore> = Arc::new(PgFolderStore::new(pool.clone()));
    let activity = ActivityDispatcher::new(Arc::new(PgActivityLog::new(pool)));

    let folders = FolderService::new(store.clone(), activity, config.folders.clone());
    let tree = TreeService::new(store, folders.clone());
    Ok((folders, tree))
}
