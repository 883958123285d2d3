use std::path::PathBuf;

use crate::error::Result;
use crate::services::AppServices;
use crate::startup::AppPaths;
use ingest::{DEFAULT_UPLOAD_PREFIX, FsContentStore};
use runmap_db::Db;

/// Paths and settings needed to run the local run store.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub content_root: PathBuf,
    pub upload_prefix: String,
}

impl AppConfig {
    pub fn from_paths(paths: &AppPaths) -> Self {
        Self {
            db_path: paths.db_path.clone(),
            content_root: paths.content_root.clone(),
            upload_prefix: DEFAULT_UPLOAD_PREFIX.to_string(),
        }
    }

    pub fn with_upload_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.upload_prefix = prefix.into();
        self
    }
}

/// Application state shared by frontend backends (HTTP, CLI).
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub services: AppServices,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let services = AppServices::new(&config);
        Self { config, services }
    }

    pub fn is_fresh_db(&self) -> bool {
        !self.config.db_path.exists()
    }

    pub fn setup_db(&self) -> Result<()> {
        setup_db(&self.config.db_path)
    }

    /// Creates the content root and brings the schema up to date.
    pub fn initialize(&self) -> Result<()> {
        let is_fresh_db = self.is_fresh_db();
        std::fs::create_dir_all(&self.config.content_root)?;
        self.setup_db()?;
        if is_fresh_db {
            tracing::info!(db = %self.config.db_path.display(), "created run database");
        }
        Ok(())
    }

    pub fn open_db(&self) -> Result<Db> {
        Ok(Db::open(&self.config.db_path)?)
    }

    pub fn content_store(&self) -> FsContentStore {
        FsContentStore::new(&self.config.content_root)
    }
}

pub fn setup_db(path: &std::path::Path) -> Result<()> {
    let mut db = Db::open(path)?;
    db.migrate()?;
    Ok(())
}
