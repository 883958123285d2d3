mod ingest;
mod runs;

use std::sync::Arc;

use crate::app::AppConfig;
use crate::error::Result;
use runmap_db::Db;

pub use ingest::IngestService;
pub use runs::{RunsPage, RunsService};

type SharedConfig = Arc<AppConfig>;

/// Service registry for app-level operations.
#[derive(Clone)]
pub struct AppServices {
    pub ingest: IngestService,
    pub runs: RunsService,
}

impl AppServices {
    pub fn new(config: &AppConfig) -> Self {
        let shared = Arc::new(config.clone());
        Self {
            ingest: IngestService::new(shared.clone()),
            runs: RunsService::new(shared),
        }
    }
}

fn open_db(config: &SharedConfig) -> Result<Db> {
    Ok(Db::open(&config.db_path)?)
}
