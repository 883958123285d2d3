use serde::Serialize;

use crate::config::ListParams;
use crate::error::{AppError, Result};
use crate::services::{SharedConfig, open_db};
use runmap_core::{RunRecord, RunStats};
use runmap_db::Db;

#[derive(Debug, Clone, Serialize)]
pub struct RunsPage {
    pub runs: Vec<RunRecord>,
    pub total: u64,
    pub limit: u32,
    pub offset: u32,
}

#[derive(Clone)]
pub struct RunsService {
    config: SharedConfig,
}

impl RunsService {
    pub(super) fn new(config: SharedConfig) -> Self {
        Self { config }
    }

    fn db(&self) -> Result<Db> {
        open_db(&self.config)
    }

    pub fn list(&self, params: &ListParams) -> Result<RunsPage> {
        let db = self.db()?;
        let limit = params.limit();
        let offset = params.offset();
        let runs = db.list_runs(limit, offset)?;
        let total = db.count_runs()?;
        Ok(RunsPage {
            runs,
            total,
            limit,
            offset,
        })
    }

    pub fn get(&self, id: i64) -> Result<RunRecord> {
        let db = self.db()?;
        db.get_run(id)?
            .ok_or_else(|| AppError::NotFound(format!("run {} not found", id)))
    }

    pub fn stats(&self) -> Result<RunStats> {
        let db = self.db()?;
        Ok(db.run_stats()?)
    }
}
