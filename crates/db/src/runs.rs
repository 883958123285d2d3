use chrono::{SecondsFormat, Utc};
use rusqlite::{OptionalExtension, params};
use runmap_core::{NewRun, RunRecord};

use crate::Db;
use crate::error::{DbError, Result};
use crate::helpers::{RUN_COLUMNS, row_to_run};

impl Db {
    /// Inserts one run and returns its row id.
    ///
    /// `content_hash` is unique; inserting the same content twice fails with a
    /// constraint violation rather than returning the existing id.
    pub fn insert_run(&self, run: &NewRun) -> Result<i64> {
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        self.conn.execute(
            r#"
            INSERT INTO run (
              wkt, start_time, duration_s, distance_km, source_file, content_hash, created_at
            ) VALUES (
              ?1, ?2, ?3, ?4, ?5, ?6, ?7
            )
            "#,
            params![
                run.wkt,
                run.start_time,
                run.duration_s,
                run.distance_km,
                run.source_file,
                run.content_hash,
                now,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_run(&self, id: i64) -> Result<Option<RunRecord>> {
        self.conn
            .query_row(
                &format!("SELECT {RUN_COLUMNS} FROM run WHERE id = ?1"),
                params![id],
                row_to_run,
            )
            .optional()
            .map_err(DbError::from)
    }

    pub fn get_run_by_hash(&self, content_hash: &str) -> Result<Option<RunRecord>> {
        self.conn
            .query_row(
                &format!("SELECT {RUN_COLUMNS} FROM run WHERE content_hash = ?1"),
                params![content_hash],
                row_to_run,
            )
            .optional()
            .map_err(DbError::from)
    }

    pub fn list_runs(&self, limit: u32, offset: u32) -> Result<Vec<RunRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {RUN_COLUMNS}
            FROM run
            ORDER BY COALESCE(start_time, created_at) DESC, id DESC
            LIMIT ?1 OFFSET ?2
            "#
        ))?;
        let rows = stmt
            .query_map(params![limit as i64, offset as i64], row_to_run)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn count_runs(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM run", [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }
}
