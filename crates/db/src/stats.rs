use runmap_core::RunStats;

use crate::Db;
use crate::error::Result;

impl Db {
    pub fn run_stats(&self) -> Result<RunStats> {
        let stats = self.conn.query_row(
            r#"
            SELECT
              COUNT(*),
              COALESCE(SUM(distance_km), 0.0),
              COALESCE(SUM(duration_s), 0),
              MIN(start_time),
              MAX(start_time)
            FROM run
            "#,
            [],
            |row| {
                let run_count: i64 = row.get(0)?;
                Ok(RunStats {
                    run_count: run_count.max(0) as u64,
                    total_distance_km: row.get(1)?,
                    total_duration_s: row.get(2)?,
                    first_start: row.get(3)?,
                    last_start: row.get(4)?,
                })
            },
        )?;
        Ok(stats)
    }
}
