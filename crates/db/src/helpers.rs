use rusqlite::Row;
use runmap_core::RunRecord;

pub(crate) const RUN_COLUMNS: &str =
    "id, wkt, start_time, duration_s, distance_km, source_file, content_hash, created_at";

pub(crate) fn row_to_run(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        wkt: row.get(1)?,
        start_time: row.get(2)?,
        duration_s: row.get(3)?,
        distance_km: row.get(4)?,
        source_file: row.get(5)?,
        content_hash: row.get(6)?,
        created_at: row.get(7)?,
    })
}
