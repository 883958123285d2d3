#![allow(dead_code)]

use std::path::PathBuf;

use runmap_core::NewRun;
use runmap_db::Db;
use tempfile::TempDir;

pub struct TestDb {
    pub _dir: TempDir,
    pub db: Db,
    pub path: PathBuf,
}

pub fn setup_db() -> TestDb {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("test.sqlite");
    let mut db = Db::open(&path).expect("open db");
    db.migrate().expect("migrate db");
    TestDb {
        _dir: dir,
        db,
        path,
    }
}

pub fn make_run(content_hash: &str, start_time: Option<&str>) -> NewRun {
    NewRun {
        wkt: "MULTILINESTRING((-121 38, -121 38.001))".to_string(),
        start_time: start_time.map(str::to_string),
        duration_s: Some(600),
        distance_km: Some(1.5),
        source_file: format!("my-runs/{}.gpx", content_hash),
        content_hash: content_hash.to_string(),
    }
}
