use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use runmap_core::NewRun;
use runmap_db::Db;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("object not found: {0}")]
    NotFound(String),
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("db error: {0}")]
    Db(#[from] runmap_db::DbError),
}

/// Blob storage addressed by slash-separated keys.
pub trait ContentStore {
    fn get(&self, key: &str) -> Result<Vec<u8>, StoreError>;

    /// Creates the object or overwrites an existing one.
    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError>;
}

/// Persists run rows. The backend owns uniqueness of `content_hash`.
pub trait MetadataStore {
    fn insert_run(&mut self, run: &NewRun) -> Result<i64, StoreError>;
}

impl MetadataStore for Db {
    fn insert_run(&mut self, run: &NewRun) -> Result<i64, StoreError> {
        Ok(Db::insert_run(self, run)?)
    }
}

/// Keeps objects as plain files under `root`.
#[derive(Debug, Clone)]
pub struct FsContentStore {
    root: PathBuf,
}

impl FsContentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, key: &str) -> Result<PathBuf, StoreError> {
        let relative = Path::new(key);
        let valid = !key.trim().is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)))
            && !key.split('/').any(|part| part == "." || part == "..");
        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

impl ContentStore for FsContentStore {
    fn get(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.resolve(key)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(key.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, bytes)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_overwrites_existing_object() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = FsContentStore::new(dir.path());
        store.put("my-runs/a.gpx", b"first").expect("put");
        store.put("my-runs/a.gpx", b"second").expect("overwrite");
        assert_eq!(store.get("my-runs/a.gpx").expect("get"), b"second");
    }

    #[test]
    fn missing_object_is_not_found() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = FsContentStore::new(dir.path());
        let err = store.get("nope.gpx").expect_err("missing");
        assert!(matches!(err, StoreError::NotFound(key) if key == "nope.gpx"));
    }

    #[test]
    fn rejects_keys_outside_root() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = FsContentStore::new(dir.path());
        for key in ["", "  ", "/etc/passwd", "../escape.gpx", "a/../../b.gpx", "./a.gpx"] {
            let err = store.put(key, b"x").expect_err(key);
            assert!(matches!(err, StoreError::InvalidKey(_)), "{key}");
        }
    }

    #[test]
    fn db_metadata_store_rejects_duplicate_hash() {
        let mut db = Db::open_in_memory().expect("db");
        db.migrate().expect("migrate");
        let run = NewRun {
            wkt: "MULTILINESTRING((0 0, 1 1))".to_string(),
            start_time: None,
            duration_s: None,
            distance_km: Some(157.2),
            source_file: "a.gpx".to_string(),
            content_hash: "f".repeat(64),
        };
        let id = MetadataStore::insert_run(&mut db, &run).expect("insert");
        assert!(id > 0);
        let err = MetadataStore::insert_run(&mut db, &run).expect_err("duplicate");
        assert!(matches!(err, StoreError::Db(inner) if inner.is_constraint_violation()));
    }
}
