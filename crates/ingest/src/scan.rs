use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rayon::prelude::*;
use walkdir::WalkDir;

use crate::pipeline::{PreparedRun, prepare_run};
use crate::types::{IngestIssue, Result, ScanResult};

pub fn is_track_path(path: &Path) -> bool {
    path.extension()
        .and_then(|value| value.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gpx"))
}

/// Finds track files under `root`, in path order. A file root is returned as is.
pub fn collect_track_files(root: &Path) -> ScanResult {
    let mut result = ScanResult::default();
    if root.is_file() {
        result.files.push(root.to_path_buf());
        return result;
    }
    for entry in WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                let file_path = err
                    .path()
                    .map(|path| path.to_string_lossy().to_string())
                    .unwrap_or_else(|| "<unknown>".to_string());
                result.issues.push(IngestIssue {
                    file_path,
                    message: err.to_string(),
                });
                continue;
            }
        };
        if entry.file_type().is_file() && is_track_path(entry.path()) {
            result.files.push(entry.into_path());
        }
    }
    result
}

/// Outcome of preparing one file without touching any store.
#[derive(Debug)]
pub struct FileReport {
    pub path: PathBuf,
    pub bytes_read: u64,
    pub outcome: Result<PreparedRun>,
    pub duration: Duration,
}

fn prepare_file(path: PathBuf) -> std::io::Result<FileReport> {
    let started = Instant::now();
    let bytes = fs::read(&path)?;
    let outcome = prepare_run(&bytes);
    Ok(FileReport {
        path,
        bytes_read: bytes.len() as u64,
        outcome,
        duration: started.elapsed(),
    })
}

/// Prepares files in parallel. Read failures become issues; parse failures
/// stay in each report's outcome.
pub fn prepare_files(files: Vec<PathBuf>) -> (Vec<FileReport>, Vec<IngestIssue>) {
    let results = files
        .into_par_iter()
        .map(|path| {
            let file_path = path.to_string_lossy().to_string();
            prepare_file(path).map_err(|err| IngestIssue {
                file_path,
                message: err.to_string(),
            })
        })
        .collect::<Vec<_>>();

    let mut reports = Vec::with_capacity(results.len());
    let mut issues = Vec::new();
    for result in results {
        match result {
            Ok(report) => reports.push(report),
            Err(issue) => issues.push(issue),
        }
    }
    (reports, issues)
}
