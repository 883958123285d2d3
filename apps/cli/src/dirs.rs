use std::path::PathBuf;

const DATA_DIR_ENV: &str = "RUNMAP_DATA_DIR";
const DB_FILE_NAME: &str = "runmap.sqlite";

#[derive(Debug, Clone)]
pub struct DataDirResolution {
    pub dir: PathBuf,
    pub matched_existing: bool,
}

fn expand_home(path: PathBuf) -> PathBuf {
    let Ok(home) = std::env::var("HOME") else {
        return path;
    };
    match path.strip_prefix("~") {
        Ok(rest) => PathBuf::from(home).join(rest),
        Err(_) => path,
    }
}

/// Flag first, then `RUNMAP_DATA_DIR`, then `$HOME/.local/share/runmap`.
pub fn resolve_data_dir(flag: Option<PathBuf>) -> Result<DataDirResolution, String> {
    let dir = match flag {
        Some(dir) => expand_home(dir),
        None => match std::env::var(DATA_DIR_ENV) {
            Ok(dir) if !dir.trim().is_empty() => expand_home(PathBuf::from(dir)),
            _ => {
                let home = std::env::var("HOME").map_err(|err| format!("resolve HOME: {}", err))?;
                PathBuf::from(home)
                    .join(".local")
                    .join("share")
                    .join("runmap")
            }
        },
    };
    let matched_existing = dir.join(DB_FILE_NAME).exists();
    Ok(DataDirResolution {
        dir,
        matched_existing,
    })
}
