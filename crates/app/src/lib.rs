pub mod app;
pub mod config;
pub mod error;
pub mod services;
pub mod startup;
pub mod util;

pub use app::{AppConfig, AppState};
pub use config::{DEFAULT_LIST_LIMIT, ListParams, MAX_LIST_LIMIT};
pub use error::{ApiError, AppError, Result};
pub use services::{AppServices, IngestService, RunsPage, RunsService};
pub use startup::{AppPaths, ensure_app_data_dir};
pub use util::time::{parse_start_time, parse_optional_start_time};
