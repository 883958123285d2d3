mod args;
mod config;
mod dirs;

use std::io;
use std::net::SocketAddr;
use std::path::Path;

use app_api::AppContext;
use http_api::{HttpState, TOKEN_HEADER, generate_token};
use ingest::{RunOverrides, UploadRequest, collect_track_files};
use runmap_app::{AppConfig, AppPaths, AppState, ensure_app_data_dir, parse_optional_start_time};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::args::{Command, ImportArgs, ServeArgs};
use crate::config::CliConfig;

const LOG_ENV: &str = "RUNMAP_LOG";

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let command = args::parse_args().map_err(|err| {
        eprintln!("{err}");
        args::print_help();
        io::Error::new(io::ErrorKind::InvalidInput, "invalid arguments")
    })?;

    let config = config::load_or_create().map_err(io::Error::other)?;
    if config.created {
        println!(
            "Created config at {} (default port {}).",
            config.paths.file.display(),
            config.config.port
        );
    }

    match command {
        Command::Serve(args) => serve(args, config.config).await,
        Command::Import(args) => {
            let app_state = open_app(args.data_dir.clone(), &config.config)?;
            tokio::task::spawn_blocking(move || import(&app_state, &args))
                .await?
                .map_err(|err| -> Box<dyn std::error::Error> { err })
        }
    }
}

fn open_app(
    data_dir: Option<std::path::PathBuf>,
    config: &CliConfig,
) -> Result<AppState, Box<dyn std::error::Error>> {
    let data_dir = dirs::resolve_data_dir(data_dir).map_err(io::Error::other)?;
    if data_dir.matched_existing {
        info!(dir = %data_dir.dir.display(), "using existing data dir");
    } else {
        info!(dir = %data_dir.dir.display(), "using data dir");
    }

    let paths = AppPaths::new(data_dir.dir);
    ensure_app_data_dir(&paths).map_err(|err| io::Error::other(err.to_string()))?;
    let app_config =
        AppConfig::from_paths(&paths).with_upload_prefix(config.upload_prefix.clone());
    let app_state = AppState::new(app_config);
    if let Err(err) = app_state.initialize() {
        return Err(io::Error::other(format!("failed to initialize database: {}", err)).into());
    }
    Ok(app_state)
}

async fn serve(args: ServeArgs, config: CliConfig) -> Result<(), Box<dyn std::error::Error>> {
    let app_state = open_app(args.data_dir, &config)?;
    let port = args.port.unwrap_or(config.port);
    let token = args
        .token
        .or(config.token)
        .filter(|token| !token.trim().is_empty())
        .unwrap_or_else(generate_token);

    let context = AppContext { app_state };
    let state = HttpState::new(context, token.clone());
    let router = http_api::router(state);

    let (listener, actual_port, used_fallback) = bind_port(port).await?;
    let url = format!("http://127.0.0.1:{actual_port}");

    if used_fallback {
        warn!(port, actual_port, "configured port was unavailable");
    }

    println!("Runmap is running at {url}");
    println!("Send {TOKEN_HEADER}: {token} with every /api request.");
    println!("Press Ctrl+C to stop.");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn import(app_state: &AppState, args: &ImportArgs) -> Result<(), BoxError> {
    let start_time = parse_optional_start_time(args.start_time.as_deref())
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err.to_string()))?;
    let overrides = RunOverrides {
        start_time,
        ..RunOverrides::default()
    };
    let scan = collect_track_files(&args.source);
    for issue in &scan.issues {
        warn!(file = %issue.file_path, message = %issue.message, "skipped entry");
    }
    if scan.files.is_empty() {
        return Err(io::Error::other(format!(
            "no track files found under {}",
            args.source.display()
        ))
        .into());
    }
    if args.path.is_some() && scan.files.len() > 1 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "--path can only be used when importing a single file",
        )
        .into());
    }

    let mut imported = 0usize;
    let mut failed = 0usize;
    for file in &scan.files {
        match import_file(app_state, file, args.path.clone(), &overrides) {
            Ok((id, key)) => {
                imported += 1;
                println!("{}\tid={}\t{}", file.display(), id, key);
            }
            Err(err) => {
                failed += 1;
                error!(file = %file.display(), error = %err, "import failed");
            }
        }
    }
    println!("imported {imported}, failed {failed}");
    if failed > 0 && imported == 0 {
        return Err(io::Error::other("no runs imported").into());
    }
    Ok(())
}

fn import_file(
    app_state: &AppState,
    file: &Path,
    path: Option<String>,
    overrides: &RunOverrides,
) -> Result<(i64, String), BoxError> {
    let bytes = std::fs::read(file)?;
    let filename = file
        .file_name()
        .map(|name| name.to_string_lossy().to_string());
    let result = app_state.services.ingest.by_upload(UploadRequest {
        bytes,
        filename,
        path,
        overrides: overrides.clone(),
    })?;
    Ok((result.id, result.storage_path.unwrap_or_default()))
}

async fn bind_port(port: u16) -> Result<(tokio::net::TcpListener, u16, bool), io::Error> {
    if port == 0 {
        let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
        let actual_port = listener.local_addr()?.port();
        return Ok((listener, actual_port, false));
    }

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => Ok((listener, port, false)),
        Err(_) => {
            let listener =
                tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
            let actual_port = listener.local_addr()?.port();
            Ok((listener, actual_port, true))
        }
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
