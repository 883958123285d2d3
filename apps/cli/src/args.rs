use std::env;
use std::path::PathBuf;

#[derive(Debug, Default, PartialEq)]
pub struct ServeArgs {
    pub port: Option<u16>,
    pub token: Option<String>,
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Default, PartialEq)]
pub struct ImportArgs {
    pub source: PathBuf,
    pub start_time: Option<String>,
    pub path: Option<String>,
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, PartialEq)]
pub enum Command {
    Serve(ServeArgs),
    Import(ImportArgs),
}

pub fn parse_args() -> Result<Command, String> {
    parse_from(env::args().skip(1))
}

fn value_for(flag: &str, args: &mut impl Iterator<Item = String>) -> Result<String, String> {
    args.next().ok_or_else(|| format!("missing value for {flag}"))
}

pub fn parse_from(args: impl IntoIterator<Item = String>) -> Result<Command, String> {
    let mut args = args.into_iter().peekable();
    let first = args.peek().cloned();
    match first.as_deref() {
        Some("import") => {
            args.next();
            parse_import(args).map(Command::Import)
        }
        Some("serve") => {
            args.next();
            parse_serve(args).map(Command::Serve)
        }
        _ => parse_serve(args).map(Command::Serve),
    }
}

fn parse_serve(mut args: impl Iterator<Item = String>) -> Result<ServeArgs, String> {
    let mut parsed = ServeArgs::default();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--port" => {
                let value = value_for("--port", &mut args)?;
                let port = value
                    .parse::<u16>()
                    .map_err(|_| format!("invalid port value: {value}"))?;
                parsed.port = Some(port);
            }
            "--token" => parsed.token = Some(value_for("--token", &mut args)?),
            "--data-dir" => {
                parsed.data_dir = Some(PathBuf::from(value_for("--data-dir", &mut args)?));
            }
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            _ => {
                return Err(format!("unknown argument: {arg}"));
            }
        }
    }
    Ok(parsed)
}

fn parse_import(mut args: impl Iterator<Item = String>) -> Result<ImportArgs, String> {
    let mut parsed = ImportArgs::default();
    let mut source = None;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--start-time" => parsed.start_time = Some(value_for("--start-time", &mut args)?),
            "--path" => parsed.path = Some(value_for("--path", &mut args)?),
            "--data-dir" => {
                parsed.data_dir = Some(PathBuf::from(value_for("--data-dir", &mut args)?));
            }
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            value if value.starts_with("--") => {
                return Err(format!("unknown argument: {value}"));
            }
            value => {
                if source.is_some() {
                    return Err(format!("unexpected argument: {value}"));
                }
                source = Some(PathBuf::from(value));
            }
        }
    }
    parsed.source = source.ok_or_else(|| "import needs a file or directory".to_string())?;
    Ok(parsed)
}

pub fn print_help() {
    println!(
        "Runmap CLI\n\n\
Usage:\n  runmap [serve] [--port <port>] [--token <token>] [--data-dir <dir>]\n  \
runmap import <file|dir> [--start-time <time>] [--path <key>] [--data-dir <dir>]\n\n\
Options:\n  --port <port>       Override the configured port for this run only\n  \
--token <token>     API token required in the x-runmap-token header\n  \
--data-dir <dir>    Directory holding the run database and stored tracks\n  \
--start-time <time> Start time recorded for imported runs\n  \
--path <key>        Storage key for a single imported file\n  \
-h, --help          Show this help message\n"
    );
}
