use std::env;
use std::io::{self, Read};
use std::path::Path;

use ingest::{PreparedRun, collect_track_files, prepare_files, prepare_run};

fn print_report(label: &str, prepared: &PreparedRun) {
    let metrics = prepared.inferred_metrics();
    println!("file {}", label);
    println!("content_hash {}", prepared.content_hash);
    println!("segments {}", prepared.parsed.segment_count());
    println!("points {}", prepared.parsed.point_count());
    println!(
        "start_time {}",
        metrics.start_time.as_deref().unwrap_or("-")
    );
    match metrics.duration_s {
        Some(duration) => println!("duration_s {}", duration),
        None => println!("duration_s -"),
    }
    println!("distance_km {:.3}", metrics.distance_km.unwrap_or(0.0));
    println!("geometry_bytes {}", prepared.geometry.len());
}

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        eprintln!("usage: ingest_cli <file|dir|->");
        std::process::exit(2);
    }

    let path = &args[1];
    if path == "-" {
        let mut data = Vec::new();
        io::stdin().read_to_end(&mut data).unwrap_or_else(|err| {
            eprintln!("failed to read stdin: {}", err);
            std::process::exit(1);
        });
        match prepare_run(&data) {
            Ok(prepared) => print_report("-", &prepared),
            Err(err) => {
                eprintln!("{}: {}", err.kind().as_str(), err);
                std::process::exit(3);
            }
        }
        return;
    }

    let scan = collect_track_files(Path::new(path));
    for issue in &scan.issues {
        eprintln!("skipped {}: {}", issue.file_path, issue.message);
    }
    if scan.files.is_empty() {
        eprintln!("no track files found under {}", path);
        std::process::exit(3);
    }

    let (reports, issues) = prepare_files(scan.files);
    for issue in &issues {
        eprintln!("failed to read {}: {}", issue.file_path, issue.message);
    }
    let mut failed = issues.len();
    for report in &reports {
        let label = report.path.to_string_lossy();
        match &report.outcome {
            Ok(prepared) => {
                print_report(&label, prepared);
                println!("bytes_read {}", report.bytes_read);
                println!("elapsed_ms {}", report.duration.as_millis());
            }
            Err(err) => {
                failed += 1;
                eprintln!("{} {}: {}", label, err.kind().as_str(), err);
            }
        }
    }
    if failed > 0 {
        std::process::exit(3);
    }
}
