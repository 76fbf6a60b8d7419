// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! clearcast CLI
//!
//! Thin glue: argument parsing, logging setup and exit-code dispatch. All
//! decisions live in the library's workflow engine. stdout carries exactly
//! one JSON line; diagnostics go to stderr.

use std::env;
use std::process::ExitCode;

use clearcast::{ChromeSurface, Job, Report, SessionStore, WorkflowConfig, WorkflowEngine};

#[tokio::main]
async fn main() -> ExitCode {
    // Diagnostics on stderr; stdout is reserved for the structured report
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("clearcast=info".parse().expect("valid directive")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("--help") | Some("-h") | Some("help") => {
            print_usage();
            return ExitCode::SUCCESS;
        }
        Some("--version") | Some("-v") | Some("version") => {
            println!("clearcast {}", clearcast::VERSION);
            return ExitCode::SUCCESS;
        }
        _ => {}
    }

    let job = match parse_job(&args[1..]) {
        Ok(job) => job,
        Err(message) => {
            let report = Report::args(message);
            report.emit();
            return ExitCode::from(report.exit_code());
        }
    };

    let config = WorkflowConfig::default();

    let snapshot = match SessionStore::new(&config.session_path).load() {
        Ok(snapshot) => snapshot,
        Err(e) => {
            let report = Report::from_outcome(&clearcast::WorkflowOutcome::failure(
                clearcast::FailureKind::Generic,
                format!("failed to read session snapshot: {}", e),
            ));
            report.emit();
            return ExitCode::from(report.exit_code());
        }
    };

    let engine = WorkflowEngine::new(config.clone());
    let mut surface = ChromeSurface::new(config);

    let outcome = engine.run(&mut surface, &job, snapshot.as_ref()).await;

    let report = Report::from_outcome(&outcome);
    report.emit();
    ExitCode::from(report.exit_code())
}

/// Parse `--input <file> --output <file>` from the argument list
fn parse_job(args: &[String]) -> Result<Job, String> {
    let mut input = None;
    let mut output = None;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--input" if i + 1 < args.len() => {
                input = Some(args[i + 1].clone());
                i += 2;
            }
            "--output" if i + 1 < args.len() => {
                output = Some(args[i + 1].clone());
                i += 2;
            }
            other => {
                return Err(format!(
                    "Unexpected argument: {}. Usage: clearcast --input <file> --output <file>",
                    other
                ));
            }
        }
    }

    match (input, output) {
        (Some(input), Some(output)) => Ok(Job::new(input, output)),
        _ => Err("Usage: clearcast --input <file> --output <file>".to_string()),
    }
}

fn print_usage() {
    println!(
        r#"clearcast - upload audio to a UI-only enhancement service and fetch the result

USAGE:
    clearcast --input <file> --output <file>

OPTIONS:
    --input <file>     Audio file to upload
    --output <file>    Where to save the enhanced artifact
    help               Show this help message
    version            Show version information

EXIT CODES:
    0    success
    1    generic/validation failure
    2    session snapshot missing (capture a login session first)
    3    session rejected by the remote service (login again)

The run prints exactly one JSON line on stdout: {{"success":true}} or
{{"error":"<kind>","message":"..."}}. Progress and debug output go to stderr
(set RUST_LOG=clearcast=debug for more).
"#
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_job() {
        let job = parse_job(&strings(&["--input", "a.wav", "--output", "b.wav"])).unwrap();
        assert_eq!(job.input.to_str(), Some("a.wav"));
        assert_eq!(job.output.to_str(), Some("b.wav"));
    }

    #[test]
    fn test_parse_job_order_independent() {
        let job = parse_job(&strings(&["--output", "b.wav", "--input", "a.wav"])).unwrap();
        assert_eq!(job.input.to_str(), Some("a.wav"));
    }

    #[test]
    fn test_parse_job_missing_args() {
        assert!(parse_job(&strings(&["--input", "a.wav"])).is_err());
        assert!(parse_job(&[]).is_err());
        assert!(parse_job(&strings(&["--frobnicate"])).is_err());
    }
}
