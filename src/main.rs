mod cli;
mod display;
mod generator;
mod logger;
mod monitor;
mod run;
mod tail;

use cli::Cli;
use clap::Parser;
use generator::{GeneratorConfig, TrafficGenerator};
use logger::{Event, Logger};
use monitor::config::Config;
use monitor::Monitor;
use run::{SessionTally, ShutdownFlag};
use chrono::TimeDelta;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn main() -> ExitCode {
    // Parse command-line arguments
    let cli = Cli::parse();

    // Initialize shutdown flag for graceful termination
    let shutdown: ShutdownFlag = Arc::new(AtomicBool::new(false));
    register_shutdown_handler(Arc::clone(&shutdown));

    // Track session duration for summary reporting
    let session_start = Instant::now();

    // Initialize logger with optional JSON output and file logging
    let logger = Arc::new(
        Logger::new(cli.json, cli.log_file.as_deref()).expect("Failed to open log file"),
    );

    // ── Generator mode ────────────────────────────────────────────────────────
    // Handy mode to produce traffic for a second instance to watch.
    if cli.generate {
        let mut traffic = TrafficGenerator::new(GeneratorConfig {
            path: PathBuf::from(&cli.file),
            peak_rate: cli.peak_rate,
        });
        if let Err(e) = traffic.run(shutdown, &logger) {
            logger.log(&Event::Info {
                message: &format!("Generator error: {}", e),
            });
            return ExitCode::FAILURE;
        }
        return ExitCode::SUCCESS;
    }

    // ── Monitoring configuration ──────────────────────────────────────────────
    // The display summarises the last refresh interval, so the store has to
    // retain at least that much history; Config widens it further when the
    // alert window is longer.
    let config = match Config::new(
        TimeDelta::seconds(cli.refresh as i64),
        TimeDelta::seconds(cli.window as i64),
        cli.threshold,
    ) {
        Ok(config) => config,
        Err(e) => {
            logger.log(&Event::Info { message: &format!("{}", e) });
            return ExitCode::FAILURE;
        }
    };

    let mut mon = Monitor::new(config);
    let mut tally = SessionTally::default();

    let result = if cli.offline {
        run::run_offline(Path::new(&cli.file), &mut mon, &logger, &mut tally)
    } else {
        run::run_follow(
            Path::new(&cli.file),
            &mut mon,
            &logger,
            &mut tally,
            Arc::clone(&shutdown),
            Duration::from_secs(cli.refresh),
            cli.top,
        )
    };

    let code = match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            logger.log(&Event::Info {
                message: &format!("Monitor error: {}", e),
            });
            ExitCode::FAILURE
        }
    };

    print_summary(&logger, &tally, session_start);
    code
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Registers a signal handler for graceful shutdown on Ctrl+C.
fn register_shutdown_handler(shutdown: ShutdownFlag) {
    if let Err(e) = ctrlc::set_handler(move || {
        println!("\n[!] Ctrl+C received — shutting down...");
        shutdown.store(true, Ordering::SeqCst);
    }) {
        eprintln!("Failed to register Ctrl+C handler: {}", e);
    }
}

/// Prints the session summary: duration, line counts and alert totals.
fn print_summary(logger: &logger::SharedLogger, tally: &SessionTally, session_start: Instant) {
    logger.log(&Event::SessionSummary {
        duration_secs: session_start.elapsed().as_secs(),
        lines_total: tally.lines_total,
        parse_errors: tally.parse_errors,
        order_errors: tally.order_errors,
        alerts_raised: tally.alerts_raised,
    });
}
