//! The two processing loops: offline replay and live follow.
//!
//! Both loops funnel every call into the engine through one thread, so the
//! engine itself needs no synchronization. Live mode multiplexes its two
//! event sources — the tail channel and the refresh deadline — with a single
//! `recv_timeout` consumer; replay mode is the same pipeline with no timer.
//! Per-line failures are tallied and skipped, never fatal; only a missing
//! source or an invalid refresh interval aborts.

use crate::display;
use crate::logger::{Event, SharedLogger};
use crate::monitor::alerter::Alert;
use crate::monitor::error::Error;
use crate::monitor::Monitor;
use crate::tail::Tailer;
use chrono::{TimeDelta, Utc};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::RecvTimeoutError;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Set to `true` by the ctrlc handler; the loops exit on the next iteration.
pub type ShutdownFlag = Arc<AtomicBool>;

/// Per-session counters, printed as the summary on shutdown.
#[derive(Debug, Default)]
pub struct SessionTally {
    pub lines_total: u64,
    pub parse_errors: u64,
    pub order_errors: u64,
    pub alerts_raised: u64,
}

/// Feeds one raw line through the monitor, tallying the outcome and logging
/// any confirmed alert transition.
fn ingest_line(mon: &mut Monitor, line: &str, logger: &SharedLogger, tally: &mut SessionTally) {
    tally.lines_total += 1;

    match mon.ingest(line) {
        Ok(Some(alert)) => {
            if alert.is_ongoing() {
                tally.alerts_raised += 1;
            }
            log_transition(logger, &alert);
        }
        Ok(None) => {}
        Err(Error::Parse(_)) => tally.parse_errors += 1,
        Err(Error::OutOfOrder { .. }) => tally.order_errors += 1,
        // ingest only produces the recoverable per-line errors above.
        Err(_) => {}
    }
}

fn log_transition(logger: &SharedLogger, alert: &Alert) {
    match alert.end {
        None => logger.log(&Event::AlertRaised {
            time: &alert.start.to_rfc3339(),
            rate: alert.value,
        }),
        Some(end) => logger.log(&Event::AlertCleared {
            time: &end.to_rfc3339(),
            duration_secs: (end - alert.start).num_seconds(),
        }),
    }
}

// ── Offline replay ────────────────────────────────────────────────────────────

/// Replays the whole file through the monitor in one pass.
///
/// Alert transitions are logged as the lines that confirm them are read.
pub fn run_offline(
    path: &Path,
    mon: &mut Monitor,
    logger: &SharedLogger,
    tally: &mut SessionTally,
) -> Result<(), Error> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    for line in reader.lines() {
        let line = line?;
        ingest_line(mon, &line, logger, tally);
    }

    Ok(())
}

// ── Live follow ───────────────────────────────────────────────────────────────

/// Follows the file and refreshes the operator dashboard on a fixed cadence.
///
/// One consumer drains both event sources: a line from the tailer advances
/// the monitor, a refresh deadline redraws the screen. Runs until the
/// shutdown flag is set or the tailer stops.
pub fn run_follow(
    path: &Path,
    mon: &mut Monitor,
    logger: &SharedLogger,
    tally: &mut SessionTally,
    shutdown: ShutdownFlag,
    refresh: Duration,
    top: usize,
) -> Result<(), Error> {
    if refresh.is_zero() {
        return Err(Error::Config("refresh interval must be positive".to_string()));
    }

    let tailer = Tailer::follow(path, Arc::clone(&shutdown))?;
    let refresh_window = TimeDelta::from_std(refresh)
        .map_err(|_| Error::Config("refresh interval out of range".to_string()))?;

    let mut next_tick = Instant::now() + refresh;

    while !shutdown.load(Ordering::Relaxed) {
        let timeout = next_tick.saturating_duration_since(Instant::now());

        match tailer.lines().recv_timeout(timeout) {
            Ok(line) => ingest_line(mon, &line, logger, tally),
            Err(RecvTimeoutError::Timeout) => {
                render_tick(mon, refresh_window, top);
                next_tick += refresh;
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    tailer.join();
    Ok(())
}

/// Redraws the dashboard for one refresh interval.
///
/// The stream is processed in event time: statistics are only shown when the
/// newest ingested record is younger than one refresh interval, otherwise
/// the dashboard reports that there is nothing to process (the log source
/// may simply be lagging).
fn render_tick(mon: &Monitor, refresh_window: TimeDelta, top: usize) {
    display::clear_screen();

    let wall_now = Utc::now().fixed_offset();
    let fresh = mon
        .last_seen()
        .is_some_and(|last| last > wall_now - refresh_window);

    if fresh {
        let stats = mon.stats(refresh_window, top);
        // last_seen is Some whenever fresh holds.
        let now = mon.last_seen().unwrap_or(wall_now);
        display::render_stats(stats.as_ref(), now, refresh_window);
    } else {
        display::render_stats(None, wall_now, refresh_window);
    }

    display::render_alerts(mon.alerts());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::Logger;
    use crate::monitor::config::Config;
    use crate::monitor::request::tests_support::request_at;
    use chrono::{DateTime, FixedOffset, TimeZone};
    use std::io::Write;

    fn start() -> DateTime<FixedOffset> {
        chrono::Utc.with_ymd_and_hms(2019, 5, 3, 0, 0, 0).unwrap().fixed_offset()
    }

    fn quiet_logger() -> SharedLogger {
        Arc::new(Logger::new(false, None).unwrap())
    }

    /// Renders one log line per request of a rate profile: `profile[i]`
    /// requests per second, each step lasting `step_secs` seconds.
    fn profile_lines(profile: &[(usize, u32)]) -> Vec<String> {
        let mut now = start();
        let mut lines = Vec::new();
        for &(rate, steps) in profile {
            for _ in 0..steps {
                for _ in 0..rate {
                    lines.push(request_at(now).to_string());
                }
                now += TimeDelta::seconds(1);
            }
        }
        lines
    }

    fn monitor() -> Monitor {
        let config =
            Config::new(TimeDelta::seconds(10), TimeDelta::seconds(5), 10.0).unwrap();
        Monitor::new(config)
    }

    #[test]
    fn offline_replay_of_bursty_traffic_raises_two_alerts() {
        // 10s at 5/s, 10s at 20/s, 10s at 5/s, 10s at 20/s, 10s silent,
        // 10s at 5/s: two sustained breaches, two alerts.
        let lines = profile_lines(&[(5, 10), (20, 10), (5, 10), (20, 10), (0, 10), (5, 10)]);
        assert_eq!(lines.len(), 550);

        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        for line in &lines {
            writeln!(tmp, "{line}").unwrap();
        }
        tmp.flush().unwrap();

        let mut mon = monitor();
        let mut tally = SessionTally::default();
        run_offline(tmp.path(), &mut mon, &quiet_logger(), &mut tally).unwrap();

        assert_eq!(mon.alerts().len(), 2);
        assert!(mon.alerts().iter().all(|a| !a.is_ongoing()));
        assert_eq!(tally.lines_total, 550);
        assert_eq!(tally.parse_errors, 0);
        assert_eq!(tally.alerts_raised, 2);
    }

    #[test]
    fn offline_replay_of_short_spikes_raises_two_alerts() {
        // Short, very tall spikes: 10s at 1/s, 4s at 100/s, twice over.
        let lines = profile_lines(&[(1, 10), (100, 4), (1, 10), (100, 4), (1, 10)]);
        assert_eq!(lines.len(), 830);

        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        for line in &lines {
            writeln!(tmp, "{line}").unwrap();
        }
        tmp.flush().unwrap();

        let mut mon = monitor();
        let mut tally = SessionTally::default();
        run_offline(tmp.path(), &mut mon, &quiet_logger(), &mut tally).unwrap();

        assert_eq!(mon.alerts().len(), 2);
    }

    #[test]
    fn offline_skips_bad_lines_and_keeps_going() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, "this is not a log line").unwrap();
        writeln!(tmp, "{}", request_at(start())).unwrap();
        // Out of order relative to the previous record.
        writeln!(tmp, "{}", request_at(start() - TimeDelta::seconds(5))).unwrap();
        writeln!(tmp, "{}", request_at(start() + TimeDelta::seconds(1))).unwrap();
        tmp.flush().unwrap();

        let mut mon = monitor();
        let mut tally = SessionTally::default();
        run_offline(tmp.path(), &mut mon, &quiet_logger(), &mut tally).unwrap();

        assert_eq!(tally.lines_total, 4);
        assert_eq!(tally.parse_errors, 1);
        assert_eq!(tally.order_errors, 1);
        assert_eq!(mon.stats(TimeDelta::seconds(10), 1).unwrap().count, 2);
    }

    #[test]
    fn offline_missing_file_is_fatal() {
        let mut mon = monitor();
        let mut tally = SessionTally::default();
        let res = run_offline(
            Path::new("no_such_access.log"),
            &mut mon,
            &quiet_logger(),
            &mut tally,
        );
        assert!(matches!(res, Err(Error::Source(_))));
    }

    #[test]
    fn follow_rejects_zero_refresh() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let mut mon = monitor();
        let mut tally = SessionTally::default();
        let res = run_follow(
            tmp.path(),
            &mut mon,
            &quiet_logger(),
            &mut tally,
            Arc::new(AtomicBool::new(false)),
            Duration::ZERO,
            1,
        );
        assert!(matches!(res, Err(Error::Config(_))));
    }

    #[test]
    fn follow_ingests_appended_lines() {
        let lines = profile_lines(&[(5, 10), (20, 10), (5, 10), (20, 10), (0, 10), (5, 10)]);

        let tmp = tempfile::NamedTempFile::new().unwrap();
        let path = tmp.path().to_path_buf();
        let shutdown: ShutdownFlag = Arc::new(AtomicBool::new(false));

        // Writer thread: give the tailer a moment to start, append the whole
        // profile, give the consumer a moment to drain, then stop the loop.
        let writer_shutdown = Arc::clone(&shutdown);
        let writer = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(400));
            let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
            for line in &lines {
                writeln!(file, "{line}").unwrap();
            }
            file.flush().unwrap();
            std::thread::sleep(Duration::from_millis(1500));
            writer_shutdown.store(true, Ordering::Relaxed);
        });

        let mut mon = monitor();
        let mut tally = SessionTally::default();
        run_follow(
            tmp.path(),
            &mut mon,
            &quiet_logger(),
            &mut tally,
            Arc::clone(&shutdown),
            Duration::from_secs(1),
            1,
        )
        .unwrap();
        writer.join().unwrap();

        assert_eq!(tally.lines_total, 550);
        assert_eq!(mon.alerts().len(), 2);
    }
}
