//! Access-log monitoring engine.
//!
//! The [`Monitor`] binds the pieces of the pipeline together: a pluggable
//! line parser, the time-ordered request [`Store`], and an optional
//! [`Alerter`] watching the request rate over a moving window. One call to
//! [`Monitor::ingest`] carries a line through parse → store → rate check →
//! eviction; summary [`Stats`] are computed on demand from the store,
//! independent of the alerting path.
//!
//! The engine performs no I/O, never blocks and never sleeps. It is NOT
//! thread safe by design: all mutation is expected to happen on one logical
//! thread (the run loops in `run.rs` funnel both live lines and timer ticks
//! through a single consumer), which keeps the core free of locks.

pub mod alerter;
pub mod config;
pub mod counter;
pub mod error;
pub mod parser;
pub mod request;
pub mod stats;
pub mod store;

use crate::monitor::alerter::{Alert, Alerter};
use crate::monitor::config::Config;
use crate::monitor::error::Error;
use crate::monitor::parser::{CommonLogParser, LineParser};
use crate::monitor::stats::Stats;
use crate::monitor::store::{deadline, Store};
use chrono::{DateTime, FixedOffset, TimeDelta};

/// Orchestrates parsing, storage and alerting for one log stream.
pub struct Monitor {
    config: Config,
    parser: Box<dyn LineParser>,
    store: Store,
    /// Absent when the configuration disables alerting.
    alerter: Option<Alerter>,
    /// Event time of the most recently ingested record.
    last_seen: Option<DateTime<FixedOffset>>,
}

impl Monitor {
    /// Creates a monitor reading the W3C common log format.
    pub fn new(config: Config) -> Self {
        Self::with_parser(config, Box::new(CommonLogParser))
    }

    /// Creates a monitor with a custom line parser.
    pub fn with_parser(config: Config, parser: Box<dyn LineParser>) -> Self {
        let alerter = config
            .alerting_enabled()
            .then(|| Alerter::new(config.alert_window(), config.alert_threshold()));

        Self {
            config,
            parser,
            store: Store::new(),
            alerter,
            last_seen: None,
        }
    }

    /// Parses one line and advances the monitor.
    ///
    /// Returns `Ok(Some(alert))` when this line confirms an alert transition
    /// (open or close). Parse failures and out-of-order records come back as
    /// recoverable errors: the caller skips the line and continues.
    pub fn ingest(&mut self, line: &str) -> Result<Option<Alert>, Error> {
        let req = self.parser.parse(line)?;
        let now = req.time;

        self.store.add(req)?;

        let alert = match self.alerter.as_mut() {
            Some(alerter) => {
                let window = self.config.alert_window();
                let count = self.store.since(deadline(now, window)).count();
                let rate = count as f64 / window.as_seconds_f64();
                alerter.check(now, rate)
            }
            None => None,
        };

        // Trim history down to the retention window; everything needed for
        // future alert-window queries survives because retention >= alert
        // window.
        self.store.evict(deadline(now, self.config.store_window()));
        self.last_seen = Some(now);

        Ok(alert)
    }

    /// Summary statistics over the trailing `window`, ranking `top` entries
    /// per dimension. `None` when there is nothing to report.
    pub fn stats(&self, window: TimeDelta, top: usize) -> Option<Stats> {
        let last = self.last_seen?;
        let stats = Stats::compute(self.store.since(deadline(last, window)), top);
        (stats.count > 0).then_some(stats)
    }

    /// Every alert raised so far, oldest first. Empty when alerting is
    /// disabled.
    pub fn alerts(&self) -> &[Alert] {
        self.alerter.as_ref().map(Alerter::alerts).unwrap_or(&[])
    }

    /// Event time of the most recently ingested record. Drives freshness
    /// reporting in the display layer.
    pub fn last_seen(&self) -> Option<DateTime<FixedOffset>> {
        self.last_seen
    }
}
