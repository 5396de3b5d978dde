//! Moving-average threshold alerting.
//!
//! The alerter turns a noisy, possibly irregularly sampled metric stream into
//! clean confirmed transitions: one alert opens when the metric has stayed
//! above the threshold for a full window, and closes again once it has stayed
//! at or below the threshold for a full window. Single-sample spikes and dips
//! in between never make it out.
//!
//! Samples are treated as a step function over event time: each call to
//! [`Alerter::check`] covers the half-open interval from the previous call up
//! to `now` with the newly observed value. A candidate transition accumulates
//! the duration its condition has held and is confirmed once that coverage
//! reaches the window. Because a single sample covers the whole gap since the
//! previous one, sparse sampling confirms immediately when the gap alone
//! exceeds the window — the stream carrying no data for a while is itself
//! information. If the opposing condition reasserts before confirmation the
//! candidate is discarded and the previous confirmed state resumes; this
//! reversion is what suppresses flapping under dense sampling.

use chrono::{DateTime, FixedOffset, TimeDelta};

/// A confirmed high-traffic episode.
///
/// Open while `end` is unset. Closed alerts are kept for enumeration and are
/// never mutated again.
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    /// Time of the check that confirmed the breach.
    pub start: DateTime<FixedOffset>,
    /// Time of the check that confirmed the clearance; `None` while ongoing.
    pub end: Option<DateTime<FixedOffset>>,
    /// Metric value observed when the breach was confirmed.
    pub value: f64,
}

impl Alert {
    pub fn is_ongoing(&self) -> bool {
        self.end.is_none()
    }
}

/// Alerting state. `Rising` and `Falling` are unconfirmed candidates carrying
/// the duration their condition has held so far.
#[derive(Debug, Clone, Copy, PartialEq)]
enum State {
    /// No alert open, metric at or below threshold.
    Idle,
    /// Metric above threshold, breach not yet confirmed.
    Rising { held: TimeDelta },
    /// Alert confirmed and ongoing.
    Open,
    /// Metric back at or below threshold, clearance not yet confirmed.
    Falling { held: TimeDelta },
}

/// Threshold detector over a sliding window.
///
/// NOT thread safe; `check` must be called with non-decreasing timestamps.
#[derive(Debug)]
pub struct Alerter {
    window: TimeDelta,
    threshold: f64,
    state: State,
    /// Time of the previous check; `None` before the first sample.
    last: Option<DateTime<FixedOffset>>,
    alerts: Vec<Alert>,
}

impl Alerter {
    pub fn new(window: TimeDelta, threshold: f64) -> Self {
        Self {
            window,
            threshold,
            state: State::Idle,
            last: None,
            alerts: Vec::new(),
        }
    }

    /// Feeds one measurement taken at `now`.
    ///
    /// Returns the alert exactly when this call confirms a transition: the
    /// freshly opened alert, or the freshly closed one. Every other call
    /// returns `None`.
    ///
    /// # Panics
    ///
    /// Panics if `now` precedes the previous check. The caller owns time
    /// ordering (the store already rejects out-of-order records); a violation
    /// here is a programming error, not bad input.
    pub fn check(&mut self, now: DateTime<FixedOffset>, value: f64) -> Option<Alert> {
        let gap = match self.last {
            Some(last) => {
                assert!(now >= last, "alerter checked with a timestamp in the past");
                now - last
            }
            None => TimeDelta::zero(),
        };
        self.last = Some(now);

        let above = value > self.threshold;

        match self.state {
            State::Idle if above => self.advance_rising(TimeDelta::zero(), gap, now, value),
            State::Rising { held } if above => self.advance_rising(held, gap, now, value),
            State::Rising { .. } => {
                // The dip reasserted itself before the breach was confirmed.
                self.state = State::Idle;
                None
            }
            State::Open if !above => self.advance_falling(TimeDelta::zero(), gap, now),
            State::Falling { held } if !above => self.advance_falling(held, gap, now),
            State::Falling { .. } => {
                // Traffic went back up before the clearance was confirmed.
                self.state = State::Open;
                None
            }
            State::Idle | State::Open => None,
        }
    }

    /// Every alert ever produced, oldest first. At most the final one is
    /// still ongoing.
    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    fn advance_rising(
        &mut self,
        held: TimeDelta,
        gap: TimeDelta,
        now: DateTime<FixedOffset>,
        value: f64,
    ) -> Option<Alert> {
        let held = held + gap;
        if held < self.window {
            self.state = State::Rising { held };
            return None;
        }

        self.state = State::Open;
        let alert = Alert { start: now, end: None, value };
        self.alerts.push(alert.clone());
        Some(alert)
    }

    fn advance_falling(
        &mut self,
        held: TimeDelta,
        gap: TimeDelta,
        now: DateTime<FixedOffset>,
    ) -> Option<Alert> {
        let held = held + gap;
        if held < self.window {
            self.state = State::Falling { held };
            return None;
        }

        self.state = State::Idle;
        let open = self
            .alerts
            .last_mut()
            .expect("falling state requires an open alert");
        open.end = Some(now);
        Some(open.clone())
    }
}
