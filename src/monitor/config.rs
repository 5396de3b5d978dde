//! Monitoring configuration and its construction-time validation.

use crate::monitor::error::Error;
use chrono::TimeDelta;

/// Operating parameters for a [`Monitor`](crate::monitor::Monitor).
///
/// Built through [`Config::new`] so the invariants hold before any line is
/// processed: the retention window always covers at least the alert window,
/// and nonsensical values are rejected up front rather than misbehaving
/// mid-stream.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// How much history the store retains for window queries.
    store_window: TimeDelta,
    /// Moving-average window of the alerter. Zero disables alerting.
    alert_window: TimeDelta,
    /// Alerting threshold in requests per second. `<= 0` disables alerting.
    alert_threshold: f64,
}

impl Config {
    /// Validates and normalizes the parameters.
    ///
    /// The effective retention is `max(store_window, alert_window)`: the
    /// store must always hold enough history to answer an alert-window
    /// query.
    pub fn new(
        store_window: TimeDelta,
        alert_window: TimeDelta,
        alert_threshold: f64,
    ) -> Result<Self, Error> {
        if store_window <= TimeDelta::zero() {
            return Err(Error::Config("store window must be positive".to_string()));
        }
        if alert_window < TimeDelta::zero() {
            return Err(Error::Config("alert window must not be negative".to_string()));
        }
        if alert_threshold.is_nan() {
            return Err(Error::Config("alert threshold must be a number".to_string()));
        }

        Ok(Self {
            store_window: store_window.max(alert_window),
            alert_window,
            alert_threshold,
        })
    }

    pub fn store_window(&self) -> TimeDelta {
        self.store_window
    }

    pub fn alert_window(&self) -> TimeDelta {
        self.alert_window
    }

    pub fn alert_threshold(&self) -> f64 {
        self.alert_threshold
    }

    /// Alerting is optional: it takes both a window and a threshold.
    pub fn alerting_enabled(&self) -> bool {
        self.alert_window > TimeDelta::zero() && self.alert_threshold > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retention_covers_alert_window() {
        let config =
            Config::new(TimeDelta::seconds(10), TimeDelta::seconds(120), 10.0).unwrap();
        assert_eq!(config.store_window(), TimeDelta::seconds(120));
        assert_eq!(config.alert_window(), TimeDelta::seconds(120));

        let config =
            Config::new(TimeDelta::seconds(300), TimeDelta::seconds(120), 10.0).unwrap();
        assert_eq!(config.store_window(), TimeDelta::seconds(300));
    }

    #[test]
    fn alerting_toggles() {
        let on = Config::new(TimeDelta::seconds(10), TimeDelta::seconds(5), 10.0).unwrap();
        assert!(on.alerting_enabled());

        let no_window = Config::new(TimeDelta::seconds(10), TimeDelta::zero(), 10.0).unwrap();
        assert!(!no_window.alerting_enabled());

        let no_threshold =
            Config::new(TimeDelta::seconds(10), TimeDelta::seconds(5), 0.0).unwrap();
        assert!(!no_threshold.alerting_enabled());

        let negative_threshold =
            Config::new(TimeDelta::seconds(10), TimeDelta::seconds(5), -1.0).unwrap();
        assert!(!negative_threshold.alerting_enabled());
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let res = Config::new(TimeDelta::zero(), TimeDelta::zero(), 10.0);
        assert!(matches!(res, Err(Error::Config(_))));

        let res = Config::new(TimeDelta::seconds(10), TimeDelta::seconds(-1), 10.0);
        assert!(matches!(res, Err(Error::Config(_))));

        let res = Config::new(TimeDelta::seconds(10), TimeDelta::seconds(5), f64::NAN);
        assert!(matches!(res, Err(Error::Config(_))));
    }
}
