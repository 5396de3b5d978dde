use clap::Parser;

/// accesswatch — HTTP access-log monitoring and traffic alerting console.
///
/// Follows a W3C common-log-format file (or replays it in one pass),
/// maintains sliding-window traffic statistics, and raises an alert whenever
/// the average request rate stays above the configured threshold for a full
/// alerting window.
#[derive(Parser, Debug, Clone)]
#[command(
    name    = "accesswatch",
    version = "0.2.0",
    about   = "HTTP access log monitoring and traffic alerting console",
    long_about = None,
)]
pub struct Cli {
    // ── Log source ───────────────────────────────────────────────────────────

    /// Access log file to follow (or to replay with --offline, or to append
    /// to with --generate).
    #[arg(short = 'f', long = "file", value_name = "PATH", default_value = "/tmp/access.log")]
    pub file: String,

    /// Replay the whole file once and exit instead of following it live.
    ///
    /// Alert transitions are printed as they are confirmed; no screen
    /// refresh happens in this mode.
    #[arg(long = "offline")]
    pub offline: bool,

    // ── Display ──────────────────────────────────────────────────────────────

    /// Seconds between screen refreshes in live mode.
    ///
    /// Each refresh summarises the traffic of the last refresh interval, so
    /// this also sets how much history the store keeps for statistics.
    #[arg(short = 'r', long = "refresh", value_name = "SECS", default_value_t = 10)]
    pub refresh: u64,

    /// How many entries to show in each top-traffic ranking.
    #[arg(long = "top", value_name = "N", default_value_t = 3)]
    pub top: usize,

    // ── Alerting ─────────────────────────────────────────────────────────────

    /// Moving-average window, in seconds, over which the request rate is
    /// evaluated. 0 disables alerting.
    #[arg(short = 'w', long = "window", value_name = "SECS", default_value_t = 120)]
    pub window: u64,

    /// Request rate (per second) that must be sustained for a full window to
    /// raise an alert. 0 disables alerting.
    #[arg(short = 't', long = "threshold", value_name = "RATE", default_value_t = 10.0)]
    pub threshold: f64,

    // ── Generator ────────────────────────────────────────────────────────────

    /// Append synthetic traffic to the log file instead of monitoring it.
    ///
    /// Useful to demo the console: run one instance with --generate and a
    /// second one following the same file.
    #[arg(long = "generate")]
    pub generate: bool,

    /// Peak rate, in lines per second, of the synthetic traffic ramp.
    #[arg(long = "peak-rate", value_name = "N", default_value_t = 100)]
    pub peak_rate: u32,

    // ── Logging ──────────────────────────────────────────────────────────────

    /// Write event output to this file in addition to stdout.
    ///
    /// The file is created if it does not exist and appended to if it does.
    /// JSON mode (--json) affects the format written to this file as well.
    #[arg(short = 'o', long = "log-file", value_name = "PATH")]
    pub log_file: Option<String>,

    /// Emit log entries as newline-delimited JSON (NDJSON).
    ///
    /// Each event is a self-contained JSON object on its own line, suitable
    /// for ingestion by log shippers (Logstash, Fluentd, Vector) or SIEM
    /// platforms (Splunk, Elastic, Loki).
    #[arg(short = 'j', long = "json")]
    pub json: bool,
}
