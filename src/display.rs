//! Operator console rendering for live mode.
//!
//! Renders the periodic dashboard: a freshness header, the traffic summary
//! of the last refresh interval, the top-traffic rankings, and the list of
//! every alert raised so far. Pure formatting over values handed in by the
//! run loop; nothing here touches the engine.

use crate::monitor::alerter::Alert;
use crate::monitor::stats::Stats;
use chrono::{DateTime, FixedOffset, TimeDelta};

/// Clears the terminal and homes the cursor.
pub fn clear_screen() {
    print!("\x1b[H\x1b[2J");
}

fn per_second(count: u64, window: TimeDelta) -> f64 {
    count as f64 / window.as_seconds_f64()
}

/// Renders the statistics block for one refresh interval.
///
/// `stats` is `None` when no record newer than one refresh interval has been
/// seen. The stream is processed in event time — an empty interval can mean
/// quiet traffic, but it can just as well mean the log storage is lagging
/// behind (slow NFS mounts and the like), so the dashboard says "nothing to
/// process" instead of claiming zero requests per second.
pub fn render_stats(stats: Option<&Stats>, now: DateTime<FixedOffset>, window: TimeDelta) {
    println!();
    println!("Date : {}", now.to_rfc3339());

    let Some(stats) = stats else {
        println!("Nothing to process in the last {}s", window.num_seconds());
        println!();
        return;
    };

    println!("Total {:.3} req/s", per_second(stats.count as u64, window));
    println!(" ServerError : {:.3}%", stats.server_error);
    println!(" HTTP2 : {:.1}%", stats.http2);
    println!(" IPv6 : {:.1}%", stats.ipv6);
    println!();

    render_ranking("top sources", &stats.top_sources, window);
    render_ranking("top sections", &stats.top_sections, window);
    render_ranking("top users", &stats.top_users, window);
    println!();
}

fn render_ranking(
    label: &str,
    entries: &[crate::monitor::counter::CounterEntry],
    window: TimeDelta,
) {
    if entries.is_empty() {
        return;
    }
    println!(" {label} :");
    for entry in entries {
        println!(
            "   {} ({:.1} req/s)",
            entry.key,
            per_second(entry.count, window)
        );
    }
}

/// Renders every alert, oldest first, ongoing last.
pub fn render_alerts(alerts: &[Alert]) {
    for alert in alerts {
        render_alert(alert);
    }
}

/// One alert as two lines: the raise, and the clearance once confirmed.
pub fn render_alert(alert: &Alert) {
    println!(
        "AL - High traffic above threshold at {} ( {:.3} requests per second )",
        alert.start.to_rfc3339(),
        alert.value
    );
    if let Some(end) = alert.end {
        println!(
            "OK - High traffic under threshold at {}. Alert duration {}s",
            end.to_rfc3339(),
            (end - alert.start).num_seconds()
        );
    }
}
