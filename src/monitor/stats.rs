//! Summary statistics over a window of requests.

use crate::monitor::counter::{Counter, CounterEntry};
use crate::monitor::request::Request;

/// A point-in-time summary of a slice of requests.
///
/// Pure value: computed on demand, holds no reference to the store, carries
/// no lifecycle past the call that produced it.
#[derive(Debug, Default)]
pub struct Stats {
    /// Total number of requests in the window.
    pub count: usize,
    /// Percentage of requests arriving over IPv6.
    pub ipv6: f64,
    /// Percentage of HTTP/2 requests.
    pub http2: f64,
    /// Percentage of 5xx responses.
    pub server_error: f64,

    pub top_sources: Vec<CounterEntry>,
    pub top_users: Vec<CounterEntry>,
    pub top_sections: Vec<CounterEntry>,
}

impl Stats {
    /// Computes statistics over `requests`, ranking the `top` most frequent
    /// sources, users and sections. `top == 0` skips the rankings entirely.
    pub fn compute<'a>(requests: impl Iterator<Item = &'a Request>, top: usize) -> Self {
        let mut stats = Stats::default();

        let mut ipv6 = 0usize;
        let mut http2 = 0usize;
        let mut server_error = 0usize;

        let mut sources = Counter::new();
        let mut users = Counter::new();
        let mut sections = Counter::new();

        for req in requests {
            stats.count += 1;

            if req.is_ipv6() {
                ipv6 += 1;
            }
            if req.is_http2() {
                http2 += 1;
            }
            if req.is_server_error() {
                server_error += 1;
            }

            if top > 0 {
                sources.increment(&req.source_ip.to_string());
                users.increment(&req.user);
                sections.increment(&req.section);
            }
        }

        if stats.count > 0 {
            let total = stats.count as f64;
            stats.ipv6 = ipv6 as f64 / total * 100.0;
            stats.http2 = http2 as f64 / total * 100.0;
            stats.server_error = server_error as f64 / total * 100.0;
        }

        if top > 0 {
            stats.top_sources = sources.top(top);
            stats.top_users = users.top(top);
            stats.top_sections = sections.top(top);
        }

        stats
    }
}
