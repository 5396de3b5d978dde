//! A single parsed access-log record.

use chrono::{DateTime, FixedOffset};
use std::fmt;
use std::net::IpAddr;

/// Timestamp layout used by the common log format, e.g.
/// `09/May/2018:16:00:42 +0000`.
pub const LOG_DATE_FORMAT: &str = "%d/%b/%Y:%H:%M:%S %z";

/// One HTTP server access-log entry.
///
/// Immutable once constructed; ownership moves into the [`Store`] on
/// ingestion. The offset of the original timestamp is preserved so that
/// formatting a parsed request reproduces the input line byte for byte.
///
/// [`Store`]: crate::monitor::store::Store
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub source_ip: IpAddr,
    pub user: String,
    pub time: DateTime<FixedOffset>,
    pub method: String,
    pub path: String,
    /// First `/`-delimited segment of `path`; `"/"` for the root path.
    pub section: String,
    pub http_version: String,
    pub code: i32,
    pub size: i64,
}

impl Request {
    /// Whether the request was served over HTTP/2.
    pub fn is_http2(&self) -> bool {
        self.http_version.starts_with("HTTP/2")
    }

    /// Whether the request came in over IPv6.
    pub fn is_ipv6(&self) -> bool {
        self.source_ip.is_ipv6()
    }

    /// Whether the response status was a server error (5xx).
    pub fn is_server_error(&self) -> bool {
        self.code >= 500
    }
}

/// Renders the record back into its common log format line.
///
/// `127.0.0.1 - mary [09/May/2018:16:00:42 +0000] "POST /api/user HTTP/1.0" 503 12`
impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {} [{}] \"{} {} {}\" {} {}",
            self.source_ip,
            self.user,
            self.time.format(LOG_DATE_FORMAT),
            self.method,
            self.path,
            self.http_version,
            self.code,
            self.size,
        )
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn request() -> Request {
        Request {
            source_ip: "127.0.0.1".parse().unwrap(),
            user: "mary".to_string(),
            time: FixedOffset::east_opt(0)
                .unwrap()
                .with_ymd_and_hms(2018, 5, 9, 16, 0, 42)
                .unwrap(),
            method: "POST".to_string(),
            path: "/api/user".to_string(),
            section: "/api".to_string(),
            http_version: "HTTP/1.0".to_string(),
            code: 503,
            size: 12,
        }
    }

    #[test]
    fn is_http2() {
        let mut req = request();
        for version in ["HTTP/1.0", "HTTP/1.1", "", "blah"] {
            req.http_version = version.to_string();
            assert!(!req.is_http2(), "{version:?}");
        }
        req.http_version = "HTTP/2.0".to_string();
        assert!(req.is_http2());
    }

    #[test]
    fn is_ipv6() {
        let mut req = request();
        assert!(!req.is_ipv6());
        req.source_ip = "::1".parse().unwrap();
        assert!(req.is_ipv6());
    }

    #[test]
    fn is_server_error() {
        let mut req = request();
        for code in [200, 0, -1, 499] {
            req.code = code;
            assert!(!req.is_server_error(), "{code}");
        }
        for code in [500, 503, 599] {
            req.code = code;
            assert!(req.is_server_error(), "{code}");
        }
    }

    #[test]
    fn display_common_log_format() {
        let line = "127.0.0.1 - mary [09/May/2018:16:00:42 +0000] \"POST /api/user HTTP/1.0\" 503 12";
        assert_eq!(request().to_string(), line);
    }
}
