//! Log line parsing.
//!
//! The engine never parses lines itself; it goes through the [`LineParser`]
//! trait so an alternate log format can be swapped in without touching the
//! store or the alerter. [`CommonLogParser`] is the stock implementation for
//! the W3C common log format:
//!
//! `127.0.0.1 - mary [09/May/2018:16:00:42 +0000] "POST /api/user HTTP/1.0" 503 12`

use crate::monitor::error::Error;
use crate::monitor::request::{Request, LOG_DATE_FORMAT};
use chrono::DateTime;
use std::net::IpAddr;

/// Turns one raw log line into a [`Request`].
///
/// Implementations must either return a fully populated record or a
/// [`Error::Parse`]; a partially filled record is never returned.
pub trait LineParser {
    fn parse(&self, line: &str) -> Result<Request, Error>;
}

/// Parser for the W3C common log format.
/// see: <https://www.w3.org/Daemon/User/Config/Logging.html>
#[derive(Debug, Default)]
pub struct CommonLogParser;

/// Consumes `line` up to the first occurrence of `sep` and returns
/// `(field, rest)` where `rest` starts just after the separator.
///
/// The separator must exist and the field before it must be non-empty.
fn split_field<'a>(line: &'a str, sep: &str) -> Result<(&'a str, &'a str), Error> {
    if line.len() < sep.len() + 1 {
        return Err(Error::Parse("line too short".to_string()));
    }
    match line.find(sep) {
        Some(i) if i > 0 => Ok((&line[..i], &line[i + sep.len()..])),
        _ => Err(Error::Parse(format!("separator {sep:?} not found"))),
    }
}

/// Derives the section from a request path: the first `/`-delimited segment,
/// or `"/"` for the root or an empty path.
fn parse_section(path: &str) -> String {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    match trimmed.find('/') {
        Some(i) if i > 0 => format!("/{}", &trimmed[..i]),
        _ => format!("/{trimmed}"),
    }
}

impl LineParser for CommonLogParser {
    fn parse(&self, line: &str) -> Result<Request, Error> {
        let line = line.trim_end_matches(['\r', '\n']);

        // Split on the literal field separators first so a malformed line is
        // rejected before any field-level parsing happens.
        let (ip_str, line) = split_field(line, " - ")?;
        let (user, line) = split_field(line, " [")?;
        let (date_str, line) = split_field(line, "] \"")?;
        let (method, line) = split_field(line, " ")?;
        let (path, line) = split_field(line, " ")?;
        let (http_version, line) = split_field(line, "\" ")?;
        let (code_str, size_str) = split_field(line, " ")?;

        let source_ip: IpAddr = ip_str
            .parse()
            .map_err(|_| Error::Parse(format!("invalid ip {ip_str:?}")))?;

        let time = DateTime::parse_from_str(date_str, LOG_DATE_FORMAT)
            .map_err(|_| Error::Parse(format!("invalid date {date_str:?}")))?;

        let code: i32 = code_str
            .parse()
            .map_err(|_| Error::Parse(format!("invalid status code {code_str:?}")))?;

        let size: i64 = size_str
            .parse()
            .map_err(|_| Error::Parse(format!("invalid size {size_str:?}")))?;

        Ok(Request {
            source_ip,
            user: user.to_string(),
            time,
            method: method.to_string(),
            section: parse_section(path),
            path: path.to_string(),
            http_version: http_version.to_string(),
            code,
            size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_field_behaviour() {
        assert!(split_field("", " - ").is_err());
        assert!(split_field("this line is not valid", " - ").is_err());
        // Separator at position 0 means an empty field, which is an error.
        assert!(split_field(" - line", " - ").is_err());

        let (part, rest) = split_field("part - line", " - ").unwrap();
        assert_eq!(part, "part");
        assert_eq!(rest, "line");

        let (part, rest) = split_field("世界 - 你好好好", " - ").unwrap();
        assert_eq!(part, "世界");
        assert_eq!(rest, "你好好好");

        let (part, rest) = split_field("::1 - 世界", " - ").unwrap();
        assert_eq!(part, "::1");
        assert_eq!(rest, "世界");
    }

    #[test]
    fn parse_valid_line() {
        let parser = CommonLogParser;
        let req = parser
            .parse("127.0.0.1 - mary [09/May/2018:16:00:42 +0000] \"POST /api/user HTTP/1.0\" 503 12")
            .unwrap();

        assert_eq!(req.source_ip.to_string(), "127.0.0.1");
        assert_eq!(req.user, "mary");
        assert_eq!(req.time.format(LOG_DATE_FORMAT).to_string(), "09/May/2018:16:00:42 +0000");
        assert_eq!(req.method, "POST");
        assert_eq!(req.path, "/api/user");
        assert_eq!(req.section, "/api");
        assert_eq!(req.http_version, "HTTP/1.0");
        assert_eq!(req.code, 503);
        assert_eq!(req.size, 12);
    }

    #[test]
    fn parse_root_path_section() {
        let parser = CommonLogParser;
        let req = parser
            .parse("127.0.0.1 - mary [09/May/2018:16:00:42 +0000] \"POST / HTTP/1.0\" 503 12")
            .unwrap();
        assert_eq!(req.section, "/");
    }

    #[test]
    fn parse_ipv6_source() {
        let parser = CommonLogParser;
        let req = parser
            .parse("::1 - mary [09/May/2018:16:00:42 +0000] \"POST /api/user HTTP/1.0\" 503 12")
            .unwrap();
        assert_eq!(req.source_ip.to_string(), "::1");
        assert!(req.is_ipv6());
    }

    #[test]
    fn parse_utf8_fields() {
        let parser = CommonLogParser;
        let req = parser
            .parse("127.0.0.1 - 世界 [09/May/2018:16:00:42 +0000] \"POST /api/user HTTP/1.0\" 503 12")
            .unwrap();
        assert_eq!(req.user, "世界");
    }

    #[test]
    fn parse_round_trip() {
        let line = "127.0.0.1 - mary [09/May/2018:16:00:42 +0000] \"POST /api/user HTTP/1.0\" 503 12";
        let req = CommonLogParser.parse(line).unwrap();
        assert_eq!(req.to_string(), line);
    }

    #[test]
    fn parse_rejects_malformed_lines() {
        let parser = CommonLogParser;
        let inputs = [
            "",
            "invalid - mary [09/May/2018:16:00:42 +0000] \"POST /api/user HTTP/1.0\" 503 12",
            "127.0.0.1 - mary [invalid] \"POST /api/user HTTP/1.0\" 503 12",
            "127.0.0.1 - mary [09/May/2018:16:00:42 +0000] \"POST /api/user HTTP/1.0\" invalid 12",
            "127.0.0.1 - mary [09/May/2018:16:00:42 +0000] \"POST /api/user HTTP/1.0\" 503 invalid",
            "127.0.0.1",
            "127.0.0.1 - mary",
            "127.0.0.1 - mary [09/May/2018:16:00:42 +0000]",
            "127.0.0.1 - mary [09/May/2018:16:00:42 +0000] \"POST",
            "127.0.0.1 - mary [09/May/2018:16:00:42 +0000] \"POST /api/user",
            "127.0.0.1 - mary [09/May/2018:16:00:42 +0000] \"POST /api/user HTTP/1.0\"",
            "127.0.0.1 - mary [09/May/2018:16:00:42 +0000] \"POST /api/user HTTP/1.0\" 503",
        ];
        for input in inputs {
            let res = parser.parse(input);
            assert!(matches!(res, Err(Error::Parse(_))), "{input:?}");
        }
    }

    #[test]
    fn section_derivation() {
        assert_eq!(parse_section(""), "/");
        assert_eq!(parse_section("/"), "/");
        assert_eq!(parse_section("/api"), "/api");
        assert_eq!(parse_section("/api/path"), "/api");
        assert_eq!(parse_section("/世界/你好好好"), "/世界");
    }
}
