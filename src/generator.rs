//! Synthetic traffic generator for demos and manual testing.
//!
//! Appends well-formed common-log-format lines to the target file at a rate
//! that ramps up and down in a triangle wave, which is exactly the shape
//! needed to watch alerts open and close on the live dashboard. The
//! generator owns its random source and its configuration; nothing here is
//! process-global.

use crate::logger::{Event, SharedLogger};
use crate::monitor::error::Error;
use crate::monitor::request::Request;
use crate::run::ShutdownFlag;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs::OpenOptions;
use std::io::Write;
use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;

const SOURCES: &[&str] = &["127.0.0.1", "::1", "1.1.1.1"];
const USERS: &[&str] = &["user1", "user2", "user3"];
const METHODS: &[&str] = &["GET", "POST", "DELETE"];
const PATHS: &[&str] = &["/api", "/www", "/static"];
const VERSIONS: &[&str] = &["HTTP/1.1", "HTTP/2.0"];
const CODES: &[i32] = &[200, 301, 400, 404, 500];

/// Where and how fast to generate.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// File the lines are appended to.
    pub path: PathBuf,
    /// Top of the triangle wave, in lines per second.
    pub peak_rate: u32,
}

/// Generates one batch of synthetic log lines per second.
pub struct TrafficGenerator {
    config: GeneratorConfig,
    rng: StdRng,
    rate: u32,
    rising: bool,
}

impl TrafficGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        let rate = config.peak_rate / 2;
        Self {
            config,
            rng: StdRng::from_os_rng(),
            rate,
            rising: true,
        }
    }

    /// Appends `rate` lines per second until the shutdown flag is set.
    ///
    /// # Errors
    /// [`Error::Source`] when the target file cannot be opened or written.
    pub fn run(&mut self, shutdown: ShutdownFlag, logger: &SharedLogger) -> Result<(), Error> {
        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.config.path)?;

        while !shutdown.load(Ordering::Relaxed) {
            thread::sleep(Duration::from_secs(1));

            logger.log(&Event::Info {
                message: &format!(
                    "writing to {} at {} requests per second",
                    self.config.path.display(),
                    self.rate
                ),
            });

            for _ in 0..self.rate {
                writeln!(file, "{}", self.sample())?;
            }
            file.flush()?;

            self.step();
        }

        Ok(())
    }

    /// One random request stamped with the current wall clock.
    fn sample(&mut self) -> Request {
        let source_ip: IpAddr = self.pick(SOURCES).parse().unwrap_or(IpAddr::from([127, 0, 0, 1]));
        let path = self.pick(PATHS).to_string();

        Request {
            source_ip,
            user: self.pick(USERS).to_string(),
            time: Utc::now().fixed_offset(),
            method: self.pick(METHODS).to_string(),
            section: path.clone(),
            path,
            http_version: self.pick(VERSIONS).to_string(),
            code: CODES[self.rng.random_range(0..CODES.len())],
            size: self.rng.random_range(0..100),
        }
    }

    fn pick<'a>(&mut self, pool: &[&'a str]) -> &'a str {
        pool[self.rng.random_range(0..pool.len())]
    }

    /// Advances the triangle wave by one step per second.
    fn step(&mut self) {
        if self.rising {
            self.rate += 1;
            if self.rate >= self.config.peak_rate {
                self.rising = false;
            }
        } else {
            self.rate = self.rate.saturating_sub(1);
            if self.rate == 0 {
                self.rising = true;
            }
        }
    }
}
