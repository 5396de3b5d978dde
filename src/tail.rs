//! Live follow of an access-log file.
//!
//! A dedicated reader thread polls the file for appended lines and sends
//! every complete line over an `mpsc` channel; the run loop is the single
//! consumer, so everything downstream of the channel stays single-threaded.
//! The file must exist up front — failing to open it is a fatal
//! [`Error::Source`] surfaced to the operator, never retried.
//!
//! Following starts at the current end of the file (history is not
//! replayed), survives writers that flush partial lines, and reopens from
//! the start when the file shrinks underneath us — the usual signature of a
//! log rotation.

use crate::monitor::error::Error;
use crate::run::ShutdownFlag;
use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// How often the reader thread checks for new data at EOF.
const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Handle on a running follow: the line channel plus the reader thread.
pub struct Tailer {
    lines: Receiver<String>,
    handle: JoinHandle<()>,
}

impl Tailer {
    /// Starts following `path` from its current end.
    ///
    /// # Errors
    /// [`Error::Source`] when the file cannot be opened.
    pub fn follow(path: &Path, shutdown: ShutdownFlag) -> Result<Self, Error> {
        let mut file = File::open(path)?;
        let pos = file.seek(SeekFrom::End(0))?;

        let (tx, rx) = mpsc::channel();
        let path = path.to_path_buf();
        let handle = thread::spawn(move || read_loop(file, path, pos, tx, shutdown));

        Ok(Self { lines: rx, handle })
    }

    /// The channel of complete lines, trailing newline stripped off by the
    /// consumer's parser (the raw line is sent as read).
    pub fn lines(&self) -> &Receiver<String> {
        &self.lines
    }

    /// Waits for the reader thread to finish. Call after setting the
    /// shutdown flag.
    pub fn join(self) {
        let _ = self.handle.join();
    }
}

fn read_loop(file: File, path: PathBuf, mut pos: u64, tx: Sender<String>, shutdown: ShutdownFlag) {
    let mut reader = BufReader::new(file);
    let mut pending = String::new();

    while !shutdown.load(Ordering::Relaxed) {
        match reader.read_line(&mut pending) {
            Ok(0) => {
                // At EOF. A file now shorter than what we already consumed
                // was truncated or rotated: start over on the new file.
                match std::fs::metadata(&path) {
                    Ok(meta) if meta.len() < pos => {
                        let Ok(reopened) = File::open(&path) else {
                            break;
                        };
                        reader = BufReader::new(reopened);
                        pos = 0;
                        pending.clear();
                    }
                    _ => thread::sleep(POLL_INTERVAL),
                }
            }
            Ok(n) => {
                pos += n as u64;
                // A writer may flush mid-line; hold the fragment until the
                // newline arrives.
                if pending.ends_with('\n') {
                    if tx.send(std::mem::take(&mut pending)).is_err() {
                        // Consumer is gone; stop reading.
                        break;
                    }
                }
            }
            Err(_) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    #[test]
    fn follow_requires_an_existing_file() {
        let shutdown: ShutdownFlag = Arc::new(AtomicBool::new(false));
        let res = Tailer::follow(Path::new("no_such_access.log"), shutdown);
        assert!(matches!(res, Err(Error::Source(_))));
    }

    #[test]
    fn follow_delivers_appended_lines() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, "history line, must not be delivered").unwrap();
        tmp.flush().unwrap();

        let shutdown: ShutdownFlag = Arc::new(AtomicBool::new(false));
        let tailer = Tailer::follow(tmp.path(), Arc::clone(&shutdown)).unwrap();

        writeln!(tmp, "first").unwrap();
        writeln!(tmp, "second").unwrap();
        tmp.flush().unwrap();

        let first = tailer.lines().recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(first, "first\n");
        let second = tailer.lines().recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(second, "second\n");

        shutdown.store(true, Ordering::Relaxed);
        tailer.join();
    }

    #[test]
    fn follow_stops_on_shutdown() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let shutdown: ShutdownFlag = Arc::new(AtomicBool::new(false));
        let tailer = Tailer::follow(tmp.path(), Arc::clone(&shutdown)).unwrap();

        shutdown.store(true, Ordering::Relaxed);
        // The reader notices the flag within one poll interval.
        tailer.join();
    }
}
