//! Run-wide error files.
//!
//! Non-fatal failures (a bad map, a plugin that will not load, a match that
//! panicked) never stop the run; they are appended to
//! `errors_<timestamp>.txt` as they happen. Map-load failures are also
//! collected and written out as `input_errors_<timestamp>.txt` at the end of
//! the run. Neither file is created when there is nothing to record.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use time::macros::format_description;
use time::OffsetDateTime;
use tracing::warn;

/// `YYYYMMDD_HHMMSS`, used by every generated file name.
pub(crate) fn timestamp() -> String {
    let format = format_description!("[year][month][day]_[hour][minute][second]");
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    now.format(&format).unwrap_or_else(|_| "00000000_000000".to_string())
}

struct MapError {
    path: String,
    reason: String,
}

struct Inner {
    file: Option<File>,
    opened: bool,
    map_errors: Vec<MapError>,
}

/// Shared error sink; workers record through an `Arc` at match end.
pub struct ErrorLog {
    dir: PathBuf,
    inner: Mutex<Inner>,
}

impl Default for ErrorLog {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorLog {
    /// Error files land in the working directory.
    pub fn new() -> ErrorLog {
        ErrorLog::with_dir(PathBuf::from("."))
    }

    /// Error files land in `dir` instead.
    pub fn with_dir(dir: PathBuf) -> ErrorLog {
        ErrorLog {
            dir,
            inner: Mutex::new(Inner { file: None, opened: false, map_errors: Vec::new() }),
        }
    }

    /// Append one line to the run's error file, creating it on first use.
    /// Falls back to stderr when the file cannot be created.
    pub fn record(&self, message: &str) {
        let mut inner = self.inner.lock().expect("mutex poisoning");
        if !inner.opened {
            inner.opened = true;
            let name = self.dir.join(format!("errors_{}.txt", timestamp()));
            match OpenOptions::new().create(true).append(true).open(&name) {
                Ok(file) => inner.file = Some(file),
                Err(err) => warn!(file = %name.display(), %err, "cannot create error log"),
            }
        }
        match inner.file.as_mut() {
            Some(file) => {
                let _ = writeln!(file, "{message}");
            }
            None => eprintln!("error: {message}"),
        }
    }

    /// Record a map that failed to load; also lands in the input-errors file.
    pub fn record_map_error(&self, path: &Path, reason: &str) {
        self.record(&format!("map '{}': {reason}", path.display()));
        let mut inner = self.inner.lock().expect("mutex poisoning");
        inner.map_errors.push(MapError { path: path.display().to_string(), reason: reason.to_string() });
    }

    /// Write `input_errors_<timestamp>.txt` if any map failed this run.
    pub fn write_map_errors(&self) {
        let inner = self.inner.lock().expect("mutex poisoning");
        if inner.map_errors.is_empty() {
            return;
        }
        let name = self.dir.join(format!("input_errors_{}.txt", timestamp()));
        let mut body = String::new();
        for error in &inner.map_errors {
            body.push_str(&format!("Map: {}\nError: {}\n\n", error.path, error.reason));
        }
        if std::fs::write(&name, &body).is_err() {
            warn!(file = %name.display(), "cannot create input errors file, printing to stderr");
            eprint!("{body}");
        }
    }
}
