//! Tracing setup for the binary.
//!
//! The library only emits `tracing` events; installing a subscriber is left
//! to whoever embeds it. The CLI calls [`init_tracing`] once at startup.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing_subscriber::fmt;
use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset.
const DEFAULT_FILTER: &str = "journal_formatter=info,warn";

/// Number of rotated log files kept next to the live one.
const KEEP_ROTATED: u32 = 3;

/// Where log lines go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    /// Human-readable lines on stderr, keeping stdout clean for markdown.
    Stderr,
    /// Append to a file, rotating the previous logs first.
    File(PathBuf),
}

impl LogTarget {
    /// `<data dir>/journal-formatter.log`
    pub fn default_file() -> Self {
        LogTarget::File(crate::data_dir().join("journal-formatter.log"))
    }
}

/// Initialize the global tracing subscriber.
///
/// For [`LogTarget::File`]:
/// 1. Rotates existing logs (`.log` → `.log.1` → `.2` → `.3`, keeps last 3).
/// 2. Opens a fresh log through a writer that flushes every line.
/// 3. Logs a startup banner with the log path.
pub fn init_tracing(target: &LogTarget) -> io::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    match target {
        LogTarget::Stderr => {
            fmt::fmt()
                .with_env_filter(filter)
                .with_writer(io::stderr)
                .with_target(true)
                .init();
        }
        LogTarget::File(log_path) => {
            if let Some(dir) = log_path.parent() {
                fs::create_dir_all(dir)?;
            }
            rotate_log_file(log_path, KEEP_ROTATED);

            let log_file = fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(log_path)?;

            fmt::fmt()
                .with_env_filter(filter)
                .with_writer(FlushingWriter::new(log_file))
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(false)
                .init();
        }
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        target = ?target,
        pid = std::process::id(),
        "=== journal-formatter starting ==="
    );
    Ok(())
}

/// `x.log` with generation `n` appended: `x.log.{n}`.
fn rotated_path(base_path: &Path, n: u32) -> PathBuf {
    let mut name = base_path.as_os_str().to_os_string();
    name.push(format!(".{n}"));
    PathBuf::from(name)
}

/// Shift the log chain down one generation before a fresh log is opened.
///
/// Generations past `keep` fall off the end. Gaps in the chain are fine.
fn rotate_log_file(base_path: &Path, keep: u32) {
    if keep == 0 {
        let _ = fs::remove_file(base_path);
        return;
    }

    // Delete the oldest
    let _ = fs::remove_file(rotated_path(base_path, keep));

    // Shift: .{n-1} → .{n}
    for n in (1..keep).rev() {
        let _ = fs::rename(rotated_path(base_path, n), rotated_path(base_path, n + 1));
    }

    // Current → .1
    if base_path.exists() {
        let _ = fs::rename(base_path, rotated_path(base_path, 1));
    }
}

/// Shares one sink between every event and flushes after each line, so the
/// log is complete even when the process is killed mid-watch.
struct FlushingWriter<W> {
    inner: Arc<Mutex<W>>,
}

impl<W> Clone for FlushingWriter<W> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<W: Write> FlushingWriter<W> {
    fn new(inner: W) -> Self {
        Self {
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    fn with_sink<T>(&self, op: impl FnOnce(&mut W) -> io::Result<T>) -> io::Result<T> {
        let mut sink = self
            .inner
            .lock()
            .map_err(|_| io::Error::other("log writer lock poisoned"))?;
        op(&mut sink)
    }
}

impl<W: Write> Write for FlushingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.with_sink(|sink| {
            let n = sink.write(buf)?;
            sink.flush()?;
            Ok(n)
        })
    }

    fn flush(&mut self) -> io::Result<()> {
        self.with_sink(|sink| sink.flush())
    }
}

impl<'a, W: Write + 'a> fmt::MakeWriter<'a> for FlushingWriter<W> {
    type Writer = FlushingWriter<W>;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
