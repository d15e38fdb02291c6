//! Append-only run log
//!
//! Every configuration decision, per-file processing step and upload outcome
//! is recorded as one timestamped line. Entries are mirrored to `tracing` so
//! they also appear on the console.

use crate::Result;
use chrono::{DateTime, Local};
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Error,
    Info,
    Verbose,
    Debug,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Error => "ERROR",
            Self::Info => "INFO",
            Self::Verbose => "VERBOSE",
            Self::Debug => "DEBUG",
        };
        f.pad(s)
    }
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: DateTime<Local>,
    pub level: LogLevel,
    pub message: String,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:<7} {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S%.3f"),
            self.level,
            self.message
        )
    }
}

struct Inner {
    writer: Option<BufWriter<File>>,
    entries: Vec<LogEntry>,
}

/// Serialized, append-only sink for run events.
pub struct RunLog {
    max_level: LogLevel,
    inner: Mutex<Inner>,
}

impl RunLog {
    /// Create (or truncate) the log file at `path`.
    pub fn create(path: &Path, max_level: LogLevel) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self::with_writer(Some(BufWriter::new(file)), max_level))
    }

    /// A log that only keeps entries in memory.
    pub fn in_memory(max_level: LogLevel) -> Self {
        Self::with_writer(None, max_level)
    }

    fn with_writer(writer: Option<BufWriter<File>>, max_level: LogLevel) -> Self {
        Self {
            max_level,
            inner: Mutex::new(Inner {
                writer,
                entries: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn enabled(&self, level: LogLevel) -> bool {
        level <= self.max_level
    }

    pub fn record(&self, level: LogLevel, message: impl Into<String>) {
        if !self.enabled(level) {
            return;
        }

        let entry = LogEntry {
            timestamp: Local::now(),
            level,
            message: message.into(),
        };

        match level {
            LogLevel::Error => tracing::error!("{}", entry.message),
            LogLevel::Info => tracing::info!("{}", entry.message),
            LogLevel::Verbose | LogLevel::Debug => tracing::debug!("{}", entry.message),
        }

        let mut inner = self.lock();
        if let Some(writer) = inner.writer.as_mut() {
            if let Err(e) = writeln!(writer, "{}", entry) {
                tracing::warn!("Failed to write run log entry: {}", e);
            }
        }
        inner.entries.push(entry);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.record(LogLevel::Error, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.record(LogLevel::Info, message);
    }

    pub fn verbose(&self, message: impl Into<String>) {
        self.record(LogLevel::Verbose, message);
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.record(LogLevel::Debug, message);
    }

    pub fn flush(&self) -> Result<()> {
        if let Some(writer) = self.lock().writer.as_mut() {
            writer.flush()?;
        }
        Ok(())
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.lock().entries.clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.lock()
            .entries
            .iter()
            .map(|e| e.message.clone())
            .collect()
    }
}

impl Drop for RunLog {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}
