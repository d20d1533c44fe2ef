//! Invalid-response log.
//!
//! When a first attempt fails shape validation, the (prompt, response) pair
//! is recorded here so prompts can be fixed offline. Entries are bounded:
//! prompts and responses are truncated to configured character counts.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::config::ValidationSettings;
use crate::error::Result;
use crate::types::{ExpectedShape, TaskKind};

/// One rejected reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvalidResponse {
    /// When the reply was rejected.
    pub timestamp: DateTime<Utc>,
    /// Task being generated.
    pub task_kind: TaskKind,
    /// Shape the reply failed.
    pub expected_shape: ExpectedShape,
    /// Validation failure, human readable.
    pub reason: String,
    /// Prompt, truncated.
    pub prompt: String,
    /// Reply text, truncated.
    pub response: String,
}

/// Character limits applied to log entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogLimits {
    /// Prompt characters kept.
    pub prompt_chars: usize,
    /// Response characters kept.
    pub response_chars: usize,
}

impl Default for LogLimits {
    fn default() -> Self {
        Self {
            prompt_chars: 500,
            response_chars: 2000,
        }
    }
}

impl From<&ValidationSettings> for LogLimits {
    fn from(settings: &ValidationSettings) -> Self {
        Self {
            prompt_chars: settings.prompt_log_chars,
            response_chars: settings.response_log_chars,
        }
    }
}

impl InvalidResponse {
    /// Build an entry stamped now, truncating prompt and response to `limits`.
    #[must_use]
    pub fn new(
        task_kind: TaskKind,
        expected_shape: ExpectedShape,
        reason: impl Into<String>,
        prompt: &str,
        response: &str,
        limits: LogLimits,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            task_kind,
            expected_shape,
            reason: reason.into(),
            prompt: truncate_chars(prompt, limits.prompt_chars),
            response: truncate_chars(response, limits.response_chars),
        }
    }
}

/// Keep at most `max` characters of `s`, respecting char boundaries.
#[must_use]
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((byte_idx, _)) => s[..byte_idx].to_string(),
        None => s.to_string(),
    }
}

/// Destination for rejected replies.
pub trait InvalidResponseSink: Send + Sync {
    /// Append one entry.
    ///
    /// # Errors
    /// Returns an error if the entry could not be written. Callers log and
    /// continue; a sink failure never fails a generation.
    fn record(&self, entry: &InvalidResponse) -> Result<()>;
}

/// Appends one JSON object per line to a file.
pub struct JsonlSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonlSink {
    /// Open (or create) the log file in append mode, creating parent directories.
    ///
    /// # Errors
    /// Returns an I/O error if the directory or file cannot be created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// Path of the log file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl std::fmt::Debug for JsonlSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonlSink").field("path", &self.path).finish()
    }
}

impl InvalidResponseSink for JsonlSink {
    fn record(&self, entry: &InvalidResponse) -> Result<()> {
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');
        let mut file = self.file.lock();
        file.write_all(line.as_bytes())?;
        file.flush()?;
        Ok(())
    }
}

/// Keeps entries in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<InvalidResponse>>,
}

impl MemorySink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of all recorded entries.
    #[must_use]
    pub fn entries(&self) -> Vec<InvalidResponse> {
        self.entries.lock().clone()
    }

    /// Number of recorded entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl InvalidResponseSink for MemorySink {
    fn record(&self, entry: &InvalidResponse) -> Result<()> {
        self.entries.lock().push(entry.clone());
        Ok(())
    }
}
