//! Ping audit log - appends processed pings to file
//!
//! Pings are written in JSONL format (one JSON object per line) for
//! later duration/audit analysis. Records are immutable once written.

use crate::domain::types::PingRecord;
use crate::io::PingLog;
use anyhow::Context;
use async_trait::async_trait;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

/// Append-only JSONL writer for ping records
pub struct PingLogFile {
    file_path: String,
}

impl PingLogFile {
    pub fn new(file_path: &str) -> Self {
        info!(file_path = %file_path, "ping_log_initialized");
        Self { file_path: file_path.to_string() }
    }

    /// Append a line to the log file
    fn append_line(&self, line: &str) -> std::io::Result<()> {
        let path = Path::new(&self.file_path);

        // Create parent directories if they don't exist
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;

        writeln!(file, "{}", line)?;
        debug!(file = %self.file_path, bytes = %line.len(), "ping_logged");

        Ok(())
    }
}

#[async_trait]
impl PingLog for PingLogFile {
    async fn append(&self, ping: PingRecord) -> anyhow::Result<()> {
        let json = serde_json::to_string(&ping)?;
        self.append_line(&json)
            .with_context(|| format!("failed to append ping to {}", self.file_path))
    }
}
