//! Conversation loggers.
//!
//! `TranscriptLogger` keeps the last N turns in a JSON-lines file: a few `#` header
//! lines followed by one [`TurnRecord`] per line. The file is rewritten on every
//! record so it never grows past the limit.

use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::traits::{ConversationLogger, TurnRecord};
use crate::error::AppError;

/// Appends turns to a bounded JSON-lines transcript.
pub struct TranscriptLogger {
    path: PathBuf,
    max_records: usize,
    /// Serializes read-modify-write cycles on the file
    write_lock: Mutex<()>,
}

impl TranscriptLogger {
    pub fn new(path: impl Into<PathBuf>, max_records: usize) -> Self {
        Self {
            path: path.into(),
            max_records: max_records.max(1),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads every record currently in the transcript. Unparsable lines are skipped.
    pub async fn read_records(&self) -> Result<Vec<TurnRecord>, AppError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        for line in raw.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            match serde_json::from_str::<TurnRecord>(trimmed) {
                Ok(record) => records.push(record),
                Err(e) => warn!("Skipping transcript line: {}", e),
            }
        }
        Ok(records)
    }

    async fn write_records(&self, records: &[TurnRecord]) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut out = String::new();
        out.push_str(&format!("# Replydesk transcript - last {} turns\n", records.len()));
        out.push_str(&format!("# Generated: {}\n", Utc::now().format("%Y-%m-%d %H:%M:%S")));
        out.push_str("# Each line is a JSON object representing one turn\n\n");
        for record in records {
            out.push_str(&serde_json::to_string(record)?);
            out.push('\n');
        }

        tokio::fs::write(&self.path, out).await?;
        Ok(())
    }
}

#[async_trait]
impl ConversationLogger for TranscriptLogger {
    async fn record(&self, turn: TurnRecord) -> Result<(), AppError> {
        let _guard = self.write_lock.lock().await;

        let mut records = self.read_records().await?;
        records.push(turn);
        let overflow = records.len().saturating_sub(self.max_records);
        if overflow > 0 {
            records.drain(..overflow);
        }
        self.write_records(&records).await
    }
}

/// Emits each turn as a structured `info!` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingConversationLogger;

#[async_trait]
impl ConversationLogger for TracingConversationLogger {
    async fn record(&self, turn: TurnRecord) -> Result<(), AppError> {
        info!(
            turn_id = %turn.turn_id,
            session_id = turn.session_id.as_deref().unwrap_or("-"),
            intent = %turn.intent,
            confidence = turn.confidence,
            role = %turn.role,
            flow_stage = turn.flow_stage.label(),
            needs_escalation = turn.needs_escalation,
            "Turn recorded"
        );
        Ok(())
    }
}
