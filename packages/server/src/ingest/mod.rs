//! Mirrors accepted submissions into per-category spreadsheets.

pub mod google;
pub mod row;

use async_trait::async_trait;
use common::CodeCategory;

use crate::config::IngestConfig;
use crate::dispatch::record::SubmissionRecord;

pub use google::GoogleSheetsSink;
pub use row::submission_row;

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("failed to read service credentials: {0}")]
    Credentials(String),
    #[error("failed to sign token request: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("token endpoint returned {status}: {body}")]
    Token { status: u16, body: String },
    #[error("spreadsheet append returned {status}: {body}")]
    Append { status: u16, body: String },
    #[error("spreadsheet request failed: {0}")]
    Transport(String),
    #[error("no destination sheet configured for {0}")]
    NoSheet(CodeCategory),
}

impl From<reqwest::Error> for IngestError {
    fn from(err: reqwest::Error) -> Self {
        IngestError::Transport(err.to_string())
    }
}

/// An external spreadsheet that accepts appended rows.
#[async_trait]
pub trait SheetSink: Send + Sync {
    async fn append_row(&self, sheet_id: &str, values: Vec<String>) -> Result<(), IngestError>;
}

/// Sink used when ingestion is disabled; logs and succeeds.
#[derive(Debug, Default)]
pub struct LogSheetSink;

#[async_trait]
impl SheetSink for LogSheetSink {
    async fn append_row(&self, sheet_id: &str, values: Vec<String>) -> Result<(), IngestError> {
        tracing::info!(target: "ingest", sheet_id, ?values, "Row append (sink disabled)");
        Ok(())
    }
}

/// Destination sheet id per category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetTargets {
    pub photo_set: String,
    pub essay: String,
}

impl SheetTargets {
    pub fn from_config(config: &IngestConfig) -> Self {
        Self {
            photo_set: config.photo_sheet_id.trim().to_string(),
            essay: config.essay_sheet_id.trim().to_string(),
        }
    }

    pub fn sheet_for(&self, category: CodeCategory) -> Option<&str> {
        let id = match category {
            CodeCategory::PhotoSet => &self.photo_set,
            CodeCategory::Essay => &self.essay,
        };
        (!id.is_empty()).then_some(id.as_str())
    }
}

/// Append one row for `submission` to its category's sheet.
pub async fn ingest_submission(
    sink: &dyn SheetSink,
    targets: &SheetTargets,
    submission: &SubmissionRecord,
) -> Result<(), IngestError> {
    let sheet_id = targets
        .sheet_for(submission.kind)
        .ok_or(IngestError::NoSheet(submission.kind))?;
    sink.append_row(sheet_id, submission_row(submission)).await
}
