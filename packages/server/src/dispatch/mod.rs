//! Routes row-change events to notification and ingestion handlers.

pub mod classify;
pub mod record;

use std::sync::Arc;

use common::ChangeEvent;

use crate::config::AppConfig;
use crate::ingest::{
    GoogleSheetsSink, IngestError, LogSheetSink, SheetSink, SheetTargets, ingest_submission,
};
use crate::notify::{
    LogSink, MessageSink, NotifyError, TelegramSink, notify_abandonment, notify_completion,
};

pub use classify::{Route, classify};

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("notification failed: {0}")]
    Notify(#[from] NotifyError),
    #[error("ingestion failed: {0}")]
    Ingest(#[from] IngestError),
}

impl From<DispatchError> for crate::error::AppError {
    fn from(err: DispatchError) -> Self {
        crate::error::AppError::Downstream(err.to_string())
    }
}

/// What the dispatcher did with one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Abandoned { email: String },
    Completed { email: String },
    Ingested { code: String },
    Ignored(String),
}

impl DispatchOutcome {
    pub fn handled(&self) -> bool {
        !matches!(self, Self::Ignored(_))
    }
}

/// Holds the downstream sinks. Stateless between events.
pub struct Dispatcher {
    notifier: Arc<dyn MessageSink>,
    sheets: Arc<dyn SheetSink>,
    targets: SheetTargets,
}

impl Dispatcher {
    pub fn new(
        notifier: Arc<dyn MessageSink>,
        sheets: Arc<dyn SheetSink>,
        targets: SheetTargets,
    ) -> Self {
        Self {
            notifier,
            sheets,
            targets,
        }
    }

    /// Build sinks from configuration; disabled sinks only log.
    pub fn from_config(config: &AppConfig) -> Result<Self, DispatchError> {
        let notifier: Arc<dyn MessageSink> = if config.notifier.enabled {
            Arc::new(TelegramSink::new(&config.notifier)?)
        } else {
            tracing::warn!("Notifier disabled; lifecycle notifications will only be logged");
            Arc::new(LogSink)
        };
        let sheets: Arc<dyn SheetSink> = if config.ingest.enabled {
            Arc::new(GoogleSheetsSink::from_config(&config.ingest)?)
        } else {
            tracing::warn!("Ingestion disabled; submissions will not be mirrored");
            Arc::new(LogSheetSink)
        };
        Ok(Self::new(
            notifier,
            sheets,
            SheetTargets::from_config(&config.ingest),
        ))
    }

    /// Run the handler for `event`, if any. Handler errors are returned
    /// unretried; nothing already written is undone.
    pub async fn dispatch(&self, event: &ChangeEvent) -> Result<DispatchOutcome, DispatchError> {
        match classify(event) {
            Route::Abandonment(lead) => {
                notify_abandonment(self.notifier.as_ref(), &lead).await?;
                Ok(DispatchOutcome::Abandoned { email: lead.email })
            }
            Route::Completion(lead) => {
                notify_completion(self.notifier.as_ref(), &lead).await?;
                Ok(DispatchOutcome::Completed { email: lead.email })
            }
            Route::Ingestion(submission) => {
                ingest_submission(self.sheets.as_ref(), &self.targets, &submission).await?;
                Ok(DispatchOutcome::Ingested {
                    code: submission.code,
                })
            }
            Route::Ignore(reason) => {
                tracing::debug!(kind = ?event.kind, table = ?event.table, %reason, "Event ignored");
                Ok(DispatchOutcome::Ignored(reason))
            }
        }
    }

    /// Dispatch an event for a write that has already committed.
    ///
    /// The outcome is only logged; callers never see a downstream failure.
    pub async fn dispatch_after_commit(&self, event: Result<ChangeEvent, serde_json::Error>) {
        let event = match event {
            Ok(event) => event,
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode change event");
                return;
            }
        };
        match self.dispatch(&event).await {
            Ok(outcome) if outcome.handled() => {
                tracing::info!(?outcome, "Event dispatched");
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!(kind = ?event.kind, table = ?event.table, error = %e, "Event dispatch failed");
            }
        }
    }
}
