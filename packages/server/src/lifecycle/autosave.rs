use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::draft::{FieldEdit, RegistrationDraft};
use super::service::{DraftOutcome, LeadService};
use crate::config::RegistrationConfig;

/// Destination for debounced draft snapshots.
#[async_trait]
pub trait DraftSink: Send + Sync + 'static {
    async fn persist(&self, draft: RegistrationDraft) -> anyhow::Result<()>;
}

/// Writes snapshots straight into the lifecycle store.
pub struct StoreSink {
    db: DatabaseConnection,
}

impl StoreSink {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DraftSink for StoreSink {
    async fn persist(&self, draft: RegistrationDraft) -> anyhow::Result<()> {
        match LeadService::new(&self.db).save_draft(&draft).await? {
            DraftOutcome::Terminal(row) => {
                debug!(email = %row.email, status = %row.status, "Autosave ignored for terminal lead")
            }
            DraftOutcome::Saved(_) | DraftOutcome::NotPersistable => {}
        }
        Ok(())
    }
}

/// Buffers field edits and persists the latest snapshot once the user has
/// stopped editing for the quiet period.
///
/// Each quiet period emits at most one snapshot. Snapshots without an
/// email are dropped. Edits still pending when the autosaver is closed are
/// discarded, matching a form being torn down mid-debounce.
pub struct DraftAutosaver {
    tx: mpsc::UnboundedSender<FieldEdit>,
    task: JoinHandle<()>,
}

impl DraftAutosaver {
    pub fn spawn<S: DraftSink>(sink: Arc<S>, quiet_period: Duration) -> Self {
        Self::spawn_from(RegistrationDraft::default(), sink, quiet_period)
    }

    /// Autosave straight into the lifecycle store at the configured cadence.
    pub fn spawn_for_store(db: DatabaseConnection, config: &RegistrationConfig) -> Self {
        Self::spawn(Arc::new(StoreSink::new(db)), config.draft_quiet_period())
    }

    /// Start from an existing draft, e.g. one restored after a reload.
    pub fn spawn_from<S: DraftSink>(
        initial: RegistrationDraft,
        sink: Arc<S>,
        quiet_period: Duration,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(initial, rx, sink, quiet_period));
        Self { tx, task }
    }

    /// Record an edit. Returns `false` if the autosaver has stopped.
    pub fn edit(&self, edit: FieldEdit) -> bool {
        self.tx.send(edit).is_ok()
    }

    /// Stop accepting edits and wait for an in-flight write to finish.
    pub async fn close(self) {
        drop(self.tx);
        let _ = self.task.await;
    }
}

async fn run<S: DraftSink>(
    mut draft: RegistrationDraft,
    mut rx: mpsc::UnboundedReceiver<FieldEdit>,
    sink: Arc<S>,
    quiet_period: Duration,
) {
    let mut dirty = false;
    loop {
        let next = if dirty {
            match tokio::time::timeout(quiet_period, rx.recv()).await {
                Ok(next) => next,
                Err(_) => {
                    dirty = false;
                    if draft.is_persistable() {
                        if let Err(e) = sink.persist(draft.clone()).await {
                            warn!(error = %e, "Draft autosave failed");
                        }
                    } else {
                        debug!("Draft has no email yet, skipping autosave");
                    }
                    continue;
                }
            }
        } else {
            rx.recv().await
        };

        match next {
            Some(edit) => {
                draft.apply(edit);
                dirty = true;
            }
            None => break,
        }
    }
}
