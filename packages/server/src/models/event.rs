use serde::{Deserialize, Serialize};

use crate::dispatch::DispatchOutcome;

/// Result of handing a change event to the dispatcher.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct EventResponse {
    /// `abandonment`, `completion`, `ingestion` or `ignored`.
    #[schema(example = "completion")]
    pub handler: String,
    /// Lead email or submission code the handler acted on; reason when ignored.
    #[schema(example = "a@x.com")]
    pub detail: String,
}

impl From<DispatchOutcome> for EventResponse {
    fn from(outcome: DispatchOutcome) -> Self {
        let (handler, detail) = match outcome {
            DispatchOutcome::Abandoned { email } => ("abandonment", email),
            DispatchOutcome::Completed { email } => ("completion", email),
            DispatchOutcome::Ingested { code } => ("ingestion", code),
            DispatchOutcome::Ignored(reason) => ("ignored", reason),
        };
        Self {
            handler: handler.into(),
            detail,
        }
    }
}
