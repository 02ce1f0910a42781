use common::{ChangeEvent, ChangeKind, RegistrationStatus};
use serde_json::Value;

use super::record::{LeadRecord, PriorStatus, SubmissionRecord};

const REGISTRATION: &str = "registration";
const SUBMISSION: &str = "submission";

/// Handler selected for a change event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Abandonment(LeadRecord),
    Completion(LeadRecord),
    Ingestion(SubmissionRecord),
    Ignore(String),
}

/// Source table of an event, from `table` or else from the record's columns.
fn source_table(event: &ChangeEvent) -> Option<&str> {
    if let Some(table) = event.table.as_deref() {
        return match table.trim_end_matches('s') {
            REGISTRATION => Some(REGISTRATION),
            SUBMISSION => Some(SUBMISSION),
            _ => None,
        };
    }
    let Some(Value::Object(record)) = &event.record else {
        return None;
    };
    if record.contains_key("email") && record.contains_key("status") {
        Some(REGISTRATION)
    } else if record.contains_key("code") && record.contains_key("type") {
        Some(SUBMISSION)
    } else {
        None
    }
}

/// Pure routing decision for one event.
///
/// Registration updates fire only on `Partial -> Abandoned` and on entering
/// `Completed`; repeated writes to a terminal row are ignored. Submission
/// inserts are ingested. Everything else is ignored.
pub fn classify(event: &ChangeEvent) -> Route {
    let Some(table) = source_table(event) else {
        return Route::Ignore("unrecognised record shape".into());
    };

    match (table, event.kind) {
        (REGISTRATION, ChangeKind::Update) => {
            let Some(new) = event.record_as::<LeadRecord>() else {
                return Route::Ignore("registration record is malformed".into());
            };
            let old = event.old_record_as::<PriorStatus>().map(|p| p.status);
            match (old, new.status) {
                (Some(RegistrationStatus::Partial), RegistrationStatus::Abandoned) => {
                    Route::Abandonment(new)
                }
                (old, RegistrationStatus::Completed) if old != Some(RegistrationStatus::Completed) => {
                    Route::Completion(new)
                }
                (old, status) => Route::Ignore(format!(
                    "registration {} -> {status} needs no action",
                    old.map(|s| s.to_string()).unwrap_or_else(|| "?".into())
                )),
            }
        }
        (SUBMISSION, ChangeKind::Insert) => match event.record_as::<SubmissionRecord>() {
            Some(submission) => Route::Ingestion(submission),
            None => Route::Ignore("submission record is malformed".into()),
        },
        (table, kind) => Route::Ignore(format!("{kind:?} on {table} needs no action")),
    }
}
