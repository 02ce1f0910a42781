use chrono::{DateTime, Utc};
use common::{CodeCategory, SubmissionState};
use serde::{Deserialize, Serialize};

use crate::entity::submission;
use crate::redemption::WindowStatus;

/// Current state of the submission window.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct WindowResponse {
    pub status: WindowStatus,
    pub open: DateTime<Utc>,
    pub close: DateTime<Utc>,
    pub now: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct VerifyCodeRequest {
    /// Access code as typed; trimmed and upper-cased before lookup.
    #[schema(example = "PHOTO-001")]
    pub code: String,
}

/// A code that may be redeemed now.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct VerifyCodeResponse {
    #[schema(example = "PHOTO-001")]
    pub code: String,
    /// Fixed at issuance; decides which files the submission takes.
    pub category: CodeCategory,
}

/// Response DTO for an accepted submission.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SubmissionResponse {
    pub id: i32,
    #[schema(example = "PHOTO-001")]
    pub code: String,
    #[serde(rename = "type")]
    pub kind: CodeCategory,
    pub file1_url: Option<String>,
    pub desc1: Option<String>,
    pub file2_url: Option<String>,
    pub desc2: Option<String>,
    pub pdf_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub status: SubmissionState,
}

impl From<submission::Model> for SubmissionResponse {
    fn from(m: submission::Model) -> Self {
        Self {
            id: m.id,
            code: m.code,
            kind: m.kind,
            file1_url: m.file1_url,
            desc1: m.desc1,
            file2_url: m.file2_url,
            desc2: m.desc2,
            pdf_url: m.pdf_url,
            created_at: m.created_at,
            status: m.status,
        }
    }
}
