use chrono::{DateTime, Utc};
use common::{CodeCategory, RegistrationStatus};
use serde::Deserialize;

use crate::lifecycle::PaymentProofs;

/// Registration row as carried in a change event.
///
/// Only `email` and `status` are required so that partially populated rows
/// written by external tools still classify.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LeadRecord {
    pub email: String,
    pub status: RegistrationStatus,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub whatsapp: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub college: Option<String>,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub discount_flag: bool,
    #[serde(default)]
    pub proof1_url: Option<String>,
    #[serde(default)]
    pub proof2_url: Option<String>,
    #[serde(default)]
    pub amount: Option<i64>,
}

impl LeadRecord {
    pub fn proofs(&self) -> Option<PaymentProofs> {
        PaymentProofs::from_refs(self.proof1_url.as_deref(), self.proof2_url.as_deref())
    }
}

/// Minimal prior-row shape; only the status matters for routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PriorStatus {
    pub status: RegistrationStatus,
}

/// Submission row as carried in a change event.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SubmissionRecord {
    pub code: String,
    #[serde(rename = "type")]
    pub kind: CodeCategory,
    #[serde(default)]
    pub file1_url: Option<String>,
    #[serde(default)]
    pub desc1: Option<String>,
    #[serde(default)]
    pub file2_url: Option<String>,
    #[serde(default)]
    pub desc2: Option<String>,
    #[serde(default)]
    pub pdf_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}
