//! Single-use access codes gating time-boxed file submissions.

pub mod service;
pub mod validate;
pub mod window;

pub use service::{Accepted, NewSubmission, RedemptionError, RedemptionService};
pub use validate::{CaptionedImage, SubmissionForm, SubmissionPayload};
pub use window::{SubmissionWindow, WindowStatus};

/// Canonical form of a user-typed code: trimmed and upper-cased.
pub fn normalize_code(raw: &str) -> Option<String> {
    let code = raw.trim().to_uppercase();
    if code.is_empty() { None } else { Some(code) }
}
