use common::CodeCategory;

use crate::dispatch::record::SubmissionRecord;

/// Ordered sheet values for a submission.
///
/// PhotoSet: `[created_at, code, file1_url, desc1, file2_url, desc2]`, with
/// the second pair blank when absent. Essay: `[created_at, code, pdf_url]`.
pub fn submission_row(submission: &SubmissionRecord) -> Vec<String> {
    let text = |v: &Option<String>| v.clone().unwrap_or_default();
    let created_at = submission
        .created_at
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default();

    match submission.kind {
        CodeCategory::PhotoSet => vec![
            created_at,
            submission.code.clone(),
            text(&submission.file1_url),
            text(&submission.desc1),
            text(&submission.file2_url),
            text(&submission.desc2),
        ],
        CodeCategory::Essay => vec![
            created_at,
            submission.code.clone(),
            text(&submission.pdf_url),
        ],
    }
}
