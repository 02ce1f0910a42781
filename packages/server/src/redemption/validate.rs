use common::CodeCategory;

use crate::config::LimitsConfig;
use crate::utils::upload::{DOCUMENT_TYPES, IMAGE_TYPES, UploadedFile};

use super::service::RedemptionError;

/// Raw fields of a submission form, before the code's category is known.
#[derive(Debug, Default)]
pub struct SubmissionForm {
    pub code: Option<String>,
    pub image1: Option<UploadedFile>,
    pub caption1: Option<String>,
    pub image2: Option<UploadedFile>,
    pub caption2: Option<String>,
    pub document: Option<UploadedFile>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionedImage {
    pub image: UploadedFile,
    pub caption: String,
}

/// A validated submission body for one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionPayload {
    PhotoSet {
        first: CaptionedImage,
        second: Option<CaptionedImage>,
    },
    Essay {
        document: UploadedFile,
    },
}

fn caption(raw: Option<String>, label: &str, max_chars: usize) -> Result<String, RedemptionError> {
    let text = raw.as_deref().map(str::trim).unwrap_or_default();
    if text.is_empty() {
        return Err(RedemptionError::Invalid(format!("{label} is required")));
    }
    if text.chars().count() > max_chars {
        return Err(RedemptionError::Invalid(format!(
            "{label} must be at most {max_chars} characters"
        )));
    }
    Ok(text.to_string())
}

fn image(
    file: UploadedFile,
    caption_text: Option<String>,
    index: u8,
    limits: &LimitsConfig,
) -> Result<CaptionedImage, RedemptionError> {
    file.check(IMAGE_TYPES, limits.max_image_bytes, &format!("Image {index}"))
        .map_err(RedemptionError::Invalid)?;
    let caption = caption(
        caption_text,
        &format!("Caption {index}"),
        limits.max_caption_chars,
    )?;
    Ok(CaptionedImage {
        image: file,
        caption,
    })
}

/// Validate a form against the category its code was issued for.
pub fn validate_submission(
    category: CodeCategory,
    form: SubmissionForm,
    limits: &LimitsConfig,
) -> Result<SubmissionPayload, RedemptionError> {
    match category {
        CodeCategory::PhotoSet => {
            if form.document.is_some() {
                return Err(RedemptionError::Invalid(
                    "Photo submissions do not accept a document".into(),
                ));
            }
            let first = form
                .image1
                .ok_or_else(|| RedemptionError::Invalid("Image 1 is required".into()))?;
            let first = image(first, form.caption1, 1, limits)?;
            let second = match form.image2 {
                Some(file) => Some(image(file, form.caption2, 2, limits)?),
                None if form.caption2.as_deref().is_some_and(|c| !c.trim().is_empty()) => {
                    return Err(RedemptionError::Invalid(
                        "Caption 2 was given without Image 2".into(),
                    ));
                }
                None => None,
            };
            Ok(SubmissionPayload::PhotoSet { first, second })
        }
        CodeCategory::Essay => {
            if form.image1.is_some() || form.image2.is_some() {
                return Err(RedemptionError::Invalid(
                    "Essay submissions do not accept images".into(),
                ));
            }
            let document = form
                .document
                .ok_or_else(|| RedemptionError::Invalid("Document is required".into()))?;
            document
                .check(DOCUMENT_TYPES, limits.max_document_bytes, "Document")
                .map_err(RedemptionError::Invalid)?;
            Ok(SubmissionPayload::Essay { document })
        }
    }
}
