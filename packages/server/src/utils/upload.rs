use axum::extract::multipart::Field;
use common::storage::{ObjectKey, ObjectStore, StoredObject};

use crate::error::AppError;

/// Raster image types accepted for photos and payment proofs.
pub const IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp"];
/// Document types accepted for essays.
pub const DOCUMENT_TYPES: &[&str] = &["application/pdf"];

/// A file read fully from a multipart field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub filename: String,
    /// Declared or guessed MIME type.
    pub content_type: String,
    pub data: Vec<u8>,
}

impl UploadedFile {
    /// MIME type detected from the file's magic bytes, falling back to the
    /// declared type.
    pub fn effective_type(&self) -> &str {
        sniff(&self.data).unwrap_or(self.content_type.as_str())
    }

    /// Check the file is non-empty, within `max_bytes`, and of an allowed type.
    pub fn check(&self, allowed: &[&str], max_bytes: u64, label: &str) -> Result<(), String> {
        if self.data.is_empty() {
            return Err(format!("{label} is empty"));
        }
        if self.data.len() as u64 > max_bytes {
            return Err(format!("{label} exceeds maximum size of {max_bytes} bytes"));
        }
        let mime = self.effective_type();
        if !allowed.contains(&mime) {
            return Err(format!(
                "{label} must be one of: {} (got {mime})",
                allowed.join(", ")
            ));
        }
        Ok(())
    }
}

/// Identify the common upload formats by signature.
fn sniff(data: &[u8]) -> Option<&'static str> {
    match data {
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, ..] => Some("image/png"),
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Some("image/webp"),
        [b'%', b'P', b'D', b'F', b'-', ..] => Some("application/pdf"),
        [b'G', b'I', b'F', b'8', ..] => Some("image/gif"),
        _ => None,
    }
}

/// Reject filenames that could smuggle paths or header-breaking bytes.
fn check_filename(raw: &str) -> Result<String, AppError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Filename cannot be empty".into()));
    }
    if name.chars().any(|c| c.is_control()) {
        return Err(AppError::Validation(
            "Invalid filename: control characters are not allowed".into(),
        ));
    }
    if name.contains('/') || name.contains('\\') || name.starts_with('.') {
        return Err(AppError::Validation(
            "Invalid filename: path components are not allowed".into(),
        ));
    }
    Ok(name.to_string())
}

/// Read a file field into memory, failing once it grows past `max_size`.
pub async fn read_file_field(
    mut field: Field<'_>,
    max_size: u64,
) -> Result<UploadedFile, AppError> {
    let label = field.name().unwrap_or("file").to_string();
    let filename = field
        .file_name()
        .map(check_filename)
        .transpose()?
        .ok_or_else(|| AppError::Validation(format!("Field '{label}' must be a file")))?;

    let declared = field
        .content_type()
        .map(str::to_string)
        .filter(|t| t != "application/octet-stream");
    let content_type = declared.unwrap_or_else(|| {
        mime_guess::from_path(&filename)
            .first_or_octet_stream()
            .to_string()
    });

    let mut data = Vec::new();
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?
    {
        if (data.len() + chunk.len()) as u64 > max_size {
            return Err(AppError::Validation(format!(
                "Field '{label}' exceeds maximum size of {max_size} bytes"
            )));
        }
        data.extend_from_slice(&chunk);
    }

    Ok(UploadedFile {
        filename,
        content_type,
        data,
    })
}

/// Read a text field.
pub async fn read_text_field(field: Field<'_>) -> Result<String, AppError> {
    let label = field.name().unwrap_or("field").to_string();
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read '{label}': {e}")))
}

/// Store an uploaded file under a fresh key below `prefix`.
pub async fn store_file(
    store: &dyn ObjectStore,
    prefix: &str,
    file: &UploadedFile,
) -> Result<StoredObject, AppError> {
    let key = ObjectKey::generate(prefix, &file.filename)?;
    let stored = store
        .put(&key, &file.data, file.effective_type())
        .await?;
    Ok(stored)
}
