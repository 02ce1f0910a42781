use std::fmt;

use super::error::StorageError;

/// Maximum length of a single key segment.
const MAX_SEGMENT_LEN: usize = 128;

/// A validated, slash-separated object key such as
/// `registrations/0190f6c2-.../proof1.jpg`.
///
/// Segments are restricted to `[A-Za-z0-9._-]`, may not start with a dot,
/// and may not be empty, so a key can never escape the store root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectKey(String);

impl ObjectKey {
    /// Build a fresh key under `prefix` for an uploaded file.
    ///
    /// The original filename is reduced to a safe slug and prefixed with a
    /// UUIDv7 so repeated uploads of the same name never collide.
    pub fn generate(prefix: &str, filename: &str) -> Result<Self, StorageError> {
        let slug = slugify(filename);
        let leaf = if slug.is_empty() {
            uuid::Uuid::now_v7().to_string()
        } else {
            format!("{}-{}", uuid::Uuid::now_v7(), slug)
        };
        Self::parse(&format!("{}/{}", prefix.trim_matches('/'), leaf))
    }

    /// Validate an existing key.
    pub fn parse(raw: &str) -> Result<Self, StorageError> {
        if raw.is_empty() {
            return Err(StorageError::InvalidKey("key is empty".into()));
        }
        for segment in raw.split('/') {
            if segment.is_empty() {
                return Err(StorageError::InvalidKey(format!("empty segment in '{raw}'")));
            }
            if segment.starts_with('.') {
                return Err(StorageError::InvalidKey(format!(
                    "segment '{segment}' starts with a dot"
                )));
            }
            if segment.len() > MAX_SEGMENT_LEN {
                return Err(StorageError::InvalidKey(format!(
                    "segment longer than {MAX_SEGMENT_LEN} bytes"
                )));
            }
            if !segment
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-'))
            {
                return Err(StorageError::InvalidKey(format!(
                    "segment '{segment}' contains unsupported characters"
                )));
            }
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path segments of the key.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reduce a user-supplied filename to `[a-z0-9._-]`, keeping the extension.
fn slugify(filename: &str) -> String {
    let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    let out = out.trim_start_matches(['.', '-']).to_string();
    out.chars().take(64).collect()
}
