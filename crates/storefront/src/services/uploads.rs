//! Multipart form parsing and upload storage.
//!
//! The content and profile forms are submitted as multipart so they can
//! carry an image. This module collects the text fields and at most one
//! file, and stores accepted files under the configured upload directory
//! with generated names (the client-supplied filename is only consulted
//! for its extension).

use std::collections::HashMap;
use std::path::Path;

use axum::body::Bytes;
use axum::extract::multipart::{Multipart, MultipartError};
use thiserror::Error;
use uuid::Uuid;

/// Errors from form parsing or upload storage.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The multipart stream was malformed.
    #[error("multipart error: {0}")]
    Multipart(#[from] MultipartError),

    /// A required field was missing from the form.
    #[error("missing form field: {0}")]
    MissingField(&'static str),

    /// Writing the file failed.
    #[error("upload storage error: {0}")]
    Io(#[from] std::io::Error),
}

/// A file submitted with a form.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Client-supplied filename (used only for its extension).
    pub filename: String,
    pub bytes: Bytes,
}

/// Text fields and the optional file of a submitted multipart form.
#[derive(Debug, Default)]
pub struct FormData {
    fields: HashMap<String, String>,
    /// The first non-empty file field, if any.
    pub upload: Option<UploadedFile>,
}

impl FormData {
    /// Drain a multipart stream into text fields and at most one file.
    ///
    /// A file input left empty by the browser arrives as a part with an
    /// empty filename; those are ignored.
    ///
    /// # Errors
    ///
    /// Returns `UploadError::Multipart` if the stream is malformed.
    pub async fn parse(mut multipart: Multipart) -> Result<Self, UploadError> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(ToOwned::to_owned) else {
                continue;
            };

            if let Some(filename) = field.file_name().map(ToOwned::to_owned) {
                let bytes = field.bytes().await?;
                if !filename.is_empty() && !bytes.is_empty() && form.upload.is_none() {
                    form.upload = Some(UploadedFile { filename, bytes });
                }
            } else {
                let value = field.text().await?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }

    /// Get a text field, trimmed.
    #[must_use]
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(|v| v.trim())
    }

    /// Get a required text field, trimmed.
    ///
    /// # Errors
    ///
    /// Returns `UploadError::MissingField` if the field is absent.
    pub fn required(&self, name: &'static str) -> Result<&str, UploadError> {
        self.text(name).ok_or(UploadError::MissingField(name))
    }

    /// Get a trimmed text field, mapping an empty value to `None`.
    #[must_use]
    pub fn optional(&self, name: &str) -> Option<String> {
        self.text(name)
            .filter(|v| !v.is_empty())
            .map(ToOwned::to_owned)
    }

    /// Whether a checkbox field was checked.
    ///
    /// Browsers omit unchecked checkboxes entirely, so presence is the
    /// signal; the value is ignored.
    #[must_use]
    pub fn checkbox(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }
}

/// Store an uploaded file and return its generated filename.
///
/// Files get a fresh UUID name; only an alphanumeric extension is carried
/// over from the client.
///
/// # Errors
///
/// Returns `UploadError::Io` if the directory or file cannot be written.
pub async fn store_file(dir: &Path, file: &UploadedFile) -> Result<String, UploadError> {
    let extension = Path::new(&file.filename)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(str::to_lowercase);

    let name = match extension {
        Some(ext) => format!("{}.{ext}", Uuid::new_v4()),
        None => Uuid::new_v4().to_string(),
    };

    tokio::fs::create_dir_all(dir).await?;
    tokio::fs::write(dir.join(&name), &file.bytes).await?;

    Ok(name)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_file_keeps_extension() {
        let dir = std::env::temp_dir().join(format!("oakwood-test-{}", Uuid::new_v4()));
        let file = UploadedFile {
            filename: "Chair Photo.JPG".to_owned(),
            bytes: Bytes::from_static(b"not really a jpeg"),
        };

        let name = store_file(&dir, &file).await.unwrap();
        assert!(name.ends_with(".jpg"));

        let written = tokio::fs::read(dir.join(&name)).await.unwrap();
        assert_eq!(written, b"not really a jpeg");

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn test_store_file_drops_suspicious_extension() {
        let dir = std::env::temp_dir().join(format!("oakwood-test-{}", Uuid::new_v4()));
        let file = UploadedFile {
            filename: "../../etc/passwd%00.p h p".to_owned(),
            bytes: Bytes::from_static(b"x"),
        };

        let name = store_file(&dir, &file).await.unwrap();
        assert!(!name.contains('/'));
        assert!(!name.contains(' '));

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
