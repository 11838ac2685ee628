//! File attachments for chat submissions

use std::path::Path;

use super::i18n;
use super::models::Language;
use crate::config::MAX_UPLOAD_BYTES;
use crate::error::{BankchatError, Result};

/// MIME types accepted for upload
pub const ALLOWED_MIME_TYPES: [&str; 8] = [
    "application/pdf",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    "text/plain",
    "image/jpeg",
    "image/png",
    "image/gif",
];

/// A file selected for the next submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn new(filename: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            mime: mime.into(),
            bytes,
        }
    }

    /// Read a file from disk, guessing its MIME type from the extension
    ///
    /// The size and type checks run before the file body is read.
    ///
    /// # Errors
    ///
    /// Returns `BankchatError::Attachment` with a localized message when the
    /// file is too large or of an unsupported type, or an IO error.
    pub fn load(path: &Path, lang: Language) -> Result<Self> {
        let size = std::fs::metadata(path)?.len();
        if size > MAX_UPLOAD_BYTES as u64 {
            return Err(BankchatError::Attachment(i18n::file_too_large(lang).to_string()).into());
        }

        let mime = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();

        let candidate = Self::new(filename, mime, Vec::new());
        candidate.check_type(lang)?;

        let bytes = std::fs::read(path)?;
        let attachment = Self { bytes, ..candidate };
        attachment.validate(lang)?;
        Ok(attachment)
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Check size (at most 10 MB) and MIME type against the allowlist
    pub fn validate(&self, lang: Language) -> std::result::Result<(), BankchatError> {
        if self.bytes.len() > MAX_UPLOAD_BYTES {
            return Err(BankchatError::Attachment(
                i18n::file_too_large(lang).to_string(),
            ));
        }
        self.check_type(lang)
    }

    fn check_type(&self, lang: Language) -> std::result::Result<(), BankchatError> {
        if !ALLOWED_MIME_TYPES.contains(&self.mime.as_str()) {
            return Err(BankchatError::Attachment(
                i18n::file_type_not_supported(lang).to_string(),
            ));
        }
        Ok(())
    }
}
