//! Input document types.
//!
//! A [`RawDocument`] is whatever the front end received: bytes plus the
//! media type it was declared with. The declared type alone selects the
//! extraction strategy. Content is never sniffed, so a PDF uploaded as
//! `text/plain` is decoded as text and fails there.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Extraction strategy selected by a declared MIME type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaType {
    /// `application/pdf`
    Pdf,
    /// Any `image/*` subtype; the full MIME string is kept.
    Image(String),
    /// `text/plain`
    PlainText,
    /// `application/json`
    Json,
    /// Anything else; the declared string is kept for error reporting.
    Unsupported(String),
}

impl MediaType {
    /// Classify a declared MIME string.
    ///
    /// Parameters (`; charset=…`) are dropped and comparison is
    /// case-insensitive.
    pub fn from_mime(mime: &str) -> Self {
        let essence = mime
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            "application/pdf" => MediaType::Pdf,
            "text/plain" => MediaType::PlainText,
            "application/json" => MediaType::Json,
            s if s.starts_with("image/") => MediaType::Image(essence),
            _ => MediaType::Unsupported(mime.trim().to_string()),
        }
    }

    /// The canonical MIME string for this media type.
    pub fn as_mime(&self) -> &str {
        match self {
            MediaType::Pdf => "application/pdf",
            MediaType::Image(m) => m,
            MediaType::PlainText => "text/plain",
            MediaType::Json => "application/json",
            MediaType::Unsupported(m) => m,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, MediaType::Unsupported(_))
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_mime())
    }
}

/// An uploaded document, consumed once by the text extractor.
#[derive(Debug, Clone)]
pub struct RawDocument {
    /// File name as uploaded, for logging only.
    pub name: Option<String>,
    pub media_type: MediaType,
    pub bytes: Vec<u8>,
}

impl RawDocument {
    pub fn new(bytes: impl Into<Vec<u8>>, media_type: MediaType) -> Self {
        Self {
            name: None,
            media_type,
            bytes: bytes.into(),
        }
    }

    /// Build a document from bytes and a declared MIME string.
    pub fn from_mime(bytes: impl Into<Vec<u8>>, mime: &str) -> Self {
        Self::new(bytes, MediaType::from_mime(mime))
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Name for log lines: the file name, or the media type when unnamed.
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("<{}>", self.media_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_declared_types() {
        assert_eq!(MediaType::from_mime("application/pdf"), MediaType::Pdf);
        assert_eq!(MediaType::from_mime("text/plain"), MediaType::PlainText);
        assert_eq!(MediaType::from_mime("application/json"), MediaType::Json);
        assert_eq!(
            MediaType::from_mime("image/png"),
            MediaType::Image("image/png".into())
        );
        assert_eq!(
            MediaType::from_mime("image/jpeg"),
            MediaType::Image("image/jpeg".into())
        );
    }

    #[test]
    fn zip_is_unsupported() {
        let m = MediaType::from_mime("application/zip");
        assert_eq!(m, MediaType::Unsupported("application/zip".into()));
        assert!(!m.is_supported());
    }

    #[test]
    fn parameters_and_case_ignored() {
        assert_eq!(
            MediaType::from_mime("Text/Plain; charset=utf-8"),
            MediaType::PlainText
        );
    }

    #[test]
    fn display_name_falls_back_to_mime() {
        let doc = RawDocument::from_mime(b"hi".to_vec(), "text/plain");
        assert_eq!(doc.display_name(), "<text/plain>");
        assert_eq!(doc.with_name("a.txt").display_name(), "a.txt");
    }
}
