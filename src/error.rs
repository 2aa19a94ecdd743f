//! Error types for the docsheet library.
//!
//! Every pipeline stage fails in its own way, but a failure anywhere halts
//! the whole document: no partial spreadsheet is ever produced. A single
//! enum, [`DocSheetError`], carries all of them, grouped by the stage that
//! raised them. [`DocSheetError::stage`] recovers the grouping so callers
//! (and the progress callback) can tell an extraction problem from a model
//! problem without matching every variant.

use crate::progress::Stage;
use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the docsheet library.
#[derive(Debug, Error)]
pub enum DocSheetError {
    // ── Extraction errors ─────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Input file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The declared media type has no extraction strategy.
    #[error("Unsupported file type '{media_type}'. Please upload a PDF, image, or text file.")]
    UnsupportedMediaType { media_type: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium or pass --pdfium-lib."
    )]
    PdfiumBindingFailed(String),

    /// PDF requires a password but none was provided.
    #[error("PDF is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired,

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF")]
    WrongPassword,

    /// PDF could not be parsed or its text could not be read.
    #[error("PDF is corrupt or unreadable: {detail}")]
    CorruptPdf { detail: String },

    /// Image bytes could not be decoded.
    #[error("Error extracting text: image could not be decoded: {detail}")]
    ImageDecodeFailed { detail: String },

    /// The OCR engine failed to run or returned an error.
    #[error("Error extracting text: OCR failed: {detail}")]
    OcrFailed { detail: String },

    /// Text/JSON upload is not valid UTF-8.
    #[error("Error extracting text: {detail}")]
    TextDecodeFailed { detail: String },

    /// Extraction succeeded but produced no text to send to the model.
    #[error("No text could be extracted from the document")]
    NoTextExtracted,

    // ── Service errors ────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The text-generation service returned an error.
    #[error("Error generating JSON: {message}")]
    LlmApiError { message: String },

    /// The text-generation call did not return in time.
    #[error("Error generating JSON: model call timed out after {secs}s")]
    ApiTimeout { secs: u64 },

    // ── Format errors ─────────────────────────────────────────────────────
    /// Model response is not valid JSON.
    #[error("Invalid JSON response. Please check the input. ({detail})")]
    InvalidJson { detail: String },

    // ── Shape errors ──────────────────────────────────────────────────────
    /// Parsed JSON root is a bare scalar.
    #[error("Unsupported JSON format: root must be an object or array (got {kind})")]
    UnsupportedRoot { kind: &'static str },

    /// Nesting exceeds the configured flatten depth.
    #[error("JSON nesting exceeds the maximum depth of {limit}")]
    FlattenDepthExceeded { limit: usize },

    // ── Conversion errors ─────────────────────────────────────────────────
    /// The spreadsheet writer rejected the table.
    #[error("Error converting JSON to Excel: {detail}")]
    SpreadsheetFailed { detail: String },

    /// Could not create or write the output spreadsheet file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DocSheetError {
    /// The pipeline stage this error belongs to.
    ///
    /// Config and internal errors have no natural stage and are reported
    /// against [`Stage::Extraction`], the first stage that can observe them.
    pub fn stage(&self) -> Stage {
        use DocSheetError::*;
        match self {
            FileNotFound { .. }
            | PermissionDenied { .. }
            | UnsupportedMediaType { .. }
            | PdfiumBindingFailed(_)
            | PasswordRequired
            | WrongPassword
            | CorruptPdf { .. }
            | ImageDecodeFailed { .. }
            | OcrFailed { .. }
            | TextDecodeFailed { .. }
            | NoTextExtracted
            | InvalidConfig(_)
            | Internal(_) => Stage::Extraction,
            ProviderNotConfigured { .. } | LlmApiError { .. } | ApiTimeout { .. } => {
                Stage::Service
            }
            InvalidJson { .. } => Stage::Validation,
            UnsupportedRoot { .. } | FlattenDepthExceeded { .. } => Stage::Tabulation,
            SpreadsheetFailed { .. } | OutputWriteFailed { .. } => Stage::Spreadsheet,
        }
    }
}

impl From<rust_xlsxwriter::XlsxError> for DocSheetError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        DocSheetError::SpreadsheetFailed {
            detail: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_media_type_display() {
        let e = DocSheetError::UnsupportedMediaType {
            media_type: "application/zip".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("Unsupported file type"), "got: {msg}");
        assert!(msg.contains("application/zip"));
    }

    #[test]
    fn invalid_json_display() {
        let e = DocSheetError::InvalidJson {
            detail: "expected value at line 1 column 6".into(),
        };
        assert!(e.to_string().starts_with("Invalid JSON response"));
    }

    #[test]
    fn unsupported_root_display() {
        let e = DocSheetError::UnsupportedRoot { kind: "number" };
        assert!(e.to_string().contains("root must be an object or array"));
    }

    #[test]
    fn api_timeout_display() {
        let e = DocSheetError::ApiTimeout { secs: 30 };
        assert!(e.to_string().contains("30s"));
    }

    #[test]
    fn stages_follow_taxonomy() {
        assert_eq!(DocSheetError::NoTextExtracted.stage(), Stage::Extraction);
        assert_eq!(
            DocSheetError::LlmApiError {
                message: "boom".into()
            }
            .stage(),
            Stage::Service
        );
        assert_eq!(
            DocSheetError::InvalidJson { detail: "x".into() }.stage(),
            Stage::Validation
        );
        assert_eq!(
            DocSheetError::FlattenDepthExceeded { limit: 4 }.stage(),
            Stage::Tabulation
        );
        assert_eq!(
            DocSheetError::SpreadsheetFailed { detail: "x".into() }.stage(),
            Stage::Spreadsheet
        );
    }
}
