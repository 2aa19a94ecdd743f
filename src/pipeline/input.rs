//! Input resolution: read a local file into a [`RawDocument`].
//!
//! The media type comes from upload metadata, never from the bytes. For a
//! local file the closest thing to upload metadata is the file extension,
//! so it is guessed from the name with `mime_guess` unless the caller
//! declares one explicitly.

use crate::document::{MediaType, RawDocument};
use crate::error::DocSheetError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// MIME type reported for files whose extension maps to nothing.
const UNKNOWN_MIME: &str = "application/octet-stream";

/// Guess the declared media type of a file from its name.
pub fn guess_media_type(path: &Path) -> MediaType {
    let mime = mime_guess::from_path(path)
        .first_raw()
        .unwrap_or(UNKNOWN_MIME);
    MediaType::from_mime(mime)
}

/// Read `path` into a document.
///
/// `media_type` overrides the extension-based guess when given.
pub async fn load_document(
    path: impl AsRef<Path>,
    media_type: Option<&str>,
) -> Result<RawDocument, DocSheetError> {
    let path = path.as_ref().to_path_buf();

    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| read_error(path.clone(), e))?;

    let media_type = match media_type {
        Some(m) => MediaType::from_mime(m),
        None => guess_media_type(&path),
    };

    debug!(
        "Loaded {} ({} bytes, {})",
        path.display(),
        bytes.len(),
        media_type
    );

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    Ok(RawDocument::new(bytes, media_type).with_name(name))
}

fn read_error(path: PathBuf, e: std::io::Error) -> DocSheetError {
    match e.kind() {
        std::io::ErrorKind::NotFound => DocSheetError::FileNotFound { path },
        std::io::ErrorKind::PermissionDenied => DocSheetError::PermissionDenied { path },
        _ => DocSheetError::Internal(format!("Failed to read '{}': {e}", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guesses_upload_types_from_extension() {
        assert_eq!(guess_media_type(Path::new("a.pdf")), MediaType::Pdf);
        assert_eq!(guess_media_type(Path::new("a.txt")), MediaType::PlainText);
        assert_eq!(guess_media_type(Path::new("a.json")), MediaType::Json);
        assert_eq!(
            guess_media_type(Path::new("scan.PNG")),
            MediaType::Image("image/png".into())
        );
        assert_eq!(
            guess_media_type(Path::new("scan.jpg")),
            MediaType::Image("image/jpeg".into())
        );
        assert_eq!(
            guess_media_type(Path::new("scan.jpeg")),
            MediaType::Image("image/jpeg".into())
        );
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        assert!(!guess_media_type(Path::new("noext")).is_supported());
        assert!(!guess_media_type(Path::new("bundle.zip")).is_supported());
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let err = load_document("/definitely/not/here.pdf", None)
            .await
            .unwrap_err();
        assert!(matches!(err, DocSheetError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn override_beats_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.bin");
        std::fs::write(&path, "hello").unwrap();

        let doc = load_document(&path, Some("text/plain")).await.unwrap();
        assert_eq!(doc.media_type, MediaType::PlainText);
        assert_eq!(doc.bytes, b"hello");
        assert_eq!(doc.name.as_deref(), Some("notes.bin"));
    }
}
