//! PDF text extraction via pdfium.
//!
//! Only the embedded text layer is read. A scanned page with no text layer
//! contributes an empty string; it is not rasterised and OCR'd.
//!
//! pdfium is a C++ library behind FFI and blocks; callers on an async
//! runtime run this inside `spawn_blocking`.

use crate::error::DocSheetError;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// Environment variable naming an existing pdfium library file.
pub const PDFIUM_LIB_ENV: &str = "PDFIUM_LIB_PATH";

/// Bind to pdfium: explicit path, then `PDFIUM_LIB_PATH`, then the system
/// library.
pub fn bind_pdfium(lib_path: Option<&Path>) -> Result<Pdfium, DocSheetError> {
    let explicit = lib_path
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os(PDFIUM_LIB_ENV).map(Into::into));

    let bindings = match explicit {
        Some(path) => {
            debug!("Binding pdfium from {}", path.display());
            Pdfium::bind_to_library(&path)
        }
        None => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| DocSheetError::PdfiumBindingFailed(format!("{:?}", e)))?;

    Ok(Pdfium::new(bindings))
}

/// Extract text from every page and join pages with a single space.
pub fn extract_pdf_text(
    bytes: &[u8],
    password: Option<&str>,
    lib_path: Option<&Path>,
) -> Result<String, DocSheetError> {
    let pdfium = bind_pdfium(lib_path)?;

    let document = pdfium
        .load_pdf_from_byte_slice(bytes, password)
        .map_err(|e| {
            let err_str = format!("{:?}", e);
            if err_str.contains("Password") || err_str.contains("password") {
                if password.is_some() {
                    DocSheetError::WrongPassword
                } else {
                    DocSheetError::PasswordRequired
                }
            } else {
                DocSheetError::CorruptPdf { detail: err_str }
            }
        })?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    info!("PDF loaded: {} pages", total_pages);

    let mut texts = Vec::with_capacity(total_pages);
    for (idx, page) in pages.iter().enumerate() {
        let text = page
            .text()
            .map_err(|e| DocSheetError::CorruptPdf {
                detail: format!("page {}: {:?}", idx + 1, e),
            })?
            .all();

        debug!("Page {}: {} chars", idx + 1, text.len());
        texts.push(text);
    }

    Ok(join_pages(&texts))
}

/// Join page texts with a single space. Empty pages still take a slot.
pub fn join_pages<S: AsRef<str>>(pages: &[S]) -> String {
    pages
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pages_joined_with_single_space() {
        assert_eq!(join_pages(&["Invoice", "Total: 10"]), "Invoice Total: 10");
    }

    #[test]
    fn empty_page_keeps_its_separator() {
        assert_eq!(join_pages(&["a", "", "b"]), "a  b");
        assert_eq!(join_pages::<&str>(&[]), "");
    }

    #[test]
    fn bad_library_path_is_binding_error() {
        let err = bind_pdfium(Some(Path::new("/nonexistent/libpdfium.so"))).unwrap_err();
        assert!(matches!(err, DocSheetError::PdfiumBindingFailed(_)));
    }
}
