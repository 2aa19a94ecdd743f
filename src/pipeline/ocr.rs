//! Optical character recognition for image uploads.
//!
//! [`OcrEngine`] is the seam: the default [`TesseractOcr`] shells out to the
//! `tesseract` command line, and tests or embedders can plug in anything
//! else. Output is the engine's best-effort text with no post-processing
//! and no confidence filtering.

use crate::error::DocSheetError;
use image::DynamicImage;
use std::path::PathBuf;
use std::process::Command;
use tracing::{debug, warn};

/// Recognise text in a decoded image. Blocking.
pub trait OcrEngine: Send + Sync {
    fn recognize(&self, image: &DynamicImage) -> Result<String, DocSheetError>;
}

/// OCR through the `tesseract` executable.
///
/// The image is re-encoded as PNG into a temp file because tesseract reads
/// from a path; the file is removed when the call returns.
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    pub command: PathBuf,
    pub language: String,
}

impl Default for TesseractOcr {
    fn default() -> Self {
        Self {
            command: PathBuf::from("tesseract"),
            language: "eng".to_string(),
        }
    }
}

impl TesseractOcr {
    pub fn new(command: impl Into<PathBuf>, language: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            language: language.into(),
        }
    }
}

impl OcrEngine for TesseractOcr {
    fn recognize(&self, image: &DynamicImage) -> Result<String, DocSheetError> {
        let tmp = tempfile::Builder::new()
            .prefix("docsheet-ocr-")
            .suffix(".png")
            .tempfile()
            .map_err(|e| DocSheetError::Internal(format!("tempfile: {e}")))?;

        image
            .save_with_format(tmp.path(), image::ImageFormat::Png)
            .map_err(|e| DocSheetError::OcrFailed {
                detail: format!("could not stage image for tesseract: {e}"),
            })?;

        let output = Command::new(&self.command)
            .arg(tmp.path())
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .output()
            .map_err(|e| DocSheetError::OcrFailed {
                detail: format!(
                    "failed to run '{}': {e}. Install tesseract-ocr or pass --tesseract.",
                    self.command.display()
                ),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("tesseract exited with {}: {}", output.status, stderr.trim());
            return Err(DocSheetError::OcrFailed {
                detail: format!("tesseract exited with {}: {}", output.status, stderr.trim()),
            });
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!(
            "tesseract ({}) recognised {} chars from {}x{} image",
            self.language,
            text.len(),
            image.width(),
            image.height()
        );
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn missing_binary_is_ocr_error() {
        let ocr = TesseractOcr::new("/nonexistent/tesseract", "eng");
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([255, 255, 255])));
        let err = ocr.recognize(&img).unwrap_err();
        assert!(matches!(err, DocSheetError::OcrFailed { .. }), "got {err:?}");
    }

    #[test]
    fn default_is_english_tesseract() {
        let ocr = TesseractOcr::default();
        assert_eq!(ocr.command, PathBuf::from("tesseract"));
        assert_eq!(ocr.language, "eng");
    }
}
