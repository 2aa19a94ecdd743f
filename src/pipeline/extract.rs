//! Text extraction: dispatch a [`RawDocument`] to a strategy by media type.
//!
//! | Declared type              | Strategy                               |
//! |----------------------------|----------------------------------------|
//! | `application/pdf`          | pdfium text layer, pages joined by " " |
//! | `image/*`                  | decode, then [`OcrEngine`]             |
//! | `text/plain`, `application/json` | strict UTF-8 decode              |
//! | anything else              | [`DocSheetError::UnsupportedMediaType`] |

use crate::config::PipelineConfig;
use crate::document::{MediaType, RawDocument};
use crate::error::DocSheetError;
use crate::pipeline::ocr::{OcrEngine, TesseractOcr};
use crate::pipeline::pdf;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Everything extraction needs, detached from the config so it can move
/// onto a blocking thread.
#[derive(Clone)]
pub struct TextExtractor {
    ocr: Arc<dyn OcrEngine>,
    pdfium_lib_path: Option<PathBuf>,
    password: Option<String>,
}

impl TextExtractor {
    pub fn new(ocr: Arc<dyn OcrEngine>) -> Self {
        Self {
            ocr,
            pdfium_lib_path: None,
            password: None,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        let ocr = config.ocr.clone().unwrap_or_else(|| {
            Arc::new(TesseractOcr::new(
                config.tesseract_cmd.clone(),
                config.ocr_language.clone(),
            ))
        });
        Self {
            ocr,
            pdfium_lib_path: config.pdfium_lib_path.clone(),
            password: config.password.clone(),
        }
    }

    /// Extract raw text from `doc`. Blocking.
    pub fn extract(&self, doc: &RawDocument) -> Result<String, DocSheetError> {
        info!("Extracting text from {} ({})", doc.display_name(), doc.media_type);

        let text = match &doc.media_type {
            MediaType::Pdf => pdf::extract_pdf_text(
                &doc.bytes,
                self.password.as_deref(),
                self.pdfium_lib_path.as_deref(),
            )?,
            MediaType::Image(_) => {
                let image = image::load_from_memory(&doc.bytes).map_err(|e| {
                    DocSheetError::ImageDecodeFailed {
                        detail: e.to_string(),
                    }
                })?;
                self.ocr.recognize(&image)?
            }
            MediaType::PlainText | MediaType::Json => decode_utf8(&doc.bytes)?,
            MediaType::Unsupported(m) => {
                warn!("Unsupported file type: {}", m);
                return Err(DocSheetError::UnsupportedMediaType {
                    media_type: m.clone(),
                });
            }
        };

        debug!("Extracted {} chars", text.chars().count());
        Ok(text)
    }
}

fn decode_utf8(bytes: &[u8]) -> Result<String, DocSheetError> {
    String::from_utf8(bytes.to_vec()).map_err(|e| DocSheetError::TextDecodeFailed {
        detail: format!("file is not valid UTF-8: {e}"),
    })
}
