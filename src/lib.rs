//! # docsheet
//!
//! Turn an uploaded document into a structured spreadsheet using a
//! language model.
//!
//! A PDF, image, or plain-text file goes in. Its text is extracted, sent to
//! a chat-completion model with a fixed entity-extraction prompt, and the
//! model's JSON reply is validated, flattened into dotted column paths, and
//! written as a single-sheet `.xlsx` workbook.
//!
//! ## Pipeline Overview
//!
//! ```text
//! document
//!  │
//!  ├─ 1. Extract   pdfium page text, tesseract OCR, or UTF-8 decode (spawn_blocking)
//!  ├─ 2. Generate  one bounded chat completion (gpt-4o-mini by default)
//!  ├─ 3. Validate  strict JSON parse; nothing past here on failure
//!  ├─ 4. Tabulate  flatten each record, union the columns in first-seen order
//!  └─ 5. Write     xlsx bytes, "Main Data" sheet, bold header
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docsheet::{process_file, PipelineConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY and friends
//!     let config = PipelineConfig::default();
//!     let stats = process_file("invoice.pdf", "output.xlsx", &config).await?;
//!     eprintln!("{} rows × {} columns", stats.rows, stats.columns);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docsheet` binary (clap + anyhow + tracing-subscriber) |
//!
//! ```toml
//! docsheet = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod document;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{PipelineConfig, PipelineConfigBuilder};
pub use convert::{extract_text, json_to_spreadsheet, process, process_file, process_sync, write_output};
pub use document::{MediaType, RawDocument};
pub use error::DocSheetError;
pub use output::{ConversionOutput, ConversionStats};
pub use pipeline::flatten::{flatten, FlatRecord};
pub use pipeline::llm::{Completion, CompletionRequest, CompletionService, ProviderService};
pub use pipeline::ocr::{OcrEngine, TesseractOcr};
pub use pipeline::sheet::write_spreadsheet;
pub use pipeline::table::{to_table, Table};
pub use pipeline::validate::validate_json;
pub use progress::{NoopProgressCallback, PipelineProgressCallback, ProgressCallback, Stage};
