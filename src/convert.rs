//! Conversion entry points.
//!
//! [`process`] is the whole pipeline as one function of a document and a
//! config: no UI, no globals, no partial output. Each stage either hands
//! its result to the next or returns the error that ends the run. The other
//! functions here are thin wrappers for files, for synchronous callers, and
//! for the stages that need no model at all.

use crate::config::PipelineConfig;
use crate::document::RawDocument;
use crate::error::DocSheetError;
use crate::output::{ConversionOutput, ConversionStats};
use crate::pipeline::extract::TextExtractor;
use crate::pipeline::table::{to_table, Table};
use crate::pipeline::{input, llm, sheet, validate};
use crate::progress::Stage;
use serde_json::Value;
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

/// Convert one document into a spreadsheet.
///
/// # Errors
/// Returns the first stage failure; see [`DocSheetError::stage`].
pub async fn process(
    document: RawDocument,
    config: &PipelineConfig,
) -> Result<ConversionOutput, DocSheetError> {
    let total_start = Instant::now();
    info!("Starting conversion: {}", document.display_name());
    let media_type = document.media_type.to_string();

    // ── Step 1: Extract text ─────────────────────────────────────────────
    let extraction_start = Instant::now();
    let text = extract_text(document, config).await?;
    let extraction_duration_ms = extraction_start.elapsed().as_millis() as u64;

    // ── Step 2: Ask the model ────────────────────────────────────────────
    stage_start(config, Stage::Service);
    let llm_start = Instant::now();
    let completion = match llm::resolve_service(config) {
        Ok(service) => llm::request_extraction(service.as_ref(), &text, config).await,
        Err(e) => Err(e),
    };
    let completion = stage_finish(config, Stage::Service, completion, |c| {
        format!("{} chars", c.content.chars().count())
    })?;
    let llm_duration_ms = llm_start.elapsed().as_millis() as u64;

    // ── Steps 3–5: Validate, tabulate, write ─────────────────────────────
    let (data, table, spreadsheet) = tabulate(&completion.content, config)?;

    let stats = ConversionStats {
        media_type,
        extracted_chars: text.chars().count(),
        rows: table.row_count(),
        columns: table.column_count(),
        spreadsheet_bytes: spreadsheet.len(),
        prompt_tokens: completion.prompt_tokens,
        completion_tokens: completion.completion_tokens,
        extraction_duration_ms,
        llm_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Conversion complete: {} rows × {} columns, {}ms total",
        stats.rows, stats.columns, stats.total_duration_ms
    );

    Ok(ConversionOutput::new(
        spreadsheet,
        text,
        completion.content,
        data,
        table,
        stats,
    ))
}

/// Load a file, convert it, and write the workbook to `output_path`.
///
/// The media type is guessed from the input file name.
pub async fn process_file(
    input_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &PipelineConfig,
) -> Result<ConversionStats, DocSheetError> {
    let document = input::load_document(input_path, None).await?;
    let output = process(document, config).await?;
    write_output(output_path, &output.spreadsheet).await?;
    Ok(output.stats)
}

/// Synchronous wrapper around [`process`].
///
/// Creates a temporary tokio runtime internally.
pub fn process_sync(
    document: RawDocument,
    config: &PipelineConfig,
) -> Result<ConversionOutput, DocSheetError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| DocSheetError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(process(document, config))
}

/// Run only the extraction stage. Does not need a model or API key.
///
/// Whitespace-only text is reported as [`DocSheetError::NoTextExtracted`].
pub async fn extract_text(
    document: RawDocument,
    config: &PipelineConfig,
) -> Result<String, DocSheetError> {
    stage_start(config, Stage::Extraction);
    let extractor = TextExtractor::from_config(config);

    let result = tokio::task::spawn_blocking(move || extractor.extract(&document))
        .await
        .map_err(|e| DocSheetError::Internal(format!("Extraction task panicked: {}", e)))
        .and_then(|r| r)
        .and_then(|text| {
            if text.trim().is_empty() {
                Err(DocSheetError::NoTextExtracted)
            } else {
                Ok(text)
            }
        });

    stage_finish(config, Stage::Extraction, result, |t| {
        format!("{} chars", t.chars().count())
    })
}

/// Validate a model reply and convert it straight to xlsx bytes.
///
/// Useful for replaying a saved response without calling the model again.
pub fn json_to_spreadsheet(text: &str, config: &PipelineConfig) -> Result<Vec<u8>, DocSheetError> {
    tabulate(text, config).map(|(_, _, bytes)| bytes)
}

/// Write `bytes` to `path` atomically (temp file + rename).
pub async fn write_output(path: impl AsRef<Path>, bytes: &[u8]) -> Result<(), DocSheetError> {
    let path = path.as_ref();
    let write_err = |e| DocSheetError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp_path = path.with_extension("xlsx.tmp");
    tokio::fs::write(&tmp_path, bytes).await.map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;

    info!("Wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Validation → tabulation → spreadsheet, with progress events.
fn tabulate(
    response: &str,
    config: &PipelineConfig,
) -> Result<(Value, Table, Vec<u8>), DocSheetError> {
    stage_start(config, Stage::Validation);
    let data = stage_finish(
        config,
        Stage::Validation,
        validate::validate_json_with(response, config.strip_code_fences),
        |_| "ok".to_string(),
    )?;

    stage_start(config, Stage::Tabulation);
    let table = stage_finish(
        config,
        Stage::Tabulation,
        to_table(&data, config.max_flatten_depth),
        |t| format!("{} rows × {} columns", t.row_count(), t.column_count()),
    )?;

    stage_start(config, Stage::Spreadsheet);
    let spreadsheet = stage_finish(
        config,
        Stage::Spreadsheet,
        sheet::write_spreadsheet(&table, &config.sheet_name),
        |b| format!("{} bytes", b.len()),
    )?;

    Ok((data, table, spreadsheet))
}

fn stage_start(config: &PipelineConfig, stage: Stage) {
    if let Some(ref cb) = config.progress_callback {
        cb.on_stage_start(stage);
    }
}

/// Report the outcome of `stage` and pass the result through.
fn stage_finish<T>(
    config: &PipelineConfig,
    stage: Stage,
    result: Result<T, DocSheetError>,
    summary: impl FnOnce(&T) -> String,
) -> Result<T, DocSheetError> {
    match &result {
        Ok(value) => {
            if let Some(ref cb) = config.progress_callback {
                cb.on_stage_complete(stage, &summary(value));
            }
        }
        Err(e) => {
            warn!("Stage '{}' failed: {}", stage, e);
            if let Some(ref cb) = config.progress_callback {
                cb.on_stage_error(stage, &e.to_string());
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_to_spreadsheet_rejects_scalar_root() {
        let config = PipelineConfig::default();
        assert!(matches!(
            json_to_spreadsheet("42", &config),
            Err(DocSheetError::UnsupportedRoot { .. })
        ));
    }

    #[test]
    fn json_to_spreadsheet_honours_fence_setting() {
        let fenced = "```json\n{\"a\": 1}\n```";
        let strict = PipelineConfig::default();
        assert!(matches!(
            json_to_spreadsheet(fenced, &strict),
            Err(DocSheetError::InvalidJson { .. })
        ));

        let lenient = PipelineConfig::builder()
            .strip_code_fences(true)
            .build()
            .unwrap();
        assert!(json_to_spreadsheet(fenced, &lenient).is_ok());
    }

    #[tokio::test]
    async fn empty_text_halts_before_model() {
        for body in ["", "  \n\t "] {
            let doc = RawDocument::from_mime(body.as_bytes().to_vec(), "text/plain");
            let err = extract_text(doc, &PipelineConfig::default()).await.unwrap_err();
            assert!(matches!(err, DocSheetError::NoTextExtracted));
        }
    }

    #[tokio::test]
    async fn write_output_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out/output.xlsx");
        write_output(&path, b"PK\x03\x04").await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"PK\x03\x04");
        assert!(!path.with_extension("xlsx.tmp").exists());
    }
}
