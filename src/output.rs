//! Result types returned by the conversion entry points.

use crate::pipeline::sheet::{DEFAULT_OUTPUT_NAME, XLSX_MIME};
use crate::pipeline::table::Table;
use serde::Serialize;
use serde_json::Value;

/// Everything one conversion produced.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionOutput {
    /// The `.xlsx` workbook.
    #[serde(skip)]
    pub spreadsheet: Vec<u8>,

    /// Suggested download name (`output.xlsx`).
    pub file_name: String,

    /// MIME type of `spreadsheet`.
    pub mime_type: &'static str,

    /// Text handed to the model.
    pub extracted_text: String,

    /// Raw model reply, before validation.
    pub response: String,

    /// Parsed model reply.
    pub data: Value,

    /// The flattened table written to the sheet.
    pub table: Table,

    pub stats: ConversionStats,
}

impl ConversionOutput {
    pub(crate) fn new(
        spreadsheet: Vec<u8>,
        extracted_text: String,
        response: String,
        data: Value,
        table: Table,
        stats: ConversionStats,
    ) -> Self {
        Self {
            spreadsheet,
            file_name: DEFAULT_OUTPUT_NAME.to_string(),
            mime_type: XLSX_MIME,
            extracted_text,
            response,
            data,
            table,
            stats,
        }
    }
}

/// Counters and per-stage timings for one conversion.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConversionStats {
    pub media_type: String,
    pub extracted_chars: usize,
    pub rows: usize,
    pub columns: usize,
    pub spreadsheet_bytes: usize,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub extraction_duration_ms: u64,
    pub llm_duration_ms: u64,
    pub total_duration_ms: u64,
}
