//! Progress-callback trait for per-stage pipeline events.
//!
//! Inject an [`Arc<dyn PipelineProgressCallback>`] via
//! [`crate::config::PipelineConfigBuilder::progress_callback`] to be told
//! when each stage starts, finishes, or fails. The CLI drives a spinner
//! from these events; a web handler could forward them to the client.
//!
//! # Example
//!
//! ```rust
//! use docsheet::{PipelineConfig, PipelineProgressCallback, Stage};
//! use std::sync::Arc;
//!
//! struct Printer;
//!
//! impl PipelineProgressCallback for Printer {
//!     fn on_stage_error(&self, stage: Stage, error: &str) {
//!         eprintln!("{stage} failed: {error}");
//!     }
//! }
//!
//! let config = PipelineConfig::builder()
//!     .progress_callback(Arc::new(Printer) as Arc<dyn PipelineProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// The stages of a single document conversion, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    /// PDF text, OCR, or text decoding.
    Extraction,
    /// The text-generation model call.
    Service,
    /// Parsing the model response as JSON.
    Validation,
    /// Flattening and building the table.
    Tabulation,
    /// Serialising the xlsx workbook.
    Spreadsheet,
}

impl Stage {
    /// All stages in pipeline order.
    pub const ALL: [Stage; 5] = [
        Stage::Extraction,
        Stage::Service,
        Stage::Validation,
        Stage::Tabulation,
        Stage::Spreadsheet,
    ];

    /// Short human label used in logs and the CLI.
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Extraction => "extract text",
            Stage::Service => "generate JSON",
            Stage::Validation => "validate JSON",
            Stage::Tabulation => "build table",
            Stage::Spreadsheet => "write spreadsheet",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Called by the pipeline as it moves through each [`Stage`].
///
/// All methods default to no-ops so implementations only override what
/// they care about.
pub trait PipelineProgressCallback: Send + Sync {
    /// Called just before a stage runs.
    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called when a stage succeeds.
    ///
    /// `summary` is a short description of what the stage produced
    /// (e.g. `"1 842 chars"`, `"3 rows × 7 columns"`).
    fn on_stage_complete(&self, stage: Stage, summary: &str) {
        let _ = (stage, summary);
    }

    /// Called when a stage fails. No further stages run afterwards.
    fn on_stage_error(&self, stage: Stage, error: &str) {
        let _ = (stage, error);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl PipelineProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::PipelineConfig`].
pub type ProgressCallback = Arc<dyn PipelineProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl PipelineProgressCallback for Recorder {
        fn on_stage_start(&self, stage: Stage) {
            self.events.lock().unwrap().push(format!("start {stage}"));
        }

        fn on_stage_complete(&self, stage: Stage, summary: &str) {
            self.events
                .lock()
                .unwrap()
                .push(format!("done {stage}: {summary}"));
        }

        fn on_stage_error(&self, stage: Stage, error: &str) {
            self.events
                .lock()
                .unwrap()
                .push(format!("fail {stage}: {error}"));
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        for stage in Stage::ALL {
            cb.on_stage_start(stage);
            cb.on_stage_complete(stage, "ok");
            cb.on_stage_error(stage, "bad");
        }
    }

    #[test]
    fn recorder_sees_events_in_order() {
        let rec = Recorder::default();
        rec.on_stage_start(Stage::Extraction);
        rec.on_stage_complete(Stage::Extraction, "12 chars");
        rec.on_stage_start(Stage::Service);
        rec.on_stage_error(Stage::Service, "timeout");

        let events = rec.events.lock().unwrap();
        assert_eq!(
            *events,
            vec![
                "start extract text",
                "done extract text: 12 chars",
                "start generate JSON",
                "fail generate JSON: timeout",
            ]
        );
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_stage_start(Stage::Spreadsheet);
    }
}
