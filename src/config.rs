//! Configuration types for document-to-spreadsheet conversion.
//!
//! Everything the pipeline needs (model settings, OCR settings, limits, the
//! output sheet name) lives in one [`PipelineConfig`], built once at startup
//! via [`PipelineConfigBuilder`] and passed by reference into every stage.
//! Nothing is read from global state after that point, apart from the
//! provider credentials that `edgequake-llm` resolves when the service is
//! first created.

use crate::error::DocSheetError;
use crate::pipeline::llm::{CompletionService, ProviderService};
use crate::pipeline::ocr::OcrEngine;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Model used when neither the config nor the environment names one.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Worksheet name used for the extracted entities.
pub const DEFAULT_SHEET_NAME: &str = "Main Data";

/// Default limit on container nesting when flattening.
pub const DEFAULT_MAX_FLATTEN_DEPTH: usize = 64;

/// Configuration for a document-to-spreadsheet conversion.
///
/// # Example
/// ```rust
/// use docsheet::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .model("gpt-4o-mini")
///     .temperature(0.5)
///     .api_timeout_secs(30)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct PipelineConfig {
    /// LLM model identifier. If None, [`DEFAULT_MODEL`] or `EDGEQUAKE_MODEL`.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    /// If None along with `service`, the provider is auto-detected.
    pub provider_name: Option<String>,

    /// Pre-constructed completion service. Takes precedence over `provider_name`.
    pub service: Option<Arc<dyn CompletionService>>,

    /// Sampling temperature for the extraction call. Default: 0.5.
    pub temperature: f32,

    /// Response-length cap for the extraction call. Default: 2000.
    pub max_tokens: usize,

    /// Custom system prompt. If None, uses [`crate::prompts::DEFAULT_SYSTEM_PROMPT`].
    pub system_prompt: Option<String>,

    /// Timeout for the model call in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Pre-constructed OCR engine. If None, the tesseract CLI is used.
    pub ocr: Option<Arc<dyn OcrEngine>>,

    /// Tesseract language code. Default: "eng".
    pub ocr_language: String,

    /// Tesseract executable. Default: "tesseract" on `PATH`.
    pub tesseract_cmd: PathBuf,

    /// Explicit pdfium library file. If None, `PDFIUM_LIB_PATH` then the
    /// system library are tried.
    pub pdfium_lib_path: Option<PathBuf>,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Strip one outer ```` ```json ```` fence before parsing. Default: false.
    pub strip_code_fences: bool,

    /// Maximum container nesting accepted by the flattener. Default: 64.
    pub max_flatten_depth: usize,

    /// Worksheet name in the output workbook. Default: "Main Data".
    pub sheet_name: String,

    /// Optional per-stage progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            service: None,
            temperature: 0.5,
            max_tokens: 2000,
            system_prompt: None,
            api_timeout_secs: 60,
            ocr: None,
            ocr_language: "eng".to_string(),
            tesseract_cmd: PathBuf::from("tesseract"),
            pdfium_lib_path: None,
            password: None,
            strip_code_fences: false,
            max_flatten_depth: DEFAULT_MAX_FLATTEN_DEPTH,
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("service", &self.service.as_ref().map(|_| "<dyn CompletionService>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("ocr", &self.ocr.as_ref().map(|_| "<dyn OcrEngine>"))
            .field("ocr_language", &self.ocr_language)
            .field("tesseract_cmd", &self.tesseract_cmd)
            .field("pdfium_lib_path", &self.pdfium_lib_path)
            .field("strip_code_fences", &self.strip_code_fences)
            .field("max_flatten_depth", &self.max_flatten_depth)
            .field("sheet_name", &self.sheet_name)
            .finish()
    }
}

impl PipelineConfig {
    /// Create a new builder for `PipelineConfig`.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    /// Use an already-built `edgequake-llm` provider.
    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.service = Some(Arc::new(ProviderService::new(provider)));
        self
    }

    /// Use any [`CompletionService`] implementation.
    pub fn service(mut self, service: Arc<dyn CompletionService>) -> Self {
        self.config.service = Some(service);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn ocr(mut self, engine: Arc<dyn OcrEngine>) -> Self {
        self.config.ocr = Some(engine);
        self
    }

    pub fn ocr_language(mut self, lang: impl Into<String>) -> Self {
        self.config.ocr_language = lang.into();
        self
    }

    pub fn tesseract_cmd(mut self, cmd: impl Into<PathBuf>) -> Self {
        self.config.tesseract_cmd = cmd.into();
        self
    }

    pub fn pdfium_lib_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(path.into());
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn strip_code_fences(mut self, v: bool) -> Self {
        self.config.strip_code_fences = v;
        self
    }

    pub fn max_flatten_depth(mut self, depth: usize) -> Self {
        self.config.max_flatten_depth = depth;
        self
    }

    pub fn sheet_name(mut self, name: impl Into<String>) -> Self {
        self.config.sheet_name = name.into();
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PipelineConfig, DocSheetError> {
        let c = &self.config;
        if c.max_tokens == 0 {
            return Err(DocSheetError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if c.api_timeout_secs == 0 {
            return Err(DocSheetError::InvalidConfig(
                "api_timeout_secs must be ≥ 1".into(),
            ));
        }
        if c.max_flatten_depth == 0 {
            return Err(DocSheetError::InvalidConfig(
                "max_flatten_depth must be ≥ 1".into(),
            ));
        }
        validate_sheet_name(&c.sheet_name)?;
        Ok(self.config)
    }
}

/// Excel's worksheet naming rules: 1–31 chars, none of `[]:*?/\`, and no
/// leading or trailing apostrophe.
fn validate_sheet_name(name: &str) -> Result<(), DocSheetError> {
    let len = name.chars().count();
    if len == 0 || len > 31 {
        return Err(DocSheetError::InvalidConfig(format!(
            "sheet name must be 1–31 characters, got {len}"
        )));
    }
    if name.contains(['[', ']', ':', '*', '?', '/', '\\']) {
        return Err(DocSheetError::InvalidConfig(format!(
            "sheet name '{name}' contains a character Excel forbids"
        )));
    }
    if name.starts_with('\'') || name.ends_with('\'') {
        return Err(DocSheetError::InvalidConfig(format!(
            "sheet name '{name}' cannot start or end with an apostrophe"
        )));
    }
    Ok(())
}
