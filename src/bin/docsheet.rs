//! CLI binary for docsheet.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `PipelineConfig` and reports the outcome.

use anyhow::{Context, Result};
use clap::Parser;
use docsheet::pipeline::input::load_document;
use docsheet::pipeline::table::to_table;
use docsheet::pipeline::validate::validate_json_with;
use docsheet::{
    extract_text, process, write_output, write_spreadsheet, PipelineConfig,
    PipelineProgressCallback, ProgressCallback, Stage,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// One spinner line per run; a log line per finished stage.
struct CliProgressCallback {
    bar: ProgressBar,
    stage_started: Mutex<Option<Instant>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:20.green/238}] {pos}/{len}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        let bar = ProgressBar::new(Stage::ALL.len() as u64);
        bar.set_style(style);
        bar.set_prefix("Converting");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            stage_started: Mutex::new(None),
        })
    }

    fn elapsed(&self) -> String {
        let secs = self
            .stage_started
            .lock()
            .ok()
            .and_then(|mut t| t.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0);
        format!("{secs:.1}s")
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl PipelineProgressCallback for CliProgressCallback {
    fn on_stage_start(&self, stage: Stage) {
        if let Ok(mut t) = self.stage_started.lock() {
            *t = Some(Instant::now());
        }
        self.bar.set_message(format!("{stage}…"));
    }

    fn on_stage_complete(&self, stage: Stage, summary: &str) {
        self.bar.println(format!(
            "  {} {:<18} {:<24} {}",
            green("✓"),
            stage.label(),
            dim(summary),
            dim(&self.elapsed()),
        ));
        self.bar.inc(1);
    }

    fn on_stage_error(&self, stage: Stage, error: &str) {
        let msg = if error.chars().count() > 80 {
            let cut: String = error.chars().take(79).collect();
            format!("{cut}\u{2026}")
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} {:<18} {}  {}",
            red("✗"),
            stage.label(),
            red(&msg),
            dim(&self.elapsed()),
        ));
        self.bar.abandon();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Invoice PDF to output.xlsx
  docsheet invoice.pdf

  # Scanned receipt, German OCR, custom output path
  docsheet --ocr-lang deu receipt.png -o receipts/march.xlsx

  # Only show the text that would be sent to the model (no API key needed)
  docsheet --extract-only contract.pdf

  # Rebuild a spreadsheet from a saved model reply (no API key needed)
  docsheet --from-json reply.json -o output.xlsx

  # Use a specific provider and model, print the parsed JSON too
  docsheet --provider anthropic --model claude-3-5-haiku-latest --json bill.txt

SUPPORTED INPUTS:
  pdf              page text via pdfium (no OCR of scanned pages)
  png, jpg, jpeg   OCR via the tesseract command
  txt, json        decoded as UTF-8
  Use --media-type to override the extension-based guess.

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key (default provider)
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  PDFIUM_LIB_PATH         Path to libpdfium when it is not on the system path
  RUST_LOG                Log filter, overrides -v / -q

  Variables in a .env file in the working directory are loaded first.
"#;

/// Extract entities from a document into an xlsx spreadsheet.
#[derive(Parser, Debug)]
#[command(
    name = "docsheet",
    version,
    about = "Extract entities from a document into an xlsx spreadsheet",
    long_about = "Extract the text of a PDF, image, or plain-text document, ask a language \
model to classify it and pull out its entities as JSON, and write the result as a single-sheet \
xlsx workbook. Supports OpenAI, Anthropic, Google Gemini, Azure OpenAI, and any \
OpenAI-compatible endpoint (Ollama, vLLM, LiteLLM, etc.).",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Input document (pdf, png, jpg, jpeg, txt, json).
    input: PathBuf,

    /// Write the spreadsheet to this file.
    #[arg(short, long, env = "DOCSHEET_OUTPUT", default_value = "output.xlsx")]
    output: PathBuf,

    /// Declared MIME type of the input (e.g. application/pdf). Guessed from
    /// the extension when absent.
    #[arg(long, env = "DOCSHEET_MEDIA_TYPE")]
    media_type: Option<String>,

    /// LLM model ID. Default: gpt-4o-mini.
    #[arg(long, env = "DOCSHEET_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(
        long,
        env = "DOCSHEET_PROVIDER",
        long_help = "LLM provider. Auto-detected from API key env vars if not set.\n\
          Supported: openai, anthropic, gemini, azure, ollama, or any OpenAI-compatible URL."
    )]
    provider: Option<String>,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "DOCSHEET_TEMPERATURE", default_value_t = 0.5)]
    temperature: f32,

    /// Max LLM output tokens.
    #[arg(long, env = "DOCSHEET_MAX_TOKENS", default_value_t = 2000)]
    max_tokens: usize,

    /// LLM call timeout in seconds.
    #[arg(long, env = "DOCSHEET_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// Path to a text file containing a custom system prompt.
    #[arg(long, env = "DOCSHEET_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Tesseract language code(s), e.g. eng or eng+deu.
    #[arg(long, env = "DOCSHEET_OCR_LANG", default_value = "eng")]
    ocr_lang: String,

    /// Tesseract executable.
    #[arg(long, env = "DOCSHEET_TESSERACT", default_value = "tesseract")]
    tesseract: PathBuf,

    /// Path to the pdfium shared library.
    #[arg(long, env = "DOCSHEET_PDFIUM_LIB")]
    pdfium_lib: Option<PathBuf>,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "DOCSHEET_PASSWORD")]
    password: Option<String>,

    /// Accept a model reply wrapped in a ```json code fence.
    #[arg(long, env = "DOCSHEET_STRIP_FENCES")]
    strip_fences: bool,

    /// Maximum JSON nesting depth to flatten.
    #[arg(long, env = "DOCSHEET_MAX_DEPTH", default_value_t = docsheet::config::DEFAULT_MAX_FLATTEN_DEPTH)]
    max_depth: usize,

    /// Worksheet name.
    #[arg(long, env = "DOCSHEET_SHEET_NAME", default_value = docsheet::config::DEFAULT_SHEET_NAME)]
    sheet_name: String,

    /// Print the extracted text and stop. No model call.
    #[arg(long, env = "DOCSHEET_EXTRACT_ONLY", conflicts_with = "from_json")]
    extract_only: bool,

    /// Treat the input as a saved model reply: validate, tabulate, write.
    #[arg(long, env = "DOCSHEET_FROM_JSON")]
    from_json: bool,

    /// Also print the parsed model JSON to stdout.
    #[arg(long, env = "DOCSHEET_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "DOCSHEET_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOCSHEET_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DOCSHEET_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Credentials may live in .env; a missing file is fine.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let show_progress = !cli.quiet && !cli.no_progress && !cli.extract_only && !cli.from_json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let progress_cb = show_progress.then(CliProgressCallback::new);
    let config = build_config(
        &cli,
        progress_cb
            .clone()
            .map(|cb| cb as Arc<dyn PipelineProgressCallback>),
    )
    .await?;

    let result = run(&cli, &config).await;
    if let Some(cb) = progress_cb {
        cb.finish();
    }
    result
}

async fn run(cli: &Cli, config: &PipelineConfig) -> Result<()> {
    // ── Replay mode ──────────────────────────────────────────────────────
    if cli.from_json {
        let reply = tokio::fs::read_to_string(&cli.input)
            .await
            .with_context(|| format!("Failed to read {}", cli.input.display()))?;

        let data = validate_json_with(&reply, config.strip_code_fences)
            .context("Model reply is not usable")?;
        let table = to_table(&data, config.max_flatten_depth).context("Model reply is not usable")?;
        let bytes = write_spreadsheet(&table, &config.sheet_name)
            .context("Failed to build spreadsheet")?;
        write_output(&cli.output, &bytes)
            .await
            .context("Failed to write spreadsheet")?;

        if cli.json {
            print_json(&data)?;
        }
        if !cli.quiet {
            eprintln!(
                "{}  {} rows × {} columns  →  {}",
                green("✔"),
                table.row_count(),
                table.column_count(),
                bold(&cli.output.display().to_string()),
            );
        }
        return Ok(());
    }

    let document = load_document(&cli.input, cli.media_type.as_deref())
        .await
        .context("Failed to load input")?;

    // ── Extract-only mode ────────────────────────────────────────────────
    if cli.extract_only {
        let text = extract_text(document, config)
            .await
            .context("Text extraction failed")?;
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(text.as_bytes())
            .context("Failed to write to stdout")?;
        if !text.ends_with('\n') {
            handle.write_all(b"\n").ok();
        }
        return Ok(());
    }

    // ── Full conversion ──────────────────────────────────────────────────
    let output = process(document, config)
        .await
        .context("Conversion failed")?;
    write_output(&cli.output, &output.spreadsheet)
        .await
        .context("Failed to write spreadsheet")?;

    if cli.json {
        print_json(&output.data)?;
    }

    if !cli.quiet {
        let stats = &output.stats;
        eprintln!(
            "{}  {} rows × {} columns  {}ms  →  {}",
            green("✔"),
            stats.rows,
            stats.columns,
            stats.total_duration_ms,
            bold(&cli.output.display().to_string()),
        );
        eprintln!(
            "   {} tokens in  /  {} tokens out",
            dim(&stats.prompt_tokens.to_string()),
            dim(&stats.completion_tokens.to_string()),
        );
    }

    Ok(())
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialise JSON")?;
    println!("{json}");
    Ok(())
}

/// Map CLI args to `PipelineConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<PipelineConfig> {
    let mut builder = PipelineConfig::builder()
        .temperature(cli.temperature)
        .max_tokens(cli.max_tokens)
        .api_timeout_secs(cli.api_timeout)
        .ocr_language(cli.ocr_lang.clone())
        .tesseract_cmd(cli.tesseract.clone())
        .strip_code_fences(cli.strip_fences)
        .max_flatten_depth(cli.max_depth)
        .sheet_name(cli.sheet_name.clone());

    if let Some(ref path) = cli.system_prompt {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read system prompt from {:?}", path))?;
        builder = builder.system_prompt(prompt);
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(ref path) = cli.pdfium_lib {
        builder = builder.pdfium_lib_path(path.clone());
    }
    if let Some(ref password) = cli.password {
        builder = builder.password(password.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
