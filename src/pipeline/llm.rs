//! Entity extraction call: wrap the text in the instruction template and
//! ask the text-generation service for JSON.
//!
//! Exactly one attempt is made. There is no retry and no backoff; a failed
//! or timed-out call ends the conversion of that document. The reply is
//! returned as-is, without any JSON checking (that is the validator's job).

use crate::config::{PipelineConfig, DEFAULT_MODEL};
use crate::error::DocSheetError;
use crate::prompts::{extraction_prompt, DEFAULT_SYSTEM_PROMPT};
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// One chat request: a system message and a user message.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system: String,
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: usize,
}

/// The first completion choice plus token accounting.
#[derive(Debug, Clone, Default)]
pub struct Completion {
    pub content: String,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

impl Completion {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }
}

/// A remote (or fake) text-generation backend.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, DocSheetError>;
}

/// [`CompletionService`] backed by an `edgequake-llm` provider.
pub struct ProviderService {
    provider: Arc<dyn LLMProvider>,
}

impl ProviderService {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl CompletionService for ProviderService {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, DocSheetError> {
        let messages = vec![
            ChatMessage::system(request.system.as_str()),
            ChatMessage::user(request.prompt.as_str()),
        ];
        let options = CompletionOptions {
            temperature: Some(request.temperature),
            max_tokens: Some(request.max_tokens),
            ..Default::default()
        };

        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| DocSheetError::LlmApiError {
                message: format!("{}", e),
            })?;

        Ok(Completion {
            content: response.content,
            prompt_tokens: response.prompt_tokens as u64,
            completion_tokens: response.completion_tokens as u64,
        })
    }
}

/// Build the request for one document from the config.
pub fn build_request(text: &str, config: &PipelineConfig) -> CompletionRequest {
    CompletionRequest {
        system: config
            .system_prompt
            .clone()
            .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
        prompt: extraction_prompt(text),
        temperature: config.temperature,
        max_tokens: config.max_tokens,
    }
}

/// Send `text` for classification and entity extraction.
///
/// The call is bounded by `config.api_timeout_secs`.
pub async fn request_extraction(
    service: &dyn CompletionService,
    text: &str,
    config: &PipelineConfig,
) -> Result<Completion, DocSheetError> {
    let request = build_request(text, config);
    let start = Instant::now();
    let secs = config.api_timeout_secs;

    let completion = tokio::time::timeout(Duration::from_secs(secs), service.complete(&request))
        .await
        .map_err(|_| {
            warn!("Model call timed out after {}s", secs);
            DocSheetError::ApiTimeout { secs }
        })??;

    debug!(
        "Model call: {} input tokens, {} output tokens, {:?}",
        completion.prompt_tokens,
        completion.completion_tokens,
        start.elapsed()
    );
    debug!("Model response: {}", completion.content);

    Ok(completion)
}

/// Resolve the completion service, from most-specific to least-specific:
///
/// 1. `config.service`, used as-is.
/// 2. `config.provider_name` with `config.model` (or [`DEFAULT_MODEL`]).
/// 3. `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`, when both are set.
/// 4. OpenAI when `OPENAI_API_KEY` is present.
/// 5. `ProviderFactory::from_env` auto-detection.
pub fn resolve_service(config: &PipelineConfig) -> Result<Arc<dyn CompletionService>, DocSheetError> {
    if let Some(ref service) = config.service {
        return Ok(Arc::clone(service));
    }

    let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);

    if let Some(ref name) = config.provider_name {
        return create_provider_service(name, model);
    }

    if let (Ok(prov), Ok(env_model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !env_model.is_empty() {
            let model = config.model.as_deref().unwrap_or(&env_model);
            return create_provider_service(&prov, model);
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            return create_provider_service("openai", model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| DocSheetError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or pass --provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(Arc::new(ProviderService::new(llm_provider)))
}

fn create_provider_service(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn CompletionService>, DocSheetError> {
    info!("Using provider '{}' with model '{}'", provider_name, model);
    let provider = ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        DocSheetError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })?;
    Ok(Arc::new(ProviderService::new(provider)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Scripted {
        reply: Result<&'static str, &'static str>,
        delay: Duration,
        seen: Mutex<Vec<CompletionRequest>>,
    }

    #[async_trait]
    impl CompletionService for Scripted {
        async fn complete(&self, request: &CompletionRequest) -> Result<Completion, DocSheetError> {
            self.seen.lock().unwrap().push(request.clone());
            tokio::time::sleep(self.delay).await;
            match self.reply {
                Ok(text) => Ok(Completion::text(text)),
                Err(msg) => Err(DocSheetError::LlmApiError {
                    message: msg.to_string(),
                }),
            }
        }
    }

    fn scripted(reply: Result<&'static str, &'static str>, delay: Duration) -> Scripted {
        Scripted {
            reply,
            delay,
            seen: Mutex::new(Vec::new()),
        }
    }

    #[test]
    fn request_uses_config_sampling() {
        let config = PipelineConfig::default();
        let req = build_request("hello", &config);
        assert_eq!(req.temperature, 0.5);
        assert_eq!(req.max_tokens, 2000);
        assert_eq!(req.system, DEFAULT_SYSTEM_PROMPT);
        assert!(req.prompt.contains("hello"));
    }

    #[test]
    fn system_prompt_override() {
        let config = PipelineConfig::builder()
            .system_prompt("Be terse.")
            .build()
            .unwrap();
        assert_eq!(build_request("x", &config).system, "Be terse.");
    }

    #[tokio::test]
    async fn reply_is_returned_unmodified() {
        let svc = scripted(Ok("```json\n{\"a\": 1}\n```"), Duration::ZERO);
        let config = PipelineConfig::default();
        let out = request_extraction(&svc, "doc", &config).await.unwrap();
        assert_eq!(out.content, "```json\n{\"a\": 1}\n```");
        assert_eq!(svc.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn service_error_is_not_retried() {
        let svc = scripted(Err("503 overloaded"), Duration::ZERO);
        let config = PipelineConfig::default();
        let err = request_extraction(&svc, "doc", &config).await.unwrap_err();
        assert!(matches!(err, DocSheetError::LlmApiError { .. }));
        assert_eq!(svc.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_service_times_out() {
        let svc = scripted(Ok("{}"), Duration::from_secs(120));
        let config = PipelineConfig::builder()
            .api_timeout_secs(5)
            .build()
            .unwrap();
        let err = request_extraction(&svc, "doc", &config).await.unwrap_err();
        assert!(matches!(err, DocSheetError::ApiTimeout { secs: 5 }));
    }

    #[test]
    fn injected_service_wins() {
        let svc: Arc<dyn CompletionService> = Arc::new(scripted(Ok("{}"), Duration::ZERO));
        let config = PipelineConfig::builder()
            .service(Arc::clone(&svc))
            .build()
            .unwrap();
        let resolved = resolve_service(&config).unwrap();
        assert!(Arc::ptr_eq(&resolved, &svc));
    }
}
