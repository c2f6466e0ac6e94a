//! Summarizer: generator abstraction + prioritized model fallback.
//!
//! A [`TextGenerator`] does one remote call for one model id. [`Summarizer`] walks
//! the configured model list, moving on only for model-scoped failures
//! (not found / bad request / empty text) and stopping on anything else.
//! Exhaustion never fails ingestion: `summarize` degrades to a body excerpt.

pub mod gemini;
pub mod prompt;

use async_trait::async_trait;
use metrics::counter;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::config::ai::{AiConfig, DEFAULT_MODELS};
use crate::ingest::extract::truncate_chars;
use crate::source::SourceTag;

// ------------------------------------------------------------
// Generator abstraction
// ------------------------------------------------------------

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("model not found: {0}")]
    ModelNotFound(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("response contained no text")]
    Empty,
    #[error("generation disabled (no credential configured)")]
    Disabled,
}

impl GenerationError {
    pub fn from_status(status: u16, model: &str, body: String) -> Self {
        match status {
            404 => GenerationError::ModelNotFound(model.to_string()),
            400 => GenerationError::BadRequest(body),
            _ => GenerationError::Status { status, body },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextStep {
    TryNextModel,
    Abort,
}

/// Model-scoped failures move on to the next id; everything else stops the loop.
pub fn classify(err: &GenerationError) -> NextStep {
    match err {
        GenerationError::ModelNotFound(_)
        | GenerationError::BadRequest(_)
        | GenerationError::Empty => NextStep::TryNextModel,
        GenerationError::Status { .. }
        | GenerationError::Transport(_)
        | GenerationError::Disabled => NextStep::Abort,
    }
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, model: &str, prompt: &str) -> Result<String, GenerationError>;
    /// Provider name for diagnostics.
    fn provider_name(&self) -> &'static str;
}

/// Always fails with `Disabled`; used when AI is off or no key is set.
pub struct DisabledGenerator;

#[async_trait]
impl TextGenerator for DisabledGenerator {
    async fn generate(&self, _model: &str, _prompt: &str) -> Result<String, GenerationError> {
        Err(GenerationError::Disabled)
    }
    fn provider_name(&self) -> &'static str {
        "disabled"
    }
}

/// Deterministic generator for local runs (`AI_TEST_MODE=mock`).
#[derive(Clone)]
pub struct FixedGenerator {
    pub text: String,
}

#[async_trait]
impl TextGenerator for FixedGenerator {
    async fn generate(&self, _model: &str, _prompt: &str) -> Result<String, GenerationError> {
        Ok(self.text.clone())
    }
    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// Scripted reply for one model id in [`ScriptedGenerator`].
#[derive(Debug, Clone)]
pub enum Scripted {
    Text(String),
    Status(u16),
    Transport,
}

/// Test helper: per-model scripted replies plus a log of attempted model ids.
/// Unscripted models answer 404.
pub struct ScriptedGenerator {
    replies: HashMap<String, Scripted>,
    pub calls: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self {
            replies: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn reply(mut self, model: &str, reply: Scripted) -> Self {
        self.replies.insert(model.to_string(), reply);
        self
    }

    pub fn attempted(&self) -> Vec<String> {
        self.calls.lock().expect("call log poisoned").clone()
    }
}

impl Default for ScriptedGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, model: &str, _prompt: &str) -> Result<String, GenerationError> {
        self.calls.lock().expect("call log poisoned").push(model.to_string());
        match self.replies.get(model) {
            Some(Scripted::Text(t)) => Ok(t.clone()),
            Some(Scripted::Status(code)) => {
                Err(GenerationError::from_status(*code, model, String::new()))
            }
            Some(Scripted::Transport) => {
                Err(GenerationError::Transport("connection reset".to_string()))
            }
            None => Err(GenerationError::ModelNotFound(model.to_string())),
        }
    }
    fn provider_name(&self) -> &'static str {
        "scripted"
    }
}

/// Factory: build a generator according to config and environment.
///
/// * `AI_TEST_MODE=mock` → [`FixedGenerator`].
/// * disabled config or empty key → [`DisabledGenerator`].
/// * otherwise → [`gemini::GeminiGenerator`].
pub fn build_generator(config: &AiConfig) -> Arc<dyn TextGenerator> {
    if std::env::var("AI_TEST_MODE")
        .map(|v| v == "mock")
        .unwrap_or(false)
    {
        return Arc::new(FixedGenerator {
            text: "Patch summary (mock)".to_string(),
        });
    }

    if !config.enabled || config.api_key.is_empty() {
        return Arc::new(DisabledGenerator);
    }

    match gemini::GeminiGenerator::new(config.api_key.clone(), config.base_url.as_deref()) {
        Ok(g) => Arc::new(g),
        Err(e) => {
            tracing::error!(error = %e, "failed to build gemini client; summaries disabled");
            Arc::new(DisabledGenerator)
        }
    }
}

// ------------------------------------------------------------
// Summarizer
// ------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generated {
    pub text: String,
    pub model: String,
}

#[derive(Debug, Error)]
pub enum SummarizeError {
    #[error("no model produced a summary (tried {tried:?}): {last}")]
    Exhausted { tried: Vec<String>, last: String },
}

impl SummarizeError {
    pub fn tried(&self) -> &[String] {
        match self {
            SummarizeError::Exhausted { tried, .. } => tried,
        }
    }
}

/// Summary stored with a patch note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub text: String,
    /// Model that produced the text; `None` for the excerpt fallback.
    pub model: Option<String>,
    pub degraded: bool,
}

pub struct Summarizer {
    generator: Arc<dyn TextGenerator>,
    models: Vec<String>,
    prompt_char_cap: usize,
    fallback_chars: usize,
    language: String,
}

impl Summarizer {
    /// Summarizer with the default model list and limits.
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self::from_config(&AiConfig::default(), generator)
    }

    pub fn from_config(config: &AiConfig, generator: Arc<dyn TextGenerator>) -> Self {
        let models = if config.models.is_empty() {
            DEFAULT_MODELS.iter().map(|m| m.to_string()).collect()
        } else {
            config.models.clone()
        };
        Self {
            generator,
            models,
            prompt_char_cap: config.prompt_char_cap,
            fallback_chars: config.fallback_chars,
            language: config.language.clone(),
        }
    }

    pub fn with_models<I, S>(mut self, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.models = models.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_fallback_chars(mut self, chars: usize) -> Self {
        self.fallback_chars = chars;
        self
    }

    pub fn provider_name(&self) -> &'static str {
        self.generator.provider_name()
    }

    /// Try each model in order; the first non-empty text wins.
    pub async fn generate(&self, prompt: &str) -> Result<Generated, SummarizeError> {
        let mut tried = Vec::with_capacity(self.models.len());
        let mut last = String::from("no models configured");

        for model in &self.models {
            tried.push(model.clone());
            tracing::debug!(%model, provider = self.generator.provider_name(), "summary attempt");
            match self.generator.generate(model, prompt).await {
                Ok(text) if !text.trim().is_empty() => {
                    tracing::info!(%model, "summary generated");
                    return Ok(Generated {
                        text: text.trim().to_string(),
                        model: model.clone(),
                    });
                }
                Ok(_) => {
                    tracing::info!(%model, "model returned empty text; trying next");
                    last = GenerationError::Empty.to_string();
                }
                Err(e) => {
                    last = e.to_string();
                    match classify(&e) {
                        NextStep::TryNextModel => {
                            tracing::info!(%model, error = %e, "model unavailable; trying next");
                        }
                        NextStep::Abort => {
                            tracing::warn!(%model, error = %e, "summary generation aborted");
                            break;
                        }
                    }
                }
            }
        }

        Err(SummarizeError::Exhausted { tried, last })
    }

    /// Source-specific summary without a fallback. Used by the summarize endpoint.
    pub async fn try_summarize(
        &self,
        tag: SourceTag,
        body: &str,
    ) -> Result<Generated, SummarizeError> {
        let prompt = prompt::build_prompt(tag, body, self.prompt_char_cap, &self.language);
        self.generate(&prompt).await
    }

    /// Source-specific summary; degrades to the first `fallback_chars` of `body`.
    pub async fn summarize(&self, tag: SourceTag, body: &str) -> Summary {
        match self.try_summarize(tag, body).await {
            Ok(g) => Summary {
                text: g.text,
                model: Some(g.model),
                degraded: false,
            },
            Err(e) => {
                counter!("patchnote_summary_fallbacks_total").increment(1);
                tracing::warn!(source = %tag, error = %e, "summarization failed; storing text excerpt");
                Summary {
                    text: truncate_chars(body, self.fallback_chars),
                    model: None,
                    degraded: true,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifier_splits_model_scoped_from_fatal() {
        assert_eq!(
            classify(&GenerationError::from_status(404, "m", String::new())),
            NextStep::TryNextModel
        );
        assert_eq!(
            classify(&GenerationError::from_status(400, "m", String::new())),
            NextStep::TryNextModel
        );
        assert_eq!(classify(&GenerationError::Empty), NextStep::TryNextModel);
        assert_eq!(
            classify(&GenerationError::from_status(429, "m", String::new())),
            NextStep::Abort
        );
        assert_eq!(classify(&GenerationError::Disabled), NextStep::Abort);
    }

    #[tokio::test]
    async fn empty_text_moves_to_next_model() {
        let gen = Arc::new(
            ScriptedGenerator::new()
                .reply("a", Scripted::Text("   ".into()))
                .reply("b", Scripted::Text(" ok \n".into())),
        );
        let s = Summarizer::new(gen.clone()).with_models(["a", "b"]);
        let out = s.generate("p").await.unwrap();
        assert_eq!(out, Generated { text: "ok".into(), model: "b".into() });
        assert_eq!(gen.attempted(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn disabled_generator_degrades_immediately() {
        let s = Summarizer::new(Arc::new(DisabledGenerator)).with_fallback_chars(4);
        let out = s.summarize(SourceTag::Lol, "abcdefgh").await;
        assert_eq!(out.text, "abcd");
        assert!(out.degraded);
        assert_eq!(out.model, None);
    }
}
