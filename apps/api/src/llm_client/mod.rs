//! LLM Client: the single point of entry for all model calls.
//!
//! ARCHITECTURAL RULE: No other module may call a provider API directly.
//! Evaluation, cover letters and résumé points all go through `ModelClient`.
//!
//! Two providers are wired, Gemini and OpenAI. Both return the raw text the
//! model produced; shape guarantees are the normalizer's job.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

#[cfg(test)]
pub mod fake;
pub mod gemini;
pub mod openai;
pub mod prompts;

pub use gemini::GeminiClient;
pub use openai::OpenAiClient;

const REQUEST_TIMEOUT_SECS: u64 = 120;
const MAX_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// Which provider handles a call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelChoice {
    #[default]
    Gemini,
    Gpt,
}

impl fmt::Display for ModelChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelChoice::Gemini => write!(f, "Gemini"),
            ModelChoice::Gpt => write!(f, "GPT"),
        }
    }
}

/// A hosted model that turns a prompt into raw text.
///
/// Carried in `AppState` as `Arc<dyn ModelClient>` so tests can swap in fakes.
#[async_trait]
pub trait ModelClient: Send + Sync {
    fn provider(&self) -> ModelChoice;

    /// Sends `prompt` unmodified and returns the model's text output.
    async fn call(&self, prompt: &str) -> Result<String, LlmError>;
}

/// Both providers, looked up by `ModelChoice`.
#[derive(Clone)]
pub struct ModelSet {
    pub gemini: Arc<dyn ModelClient>,
    pub gpt: Arc<dyn ModelClient>,
}

impl ModelSet {
    pub fn get(&self, choice: ModelChoice) -> &dyn ModelClient {
        match choice {
            ModelChoice::Gemini => self.gemini.as_ref(),
            ModelChoice::Gpt => self.gpt.as_ref(),
        }
    }
}

pub(crate) fn build_http_client() -> Result<Client, LlmError> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()?)
}

/// Sends a request with retry on 429 and 5xx, exponential backoff (1s, 2s).
///
/// `make_request` is called once per attempt. `error_message` pulls the
/// provider-specific message out of a non-success body.
pub(crate) async fn send_with_retry<F>(
    provider: ModelChoice,
    make_request: impl Fn() -> RequestBuilder,
    error_message: F,
) -> Result<Response, LlmError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut last_error: Option<LlmError> = None;

    for attempt in 0..MAX_RETRIES {
        if attempt > 0 {
            let delay = Duration::from_millis(1000 * (1 << (attempt - 1)));
            warn!(
                "{provider} call attempt {} failed, retrying after {}ms...",
                attempt,
                delay.as_millis()
            );
            tokio::time::sleep(delay).await;
        }

        let response = match make_request().send().await {
            Ok(r) => r,
            Err(e) => {
                last_error = Some(LlmError::Http(e));
                continue;
            }
        };

        let status = response.status();

        if status.as_u16() == 429 || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            warn!("{provider} API returned {}: {}", status, body);
            last_error = Some(LlmError::Api {
                status: status.as_u16(),
                message: body,
            });
            continue;
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = error_message(&body).unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        return Ok(response);
    }

    Err(last_error.unwrap_or(LlmError::RateLimited {
        retries: MAX_RETRIES,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_choice_serde_lowercase() {
        let choice: ModelChoice = serde_json::from_str(r#""gpt""#).unwrap();
        assert_eq!(choice, ModelChoice::Gpt);
        assert_eq!(serde_json::to_string(&ModelChoice::Gemini).unwrap(), r#""gemini""#);
    }

    #[test]
    fn test_model_choice_default_is_gemini() {
        assert_eq!(ModelChoice::default(), ModelChoice::Gemini);
    }

    #[test]
    fn test_model_choice_display() {
        assert_eq!(ModelChoice::Gemini.to_string(), "Gemini");
        assert_eq!(ModelChoice::Gpt.to_string(), "GPT");
    }
}
