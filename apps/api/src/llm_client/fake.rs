//! Scripted `ModelClient` for tests.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::llm_client::{LlmError, ModelChoice, ModelClient};

/// Returns `reply` for every call (or an API error when `reply` is `None`)
/// and records each prompt it was given.
pub struct FakeModel {
    provider: ModelChoice,
    reply: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl FakeModel {
    pub fn replying(provider: ModelChoice, reply: &str) -> Self {
        Self {
            provider,
            reply: Some(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(provider: ModelChoice) -> Self {
        Self {
            provider,
            reply: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelClient for FakeModel {
    fn provider(&self) -> ModelChoice {
        self.provider
    }

    async fn call(&self, prompt: &str) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply.clone().ok_or(LlmError::Api {
            status: 503,
            message: "model unavailable".to_string(),
        })
    }
}
