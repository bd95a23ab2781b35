//! OpenAI-compatible chat completions client.

use async_trait::async_trait;
use domain::services::{DisabledTextGenerator, GenerationError, GenerationRequest, TextGenerator};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::TextGenerationConfig;

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Text generator backed by a `/chat/completions` endpoint.
pub struct OpenAiTextGenerator {
    client: Client,
    config: TextGenerationConfig,
}

impl OpenAiTextGenerator {
    pub fn new(config: TextGenerationConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }
}

fn messages(request: &GenerationRequest) -> Vec<ChatMessage<'_>> {
    let mut messages = Vec::with_capacity(2);
    if let Some(system) = &request.system {
        messages.push(ChatMessage {
            role: "system",
            content: system,
        });
    }
    messages.push(ChatMessage {
        role: "user",
        content: &request.prompt,
    });
    messages
}

#[async_trait]
impl TextGenerator for OpenAiTextGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<String, GenerationError> {
        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        let body = CompletionRequest {
            model: &self.config.model,
            messages: messages(&request),
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::Upstream(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GenerationError::Upstream(format!("HTTP {}", status)));
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Upstream(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(GenerationError::Empty)
    }
}

/// Builds the configured generator, or one that always reports itself disabled.
pub fn build_text_generator(config: &TextGenerationConfig) -> Arc<dyn TextGenerator> {
    if !config.enabled || config.api_key.is_empty() {
        info!("Text generation disabled, static fallbacks will be used");
        return Arc::new(DisabledTextGenerator);
    }

    match OpenAiTextGenerator::new(config.clone()) {
        Ok(generator) => {
            info!(model = %config.model, "Text generation enabled");
            Arc::new(generator)
        }
        Err(e) => {
            warn!(error = %e, "Failed to build text generation client, using fallbacks");
            Arc::new(DisabledTextGenerator)
        }
    }
}
