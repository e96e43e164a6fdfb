#![doc = "Text-generation integration: bridges the core `TextGenerator` contract to an OpenAI-compatible chat completions API."]
//
//! # Text generation client
//!
//! [`OpenAiClient`] implements [`TextGenerator`] over `reqwest`. Every request asks for
//! a structured response conforming to the `CodeDoc` JSON schema (a single `markdown`
//! string), so the answer can be deserialized straight into [`GeneratedDoc`].
//!
//! - Construct with [`OpenAiClient::from_config`]; the API key comes from the environment
//!   via the loaded config.
//! - Transport failures, non-2xx answers and refusals are `GenerationError::Provider`.
//! - Answers that do not parse into the schema are `GenerationError::Malformed`.
//! - No retries are made.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use code_docu_core::contract::{GeneratedDoc, GenerationError, TextGenerator};

use crate::load_config::{GeneratorSection, API_KEY_ENV};

pub struct OpenAiClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    temperature: f32,
    api_key: String,
}

impl OpenAiClient {
    pub fn from_config(config: &GeneratorSection) -> anyhow::Result<Self> {
        let Some(api_key) = config.api_key.clone() else {
            tracing::error!("{API_KEY_ENV} missing in environment");
            anyhow::bail!("{API_KEY_ENV} environment variable not set");
        };
        let endpoint = format!("{}/chat/completions", config.base_url.trim_end_matches('/'));
        tracing::info!(
            endpoint = %endpoint,
            model = %config.model,
            api_key_set = !api_key.is_empty(),
            "Initialized OpenAiClient"
        );
        Ok(OpenAiClient {
            http: reqwest::Client::new(),
            endpoint,
            model: config.model.clone(),
            temperature: config.temperature,
            api_key,
        })
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
    json_schema: JsonSchemaFormat,
}

#[derive(Serialize)]
struct JsonSchemaFormat {
    name: &'static str,
    strict: bool,
    schema: serde_json::Value,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    async fn generate(&self, instruction: &str) -> Result<GeneratedDoc, GenerationError> {
        tracing::debug!(
            endpoint = %self.endpoint,
            prompt_len = instruction.len(),
            "Requesting structured generation"
        );
        let body = ChatRequest {
            model: &self.model,
            temperature: self.temperature,
            messages: vec![ChatMessage {
                role: "user",
                content: instruction,
            }],
            response_format: ResponseFormat {
                kind: "json_schema",
                json_schema: JsonSchemaFormat {
                    name: GeneratedDoc::SCHEMA_NAME,
                    strict: true,
                    schema: GeneratedDoc::json_schema(),
                },
            },
        };

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = ?e, endpoint = %self.endpoint, "Failed to reach text-generation API");
                GenerationError::Provider(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<Failed to decode response body>"));
            tracing::error!(status = %status, body = %text, "Text-generation API returned error");
            return Err(GenerationError::Provider(format!("{status}: {text}")));
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            tracing::error!(error = ?e, "Text-generation API response is not a chat completion");
            GenerationError::Malformed(format!("unexpected response body: {e}"))
        })?;
        let message = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| GenerationError::Malformed("response has no choices".to_string()))?;

        if let Some(refusal) = message.refusal {
            tracing::error!(refusal = %refusal, "Text-generation API refused the request");
            return Err(GenerationError::Provider(format!("request refused: {refusal}")));
        }
        let content = message
            .content
            .ok_or_else(|| GenerationError::Malformed("response message has no content".to_string()))?;

        let doc: GeneratedDoc = serde_json::from_str(&content).map_err(|e| {
            tracing::error!(error = ?e, "Structured output does not match CodeDoc");
            GenerationError::Malformed(e.to_string())
        })?;
        tracing::debug!(len = doc.markdown.len(), "Structured generation succeeded");
        Ok(doc)
    }
}
