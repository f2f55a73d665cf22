//! Model-backed conversion over a chat endpoint
//!
//! One request per file, non-streaming, deterministic sampling. The model is
//! told to think first and then print the code after the output marker; only
//! the text after the marker is returned.

use crate::config::{ApiFlavor, EndpointConfig};
use crate::prompts;
use async_trait::async_trait;
use evaluation::batch::{ConversionError, ConversionRequest, Converter};
use evaluation::metric::{after_sentinel, DEFAULT_SENTINEL};
use serde_json::{json, Value};
use std::time::Instant;
use tracing::debug;

/// Converter that asks an LLM for the translation
pub struct ModelConverter {
    endpoint: EndpointConfig,
    sentinel: String,
    client: reqwest::Client,
}

impl ModelConverter {
    pub fn new(endpoint: EndpointConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(endpoint.timeout())
            .build()?;
        Ok(Self {
            endpoint,
            sentinel: DEFAULT_SENTINEL.to_string(),
            client,
        })
    }

    pub fn with_sentinel(mut self, sentinel: impl Into<String>) -> Self {
        self.sentinel = sentinel.into();
        self
    }

    pub fn endpoint(&self) -> &EndpointConfig {
        &self.endpoint
    }

    /// JSON body of the chat request for `java_source`
    pub fn request_body(&self, java_source: &str) -> Value {
        let messages = json!([
            { "role": "system", "content": prompts::system_prompt(&self.sentinel) },
            { "role": "user", "content": prompts::user_prompt(java_source) },
        ]);

        match self.endpoint.flavor {
            ApiFlavor::Ollama => json!({
                "model": self.endpoint.model,
                "messages": messages,
                "options": {
                    "temperature": self.endpoint.temperature,
                    "num_ctx": self.endpoint.num_ctx,
                },
                "stream": false,
            }),
            ApiFlavor::OpenAi => json!({
                "model": self.endpoint.model,
                "messages": messages,
                "temperature": self.endpoint.temperature,
                "stream": false,
            }),
        }
    }
}

/// Assistant message text in a chat response
pub fn response_content(flavor: ApiFlavor, response: &Value) -> Option<&str> {
    match flavor {
        ApiFlavor::Ollama => response["message"]["content"].as_str(),
        ApiFlavor::OpenAi => response["choices"][0]["message"]["content"].as_str(),
    }
}

/// The code after the first `sentinel`, left-trimmed
pub fn extract_code(output: &str, sentinel: &str) -> Result<String, ConversionError> {
    let code = after_sentinel(output, sentinel)
        .ok_or_else(|| ConversionError::MissingSentinel(sentinel.to_string()))?
        .trim_start();
    if code.trim().is_empty() {
        return Err(ConversionError::EmptyOutput);
    }
    Ok(code.to_string())
}

#[async_trait]
impl Converter for ModelConverter {
    fn name(&self) -> &str {
        &self.endpoint.model
    }

    async fn convert(&self, request: &ConversionRequest<'_>) -> Result<String, ConversionError> {
        let start = Instant::now();
        let mut call = self
            .client
            .post(self.endpoint.chat_url())
            .json(&self.request_body(request.source));
        if let Some(ref key) = self.endpoint.api_key {
            call = call.bearer_auth(key);
        }

        let response = call
            .send()
            .await
            .map_err(|e| ConversionError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ConversionError::Request(format!(
                "{} API error ({}): {}",
                self.endpoint.model, status, body
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ConversionError::Request(format!("unparseable response: {e}")))?;
        let output = response_content(self.endpoint.flavor, &body).ok_or_else(|| {
            ConversionError::Request("response has no message content".to_string())
        })?;

        debug!(
            identifier = request.identifier,
            model = %self.endpoint.model,
            elapsed_ms = start.elapsed().as_millis() as u64,
            output_len = output.len(),
            "Model responded"
        );
        extract_code(output, &self.sentinel)
    }
}
