use crate::llm::client::{ChatModel, LLMError, LlmMessage};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_ENDPOINT: &str = "http://localhost:1234/v1/chat/completions";
const DEFAULT_MODEL: &str = "openai/gpt-oss-20b";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const MAX_RETRIES: u32 = 3;
const INITIAL_BACKOFF_MS: u64 = 1000;

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [LlmMessage],
    stream: bool,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

/// Client for an OpenAI-compatible chat-completions endpoint
///
/// Works against local servers (LM Studio, ollama's compat layer) as well as
/// hosted ones; the endpoint URL, model and sampling knobs come from config.
pub struct EndpointClient {
    endpoint: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    http_client: Client,
}

impl EndpointClient {
    pub fn new(endpoint: String, model: String) -> Result<Self, LLMError> {
        Self::with_options(endpoint, model, 0.7, 2000, DEFAULT_TIMEOUT)
    }

    pub fn with_options(
        endpoint: String,
        model: String,
        temperature: f32,
        max_tokens: u32,
        timeout: Duration,
    ) -> Result<Self, LLMError> {
        let http_client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            endpoint,
            model,
            temperature,
            max_tokens,
            http_client,
        })
    }

    pub fn local_default() -> Result<Self, LLMError> {
        Self::new(DEFAULT_ENDPOINT.to_string(), DEFAULT_MODEL.to_string())
    }

    async fn call_api(&self, messages: &[LlmMessage]) -> Result<String, LLMError> {
        let request_body = ChatCompletionRequest {
            model: &self.model,
            messages,
            stream: false,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let mut attempt = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            attempt += 1;

            let response = self
                .http_client
                .post(&self.endpoint)
                .header("content-type", "application/json")
                .json(&request_body)
                .send()
                .await
                .map_err(|e| {
                    if e.is_timeout() {
                        LLMError::Timeout
                    } else {
                        LLMError::NetworkError(e)
                    }
                })?;

            let status = response.status();

            if status.is_success() {
                let api_response: ChatCompletionResponse = response.json().await?;

                let content = api_response
                    .choices
                    .first()
                    .map(|c| c.message.content.clone())
                    .ok_or_else(|| {
                        LLMError::InvalidResponse("No choices in response".to_string())
                    })?;

                return Ok(content);
            } else if status.as_u16() == 429 && attempt < MAX_RETRIES {
                tracing::warn!(attempt, "rate limited by LLM endpoint, backing off");
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                backoff_ms *= 2;
                continue;
            } else {
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                return Err(LLMError::ApiError(format!(
                    "API returned status {}: {}",
                    status, error_text
                )));
            }
        }
    }
}

#[async_trait]
impl ChatModel for EndpointClient {
    async fn complete(&self, messages: &[LlmMessage]) -> Result<String, LLMError> {
        let raw = self.call_api(messages).await?;
        let cleaned = scrub_response(&raw);

        if cleaned.is_empty() {
            return Err(LLMError::InvalidResponse(
                "Response empty after cleaning".to_string(),
            ));
        }

        Ok(cleaned)
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn set_model(&mut self, model: &str) {
        self.model = model.to_string();
    }
}

/// Strip internal delimiter tokens some local models leak into their output
///
/// Removes `<|...|>` markers (keeping only the text after the final
/// `<|message|>` channel marker when one is present) and leading role-prefix
/// lines, then collapses surplus blank lines.
pub fn scrub_response(raw: &str) -> String {
    let mut text = raw;

    // Everything before the last channel marker is reasoning-channel noise
    if let Some(pos) = text.rfind("<|message|>") {
        text = &text[pos + "<|message|>".len()..];
    }

    // Drop remaining <|...|> tokens
    let mut cleaned = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("<|") {
        cleaned.push_str(&rest[..start]);
        match rest[start..].find("|>") {
            Some(end) => rest = &rest[start + end + 2..],
            None => {
                // Unterminated token: everything after it is fragment
                rest = "";
            }
        }
    }
    cleaned.push_str(rest);

    // Leading role prefixes ("assistant:", "final", ...) on their own line
    let cleaned = cleaned
        .lines()
        .skip_while(|line| {
            let lower = line.trim().to_lowercase();
            lower.is_empty()
                || ["assistant", "user", "system", "final", "analysis"]
                    .iter()
                    .any(|role| lower == *role || lower.starts_with(&format!("{role}:")))
        })
        .collect::<Vec<_>>()
        .join("\n");

    cleaned.trim().to_string()
}
