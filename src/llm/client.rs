//! @acp:module "OpenAI Client"
//! @acp:summary "Blocking chat-completions client with bounded retries"
//! @acp:domain llm
//! @acp:layer io

use std::thread;
use std::time::Duration;

use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use super::{CompletionRequest, LanguageModel};
use crate::config::LlmConfig;
use crate::error::{QgenError, Result};

const DEFAULT_BACKOFF: Duration = Duration::from_millis(500);

/// @acp:summary "Chat-completions API over a ureq agent"
pub struct OpenAiClient {
    agent: ureq::Agent,
    endpoint: String,
    api_key: String,
    max_retries: u32,
    backoff: Duration,
}

impl OpenAiClient {
    pub fn new(api_base: &str, api_key: impl Into<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            agent,
            endpoint: format!("{}/chat/completions", api_base.trim_end_matches('/')),
            api_key: api_key.into(),
            max_retries: 0,
            backoff: DEFAULT_BACKOFF,
        }
    }

    /// Build a client from config, reading the key from `llm.api_key_env`
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            QgenError::Llm(format!("API key not set: export {}", config.api_key_env))
        })?;
        Ok(Self::new(
            &config.api_base,
            api_key,
            Duration::from_secs(config.timeout_secs),
        )
        .with_max_retries(config.max_retries))
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Base delay between attempts; attempt `n` waits `n * backoff`
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn send(&self, request: &CompletionRequest) -> std::result::Result<String, Attempt> {
        let body = json!({
            "model": request.model,
            "messages": [{ "role": "user", "content": request.prompt }],
        });

        let response = self
            .agent
            .post(&self.endpoint)
            .set("Authorization", &format!("Bearer {}", self.api_key))
            .set("Content-Type", "application/json")
            .send_json(body)
            .map_err(Attempt::from)?;

        let parsed: ChatResponse = response
            .into_json()
            .map_err(|e| Attempt::Fatal(format!("Failed to parse response: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .ok_or_else(|| Attempt::Fatal("Response carried no message content".into()))
    }
}

impl LanguageModel for OpenAiClient {
    fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let mut attempt = 0;
        loop {
            match self.send(request) {
                Ok(text) => {
                    debug!(model = %request.model, chars = text.len(), "completion received");
                    return Ok(text);
                }
                Err(Attempt::Retryable(message)) if attempt < self.max_retries => {
                    attempt += 1;
                    warn!(model = %request.model, attempt, "{}; retrying", message);
                    thread::sleep(self.backoff * attempt);
                }
                Err(Attempt::Retryable(message)) | Err(Attempt::Fatal(message)) => {
                    return Err(QgenError::Llm(message));
                }
            }
        }
    }
}

/// Outcome of one failed HTTP attempt
#[derive(Debug)]
enum Attempt {
    Retryable(String),
    Fatal(String),
}

impl From<ureq::Error> for Attempt {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(status, response) => {
                let body = response.into_string().unwrap_or_default();
                classify_status(status, &body)
            }
            ureq::Error::Transport(transport) => Attempt::Retryable(transport.to_string()),
        }
    }
}

fn classify_status(status: u16, body: &str) -> Attempt {
    match status {
        429 => Attempt::Retryable(format!("Rate limited: {}", body)),
        500..=599 => Attempt::Retryable(format!("Server error {}: {}", status, body)),
        401 | 403 => Attempt::Fatal(format!("Authentication failed ({})", status)),
        _ => Attempt::Fatal(format!("HTTP {}: {}", status, body)),
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_base() {
        let client = OpenAiClient::new("https://api.openai.com/v1/", "k", Duration::from_secs(1));
        assert_eq!(client.endpoint(), "https://api.openai.com/v1/chat/completions");
    }

    #[test]
    fn test_classify_status() {
        assert!(matches!(classify_status(429, ""), Attempt::Retryable(_)));
        assert!(matches!(classify_status(503, ""), Attempt::Retryable(_)));
        assert!(matches!(classify_status(401, ""), Attempt::Fatal(_)));
        assert!(matches!(classify_status(400, "bad"), Attempt::Fatal(m) if m.contains("bad")));
    }

    #[test]
    fn test_response_content_extraction() {
        let parsed: ChatResponse = serde_json::from_str(
            r#"{"choices": [{"message": {"role": "assistant", "content": "[]"}}]}"#,
        )
        .unwrap();
        let content = parsed.choices.into_iter().next().and_then(|c| c.message).and_then(|m| m.content);
        assert_eq!(content.as_deref(), Some("[]"));
    }

    #[test]
    fn test_missing_api_key_is_llm_error() {
        let config = LlmConfig {
            api_key_env: "QGEN_TEST_KEY_THAT_IS_NEVER_SET".into(),
            ..LlmConfig::default()
        };
        let err = OpenAiClient::from_config(&config).err().unwrap();
        assert!(matches!(err, QgenError::Llm(ref m) if m.contains("QGEN_TEST_KEY_THAT_IS_NEVER_SET")));
    }

    #[test]
    fn test_unreachable_server_reports_unavailable() {
        let client = OpenAiClient::new("http://127.0.0.1:1", "k", Duration::from_secs(2))
            .with_max_retries(1)
            .with_backoff(Duration::ZERO);
        let err = client
            .complete(&CompletionRequest::new("m", "hi"))
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Unavailable);
    }
}
