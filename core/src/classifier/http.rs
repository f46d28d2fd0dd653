//! OpenAI-compatible chat completion transport over blocking HTTP

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ChatTransport, ClassifierError};
use crate::config::LlmConfig;

const USER_AGENT: &str = concat!("scenario/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
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

/// Blocking client for `POST {base}/v1/chat/completions`
pub struct HttpTransport {
    agent: ureq::Agent,
    api_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl HttpTransport {
    pub fn new(llm: &LlmConfig) -> Result<Self, ClassifierError> {
        let api_key = llm
            .api_key
            .clone()
            .ok_or_else(|| ClassifierError::credentials("llm.api_key is not set"))?;
        let base_url = llm
            .base_url
            .as_deref()
            .ok_or_else(|| ClassifierError::misconfigured("llm.base_url is not set"))?;

        let mut builder = ureq::AgentBuilder::new()
            .timeout(llm.timeout())
            .user_agent(USER_AGENT);
        if let Some(proxy) = llm.proxy.as_deref() {
            let proxy = ureq::Proxy::new(proxy).map_err(|e| {
                ClassifierError::misconfigured(format!("invalid proxy {}: {}", proxy, e))
            })?;
            builder = builder.proxy(proxy);
        }

        Ok(Self {
            agent: builder.build(),
            api_url: chat_completions_url(base_url),
            api_key,
            model: llm.model.clone(),
            temperature: llm.temperature,
            max_tokens: llm.max_tokens,
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

impl ChatTransport for HttpTransport {
    fn complete(&self, prompt: &str) -> Result<String, ClassifierError> {
        let request = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        debug!(url = %self.api_url, model = %self.model, "sending classification request");

        let response = self
            .agent
            .post(&self.api_url)
            .set("Authorization", &format!("Bearer {}", self.api_key))
            .set("Content-Type", "application/json")
            .send_json(&request);

        let response = match response {
            Ok(response) => response,
            Err(ureq::Error::Status(status, response)) => {
                let retry_after = response
                    .header("retry-after")
                    .and_then(|v| v.trim().parse::<u64>().ok())
                    .map(Duration::from_secs);
                let body = response.into_string().unwrap_or_default();
                let err = ClassifierError::from_status(status, body.trim());
                return Err(match retry_after {
                    Some(wait) => err.with_retry_after(wait),
                    None => err,
                });
            }
            Err(ureq::Error::Transport(e)) => {
                return Err(ClassifierError::transport(format!("Request failed: {}", e)));
            }
        };

        let parsed: ChatResponse = response.into_json().map_err(|e| {
            ClassifierError::malformed_reply(format!("Failed to parse response: {}", e))
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| ClassifierError::malformed_reply("Response contained no choices"))
    }
}

/// Normalise a configured base URL to the chat completions endpoint.
///
/// `https://host` and `https://host/v1` both become
/// `https://host/v1/chat/completions`; a full endpoint URL is kept.
pub fn chat_completions_url(base_url: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    if base.ends_with("/chat/completions") {
        base.to_string()
    } else if base.ends_with("/v1") {
        format!("{}/chat/completions", base)
    } else {
        format!("{}/v1/chat/completions", base)
    }
}
