use crate::AdapterError;
use async_trait::async_trait;
use config::UpstreamConfig;
use errors::UpstreamFailure;
use gw_core::{Commentary, CommentaryRequest, InferenceBackend, Usage};
use reqwest::{Client, StatusCode, header};
use serde::{Deserialize, Serialize};

const MAX_DETAIL_LEN: usize = 512;

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: [ChatMessage<'a>; 2]
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<ApiUsage>
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: u32
}

/// OpenAI-compatible chat completion backend.
pub struct OpenAiBackend {
    client: Client,
    api_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32
}

impl OpenAiBackend {
    pub fn new(api_key: &str, api_url: &str, model: &str) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            max_tokens: 500,
            temperature: 0.7
        }
    }

    pub fn from_config(config: &UpstreamConfig) -> Result<Self, AdapterError> {
        let api_key = config
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| AdapterError::MissingApiKey("openai".to_string()))?;

        Ok(Self {
            client: Client::builder().build()?,
            ..Self::new(api_key, &config.api_url, &config.model)
        }
        .with_max_tokens(config.max_tokens)
        .with_temperature(config.temperature))
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl InferenceBackend for OpenAiBackend {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate(&self, request: &CommentaryRequest) -> Result<Commentary, UpstreamFailure> {
        let url = format!("{}/chat/completions", self.api_url);
        let body = ChatCompletionRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &request.system_prompt
                },
                ChatMessage {
                    role: "user",
                    content: &request.user_prompt
                }
            ]
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| UpstreamFailure::Transport {
                reason: e.without_url().to_string()
            })?;

        let status = response.status();
        if status.is_success() {
            let parsed: ChatCompletionResponse = response.json().await.map_err(|e| {
                tracing::warn!(error = %e.without_url(), "Unreadable completion payload");
                UpstreamFailure::EmptyPayload
            })?;
            return into_commentary(parsed, &self.model);
        }

        Err(classify_status(status, response).await)
    }
}

fn into_commentary(
    response: ChatCompletionResponse,
    fallback_model: &str
) -> Result<Commentary, UpstreamFailure> {
    let text = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or(UpstreamFailure::EmptyPayload)?;

    let model = response
        .model
        .unwrap_or_else(|| fallback_model.to_string());
    let mut commentary = Commentary::new(text, model);
    if let Some(usage) = response.usage {
        commentary = commentary.with_usage(Usage {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens
        });
    }
    Ok(commentary)
}

async fn classify_status(status: StatusCode, response: reqwest::Response) -> UpstreamFailure {
    match status {
        StatusCode::TOO_MANY_REQUESTS => UpstreamFailure::Throttled {
            retry_after: response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<u64>().ok())
        },
        status if status.is_server_error() => UpstreamFailure::Server {
            status: status.as_u16()
        },
        status => {
            let mut detail = response.text().await.unwrap_or_default();
            if detail.len() > MAX_DETAIL_LEN {
                let mut cut = MAX_DETAIL_LEN;
                while !detail.is_char_boundary(cut) {
                    cut -= 1;
                }
                detail.truncate(cut);
            }
            UpstreamFailure::Rejected {
                status: status.as_u16(),
                detail
            }
        }
    }
}
