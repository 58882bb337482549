use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use url::Url;

use super::models::{ModelDescriptor, ModelProvider};
use crate::error::{AppError, AppResult};
use crate::settings::AiSettings;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("provider returned {status}: {message}")]
    Upstream { status: u16, message: String },
}

/// One prompt sent to a generation backend.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub model: String,
    pub prompt: String,
    pub image_url: Option<Url>,
    pub max_tokens: u32,
    pub temperature: Option<f32>,
}

/// key: generation-provider -> backend seam
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Returns the raw provider payload; callers decode it with
    /// [`GenerationResponse::decode`](super::GenerationResponse::decode).
    async fn generate(&self, request: GenerationRequest) -> Result<Value, ProviderError>;
}

/// Shared HTTP client and the chat completions endpoint of each model family.
///
/// Every family posts to `{base}/v1/chat/completions` unless an API root is registered for
/// it with [`AiGateway::with_api_root`].
#[derive(Clone)]
pub struct AiGateway {
    base_url: String,
    api_roots: HashMap<ModelProvider, String>,
    client: Client,
}

impl AiGateway {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_roots: HashMap::new(),
            client: Client::builder().timeout(timeout).build()?,
        })
    }

    /// Routes one model family to its own OpenAI-compatible API root, e.g.
    /// `https://api.x.ai/v1`.
    pub fn with_api_root(mut self, family: ModelProvider, api_root: impl Into<String>) -> Self {
        self.api_roots
            .insert(family, api_root.into().trim_end_matches('/').to_string());
        self
    }

    pub fn from_env() -> Result<Self, reqwest::Error> {
        Ok(Self::new(
            crate::config::AI_PROVIDER_BASE_URL.as_str(),
            *crate::config::AI_REQUEST_TIMEOUT,
        )?
        .with_api_root(
            ModelProvider::Anthropic,
            crate::config::ANTHROPIC_API_ROOT.as_str(),
        )
        .with_api_root(ModelProvider::Google, crate::config::GEMINI_API_ROOT.as_str())
        .with_api_root(ModelProvider::Xai, crate::config::XAI_API_ROOT.as_str()))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn chat_completions_url(&self, family: ModelProvider) -> String {
        match self.api_roots.get(&family) {
            Some(root) => format!("{root}/chat/completions"),
            None => format!("{}/v1/chat/completions", self.base_url),
        }
    }
}

/// key: openai-compatible-provider -> chat completions over HTTP
pub struct OpenAiCompatibleProvider {
    endpoint: String,
    api_key: String,
    client: Client,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: Vec<ContentPart<'a>>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageRef<'a> },
}

#[derive(Serialize)]
struct ImageRef<'a> {
    url: &'a str,
}

impl OpenAiCompatibleProvider {
    pub fn new(gateway: &AiGateway, family: ModelProvider, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: gateway.chat_completions_url(family),
            api_key: api_key.into(),
            client: gateway.client.clone(),
        }
    }
}

#[async_trait]
impl GenerationProvider for OpenAiCompatibleProvider {
    async fn generate(&self, request: GenerationRequest) -> Result<Value, ProviderError> {
        let mut content = vec![ContentPart::Text {
            text: &request.prompt,
        }];
        if let Some(image) = &request.image_url {
            content.push(ContentPart::ImageUrl {
                image_url: ImageRef {
                    url: image.as_str(),
                },
            });
        }
        let body = ChatCompletionRequest {
            model: &request.model,
            messages: vec![ChatMessage {
                role: "user",
                content,
            }],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            return Err(ProviderError::Upstream {
                status: status.as_u16(),
                message: upstream_message(&raw),
            });
        }

        Ok(response.json::<Value>().await?)
    }
}

/// Pulls `error.message` out of an OpenAI-style error body, falling back to the raw text.
fn upstream_message(raw: &str) -> String {
    serde_json::from_str::<Value>(raw)
        .ok()
        .and_then(|value| {
            value["error"]["message"]
                .as_str()
                .or_else(|| value["error"].as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| raw.chars().take(200).collect())
}

pub struct ResolvedProvider {
    pub instance: Arc<dyn GenerationProvider>,
    pub model: ModelDescriptor,
}

/// Selects the first enabled model from the admin AI settings and routes it to the
/// endpoint of its model family.
pub fn resolve_provider(
    settings: Option<&AiSettings>,
    gateway: &AiGateway,
) -> AppResult<ResolvedProvider> {
    let Some(settings) = settings else {
        return Err(AppError::Configuration(
            "AI model settings not found".to_string(),
        ));
    };
    let api_key = settings.api_key();
    let model = settings.enabled_models().next();
    let (Some(api_key), Some(model)) = (api_key, model) else {
        return Err(AppError::Configuration(
            "No AI model enabled or API key missing".to_string(),
        ));
    };

    let model = ModelDescriptor::from_id(model);
    Ok(ResolvedProvider {
        instance: Arc::new(OpenAiCompatibleProvider::new(
            gateway,
            model.provider,
            api_key,
        )),
        model,
    })
}
