use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelProvider {
    OpenAi,
    Anthropic,
    Google,
    Xai,
    Other,
}

impl ModelProvider {
    /// Infers the provider family from a model id such as `gpt-4o` or `claude-3-haiku`.
    pub fn infer(model_id: &str) -> Self {
        let id = model_id.trim().to_ascii_lowercase();
        let id = id.rsplit('/').next().unwrap_or_default();
        if id.starts_with("gpt-")
            || id.starts_with("chatgpt-")
            || id.starts_with("o1")
            || id.starts_with("o3")
            || id.starts_with("o4")
        {
            ModelProvider::OpenAi
        } else if id.starts_with("claude") {
            ModelProvider::Anthropic
        } else if id.starts_with("gemini") {
            ModelProvider::Google
        } else if id.starts_with("grok") {
            ModelProvider::Xai
        } else {
            ModelProvider::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelProvider::OpenAi => "openai",
            ModelProvider::Anthropic => "anthropic",
            ModelProvider::Google => "google",
            ModelProvider::Xai => "xai",
            ModelProvider::Other => "other",
        }
    }

    /// Image captioning is only wired up for OpenAI models.
    pub fn supports_image_input(&self) -> bool {
        matches!(self, ModelProvider::OpenAi)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelDescriptor {
    pub name: String,
    pub provider: ModelProvider,
}

impl ModelDescriptor {
    pub fn from_id(model_id: &str) -> Self {
        let name = model_id.trim().to_string();
        let provider = ModelProvider::infer(&name);
        Self { name, provider }
    }
}
