use url::Url;

use super::models::ModelDescriptor;
use super::provider::{GenerationProvider, GenerationRequest};
use super::response::GenerationResponse;
use crate::error::{AppError, AppResult};

const PROMPT: &str = "Describe this image in a single, concise caption.";
const MAX_TOKENS: u32 = 60;

pub async fn generate_caption(
    provider: &dyn GenerationProvider,
    model: &ModelDescriptor,
    image_url: &Url,
) -> AppResult<String> {
    if !model.provider.supports_image_input() {
        return Err(AppError::UnsupportedModel(format!(
            "Selected model ({}) does not support image captioning.",
            model.name
        )));
    }

    let raw = provider
        .generate(GenerationRequest {
            model: model.name.clone(),
            prompt: PROMPT.to_string(),
            image_url: Some(image_url.clone()),
            max_tokens: MAX_TOKENS,
            temperature: None,
        })
        .await
        .map_err(|error| AppError::Provider(format!("Failed to generate caption: {error}")))?;

    let response = GenerationResponse::decode(raw);
    let caption = response.primary_text().map(str::trim).unwrap_or_default();
    if caption.is_empty() {
        tracing::warn!(model = %model.name, %image_url, ?response, "empty caption");
        return Err(AppError::Provider("No caption generated.".to_string()));
    }
    Ok(caption.to_string())
}
