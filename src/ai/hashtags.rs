use super::models::ModelDescriptor;
use super::provider::{GenerationProvider, GenerationRequest, ProviderError};
use super::response::GenerationResponse;

pub const MAX_HASHTAGS: usize = 10;

const MAX_TOKENS: u32 = 100;
const TEMPERATURE: f32 = 0.7;

fn prompt(text: &str) -> String {
    format!(
        "Suggest {MAX_HASHTAGS} relevant, trending hashtags for the following post. \
         Only return the hashtags, comma-separated, no explanations.\n\nPost: {text}"
    )
}

/// Turns raw model output into at most ten bare hashtags.
///
/// Applying this to its own output (joined by commas) returns the same list.
pub fn normalize_hashtags(raw: &str) -> Vec<String> {
    raw.replace(['#', '\n'], "")
        .split(|c: char| c == ',' || c.is_whitespace())
        .map(|tag| tag.trim().trim_start_matches('#'))
        .filter(|tag| !tag.is_empty())
        .take(MAX_HASHTAGS)
        .map(str::to_string)
        .collect()
}

/// Asks the provider for hashtags. An unrecognized response shape yields an empty list.
pub async fn generate_hashtags(
    provider: &dyn GenerationProvider,
    model: &ModelDescriptor,
    text: &str,
) -> Result<Vec<String>, ProviderError> {
    let raw = provider
        .generate(GenerationRequest {
            model: model.name.clone(),
            prompt: prompt(text),
            image_url: None,
            max_tokens: MAX_TOKENS,
            temperature: Some(TEMPERATURE),
        })
        .await?;

    let response = GenerationResponse::decode(raw);
    match response.primary_text() {
        Some(text) => Ok(normalize_hashtags(text)),
        None => {
            tracing::warn!(model = %model.name, ?response, "unrecognized hashtag generation result");
            Ok(Vec::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::Mutex;

    struct StaticProvider {
        payload: Value,
        seen: Mutex<Vec<GenerationRequest>>,
    }

    impl StaticProvider {
        fn new(payload: Value) -> Self {
            Self {
                payload,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl GenerationProvider for StaticProvider {
        async fn generate(&self, request: GenerationRequest) -> Result<Value, ProviderError> {
            self.seen.lock().unwrap().push(request);
            Ok(self.payload.clone())
        }
    }

    #[test]
    fn strips_hashes_and_splits() {
        assert_eq!(
            normalize_hashtags("#running, #shoes, #fitness"),
            vec!["running", "shoes", "fitness"]
        );
    }

    #[test]
    fn handles_newlines_whitespace_and_repeated_hashes() {
        assert_eq!(
            normalize_hashtags("##travel\n#wanderlust  #sunset,,, "),
            vec!["travel", "wanderlust", "sunset"]
        );
    }

    #[test]
    fn caps_at_ten_entries() {
        let raw = (1..=15).map(|i| format!("#tag{i}")).collect::<Vec<_>>().join(", ");
        let tags = normalize_hashtags(&raw);
        assert_eq!(tags.len(), MAX_HASHTAGS);
        assert_eq!(tags.first().map(String::as_str), Some("tag1"));
        assert_eq!(tags.last().map(String::as_str), Some("tag10"));
    }

    #[test]
    fn normalization_is_idempotent() {
        let inputs = [
            "#running, #shoes, #fitness",
            "a b c d e f g h i j k l",
            "#one,\n#two  ,three#",
            "",
        ];
        for input in inputs {
            let once = normalize_hashtags(input);
            let twice = normalize_hashtags(&once.join(", "));
            assert_eq!(once, twice, "input: {input:?}");
            assert!(once.iter().all(|tag| !tag.contains('#') && !tag.trim().is_empty()));
        }
    }

    #[tokio::test]
    async fn sends_fixed_prompt_and_normalizes() {
        let provider = StaticProvider::new(json!({ "text": "#running, #shoes, #fitness" }));
        let model = ModelDescriptor::from_id("gpt-4o-mini");
        let tags = generate_hashtags(&provider, &model, "I love my new running shoes!")
            .await
            .unwrap();
        assert_eq!(tags, vec!["running", "shoes", "fitness"]);

        let seen = provider.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].model, "gpt-4o-mini");
        assert_eq!(seen[0].max_tokens, 100);
        assert!(seen[0].prompt.ends_with("Post: I love my new running shoes!"));
        assert!(seen[0].image_url.is_none());
    }

    #[tokio::test]
    async fn unrecognized_result_is_empty_not_error() {
        let provider = StaticProvider::new(json!({ "unexpected": true }));
        let model = ModelDescriptor::from_id("gpt-4o");
        let tags = generate_hashtags(&provider, &model, "hello world").await.unwrap();
        assert!(tags.is_empty());
    }
}
