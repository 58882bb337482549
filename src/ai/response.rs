use serde::Deserialize;
use serde_json::Value;

/// Recognized shapes of a raw generation result.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationResponse {
    /// `{"generations": [{"text": ...}, ...]}`
    Generations(Vec<String>),
    /// `{"text": ...}`
    Text(String),
    /// OpenAI chat completion: `{"choices": [{"message": {"content": ...}}]}`
    ChatCompletion(Vec<String>),
    Unrecognized(Value),
}

#[derive(Deserialize)]
struct GenerationsShape {
    generations: Vec<TextShape>,
}

#[derive(Deserialize)]
struct TextShape {
    text: String,
}

#[derive(Deserialize)]
struct ChatCompletionShape {
    choices: Vec<ChoiceShape>,
}

#[derive(Deserialize)]
struct ChoiceShape {
    message: MessageShape,
}

#[derive(Deserialize)]
struct MessageShape {
    content: Option<MessageContent>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MessageContent {
    Plain(String),
    Parts(Vec<ContentPart>),
}

#[derive(Deserialize)]
struct ContentPart {
    #[serde(default)]
    text: Option<String>,
}

impl MessageContent {
    fn into_text(self) -> String {
        match self {
            MessageContent::Plain(text) => text,
            MessageContent::Parts(parts) => parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<Vec<_>>()
                .join(""),
        }
    }
}

impl GenerationResponse {
    pub fn decode(value: Value) -> Self {
        if let Ok(shape) = GenerationsShape::deserialize(&value) {
            if !shape.generations.is_empty() {
                return GenerationResponse::Generations(
                    shape.generations.into_iter().map(|g| g.text).collect(),
                );
            }
        }
        if let Ok(shape) = ChatCompletionShape::deserialize(&value) {
            if !shape.choices.is_empty() {
                return GenerationResponse::ChatCompletion(
                    shape
                        .choices
                        .into_iter()
                        .map(|choice| {
                            choice
                                .message
                                .content
                                .map(MessageContent::into_text)
                                .unwrap_or_default()
                        })
                        .collect(),
                );
            }
        }
        if let Ok(shape) = TextShape::deserialize(&value) {
            return GenerationResponse::Text(shape.text);
        }
        GenerationResponse::Unrecognized(value)
    }

    /// Text of the first generation; `None` for unrecognized payloads.
    pub fn primary_text(&self) -> Option<&str> {
        match self {
            GenerationResponse::Generations(texts) | GenerationResponse::ChatCompletion(texts) => {
                texts.first().map(String::as_str)
            }
            GenerationResponse::Text(text) => Some(text),
            GenerationResponse::Unrecognized(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_generation_list() {
        let response = GenerationResponse::decode(json!({
            "generations": [{ "text": "#a, #b" }, { "text": "ignored" }]
        }));
        assert_eq!(response.primary_text(), Some("#a, #b"));
    }

    #[test]
    fn decodes_top_level_text() {
        let response = GenerationResponse::decode(json!({ "text": "hello", "usage": {} }));
        assert_eq!(response, GenerationResponse::Text("hello".into()));
    }

    #[test]
    fn decodes_chat_completion() {
        let response = GenerationResponse::decode(json!({
            "id": "chatcmpl-1",
            "choices": [{ "index": 0, "message": { "role": "assistant", "content": "A dog on a beach." } }]
        }));
        assert_eq!(response.primary_text(), Some("A dog on a beach."));
    }

    #[test]
    fn decodes_chat_completion_content_parts() {
        let response = GenerationResponse::decode(json!({
            "choices": [{ "message": { "content": [{ "type": "text", "text": "part one" }] } }]
        }));
        assert_eq!(response.primary_text(), Some("part one"));
    }

    #[test]
    fn empty_generation_list_falls_through() {
        let response = GenerationResponse::decode(json!({ "generations": [] }));
        assert!(matches!(response, GenerationResponse::Unrecognized(_)));
    }

    #[test]
    fn unknown_shape_is_unrecognized() {
        let response = GenerationResponse::decode(json!({ "output": 42 }));
        assert!(matches!(response, GenerationResponse::Unrecognized(_)));
        assert_eq!(response.primary_text(), None);
    }
}
