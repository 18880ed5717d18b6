use crate::core::message::Role;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub mod response;

/// Plain `{role, content}` pair as sent to OpenAI-compatible providers.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role: role.as_str().to_string(),
            content: content.into(),
        }
    }
}

#[derive(Serialize, Debug)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
    pub max_tokens: u32,
    pub temperature: f64,
    #[serde(flatten)]
    pub extra_fields: Map<String, Value>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct GeminiPart {
    pub text: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct GeminiContent {
    pub role: &'static str,
    pub parts: Vec<GeminiPart>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct GeminiInstruction {
    pub parts: Vec<GeminiPart>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f64,
    pub max_output_tokens: u32,
}

/// Request body for the native Gemini `generateContent` endpoint.
#[derive(Serialize, Debug)]
pub struct GeminiRequest {
    pub contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig")]
    pub generation_config: GenerationConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<GeminiInstruction>,
    #[serde(flatten)]
    pub extra_fields: Map<String, Value>,
}

impl GeminiRequest {
    /// Split chat messages into Gemini `contents`. The first `system` message
    /// becomes the system instruction; later ones are dropped. `assistant`
    /// turns are sent with the `model` role.
    pub fn from_messages(
        messages: &[ChatMessage],
        generation_config: GenerationConfig,
        extra_fields: Map<String, Value>,
    ) -> Self {
        let mut system_instruction = None;
        let mut contents = Vec::with_capacity(messages.len());

        for message in messages {
            match message.role.as_str() {
                "system" => {
                    if system_instruction.is_none() {
                        system_instruction = Some(GeminiInstruction {
                            parts: vec![GeminiPart {
                                text: message.content.clone(),
                            }],
                        });
                    }
                }
                "user" | "assistant" => contents.push(GeminiContent {
                    role: if message.role == "assistant" {
                        "model"
                    } else {
                        "user"
                    },
                    parts: vec![GeminiPart {
                        text: message.content.clone(),
                    }],
                }),
                _ => {}
            }
        }

        Self {
            contents,
            generation_config,
            system_instruction,
            extra_fields,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn conversation() -> Vec<ChatMessage> {
        vec![
            ChatMessage::new(Role::System, "Stay in character."),
            ChatMessage::new(Role::User, "Hello"),
            ChatMessage::new(Role::Assistant, "Well met."),
            ChatMessage::new(Role::System, "A private note."),
        ]
    }

    #[test]
    fn openai_body_flattens_extra_fields() {
        let messages = conversation();
        let mut extra = Map::new();
        extra.insert("top_p".to_string(), json!(0.9));

        let request = ChatRequest {
            model: "deepseek-chat",
            messages: &messages,
            max_tokens: 1000,
            temperature: 0.5,
            extra_fields: extra,
        };
        let body = serde_json::to_value(&request).unwrap();

        assert_eq!(body["model"], "deepseek-chat");
        assert_eq!(body["max_tokens"], 1000);
        assert_eq!(body["temperature"], 0.5);
        assert_eq!(body["top_p"], 0.9);
        assert_eq!(body["messages"].as_array().unwrap().len(), 4);
        assert_eq!(body["messages"][1], json!({"role": "user", "content": "Hello"}));
    }

    #[test]
    fn gemini_body_uses_model_role_and_first_system_instruction() {
        let request = GeminiRequest::from_messages(
            &conversation(),
            GenerationConfig {
                temperature: 0.7,
                max_output_tokens: 1000,
            },
            Map::new(),
        );
        let body = serde_json::to_value(&request).unwrap();

        assert_eq!(
            body,
            json!({
                "contents": [
                    {"role": "user", "parts": [{"text": "Hello"}]},
                    {"role": "model", "parts": [{"text": "Well met."}]}
                ],
                "generationConfig": {"temperature": 0.7, "maxOutputTokens": 1000},
                "system_instruction": {"parts": [{"text": "Stay in character."}]}
            })
        );
    }

    #[test]
    fn gemini_body_omits_missing_system_instruction() {
        let messages = vec![ChatMessage::new(Role::User, "Hi")];
        let mut extra = Map::new();
        extra.insert("safetySettings".to_string(), json!([]));
        let request = GeminiRequest::from_messages(
            &messages,
            GenerationConfig {
                temperature: 1.0,
                max_output_tokens: 64,
            },
            extra,
        );
        let body = serde_json::to_value(&request).unwrap();
        assert!(body.get("system_instruction").is_none());
        assert_eq!(body["safetySettings"], json!([]));
    }
}
