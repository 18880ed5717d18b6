//! Persisted conversation records and the all-or-nothing import path.

use super::error::ConversationError;
use crate::core::message::{Message, Role, Speaker, Visibility, GLOBAL_CHARACTER};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Persisted form of one message.
///
/// `characterId` and `visibility` are optional on input and only written when
/// they differ from the defaults, so plain `{role, content}` files stay plain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRecord {
    pub role: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "is_global")]
    pub character_id: u32,
    #[serde(default, skip_serializing_if = "is_public")]
    pub visibility: Visibility,
}

fn is_global(character_id: &u32) -> bool {
    *character_id == GLOBAL_CHARACTER
}

fn is_public(visibility: &Visibility) -> bool {
    visibility.is_public()
}

impl MessageRecord {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role: role.as_str().to_string(),
            content: content.into(),
            character_id: GLOBAL_CHARACTER,
            visibility: Visibility::Public,
        }
    }

    pub fn with_speaker(mut self, speaker: Speaker) -> Self {
        self.character_id = speaker.character_id;
        self.visibility = speaker.visibility;
        self
    }
}

impl From<&Message> for MessageRecord {
    fn from(message: &Message) -> Self {
        MessageRecord::new(message.role, message.content.clone()).with_speaker(message.speaker())
    }
}

/// Persistence form of a message list: every message except a trailing empty
/// placeholder.
pub fn records_from(messages: &[Message]) -> Vec<MessageRecord> {
    let kept = match messages.split_last() {
        Some((last, rest)) if last.is_placeholder() => rest,
        _ => messages,
    };
    kept.iter().map(MessageRecord::from).collect()
}

/// Decode a serialized payload into records.
///
/// Accepts either a bare array of records or an object carrying a `messages`
/// array (export metadata such as `exportDate` is ignored).
pub(crate) fn parse_payload(json: &str) -> Result<Vec<MessageRecord>, ConversationError> {
    let value: Value =
        serde_json::from_str(json).map_err(|err| ConversationError::ParseError(err.to_string()))?;

    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("messages") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(ConversationError::ParseError(
                    "Invalid chat file format: expected a \"messages\" array.".to_string(),
                ))
            }
        },
        _ => {
            return Err(ConversationError::ParseError(
                "Input must be a JSON array or an object with a \"messages\" array.".to_string(),
            ))
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            if !item.is_object() {
                return Err(ConversationError::InvalidConversationShape(format!(
                    "message {index} is not an object"
                )));
            }
            serde_json::from_value::<MessageRecord>(item).map_err(|err| {
                ConversationError::InvalidConversationShape(format!("message {index}: {err}"))
            })
        })
        .collect()
}

/// Validate records and build fresh messages.
///
/// A `system` record is only accepted at position 0. When none is present the
/// fallback prompt is synthesized in front.
pub(crate) fn build_messages(
    records: Vec<MessageRecord>,
    fallback_prompt: &str,
) -> Result<Vec<Message>, ConversationError> {
    let mut messages = Vec::with_capacity(records.len() + 2);

    for (index, record) in records.into_iter().enumerate() {
        let role = Role::try_from(record.role.as_str()).map_err(|err| {
            ConversationError::InvalidConversationShape(format!("message {index}: {err}"))
        })?;

        if role.is_system() && index != 0 {
            return Err(ConversationError::InvalidConversationShape(
                "Only one message with role \"system\" is allowed (must be the first).".to_string(),
            ));
        }

        let content = if role.is_system() && record.content.trim().is_empty() {
            fallback_prompt.to_string()
        } else {
            record.content
        };

        messages.push(Message::with_speaker(
            role,
            content,
            Speaker::new(record.character_id, record.visibility),
        ));
    }

    if !messages.first().is_some_and(|first| first.role.is_system()) {
        messages.insert(0, Message::new(Role::System, fallback_prompt));
    }

    Ok(messages)
}
