use crate::core::message::MessageId;
use std::error::Error;
use std::fmt;

/// Rejected conversation operations. Every variant leaves the conversation
/// exactly as it was before the call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationError {
    /// Role outside the set accepted by the operation.
    InvalidRole(String),
    /// `system` messages can only be edited, never appended.
    CannotAddSystemMessage,
    /// Attempt to delete the system message.
    ProtectedMessage,
    /// Attempt to truncate starting at the system message.
    ProtectedOperation,
    NotFound(MessageId),
    /// Import payload is not valid JSON or not a recognised container.
    ParseError(String),
    /// Import payload parsed but does not describe a valid conversation.
    InvalidConversationShape(String),
    /// App notices cannot be edited.
    NotEditable(MessageId),
}

impl fmt::Display for ConversationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversationError::InvalidRole(role) => write!(
                f,
                "Invalid role \"{role}\". Only \"user\" or \"assistant\" can be added."
            ),
            ConversationError::CannotAddSystemMessage => {
                write!(f, "Cannot add another system message. Edit the existing one.")
            }
            ConversationError::ProtectedMessage => write!(f, "System message cannot be deleted."),
            ConversationError::ProtectedOperation => write!(
                f,
                "Cannot \"delete from here\" starting at the system message."
            ),
            ConversationError::NotFound(id) => write!(f, "Could not find message {id}."),
            ConversationError::ParseError(detail) => {
                write!(f, "Failed to load chat history: {detail}")
            }
            ConversationError::InvalidConversationShape(detail) => {
                write!(f, "Failed to load chat history: {detail}")
            }
            ConversationError::NotEditable(id) => {
                write!(f, "Message {id} is an app notice and cannot be edited.")
            }
        }
    }
}

impl Error for ConversationError {}

/// Result of a confirmed-or-declined destructive operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted { count: usize },
    Declined,
}

impl DeleteOutcome {
    pub fn deleted_count(self) -> usize {
        match self {
            DeleteOutcome::Deleted { count } => count,
            DeleteOutcome::Declined => 0,
        }
    }
}
