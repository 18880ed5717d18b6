//! The conversation state machine.
//!
//! [`ConversationManager`] owns the ordered message list and keeps it
//! structurally valid after every public call:
//!
//! 1. index 0 is the one and only `system` message;
//! 2. the last message is a `user` message, empty when nothing is pending
//!    (the trailing placeholder).
//!
//! Rejected operations are reported twice: through the injected
//! [`NotificationSink`] and as an `Err` return. Neither path mutates state.

pub mod collaborators;
pub mod error;
pub mod import;
mod projection;


use crate::api::ChatMessage;
use crate::core::constants::DEFAULT_SYSTEM_PROMPT;
use crate::core::message::{Message, MessageId, Role, Severity, Speaker};
use tracing::{debug, warn};

pub use collaborators::{
    ChangeListener, ConfirmGate, FixedConfirm, NotificationSink, Renderer, TracingNotifier,
};
pub use error::{ConversationError, DeleteOutcome};
pub use import::MessageRecord;

const CONFIRM_DELETE: &str = "Are you sure you want to delete this message?";
const CONFIRM_DELETE_FROM: &str = "Are you sure you want to delete all messages from this message onward?";
const CONFIRM_CLEAR: &str = "Are you sure you want to clear the chat history?";

pub struct ConversationManager {
    messages: Vec<Message>,
    fallback_prompt: String,
    notifier: Box<dyn NotificationSink>,
    confirm: Box<dyn ConfirmGate>,
    renderer: Option<Box<dyn Renderer>>,
    listener: Option<Box<dyn ChangeListener>>,
}

impl Default for ConversationManager {
    fn default() -> Self {
        Self::new("")
    }
}

impl std::fmt::Debug for ConversationManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationManager")
            .field("messages", &self.messages)
            .field("fallback_prompt", &self.fallback_prompt)
            .field("has_renderer", &self.renderer.is_some())
            .field("has_listener", &self.listener.is_some())
            .finish()
    }
}

impl ConversationManager {
    /// Create a conversation seeded with `initial_system_prompt`, or with
    /// [`DEFAULT_SYSTEM_PROMPT`] when it is blank.
    pub fn new(initial_system_prompt: &str) -> Self {
        Self::with_fallback(initial_system_prompt, DEFAULT_SYSTEM_PROMPT)
    }

    /// Like [`ConversationManager::new`] with a custom fallback prompt. The
    /// fallback is also used when an import carries no system message.
    pub fn with_fallback(initial_system_prompt: &str, fallback_prompt: &str) -> Self {
        let fallback_prompt = if fallback_prompt.trim().is_empty() {
            DEFAULT_SYSTEM_PROMPT.to_string()
        } else {
            fallback_prompt.to_string()
        };

        let mut manager = Self {
            messages: Vec::new(),
            fallback_prompt,
            notifier: Box::new(TracingNotifier),
            confirm: Box::new(FixedConfirm::default()),
            renderer: None,
            listener: None,
        };
        manager.messages = manager.fresh_messages(initial_system_prompt);
        manager
    }

    pub fn with_notifier(mut self, notifier: impl NotificationSink + 'static) -> Self {
        self.notifier = Box::new(notifier);
        self
    }

    pub fn with_confirm_gate(mut self, gate: impl ConfirmGate + 'static) -> Self {
        self.confirm = Box::new(gate);
        self
    }

    pub fn with_renderer(mut self, renderer: impl Renderer + 'static) -> Self {
        self.renderer = Some(Box::new(renderer));
        self
    }

    pub fn with_change_listener(mut self, listener: impl ChangeListener + 'static) -> Self {
        self.listener = Some(Box::new(listener));
        self
    }

    pub fn set_renderer(&mut self, renderer: impl Renderer + 'static) {
        self.renderer = Some(Box::new(renderer));
    }

    /// Send a notice through the injected sink.
    pub fn notify(&self, message: &str, severity: Severity) {
        self.notifier.notify(message, severity);
    }

    pub fn fallback_prompt(&self) -> &str {
        &self.fallback_prompt
    }

    /// Read-only view of the whole sequence.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|message| message.id() == id)
    }

    fn position(&self, id: MessageId) -> Option<usize> {
        self.messages.iter().position(|message| message.id() == id)
    }

    fn fresh_messages(&self, system_prompt: &str) -> Vec<Message> {
        let content = if system_prompt.trim().is_empty() {
            self.fallback_prompt.as_str()
        } else {
            system_prompt
        };
        vec![Message::new(Role::System, content), Message::new(Role::User, "")]
    }

    /// Append an empty `user` message unless the list already ends with a
    /// `user` message. Returns whether one was added.
    fn ensure_trailing_placeholder(&mut self) -> bool {
        if self.messages.last().is_some_and(|last| last.role.is_user()) {
            return false;
        }
        self.messages.push(Message::new(Role::User, ""));
        true
    }

    fn drop_trailing_placeholder(&mut self) {
        if self.messages.last().is_some_and(Message::is_placeholder) {
            self.messages.pop();
        }
    }

    fn changed(&mut self) {
        if let Some(listener) = self.listener.as_mut() {
            listener.on_change(&self.messages);
        }
    }

    fn reject<T>(
        &self,
        error: ConversationError,
        severity: Severity,
    ) -> Result<T, ConversationError> {
        warn!(%error, "conversation operation rejected");
        self.notifier.notify(&error.to_string(), severity);
        Err(error)
    }

    fn locate(&self, id: MessageId) -> Result<usize, ConversationError> {
        match self.position(id) {
            Some(index) => Ok(index),
            None => self.reject(ConversationError::NotFound(id), Severity::Error),
        }
    }

    /// Append a `user` or `assistant` turn authored by the global character.
    pub fn append_message(
        &mut self,
        role: Role,
        content: impl Into<String>,
    ) -> Result<Message, ConversationError> {
        self.append_message_as(role, content, Speaker::default())
    }

    /// Append from an untyped role name, as read from user input or files.
    pub fn append_message_str(
        &mut self,
        role: &str,
        content: impl Into<String>,
    ) -> Result<Message, ConversationError> {
        match Role::try_from(role) {
            Ok(role) => self.append_message(role, content),
            Err(_) => self.reject(
                ConversationError::InvalidRole(role.to_string()),
                Severity::Error,
            ),
        }
    }

    /// Append a turn tagged with its speaker (multi-character mode).
    ///
    /// The new turn replaces a trailing placeholder instead of stacking on top
    /// of it, and a fresh placeholder follows any non-`user` turn.
    pub fn append_message_as(
        &mut self,
        role: Role,
        content: impl Into<String>,
        speaker: Speaker,
    ) -> Result<Message, ConversationError> {
        match role {
            Role::System => {
                return self.reject(ConversationError::CannotAddSystemMessage, Severity::Error)
            }
            Role::App => {
                return self.reject(
                    ConversationError::InvalidRole(role.as_str().to_string()),
                    Severity::Error,
                )
            }
            Role::User | Role::Assistant => {}
        }

        self.drop_trailing_placeholder();

        let message = Message::with_speaker(role, content, speaker);
        let created = message.clone();
        self.messages.push(message);
        self.ensure_trailing_placeholder();

        debug!(
            id = %created.id(),
            %role,
            character_id = created.character_id,
            len = self.messages.len(),
            "appended message"
        );
        self.changed();
        Ok(created)
    }

    /// Record a failure (typically a provider error) as an `app` notice.
    pub fn append_error(&mut self, description: &str) -> Message {
        let description = if description.trim().is_empty() {
            "Unknown error occurred"
        } else {
            description
        };
        self.drop_trailing_placeholder();

        let message = Message::new(Role::App, format!("Error: {description}"));
        let created = message.clone();
        self.messages.push(message);
        self.ensure_trailing_placeholder();

        debug!(id = %created.id(), "appended error notice");
        self.changed();
        created
    }

    /// Delete exactly one message after confirmation.
    pub fn delete_message(&mut self, id: MessageId) -> Result<DeleteOutcome, ConversationError> {
        let index = self.locate(id)?;
        if index == 0 || self.messages[index].role.is_system() {
            return self.reject(ConversationError::ProtectedMessage, Severity::Error);
        }

        if !self.confirm.confirm(CONFIRM_DELETE) {
            debug!(%id, "delete declined");
            return Ok(DeleteOutcome::Declined);
        }

        self.messages.remove(index);
        self.ensure_trailing_placeholder();

        debug!(%id, index, "deleted message");
        self.notifier.notify("Message deleted.", Severity::Success);
        self.changed();
        Ok(DeleteOutcome::Deleted { count: 1 })
    }

    /// Delete the message `id` and everything after it, after confirmation.
    pub fn delete_from(&mut self, id: MessageId) -> Result<DeleteOutcome, ConversationError> {
        let index = self.locate(id)?;
        if index == 0 {
            return self.reject(ConversationError::ProtectedOperation, Severity::Warning);
        }

        if !self.confirm.confirm(CONFIRM_DELETE_FROM) {
            debug!(%id, "delete-from declined");
            return Ok(DeleteOutcome::Declined);
        }

        let count = self.messages.len() - index;
        self.messages.truncate(index);
        self.ensure_trailing_placeholder();

        debug!(%id, index, count, "truncated conversation");
        self.notifier.notify(
            &format!("{count} message(s) deleted from here."),
            Severity::Success,
        );
        self.changed();
        Ok(DeleteOutcome::Deleted { count })
    }

    /// Replace the whole conversation with a fresh one, after confirmation.
    pub fn clear(&mut self, system_prompt: &str) -> DeleteOutcome {
        if !self.confirm.confirm(CONFIRM_CLEAR) {
            return DeleteOutcome::Declined;
        }

        let count = self.messages.len();
        self.messages = self.fresh_messages(system_prompt);

        debug!(count, "cleared conversation");
        self.notifier.notify("Chat cleared", Severity::Info);
        self.changed();
        DeleteOutcome::Deleted { count }
    }

    /// Messages that may leave the process: everything except `app` notices
    /// and a trailing empty placeholder.
    fn sendable(&self) -> impl Iterator<Item = &Message> {
        self.without_placeholder()
            .iter()
            .filter(|message| !message.role.is_app())
    }

    fn without_placeholder(&self) -> &[Message] {
        match self.messages.split_last() {
            Some((last, rest)) if last.is_placeholder() => rest,
            _ => &self.messages,
        }
    }

    /// Plain `{role, content}` list for a provider request.
    pub fn export_for_transport(&self) -> Vec<ChatMessage> {
        self.sendable()
            .map(|message| ChatMessage::new(message.role, &message.content))
            .collect()
    }

    /// Role-remapped view for one character of a multi-character scene.
    pub fn project_for_character(&self, character_id: u32) -> Vec<ChatMessage> {
        projection::project(self.sendable(), character_id)
    }

    /// Persistence form. Keeps `app` notices and speaker tags; drops the
    /// trailing placeholder.
    pub fn to_records(&self) -> Vec<MessageRecord> {
        import::records_from(&self.messages)
    }

    /// Replace the conversation from a serialized payload. All-or-nothing.
    pub fn import_json(&mut self, payload: &str) -> Result<(), ConversationError> {
        match import::parse_payload(payload) {
            Ok(records) => self.import_records(records),
            Err(error) => self.reject(error, Severity::Error),
        }
    }

    /// Replace the conversation from already-decoded records. All-or-nothing.
    pub fn import_records(&mut self, records: Vec<MessageRecord>) -> Result<(), ConversationError> {
        let messages = match import::build_messages(records, &self.fallback_prompt) {
            Ok(messages) => messages,
            Err(error) => return self.reject(error, Severity::Error),
        };

        self.messages = messages;
        self.ensure_trailing_placeholder();

        debug!(len = self.messages.len(), "imported conversation");
        self.notifier
            .notify("Chat history loaded successfully.", Severity::Success);
        self.changed();
        Ok(())
    }

    pub fn current_system_prompt_text(&self) -> &str {
        self.messages
            .first()
            .map(|message| message.content.as_str())
            .unwrap_or_default()
    }

    /// Update the system prompt in place; the message keeps its id.
    pub fn set_system_prompt_text(&mut self, text: &str) {
        let content = if text.trim().is_empty() {
            self.fallback_prompt.clone()
        } else {
            text.to_string()
        };

        if let Some(system) = self.messages.first_mut() {
            system.content = content;
        }

        self.notifier.notify("System prompt updated.", Severity::Info);
        self.changed();
    }

    pub fn any_message_being_edited(&self) -> bool {
        self.messages.iter().any(Message::is_editing)
    }

    pub fn trailing_user_message(&self) -> Option<&Message> {
        self.messages.last().filter(|last| last.role.is_user())
    }

    pub fn begin_edit(&mut self, id: MessageId) -> Result<bool, ConversationError> {
        let index = self.locate(id)?;
        if self.messages[index].role.is_app() {
            return self.reject(ConversationError::NotEditable(id), Severity::Warning);
        }

        let started = self.messages[index].begin_edit();
        if started {
            self.changed();
        }
        Ok(started)
    }

    /// Finish an edit, keeping `edited` (trimmed). A blank system prompt
    /// falls back to the default one. Only the trailing user message may be
    /// committed blank; any other turn stays in editing with a warning.
    pub fn commit_edit(&mut self, id: MessageId, edited: &str) -> Result<bool, ConversationError> {
        let index = self.locate(id)?;
        let is_trailing = index + 1 == self.messages.len();
        let message = &self.messages[index];
        if message.is_editing()
            && !message.role.is_system()
            && !is_trailing
            && edited.trim().is_empty()
        {
            warn!(%id, "refused blank edit");
            self.notifier.notify("Message cannot be empty.", Severity::Warning);
            return Ok(false);
        }

        let message = &mut self.messages[index];
        if !message.commit_edit(edited) {
            return Ok(false);
        }
        if message.role.is_system() && message.content.is_empty() {
            message.content = self.fallback_prompt.clone();
        }

        debug!(%id, "committed edit");
        self.notifier.notify("Message updated", Severity::Success);
        self.changed();
        Ok(true)
    }

    pub fn rollback_edit(&mut self, id: MessageId) -> Result<bool, ConversationError> {
        let index = self.locate(id)?;
        let rolled_back = self.messages[index].rollback_edit();
        if rolled_back {
            self.changed();
        }
        Ok(rolled_back)
    }

    /// Push the current state to the render target.
    pub fn render(&mut self) -> bool {
        match self.renderer.as_mut() {
            Some(renderer) => {
                renderer.render(&self.messages);
                true
            }
            None => {
                self.notifier.notify(
                    "Cannot render chat: Container not specified.",
                    Severity::Error,
                );
                false
            }
        }
    }
}
