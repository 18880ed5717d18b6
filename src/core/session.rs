//! One conversation bound to a provider.
//!
//! [`ChatSession`] is where the async transport meets the synchronous
//! conversation core: it exports the message list, awaits the provider and
//! records the outcome. `send` takes `&mut self`, so a session can only have
//! one request in flight.

use crate::api::response::{
    extract_response_content, finish_reason, is_natural_stop, token_usage_summary,
};
use crate::api::ChatMessage;
use crate::core::conversation::ConversationManager;
use crate::core::message::{Message, Role, Severity, Speaker, Visibility};
use crate::core::providers::ResolvedProvider;
use crate::core::transport::{ProviderRequest, RequestSettings, TransportClient};
use tracing::{info, warn};

const EDITS_ACTIVE: &str = "Please save or cancel any active edits before sending";
const EMPTY_MESSAGE: &str = "Please enter a message before sending";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refusal {
    EditInProgress,
    EmptyMessage,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// The provider answered; the reply was appended.
    Replied {
        message: Message,
        usage: Option<String>,
    },
    /// The request failed; an `app` error notice was appended.
    Failed(Message),
    /// Nothing was sent.
    Refused(Refusal),
}

pub struct ChatSession<T> {
    conversation: ConversationManager,
    provider: ResolvedProvider,
    settings: RequestSettings,
    transport: T,
}

impl<T: TransportClient> ChatSession<T> {
    pub fn new(
        conversation: ConversationManager,
        provider: ResolvedProvider,
        settings: RequestSettings,
        transport: T,
    ) -> Self {
        Self {
            conversation,
            provider,
            settings,
            transport,
        }
    }

    pub fn conversation(&self) -> &ConversationManager {
        &self.conversation
    }

    pub fn conversation_mut(&mut self) -> &mut ConversationManager {
        &mut self.conversation
    }

    pub fn into_conversation(self) -> ConversationManager {
        self.conversation
    }

    pub fn provider(&self) -> &ResolvedProvider {
        &self.provider
    }

    pub fn settings(&self) -> &RequestSettings {
        &self.settings
    }

    fn refuse(&self, refusal: Refusal) -> SendOutcome {
        let text = match refusal {
            Refusal::EditInProgress => EDITS_ACTIVE,
            Refusal::EmptyMessage => EMPTY_MESSAGE,
        };
        self.conversation.notify(text, Severity::Error);
        SendOutcome::Refused(refusal)
    }

    /// Send the pending user message and record the reply.
    pub async fn send(&mut self) -> SendOutcome {
        if self.conversation.any_message_being_edited() {
            return self.refuse(Refusal::EditInProgress);
        }
        let has_input = self
            .conversation
            .trailing_user_message()
            .is_some_and(|message| !message.content.trim().is_empty());
        if !has_input {
            return self.refuse(Refusal::EmptyMessage);
        }

        let messages = self.conversation.export_for_transport();
        self.dispatch(messages, Speaker::default()).await
    }

    /// Let one character of a multi-character scene take a turn. The request
    /// carries that character's view of the scene and the reply is tagged
    /// with the character and `visibility`.
    pub async fn send_as_character(
        &mut self,
        character_id: u32,
        visibility: Visibility,
    ) -> SendOutcome {
        if self.conversation.any_message_being_edited() {
            return self.refuse(Refusal::EditInProgress);
        }

        let messages = self.conversation.project_for_character(character_id);
        self.dispatch(messages, Speaker::new(character_id, visibility))
            .await
    }

    async fn dispatch(&mut self, messages: Vec<ChatMessage>, speaker: Speaker) -> SendOutcome {
        let request = match ProviderRequest::build(&self.provider, &messages, &self.settings) {
            Ok(request) => request,
            Err(err) => return self.fail(&format!("Failed to build request: {err}")),
        };

        info!(
            provider = %self.provider.provider.id,
            model = %self.provider.model.id,
            character_id = speaker.character_id,
            messages = messages.len(),
            "sending request"
        );

        let response = match self.transport.send(&request).await {
            Ok(response) => response,
            Err(err) => return self.fail(&err.to_string()),
        };

        let usage = token_usage_summary(&response);
        if let Some(summary) = usage.as_deref() {
            info!("{summary}");
        }
        if let Some(reason) = finish_reason(&response).filter(|r| !is_natural_stop(r)) {
            warn!(reason, "response ended before a natural stop");
        }

        let text = match extract_response_content(&response) {
            Ok(text) => text,
            Err(err) => return self.fail(&err.to_string()),
        };

        match self
            .conversation
            .append_message_as(Role::Assistant, text, speaker)
        {
            Ok(message) => SendOutcome::Replied { message, usage },
            Err(err) => self.fail(&err.to_string()),
        }
    }

    fn fail(&mut self, description: &str) -> SendOutcome {
        warn!("request failed: {description}");
        SendOutcome::Failed(self.conversation.append_error(description))
    }
}
