//! Capabilities the conversation calls out to.
//!
//! The manager never touches a terminal, a file or the network itself. Every
//! side effect goes through one of these traits, injected at construction.

use crate::core::message::{Message, Severity};
use tracing::{error, info, warn};

/// Receives user-facing notices. Fire-and-forget.
pub trait NotificationSink {
    fn notify(&self, message: &str, severity: Severity);
}

/// Yes/no gate consulted before destructive operations.
pub trait ConfirmGate {
    fn confirm(&self, prompt: &str) -> bool;
}

/// Target that displays the conversation. Receives a read-only view.
pub trait Renderer {
    fn render(&mut self, messages: &[Message]);
}

/// Called once after every completed mutation with the final post-state.
pub trait ChangeListener {
    fn on_change(&mut self, messages: &[Message]);
}

impl<F> ChangeListener for F
where
    F: FnMut(&[Message]),
{
    fn on_change(&mut self, messages: &[Message]) {
        self(messages)
    }
}

impl<F> NotificationSink for F
where
    F: Fn(&str, Severity),
{
    fn notify(&self, message: &str, severity: Severity) {
        self(message, severity)
    }
}

/// Default sink: routes notices into the tracing log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl NotificationSink for TracingNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Info | Severity::Success => info!(%severity, "{message}"),
            Severity::Warning => warn!("{message}"),
            Severity::Error => error!("{message}"),
        }
    }
}

/// Gate that always answers with a fixed value.
#[derive(Debug, Clone, Copy)]
pub struct FixedConfirm(pub bool);

impl Default for FixedConfirm {
    fn default() -> Self {
        FixedConfirm(true)
    }
}

impl ConfirmGate for FixedConfirm {
    fn confirm(&self, _prompt: &str) -> bool {
        self.0
    }
}
