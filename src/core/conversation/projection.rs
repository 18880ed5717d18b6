//! Per-character view of a multi-character scene.
//!
//! Each character only sees what it is entitled to: its own lines as
//! `assistant`, other characters' public lines as `user`, and its own private
//! notes as `system` context. Other characters' private lines are dropped.

use crate::api::ChatMessage;
use crate::core::message::{Message, Role, Visibility, GLOBAL_CHARACTER};

pub(crate) fn project<'a, I>(messages: I, target: u32) -> Vec<ChatMessage>
where
    I: IntoIterator<Item = &'a Message>,
{
    messages
        .into_iter()
        .filter_map(|message| {
            projected_role(message, target).map(|role| ChatMessage::new(role, &message.content))
        })
        .collect()
}

fn projected_role(message: &Message, target: u32) -> Option<Role> {
    let author = message.character_id;
    let own = author == target || author == GLOBAL_CHARACTER;

    match message.role {
        Role::App => None,
        Role::System => Some(Role::System),
        Role::User => {
            if own || message.visibility.is_public() {
                Some(Role::User)
            } else {
                None
            }
        }
        Role::Assistant => match (own, message.visibility) {
            (true, Visibility::Public) => Some(Role::Assistant),
            (true, Visibility::Private) => Some(Role::System),
            (false, Visibility::Public) => Some(Role::User),
            (false, Visibility::Private) => None,
        },
    }
}
