use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Role of a conversation turn. The set is closed; anything else is rejected
/// at construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Role {
    System,
    User,
    Assistant,
    /// Locally generated notice (e.g. a failed provider call). Never sent to a
    /// provider.
    App,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::App => "app",
        }
    }

    /// Role name as understood by completion providers, or `None` for
    /// messages that stay local.
    pub fn to_api_role(self) -> Option<&'static str> {
        match self {
            Role::App => None,
            other => Some(other.as_str()),
        }
    }

    pub fn is_system(self) -> bool {
        self == Role::System
    }

    pub fn is_user(self) -> bool {
        self == Role::User
    }

    pub fn is_assistant(self) -> bool {
        self == Role::Assistant
    }

    pub fn is_app(self) -> bool {
        self == Role::App
    }

    pub fn label(self) -> &'static str {
        match self {
            Role::System => "System",
            Role::User => "User",
            Role::Assistant => "Assistant",
            Role::App => "App",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for Role {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl PartialEq<&str> for Role {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl TryFrom<&str> for Role {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "system" => Ok(Role::System),
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            "app" => Ok(Role::App),
            _ => Err(format!(
                "invalid role \"{value}\": must be one of system, user, assistant, app"
            )),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

impl From<Role> for String {
    fn from(value: Role) -> Self {
        value.as_str().to_string()
    }
}

/// Whether characters other than the author can see a message.
///
/// Serialized as `1` (public) / `0` (private).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Visibility {
    Private,
    #[default]
    Public,
}

impl Visibility {
    pub fn is_public(self) -> bool {
        self == Visibility::Public
    }
}

impl TryFrom<u8> for Visibility {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Visibility::Private),
            1 => Ok(Visibility::Public),
            _ => Err(format!("invalid visibility {value}: must be 0 or 1")),
        }
    }
}

impl From<Visibility> for u8 {
    fn from(value: Visibility) -> Self {
        match value {
            Visibility::Private => 0,
            Visibility::Public => 1,
        }
    }
}

/// Character id meaning "global / all characters".
pub const GLOBAL_CHARACTER: u32 = 0;

/// Author tag for multi-character scenes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Speaker {
    pub character_id: u32,
    pub visibility: Visibility,
}

impl Speaker {
    pub fn new(character_id: u32, visibility: Visibility) -> Self {
        Self {
            character_id,
            visibility,
        }
    }

    pub fn public(character_id: u32) -> Self {
        Self::new(character_id, Visibility::Public)
    }

    pub fn private(character_id: u32) -> Self {
        Self::new(character_id, Visibility::Private)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageId(Uuid);

impl MessageId {
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One turn of the conversation.
#[derive(Debug, Clone)]
pub struct Message {
    id: MessageId,
    pub role: Role,
    pub content: String,
    pub character_id: u32,
    pub visibility: Visibility,
    /// Content captured when editing started; `Some` while editing.
    edit_snapshot: Option<String>,
}

impl PartialEq for Message {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Message {}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self::with_speaker(role, content, Speaker::default())
    }

    pub fn with_speaker(role: Role, content: impl Into<String>, speaker: Speaker) -> Self {
        Self {
            id: MessageId::generate(),
            role,
            content: content.into(),
            character_id: speaker.character_id,
            visibility: speaker.visibility,
            edit_snapshot: None,
        }
    }

    /// Build a message from an untyped role name.
    pub fn try_new(role: &str, content: impl Into<String>) -> Result<Self, String> {
        let role = Role::try_from(role)?;
        Ok(Self::new(role, content))
    }

    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn speaker(&self) -> Speaker {
        Speaker::new(self.character_id, self.visibility)
    }

    /// Empty `user` message waiting for the next human turn.
    pub fn is_placeholder(&self) -> bool {
        self.role.is_user() && self.content.is_empty()
    }

    pub fn is_editing(&self) -> bool {
        self.edit_snapshot.is_some()
    }

    /// `idle -> editing`. Returns `false` if an edit is already in progress.
    pub fn begin_edit(&mut self) -> bool {
        if self.is_editing() {
            return false;
        }
        self.edit_snapshot = Some(self.content.trim().to_string());
        true
    }

    /// `editing -> idle`, keeping the edited text. No-op while idle.
    pub fn commit_edit(&mut self, edited: &str) -> bool {
        if self.edit_snapshot.take().is_none() {
            return false;
        }
        self.content = edited.trim().to_string();
        true
    }

    /// `editing -> idle`, restoring the snapshot. No-op while idle.
    pub fn rollback_edit(&mut self) -> bool {
        match self.edit_snapshot.take() {
            Some(snapshot) => {
                self.content = snapshot;
                true
            }
            None => false,
        }
    }
}

/// Severity attached to user-facing notices.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
