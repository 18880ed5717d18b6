//! Saving and loading conversations as JSON.

use crate::core::conversation::import::records_from;
use crate::core::conversation::{ChangeListener, MessageRecord};
use crate::core::message::Message;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// On-disk export format. `ConversationManager::import_json` reads it back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatExport {
    pub messages: Vec<MessageRecord>,
    pub export_date: DateTime<Utc>,
}

impl ChatExport {
    pub fn new(messages: Vec<MessageRecord>) -> Self {
        Self {
            messages,
            export_date: Utc::now(),
        }
    }
}

#[derive(Debug)]
pub enum PersistenceError {
    Io { path: PathBuf, source: io::Error },
    Serialize(serde_json::Error),
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistenceError::Io { path, source } => {
                write!(f, "Failed to access {}: {}", path.display(), source)
            }
            PersistenceError::Serialize(err) => write!(f, "Failed to serialize chat: {err}"),
        }
    }
}

impl Error for PersistenceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PersistenceError::Io { source, .. } => Some(source),
            PersistenceError::Serialize(err) => Some(err),
        }
    }
}

/// Durable storage for one conversation.
pub trait PersistenceAdapter {
    fn save(&self, records: &[MessageRecord]) -> Result<(), PersistenceError>;

    /// Raw payload for `import_json`, or `None` when nothing has been saved.
    fn load(&self) -> Result<Option<String>, PersistenceError>;
}

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> PersistenceError {
        PersistenceError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl PersistenceAdapter for JsonFileStore {
    fn save(&self, records: &[MessageRecord]) -> Result<(), PersistenceError> {
        let export = ChatExport::new(records.to_vec());
        let contents =
            serde_json::to_string_pretty(&export).map_err(PersistenceError::Serialize)?;

        let parent = self.path.parent().filter(|dir| !dir.as_os_str().is_empty());
        if let Some(dir) = parent {
            fs::create_dir_all(dir).map_err(|err| self.io_error(err))?;
        }

        let mut temp_file = match parent {
            Some(dir) => NamedTempFile::new_in(dir),
            None => NamedTempFile::new(),
        }
        .map_err(|err| self.io_error(err))?;

        temp_file
            .write_all(contents.as_bytes())
            .and_then(|_| temp_file.as_file_mut().sync_all())
            .map_err(|err| self.io_error(err))?;
        temp_file
            .persist(&self.path)
            .map_err(|err| self.io_error(err.error))?;

        debug!(path = %self.path.display(), count = records.len(), "saved conversation");
        Ok(())
    }

    fn load(&self) -> Result<Option<String>, PersistenceError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(self.io_error(err)),
        }
    }
}

/// Change listener that writes every post-mutation state to `store`.
/// Failures are logged and never reach the conversation.
pub struct AutoSave<P> {
    store: P,
}

pub fn autosave<P: PersistenceAdapter>(store: P) -> AutoSave<P> {
    AutoSave { store }
}

impl<P: PersistenceAdapter> ChangeListener for AutoSave<P> {
    fn on_change(&mut self, messages: &[Message]) {
        if let Err(err) = self.store.save(&records_from(messages)) {
            warn!("autosave failed: {err}");
        }
    }
}

/// Default file name for a JSON export made on `date`.
pub fn export_file_name(date: NaiveDate) -> String {
    format!("rpchat-export-{date}.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::conversation::ConversationManager;
    use crate::core::message::{Role, Speaker};
    use tempfile::TempDir;

    #[test]
    fn save_then_load_round_trips_through_import() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(temp_dir.path().join("chats").join("tavern.json"));

        let mut original = ConversationManager::new("Narrate.");
        original.append_message(Role::User, "Hello").unwrap();
        original
            .append_message_as(Role::Assistant, "A secret.", Speaker::private(2))
            .unwrap();
        store.save(&original.to_records()).unwrap();

        let payload = store.load().unwrap().unwrap();
        let export: ChatExport = serde_json::from_str(&payload).unwrap();
        assert_eq!(export.messages, original.to_records());
        assert!(payload.contains("\"exportDate\""));

        let mut restored = ConversationManager::default();
        restored.import_json(&payload).unwrap();
        assert_eq!(restored.to_records(), original.to_records());
    }

    #[test]
    fn load_missing_file_is_none() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(temp_dir.path().join("absent.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn load_directory_is_an_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(temp_dir.path());
        assert!(matches!(store.load(), Err(PersistenceError::Io { .. })));
    }

    #[test]
    fn autosave_persists_every_change() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("auto.json");
        let mut manager = ConversationManager::new("Narrate.")
            .with_change_listener(autosave(JsonFileStore::new(&path)));

        manager.append_message(Role::User, "First").unwrap();
        let saved: ChatExport =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved.messages.len(), 2);

        manager.append_message(Role::Assistant, "Reply").unwrap();
        let saved: ChatExport =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved.messages.len(), 3);
        assert_eq!(saved.messages[2], MessageRecord::new(Role::Assistant, "Reply"));
    }

    #[test]
    fn export_file_name_uses_iso_date() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        assert_eq!(export_file_name(date), "rpchat-export-2025-03-07.json");
    }
}
