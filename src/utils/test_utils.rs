use crate::core::conversation::ConversationManager;
use crate::core::message::{Role, Speaker};
use std::collections::HashMap;
use std::ffi::OsString;
use std::sync::{Mutex, MutexGuard};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Serializes environment mutation across tests and restores every touched
/// variable on drop.
pub struct TestEnvVarGuard {
    saved: HashMap<String, Option<OsString>>,
    _lock: MutexGuard<'static, ()>,
}

impl TestEnvVarGuard {
    pub fn new() -> Self {
        let lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        Self {
            saved: HashMap::new(),
            _lock: lock,
        }
    }

    fn remember(&mut self, key: &str) {
        self.saved
            .entry(key.to_string())
            .or_insert_with(|| std::env::var_os(key));
    }

    pub fn set_var(&mut self, key: &str, value: &str) {
        self.remember(key);
        std::env::set_var(key, value);
    }

    pub fn remove_var(&mut self, key: &str) {
        self.remember(key);
        std::env::remove_var(key);
    }
}

impl Drop for TestEnvVarGuard {
    fn drop(&mut self) {
        for (key, value) in self.saved.drain() {
            match value {
                Some(value) => std::env::set_var(&key, value),
                None => std::env::remove_var(&key),
            }
        }
    }
}

/// A short three-character tavern scene used across tests and the bench.
pub fn create_test_scene() -> ConversationManager {
    let mut manager = ConversationManager::new("You narrate a tavern scene.");
    let lines: [(Role, &str, Speaker); 5] = [
        (Role::User, "The door creaks open.", Speaker::default()),
        (Role::Assistant, "Bram looks up.", Speaker::public(1)),
        (Role::Assistant, "Iska keeps polishing glasses.", Speaker::public(2)),
        (Role::Assistant, "Bram wonders who it is.", Speaker::private(1)),
        (Role::Assistant, "Iska recognizes the stranger.", Speaker::private(3)),
    ];
    for (role, content, speaker) in lines {
        if let Err(err) = manager.append_message_as(role, content, speaker) {
            panic!("scene setup failed: {err}");
        }
    }
    manager
}
