use crate::core::builtin_providers::ProviderDefinition;
use crate::core::system_prompts::PromptDefinition;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct Config {
    pub default_provider: Option<String>,
    /// Sampling temperature; overrides the model's default when set.
    pub temperature: Option<f64>,
    /// Response token cap; overrides the provider's default when set.
    pub max_tokens: Option<u32>,
    pub request_timeout_secs: Option<u64>,
    /// Name of the system prompt (from the prompt library) for new chats.
    pub system_prompt: Option<String>,
    /// Conversation file `say` continues from when `--session` is not given.
    pub session_file: Option<PathBuf>,
    /// Provider id (lowercase) to model id
    #[serde(default)]
    pub default_models: HashMap<String, String>,
    #[serde(default)]
    pub custom_providers: Vec<ProviderDefinition>,
    #[serde(default)]
    pub system_prompts: Vec<PromptDefinition>,
}

/// Get a user-friendly display string for a path
/// Converts absolute paths to use ~ notation on Unix-like systems when possible
///
/// # Examples
/// - Unix: `/home/user/.config/rpchat/config.toml` → `~/.config/rpchat/config.toml`
/// - macOS: `/Users/user/Library/Application Support/...` → `~/Library/Application Support/...`
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}

impl Config {
    pub fn get_custom_provider(&self, id: &str) -> Option<&ProviderDefinition> {
        self.custom_providers
            .iter()
            .find(|p| p.id.eq_ignore_ascii_case(id))
    }

    pub fn get_default_model(&self, provider: &str) -> Option<&String> {
        let normalized = provider.to_lowercase();
        self.default_models
            .get(&normalized)
            .or_else(|| self.default_models.get(provider))
    }

    pub fn set_default_model(&mut self, provider: String, model: String) {
        let normalized = provider.to_lowercase();
        self.default_models.insert(normalized.clone(), model);
        if normalized != provider {
            self.default_models.remove(&provider);
        }
    }

    pub fn get_system_prompt(&self, name: &str) -> Option<&PromptDefinition> {
        self.system_prompts
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }
}
