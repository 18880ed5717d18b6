//! Named system prompts a new conversation can start from.

use crate::core::config::Config;
use crate::core::constants::DEFAULT_SYSTEM_PROMPT;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptDefinition {
    pub name: String,
    pub content: String,
}

impl PromptDefinition {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct BuiltinPromptsConfig {
    prompts: Vec<PromptDefinition>,
}

static BUILTIN_PROMPTS: LazyLock<Vec<PromptDefinition>> = LazyLock::new(|| {
    const CONFIG_CONTENT: &str = include_str!("../builtin_prompts.toml");

    match toml::from_str::<BuiltinPromptsConfig>(CONFIG_CONTENT) {
        Ok(config) => config
            .prompts
            .into_iter()
            .map(|p| PromptDefinition::new(p.name, p.content.trim()))
            .collect(),
        Err(err) => {
            tracing::error!("builtin_prompts.toml is invalid: {err}");
            Vec::new()
        }
    }
});

#[derive(Debug, Clone, Default)]
pub struct SystemPromptLibrary {
    prompts: Vec<PromptDefinition>,
}

impl SystemPromptLibrary {
    pub fn builtin() -> Self {
        Self {
            prompts: BUILTIN_PROMPTS.clone(),
        }
    }

    /// Built-in prompts plus the user's. A user prompt replaces a built-in
    /// one of the same name and otherwise is appended in config order.
    pub fn from_config(config: &Config) -> Self {
        let mut library = Self::builtin();
        for prompt in &config.system_prompts {
            library.insert(prompt.clone());
        }
        library
    }

    pub fn insert(&mut self, prompt: PromptDefinition) {
        match self
            .prompts
            .iter_mut()
            .find(|p| p.name.eq_ignore_ascii_case(&prompt.name))
        {
            Some(existing) => *existing = prompt,
            None => self.prompts.push(prompt),
        }
    }

    pub fn get(&self, name: &str) -> Option<&PromptDefinition> {
        self.prompts
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &PromptDefinition> {
        self.prompts.iter()
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }

    /// Prompt text for `name`, falling back to the first prompt in the
    /// library and then to [`DEFAULT_SYSTEM_PROMPT`].
    pub fn resolve(&self, name: Option<&str>) -> &str {
        let named = name.filter(|n| !n.trim().is_empty()).and_then(|n| {
            let found = self.get(n);
            if found.is_none() {
                warn!(prompt = n, "unknown system prompt, using the first available");
            }
            found
        });

        named
            .or_else(|| self.prompts.first())
            .map(|p| p.content.trim())
            .filter(|content| !content.is_empty())
            .unwrap_or(DEFAULT_SYSTEM_PROMPT)
    }
}
