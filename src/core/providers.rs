use crate::core::builtin_providers::{builtin_providers, ModelDefinition, ProviderDefinition};
use crate::core::config::Config;
use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use tracing::debug;

#[derive(Debug)]
pub struct ProviderResolutionError {
    message: String,
    quick_fixes: Vec<String>,
    exit_code: i32,
}

impl ProviderResolutionError {
    pub fn no_providers() -> Self {
        Self::new(
            "No providers are configured.",
            vec!["Add a [[custom_providers]] entry to config.toml".to_string()],
            2,
        )
    }

    pub fn unknown_provider(provider: &str, known: &[ProviderDefinition]) -> Self {
        let ids: Vec<&str> = known.iter().map(|p| p.id.as_str()).collect();
        Self::new(
            format!("Unknown provider '{provider}'."),
            vec![
                "rpchat providers                # List available providers".to_string(),
                format!("Known providers: {}", ids.join(", ")),
            ],
            2,
        )
    }

    pub fn no_model(provider: &str) -> Self {
        Self::new(
            format!("Provider '{provider}' defines no models and none was requested."),
            vec![format!("rpchat -p {provider} -m <model> ...")],
            2,
        )
    }

    pub fn missing_api_key(provider: &str, env_var: &str) -> Self {
        Self::new(
            format!("No API key found for provider '{provider}': {env_var} is not set."),
            vec![format!("export {env_var}=...")],
            2,
        )
    }

    fn new(message: impl Into<String>, quick_fixes: Vec<String>, exit_code: i32) -> Self {
        Self {
            message: message.into(),
            quick_fixes,
            exit_code,
        }
    }

    pub fn quick_fixes(&self) -> &[String] {
        &self.quick_fixes
    }

    pub fn exit_code(&self) -> i32 {
        self.exit_code
    }
}

impl fmt::Display for ProviderResolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for ProviderResolutionError {}

/// A provider/model pair ready to send requests.
#[derive(Clone)]
pub struct ResolvedProvider {
    pub provider: ProviderDefinition,
    pub model: ModelDefinition,
    pub api_key: String,
}

impl fmt::Debug for ResolvedProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedProvider")
            .field("provider", &self.provider.id)
            .field("model", &self.model.id)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Built-in providers merged with the user's custom ones.
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    providers: Vec<ProviderDefinition>,
    default_provider: Option<String>,
    default_models: HashMap<String, String>,
}

impl ProviderRegistry {
    pub fn builtin() -> Self {
        Self {
            providers: builtin_providers().to_vec(),
            ..Default::default()
        }
    }

    /// A custom provider replaces a built-in one with the same id.
    pub fn from_config(config: &Config) -> Self {
        let mut registry = Self::builtin();
        for custom in &config.custom_providers {
            registry.insert(custom.clone());
        }
        registry.default_provider = config
            .default_provider
            .clone()
            .filter(|p| !p.trim().is_empty());
        registry.default_models = config
            .default_models
            .iter()
            .map(|(provider, model)| (provider.to_lowercase(), model.clone()))
            .collect();
        registry
    }

    pub fn insert(&mut self, provider: ProviderDefinition) {
        match self
            .providers
            .iter_mut()
            .find(|p| p.id.eq_ignore_ascii_case(&provider.id))
        {
            Some(existing) => *existing = provider,
            None => self.providers.push(provider),
        }
    }

    pub fn providers(&self) -> &[ProviderDefinition] {
        &self.providers
    }

    pub fn find(&self, id: &str) -> Option<&ProviderDefinition> {
        self.providers.iter().find(|p| p.id.eq_ignore_ascii_case(id))
    }

    pub fn default_provider(&self) -> Option<&str> {
        self.default_provider.as_deref()
    }

    pub fn default_model(&self, provider: &str) -> Option<&str> {
        self.default_models
            .get(&provider.to_lowercase())
            .map(String::as_str)
    }

    /// Pick a provider and model and read its API key from the environment.
    ///
    /// Provider: explicit, then the configured default, then the first one.
    /// Model: explicit, then the configured default for the provider, then
    /// the provider's first model. Unlisted model ids are accepted as-is.
    pub fn resolve(
        &self,
        provider: Option<&str>,
        model: Option<&str>,
    ) -> Result<ResolvedProvider, ProviderResolutionError> {
        self.resolve_with(provider, model, |var| std::env::var(var).ok())
    }

    pub fn resolve_with<F>(
        &self,
        provider: Option<&str>,
        model: Option<&str>,
        lookup_env: F,
    ) -> Result<ResolvedProvider, ProviderResolutionError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let requested = provider
            .filter(|p| !p.trim().is_empty())
            .or(self.default_provider());

        let definition = match requested {
            Some(id) => self
                .find(id)
                .ok_or_else(|| ProviderResolutionError::unknown_provider(id, &self.providers))?,
            None => self
                .providers
                .first()
                .ok_or_else(ProviderResolutionError::no_providers)?,
        };

        let model_id = model
            .filter(|m| !m.trim().is_empty())
            .or_else(|| self.default_model(&definition.id));

        let model = match model_id {
            Some(id) => definition.find_model(id).cloned().unwrap_or_else(|| {
                debug!(provider = %definition.id, model = id, "model not listed, using defaults");
                ModelDefinition::new(id)
            }),
            None => definition
                .models
                .first()
                .cloned()
                .ok_or_else(|| ProviderResolutionError::no_model(&definition.id))?,
        };

        let env_var = definition.api_key_var();
        let api_key = lookup_env(&env_var)
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ProviderResolutionError::missing_api_key(&definition.id, &env_var))?;

        debug!(provider = %definition.id, model = %model.id, "resolved provider");
        Ok(ResolvedProvider {
            provider: definition.clone(),
            model,
            api_key,
        })
    }
}
