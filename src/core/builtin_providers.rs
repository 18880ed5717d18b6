//! Provider and model definitions
//!
//! Built-in providers are embedded from `builtin_providers.toml` at compile
//! time. Custom providers in the user config share the same definition types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::LazyLock;

pub const DEFAULT_MAX_TOKENS: u32 = 1000;
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Request and response shape a provider speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ApiFormat {
    /// `chat/completions` with bearer authentication.
    #[default]
    Openai,
    /// Native Gemini `generateContent` with the key in the query string.
    GeminiNative,
}

impl ApiFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            ApiFormat::Openai => "openai",
            ApiFormat::GeminiNative => "gemini-native",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDefinition {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default = "default_temperature")]
    pub default_temperature: f64,
    /// Merged verbatim into the request body.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra_fields: Map<String, Value>,
}

fn default_temperature() -> f64 {
    DEFAULT_TEMPERATURE
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

impl ModelDefinition {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: None,
            default_temperature: DEFAULT_TEMPERATURE,
            extra_fields: Map::new(),
        }
    }

    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderDefinition {
    pub id: String,
    pub display_name: String,
    pub endpoint: String,
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,
    #[serde(default)]
    pub api_format: ApiFormat,
    /// Environment variable holding the API key. Defaults to `<ID>_API_KEY`.
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default)]
    pub models: Vec<ModelDefinition>,
}

impl ProviderDefinition {
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            endpoint: endpoint.into(),
            default_max_tokens: DEFAULT_MAX_TOKENS,
            api_format: ApiFormat::Openai,
            api_key_env: None,
            models: Vec::new(),
        }
    }

    pub fn api_key_var(&self) -> String {
        match self.api_key_env.as_deref() {
            Some(name) if !name.trim().is_empty() => name.to_string(),
            _ => {
                let id: String = self
                    .id
                    .chars()
                    .map(|c| {
                        if c.is_ascii_alphanumeric() {
                            c.to_ascii_uppercase()
                        } else {
                            '_'
                        }
                    })
                    .collect();
                format!("{id}_API_KEY")
            }
        }
    }

    /// Find a model by id (exact match first, then case-insensitive).
    pub fn find_model(&self, id: &str) -> Option<&ModelDefinition> {
        self.models
            .iter()
            .find(|m| m.id == id)
            .or_else(|| self.models.iter().find(|m| m.id.eq_ignore_ascii_case(id)))
    }
}

#[derive(Debug, Deserialize)]
struct BuiltinProvidersConfig {
    providers: Vec<ProviderDefinition>,
}

static BUILTIN_PROVIDERS: LazyLock<Vec<ProviderDefinition>> = LazyLock::new(|| {
    const CONFIG_CONTENT: &str = include_str!("../builtin_providers.toml");

    match toml::from_str::<BuiltinProvidersConfig>(CONFIG_CONTENT) {
        Ok(config) => config.providers,
        Err(err) => {
            tracing::error!("builtin_providers.toml is invalid: {err}");
            Vec::new()
        }
    }
});

/// Built-in providers from the embedded configuration
pub fn builtin_providers() -> &'static [ProviderDefinition] {
    &BUILTIN_PROVIDERS
}

/// Find a built-in provider by ID (case-insensitive)
pub fn find_builtin_provider(id: &str) -> Option<&'static ProviderDefinition> {
    builtin_providers()
        .iter()
        .find(|p| p.id.eq_ignore_ascii_case(id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_builtin_providers() {
        let providers = builtin_providers();
        let provider_ids: Vec<&str> = providers.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(
            provider_ids,
            vec!["deepseek", "together", "gemini", "gemini-native"]
        );
    }

    #[test]
    fn test_find_builtin_provider() {
        let provider = find_builtin_provider("DeepSeek").unwrap();
        assert_eq!(provider.id, "deepseek");
        assert_eq!(provider.display_name, "DeepSeek");

        assert!(find_builtin_provider("nonexistent").is_none());
    }

    #[test]
    fn test_provider_properties() {
        for provider in builtin_providers() {
            assert!(!provider.display_name.is_empty());
            assert!(provider.endpoint.starts_with("https://"));
            assert!(!provider.models.is_empty(), "{} has no models", provider.id);
            assert_eq!(provider.default_max_tokens, 1000);
        }
    }

    #[test]
    fn test_api_formats_and_key_vars() {
        let deepseek = find_builtin_provider("deepseek").unwrap();
        assert_eq!(deepseek.api_format, ApiFormat::Openai);
        assert_eq!(deepseek.api_key_var(), "DEEPSEEK_API_KEY");

        let native = find_builtin_provider("gemini-native").unwrap();
        assert_eq!(native.api_format, ApiFormat::GeminiNative);
        assert_eq!(native.api_key_var(), "GEMINI_API_KEY");
        assert!(native.endpoint.contains("{{model}}"));
    }

    #[test]
    fn test_model_defaults_and_extra_fields() {
        let together = find_builtin_provider("together").unwrap();
        let mixtral = together
            .find_model("mistralai/mixtral-8x22b-instruct-v0.1")
            .unwrap();
        assert_eq!(mixtral.default_temperature, 0.8);
        assert!(mixtral.extra_fields.is_empty());

        let native = find_builtin_provider("gemini-native").unwrap();
        let safety = &native.models[0].extra_fields["safetySettings"];
        assert_eq!(safety.as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_derived_key_var_for_custom_ids() {
        let provider = ProviderDefinition::new("my-local.llm", "Local", "http://localhost");
        assert_eq!(provider.api_key_var(), "MY_LOCAL_LLM_API_KEY");
    }
}
