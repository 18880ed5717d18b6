use super::data::{path_display, Config};
use super::io::ConfigError;
use crate::core::builtin_providers::{ApiFormat, ModelDefinition, ProviderDefinition};
use crate::core::system_prompts::PromptDefinition;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_load_nonexistent_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("nonexistent_config.toml");

    let config = Config::load_from_path(&config_path).expect("Failed to load config");

    assert_eq!(config, Config::default());
}

#[test]
fn test_config_persistence_lifecycle() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("nested").join("config.toml");

    // Phase 1: Initial save and load (parent directory is created)
    let config = Config {
        default_provider: Some("deepseek".to_string()),
        temperature: Some(0.9),
        max_tokens: Some(512),
        system_prompt: Some("third-person".to_string()),
        ..Default::default()
    };
    config
        .save_to_path(&config_path)
        .expect("Failed to save config");
    let loaded = Config::load_from_path(&config_path).expect("Failed to load config");
    assert_eq!(loaded, config);

    // Phase 2: Modify and verify persistence of changes
    let mut config = loaded;
    config.set_default_model("DeepSeek".to_string(), "deepseek-reasoner".to_string());
    config.temperature = None;
    config
        .save_to_path(&config_path)
        .expect("Failed to save config");

    let reloaded = Config::load_from_path(&config_path).expect("Failed to load config");
    assert_eq!(reloaded.temperature, None);
    assert_eq!(
        reloaded.get_default_model("deepseek").map(String::as_str),
        Some("deepseek-reasoner")
    );
}

#[test]
fn test_parse_full_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(
        &config_path,
        r#"
default_provider = "local"
request_timeout_secs = 30
session_file = "/tmp/tavern.json"

[default_models]
local = "llama3"

[[custom_providers]]
id = "local"
display_name = "Local Ollama"
endpoint = "http://localhost:11434/v1/chat/completions"

[[custom_providers.models]]
id = "llama3"
default_temperature = 0.4

[[system_prompts]]
name = "pirate"
content = "Speak like a pirate."
"#,
    )
    .unwrap();

    let config = Config::load_from_path(&config_path).expect("Failed to load config");
    assert_eq!(config.request_timeout_secs, Some(30));
    assert_eq!(config.session_file, Some(PathBuf::from("/tmp/tavern.json")));

    let local = config.get_custom_provider("LOCAL").unwrap();
    assert_eq!(local.api_format, ApiFormat::Openai);
    assert_eq!(local.default_max_tokens, 1000);
    assert_eq!(local.api_key_var(), "LOCAL_API_KEY");
    assert_eq!(local.models[0].default_temperature, 0.4);
    assert_eq!(local.models[0].display_name(), "llama3");

    assert_eq!(
        config.get_system_prompt("Pirate").unwrap().content,
        "Speak like a pirate."
    );
}

#[test]
fn test_custom_provider_round_trip() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("config.toml");

    let mut provider = ProviderDefinition::new(
        "proxy",
        "Proxy",
        "https://proxy.example/models/{{model}}:generateContent",
    );
    provider.api_format = ApiFormat::GeminiNative;
    provider.models.push(ModelDefinition::new("gemini-pro"));

    let config = Config {
        custom_providers: vec![provider.clone()],
        system_prompts: vec![PromptDefinition::new("terse", "Be terse.")],
        ..Default::default()
    };
    config.save_to_path(&config_path).unwrap();

    let loaded = Config::load_from_path(&config_path).unwrap();
    assert_eq!(loaded.custom_providers, vec![provider]);
    assert_eq!(loaded.system_prompts.len(), 1);
}

#[test]
fn test_invalid_toml_reports_parse_error() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(&config_path, "default_provider = [unterminated").unwrap();

    let err = Config::load_from_path(&config_path).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().starts_with("Failed to parse config at"));
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn test_unreadable_path_reports_read_error() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    // A directory exists at the path but cannot be read as a file.
    let err = Config::load_from_path(temp_dir.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
}

#[test]
fn test_default_model_lookup_is_case_insensitive() {
    let mut config = Config::default();
    config.set_default_model("Together".to_string(), "m".to_string());
    assert!(config.default_models.contains_key("together"));
    assert_eq!(config.get_default_model("TOGETHER").map(String::as_str), Some("m"));
}

#[cfg(unix)]
#[test]
fn test_path_display_uses_tilde_under_home() {
    use crate::utils::test_utils::TestEnvVarGuard;

    let mut guard = TestEnvVarGuard::new();
    guard.set_var("HOME", "/home/tester");
    assert_eq!(
        path_display("/home/tester/.config/rpchat/config.toml"),
        "~/.config/rpchat/config.toml"
    );
    assert_eq!(path_display("/etc/rpchat.toml"), "/etc/rpchat.toml");
}
