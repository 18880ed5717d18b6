use std::error::Error;

use crate::cli::exit_with_provider_error;
use crate::core::config::{path_display, Config};
use crate::core::providers::{ProviderRegistry, ProviderResolutionError};

pub fn run_set_default(provider: &str, model: &str) -> Result<(), Box<dyn Error>> {
    let mut config = Config::load()?;
    let registry = ProviderRegistry::from_config(&config);

    let summary = match apply_default(&mut config, &registry, provider, model) {
        Ok(summary) => summary,
        Err(err) => exit_with_provider_error(&err),
    };

    config.save()?;
    println!("✅ {summary}");
    if let Ok(path) = Config::get_config_path() {
        println!("   Saved to {}", path_display(path));
    }
    Ok(())
}

/// Record `provider` (and `model`, when not blank) as the defaults. The
/// provider id is stored as the registry spells it.
pub fn apply_default(
    config: &mut Config,
    registry: &ProviderRegistry,
    provider: &str,
    model: &str,
) -> Result<String, ProviderResolutionError> {
    let definition = registry
        .find(provider)
        .ok_or_else(|| ProviderResolutionError::unknown_provider(provider, registry.providers()))?;
    let id = definition.id.clone();
    config.default_provider = Some(id.clone());

    let model = model.trim();
    if model.is_empty() {
        return Ok(format!("Set default provider to: {id}"));
    }

    config.set_default_model(id.clone(), model.to_string());
    Ok(format!("Set default provider to: {id} (model: {model})"))
}
