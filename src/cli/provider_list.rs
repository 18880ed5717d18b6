use std::error::Error;

use crate::core::config::Config;
use crate::core::providers::ProviderRegistry;

pub fn list_providers() -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;
    let registry = ProviderRegistry::from_config(&config);
    print!(
        "{}",
        format_provider_table(&registry, |var| std::env::var(var)
            .is_ok_and(|key| !key.trim().is_empty()))
    );
    Ok(())
}

/// Markdown table of every provider, its endpoint and whether its API key
/// variable is set. The default provider is starred.
pub fn format_provider_table<F>(registry: &ProviderRegistry, key_is_set: F) -> String
where
    F: Fn(&str) -> bool,
{
    if registry.providers().is_empty() {
        return "No providers configured.\n".to_string();
    }

    let default_provider = registry.default_provider();
    let mut content = String::from("Available Providers:\n\n");
    content.push_str("| Provider | Display Name | Format | API Key | Default Model |\n");
    content.push_str("|---|---|---|:---:|---|\n");

    for provider in registry.providers() {
        let env_var = provider.api_key_var();
        let key_status = if key_is_set(&env_var) { "✅" } else { "❌" };
        let id = if default_provider.is_some_and(|d| d.eq_ignore_ascii_case(&provider.id)) {
            format!("{}*", provider.id)
        } else {
            provider.id.clone()
        };
        let model = registry
            .default_model(&provider.id)
            .or_else(|| provider.models.first().map(|m| m.id.as_str()))
            .unwrap_or("-");

        content.push_str(&format!(
            "| {} | {} | {} | {} {} | {} |\n",
            id,
            provider.display_name,
            provider.api_format.as_str(),
            key_status,
            env_var,
            model
        ));
    }

    if default_provider.is_some() {
        content.push_str("\n* = default provider\n");
    }
    content
}
