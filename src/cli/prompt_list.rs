use std::error::Error;

use crate::core::config::Config;
use crate::core::system_prompts::SystemPromptLibrary;

pub fn list_prompts() -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;
    let library = SystemPromptLibrary::from_config(&config);
    print!(
        "{}",
        format_prompt_list(&library, config.system_prompt.as_deref())
    );
    Ok(())
}

/// One line per prompt: its name and the first line of its text.
pub fn format_prompt_list(library: &SystemPromptLibrary, selected: Option<&str>) -> String {
    if library.is_empty() {
        return "No system prompts available.\n".to_string();
    }

    let selected = selected
        .and_then(|name| library.get(name))
        .or_else(|| library.iter().next())
        .map(|prompt| prompt.name.as_str());

    let mut content = String::from("System Prompts:\n\n");
    for prompt in library.iter() {
        let marker = if selected == Some(prompt.name.as_str()) {
            "*"
        } else {
            " "
        };
        let first_line = prompt.content.trim().lines().next().unwrap_or("");
        content.push_str(&format!("{marker} {:<16} {first_line}\n", prompt.name));
    }
    content.push_str("\n* = used for new chats\n");
    content
}
