//! Commands that read saved conversations: `extract`, `check` and `export`.

use std::collections::BTreeSet;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};

use crate::cli::print_notice;
use crate::core::config::path_display;
use crate::core::conversation::ConversationManager;
use crate::core::markdown::{extract_file_name, extract_markdown, ExtractOptions};
use crate::core::message::{Role, Severity, Visibility, GLOBAL_CHARACTER};
use crate::core::persistence::{export_file_name, JsonFileStore, PersistenceAdapter};

/// Read and validate a saved conversation. Failures come back as the error
/// only, so notices are discarded.
pub fn load_conversation(path: &Path) -> Result<ConversationManager, Box<dyn Error>> {
    let payload = fs::read_to_string(path)
        .map_err(|err| format!("Failed to read {}: {}", path_display(path), err))?;
    let mut conversation =
        ConversationManager::default().with_notifier(|_: &str, _: Severity| {});
    conversation.import_json(&payload)?;
    Ok(conversation)
}

/// Where `extract -o` writes: nowhere (stdout) without the flag, the given
/// file, or a dated name for a bare `-o`.
pub fn extract_target(output: Option<Option<PathBuf>>, today: NaiveDate) -> Option<PathBuf> {
    output.map(|target| target.unwrap_or_else(|| PathBuf::from(extract_file_name(today))))
}

pub fn run_extract(
    path: &Path,
    options: &ExtractOptions,
    output: Option<Option<PathBuf>>,
) -> Result<(), Box<dyn Error>> {
    let conversation = load_conversation(path)?;
    let markdown = extract_markdown(&conversation.to_records(), options);

    match extract_target(output, Local::now().date_naive()) {
        None => print!("{markdown}"),
        Some(target) => {
            fs::write(&target, markdown)?;
            print_notice(
                &format!("Markdown saved to {}", path_display(&target)),
                Severity::Success,
            );
        }
    }
    Ok(())
}

pub fn run_check(path: &Path) -> Result<(), Box<dyn Error>> {
    let conversation = load_conversation(path)?;
    println!("{}", summarize(&conversation));
    Ok(())
}

pub fn run_export(path: &Path, output: Option<PathBuf>) -> Result<(), Box<dyn Error>> {
    let conversation = load_conversation(path)?;
    let target =
        output.unwrap_or_else(|| PathBuf::from(export_file_name(Local::now().date_naive())));
    JsonFileStore::new(&target).save(&conversation.to_records())?;
    print_notice(
        &format!("Chat exported to {}", path_display(&target)),
        Severity::Success,
    );
    Ok(())
}

/// Message counts, characters and the opening of the system prompt.
pub fn summarize(conversation: &ConversationManager) -> String {
    let records = conversation.to_records();
    let count = |role: Role| records.iter().filter(|r| r.role == role.as_str()).count();
    let characters: BTreeSet<u32> = records
        .iter()
        .map(|r| r.character_id)
        .filter(|id| *id != GLOBAL_CHARACTER)
        .collect();
    let private = records
        .iter()
        .filter(|r| r.visibility == Visibility::Private)
        .count();

    let prompt = conversation.current_system_prompt_text();
    let preview: String = prompt.chars().take(60).collect();
    let ellipsis = if prompt.chars().count() > 60 { "…" } else { "" };

    let mut summary = format!(
        "{} messages: {} user, {} assistant, {} app\n",
        records.len(),
        count(Role::User),
        count(Role::Assistant),
        count(Role::App)
    );
    if characters.is_empty() {
        summary.push_str("Characters: none\n");
    } else {
        let ids: Vec<String> = characters.iter().map(u32::to_string).collect();
        summary.push_str(&format!(
            "Characters: {} ({} private messages)\n",
            ids.join(", "),
            private
        ));
    }
    summary.push_str(&format!("System prompt: {preview}{ellipsis}"));
    summary
}
