use super::*;
use crate::cli::history::{extract_target, load_conversation, summarize};
use crate::cli::prompt_list::format_prompt_list;
use crate::cli::provider_list::format_provider_table;
use crate::cli::say::open_conversation;
use crate::cli::set_default::apply_default;
use crate::core::builtin_providers::ProviderDefinition;
use crate::core::config::Config;
use crate::core::message::Role;
use crate::core::persistence::ChatExport;
use crate::core::providers::ProviderRegistry;
use crate::core::system_prompts::{PromptDefinition, SystemPromptLibrary};
use crate::utils::test_utils::create_test_scene;
use chrono::NaiveDate;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

mod test_helpers {
    use super::*;

    pub(super) fn parse_args(argv: &[&str]) -> Args {
        Args::try_parse_from(argv)
            .unwrap_or_else(|err| panic!("argv={argv:?} should parse successfully: {err}"))
    }

    pub(super) fn write_chat(dir: &Path, name: &str, payload: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, payload).expect("write chat file");
        path
    }
}

use test_helpers::{parse_args, write_chat};

#[test]
fn test_say_collects_trailing_words() {
    let args = parse_args(&["rpchat", "say", "hello", "there", "-friend"]);
    match args.command {
        Commands::Say {
            text,
            session,
            character,
            private,
        } => {
            assert_eq!(text.join(" "), "hello there -friend");
            assert_eq!(session, None);
            assert_eq!(character, None);
            assert!(!private);
        }
        _ => panic!("expected say subcommand"),
    }
}

#[test]
fn test_say_character_flags() {
    let args = parse_args(&[
        "rpchat",
        "say",
        "--session",
        "tavern.json",
        "-c",
        "2",
        "--private",
        "Iska",
        "whispers",
    ]);
    match args.command {
        Commands::Say {
            text,
            session,
            character,
            private,
        } => {
            assert_eq!(text, vec!["Iska", "whispers"]);
            assert_eq!(session, Some(PathBuf::from("tavern.json")));
            assert_eq!(character, Some(2));
            assert!(private);
        }
        _ => panic!("expected say subcommand"),
    }
}

#[test]
fn test_private_requires_character() {
    assert!(Args::try_parse_from(["rpchat", "say", "--private", "hi"]).is_err());
    assert!(Args::try_parse_from(["rpchat", "say"]).is_err());
}

#[test]
fn test_global_flags_after_subcommand() {
    let args = parse_args(&[
        "rpchat",
        "say",
        "-p",
        "gemini-native",
        "-m",
        "gemini-2.0-flash",
        "-t",
        "0.3",
        "-v",
        "--log",
        "rpchat.log",
        "hi",
    ]);
    assert_eq!(args.provider.as_deref(), Some("gemini-native"));
    assert_eq!(args.model.as_deref(), Some("gemini-2.0-flash"));
    assert_eq!(args.temperature, Some(0.3));
    assert!(args.verbose);
    assert_eq!(args.log, Some(PathBuf::from("rpchat.log")));
}

#[test]
fn test_extract_flags() {
    let args = parse_args(&[
        "rpchat",
        "extract",
        "chat.json",
        "--no-user",
        "--system",
        "--labels",
        "-o",
    ]);
    match args.command {
        Commands::Extract {
            file,
            no_assistant,
            no_user,
            system,
            labels,
            output,
        } => {
            assert_eq!(file, PathBuf::from("chat.json"));
            assert!(!no_assistant);
            assert!(no_user);
            assert!(system);
            assert!(labels);
            assert_eq!(output, Some(None));
        }
        _ => panic!("expected extract subcommand"),
    }
}

fn extract_output(argv: &[&str]) -> Option<Option<PathBuf>> {
    match parse_args(argv).command {
        Commands::Extract { output, .. } => output,
        _ => panic!("expected extract subcommand"),
    }
}

#[test]
fn test_extract_output_targets() {
    let today = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();

    let none = extract_output(&["rpchat", "extract", "chat.json"]);
    assert_eq!(extract_target(none, today), None);

    let bare = extract_output(&["rpchat", "extract", "chat.json", "-o"]);
    assert_eq!(
        extract_target(bare, today),
        Some(PathBuf::from("rpchat-extract-2024-03-09.md"))
    );

    let named = extract_output(&["rpchat", "extract", "-o", "scene.md", "chat.json"]);
    assert_eq!(extract_target(named, today), Some(PathBuf::from("scene.md")));
}

#[test]
fn test_set_default_parsing() {
    let args = parse_args(&["rpchat", "set-default", "deepseek", "deepseek-chat"]);
    match args.command {
        Commands::SetDefault { provider, model } => {
            assert_eq!(provider, "deepseek");
            assert_eq!(model.join(" "), "deepseek-chat");
        }
        _ => panic!("expected set-default subcommand"),
    }
}

#[test]
fn test_provider_table_marks_default_and_keys() {
    let config = Config {
        default_provider: Some("together".to_string()),
        ..Default::default()
    };
    let registry = ProviderRegistry::from_config(&config);
    let table = format_provider_table(&registry, |var| var == "TOGETHER_API_KEY");

    let together = table
        .lines()
        .find(|line| line.starts_with("| together*"))
        .expect("together row is starred");
    assert!(together.contains("✅ TOGETHER_API_KEY"));

    let deepseek = table
        .lines()
        .find(|line| line.starts_with("| deepseek "))
        .expect("deepseek row");
    assert!(deepseek.contains("❌ DEEPSEEK_API_KEY"));
    assert!(table.contains("gemini-native"));
    assert!(table.ends_with("* = default provider\n"));
}

#[test]
fn test_provider_table_shows_custom_provider() {
    let mut local = ProviderDefinition::new(
        "local",
        "Local Ollama",
        "http://localhost:11434/v1/chat/completions",
    );
    local.models.clear();
    let config = Config {
        custom_providers: vec![local],
        ..Default::default()
    };
    let registry = ProviderRegistry::from_config(&config);
    let table = format_provider_table(&registry, |_| false);

    let row = table
        .lines()
        .find(|line| line.starts_with("| local "))
        .expect("local row");
    assert!(row.contains("Local Ollama"));
    assert!(row.contains("LOCAL_API_KEY"));
    assert!(row.ends_with("| - |"));
    assert!(!table.contains("default provider"));
}

#[test]
fn test_prompt_list_marks_selected() {
    let mut library = SystemPromptLibrary::builtin();
    library.insert(PromptDefinition::new("pirate", "Speak like a pirate.\nAlways."));

    let listing = format_prompt_list(&library, Some("PIRATE"));
    let pirate = listing
        .lines()
        .find(|line| line.contains("pirate"))
        .expect("pirate line");
    assert!(pirate.starts_with("* "));
    assert!(pirate.ends_with("Speak like a pirate."));
    let marked = listing
        .lines()
        .filter(|l| l.starts_with("* ") && !l.starts_with("* ="))
        .count();
    assert_eq!(marked, 1);
}

#[test]
fn test_prompt_list_defaults_to_first() {
    let library = SystemPromptLibrary::builtin();
    let listing = format_prompt_list(&library, None);
    let first = library.iter().next().expect("builtin prompts");
    let marked = listing
        .lines()
        .find(|l| l.starts_with("* "))
        .expect("a marked prompt");
    assert!(marked.contains(&first.name));
}

#[test]
fn test_apply_default_uses_registry_spelling() {
    let mut config = Config::default();
    let registry = ProviderRegistry::from_config(&config);

    let summary = apply_default(&mut config, &registry, "DeepSeek", " deepseek-chat ").unwrap();
    assert_eq!(summary, "Set default provider to: deepseek (model: deepseek-chat)");
    assert_eq!(config.default_provider.as_deref(), Some("deepseek"));
    assert_eq!(
        config.get_default_model("deepseek").map(String::as_str),
        Some("deepseek-chat")
    );
}

#[test]
fn test_apply_default_rejects_unknown_provider() {
    let mut config = Config::default();
    let registry = ProviderRegistry::from_config(&config);

    let err = apply_default(&mut config, &registry, "nope", "").unwrap_err();
    assert_eq!(err.exit_code(), 2);
    assert_eq!(config, Config::default());
}

#[test]
fn test_check_summary_of_scene() {
    let temp_dir = TempDir::new().unwrap();
    let scene = create_test_scene();
    let payload = serde_json::to_string(&ChatExport::new(scene.to_records())).unwrap();
    let path = write_chat(temp_dir.path(), "scene.json", &payload);

    let conversation = load_conversation(&path).unwrap();
    assert_eq!(
        summarize(&conversation),
        "6 messages: 1 user, 4 assistant, 0 app\n\
         Characters: 1, 2, 3 (2 private messages)\n\
         System prompt: You narrate a tavern scene."
    );
}

#[test]
fn test_check_accepts_legacy_array_and_truncates_prompt() {
    let temp_dir = TempDir::new().unwrap();
    let long_prompt = "x".repeat(80);
    let payload = format!(
        r#"[{{"role":"system","content":"{long_prompt}"}},{{"role":"user","content":"hi"}}]"#
    );
    let path = write_chat(temp_dir.path(), "legacy.json", &payload);

    let summary = summarize(&load_conversation(&path).unwrap());
    assert!(summary.starts_with("2 messages: 1 user, 0 assistant, 0 app\nCharacters: none\n"));
    assert!(summary.ends_with(&format!("{}…", "x".repeat(60))));
}

#[test]
fn test_load_conversation_reports_bad_files() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("missing.json");
    let err = load_conversation(&missing).unwrap_err();
    assert!(err.to_string().starts_with("Failed to read"));

    let broken = write_chat(temp_dir.path(), "broken.json", "{not json");
    let err = load_conversation(&broken).unwrap_err();
    assert!(err.to_string().starts_with("Failed to load chat history"));
}

#[test]
fn test_open_conversation_continues_and_autosaves() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("session.json");

    // No file yet: a fresh conversation with the given prompt.
    let mut conversation = open_conversation("Narrate.", Some(&path)).unwrap();
    assert_eq!(conversation.current_system_prompt_text(), "Narrate.");
    conversation.append_message(Role::User, "Knock knock.").unwrap();
    drop(conversation);

    let reopened = open_conversation("Ignored for existing files.", Some(&path)).unwrap();
    assert_eq!(reopened.current_system_prompt_text(), "Narrate.");
    let shapes: Vec<(&str, &str)> = reopened
        .messages()
        .iter()
        .map(|m| (m.role.as_str(), m.content.as_str()))
        .collect();
    assert_eq!(
        shapes,
        vec![("system", "Narrate."), ("user", "Knock knock.")]
    );
}

#[test]
fn test_open_conversation_rejects_corrupt_session() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_chat(temp_dir.path(), "session.json", r#"{"messages": 3}"#);
    assert!(open_conversation("Narrate.", Some(&path)).is_err());
    // The broken file is left alone.
    assert_eq!(fs::read_to_string(&path).unwrap(), r#"{"messages": 3}"#);
}
