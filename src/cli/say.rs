//! One chat turn from the command line

use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

use crate::cli::{exit_with_provider_error, print_notice};
use crate::core::config::{path_display, Config};
use crate::core::constants::DEFAULT_REQUEST_TIMEOUT_SECS;
use crate::core::conversation::ConversationManager;
use crate::core::message::{Role, Severity, Visibility};
use crate::core::persistence::{autosave, JsonFileStore, PersistenceAdapter};
use crate::core::providers::ProviderRegistry;
use crate::core::session::{ChatSession, SendOutcome};
use crate::core::system_prompts::SystemPromptLibrary;
use crate::core::transport::{ReqwestTransport, RequestSettings};
use tracing::info;

#[derive(Debug, Clone, Default)]
pub struct SayOptions {
    pub text: String,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f64>,
    pub session: Option<PathBuf>,
    pub character: Option<u32>,
    pub private: bool,
}

pub async fn run_say(options: SayOptions) -> Result<(), Box<dyn Error>> {
    if options.text.trim().is_empty() {
        eprintln!("Usage: rpchat say <text>");
        std::process::exit(1);
    }

    let config = Config::load()?;
    let registry = ProviderRegistry::from_config(&config);
    let resolved = match registry.resolve(options.provider.as_deref(), options.model.as_deref()) {
        Ok(resolved) => resolved,
        Err(err) => exit_with_provider_error(&err),
    };

    let prompts = SystemPromptLibrary::from_config(&config);
    let system_prompt = prompts.resolve(config.system_prompt.as_deref());
    let conversation = open_conversation(
        system_prompt,
        options.session.as_ref().or(config.session_file.as_ref()),
    )?;

    let settings = RequestSettings {
        temperature: options.temperature.or(config.temperature),
        max_tokens: config.max_tokens,
    };
    let timeout = config
        .request_timeout_secs
        .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
    let transport = ReqwestTransport::new(Duration::from_secs(timeout))?;

    let mut session = ChatSession::new(conversation, resolved, settings, transport);
    session
        .conversation_mut()
        .append_message(Role::User, &options.text)?;

    let outcome = match options.character {
        Some(character_id) => {
            let visibility = if options.private {
                Visibility::Private
            } else {
                Visibility::Public
            };
            session.send_as_character(character_id, visibility).await
        }
        None => session.send().await,
    };

    match outcome {
        SendOutcome::Replied { message, usage } => {
            println!("{}", message.content.trim_end());
            if let Some(usage) = usage {
                eprintln!("{usage}");
            }
            Ok(())
        }
        SendOutcome::Failed(notice) => {
            eprintln!("❌ {}", notice.content);
            std::process::exit(1);
        }
        // The refusal notice has already been printed.
        SendOutcome::Refused(_) => std::process::exit(1),
    }
}

/// Start a conversation, continuing from `session_file` when it exists.
/// With a session file every change is saved back to it.
pub fn open_conversation(
    system_prompt: &str,
    session_file: Option<&PathBuf>,
) -> Result<ConversationManager, Box<dyn Error>> {
    // Import failures surface through the returned error.
    let mut conversation = ConversationManager::with_fallback(system_prompt, system_prompt)
        .with_notifier(|_: &str, _: Severity| {});

    let Some(path) = session_file else {
        return Ok(conversation.with_notifier(print_notice));
    };

    let store = JsonFileStore::new(path);
    if let Some(payload) = store.load()? {
        conversation.import_json(&payload)?;
        info!(
            path = %path_display(path),
            messages = conversation.len(),
            "continuing conversation"
        );
    }
    Ok(conversation
        .with_notifier(print_notice)
        .with_change_listener(autosave(store)))
}
