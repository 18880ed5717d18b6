//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the appropriate commands.

pub mod history;
pub mod prompt_list;
pub mod provider_list;
pub mod say;
pub mod set_default;

#[cfg(test)]
mod tests;

use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::cli::history::{run_check, run_export, run_extract};
use crate::cli::prompt_list::list_prompts;
use crate::cli::provider_list::list_providers;
use crate::cli::say::{run_say, SayOptions};
use crate::cli::set_default::run_set_default;
use crate::core::markdown::ExtractOptions;
use crate::core::message::Severity;
use crate::core::providers::ProviderResolutionError;
use crate::utils::logging::init_tracing;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("VERGEN_GIT_SHA"),
    ")"
);

#[derive(Parser)]
#[command(name = "rpchat")]
#[command(version, long_version = LONG_VERSION)]
#[command(about = "Role-play chat with OpenAI-compatible and Gemini providers")]
#[command(
    long_about = "rpchat keeps a role-play conversation on disk and sends it to an AI \
completion provider one turn at a time. Scenes can hold several characters; each \
character only sees public lines and its own private ones.\n\n\
API keys:\n\
  Each provider reads its key from <PROVIDER>_API_KEY, e.g. DEEPSEEK_API_KEY.\n\
  Run 'rpchat providers' to see which keys are set.\n\n\
Environment Variables:\n\
  RPCHAT_LOG        Tracing filter directive (e.g. rpchat=debug)"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Provider to use (defaults to the configured default provider)
    #[arg(short = 'p', long, global = true, value_name = "PROVIDER")]
    pub provider: Option<String>,

    /// Model to use (defaults to the provider's default model)
    #[arg(short = 'm', long, global = true, value_name = "MODEL")]
    pub model: Option<String>,

    /// Sampling temperature for this request
    #[arg(short = 't', long, global = true, value_name = "TEMPERATURE")]
    pub temperature: Option<f64>,

    /// Log debug output from rpchat
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Append logs to the specified file instead of stderr
    #[arg(long, global = true, value_name = "FILE")]
    pub log: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List available providers and whether their API keys are set
    Providers,
    /// List available system prompts
    Prompts,
    /// Send a message and print the reply
    Say {
        /// Conversation file to continue and save to
        #[arg(short = 's', long, value_name = "FILE")]
        session: Option<PathBuf>,
        /// Character that takes the turn (0 is the narrator)
        #[arg(short = 'c', long, value_name = "ID")]
        character: Option<u32>,
        /// Keep the reply private to the speaking character
        #[arg(long, requires = "character")]
        private: bool,
        /// Message text (multiple words are joined with spaces)
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        text: Vec<String>,
    },
    /// Print a saved conversation as Markdown
    Extract {
        /// Conversation file to read
        file: PathBuf,
        /// Leave out assistant messages
        #[arg(long)]
        no_assistant: bool,
        /// Leave out user messages
        #[arg(long)]
        no_user: bool,
        /// Include the system prompt
        #[arg(long)]
        system: bool,
        /// Prefix each message with its role
        #[arg(long)]
        labels: bool,
        /// Write to a file instead of stdout (a dated name when no file is given)
        #[arg(short = 'o', long, value_name = "FILE", num_args = 0..=1)]
        output: Option<Option<PathBuf>>,
    },
    /// Validate a saved conversation and print a summary
    Check {
        /// Conversation file to read
        file: PathBuf,
    },
    /// Re-save a conversation in the current export format
    Export {
        /// Conversation file to read
        file: PathBuf,
        /// Destination (a dated name when omitted)
        #[arg(short = 'o', long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Set the default provider, and optionally its default model
    SetDefault {
        /// Provider id
        provider: String,
        /// Model id (can be multiple words)
        #[arg(trailing_var_arg = true)]
        model: Vec<String>,
    },
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    if let Err(err) = init_tracing(args.verbose, args.log.as_deref()) {
        eprintln!("⚠️  Could not start logging: {err}");
    }

    let result = tokio::runtime::Runtime::new()?.block_on(async_main(args));
    if let Err(err) = result {
        eprintln!("❌ {err}");
        std::process::exit(1);
    }
    Ok(())
}

async fn async_main(args: Args) -> Result<(), Box<dyn Error>> {
    let Args {
        command,
        provider,
        model,
        temperature,
        ..
    } = args;

    match command {
        Commands::Providers => list_providers(),
        Commands::Prompts => list_prompts(),
        Commands::Say {
            session,
            character,
            private,
            text,
        } => {
            run_say(SayOptions {
                text: text.join(" "),
                provider,
                model,
                temperature,
                session,
                character,
                private,
            })
            .await
        }
        Commands::Extract {
            file,
            no_assistant,
            no_user,
            system,
            labels,
            output,
        } => {
            let options = ExtractOptions {
                assistant: !no_assistant,
                user: !no_user,
                system,
                labels,
            };
            run_extract(&file, &options, output)
        }
        Commands::Check { file } => run_check(&file),
        Commands::Export { file, output } => run_export(&file, output),
        Commands::SetDefault { provider, model } => run_set_default(&provider, &model.join(" ")),
    }
}

/// Notification sink for one-shot commands: notices go to stderr.
pub(crate) fn print_notice(message: &str, severity: Severity) {
    let marker = match severity {
        Severity::Info => "ℹ️ ",
        Severity::Success => "✅",
        Severity::Warning => "⚠️ ",
        Severity::Error => "❌",
    };
    eprintln!("{marker} {message}");
}

pub(crate) fn exit_with_provider_error(err: &ProviderResolutionError) -> ! {
    eprintln!("❌ {err}");
    let fixes = err.quick_fixes();
    if !fixes.is_empty() {
        eprintln!();
        eprintln!("💡 Quick fixes:");
        for fix in fixes {
            eprintln!("  • {fix}");
        }
    }
    std::process::exit(err.exit_code());
}
