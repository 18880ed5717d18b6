use crate::core::constants::LOG_ENV_VAR;
use std::error::Error;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Filter directive when `RPCHAT_LOG` is unset. `-v` raises our own crate to
/// `debug` and leaves dependencies at `warn`.
fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "warn,rpchat=debug"
    } else {
        "warn"
    }
}

fn build_filter(verbose: bool, env_directive: Option<&str>) -> EnvFilter {
    env_directive
        .filter(|directive| !directive.trim().is_empty())
        .and_then(|directive| EnvFilter::try_new(directive).ok())
        .unwrap_or_else(|| EnvFilter::new(default_directive(verbose)))
}

/// Install the global tracing subscriber. Logs go to stderr, or are appended
/// to `log_file` without ANSI colors.
pub fn init_tracing(
    verbose: bool,
    log_file: Option<&Path>,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let env_directive = std::env::var(LOG_ENV_VAR).ok();
    let filter = build_filter(verbose, env_directive.as_deref());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            builder
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .try_init()?;
        }
        None => builder.with_writer(std::io::stderr).try_init()?,
    }

    Ok(())
}
