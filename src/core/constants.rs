//! Shared constants used across the application

/// System prompt used whenever none is given or a given one is blank.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Default HTTP timeout for provider requests.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Environment variable holding the tracing filter directive.
pub const LOG_ENV_VAR: &str = "RPCHAT_LOG";
