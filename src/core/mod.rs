pub mod builtin_providers;
pub mod config;
pub mod constants;
pub mod conversation;
pub mod markdown;
pub mod message;
pub mod persistence;
pub mod providers;
pub mod session;
pub mod system_prompts;
pub mod transport;
