//! rpchat is a role-play chat client for remote LLM completion APIs.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns the conversation state machine, provider selection,
//!   request shaping, persistence and the chat session that ties them
//!   together.
//! - [`api`] defines the wire payloads for OpenAI-compatible and Gemini
//!   providers and the helpers that read their responses.
//! - [`utils`] holds logging setup and endpoint helpers.
//!
//! The binary (`src/main.rs`) routes through [`crate::cli::main`].

pub mod api;
pub mod cli;
pub mod core;
pub mod utils;
