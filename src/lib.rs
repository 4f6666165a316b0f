//! Guatá, a tourism assistant for Mato Grosso do Sul.
//!
//! Answers visitor questions by rewriting follow-ups with recent history,
//! fanning out to several trusted-source searchers, scoring and
//! cross-referencing their candidates, and composing a reply through a chain
//! of remote and local fallback tiers. Exposed as a CLI, an MCP server and a
//! small REST API.

pub mod chat;
pub mod cli;
pub mod config;
pub mod error;
pub mod mcp;
pub mod observability;
pub mod search;
pub mod types;
