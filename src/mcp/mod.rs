//! MCP server: Model Context Protocol over stdio and HTTP.
//!
//! - [`server`]: the four Guatá tools and two resources
//! - [`http`]: streamable HTTP transport plus the REST endpoints

pub mod http;
pub mod server;
