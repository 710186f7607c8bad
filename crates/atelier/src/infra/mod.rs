//! Infrastructure adapters for config, paths, external tools, and the relay.

pub mod auth;
pub mod backend;
pub mod client;
pub mod config;
pub mod paths;
pub mod server;
pub mod zoxide;
