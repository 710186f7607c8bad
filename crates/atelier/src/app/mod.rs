//! Application layer: the location pipeline and its orchestration.

pub mod actions;
pub mod filter;
pub mod locations;
pub mod providers;
pub mod resolver;
pub mod selection;
pub mod session;
pub mod workflow;
