//! Terminal UI for the location picker.

pub mod app;
pub mod components;
pub mod theme;
