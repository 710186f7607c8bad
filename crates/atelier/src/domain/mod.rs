//! Core domain types shared by every layer.

pub mod errors;
pub mod model;
pub mod names;
