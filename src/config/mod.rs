//! Settings Module
//!
//! Handles loading and validation of the crate's own settings.

pub mod manager;
pub mod types;

pub use manager::SettingsManager;
pub use types::*;
