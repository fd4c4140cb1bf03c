//! Properties Module
//!
//! Parsing, locating and loading of `.properties` sources.

pub mod loader;
pub mod locator;
pub mod parser;

pub use loader::{copy_properties, load_properties};
pub use locator::ResourceLocator;
pub use parser::{parse_file, parse_properties};

use std::collections::HashMap;

/// Raw key/value pairs as read from a source
pub type Properties = HashMap<String, String>;
