//! Error Types
//!
//! Every failure of the store, the reload protocol and the binder surfaces
//! synchronously to the caller as one of these variants.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the dynamic store, the loader and the property binder
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Backing resource absent when it was required
    #[error("cannot find config file {name}")]
    SourceNotFound { name: String },

    /// I/O or malformed content while parsing a source
    #[error("load config file {name} failed")]
    ParseFailure {
        name: String,
        #[source]
        source: ParseError,
    },

    /// A required lookup found no value or only whitespace
    #[error("config item '{key}' is missing or blank")]
    MissingOrBlankValue { key: String },

    /// A present value could not be parsed as the requested type
    #[error("config item '{key}' value '{value}' is not a valid {expected}")]
    FormatError {
        key: String,
        value: String,
        expected: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A registered listener failed during notification
    #[error("trigger config listener failed. config: {name}")]
    ListenerFailure {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    /// The binder found no setter for a key
    #[error("property {key} does not exist on target {target}")]
    UnresolvedProperty { key: String, target: &'static str },

    /// The binder could not convert, construct or invoke for a resolved setter
    #[error("cannot set property {key} on target {target}")]
    CoercionFailure {
        key: String,
        target: &'static str,
        #[source]
        source: anyhow::Error,
    },

    /// The filesystem watcher could not be set up
    #[error("failed to watch {}", path.display())]
    Watch {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },
}

/// Low-level failure of the properties parser
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed \\uxxxx encoding on line {line}")]
    MalformedEscape { line: usize },
}
