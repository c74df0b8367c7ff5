//! Error types for configuration loading and cascade expansion
//!
//! Every error here is a load-time error. Resolving a single file never fails:
//! a file nothing applies to simply resolves to an empty configuration.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for cascade operations
#[derive(Debug, Error)]
pub enum CascadeError {
    /// A fragment declaration is structurally invalid
    #[error("Invalid fragment at {position}, field '{field}': {message}")]
    InvalidFragment {
        position: String,
        field: String,
        message: String,
    },

    /// An `extends` entry names a rule set that is not registered
    #[error("Unknown rule set '{name}' referenced by {requested_by}")]
    UnknownRuleSet { name: String, requested_by: String },

    /// An `extends` chain (or alias chain) loops back on itself
    #[error("Cyclic extends: {}", format_cycle(.cycle))]
    CyclicExtends { cycle: Vec<String> },

    /// A glob pattern could not be compiled
    #[error("Malformed pattern '{pattern}' at {position}: {message}")]
    MalformedPattern {
        pattern: String,
        position: String,
        message: String,
    },

    /// Declaration document could not be located or parsed
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// File system I/O errors
    #[error("IO error for path '{path}': {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn format_cycle(cycle: &[String]) -> String {
    cycle.join(" → ")
}

/// Error kind enumeration for categorizing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Fragment,
    Extends,
    Pattern,
    Config,
    Io,
}

impl CascadeError {
    /// Get the error kind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            CascadeError::InvalidFragment { .. } => ErrorKind::Fragment,
            CascadeError::UnknownRuleSet { .. } | CascadeError::CyclicExtends { .. } => {
                ErrorKind::Extends
            }
            CascadeError::MalformedPattern { .. } => ErrorKind::Pattern,
            CascadeError::ConfigError { .. } => ErrorKind::Config,
            CascadeError::IoError { .. } => ErrorKind::Io,
        }
    }

    /// Create an invalid fragment error
    pub fn invalid_fragment(
        position: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidFragment {
            position: position.into(),
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an unknown rule set error
    pub fn unknown_rule_set(name: impl Into<String>, requested_by: impl Into<String>) -> Self {
        Self::UnknownRuleSet {
            name: name.into(),
            requested_by: requested_by.into(),
        }
    }

    /// Create a cyclic extends error from the offending chain
    pub fn cyclic_extends(cycle: Vec<String>) -> Self {
        Self::CyclicExtends { cycle }
    }

    /// Create a malformed pattern error
    pub fn malformed_pattern(
        pattern: impl Into<String>,
        position: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::MalformedPattern {
            pattern: pattern.into(),
            position: position.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create an IO error with path context
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            source,
        }
    }
}

/// Convert from std::io::Error
impl From<std::io::Error> for CascadeError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError {
            path: PathBuf::new(),
            source: err,
        }
    }
}
