//! XSM-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, XsmonError>;

/// Broad failure class; the binary prints a per-class hint after the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Malformed user input: flags, config file, env overrides.
    Config,
    /// Display connection, protocol handshakes, unsupported OS.
    Environment,
    /// Missing or malformed system counters.
    Metric,
}

/// Top-level error type for xsmon.
///
/// Every variant is fatal. A missing tray container is not an error; it is a
/// state of the dock manager.
#[derive(Debug, Error)]
pub enum XsmonError {
    #[error("[XSM-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[XSM-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[XSM-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[XSM-1004] invalid color {value:?}: {details}")]
    InvalidColor { value: String, details: String },

    #[error("[XSM-1101] unsupported platform: {details}")]
    UnsupportedPlatform { details: String },

    #[error("[XSM-2001] failed to read {path}: {source}")]
    MetricRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[XSM-2002] malformed {source_name}: {details}")]
    MetricParse {
        source_name: &'static str,
        details: String,
    },

    #[error("[XSM-2003] counter {counter} went backwards: {previous} -> {current}")]
    CounterRegression {
        counter: &'static str,
        previous: u64,
        current: u64,
    },

    #[error("[XSM-3001] protocol request {operation} failed: {details}")]
    Protocol {
        operation: &'static str,
        details: String,
    },

    #[error("[XSM-3002] cannot connect to display: {details}")]
    Connection { details: String },

    #[error("[XSM-3003] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl XsmonError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "XSM-1001",
            Self::MissingConfig { .. } => "XSM-1002",
            Self::ConfigParse { .. } => "XSM-1003",
            Self::InvalidColor { .. } => "XSM-1004",
            Self::UnsupportedPlatform { .. } => "XSM-1101",
            Self::MetricRead { .. } => "XSM-2001",
            Self::MetricParse { .. } => "XSM-2002",
            Self::CounterRegression { .. } => "XSM-2003",
            Self::Protocol { .. } => "XSM-3001",
            Self::Connection { .. } => "XSM-3002",
            Self::Io { .. } => "XSM-3003",
        }
    }

    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidConfig { .. }
            | Self::MissingConfig { .. }
            | Self::ConfigParse { .. }
            | Self::InvalidColor { .. } => ErrorCategory::Config,
            Self::MetricRead { .. } | Self::MetricParse { .. } | Self::CounterRegression { .. } => {
                ErrorCategory::Metric
            }
            Self::UnsupportedPlatform { .. }
            | Self::Protocol { .. }
            | Self::Connection { .. }
            | Self::Io { .. } => ErrorCategory::Environment,
        }
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Convenience constructor for failed protocol requests.
    #[must_use]
    pub fn protocol(operation: &'static str, details: impl ToString) -> Self {
        Self::Protocol {
            operation,
            details: details.to_string(),
        }
    }
}

impl From<serde_json::Error> for XsmonError {
    fn from(value: serde_json::Error) -> Self {
        Self::ConfigParse {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for XsmonError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}

impl From<toml::ser::Error> for XsmonError {
    fn from(value: toml::ser::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}

#[cfg(feature = "x11")]
impl From<x11rb::errors::ConnectError> for XsmonError {
    fn from(value: x11rb::errors::ConnectError) -> Self {
        Self::Connection {
            details: value.to_string(),
        }
    }
}
