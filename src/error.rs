//! Error types of the simulation engine.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building or running a simulation.
///
/// Configuration problems are reported before the first tick runs.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or inconsistent configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A file could not be read or written.
    #[error("I/O error on {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A data file could not be encoded or decoded.
    #[error("format error: {0}")]
    Format(String),

    /// Numerical state that cannot be used to continue the simulation.
    #[error("arithmetic error: {0}")]
    Arithmetic(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Error::Configuration(msg.into())
    }

    /// Prefix the message of a configuration error with the parameter it concerns.
    pub(crate) fn in_param(self, param: &str) -> Self {
        match self {
            Error::Configuration(msg) => Error::Configuration(format!("invalid {param}: {msg}")),
            other => other,
        }
    }
}
