//! Error types for the verification pipeline

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Failure of a single liveness probe
///
/// Never escapes the probe boundary: it is rendered into the message of a
/// `ProbeOutcome::Error`.
#[derive(Error, Debug)]
pub enum ProbeError {
    /// Connection, TLS or body read failure
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    /// The API answered with a non-2xx status
    #[error("HTTP status {0}")]
    Status(reqwest::StatusCode),

    /// No complete response within the probe timeout
    #[error("request timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),

    /// Body was not a JSON object
    #[error("{0}")]
    Format(#[from] serde_json::Error),
}

impl ProbeError {
    /// Render the diagnostic written to the error log
    pub fn diagnostic(&self, address: &str) -> String {
        match self {
            ProbeError::Format(e) => format!("Error parsing JSON for {}: {}", address, e),
            other => format!("Error checking {}: {}", address, other),
        }
    }
}

/// Artifact-level failures; these abort the run
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("could not read candidate source {}: {source}", path.display())]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not write accepted output {}: {source}", path.display())]
    OutputUnwritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not write error log {}: {source}", path.display())]
    ErrorLogUnwritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not replace {}: {source}", path.display())]
    SourceReplace {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
