//! Run configuration for the verification pipeline

use crate::error::FeedError;
use crate::proxy::checker::ProbeConfig;
use crate::proxy::dispatcher::DEFAULT_WORKERS;
use crate::proxy::policy::FilterPolicy;
use std::fs;
use std::path::{Path, PathBuf};

/// Default candidate source path
pub const DEFAULT_INPUT: &str = "proxy.txt";
/// Default accepted-output path
pub const DEFAULT_OUTPUT: &str = "proxy_verified.txt";
/// Default error-log path
pub const DEFAULT_ERROR_LOG: &str = "errorproxy.txt";

/// Everything one verification run needs
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Candidate source
    pub input: PathBuf,
    /// Accepted-output artifact
    pub output: PathBuf,
    /// Error-log artifact
    pub error_log: PathBuf,
    /// Liveness probe settings
    pub probe: ProbeConfig,
    /// Maximum number of probes in flight
    pub workers: usize,
    /// Acceptance filter for alive candidates
    pub policy: FilterPolicy,
    /// Replace the candidate source with the verified list
    pub replace_source: bool,
    /// Prefix error-log lines with a timestamp
    pub timestamp_errors: bool,
}

impl FeedConfig {
    pub fn new(probe: ProbeConfig, policy: FilterPolicy) -> Self {
        Self {
            input: PathBuf::from(DEFAULT_INPUT),
            output: PathBuf::from(DEFAULT_OUTPUT),
            error_log: PathBuf::from(DEFAULT_ERROR_LOG),
            probe,
            workers: DEFAULT_WORKERS,
            policy,
            replace_source: false,
            timestamp_errors: false,
        }
    }

    pub fn with_input(mut self, input: impl Into<PathBuf>) -> Self {
        self.input = input.into();
        self
    }

    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = output.into();
        self
    }

    pub fn with_error_log(mut self, error_log: impl Into<PathBuf>) -> Self {
        self.error_log = error_log.into();
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_replace_source(mut self, enabled: bool) -> Self {
        self.replace_source = enabled;
        self
    }

    pub fn with_timestamp_errors(mut self, enabled: bool) -> Self {
        self.timestamp_errors = enabled;
        self
    }

    /// Reject configurations that would corrupt the candidate source
    pub fn validate(&self) -> Result<(), FeedError> {
        if self.workers == 0 {
            return Err(FeedError::InvalidConfig(
                "worker pool size must be at least 1".to_string(),
            ));
        }
        let input = resolve_path(&self.input);
        let output = resolve_path(&self.output);
        let error_log = resolve_path(&self.error_log);

        if output == input {
            return Err(FeedError::InvalidConfig(format!(
                "output path {} is the candidate source; use source replacement instead",
                self.output.display()
            )));
        }
        if error_log == input || error_log == output {
            return Err(FeedError::InvalidConfig(format!(
                "error log path {} collides with another artifact",
                self.error_log.display()
            )));
        }
        if !self.probe.api_url.contains("{ip}") || !self.probe.api_url.contains("{port}") {
            return Err(FeedError::InvalidConfig(format!(
                "API URL template must contain {{ip}} and {{port}}: {}",
                self.probe.api_url
            )));
        }
        Ok(())
    }
}

/// Absolute form of `path` with `.`, `..` and symlinks resolved
///
/// A file that does not exist yet is resolved through its parent directory.
fn resolve_path(path: &Path) -> PathBuf {
    if let Ok(resolved) = fs::canonicalize(path) {
        return resolved;
    }

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    match (fs::canonicalize(parent), path.file_name()) {
        (Ok(dir), Some(name)) => dir.join(name),
        _ => path.to_path_buf(),
    }
}
