//! ProxyIP Feed - Proxy Feed Verifier
//!
//! Re-verifies a feed of candidate proxies against a liveness-check API
//! with a bounded worker pool and keeps only the survivors.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod proxy;

pub use config::FeedConfig;
pub use error::{FeedError, ProbeError};
pub use pipeline::{run_verification, RunReport};
pub use proxy::*;

/// Application result type
pub type Result<T> = anyhow::Result<T>;
