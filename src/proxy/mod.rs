//! Proxy feed module for verifying candidate proxies
//!
//! This module provides functionality for:
//! - Parsing candidates from the comma-delimited feed source
//! - Probing candidates against a liveness-check API with a bounded worker pool
//! - Filtering alive candidates and persisting the verified feed
//! - Fetching upstream lists and converting labeled entries

pub mod aggregator;
pub mod checker;
pub mod crawler;
pub mod dispatcher;
pub mod label;
pub mod models;
pub mod parser;
pub mod persist;
pub mod policy;

pub use aggregator::{ResultAggregator, VerificationReport};
pub use checker::{LivenessProbe, ProbeConfig, ProxyChecker};
pub use crawler::{CrawlerConfig, ProxyCrawler};
pub use dispatcher::Dispatcher;
pub use label::{CountryTable, LabelConverter};
pub use models::{AcceptedEntry, CandidateRecord, Liveness, ProbeOutcome, RunSummary};
pub use parser::CandidateParser;
pub use persist::{CommitSummary, FeedWriter};
pub use policy::FilterPolicy;
