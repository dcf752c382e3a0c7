//! Upstream list fetcher
//!
//! Downloads a comma-delimited candidate list from a URL and installs it as
//! the local candidate source.

use crate::proxy::models::CandidateRecord;
use crate::proxy::parser::CandidateParser;
use crate::proxy::persist::write_atomically;
use crate::Result;
use anyhow::Context;
use reqwest::Client;
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Default timeout for HTTP requests in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default user agent for HTTP requests
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Configuration for the list fetcher
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    /// Timeout for HTTP requests
    pub timeout: Duration,
    /// User agent for HTTP requests
    pub user_agent: String,
    /// Keep only these country codes; empty keeps everything
    pub country_codes: HashSet<String>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            country_codes: HashSet::new(),
        }
    }
}

impl CrawlerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }

    pub fn with_country_codes<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.country_codes = codes.into_iter().map(Into::into).collect();
        self
    }

    fn keeps(&self, record: &CandidateRecord) -> bool {
        self.country_codes.is_empty() || self.country_codes.contains(&record.country_code)
    }
}

/// Fetches candidate lists from upstream feeds
pub struct ProxyCrawler {
    config: CrawlerConfig,
    client: Client,
}

impl ProxyCrawler {
    /// Create a new fetcher with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(CrawlerConfig::default())
    }

    /// Create a new fetcher with custom configuration
    pub fn with_config(config: CrawlerConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self { config, client })
    }

    /// Fetch and parse candidates from a single URL
    pub async fn fetch_candidates(&self, url: &str) -> Result<Vec<CandidateRecord>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("fetching {}", url))?
            .error_for_status()
            .with_context(|| format!("fetching {}", url))?;
        let content = response.text().await?;
        Ok(self.parse_candidates(&content))
    }

    /// Parse candidates from raw text, applying the country selection
    pub fn parse_candidates(&self, content: &str) -> Vec<CandidateRecord> {
        CandidateParser::parse_string(content)
            .into_iter()
            .filter(|record| self.config.keeps(record))
            .collect()
    }

    /// Fetch a list and atomically install it at `destination`
    pub async fn fetch_into(&self, url: &str, destination: &Path) -> Result<usize> {
        let candidates = self.fetch_candidates(url).await?;
        info!("Fetched {} candidates from {}", candidates.len(), url);

        write_atomically(
            destination,
            candidates.iter().map(CandidateRecord::to_candidate_line),
        )
        .with_context(|| format!("writing {}", destination.display()))?;
        info!("Saved candidates to {}", destination.display());

        Ok(candidates.len())
    }
}
