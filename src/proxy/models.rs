//! Proxy feed data models

use std::fmt;

/// A candidate proxy read from the feed source
///
/// All fields are kept as strings: the port in particular is compared
/// string-exact by the acceptance filter, never numerically.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CandidateRecord {
    pub ip: String,
    pub port: String,
    pub country_code: String,
    pub label: String,
}

impl CandidateRecord {
    /// Create a new candidate record
    pub fn new(
        ip: impl Into<String>,
        port: impl Into<String>,
        country_code: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            ip: ip.into(),
            port: port.into(),
            country_code: country_code.into(),
            label: label.into(),
        }
    }

    /// Get the candidate in IP:PORT format
    pub fn to_address(&self) -> String {
        format!("{}:{}", self.ip, self.port)
    }

    /// Get the candidate in the comma-delimited source format
    pub fn to_candidate_line(&self) -> String {
        format!(
            "{},{},{},{}",
            self.ip, self.port, self.country_code, self.label
        )
    }
}

impl fmt::Display for CandidateRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_address())
    }
}

/// Verdict of the liveness-check API for one candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    Alive,
    Dead,
}

/// Outcome of probing a single candidate
///
/// Exactly one outcome is produced for every candidate handed to the
/// dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Alive(CandidateRecord),
    Dead(CandidateRecord),
    Error(CandidateRecord, String),
}

impl ProbeOutcome {
    pub fn from_liveness(record: CandidateRecord, liveness: Liveness) -> Self {
        match liveness {
            Liveness::Alive => ProbeOutcome::Alive(record),
            Liveness::Dead => ProbeOutcome::Dead(record),
        }
    }

    pub fn record(&self) -> &CandidateRecord {
        match self {
            ProbeOutcome::Alive(record)
            | ProbeOutcome::Dead(record)
            | ProbeOutcome::Error(record, _) => record,
        }
    }

    pub fn is_alive(&self) -> bool {
        matches!(self, ProbeOutcome::Alive(_))
    }
}

/// A verified candidate that passed the acceptance filter
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AcceptedEntry {
    pub record: CandidateRecord,
}

impl AcceptedEntry {
    pub fn new(record: CandidateRecord) -> Self {
        Self { record }
    }

    /// Get the entry in the published `ip:port#COUNTRYCODE LABEL` format
    pub fn to_feed_line(&self) -> String {
        format!(
            "{}#{} {}",
            self.record.to_address(),
            self.record.country_code,
            self.record.label
        )
    }
}

impl fmt::Display for AcceptedEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_feed_line())
    }
}

/// Per-run counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub candidates: usize,
    pub alive: usize,
    pub dead: usize,
    pub errors: usize,
    pub accepted: usize,
    pub rejected: usize,
}

impl RunSummary {
    /// Number of outcomes harvested so far
    pub fn resolved(&self) -> usize {
        self.alive + self.dead + self.errors
    }
}
