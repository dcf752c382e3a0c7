//! Acceptance filter applied to alive candidates

use crate::proxy::models::CandidateRecord;
use crate::Result;
use anyhow::Context;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Which alive candidates make it into the published feed
///
/// Comparisons are case-sensitive and string-exact. A policy file is a JSON
/// object with `allowed_country_codes` and `excluded_ports` arrays; a missing
/// array is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FilterPolicy {
    pub allowed_country_codes: HashSet<String>,
    pub excluded_ports: HashSet<String>,
}

impl FilterPolicy {
    pub fn new<C, P>(allowed_country_codes: C, excluded_ports: P) -> Self
    where
        C: IntoIterator,
        C::Item: Into<String>,
        P: IntoIterator,
        P::Item: Into<String>,
    {
        Self {
            allowed_country_codes: allowed_country_codes.into_iter().map(Into::into).collect(),
            excluded_ports: excluded_ports.into_iter().map(Into::into).collect(),
        }
    }

    /// Load a policy from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading filter policy {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("parsing filter policy {}", path.display()))
    }

    /// True iff the country is allowed and the port is not excluded
    pub fn accepts(&self, record: &CandidateRecord) -> bool {
        self.allowed_country_codes.contains(&record.country_code)
            && !self.excluded_ports.contains(&record.port)
    }
}
