//! Conversion of pre-labeled proxy lines into the display format
//!
//! Upstream feeds publish entries as `ip:port#code_label` or
//! `ip:port#code label`. The converter rewrites them to
//! `ip:port#CODE CountryName` using an injected [`CountryTable`].

use crate::Result;
use anyhow::Context;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Name used when a country code has no table entry
pub const UNKNOWN_COUNTRY: &str = "Unknown";

const DEFAULT_COUNTRIES: &[(&str, &str)] = &[
    // Asia
    ("KR", "Korea"),
    ("CN", "China"),
    ("JP", "Japan"),
    ("HK", "Hong Kong"),
    ("TW", "Taiwan"),
    ("SG", "Singapore"),
    ("TH", "Thailand"),
    ("VN", "Vietnam"),
    ("MY", "Malaysia"),
    ("ID", "Indonesia"),
    ("PH", "Philippines"),
    ("IN", "India"),
    // Europe
    ("GB", "United Kingdom"),
    ("FR", "France"),
    ("DE", "Germany"),
    ("IT", "Italy"),
    ("ES", "Spain"),
    ("NL", "Netherlands"),
    ("CH", "Switzerland"),
    ("SE", "Sweden"),
    ("PL", "Poland"),
    ("RU", "Russia"),
    ("UA", "Ukraine"),
    // Americas
    ("US", "United States"),
    ("CA", "Canada"),
    ("MX", "Mexico"),
    ("BR", "Brazil"),
    ("AR", "Argentina"),
    // Oceania, Africa, Middle East
    ("AU", "Australia"),
    ("NZ", "New Zealand"),
    ("ZA", "South Africa"),
    ("AE", "United Arab Emirates"),
    ("IL", "Israel"),
    ("TR", "Turkey"),
];

/// Country code to display name lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryTable {
    names: HashMap<String, String>,
}

impl CountryTable {
    /// Build a table from `(code, name)` pairs; codes are stored upper-case
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        Self {
            names: pairs
                .into_iter()
                .map(|(code, name)| (code.as_ref().to_uppercase(), name.into()))
                .collect(),
        }
    }

    /// Load a table from a JSON object file such as `{"KR": "Korea"}`
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading country table {}", path.display()))?;
        let names: HashMap<String, String> = serde_json::from_str(&content)
            .with_context(|| format!("parsing country table {}", path.display()))?;
        Ok(Self::from_pairs(names))
    }

    /// Look up a display name
    ///
    /// Three-letter codes without an entry fall back to their two-letter
    /// prefix (`JPN` -> `JP`).
    pub fn name(&self, code: &str) -> &str {
        let code = code.to_uppercase();
        if let Some(name) = self.names.get(&code) {
            return name;
        }
        if code.len() == 3 {
            if let Some(name) = code.get(..2).and_then(|prefix| self.names.get(prefix)) {
                return name;
            }
        }
        UNKNOWN_COUNTRY
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for CountryTable {
    fn default() -> Self {
        Self::from_pairs(DEFAULT_COUNTRIES.iter().copied())
    }
}

/// Rewrites labeled lines with a country table
pub struct LabelConverter {
    table: CountryTable,
}

impl LabelConverter {
    pub fn new(table: CountryTable) -> Self {
        Self { table }
    }

    /// Convert a single line; lines without a `#` label yield `None`
    pub fn convert_line(&self, line: &str) -> Option<String> {
        let line = line.trim();
        let (address, label) = line.split_once('#')?;
        let address = address.trim();
        let code = label
            .split(|c: char| c == '_' || c.is_whitespace())
            .next()
            .unwrap_or_default()
            .trim();
        if address.is_empty() || code.is_empty() {
            return None;
        }

        let code = code.to_uppercase();
        Some(format!("{}#{} {}", address, code, self.table.name(&code)))
    }

    /// Convert every line of a string
    pub fn convert_string(&self, content: &str) -> Vec<String> {
        content
            .lines()
            .filter_map(|line| self.convert_line(line))
            .collect()
    }
}
