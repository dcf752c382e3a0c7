//! Candidate parser for the comma-delimited feed source

use crate::error::FeedError;
use crate::proxy::models::CandidateRecord;
use std::fs;
use std::path::Path;

/// Field delimiter of the candidate source
pub const FIELD_DELIMITER: char = ',';

/// Parser for `ip,port,country_code,label` candidate lists
pub struct CandidateParser;

impl CandidateParser {
    /// Parse a single candidate line
    ///
    /// A line is accepted only when it splits into exactly four fields that
    /// are non-empty after trimming. Everything else yields `None`.
    pub fn parse_line(line: &str) -> Option<CandidateRecord> {
        let fields: Vec<&str> = line.split(FIELD_DELIMITER).map(str::trim).collect();

        match fields.as_slice() {
            [ip, port, country_code, label]
                if fields.iter().all(|field| !field.is_empty()) =>
            {
                Some(CandidateRecord::new(*ip, *port, *country_code, *label))
            }
            _ => None,
        }
    }

    /// Parse candidates from a string (multiple lines)
    pub fn parse_string(content: &str) -> Vec<CandidateRecord> {
        content.lines().filter_map(Self::parse_line).collect()
    }

    /// Parse candidates from a file
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Vec<CandidateRecord>, FeedError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| FeedError::SourceUnreadable {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse_string(&content))
    }
}
