//! Persistence of verified feeds
//!
//! The accepted list and error log are written with truncate-create
//! semantics. Replacing the candidate source is a two-phase commit: the new
//! content goes to a temporary file next to the source, which is then
//! renamed over it, so readers only ever see the old or the new file.

use crate::error::FeedError;
use crate::proxy::aggregator::VerificationReport;
use crate::proxy::models::AcceptedEntry;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::Builder;
use tracing::info;

/// What `FeedWriter::commit` actually wrote
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitSummary {
    pub accepted_written: usize,
    pub error_log_written: bool,
    pub source_replaced: bool,
}

/// Writes the artifacts of one verification run
#[derive(Debug, Clone)]
pub struct FeedWriter {
    output: PathBuf,
    error_log: PathBuf,
    source_to_replace: Option<PathBuf>,
}

impl FeedWriter {
    pub fn new(output: impl Into<PathBuf>, error_log: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
            error_log: error_log.into(),
            source_to_replace: None,
        }
    }

    /// Replace this candidate source with the verified list after a
    /// successful write of the accepted output
    pub fn with_source_replacement(mut self, source: impl Into<PathBuf>) -> Self {
        self.source_to_replace = Some(source.into());
        self
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn error_log(&self) -> &Path {
        &self.error_log
    }

    /// Write `ip:port#COUNTRYCODE LABEL` lines to the output path
    pub fn write_accepted(&self, accepted: &[AcceptedEntry]) -> Result<(), FeedError> {
        write_lines(&self.output, accepted.iter().map(AcceptedEntry::to_feed_line)).map_err(
            |source| FeedError::OutputUnwritable {
                path: self.output.clone(),
                source,
            },
        )
    }

    /// Write the error log; nothing is written when there are no errors
    pub fn write_error_log(&self, errors: &[String]) -> Result<bool, FeedError> {
        if errors.is_empty() {
            return Ok(false);
        }

        write_lines(&self.error_log, errors.iter().cloned()).map_err(|source| {
            FeedError::ErrorLogUnwritable {
                path: self.error_log.clone(),
                source,
            }
        })?;
        Ok(true)
    }

    /// Atomically replace `source` with the verified candidates
    ///
    /// The replacement keeps the comma-delimited candidate format so the feed
    /// can be verified again on the next run.
    pub fn replace_source(&self, source: &Path, accepted: &[AcceptedEntry]) -> Result<(), FeedError> {
        write_atomically(source, accepted.iter().map(|e| e.record.to_candidate_line())).map_err(
            |source_err| FeedError::SourceReplace {
                path: source.to_path_buf(),
                source: source_err,
            },
        )
    }

    /// Persist a finished run
    pub fn commit(&self, report: &VerificationReport) -> Result<CommitSummary, FeedError> {
        self.write_accepted(&report.accepted)?;
        info!(
            "Saved {} accepted proxies to {}",
            report.accepted.len(),
            self.output.display()
        );

        let error_log_written = self.write_error_log(&report.errors)?;
        if error_log_written {
            info!(
                "Logged {} probe errors to {}",
                report.errors.len(),
                self.error_log.display()
            );
        }

        let source_replaced = match &self.source_to_replace {
            Some(source) => {
                self.replace_source(source, &report.accepted)?;
                info!("Replaced {} with the verified list", source.display());
                true
            }
            None => false,
        };

        Ok(CommitSummary {
            accepted_written: report.accepted.len(),
            error_log_written,
            source_replaced,
        })
    }
}

/// Write lines to a temporary file beside `path`, then rename it over `path`
///
/// An existing target keeps its permission bits. A new file is created as
/// 0644 less the process umask.
pub fn write_atomically<I>(path: &Path, lines: I) -> io::Result<()>
where
    I: IntoIterator<Item = String>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut builder = Builder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o644));
    }
    let mut tmp = builder.tempfile_in(dir)?;

    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        for line in lines {
            writeln!(writer, "{}", line)?;
        }
        writer.flush()?;
    }

    match fs::metadata(path) {
        Ok(existing) => tmp.as_file().set_permissions(existing.permissions())?,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    tmp.as_file().sync_all()?;

    // On any earlier error the temp file is dropped and removed.
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

fn write_lines<I>(path: &Path, lines: I) -> io::Result<()>
where
    I: IntoIterator<Item = String>,
{
    let mut writer = BufWriter::new(File::create(path)?);
    for line in lines {
        writeln!(writer, "{}", line)?;
    }
    writer.flush()
}
