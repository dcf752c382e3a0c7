//! One verification run: load, probe, classify, persist

use crate::config::FeedConfig;
use crate::error::FeedError;
use crate::proxy::{
    CandidateParser, CommitSummary, Dispatcher, FeedWriter, LivenessProbe, ResultAggregator,
    RunSummary,
};
use std::sync::Arc;
use tracing::info;

/// Outcome of a completed run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub summary: RunSummary,
    pub commit: CommitSummary,
}

impl RunReport {
    pub fn has_survivors(&self) -> bool {
        self.summary.accepted > 0
    }
}

/// Verify the candidate source with `probe` and persist the survivors
///
/// Artifact failures abort the run. Per-candidate failures never do: they
/// end up in the error log.
pub async fn run_verification(
    config: &FeedConfig,
    probe: Arc<dyn LivenessProbe>,
) -> Result<RunReport, FeedError> {
    config.validate()?;

    let candidates = CandidateParser::parse_file(&config.input)?;
    info!(
        "Loaded {} candidates from {}",
        candidates.len(),
        config.input.display()
    );

    let dispatcher = Dispatcher::new(probe, config.workers);
    info!("Checking with {} workers", dispatcher.workers());

    let mut aggregator =
        ResultAggregator::new(config.policy.clone()).with_timestamps(config.timestamp_errors);
    aggregator.expect_candidates(candidates.len());

    let mut rx = dispatcher.dispatch(candidates);
    aggregator.drain(&mut rx).await;
    let report = aggregator.finish();

    let summary = report.summary.clone();
    info!(
        "Results: {} alive, {} dead, {} errors, {} accepted",
        summary.alive, summary.dead, summary.errors, summary.accepted
    );

    let mut writer = FeedWriter::new(&config.output, &config.error_log);
    if config.replace_source {
        writer = writer.with_source_replacement(&config.input);
    }
    let commit = writer.commit(&report)?;

    Ok(RunReport { summary, commit })
}
