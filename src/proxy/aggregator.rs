//! Classification of probe outcomes into the accepted set and error log

use crate::proxy::models::{AcceptedEntry, ProbeOutcome, RunSummary};
use crate::proxy::policy::FilterPolicy;
use chrono::Local;
use tokio::sync::mpsc;
use tracing::debug;

/// Everything a run produced, ready to be persisted
#[derive(Debug, Clone, Default)]
pub struct VerificationReport {
    pub accepted: Vec<AcceptedEntry>,
    pub errors: Vec<String>,
    pub summary: RunSummary,
}

/// Single-threaded consumer of probe outcomes
pub struct ResultAggregator {
    policy: FilterPolicy,
    timestamp_errors: bool,
    report: VerificationReport,
}

impl ResultAggregator {
    pub fn new(policy: FilterPolicy) -> Self {
        Self {
            policy,
            timestamp_errors: false,
            report: VerificationReport::default(),
        }
    }

    /// Prefix each error-log line with the local time
    pub fn with_timestamps(mut self, enabled: bool) -> Self {
        self.timestamp_errors = enabled;
        self
    }

    /// Record how many candidates were submitted
    pub fn expect_candidates(&mut self, count: usize) {
        self.report.summary.candidates = count;
    }

    pub fn record(&mut self, outcome: ProbeOutcome) {
        let summary = &mut self.report.summary;

        match outcome {
            ProbeOutcome::Dead(_) => {
                summary.dead += 1;
            }
            ProbeOutcome::Error(_, message) => {
                summary.errors += 1;
                let line = if self.timestamp_errors {
                    format!("[{}] {}", Local::now().format("%Y-%m-%d %H:%M:%S"), message)
                } else {
                    message
                };
                self.report.errors.push(line);
            }
            ProbeOutcome::Alive(record) => {
                summary.alive += 1;
                if self.policy.accepts(&record) {
                    summary.accepted += 1;
                    self.report.accepted.push(AcceptedEntry::new(record));
                } else {
                    debug!("{} alive but rejected by filter", record.to_address());
                    summary.rejected += 1;
                }
            }
        }
    }

    /// Consume outcomes until the dispatcher closes the channel
    pub async fn drain(&mut self, rx: &mut mpsc::Receiver<ProbeOutcome>) {
        while let Some(outcome) = rx.recv().await {
            self.record(outcome);
        }
    }

    pub fn finish(self) -> VerificationReport {
        self.report
    }
}
