//! Bounded worker pool running one probe per candidate

use crate::proxy::checker::LivenessProbe;
use crate::proxy::models::{CandidateRecord, ProbeOutcome};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, error};

/// Default number of probes in flight
pub const DEFAULT_WORKERS: usize = 50;

/// Runs probes concurrently, never more than `workers` at a time
#[derive(Clone)]
pub struct Dispatcher {
    probe: Arc<dyn LivenessProbe>,
    workers: usize,
}

impl Dispatcher {
    pub fn new(probe: Arc<dyn LivenessProbe>, workers: usize) -> Self {
        Self {
            probe,
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Start probing and return the outcome channel
    ///
    /// Outcomes arrive in completion order. The channel closes once every
    /// candidate has produced its outcome.
    pub fn dispatch(&self, candidates: Vec<CandidateRecord>) -> mpsc::Receiver<ProbeOutcome> {
        let (tx, rx) = mpsc::channel(candidates.len().max(1));
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let probe = Arc::clone(&self.probe);

        tokio::spawn(async move {
            let mut set = JoinSet::new();

            for candidate in candidates {
                // The semaphore is owned here and never closed.
                let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                    break;
                };
                let probe = Arc::clone(&probe);
                let tx = tx.clone();

                set.spawn(async move {
                    let _permit = permit;
                    let outcome = probe_guarded(probe.as_ref(), candidate).await;
                    // Receiver dropped means nobody is harvesting; the outcome is moot.
                    let _ = tx.send(outcome).await;
                });
            }
            drop(tx);

            while let Some(res) = set.join_next().await {
                if let Err(e) = res {
                    error!("probe task failed: {}", e);
                }
            }
            debug!("all probe tasks resolved");
        });

        rx
    }

    /// Probe every candidate and collect all outcomes
    pub async fn run(&self, candidates: Vec<CandidateRecord>) -> Vec<ProbeOutcome> {
        let expected = candidates.len();
        let mut rx = self.dispatch(candidates);
        let mut outcomes = Vec::with_capacity(expected);

        while let Some(outcome) = rx.recv().await {
            outcomes.push(outcome);
        }

        outcomes
    }
}

/// Run one probe, turning a panic into an error outcome for that candidate
async fn probe_guarded(probe: &dyn LivenessProbe, candidate: CandidateRecord) -> ProbeOutcome {
    let result = AssertUnwindSafe(probe.probe(&candidate)).catch_unwind().await;
    match result {
        Ok(outcome) => outcome,
        Err(_) => {
            let message = format!("Error checking {}: probe panicked", candidate.to_address());
            error!("{}", message);
            ProbeOutcome::Error(candidate, message)
        }
    }
}
