use futures_util::future::join_all;
use metrics::counter;
use serde::Serialize;

use crate::models::{FollowConfig, MasterPosition};

use super::reconciler::{ReconcileOutcome, Reconciler};

/// Per-signal tally of follower outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchSummary {
    pub filled: usize,
    pub in_sync: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl DispatchSummary {
    pub fn succeeded(&self) -> usize {
        self.filled + self.in_sync
    }

    fn record(&mut self, outcome: &ReconcileOutcome) {
        match outcome {
            ReconcileOutcome::Filled { .. } => self.filled += 1,
            ReconcileOutcome::InSync => self.in_sync += 1,
            ReconcileOutcome::Skipped(_) => self.skipped += 1,
            ReconcileOutcome::Failed { .. } => self.failed += 1,
        }
    }

    pub fn merge(&mut self, other: &DispatchSummary) {
        self.filled += other.filled;
        self.in_sync += other.in_sync;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}

/// Reconcile every follower of `master` concurrently and wait for all of them.
/// Each follower runs on its own task, so a panic in one reconciliation is
/// counted as a failure and never reaches the caller.
pub async fn dispatch(
    reconciler: &Reconciler,
    master: &MasterPosition,
    followers: &[FollowConfig],
) -> DispatchSummary {
    counter!("signals_dispatched").increment(1);

    let handles = followers.iter().map(|config| {
        let reconciler = reconciler.clone();
        let config = config.clone();
        let master = master.clone();
        tokio::spawn(async move { reconciler.reconcile(&config, &master).await })
    });
    let results = join_all(handles).await;

    let mut summary = DispatchSummary::default();
    for (config, result) in followers.iter().zip(results) {
        match result {
            Ok(outcome) => summary.record(&outcome),
            Err(e) => {
                counter!("reconciliations_failed").increment(1);
                tracing::error!(
                    error = %e,
                    follower = config.follower_user_id,
                    symbol = %master.symbol,
                    "Reconciliation task aborted"
                );
                summary.failed += 1;
            }
        }
    }

    tracing::info!(
        master = master.master_user_id,
        symbol = %master.symbol,
        size = %master.size,
        followers = followers.len(),
        succeeded = summary.succeeded(),
        skipped = summary.skipped,
        failed = summary.failed,
        "Signal dispatched"
    );

    summary
}
