use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use metrics::{gauge, histogram};
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::models::{FollowConfig, MasterPosition};
use crate::store::EngineStore;

use super::change_detector::{ChangeDetector, DetectorMode};
use super::dispatcher::{self, DispatchSummary};
use super::failures::{self, Resolution};
use super::reconciler::Reconciler;

/// Engine tuning knobs.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub poll_interval: Duration,
    pub detector_mode: DetectorMode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(3),
            detector_mode: DetectorMode::InMemory,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EngineStatus {
    pub running: bool,
    pub poll_interval_seconds: u64,
}

/// What one pass over all active follow configs did.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TickReport {
    pub groups: usize,
    pub group_errors: usize,
    pub signals: usize,
    pub outcomes: DispatchSummary,
}

struct RunningLoop {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

struct EngineInner {
    store: Arc<dyn EngineStore>,
    reconciler: Reconciler,
    detector: Mutex<ChangeDetector>,
    poll_interval: Duration,
    running: Mutex<Option<RunningLoop>>,
}

/// Periodic monitor that turns master position changes into follower trades.
///
/// Cheap to clone; clones share the same loop and detector state.
#[derive(Clone)]
pub struct FollowerEngine {
    inner: Arc<EngineInner>,
}

impl FollowerEngine {
    pub fn new(store: Arc<dyn EngineStore>, reconciler: Reconciler, config: EngineConfig) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                store,
                reconciler,
                detector: Mutex::new(ChangeDetector::new(config.detector_mode)),
                poll_interval: config.poll_interval,
                running: Mutex::new(None),
            }),
        }
    }

    /// Spawn the monitoring loop. Returns false if it was already running.
    pub async fn start(&self) -> bool {
        let mut running = self.inner.running.lock().await;
        if running.as_ref().is_some_and(|r| !r.handle.is_finished()) {
            tracing::warn!("Follower engine already running");
            return false;
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let inner = self.inner.clone();
        let handle = tokio::spawn(async move {
            inner.run(shutdown_rx).await;
        });

        *running = Some(RunningLoop {
            shutdown: shutdown_tx,
            handle,
        });

        tracing::info!(
            interval_secs = self.inner.poll_interval.as_secs_f64(),
            "Follower engine started"
        );
        true
    }

    /// Stop the loop and wait for an in-flight tick to finish.
    /// Returns false if it was not running.
    pub async fn stop(&self) -> bool {
        let Some(running) = self.inner.running.lock().await.take() else {
            tracing::debug!("Follower engine not running");
            return false;
        };

        let _ = running.shutdown.send(true);
        if let Err(e) = running.handle.await {
            tracing::error!(error = %e, "Follower engine task ended abnormally");
        }

        tracing::info!("Follower engine stopped");
        true
    }

    pub async fn status(&self) -> EngineStatus {
        let running = self
            .inner
            .running
            .lock()
            .await
            .as_ref()
            .is_some_and(|r| !r.handle.is_finished());

        EngineStatus {
            running,
            poll_interval_seconds: self.inner.poll_interval.as_secs(),
        }
    }

    /// Run one monitoring pass immediately, independent of the loop.
    pub async fn run_tick(&self) -> anyhow::Result<TickReport> {
        self.inner.tick().await
    }

    /// Record the master's latest size for a symbol. `None` keeps the stored entry price.
    pub async fn update_master_position(
        &self,
        master_user_id: i64,
        master_credential_id: i64,
        symbol: &str,
        size: Decimal,
        entry_price: Option<Decimal>,
    ) -> anyhow::Result<MasterPosition> {
        let position = self
            .inner
            .store
            .upsert_master_position(master_user_id, master_credential_id, symbol, size, entry_price)
            .await?;

        tracing::debug!(
            master = master_user_id,
            credential = master_credential_id,
            symbol,
            size = %size,
            "Master position updated"
        );
        Ok(position)
    }

    pub async fn resolve_failure(
        &self,
        failure_id: Uuid,
        resolved_by: i64,
    ) -> anyhow::Result<Option<Resolution>> {
        failures::resolve_failure(self.inner.store.as_ref(), failure_id, resolved_by).await
    }

    pub fn store(&self) -> &Arc<dyn EngineStore> {
        &self.inner.store
    }
}

impl EngineInner {
    async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        loop {
            if let Err(e) = self.tick().await {
                tracing::error!(error = %e, "Monitoring tick failed");
            }

            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {}
                _ = shutdown.changed() => break,
            }
        }

        tracing::debug!("Monitoring loop exited");
    }

    async fn tick(&self) -> anyhow::Result<TickReport> {
        let started = Instant::now();
        let configs = self.store.active_configs().await?;
        gauge!("active_follow_configs").set(configs.len() as f64);

        let mut groups: BTreeMap<(i64, i64), Vec<FollowConfig>> = BTreeMap::new();
        for config in configs {
            groups.entry(config.master_key()).or_default().push(config);
        }

        let mut report = TickReport {
            groups: groups.len(),
            ..Default::default()
        };

        // Held for the whole pass so concurrent run_tick calls serialize.
        let mut detector = self.detector.lock().await;

        for ((master_user_id, master_credential_id), followers) in &groups {
            match self
                .process_group(&mut detector, *master_user_id, *master_credential_id, followers)
                .await
            {
                Ok((signals, outcomes)) => {
                    report.signals += signals;
                    report.outcomes.merge(&outcomes);
                }
                Err(e) => {
                    report.group_errors += 1;
                    tracing::error!(
                        error = %e,
                        master = master_user_id,
                        credential = master_credential_id,
                        "Failed to process master group"
                    );
                }
            }
        }

        histogram!("engine_tick_duration_seconds").record(started.elapsed().as_secs_f64());

        if report.signals > 0 {
            tracing::info!(
                groups = report.groups,
                signals = report.signals,
                filled = report.outcomes.filled,
                failed = report.outcomes.failed,
                "Monitoring tick complete"
            );
        }

        Ok(report)
    }

    async fn process_group(
        &self,
        detector: &mut ChangeDetector,
        master_user_id: i64,
        master_credential_id: i64,
        followers: &[FollowConfig],
    ) -> anyhow::Result<(usize, DispatchSummary)> {
        let positions = self
            .store
            .master_positions(master_user_id, master_credential_id)
            .await?;
        let changed = detector.detect(&positions, self.store.as_ref()).await?;

        let mut outcomes = DispatchSummary::default();
        for master in &changed {
            let summary = dispatcher::dispatch(&self.reconciler, master, followers).await;
            outcomes.merge(&summary);
        }

        Ok((changed.len(), outcomes))
    }
}
