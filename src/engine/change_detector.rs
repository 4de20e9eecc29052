use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::models::{MasterPosition, PositionKey};
use crate::store::SnapshotStore;

/// Where the detector keeps its "last observed size" map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetectorMode {
    /// Process-local only. A restart treats every non-flat position as new.
    #[default]
    InMemory,
    /// Loaded lazily from the snapshot store and written through on every change.
    Persisted,
}

impl DetectorMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectorMode::InMemory => "memory",
            DetectorMode::Persisted => "persisted",
        }
    }
}

impl std::str::FromStr for DetectorMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" | "in_memory" => Ok(DetectorMode::InMemory),
            "persisted" | "db" => Ok(DetectorMode::Persisted),
            other => Err(format!("expected 'memory' or 'persisted', got '{other}'")),
        }
    }
}

impl std::fmt::Display for DetectorMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decides which master positions warrant a dispatch on this tick.
#[derive(Debug, Default)]
pub struct ChangeDetector {
    mode: DetectorMode,
    last_seen: HashMap<PositionKey, Decimal>,
    loaded: bool,
}

impl ChangeDetector {
    pub fn new(mode: DetectorMode) -> Self {
        Self {
            mode,
            last_seen: HashMap::new(),
            loaded: false,
        }
    }

    pub fn last_seen(&self, key: &PositionKey) -> Option<Decimal> {
        self.last_seen.get(key).copied()
    }

    /// Record `size` for `key`. Returns true when the observation should be
    /// dispatched: a non-flat first sighting, or any exact change.
    pub fn observe(&mut self, key: &PositionKey, size: Decimal) -> bool {
        match self.last_seen.insert(key.clone(), size) {
            None => !size.is_zero(),
            Some(previous) => previous != size,
        }
    }

    /// Filter `positions` down to the ones that changed since the last call.
    ///
    /// In persisted mode the first call loads the snapshot; a load failure is
    /// returned so the caller can skip the group and retry on the next tick.
    pub async fn detect<S>(
        &mut self,
        positions: &[MasterPosition],
        snapshots: &S,
    ) -> anyhow::Result<Vec<MasterPosition>>
    where
        S: SnapshotStore + ?Sized,
    {
        if self.mode == DetectorMode::Persisted && !self.loaded {
            let rows = snapshots.load_snapshot().await?;
            tracing::info!(entries = rows.len(), "Change detector snapshot loaded");
            // Sizes observed before the load finished win over stale rows.
            for (key, size) in rows {
                self.last_seen.entry(key).or_insert(size);
            }
            self.loaded = true;
        }

        let mut changed = Vec::new();
        for position in positions {
            let key = position.key();
            let previous = self.last_seen(&key);
            let recorded = previous != Some(position.size);

            if self.observe(&key, position.size) {
                tracing::info!(
                    master = position.master_user_id,
                    credential = position.master_credential_id,
                    symbol = %position.symbol,
                    previous = ?previous,
                    size = %position.size,
                    "Master position change detected"
                );
                changed.push(position.clone());
            }

            if recorded && self.mode == DetectorMode::Persisted {
                if let Err(e) = snapshots.save_size(&key, position.size).await {
                    tracing::warn!(
                        error = %e,
                        key = %key,
                        "Failed to persist detector snapshot"
                    );
                }
            }
        }

        Ok(changed)
    }
}
