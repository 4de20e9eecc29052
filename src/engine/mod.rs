//! Position monitoring, change detection, fan-out and follower reconciliation.

pub mod change_detector;
pub mod dispatcher;
pub mod failures;
pub mod monitor;
pub mod reconciler;

pub use change_detector::{ChangeDetector, DetectorMode};
pub use dispatcher::DispatchSummary;
pub use failures::Resolution;
pub use monitor::{EngineConfig, EngineStatus, FollowerEngine, TickReport};
pub use reconciler::{ReconcileError, ReconcileOutcome, Reconciler, SkipReason};
