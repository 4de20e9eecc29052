use metrics::counter;
use serde::Serialize;
use uuid::Uuid;

use crate::models::failure::NewFailureRecord;
use crate::models::FailureRecord;
use crate::store::EngineStore;

/// Outcome of resolving one failure record.
#[derive(Debug, Clone, Serialize)]
pub struct Resolution {
    pub failure: FailureRecord,
    pub remaining_unresolved: usize,
    /// True when this resolution cleared the last failure and the follow
    /// config was switched back on.
    pub reactivated: bool,
}

/// Record a failure and deactivate the follower's config.
///
/// Each step is attempted even if the previous one failed; the returned error
/// is the first one encountered.
pub async fn suspend_follower(
    store: &dyn EngineStore,
    failure: &NewFailureRecord,
) -> anyhow::Result<FailureRecord> {
    let recorded = store.record_failure(failure).await;

    match store.set_config_active(failure.user_id, false).await {
        Ok(true) => {
            counter!("followers_suspended").increment(1);
            tracing::warn!(
                follower = failure.user_id,
                error_type = %failure.error_type,
                "Follower suspended after trade failure"
            );
        }
        Ok(false) => {
            tracing::warn!(follower = failure.user_id, "No follow config to suspend");
        }
        Err(e) => {
            tracing::error!(
                error = %e,
                follower = failure.user_id,
                "Failed to deactivate follow config"
            );
        }
    }

    recorded
}

/// Mark a failure resolved. When the user has no unresolved failures left,
/// their follow config is reactivated. Returns `None` for an unknown id.
pub async fn resolve_failure(
    store: &dyn EngineStore,
    failure_id: Uuid,
    resolved_by: i64,
) -> anyhow::Result<Option<Resolution>> {
    let Some(failure) = store.resolve(failure_id, resolved_by).await? else {
        return Ok(None);
    };

    let remaining = store.unresolved_for_user(failure.user_id).await?;
    let reactivated = if remaining.is_empty() {
        store.set_config_active(failure.user_id, true).await?
    } else {
        false
    };

    tracing::info!(
        failure_id = %failure.id,
        follower = failure.user_id,
        resolved_by,
        remaining = remaining.len(),
        reactivated,
        "Failure resolved"
    );

    Ok(Some(Resolution {
        failure,
        remaining_unresolved: remaining.len(),
        reactivated,
    }))
}
