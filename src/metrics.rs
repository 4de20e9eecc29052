use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus exporter and register all engine metrics.
/// Returns a `PrometheusHandle` whose `render()` method produces the
/// text/plain Prometheus scrape payload.
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    register_metrics();
    Ok(handle)
}

/// Build a handle without installing a global recorder. Metrics emitted
/// through the `metrics` macros are not captured by it.
pub fn detached_handle() -> PrometheusHandle {
    PrometheusBuilder::new().build_recorder().handle()
}

fn register_metrics() {
    // Pre-register counters so they appear even before the first increment.
    counter!("signals_dispatched").absolute(0);
    counter!("reconciliations_filled").absolute(0);
    counter!("reconciliations_failed").absolute(0);
    counter!("reconciliations_skipped").absolute(0);
    counter!("followers_suspended").absolute(0);

    gauge!("active_follow_configs").set(0.0);

    // Histogram is lazily created on first record; force creation.
    histogram!("engine_tick_duration_seconds").record(0.0);
}
