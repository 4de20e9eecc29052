pub mod api;
pub mod config;
pub mod db;
pub mod engine;
pub mod errors;
pub mod exchange;
pub mod metrics;
pub mod models;
pub mod services;
pub mod store;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::engine::FollowerEngine;
use crate::store::EngineStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn EngineStore>,
    pub engine: FollowerEngine,
    pub config: AppConfig,
    pub metrics_handle: metrics_exporter_prometheus::PrometheusHandle,
}
