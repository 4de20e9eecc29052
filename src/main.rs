use std::sync::Arc;

use copybot::api::router::create_router;
use copybot::config::AppConfig;
use copybot::db;
use copybot::engine::{FollowerEngine, Reconciler};
use copybot::exchange::DefaultConnectorFactory;
use copybot::services::credentials::PgCredentialResolver;
use copybot::services::notifier::{Notifier, TradeNotifier};
use copybot::store::{EngineStore, PgStore};
use copybot::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    let addr = format!("{}:{}", config.host, config.port);

    let metrics_handle = copybot::metrics::init_metrics()?;

    tracing::info!("Connecting to database...");
    let pool = db::init_pool(&config.database_url).await?;
    db::run_migrations(&pool).await?;
    tracing::info!("Database connected, migrations applied");

    let store: Arc<dyn EngineStore> = Arc::new(PgStore::new(pool.clone()));

    let notifier: Option<Arc<dyn TradeNotifier>> = if config.has_telegram() {
        match (&config.telegram_bot_token, &config.telegram_chat_id) {
            (Some(token), Some(chat_id)) => {
                tracing::info!("Telegram notifications enabled");
                Some(Arc::new(Notifier::new(token.clone(), chat_id.clone())))
            }
            _ => None,
        }
    } else {
        tracing::info!("Telegram notifications disabled");
        None
    };

    let reconciler = Reconciler::new(
        store.clone(),
        Arc::new(PgCredentialResolver::new(pool)),
        Arc::new(DefaultConnectorFactory),
        notifier,
    );
    let engine = FollowerEngine::new(store.clone(), reconciler, config.engine_config());

    if config.engine_autostart {
        engine.start().await;
    } else {
        tracing::info!("Follower engine not started (ENGINE_AUTOSTART=false)");
    }

    tracing::info!(
        interval_secs = config.poll_interval_secs,
        detector = %config.detector_mode,
        "Engine configured"
    );

    let state = AppState {
        store,
        engine: engine.clone(),
        config,
        metrics_handle,
    };
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {addr}");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    engine.stop().await;
    tracing::info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();
}
