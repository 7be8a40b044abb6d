//! Worker process entrypoint: hosts exactly one `ServiceKind`'s analysis
//! pipeline. `WORKER_SERVICE` selects which; the `user` service additionally
//! mounts the profile/stocks/model/wanted-services routes. `flow` additionally
//! runs a `FlowLifecycleDriver` task for its websocket subscription lifecycle.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use stock_fabric::application::shutdown::graceful_shutdown;
use stock_fabric::application::worker::{FlowLifecycleDriver, FlowRing, Worker};
use stock_fabric::config::WorkerConfig;
use stock_fabric::domain::ports::UserConfigStore;
use stock_fabric::domain::service_kind::ServiceKind;
use stock_fabric::infrastructure::adapters::{
    MockAnalysisAdapter, MockDataSourceAdapter, MockNotificationAdapter,
};
use stock_fabric::infrastructure::observability::Metrics;
use stock_fabric::infrastructure::signal_store::SignalStore;
use stock_fabric::infrastructure::user_config_store::{CachedUserConfigStore, InMemoryUserConfigStore};
use stock_fabric::interfaces::http::{build_worker_router, WorkerState};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, Level};
use tracing_subscriber::prelude::*;

const USER_CONFIG_CACHE_TTL: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let config = WorkerConfig::from_env()?;
    info!(service = %config.service, "worker {} starting", env!("CARGO_PKG_VERSION"));

    let metrics = Arc::new(Metrics::new()?);
    let inner_store = Arc::new(InMemoryUserConfigStore::new());
    let user_store: Arc<dyn UserConfigStore> =
        Arc::new(CachedUserConfigStore::new(inner_store, USER_CONFIG_CACHE_TTL));

    let worker = Arc::new(Worker::new(
        config.service,
        user_store.clone(),
        Arc::new(MockAnalysisAdapter::new(config.service)),
        Arc::new(MockNotificationAdapter::new()),
        Arc::new(SignalStore::new()),
        metrics,
    ));

    let shutdown = CancellationToken::new();

    // Flow is the one service with a live websocket subscription alongside
    // its scheduled pipeline; every other service only runs the
    // health/check-schedule/execute/signal quartet below.
    let flow_handle = if config.service == ServiceKind::Flow {
        let data_source = Arc::new(MockDataSourceAdapter::new());
        let ring = Arc::new(FlowRing::new());
        let driver = Arc::new(FlowLifecycleDriver::new(data_source, ring, config.flow_tickers.clone()));
        Some(tokio::spawn(driver.run(shutdown.clone())))
    } else {
        None
    };

    let state = WorkerState { worker, user_store };
    let router = build_worker_router(state);

    let addr = format!("{}:{}", config.bind_address, config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, service = %config.service, "worker listening");

    let server = axum::serve(listener, router).with_graceful_shutdown(async move {
        let _ = tokio::signal::ctrl_c().await;
        info!("ctrl-c received, shutting down worker");
    });

    server.await?;

    shutdown.cancel();
    if let Some(handle) = flow_handle {
        let _ = handle.await;
    }
    graceful_shutdown(&config.service.to_string(), Duration::from_secs(5)).await;

    Ok(())
}
