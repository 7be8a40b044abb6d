//! Gateway process entrypoint: request forwarding, admin routes, the
//! background health prober and the scheduler-driving coordinator.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use stock_fabric::application::gateway::HealthMonitor;
use stock_fabric::application::shutdown::graceful_shutdown;
use stock_fabric::application::Coordinator;
use stock_fabric::application::gateway::FabricGateway;
use stock_fabric::config::GatewayConfig;
use stock_fabric::domain::ports::KVCache;
use stock_fabric::infrastructure::core::LocalCache;
use stock_fabric::infrastructure::observability::Metrics;
use stock_fabric::interfaces::http::{build_gateway_router, GatewayState};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, Level};
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    info!("gateway {} starting", env!("CARGO_PKG_VERSION"));

    let config = GatewayConfig::from_env()?;
    let metrics = Arc::new(Metrics::new()?);
    let cache: Arc<dyn KVCache> = Arc::new(LocalCache::new());

    // `GatewayConfig::distributed_cache_url` selects a distributed backend
    // when configured; this crate ships only the in-process fallback (see
    // DESIGN.md), so both branches construct the same `LocalCache` today.
    if config.distributed_cache_url.is_some() {
        info!("distributed cache URL configured but no distributed backend is wired in this build; using in-process cache");
    }

    let gateway = Arc::new(FabricGateway::new(&config, cache.clone(), metrics.clone()));

    let shutdown = CancellationToken::new();

    let health_monitor = HealthMonitor::new(gateway.clone());
    let health_monitor_handle = tokio::spawn(health_monitor.run(shutdown.clone()));

    let coordinator = Coordinator::new(
        gateway.clone(),
        Duration::from_secs(config.coordinator_tick_secs),
        Duration::from_secs(config.coordinator_tick_deadline_secs),
    );
    let coordinator_handle = tokio::spawn(coordinator.run(shutdown.clone()));

    let state = GatewayState {
        gateway,
        cache,
        metrics,
    };
    let router = build_gateway_router(state);

    let addr = format!("{}:{}", config.bind_address, config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, "gateway listening");

    let server = axum::serve(listener, router).with_graceful_shutdown(async move {
        let _ = tokio::signal::ctrl_c().await;
        info!("ctrl-c received, shutting down gateway");
    });

    server.await?;

    shutdown.cancel();
    let _ = tokio::join!(health_monitor_handle, coordinator_handle);
    graceful_shutdown("gateway", Duration::from_secs(5)).await;

    Ok(())
}
