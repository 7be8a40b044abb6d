//! Gateway request-forwarding scenarios (spec.md §8 scenarios a, b): a
//! basic forward through a live backend, and a circuit breaker opening
//! after consecutive backend failures.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use httpmock::prelude::*;
use stock_fabric::application::gateway::{FabricGateway, ForwardRequest, HealthState};
use stock_fabric::config::{GatewayConfig, ServiceEnvConfig};
use stock_fabric::domain::errors::FabricError;
use stock_fabric::domain::ports::KVCache;
use stock_fabric::domain::service_kind::ServiceKind;
use stock_fabric::infrastructure::core::LocalCache;
use stock_fabric::infrastructure::observability::Metrics;

fn service_config(kind: ServiceKind, instances: Vec<String>, fail_max: usize) -> ServiceEnvConfig {
    ServiceEnvConfig {
        kind,
        instances,
        enabled: true,
        timeout_ms: 2_000,
        retry_budget: 0,
        fail_max,
        reset_timeout: Duration::from_secs(30),
    }
}

fn gateway_config(chart: ServiceEnvConfig) -> GatewayConfig {
    let mut services = HashMap::new();
    for kind in ServiceKind::ALL {
        if kind == ServiceKind::Chart {
            services.insert(kind, chart.clone());
        } else {
            services.insert(kind, ServiceEnvConfig::from_env(kind));
        }
    }
    GatewayConfig {
        bind_address: "0.0.0.0".to_string(),
        port: 0,
        services,
        coordinator_tick_secs: 60,
        coordinator_tick_deadline_secs: 30,
        breaker_success_threshold: 1,
        distributed_cache_url: None,
    }
}

async fn mark_healthy(gateway: &FabricGateway, kind: ServiceKind) {
    gateway
        .descriptor(kind)
        .expect("descriptor exists")
        .set_health(HealthState::Healthy);
}

/// spec.md §8 scenario (a): a GET request against a healthy single-instance
/// backend is forwarded, the response is returned verbatim, and the
/// idempotent response is cached so a repeat request hits the cache instead
/// of the backend.
#[tokio::test]
async fn basic_forward_succeeds_and_caches_idempotent_response() {
    let server = MockServer::start();
    let backend_hit = server.mock(|when, then| {
        when.method(GET).path("/history");
        then.status(200).body("ohlc-bars");
    });

    let cfg = gateway_config(service_config(ServiceKind::Chart, vec![server.base_url()], 3));
    let gateway = FabricGateway::new(&cfg, Arc::new(LocalCache::new()), Arc::new(Metrics::new().unwrap()));
    mark_healthy(&gateway, ServiceKind::Chart).await;

    let first = gateway
        .route(ForwardRequest {
            method: "GET".to_string(),
            path: "/api/chart/history".to_string(),
            query: vec![],
            user_id: None,
            body: vec![],
        })
        .await
        .unwrap();
    assert_eq!(first.status, 200);
    assert_eq!(first.body, b"ohlc-bars");
    backend_hit.assert_hits(1);

    let second = gateway
        .route(ForwardRequest {
            method: "GET".to_string(),
            path: "/api/chart/history".to_string(),
            query: vec![],
            user_id: None,
            body: vec![],
        })
        .await
        .unwrap();
    assert_eq!(second.body, b"ohlc-bars");
    // The second GET is served from the response cache; the backend never
    // sees a second request.
    backend_hit.assert_hits(1);
}

/// spec.md §8 scenario (b): `fail_max` consecutive backend failures open
/// the circuit breaker, and the next request fails fast with
/// `ServiceUnavailable` instead of reaching the backend again.
#[tokio::test]
async fn repeated_failures_open_the_circuit_breaker() {
    let server = MockServer::start();
    let backend_hit = server.mock(|when, then| {
        when.method(GET).path("/history");
        then.status(500).body("upstream exploded");
    });

    let cfg = gateway_config(service_config(ServiceKind::Chart, vec![server.base_url()], 2));
    let gateway = FabricGateway::new(&cfg, Arc::new(LocalCache::new()), Arc::new(Metrics::new().unwrap()));
    mark_healthy(&gateway, ServiceKind::Chart).await;

    for _ in 0..2 {
        let result = gateway
            .route(ForwardRequest {
                method: "GET".to_string(),
                path: "/api/chart/history".to_string(),
                query: vec![],
                user_id: None,
                body: vec![],
            })
            .await;
        assert!(matches!(result, Err(FabricError::Upstream5xx { .. })));
    }
    backend_hit.assert_hits(2);

    // The breaker is now open; a third request fails fast without another
    // backend call.
    let third = gateway
        .route(ForwardRequest {
            method: "GET".to_string(),
            path: "/api/chart/history".to_string(),
            query: vec![],
            user_id: None,
            body: vec![],
        })
        .await;
    assert!(matches!(third, Err(FabricError::ServiceUnavailable(ServiceKind::Chart))));
    backend_hit.assert_hits(2);
}
