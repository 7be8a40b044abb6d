//! `FabricGateway` (spec.md §4.1): the request-forwarding engine.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::{Client, Method};
use uuid::Uuid;

use crate::application::gateway::cache_key::fingerprint;
use crate::application::gateway::descriptor::{HealthState, ServiceDescriptor};
use crate::config::GatewayConfig;
use crate::domain::errors::FabricError;
use crate::domain::ports::KVCache;
use crate::domain::service_kind::ServiceKind;
use crate::infrastructure::core::{CircuitBreaker, CircuitState, HttpClientFactory, LoadBalancer};
use crate::infrastructure::observability::Metrics;

/// Numeric encoding for `fabric_circuit_breaker_state` (spec.md §6.1 `/metrics`).
fn breaker_state_gauge(state: CircuitState) -> f64 {
    match state {
        CircuitState::Closed => 0.0,
        CircuitState::HalfOpen => 1.0,
        CircuitState::Open => 2.0,
    }
}

/// A forwarded HTTP request, shaped independently of any particular server
/// framework so `interfaces::http` can translate axum's types into this.
pub struct ForwardRequest {
    pub method: String,
    /// Full inbound path, e.g. `/api/chart/history`.
    pub path: String,
    pub query: Vec<(String, String)>,
    pub user_id: Option<String>,
    pub body: Vec<u8>,
}

pub struct ForwardResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

const CACHE_TTL: Duration = Duration::from_secs(300);

pub struct FabricGateway {
    descriptors: HashMap<ServiceKind, Arc<ServiceDescriptor>>,
    clients: HashMap<ServiceKind, Client>,
    load_balancer: LoadBalancer,
    cache: Arc<dyn KVCache>,
    metrics: Arc<Metrics>,
}

impl FabricGateway {
    pub fn new(config: &GatewayConfig, cache: Arc<dyn KVCache>, metrics: Arc<Metrics>) -> Self {
        let mut descriptors = HashMap::new();
        let mut clients = HashMap::new();

        for kind in ServiceKind::ALL {
            let env_cfg = config
                .services
                .get(&kind)
                .cloned()
                .unwrap_or_else(|| crate::config::ServiceEnvConfig::from_env(kind));
            let descriptor = ServiceDescriptor::from_env_config(
                env_cfg.clone(),
                config.breaker_success_threshold,
            );
            clients.insert(
                kind,
                HttpClientFactory::create_gateway_pool_client(Duration::from_millis(
                    env_cfg.timeout_ms.max(1) as u64,
                )),
            );
            descriptors.insert(kind, Arc::new(descriptor));
        }

        Self {
            descriptors,
            clients,
            load_balancer: LoadBalancer::new(),
            cache,
            metrics,
        }
    }

    pub fn descriptors_iter(&self) -> impl Iterator<Item = &Arc<ServiceDescriptor>> {
        self.descriptors.values()
    }

    pub fn descriptor(&self, kind: ServiceKind) -> Option<&Arc<ServiceDescriptor>> {
        self.descriptors.get(&kind)
    }

    pub fn breaker(&self, kind: ServiceKind) -> Option<Arc<CircuitBreaker>> {
        self.descriptors.get(&kind).map(|d| d.breaker.clone())
    }

    /// Administrative reset (spec.md §4.1.1 `resetBreaker`).
    pub async fn reset_breaker(&self, kind: ServiceKind) {
        if let Some(descriptor) = self.descriptors.get(&kind) {
            descriptor.breaker.reset().await;
        }
    }

    /// `toggleService` (spec.md §4.1.1). Returns the new enabled state.
    pub fn toggle_service(&self, kind: ServiceKind) -> Option<bool> {
        self.descriptors.get(&kind).map(|d| d.toggle())
    }

    pub async fn clear_cache(&self) {
        self.cache.clear().await;
    }

    /// Parses `/api/<service>/<rest...>` into `(kind, remainder)`.
    fn resolve_service(path: &str) -> Result<(ServiceKind, String), FabricError> {
        let mut segments = path.trim_start_matches('/').split('/');
        let root = segments.next().unwrap_or("");
        if root != "api" {
            return Err(FabricError::NotFound(format!("unknown route: {path}")));
        }
        let service_segment = segments
            .next()
            .ok_or_else(|| FabricError::NotFound(format!("missing service segment: {path}")))?;
        let kind = ServiceKind::from_str(service_segment)
            .map_err(|_| FabricError::NotFound(format!("unknown service: {service_segment}")))?;
        let remainder = segments.collect::<Vec<_>>().join("/");
        Ok((kind, format!("/{remainder}")))
    }

    /// Request forwarding algorithm (spec.md §4.1.2).
    pub async fn route(&self, request: ForwardRequest) -> Result<ForwardResponse, FabricError> {
        let start = Instant::now();
        let (kind, remainder) = Self::resolve_service(&request.path)?;

        let descriptor = self
            .descriptors
            .get(&kind)
            .expect("descriptor exists for every ServiceKind");

        if !descriptor.is_enabled() {
            return Err(FabricError::ServiceDisabled(kind));
        }

        let is_idempotent = request.method.eq_ignore_ascii_case("GET");
        let key = fingerprint(kind, &request.method, &remainder, &request.query);

        if is_idempotent {
            if let Some(cached) = self.cache.get(&key).await {
                self.metrics.inc_cache_hit(&kind.to_string());
                self.record(&request.method, kind, &remainder, 200, start);
                return Ok(ForwardResponse {
                    status: 200,
                    body: cached,
                });
            }
            self.metrics.inc_cache_miss(&kind.to_string());
        }

        let candidates = descriptor.healthy_or_degraded();
        if candidates.is_empty() {
            self.record(&request.method, kind, &remainder, 503, start);
            return Err(FabricError::ServiceUnavailable(kind));
        }

        let instance = self.load_balancer.next(kind, candidates).to_string();
        let client = self
            .clients
            .get(&kind)
            .expect("client exists for every ServiceKind");
        let method = Method::from_str(&request.method)
            .map_err(|_| FabricError::Invalid(format!("unsupported method: {}", request.method)))?;
        let url = format!("{instance}{remainder}");
        let request_id = Uuid::new_v4().to_string();
        let user_id = request.user_id.clone();
        let body = request.body.clone();
        let query = request.query.clone();
        let timeout = descriptor.timeout;

        let backend_start = Instant::now();
        let breaker_result = descriptor
            .breaker
            .call(async {
                let mut builder = client
                    .request(method, &url)
                    .timeout(timeout)
                    .header("X-Gateway-Request-ID", &request_id)
                    .query(&query)
                    .body(body);
                if let Some(ref uid) = user_id {
                    builder = builder.header("X-User-ID", uid);
                }
                match builder.send().await {
                    Ok(resp) => {
                        let status = resp.status().as_u16();
                        let bytes = resp.bytes().await.map(|b| b.to_vec()).unwrap_or_default();
                        if status >= 500 {
                            Err(FabricError::Upstream5xx { service: kind, status })
                        } else {
                            Ok((status, bytes))
                        }
                    }
                    Err(e) if e.is_timeout() => Err(FabricError::Timeout { service: kind }),
                    Err(e) => Err(FabricError::Transport {
                        service: kind,
                        detail: e.to_string(),
                    }),
                }
            })
            .await;
        self.metrics
            .observe_backend_response(&kind.to_string(), backend_start.elapsed().as_secs_f64());
        self.metrics.set_breaker_state(
            &kind.to_string(),
            breaker_state_gauge(descriptor.breaker.state().await),
        );

        let (status, bytes) = match breaker_result {
            Ok(pair) => pair,
            Err(crate::infrastructure::core::circuit_breaker::CircuitBreakerError::Open(_)) => {
                self.record(&request.method, kind, &remainder, 503, start);
                return Err(FabricError::ServiceUnavailable(kind));
            }
            Err(crate::infrastructure::core::circuit_breaker::CircuitBreakerError::Inner(e)) => {
                let status = e.http_status();
                self.record(&request.method, kind, &remainder, status, start);
                return Err(e);
            }
        };

        if is_idempotent && status < 400 {
            self.cache.set(&key, bytes.clone(), CACHE_TTL).await;
        }

        self.record(&request.method, kind, &remainder, status, start);
        Ok(ForwardResponse { status, body: bytes })
    }

    fn record(&self, method: &str, kind: ServiceKind, path: &str, status: u16, start: Instant) {
        self.metrics
            .record_request(method, &kind.to_string(), path, status);
        self.metrics
            .observe_duration(method, path, start.elapsed().as_secs_f64());
    }

    /// Snapshot read for `GET /services/status` (spec.md §4.1.1 `healthSnapshot`).
    pub async fn health_snapshot(&self) -> HashMap<ServiceKind, (HealthState, usize, String)> {
        let mut snapshot = HashMap::new();
        for (kind, descriptor) in &self.descriptors {
            let state = descriptor.breaker.state().await;
            snapshot.insert(
                *kind,
                (
                    descriptor.health(),
                    descriptor.healthy_or_degraded().len(),
                    state.to_string(),
                ),
            );
        }
        snapshot
    }
}
