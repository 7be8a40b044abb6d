//! Out-of-process-facing building blocks: circuit breaker, cache, load
//! balancer and HTTP client pooling (`core`), Prometheus metrics
//! (`observability`), the per-user signal log (`signal_store`), the
//! reference `UserConfigStore` (`user_config_store`), and adapter
//! implementations for every port in `domain::ports` (`adapters`).

pub mod adapters;
pub mod core;
pub mod observability;
pub mod signal_store;
pub mod user_config_store;

pub use core::{CircuitBreaker, HttpClientFactory, LoadBalancer, LocalCache};
pub use observability::Metrics;
pub use signal_store::SignalStore;
pub use user_config_store::{CachedUserConfigStore, InMemoryUserConfigStore};
