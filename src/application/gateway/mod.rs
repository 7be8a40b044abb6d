//! L4 Gateway core (spec.md §4.1): request forwarding, the per-backend
//! `ServiceDescriptor` (instance pool + breaker + health), the background
//! health prober, and the cache-key fingerprinting function.

pub mod cache_key;
pub mod descriptor;
pub mod fabric_gateway;
pub mod health_monitor;

pub use descriptor::{HealthState, ServiceDescriptor};
pub use fabric_gateway::{FabricGateway, ForwardRequest, ForwardResponse};
pub use health_monitor::HealthMonitor;
