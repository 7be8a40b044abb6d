//! Configuration for the fabric's two binaries, organized by domain:
//! Gateway, Worker and Service (per-`ServiceKind` descriptors) — the same
//! domain-split the teacher uses for its own broker/strategy/risk configs.

mod gateway_config;
mod service_config;
mod worker_config;

pub use gateway_config::GatewayConfig;
pub use service_config::ServiceEnvConfig;
pub use worker_config::WorkerConfig;
