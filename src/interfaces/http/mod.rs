//! axum-based HTTP surface. Enriched from `other_examples`'
//! `integration-gateway` and `LLM-Dev-Ops-inference-gateway`, the only
//! crates in the retrieval pack that reach for an HTTP server framework —
//! the teacher itself is push-only/headless (see `bin/server.rs`) and has
//! no HTTP layer to imitate directly.

pub mod dto;
pub mod error;
pub mod gateway_app;
pub mod middleware;
pub mod user_routes;
pub mod worker_app;

pub use gateway_app::{build_gateway_router, GatewayState};
pub use worker_app::{build_worker_router, WorkerState};
