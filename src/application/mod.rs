//! Application layer: orchestrates domain + infrastructure into the two
//! running processes (`gateway`, `worker`).

/// The tick loop that drives every worker's `check-schedule`.
pub mod coordinator;

/// Request forwarding, service descriptors, health probing.
pub mod gateway;

/// Graceful shutdown sequence shared by both binaries.
pub mod shutdown;

/// Per-service worker runtime (rebind, scheduler gate, pipeline,
/// Flow's websocket lifecycle).
pub mod worker;

pub use coordinator::Coordinator;
