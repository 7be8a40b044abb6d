//! Domain-specific error types
pub mod errors;

/// Clock & market-calendar
pub mod market_phase;

/// Port interfaces: adapter contracts
pub mod ports;

/// Per-worker scheduling decision function
pub mod scheduler;

/// ServiceKind and related enums
pub mod service_kind;

/// Signal store data model
pub mod signal;

/// Per-user configuration snapshot
pub mod user_config;
