//! L3 Worker runtime (spec.md §4.2–§4.5): the scheduler-driven, user-bound
//! analysis domain each `worker` process hosts exactly one of.

pub mod flow_driver;
pub mod flow_lifecycle;
pub mod flow_ring;
pub mod worker;

pub use flow_driver::FlowLifecycleDriver;
pub use flow_lifecycle::{FlowAction, FlowEvent, FlowLifecycle, FlowState};
pub use flow_ring::FlowRing;
pub use worker::{PipelineOutcome, Worker, SYSTEM_DEFAULT_USER};
