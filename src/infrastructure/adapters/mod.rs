//! Mock/stub implementations of every `domain::ports` trait.
//!
//! The real exchange, filing, LLM-vendor and chat-transport clients are out
//! of scope (spec.md §1); these adapters stand in for them the way the
//! teacher's `infrastructure::mock` stands in for a broker in `Mock`
//! execution mode, so the rest of the fabric can be built and tested
//! end-to-end without any outbound network calls.

pub mod mock_analysis;
pub mod mock_data_source;
pub mod mock_llm;
pub mod mock_notification;

pub use mock_analysis::MockAnalysisAdapter;
pub use mock_data_source::MockDataSourceAdapter;
pub use mock_llm::MockLlmAdapter;
pub use mock_notification::MockNotificationAdapter;
