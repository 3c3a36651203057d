// Core backend abstraction
pub mod backend;
pub mod extract;
pub mod types;

// Backend implementations
pub mod http;

// Task -> plan adapter
pub mod adapter;

pub use adapter::{build_plan_prompt, build_summary_prompt, PlanAdapter};
pub use backend::{BackendClient, BackendReply};
pub use http::{BackendConfig, HttpBackend};
pub use types::{default_fallback, BackendError, FallbackGenerator, PlanError, PlanOptions};
