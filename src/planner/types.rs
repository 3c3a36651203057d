use std::sync::Arc;

use thiserror::Error;

use crate::plan::Plan;

/// Produces a plan without any backend. Called when no backend is configured
/// or the backend call fails.
pub type FallbackGenerator = Arc<dyn Fn(&str) -> Plan + Send + Sync>;

/// Per-call options for plan generation
#[derive(Clone, Default)]
pub struct PlanOptions {
    /// Custom fallback; `None` uses the default single-line fallback
    pub fallback: Option<FallbackGenerator>,
}

impl PlanOptions {
    pub fn with_fallback<F>(fallback: F) -> Self
    where
        F: Fn(&str) -> Plan + Send + Sync + 'static,
    {
        Self {
            fallback: Some(Arc::new(fallback)),
        }
    }

    pub(crate) fn run_fallback(&self, task: &str) -> Plan {
        match &self.fallback {
            Some(fallback) => fallback(task),
            None => default_fallback(task),
        }
    }
}

impl std::fmt::Debug for PlanOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlanOptions")
            .field("fallback", &self.fallback.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// Single synthetic step that echoes the task.
pub fn default_fallback(task: &str) -> Plan {
    Plan::new(vec![format!("Fallback plan for: {task}")])
}

/// Faults raised while talking to a text-generation backend
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("backend request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("backend returned a malformed body: {0}")]
    MalformedBody(String),

    #[error("backend returned an empty reply")]
    EmptyReply,
}

/// Errors surfaced by plan generation
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PlanError {
    #[error("plan generation was cancelled")]
    Cancelled,
}
