use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::plan::{Plan, Step};

use super::backend::BackendClient;
use super::http::{BackendConfig, HttpBackend};
use super::types::{BackendError, PlanError, PlanOptions};

/// Turns a task into a plan through an optional text-generation backend.
///
/// The adapter holds no per-call state, so one instance can be shared behind
/// an `Arc` and called concurrently.
pub struct PlanAdapter {
    backend: Option<Arc<dyn BackendClient>>,
}

impl PlanAdapter {
    /// `None` puts the adapter in fallback-only mode.
    pub fn new(backend: Option<Arc<dyn BackendClient>>) -> Self {
        Self { backend }
    }

    pub fn without_backend() -> Self {
        Self::new(None)
    }

    /// Build an adapter over the HTTP backend, if one is configured
    pub fn from_config(config: Option<BackendConfig>) -> Result<Self, BackendError> {
        let backend = match config {
            Some(config) => {
                let backend: Arc<dyn BackendClient> = Arc::new(HttpBackend::new(config)?);
                Some(backend)
            }
            None => None,
        };

        Ok(Self::new(backend))
    }

    pub fn has_backend(&self) -> bool {
        self.backend.is_some()
    }

    /// Generate a plan. Never fails: backend faults and empty replies fall
    /// back to `options.fallback`.
    pub async fn generate_plan(&self, task: &str, options: &PlanOptions) -> Plan {
        let token = CancellationToken::new();

        match self.generate_plan_cancellable(task, options, &token).await {
            Ok(plan) => plan,
            // `token` is local and never cancelled.
            Err(PlanError::Cancelled) => options.run_fallback(task),
        }
    }

    /// Like [`generate_plan`](Self::generate_plan), but stops waiting on the
    /// backend once `cancel` fires. Cancellation is reported as
    /// [`PlanError::Cancelled`] rather than replaced by the fallback.
    pub async fn generate_plan_cancellable(
        &self,
        task: &str,
        options: &PlanOptions,
        cancel: &CancellationToken,
    ) -> Result<Plan, PlanError> {
        let Some(backend) = &self.backend else {
            log::debug!("no backend configured; using fallback plan");
            return Ok(options.run_fallback(task));
        };

        let prompt = build_plan_prompt(task);

        let reply = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                log::debug!("plan generation cancelled");
                return Err(PlanError::Cancelled);
            }
            reply = backend.send_prompt(&prompt) => reply,
        };

        match reply {
            Ok(reply) => {
                let plan = Plan::from_reply(&reply.into_text());
                if plan.is_empty() {
                    log::warn!("backend reply held no plan steps; using fallback plan");
                    return Ok(options.run_fallback(task));
                }

                log::debug!("backend produced {} plan step(s)", plan.len());
                Ok(plan)
            }
            Err(error) => {
                log::warn!(
                    "{} backend error: {error}; using fallback plan",
                    backend.backend_type()
                );
                Ok(options.run_fallback(task))
            }
        }
    }

    /// Ask the backend to narrate the outcome of running `steps`.
    ///
    /// Without a backend a fixed summary is returned. Backend faults are
    /// returned to the caller.
    pub async fn summarize_execution(
        &self,
        steps: &[Step],
        context: &str,
    ) -> Result<String, BackendError> {
        let Some(backend) = &self.backend else {
            return Ok(format!(
                "Simulated execution of {} step(s) for: {context}",
                steps.len()
            ));
        };

        let prompt = build_summary_prompt(steps, context);
        let summary = backend.send_prompt(&prompt).await?.into_text();
        let summary = summary.trim();

        if summary.is_empty() {
            return Err(BackendError::EmptyReply);
        }

        Ok(summary.to_string())
    }
}

pub fn build_plan_prompt(task: &str) -> String {
    format!(
        "You are an intelligent agent planner. The user asks: \"{task}\"\n\
         Produce a short ordered plan as a plain numbered list (each step one line). \
         Include any clarifying questions if needed.\n\
         Return only the list lines, without commentary.\n"
    )
}

pub fn build_summary_prompt(steps: &[Step], context: &str) -> String {
    format!(
        "Task: {context}\n\
         Steps: {steps}\n\
         Summarize results after executing this plan as if the agent completed it.\n",
        steps = steps.join(", ")
    )
}
