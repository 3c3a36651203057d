use async_trait::async_trait;
use serde_json::Value;

use super::extract;
use super::types::BackendError;

/// Raw reply from a text-generation backend
#[derive(Debug, Clone, PartialEq)]
pub enum BackendReply {
    Text(String),
    Structured(Value),
}

impl BackendReply {
    /// A JSON string body is plain text; anything else is kept structured.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::String(text) => BackendReply::Text(text),
            other => BackendReply::Structured(other),
        }
    }

    /// Reduce the reply to text, walking the known provider envelopes for
    /// structured replies.
    pub fn into_text(self) -> String {
        match self {
            BackendReply::Text(text) => text,
            BackendReply::Structured(value) => extract::extract_text(&value),
        }
    }
}

impl From<String> for BackendReply {
    fn from(text: String) -> Self {
        BackendReply::Text(text)
    }
}

impl From<&str> for BackendReply {
    fn from(text: &str) -> Self {
        BackendReply::Text(text.to_string())
    }
}

/// Trait for backends that answer a prompt with text
#[async_trait]
pub trait BackendClient: Send + Sync {
    /// Send a single prompt and wait for the reply
    async fn send_prompt(&self, prompt: &str) -> Result<BackendReply, BackendError>;

    /// Get the backend type identifier (e.g., "http")
    fn backend_type(&self) -> &'static str;
}
