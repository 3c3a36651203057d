//! Terminal chat client for the agent backend.
//!
//! Each line typed is POSTed as `{ "message": ... }` to the chat endpoint and
//! the `reply` field of the answer is shown as the agent's turn. History is
//! kept locally for the session only.

use std::path::PathBuf;

use anyhow::Context;
use rustyline::error::ReadlineError;
use rustyline::{Config, DefaultEditor};
use serde::{Deserialize, Serialize};

const DEFAULT_CHAT_URL: &str = "http://127.0.0.1:3000/chat";

pub const UNAVAILABLE_REPLY: &str = "Agent service is not available.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    pub url: String,
}

impl ChatConfig {
    /// `url` wins over `AGENTVERSE_CHAT_URL`, which wins over the default.
    pub fn resolve(url: Option<String>) -> Self {
        let url = url
            .or_else(|| std::env::var("AGENTVERSE_CHAT_URL").ok())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_CHAT_URL.to_string());

        Self { url }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Agent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn render(&self) -> String {
        let speaker = match self.role {
            Role::User => "You",
            Role::Agent => "Agent",
        };
        format!("{speaker}: {}", self.content)
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

#[derive(Deserialize)]
struct ChatReply {
    reply: String,
}

pub struct ChatSession {
    config: ChatConfig,
    client: reqwest::Client,
    history: Vec<ChatMessage>,
}

impl ChatSession {
    pub fn new(config: ChatConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
            history: Vec::new(),
        }
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// Send one message and record both turns. Blank input is ignored and
    /// returns `None`.
    pub async fn send(&mut self, input: &str) -> Option<&ChatMessage> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }

        self.history.push(ChatMessage {
            role: Role::User,
            content: input.to_string(),
        });

        let content = match self.request_reply(input).await {
            Ok(reply) => reply,
            Err(error) => {
                log::warn!("chat request to {} failed: {error:#}", self.config.url);
                UNAVAILABLE_REPLY.to_string()
            }
        };

        self.history.push(ChatMessage {
            role: Role::Agent,
            content,
        });
        self.history.last()
    }

    async fn request_reply(&self, message: &str) -> anyhow::Result<String> {
        let reply: ChatReply = self
            .client
            .post(&self.config.url)
            .json(&ChatRequest { message })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(reply.reply)
    }
}

fn history_path() -> Option<PathBuf> {
    let mut path = dirs::home_dir()?;
    path.push(".agentverse");
    path.push("chat-history.txt");
    Some(path)
}

/// Run the interactive chat loop until `quit`, `exit` or Ctrl-D.
pub fn run(config: ChatConfig) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Runtime::new().context("failed to create runtime")?;

    let editor_config = Config::builder().auto_add_history(true).build();
    let mut editor =
        DefaultEditor::with_config(editor_config).context("failed to create line editor")?;

    let history_file = history_path();
    if let Some(path) = &history_file {
        // A missing history file is normal on first run.
        let _ = editor.load_history(path);
    }

    println!("Agentverse chat ({})", config.url);
    println!("Type 'quit' to exit");
    println!();

    let mut session = ChatSession::new(config);

    loop {
        match editor.readline("you> ") {
            Ok(line) => {
                let line = line.trim();
                if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
                    break;
                }

                if let Some(reply) = runtime.block_on(session.send(line)) {
                    println!("{}", reply.render());
                    println!();
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C (use 'quit' to exit)");
            }
            Err(ReadlineError::Eof) => break,
            Err(error) => return Err(error).context("readline error"),
        }
    }

    if let Some(path) = &history_file {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        editor
            .save_history(path)
            .with_context(|| format!("failed to save chat history to {}", path.display()))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use tokio_util::sync::CancellationToken;

    use crate::memory::MemoryStore;
    use crate::planner::PlanAdapter;
    use crate::server::{router, AppState};

    async fn spawn_backend(dir: &tempfile::TempDir) -> String {
        let state = AppState {
            adapter: Arc::new(PlanAdapter::without_backend()),
            memory: Arc::new(MemoryStore::new(dir.path().join("memory.json"))),
            shutdown: CancellationToken::new(),
        };
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(state)).await.unwrap();
        });
        format!("http://{addr}/chat")
    }

    #[test]
    fn render_labels_speakers() {
        let user = ChatMessage {
            role: Role::User,
            content: "hi".to_string(),
        };
        let agent = ChatMessage {
            role: Role::Agent,
            content: "hello".to_string(),
        };

        assert_eq!(user.render(), "You: hi");
        assert_eq!(agent.render(), "Agent: hello");
    }

    #[test]
    fn explicit_url_wins() {
        let config = ChatConfig::resolve(Some("http://example.test/chat".to_string()));
        assert_eq!(config.url, "http://example.test/chat");
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&Role::Agent).unwrap();
        assert_eq!(json, "\"agent\"");
    }

    #[tokio::test]
    async fn blank_input_is_ignored() {
        let mut session = ChatSession::new(ChatConfig {
            url: "http://127.0.0.1:61235/chat".to_string(),
        });

        assert!(session.send("   ").await.is_none());
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn unreachable_service_yields_unavailable_reply() {
        let mut session = ChatSession::new(ChatConfig {
            url: "http://127.0.0.1:61235/chat".to_string(),
        });

        let reply = session.send("hello").await.cloned().expect("reply recorded");

        assert_eq!(reply.content, UNAVAILABLE_REPLY);
        assert_eq!(session.history().len(), 2);
        assert_eq!(session.history()[0].role, Role::User);
    }

    #[tokio::test]
    async fn reply_comes_from_chat_route() {
        let dir = tempfile::tempdir().unwrap();
        let url = spawn_backend(&dir).await;
        let mut session = ChatSession::new(ChatConfig { url });

        let reply = session.send("plan a picnic").await.cloned().expect("reply recorded");

        assert_eq!(reply.role, Role::Agent);
        assert_eq!(reply.content, "1. Fallback plan for: plan a picnic");
    }
}
