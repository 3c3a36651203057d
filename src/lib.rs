pub mod chat;
pub mod cli;
pub mod input;
pub mod logging;
pub mod memory;
pub mod plan;
pub mod planner;
pub mod server;

use anyhow::{bail, Context};
use serde_json::json;
use tokio_util::sync::CancellationToken;

const MAX_TASK_BYTES: usize = 8 * 1024;

pub fn run() -> anyhow::Result<()> {
    let mut config = cli::CliConfig::from_env().map_err(anyhow::Error::msg)?;

    if config.show_version {
        cli::print_version();
    }

    if config.show_help {
        cli::print_help();
    }

    if config.show_version || config.show_help {
        return Ok(());
    }

    let command = config
        .command
        .take()
        .context("a command is required. Run `agentverse --help` for usage.")?;

    logging::init(config.debug);
    log::debug!("debug logging enabled");

    match command {
        cli::Command::Serve { port } => handle_serve(port),
        cli::Command::Plan { task } => handle_plan(task),
        cli::Command::Chat { url } => chat::run(chat::ChatConfig::resolve(url)),
        cli::Command::Memory => handle_memory(),
    }
}

fn build_adapter() -> anyhow::Result<planner::PlanAdapter> {
    let backend_config = planner::BackendConfig::from_env();
    if let Some(config) = &backend_config {
        log::debug!("using text-generation backend at {}", config.endpoint);
    }

    planner::PlanAdapter::from_config(backend_config).context("failed to set up backend client")
}

fn handle_serve(port: Option<u16>) -> anyhow::Result<()> {
    let mut server_config = server::ServerConfig::from_env();
    if let Some(port) = port {
        server_config.port = port;
    }

    let adapter = build_adapter()?;
    let memory = memory::MemoryStore::from_env();

    let runtime = tokio::runtime::Runtime::new().context("failed to create runtime")?;
    runtime.block_on(server::serve(server_config, adapter, memory))
}

fn handle_plan(task: Option<String>) -> anyhow::Result<()> {
    let task = match task {
        Some(task) => task,
        None if !input::InputCollector::stdin_is_terminal() => {
            input::InputCollector::collect_task().context("failed to read task from STDIN")?
        }
        None => bail!("plan requires a task. Pass it as an argument or pipe it on STDIN."),
    };

    enforce_task_limit(&task)?;

    let adapter = build_adapter()?;
    let runtime = tokio::runtime::Runtime::new().context("failed to create runtime")?;

    let plan = runtime.block_on(async {
        let cancel = CancellationToken::new();
        let signal = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                signal.cancel();
            }
        });

        adapter
            .generate_plan_cancellable(&task, &planner::PlanOptions::default(), &cancel)
            .await
    })?;

    log::info!("plan has {} step(s)", plan.len());
    print_json(json!({ "plan": plan }));

    Ok(())
}

fn handle_memory() -> anyhow::Result<()> {
    let store = memory::MemoryStore::from_env();
    let runtime = tokio::runtime::Runtime::new().context("failed to create runtime")?;

    let notes = runtime
        .block_on(store.notes())
        .context("failed to read memory")?;

    print_json(json!({ "memory": notes }));

    Ok(())
}

fn enforce_task_limit(task: &str) -> anyhow::Result<()> {
    if task.trim().is_empty() {
        bail!("task must not be empty");
    }

    if task.len() > MAX_TASK_BYTES {
        bail!(
            "task is too long ({} bytes > {} allowed)",
            task.len(),
            MAX_TASK_BYTES
        );
    }

    Ok(())
}

fn print_json(value: serde_json::Value) {
    match serde_json::to_string_pretty(&value) {
        Ok(json_text) => println!("{json_text}"),
        Err(error) => eprintln!("failed to serialize CLI output: {error}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enforce_task_limit_rejects_large() {
        let long_task = "x".repeat(9 * 1024);
        assert!(enforce_task_limit(&long_task).is_err());
    }

    #[test]
    fn enforce_task_limit_rejects_blank() {
        assert!(enforce_task_limit("  \n").is_err());
    }

    #[test]
    fn enforce_task_limit_accepts_normal_task() {
        assert!(enforce_task_limit("plan a birthday party").is_ok());
    }
}
