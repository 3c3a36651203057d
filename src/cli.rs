// Version from Cargo.toml
const DISPLAY_VERSION: &str = env!("CARGO_PKG_VERSION");

const HELP_TEXT: &str = "\
Agentverse - minimal planning agent\n\
\n\
Usage:\n\
    agentverse [OPTIONS]                  Start the chat client (default).\n\
    agentverse [OPTIONS] serve [--port <N>]\n\
    agentverse [OPTIONS] plan \"<task>\"     Print a plan for the task. Reads STDIN when piped.\n\
    agentverse [OPTIONS] chat [--url <URL>]\n\
    agentverse [OPTIONS] memory           Print the stored notes.\n\
\n\
Options:\n\
    -h, --help        Print this help text.\n\
    -v, --version     Show the version and this help output.\n\
    -d, --debug       Enable verbose logging to stderr.\n\
\n\
Environment variables:\n\
    LLM_API_URL           Text-generation endpoint. Unset means fallback plans only.\n\
    LLM_API_KEY           Bearer token for the endpoint (optional).\n\
    LLM_TIMEOUT_SECS      Backend request timeout in seconds (default: 30).\n\
    LLM_MAX_TOKENS        max_tokens sent to the backend (default: 400).\n\
    LLM_TEMPERATURE       temperature sent to the backend (default: 0.6).\n\
    PORT                  Port for `serve` (default: 3000).\n\
    AGENTVERSE_MEMORY_PATH  Notes file (default: ./memory.json).\n\
    AGENTVERSE_CHAT_URL   Chat endpoint for `chat` (default: http://127.0.0.1:3000/chat).\n\
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Serve { port: Option<u16> },
    Plan { task: Option<String> },
    Chat { url: Option<String> },
    Memory,
}

#[derive(Debug)]
pub struct CliConfig {
    pub command: Option<Command>,
    pub show_help: bool,
    pub show_version: bool,
    pub debug: bool,
}

impl CliConfig {
    pub fn from_env() -> Result<Self, String> {
        let args = std::env::args().skip(1);
        Self::from_args(args)
    }

    pub fn from_args<I>(args: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = String>,
    {
        let mut show_help = false;
        let mut show_version = false;
        let mut debug = false;
        let mut command_tokens: Vec<String> = Vec::new();

        let mut iter = args.into_iter();

        while let Some(argument) = iter.next() {
            match argument.as_str() {
                "--help" | "-h" => {
                    show_help = true;
                }
                "--version" | "-v" => {
                    show_version = true;
                    show_help = true;
                }
                "--debug" | "-d" => {
                    debug = true;
                }
                _ => {
                    command_tokens.push(argument);
                    command_tokens.extend(iter);
                    break;
                }
            }
        }

        let command = if command_tokens.is_empty() {
            // No command means the chat client (unless showing help/version)
            if !show_help && !show_version {
                Some(Command::Chat { url: None })
            } else {
                None
            }
        } else {
            Some(parse_command(&command_tokens)?)
        };

        Ok(Self {
            command,
            show_help,
            show_version,
            debug,
        })
    }
}

fn parse_command(tokens: &[String]) -> Result<Command, String> {
    if tokens.is_empty() {
        return Err("a command is required after parsing options.".to_string());
    }

    let kind = tokens[0].to_lowercase();

    match kind.as_str() {
        "serve" => parse_serve_command(&tokens[1..]),
        "plan" => {
            if tokens.len() < 2 {
                return Ok(Command::Plan { task: None });
            }

            Ok(Command::Plan {
                task: Some(tokens[1..].join(" ")),
            })
        }
        "chat" => {
            let url = parse_single_option(&tokens[1..], "chat", "--url")?;
            Ok(Command::Chat { url })
        }
        "memory" => {
            if tokens.len() > 1 {
                return Err(format!("unexpected argument after `memory`: {}", tokens[1]));
            }

            Ok(Command::Memory)
        }
        _ => Err(format!(
            "unknown command: {}. Run `agentverse --help` for usage.",
            tokens[0]
        )),
    }
}

fn parse_serve_command(tokens: &[String]) -> Result<Command, String> {
    let port = match parse_single_option(tokens, "serve", "--port")? {
        Some(value) => Some(
            value
                .parse::<u16>()
                .map_err(|_| format!("--port expects a port number, got `{value}`"))?,
        ),
        None => None,
    };

    Ok(Command::Serve { port })
}

/// Parse `[<flag> <value>]` and nothing else.
fn parse_single_option(
    tokens: &[String],
    command: &str,
    flag: &str,
) -> Result<Option<String>, String> {
    let mut value = None;
    let mut i = 0;

    while i < tokens.len() {
        if tokens[i] == flag {
            let next = tokens
                .get(i + 1)
                .filter(|candidate| !candidate.starts_with("--"))
                .ok_or_else(|| format!("{flag} requires a value."))?;
            value = Some(next.clone());
            i += 2;
        } else {
            return Err(format!(
                "unexpected argument after `{command}`: {}",
                tokens[i]
            ));
        }
    }

    Ok(value)
}

pub fn print_help() {
    println!("{HELP_TEXT}");
}

pub fn print_version() {
    println!("agentverse {DISPLAY_VERSION}");
}
