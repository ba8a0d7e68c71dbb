use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use quill_adaptor_terminal::{TerminalAdaptor, TerminalConfig};
use quill_core::utils::logger::{init_logging, Logger};
use quill_core::{load_env, Agent, AgentSelection, ClientConfig, ConversationController};
use quill_provider_http::HttpTransport;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

const INPUT_PROMPT: &str = "you> ";

#[derive(Parser, Debug)]
#[command(author, version, about = "Chat with a streaming content-generation service")]
struct Cli {
    #[arg(long, env = "QUILL_LOG_LEVEL", default_value = "warn", global = true)]
    log_level: String,

    /// Base URL of the generation service
    #[arg(long, env = "QUILL_API_URL", global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive chat (default)
    Chat {
        /// Comma separated agent ids, or `all`
        #[arg(short, long, default_value = "all")]
        agents: AgentSelection,
    },
    /// Submit one prompt and print the streamed answer
    Ask {
        prompt: String,
        /// Comma separated agent ids, or `all`
        #[arg(short, long, default_value = "all")]
        agents: AgentSelection,
    },
    /// Show recently generated content
    History {
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
    /// Check that the service is up
    Health,
}

/// One line typed in interactive mode
#[derive(Debug, PartialEq, Eq)]
enum Input {
    Prompt(String),
    Agents,
    Toggle(Agent),
    All,
    Clear,
    Help,
    Quit,
    Blank,
    Invalid(String),
}

fn parse_input(line: &str) -> Input {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Input::Blank;
    }
    let Some(command) = trimmed.strip_prefix('/') else {
        return Input::Prompt(line.to_string());
    };
    let mut parts = command.splitn(2, char::is_whitespace);
    match (parts.next().unwrap_or_default(), parts.next().map(str::trim)) {
        ("quit" | "exit", _) => Input::Quit,
        ("agents", _) => Input::Agents,
        ("all", _) => Input::All,
        ("clear", _) => Input::Clear,
        ("help", _) => Input::Help,
        ("toggle", Some(id)) => match id.parse::<Agent>() {
            Ok(agent) => Input::Toggle(agent),
            Err(e) => Input::Invalid(e.to_string()),
        },
        ("toggle", None) => Input::Invalid("usage: /toggle <agent>".to_string()),
        (other, _) => Input::Invalid(format!("unknown command '/{}', try /help", other)),
    }
}

fn print_prompt() {
    print!("{}", INPUT_PROMPT);
    let _ = std::io::stdout().flush();
}

fn print_help() {
    println!("Type a prompt and press enter. Commands:");
    println!("  /agents          show the selected agents");
    println!("  /toggle <agent>  add or remove an agent");
    println!("  /all             select every agent");
    println!("  /clear           clear the conversation");
    println!("  /quit            exit");
    for agent in Agent::ALL {
        println!("  {:<14} {}", agent.id(), agent.label());
    }
}

fn client_config(cli: &Cli) -> anyhow::Result<ClientConfig> {
    let mut config = ClientConfig::from_env()?;
    if let Some(url) = &cli.api_url {
        config = config.with_api_url(url.clone()).validated()?;
    }
    Ok(config)
}

async fn chat(config: &ClientConfig, mut agents: AgentSelection) -> anyhow::Result<()> {
    let log = Logger::new("chat");
    let transport = Arc::new(HttpTransport::new(config)?);
    let mut controller = ConversationController::with_config(transport, config);
    let renderer = TerminalAdaptor::new(TerminalConfig {
        enabled: true,
        input_prompt: INPUT_PROMPT.to_string(),
    })
    .start(controller.subscribe())
    .await?;

    println!("Connected to {} with agents: {}", config.api_url, agents);
    print_help();
    print_prompt();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_input(&line) {
            Input::Prompt(text) => {
                if let Err(e) = controller.submit(&text, &agents).await {
                    tracing::debug!(error = %e, "submission ended with error");
                    if !e.is_transport() {
                        print_prompt();
                    }
                }
                continue;
            }
            Input::Quit => break,
            Input::Agents => println!("agents: {}", agents),
            Input::Toggle(agent) => {
                let on = agents.toggle(agent);
                println!("{} {}", if on { "selected" } else { "deselected" }, agent.label());
                if agents.is_empty() {
                    println!("no agents selected; prompts will be rejected until one is added");
                }
            }
            Input::All => {
                agents.select_all();
                println!("agents: {}", agents);
            }
            Input::Clear => {
                controller.clear();
                println!("conversation cleared");
            }
            Input::Help => print_help(),
            Input::Blank => {}
            Input::Invalid(message) => println!("{}", message),
        }
        print_prompt();
    }

    drop(controller);
    if let Some(handle) = renderer {
        let _ = handle.await;
    }
    println!();
    log.info("chat session ended");
    Ok(())
}

async fn ask(config: &ClientConfig, prompt: &str, agents: AgentSelection) -> anyhow::Result<()> {
    let transport = Arc::new(HttpTransport::new(config)?);
    let mut controller = ConversationController::with_config(transport, config);
    let renderer = TerminalAdaptor::new(TerminalConfig {
        enabled: true,
        input_prompt: String::new(),
    })
    .start(controller.subscribe())
    .await?;

    let result = controller.submit(prompt, &agents).await;
    drop(controller);
    if let Some(handle) = renderer {
        let _ = handle.await;
    }
    result.context("generation failed")?;
    Ok(())
}

async fn history(config: &ClientConfig, limit: usize) -> anyhow::Result<()> {
    let transport = HttpTransport::new(config)?;
    let entries = transport.history().await.context("could not fetch history")?;
    if entries.is_empty() {
        println!("no generated content yet");
    }
    for entry in entries.iter().take(limit) {
        let preview: String = entry
            .content
            .lines()
            .next()
            .unwrap_or_default()
            .chars()
            .take(80)
            .collect();
        println!(
            "#{:<5} {} [{}] {}\n       {}",
            entry.id,
            entry.created_at.format("%Y-%m-%d %H:%M"),
            entry.content_type,
            entry.prompt,
            preview
        );
    }
    Ok(())
}

async fn health(config: &ClientConfig) -> anyhow::Result<()> {
    let transport = HttpTransport::new(config)?;
    let status = transport.health().await.context("health check failed")?;
    println!(
        "{}: {}",
        config.api_url,
        status
            .message
            .as_deref()
            .or(status.error.as_deref())
            .unwrap_or(&status.status)
    );
    if !status.is_healthy() {
        bail!("service reported status '{}'", status.status);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_env()?;
    let cli = Cli::parse();
    std::env::set_var("QUILL_LOG_LEVEL", &cli.log_level);
    init_logging();

    let config = client_config(&cli)?;
    tracing::debug!(api_url = %config.api_url, "client configured");

    match cli.command.unwrap_or(Command::Chat {
        agents: AgentSelection::all(),
    }) {
        Command::Chat { agents } => chat(&config, agents).await,
        Command::Ask { prompt, agents } => ask(&config, &prompt, agents).await,
        Command::History { limit } => history(&config, limit).await,
        Command::Health => health(&config).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_prompt() {
        assert_eq!(
            parse_input("write a tweet"),
            Input::Prompt("write a tweet".to_string())
        );
    }

    #[test]
    fn test_commands() {
        assert_eq!(parse_input("/quit"), Input::Quit);
        assert_eq!(parse_input("  /agents "), Input::Agents);
        assert_eq!(parse_input("/toggle financial"), Input::Toggle(Agent::Financial));
        assert_eq!(parse_input("/all"), Input::All);
        assert_eq!(parse_input(""), Input::Blank);
    }

    #[test]
    fn test_bad_commands() {
        assert!(matches!(parse_input("/toggle"), Input::Invalid(_)));
        assert!(matches!(parse_input("/toggle poetry"), Input::Invalid(_)));
        assert!(matches!(parse_input("/dance"), Input::Invalid(_)));
    }

    #[test]
    fn test_cli_parses_agents() {
        let cli = Cli::parse_from(["run-chat", "ask", "hello", "--agents", "thesis,twitter"]);
        match cli.command {
            Some(Command::Ask { prompt, agents }) => {
                assert_eq!(prompt, "hello");
                assert_eq!(agents.to_vec(), vec![Agent::Thesis, Agent::Twitter]);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
