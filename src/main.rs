//! DeepDimension CLI
//!
//! Streams replies from the configured provider to the terminal.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use deepdimension::{ChatTurn, Config, Conversation, ProviderClient, StreamDelta, Telemetry};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "deepdimension")]
#[command(about = "DeepDimension knowledge assistant - streaming chat relay", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (default: ./deepdimension.yaml or ~/.config/deepdimension/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Provider base URL - overrides config and env
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// API key - overrides config, env and auth.json
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Model to use
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// Log to stderr as well as the log file
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Args)]
struct ContextArgs {
    /// Retrieved reference text to ground the answer
    #[arg(long, conflicts_with = "context_file")]
    context: Option<String>,

    /// Read the reference text from a file
    #[arg(long)]
    context_file: Option<PathBuf>,
}

impl ContextArgs {
    fn load(&self) -> Result<Option<String>> {
        if let Some(path) = &self.context_file {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read context file {}", path.display()))?;
            return Ok(Some(text));
        }
        Ok(self.context.clone())
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Send a single message and stream the reply
    Prompt {
        /// The user message
        message: String,

        #[command(flatten)]
        context: ContextArgs,
    },

    /// Interactive chat keeping conversation history
    Repl {
        #[command(flatten)]
        context: ContextArgs,

        /// Number of past exchanges sent with each message
        #[arg(long)]
        max_history: Option<usize>,
    },

    /// Print the request body that would be sent, without sending it
    Request {
        /// The user message
        message: String,

        #[command(flatten)]
        context: ContextArgs,
    },
}

/// Build configuration: CLI flags > env > config file > auth.json
///
/// An unreadable auth.json is handed back so it can be logged once
/// telemetry is up.
fn build_config(cli: &Cli) -> Result<(Config, Option<anyhow::Error>)> {
    let mut config = Config::load(cli.config.as_deref())?;
    let auth_error = config.load_auth().err();

    if let Some(base_url) = &cli.base_url {
        config.provider.base_url = base_url.clone();
    }
    if let Some(api_key) = &cli.api_key {
        config = config.with_api_key(api_key.clone());
    }
    if let Some(model) = &cli.model {
        config.provider.model = model.clone();
    }
    if cli.verbose {
        config = config.with_verbose(true);
    }

    Ok((config, auth_error))
}

/// Stream one reply to stdout.
///
/// Returns the full reply, or `None` if the user pressed Ctrl-C.
async fn stream_reply(
    client: &ProviderClient,
    message: &str,
    context: Option<&str>,
    history: &[ChatTurn],
) -> Result<Option<String>> {
    let (mut rx, handle) = client.stream_events(message, context, Some(history));
    let mut stdout = std::io::stdout();
    let mut reply = String::new();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                handle.cancel();
                let outcome = handle.join().await;
                tracing::info!(?outcome, "Reply cancelled by user");
                println!("\n[cancelled]");
                return Ok(None);
            }
            delta = rx.recv() => match delta {
                Some(StreamDelta::Text(text)) => {
                    print!("{}", text);
                    stdout.flush()?;
                    reply.push_str(&text);
                }
                Some(StreamDelta::Done) | None => {
                    println!();
                    break;
                }
                Some(StreamDelta::Error(e)) => {
                    println!();
                    anyhow::bail!("{}", e);
                }
            }
        }
    }

    let outcome = handle.join().await;
    tracing::debug!(?outcome, "Reply finished");
    Ok(Some(reply))
}

async fn run_repl(client: &ProviderClient, context: Option<String>, max_history: Option<usize>) -> Result<()> {
    let mut conversation = match max_history {
        Some(n) => Conversation::new().with_max_exchanges(n),
        None => Conversation::new(),
    };
    let mut rl = DefaultEditor::new()?;

    println!(
        "DeepDimension ({}) - /clear resets history, /exit quits",
        client.config().model
    );

    loop {
        match rl.readline("> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);

                match line {
                    "/exit" | "/quit" => break,
                    "/clear" => {
                        conversation.clear();
                        println!("History cleared");
                        continue;
                    }
                    _ => {}
                }

                match stream_reply(client, line, context.as_deref(), conversation.history()).await {
                    Ok(Some(reply)) => conversation.push_exchange(line, reply),
                    Ok(None) => {}
                    Err(e) => eprintln!("Error: {:#}", e),
                }
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let (config, auth_error) = build_config(&cli)?;
    let _telemetry = Telemetry::init(&config.telemetry)?;
    if let Some(e) = auth_error {
        tracing::warn!(error = %format!("{:#}", e), "Ignoring auth.json");
    }
    let client = ProviderClient::from_config(&config)?;

    match cli.command {
        Commands::Prompt { message, context } => {
            let context = context.load()?;
            stream_reply(&client, &message, context.as_deref(), &[]).await?;
        }
        Commands::Repl {
            context,
            max_history,
        } => {
            let context = context.load()?;
            run_repl(&client, context, max_history).await?;
        }
        Commands::Request { message, context } => {
            let context = context.load()?;
            let request = client.build_request(&message, context.as_deref(), None);
            println!("{}", serde_json::to_string_pretty(&request)?);
        }
    }

    Ok(())
}
