use anyhow::{Context, Result};
use clap::Parser;
use prompt_relay::config::Config;
use prompt_relay::{Orchestrator, PromptRequest, document};
use std::io::Read;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(
    name = "prompt-relay",
    about = "Answer a prompt from the first available model backend: chat library → local HTTP server → CLI runner"
)]
struct Cli {
    /// Path to config file (defaults apply when it does not exist)
    #[arg(short, long, global = true, default_value = "prompt-relay.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Send a prompt and print the answer
    Ask {
        /// Prompt text; read from stdin when omitted and no --file is given
        prompt: Option<String>,

        /// Build the prompt from a plain-text document
        #[arg(short, long, conflicts_with = "prompt")]
        file: Option<PathBuf>,

        /// Instruction placed before the document text (with --file)
        #[arg(long, requires = "file")]
        instruction: Option<String>,

        /// Maximum document characters kept in the prompt (with --file)
        #[arg(long, default_value_t = document::DEFAULT_MAX_CHARS)]
        max_chars: usize,

        /// Model override for every backend
        #[arg(long)]
        model: Option<String>,

        /// Credential for the chat library (defaults to its API key env var)
        #[arg(long)]
        credential: Option<String>,
    },

    /// Show the fallback order and where each backend points
    Backends,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "prompt_relay=info".parse().unwrap()),
        )
        .init();

    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    match cli.command {
        Command::Ask {
            prompt,
            file,
            instruction,
            max_chars,
            model,
            credential,
        } => {
            let text = match (prompt, file) {
                (Some(prompt), _) => prompt,
                (None, Some(path)) => {
                    let raw = std::fs::read_to_string(&path)
                        .with_context(|| format!("reading {}", path.display()))?;
                    document::prepare_prompt(&raw, instruction.as_deref(), max_chars)
                }
                (None, None) => {
                    let mut buf = String::new();
                    std::io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };
            let request = PromptRequest::new(text)?
                .with_model(model)
                .with_credential(credential);

            let orchestrator = Orchestrator::from_config(&config)?;
            let cancel = CancellationToken::new();
            let on_interrupt = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    on_interrupt.cancel();
                }
            });

            let answer = orchestrator.process_with_cancel(&request, &cancel).await?;
            println!("{answer}");
            Ok(())
        }
        Command::Backends => {
            let orchestrator = Orchestrator::from_config(&config)?;
            println!("default model: {}", orchestrator.default_model());
            for (i, name) in orchestrator.backend_names().into_iter().enumerate() {
                let target = match name {
                    "library" if config.library.enabled => format!(
                        "{:?} chat API, model {}",
                        config.library.provider, config.library.model
                    ),
                    "library" => "disabled".to_string(),
                    "http" => format!(
                        "POST {} (timeout {}s)",
                        config.http.endpoint, config.http.timeout_secs
                    ),
                    "process" => format!(
                        "{} {}",
                        config.process.executable,
                        config.process.args.join(" ")
                    ),
                    _ => String::new(),
                };
                println!("{}. {name:<8} {target}", i + 1);
            }
            Ok(())
        }
    }
}

fn load_config(path: &Path) -> Result<Config> {
    let mut config = Config::load_or_default(path)?;
    config.apply_env();
    config.validate()?;
    Ok(config)
}
