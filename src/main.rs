//! journal-formatter binary.
//!
//! Thin front end over the library: reads a journal entry, asks the local
//! LM Studio server to format it, and prints or saves the markdown. Also
//! reports endpoint availability once or continuously.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use journal_formatter::inference::config;
use journal_formatter::logging::{init_tracing, LogTarget};
use journal_formatter::{AvailabilityProber, ConnectivityState, InferenceClient, ServerConfig};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalArgs {
    /// Path to configuration file (default: search for journal-formatter.yaml)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Override the server base URL
    #[arg(long, env = "LM_STUDIO_URL", global = true)]
    base_url: Option<String>,

    /// Override the model name (empty string = use the loaded model)
    #[arg(long, global = true)]
    model: Option<String>,

    /// Override the request timeout in milliseconds
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    /// Log to stderr instead of the log file in the data directory
    #[arg(long, global = true)]
    log_stderr: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Format a journal entry into structured markdown
    Format(FormatArgs),
    /// Check whether the LM Studio server is reachable
    Status(StatusArgs),
}

#[derive(Args)]
struct FormatArgs {
    /// Read the entry from this file instead of stdin
    #[arg(short, long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Write the markdown to this file instead of stdout
    #[arg(short, long, value_name = "FILE", conflicts_with = "save_dir")]
    output: Option<PathBuf>,

    /// Save as journal-YYYY-MM-DD.md in this directory
    #[arg(long, value_name = "DIR")]
    save_dir: Option<PathBuf>,
}

#[derive(Args)]
struct StatusArgs {
    /// Keep probing every 30s and print each change until Ctrl-C
    #[arg(short, long)]
    watch: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let log_target = if cli.global.log_stderr {
        LogTarget::Stderr
    } else {
        LogTarget::default_file()
    };
    init_tracing(&log_target).context("failed to initialize logging")?;

    let server = resolve_server_config(&cli.global)?;
    let client = InferenceClient::new(server)?;

    match cli.command {
        Commands::Format(args) => {
            run_format(&client, args).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Status(args) => run_status(client, args).await,
    }
}

/// Load the config file (or defaults) and apply command-line overrides.
fn resolve_server_config(args: &GlobalArgs) -> anyhow::Result<ServerConfig> {
    let mut server = match &args.config {
        Some(path) => config::load_config(path)?.lm_studio,
        None => {
            let cwd = std::env::current_dir().context("cannot read current directory")?;
            config::load_or_default(&cwd)?.lm_studio
        }
    };

    if let Some(base_url) = &args.base_url {
        server.base_url = base_url.clone();
    }
    if let Some(model) = &args.model {
        server.model = Some(model.clone());
    }
    if let Some(timeout_ms) = args.timeout_ms {
        server.timeout_ms = timeout_ms;
    }

    server.validate()?;
    Ok(server)
}

async fn run_format(client: &InferenceClient, args: FormatArgs) -> anyhow::Result<()> {
    let raw = match &args.input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read journal entry from stdin")?;
            buf
        }
    };

    if raw.trim().is_empty() {
        bail!("Please write something in your journal first!");
    }

    let formatted = client
        .format_entry(&raw)
        .await
        .context("Failed to format journal entry")?;

    if let Some(path) = &args.output {
        write_markdown(path, &formatted)?;
        eprintln!("Journal entry formatted successfully! Saved to {}", path.display());
    } else if let Some(dir) = &args.save_dir {
        let path = dir.join(dated_file_name(chrono::Local::now().date_naive()));
        write_markdown(&path, &formatted)?;
        eprintln!("Journal downloaded to {}", path.display());
    } else {
        println!("{formatted}");
    }

    Ok(())
}

async fn run_status(client: InferenceClient, args: StatusArgs) -> anyhow::Result<ExitCode> {
    if !args.watch {
        let state = ConnectivityState::from_probe(client.probe().await);
        println!("{}", status_line(state));
        return Ok(ExitCode::from(status_exit_code(state)));
    }

    let handle = AvailabilityProber::new(client).start();
    let mut rx = handle.subscribe();
    println!("{}", status_line(*rx.borrow_and_update()));

    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                println!("{}", status_line(*rx.borrow_and_update()));
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    handle.stop();
    Ok(ExitCode::SUCCESS)
}

/// `status` exits non-zero unless the server answered.
fn status_exit_code(state: ConnectivityState) -> u8 {
    if state.is_connected() {
        0
    } else {
        1
    }
}

fn status_line(state: ConnectivityState) -> String {
    match state {
        ConnectivityState::Unknown => state.label().to_string(),
        ConnectivityState::Connected => format!("✓ LM Studio {}", state.label()),
        ConnectivityState::Disconnected => format!("✗ LM Studio {}", state.label()),
    }
}

fn dated_file_name(date: chrono::NaiveDate) -> String {
    format!("journal-{}.md", date.format("%Y-%m-%d"))
}

fn write_markdown(path: &Path, markdown: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, markdown).with_context(|| format!("failed to write {}", path.display()))
}
