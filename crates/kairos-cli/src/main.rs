use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod render;

#[derive(Parser)]
#[command(name = "kairos-cli", version, about = "Kairos task and pomodoro assistant")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Task management
    Task {
        #[command(subcommand)]
        action: commands::task::TaskAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Focus and task statistics
    Stats {
        /// User to report on (defaults to chat.user_id)
        #[arg(long)]
        user: Option<String>,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Line-based chat session on stdin
    Chat {
        /// User to chat as (defaults to chat.user_id)
        #[arg(long)]
        user: Option<String>,
    },
}

/// Logs go to stderr; `KAIROS_LOG` takes an `EnvFilter` directive.
fn init_tracing() {
    let filter = EnvFilter::try_from_env("KAIROS_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Task { action } => commands::task::run(action).await,
        Commands::Config { action } => commands::config::run(action),
        Commands::Stats { user, json } => commands::stats::run(user, json),
        Commands::Chat { user } => commands::chat::run(user).await,
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
