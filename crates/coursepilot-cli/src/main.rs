use anyhow::Result;
use clap::{Parser, Subcommand};

mod app;
mod commands;
mod render;

#[derive(Parser)]
#[command(name = "coursepilot")]
#[command(about = "CoursePilot - chat and study planning for your Canvas courses")]
#[command(version)]
struct Cli {
    /// Backend base URL (overrides config and COURSEPILOT_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Timeout for regular requests, in milliseconds
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Send a single message and print the reply
    Chat {
        #[arg(short, long)]
        prompt: String,

        /// Continue an existing chat instead of starting a new one
        #[arg(long)]
        chat: Option<String>,
    },
    /// List your chats, most recent first
    Chats,
    /// Delete a chat
    Delete { id: String },
    /// Generate a study plan from your courses
    Plan {
        /// Ignore the cached plan and generate a new one
        #[arg(long)]
        force: bool,
    },
    /// Estimate the token count of some text
    Tokens {
        #[arg(required = true)]
        text: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let mut settings = coursepilot_core::Settings::load();

    if let Some(ref url) = cli.api_url {
        settings.api.base_url = url.clone();
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        settings.api.request_timeout_ms = timeout_ms;
    }

    match cli.command {
        None => app::run_shell(&settings).await?,
        Some(Command::Chat { prompt, chat }) => {
            app::run_single_prompt(&settings, &prompt, chat.as_deref()).await?
        }
        Some(Command::Chats) => app::list_chats(&settings).await?,
        Some(Command::Delete { id }) => app::delete_chat(&settings, &id).await?,
        Some(Command::Plan { force }) => app::generate_plan(&settings, force).await?,
        Some(Command::Tokens { text }) => app::print_tokens(&settings, &text.join(" ")),
    }

    Ok(())
}
