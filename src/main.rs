use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod api;
mod cli;
mod core;
mod session;
mod ui;

use crate::core::settings::Settings;

#[derive(Parser)]
#[command(name = "roadmap")]
#[command(author, version, about = "Terminal client for a learning-roadmap server")]
struct Cli {
    /// Server base URL (overrides server.base_url from the config file)
    #[arg(long, global = true)]
    server: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the roadmap topics of a language
    Topics {
        #[arg(long)]
        language: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate a new roadmap for a language
    Generate {
        #[arg(long)]
        language: String,
    },

    /// Watch curated videos for a topic, refreshing as the server finds more
    Watch {
        #[arg(long)]
        language: String,

        /// Topic to select on start (default: the last selected one)
        #[arg(long)]
        topic: Option<String>,
    },

    /// Show practice questions for a video
    Questions {
        #[arg(long)]
        video_id: String,

        /// Show question N in detail
        #[arg(long)]
        show: Option<usize>,
    },

    /// Run source code on the server
    Run {
        #[arg(long)]
        language: String,

        /// Source file (default: read from stdin)
        file: Option<PathBuf>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn load_settings(server: Option<String>) -> Result<Settings> {
    let mut settings = Settings::load()?;
    if let Some(base_url) = server {
        settings.server.base_url = base_url;
    }
    settings.validate()?;
    Ok(settings)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(shell, &mut cmd, name, &mut io::stdout());
        return Ok(());
    }

    init_logging();
    let settings = load_settings(cli.server)?;

    match cli.command {
        Commands::Topics { language, json } => cli::topics::run(&settings, &language, json).await,
        Commands::Generate { language } => cli::generate::run(&settings, &language).await,
        Commands::Watch { language, topic } => {
            cli::watch::run(&settings, &language, topic.as_deref()).await
        }
        Commands::Questions { video_id, show } => {
            cli::questions::run(&settings, &video_id, show).await
        }
        Commands::Run { language, file } => {
            cli::run::run(&settings, &language, file.as_deref()).await
        }
        Commands::Completions { .. } => Ok(()),
    }
}
