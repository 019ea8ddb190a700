use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "tunedle")]
#[command(about = "Daily music quiz - name the game a track comes from")]
#[command(version)]
struct Cli {
    /// Path to the config file (defaults to ~/.tunedle/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show today's challenge, or today's result if already answered
    Daily,

    /// Answer today's challenge
    Answer {
        /// Name of the game the track comes from
        guess: String,
    },

    /// Play a random question that does not count towards the streak
    Practice,

    /// Show the current and best streak
    Streak,

    /// Show play statistics
    Stats,

    /// Manage favorite tracks
    Favorite {
        #[command(subcommand)]
        action: cli::favorite::FavoriteAction,
    },

    /// Sign in to sync favorites and stats
    Login {
        #[arg(long)]
        email: String,

        #[arg(long)]
        password: String,
    },

    /// Sign out and return to the guest profile
    Logout,

    /// Write a default ~/.tunedle/config.toml
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = cli.config;
    let open = || cli::App::open(config.as_deref());

    match cli.command.unwrap_or(Commands::Daily) {
        Commands::Daily => cli::daily::daily_command(&open().await?).await?,
        Commands::Answer { guess } => cli::daily::answer_command(&open().await?, &guess).await?,
        Commands::Practice => cli::daily::practice_command(&open().await?).await?,
        Commands::Streak => cli::stats::streak_command(&open().await?)?,
        Commands::Stats => cli::stats::stats_command(&open().await?).await?,
        Commands::Favorite { action } => {
            cli::favorite::favorite_command(&open().await?, action).await?
        }
        Commands::Login { email, password } => {
            cli::session::login_command(&open().await?, &email, &password).await?
        }
        Commands::Logout => cli::session::logout_command(&open().await?).await?,
        Commands::Init { force } => cli::init::init_command(config.clone(), force)?,
    }

    Ok(())
}
