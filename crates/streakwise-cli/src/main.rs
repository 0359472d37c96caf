use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "streakwise", version, about = "Streakwise habit and task tracker")]
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
    /// Per-day completion log
    Log {
        #[command(subcommand)]
        action: commands::log::LogAction,
    },
    /// Today's tasks and progress
    Today,
    /// Streaks of recurring tasks
    Streak {
        /// Task ID (all recurring tasks when omitted)
        id: Option<String>,
    },
    /// Completion statistics
    Stats {
        /// Range: week, month, year or all
        #[arg(long, default_value = "week")]
        range: String,
    },
    /// Earned achievements
    Achievements,
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Generate shell completions
    Completions {
        /// Target shell
        shell: clap_complete::Shell,
    },
}

fn init_tracing() {
    // JSON goes to stdout, so logs stay on stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("STREAKWISE_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Task { action } => commands::task::run(action),
        Commands::Log { action } => commands::log::run(action),
        Commands::Today => commands::today::run(),
        Commands::Streak { id } => commands::streak::run(id),
        Commands::Stats { range } => commands::stats::run(&range),
        Commands::Achievements => commands::achievements::run(),
        Commands::Config { action } => commands::config::run(action),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "streakwise", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
