use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use skillscore::cli;
use skillscore::config::Config;

#[derive(Parser)]
#[command(name = "skillscore", version)]
#[command(about = "Score code-review output against ground truth", long_about = None)]
struct Cli {
    /// Path to config file (defaults to ./skillscore.toml or ~/.config/skillscore/config.toml)
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score recorded predictions in one or more case files (JSON)
    Score {
        /// Case files
        #[arg(required = true)]
        cases: Vec<String>,
    },

    /// Score critical/high issue text against expected counts
    ScoreText {
        /// File holding the model's critical-issues output
        #[arg(long)]
        critical: String,

        /// File holding the model's high-issues output
        #[arg(long)]
        high: String,

        /// Expected number of critical issues
        #[arg(long, default_value_t = 0)]
        expected_critical: usize,

        /// Expected number of high issues
        #[arg(long, default_value_t = 0)]
        expected_high: usize,
    },

    /// Split a text file into issue lines and show their signals
    Parse {
        /// Text file to parse
        path: String,
    },
}

fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the JSON report
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Score { cases } => {
            let config = Config::load_with_path(cli.config)?;
            cli::score::run(&config, &cases)?;
        }
        Commands::ScoreText {
            critical,
            high,
            expected_critical,
            expected_high,
        } => {
            let config = Config::load_with_path(cli.config)?;
            cli::score_text::run(&config, &critical, &high, expected_critical, expected_high)?;
        }
        Commands::Parse { path } => {
            cli::parse::run(&path)?;
        }
    }

    Ok(())
}
