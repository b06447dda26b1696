//! newsbrief CLI - TL;DR summaries of files, web pages and news feeds
//!
//! The application logic is contained in lib.rs, and this file is responsible
//! for parsing arguments and handling top-level errors.

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use newsbrief::commands::{self, Output};
use newsbrief::{ui, Config, DigestOptions, SummaryOptions};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "newsbrief")]
#[command(author, version, about = "TL;DR and bullet-point summaries of files, web pages and news feeds", long_about = None)]
struct Cli {
    /// Path to a newsbrief.toml config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarise a local .txt or .md file
    File {
        /// Path to the file to summarise
        path: PathBuf,
        /// Approximate maximum length of the TL;DR in characters
        #[arg(long, alias = "max_chars")]
        max_chars: Option<usize>,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Summarise a webpage by URL
    Url {
        /// URL of the article to summarise
        url: String,
        /// Approximate maximum length of the TL;DR in characters
        #[arg(long, alias = "max_chars")]
        max_chars: Option<usize>,
        /// Show raw extracted text instead of summary
        #[arg(long)]
        raw: bool,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Summarise news feed items matching a keyword (at most 3 articles)
    Digest {
        /// Keyword or phrase to search for in titles and descriptions
        query: String,
        /// Maximum number of matching articles to summarise (capped at 3)
        #[arg(long, alias = "max_articles")]
        max_articles: Option<usize>,
        /// Approximate maximum length of each TL;DR in characters
        #[arg(long, alias = "max_chars")]
        max_chars: Option<usize>,
        /// Print the digest as JSON
        #[arg(long)]
        json: bool,
    },
    /// Generate shell completions
    Completions {
        /// Target shell
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Some(Commands::Completions { shell }) = &cli.command {
        let mut command = Cli::command();
        clap_complete::generate(*shell, &mut command, "newsbrief", &mut std::io::stdout());
        return Ok(());
    }

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Some(Commands::File {
            path,
            max_chars,
            json,
        }) => {
            let options = SummaryOptions::new(max_chars.unwrap_or(config.summary.max_chars))?;
            commands::summarise_file(&config, &path, options, output(json)).await?;
        }
        Some(Commands::Url {
            url,
            max_chars,
            raw,
            json,
        }) => {
            let options = SummaryOptions::new(max_chars.unwrap_or(config.summary.max_chars))?;
            commands::summarise_url(&config, &url, options, raw, output(json)).await?;
        }
        Some(Commands::Digest {
            query,
            max_articles,
            max_chars,
            json,
        }) => {
            let options = DigestOptions::new(
                &query,
                max_articles.unwrap_or(config.digest.max_articles),
                max_chars.unwrap_or(config.summary.max_chars),
            )?;
            commands::run_digest(&config, &options, output(json)).await?;
        }
        Some(Commands::Completions { .. }) => {}
        None => {
            // Default: interactive prompts
            ui::run(&config).await?;
        }
    }

    Ok(())
}

fn output(json: bool) -> Output {
    if json {
        Output::Json
    } else {
        Output::Text
    }
}

/// Log to stderr so stdout stays clean for `--json`
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,newsbrief={}", level)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
