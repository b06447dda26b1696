//! Interactive front-end using dialoguer.
//!
//! Launched when no subcommand is given. Offers the same three modes as the
//! CLI and runs one request to completion before returning.

use crate::commands::{self, Output};
use crate::config::Config;
use crate::options::{DigestOptions, SummaryOptions};
use dialoguer::{Input, Select};
use std::path::PathBuf;

const MODES: [&str; 3] = [
    "🔗 Summarise a URL",
    "📄 Summarise a local file",
    "📰 News digest by keyword",
];

/// Prompt for a mode and its inputs, then run it
pub async fn run(config: &Config) -> anyhow::Result<()> {
    let mode = Select::new()
        .with_prompt("What would you like to summarise?")
        .items(&MODES)
        .default(0)
        .interact()?;

    match mode {
        0 => {
            let url: String = Input::new()
                .with_prompt("Article URL")
                .interact_text()?;
            let options = SummaryOptions::new(prompt_max_chars(config)?)?;
            commands::summarise_url(config, url.trim(), options, false, Output::Text).await
        }
        1 => {
            let path: String = Input::new()
                .with_prompt("Path to a .txt or .md file")
                .interact_text()?;
            let options = SummaryOptions::new(prompt_max_chars(config)?)?;
            commands::summarise_file(config, &PathBuf::from(path.trim()), options, Output::Text)
                .await
        }
        _ => {
            let query: String = Input::new()
                .with_prompt("Keyword or phrase (e.g. Colchester, France, NHS)")
                .interact_text()?;
            let max_articles: usize = Input::new()
                .with_prompt("Maximum number of articles to summarise")
                .default(config.digest.max_articles)
                .interact_text()?;
            let max_chars = prompt_max_chars(config)?;
            let options = DigestOptions::new(&query, max_articles, max_chars)?;
            commands::run_digest(config, &options, Output::Text).await
        }
    }
}

fn prompt_max_chars(config: &Config) -> anyhow::Result<usize> {
    Ok(Input::new()
        .with_prompt("Approximate maximum length of TL;DR (characters)")
        .default(config.summary.max_chars)
        .interact_text()?)
}
