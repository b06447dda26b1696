//! Command runners shared by the CLI and the interactive front-end.
//!
//! Each runner validates and gathers its text first and only then loads the
//! model, so bad input never pays for a model load.

use crate::config::{Config, TOKEN_ENV};
use crate::digest::{self, ArticleOutcome, DigestEntry};
use crate::feed::{self, FeedItem};
use crate::model::InferenceClient;
use crate::options::{DigestOptions, SummaryOptions};
use crate::scraper::{PageSource, Scraper, ScraperError};
use crate::summariser::{self, SummarizeError, Summariser};
use crate::summary::SummaryResult;
use anyhow::{bail, Context};
use colored::Colorize;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;

/// Headlines shown when a digest query matches nothing
const SAMPLE_HEADLINES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    Text,
    Json,
}

/// Load (or reuse) the process-wide summariser and its model
pub async fn load_summariser(config: &Config) -> anyhow::Result<Arc<Summariser<InferenceClient>>> {
    summariser::shared(config)
        .await
        .map_err(SummarizeError::ModelUnavailable)
        .with_context(|| {
            format!(
                "could not load model '{}' from {}; check network access, the [model] section of newsbrief.toml, and {} if the endpoint needs a token",
                config.model.name, config.model.endpoint, TOKEN_ENV
            )
        })
}

/// A page that cannot be fetched or read has nothing to summarise
fn fetch_failure(url: &str, err: ScraperError) -> anyhow::Error {
    let cause = err.to_string();
    anyhow::Error::new(SummarizeError::from(err)).context(format!("error fetching {url}: {cause}"))
}

/// Summarise a local text or markdown file
pub async fn summarise_file(
    config: &Config,
    path: &Path,
    options: SummaryOptions,
    output: Output,
) -> anyhow::Result<()> {
    if !path.exists() {
        bail!("file not found: {}", path.display());
    }
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let text = String::from_utf8_lossy(&bytes);
    if text.trim().is_empty() {
        return Err(SummarizeError::EmptyInput)
            .with_context(|| format!("{} is empty or unreadable", path.display()));
    }

    let summariser = load_summariser(config).await?;
    let result = summariser.summarize(&text, options.max_chars()).await?;

    let title = path.file_name().map(|n| n.to_string_lossy().into_owned());
    print_summary(title.as_deref(), None, &result, output)
}

/// Summarise a web page, or with `raw` just print its extracted text
pub async fn summarise_url(
    config: &Config,
    url: &str,
    options: SummaryOptions,
    raw: bool,
    output: Output,
) -> anyhow::Result<()> {
    if url.trim().is_empty() {
        return Err(SummarizeError::EmptyInput).context("please enter a URL");
    }
    if output == Output::Text {
        println!("Fetching: {}", url);
    }

    let scraper = Scraper::new(&config.fetch)?;
    let content = scraper
        .fetch_content(url)
        .await
        .map_err(|e| fetch_failure(url, e))?;
    let title = content.title.clone();

    if raw {
        match output {
            Output::Json => println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "url": content.url,
                    "title": title,
                    "text": content.text,
                }))?
            ),
            Output::Text => {
                println!("\n=== {} ===\n", title.as_deref().unwrap_or("No title"));
                println!("{}", content.text);
                println!(
                    "\n--- Extracted {} characters ---",
                    content.text.chars().count()
                );
            }
        }
        return Ok(());
    }

    if output == Output::Text {
        println!(
            "Summarising {} characters...\n",
            content.text.chars().count()
        );
    }
    let summariser = load_summariser(config).await?;
    let result = summariser.summarize(&content.text, options.max_chars()).await?;
    print_summary(title.as_deref(), Some(url), &result, output)
}

/// Search the configured feeds for `options.query()` and summarise matches
pub async fn run_digest(config: &Config, options: &DigestOptions, output: Output) -> anyhow::Result<()> {
    if output == Output::Text {
        println!("\n{}", "[newsbrief] Starting digest".bold());
        println!("Query       : {:?}", options.query());
        println!("Max articles: {}", options.max_articles());
        println!("Max chars   : {}", options.max_chars());
        println!("\nFetching {} feeds...", config.digest.feeds.len());
    }

    let scraper = Scraper::new(&config.fetch)?;
    let items = feed::collect_items(scraper.client(), &config.digest.feeds).await;
    let selected = digest::select_articles(&items, options);

    if selected.is_empty() {
        return print_no_matches(options.query(), &items, output);
    }

    if output == Output::Text {
        println!("Total items from all feeds: {}", items.len());
        println!("Summarising {} article(s):\n", selected.len());
    }

    let summariser = load_summariser(config).await?;
    let entries =
        digest::summarise_articles(&*summariser, &scraper, &selected, options.max_chars()).await?;

    match output {
        Output::Json => println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "query": options.query(),
                "total_items": items.len(),
                "entries": entries,
            }))?
        ),
        Output::Text => {
            for (i, entry) in entries.iter().enumerate() {
                print_digest_entry(i + 1, entry);
            }
        }
    }
    Ok(())
}

fn print_no_matches(query: &str, items: &[FeedItem], output: Output) -> anyhow::Result<()> {
    let headlines: Vec<&str> = items
        .iter()
        .take(SAMPLE_HEADLINES)
        .map(|item| item.title.as_str())
        .collect();

    match output {
        Output::Json => println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "query": query,
                "total_items": items.len(),
                "entries": [],
                "headlines": headlines,
            }))?
        ),
        Output::Text => {
            println!(
                "\nNo items matched query {:?} in the current feeds. Try a broader term (e.g. 'UK', 'police', 'election').",
                query
            );
            if !headlines.is_empty() {
                println!("\nHere are a few recent headlines from the feeds:");
                for headline in headlines {
                    println!("  • {}", headline);
                }
            }
        }
    }
    Ok(())
}

fn print_digest_entry(index: usize, entry: &DigestEntry) {
    println!(
        "{}",
        format!("================ Article {} ================", index).bold()
    );
    println!("Title: {}", entry.item.title);
    if !entry.item.link.is_empty() {
        println!("Link : {}", entry.item.link);
    }
    println!();

    match &entry.outcome {
        ArticleOutcome::Summarised(result) => print_result_text(result),
        ArticleOutcome::Skipped(reason) => println!("{}", reason.yellow()),
        ArticleOutcome::Failed(reason) => println!("{}", reason.red()),
    }
    println!();
}

fn print_summary(
    title: Option<&str>,
    url: Option<&str>,
    result: &SummaryResult,
    output: Output,
) -> anyhow::Result<()> {
    match output {
        Output::Json => {
            let value = json!({
                "title": title,
                "url": url,
                "tldr": result.tldr(),
                "bullets": result.bullets(),
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        Output::Text => {
            if let Some(title) = title {
                println!("=== {} ===\n", title);
            }
            print_result_text(result);
        }
    }
    Ok(())
}

fn print_result_text(result: &SummaryResult) {
    println!("💡 {}", "TL;DR:".bold());
    println!("  {}\n", result.tldr());

    println!("📌 {}", "Bullet Points:".bold());
    for (i, bullet) in result.bullets().iter().enumerate() {
        println!("  {}. {}", i + 1, bullet);
    }
}
