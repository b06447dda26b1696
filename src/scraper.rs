//! Web scraping module for content extraction.
//!
//! Uses reqwest for fetching and scraper for HTML parsing.

use crate::config::FetchConfig;
use crate::summariser::SummarizeError;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::future::Future;
use thiserror::Error;
use tracing::debug;

/// Blocks shorter than this are usually navigation or captions
const MIN_BLOCK_CHARS: usize = 20;

/// Elements whose text never reaches the reader
const HIDDEN_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("failed to fetch URL: {0}")]
    FetchError(#[from] reqwest::Error),
    #[error("no content found at URL")]
    NoContent,
}

/// A page that cannot be read is, to the summariser, a page with no text.
impl From<ScraperError> for SummarizeError {
    fn from(_: ScraperError) -> Self {
        SummarizeError::EmptyInput
    }
}

/// Extracted content from a webpage
#[derive(Debug, Clone)]
pub struct WebContent {
    /// The original URL
    pub url: String,
    /// Page title
    pub title: Option<String>,
    /// Main text content
    pub text: String,
}

/// Anything that can turn a URL into readable text.
pub trait PageSource: Send + Sync {
    fn fetch_content(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<WebContent, ScraperError>> + Send;
}

/// HTTP page fetcher sharing one configured client
pub struct Scraper {
    client: Client,
}

impl Scraper {
    pub fn new(config: &FetchConfig) -> Result<Self, ScraperError> {
        Ok(Self {
            client: create_client(config)?,
        })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

impl PageSource for Scraper {
    /// Fetch and extract content from a URL
    async fn fetch_content(&self, url: &str) -> Result<WebContent, ScraperError> {
        debug!(url, "fetching page");
        let response = self.client.get(url).send().await?.error_for_status()?;
        let html = response.text().await?;
        parse_page(url, &html)
    }
}

/// Create a configured HTTP client for scraping
pub fn create_client(config: &FetchConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(config.timeout())
        .build()
}

/// Extract title and readable text from an HTML document
pub fn parse_page(url: &str, html: &str) -> Result<WebContent, ScraperError> {
    let document = Html::parse_document(html);

    let title = extract_title(&document);
    let text = extract_text(&document);

    if text.trim().is_empty() {
        return Err(ScraperError::NoContent);
    }

    Ok(WebContent {
        url: url.to_string(),
        title,
        text,
    })
}

/// Extract the page title from <title> or <h1>
fn extract_title(document: &Html) -> Option<String> {
    ["title", "h1"]
        .into_iter()
        .filter_map(|tag| Selector::parse(tag).ok())
        .find_map(|selector| {
            let element = document.select(&selector).next()?;
            let title = collapse_whitespace(&element.text().collect::<String>());
            (!title.is_empty()).then_some(title)
        })
}

/// Extract readable text content from the page
fn extract_text(document: &Html) -> String {
    // Try to find main content areas first
    let main_selectors = ["article", "main", "[role='main']", ".content", "#content"];

    for selector_str in main_selectors {
        if let Ok(selector) = Selector::parse(selector_str) {
            if let Some(element) = document.select(&selector).next() {
                let text = extract_blocks(element);
                if !text.trim().is_empty() {
                    return text;
                }
            }
        }
    }

    let text = extract_blocks(document.root_element());
    if !text.trim().is_empty() {
        return text;
    }

    // Pages without paragraph markup: keep every visible line
    extract_visible_text(document)
}

/// Extract text from paragraphs, headings and list items
fn extract_blocks(root: ElementRef<'_>) -> String {
    let Ok(content_selector) = Selector::parse("p, h1, h2, h3, h4, h5, h6, li") else {
        return String::new();
    };

    root.select(&content_selector)
        .map(|element| collapse_whitespace(&element.text().collect::<Vec<_>>().join(" ")))
        .filter(|block| block.chars().count() > MIN_BLOCK_CHARS)
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn extract_visible_text(document: &Html) -> String {
    let mut lines: Vec<String> = Vec::new();
    for node in document.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|e| HIDDEN_ELEMENTS.iter().any(|name| *name == e.name()))
        });
        if hidden {
            continue;
        }
        lines.extend(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string),
        );
    }
    lines.join("\n")
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
