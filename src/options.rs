//! Validated run options.
//!
//! CLI flags and interactive answers are converted here before anything is
//! fetched or summarised, so the core only ever sees sane values.

use thiserror::Error;
use tracing::info;

/// Hard cap on articles per digest. Each article costs two model calls.
pub const MAX_DIGEST_ARTICLES: usize = 3;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum OptionsError {
    #[error("max chars must be a positive integer")]
    ZeroMaxChars,
    #[error("max articles must be at least 1")]
    ZeroMaxArticles,
    #[error("query must not be empty")]
    EmptyQuery,
}

/// Options for summarising a single text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryOptions {
    max_chars: usize,
}

impl SummaryOptions {
    pub fn new(max_chars: usize) -> Result<Self, OptionsError> {
        if max_chars == 0 {
            return Err(OptionsError::ZeroMaxChars);
        }
        Ok(Self { max_chars })
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }
}

/// Options for a keyword digest over news feeds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestOptions {
    query: String,
    max_articles: usize,
    summary: SummaryOptions,
}

impl DigestOptions {
    /// Validate digest options. `max_articles` above the cap is clamped, not
    /// rejected.
    pub fn new(query: &str, max_articles: usize, max_chars: usize) -> Result<Self, OptionsError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(OptionsError::EmptyQuery);
        }
        if max_articles == 0 {
            return Err(OptionsError::ZeroMaxArticles);
        }
        if max_articles > MAX_DIGEST_ARTICLES {
            info!(
                requested = max_articles,
                cap = MAX_DIGEST_ARTICLES,
                "clamping digest article count"
            );
        }

        Ok(Self {
            query: query.to_string(),
            max_articles: max_articles.min(MAX_DIGEST_ARTICLES),
            summary: SummaryOptions::new(max_chars)?,
        })
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn max_articles(&self) -> usize {
        self.max_articles
    }

    pub fn max_chars(&self) -> usize {
        self.summary.max_chars()
    }
}
