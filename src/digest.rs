//! Keyword news digest.
//!
//! Feed items are filtered by query, capped at [`MAX_DIGEST_ARTICLES`], and
//! each selected article is fetched and summarised in turn. The cap is applied
//! again here so no caller can summarise more than three articles per run.

use crate::feed::{filter_items, FeedItem};
use crate::model::SummaryModel;
use crate::options::{DigestOptions, MAX_DIGEST_ARTICLES};
use crate::scraper::PageSource;
use crate::summariser::{SummarizeError, Summariser};
use crate::summary::SummaryResult;
use serde::Serialize;
use tracing::{info, warn};

/// What happened to one selected article
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum ArticleOutcome {
    Summarised(SummaryResult),
    /// No usable text: missing link, fetch failure or empty page
    Skipped(String),
    /// The model call failed for this article
    Failed(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct DigestEntry {
    pub item: FeedItem,
    pub outcome: ArticleOutcome,
}

/// Matching items in feed order, at most `options.max_articles()` of them
pub fn select_articles<'a>(items: &'a [FeedItem], options: &DigestOptions) -> Vec<&'a FeedItem> {
    let selected: Vec<&FeedItem> = filter_items(items, options.query())
        .into_iter()
        .take(options.max_articles().min(MAX_DIGEST_ARTICLES))
        .collect();
    info!(
        query = options.query(),
        total = items.len(),
        selected = selected.len(),
        "selected digest articles"
    );
    selected
}

/// Fetch and summarise each article.
///
/// Per-article problems become [`ArticleOutcome`]s; only an unavailable
/// model aborts the run.
pub async fn summarise_articles<M, S>(
    summariser: &Summariser<M>,
    source: &S,
    articles: &[&FeedItem],
    max_chars: usize,
) -> Result<Vec<DigestEntry>, SummarizeError>
where
    M: SummaryModel,
    S: PageSource,
{
    let mut entries = Vec::new();
    for item in articles.iter().take(MAX_DIGEST_ARTICLES) {
        let outcome = summarise_one(summariser, source, item, max_chars).await?;
        entries.push(DigestEntry {
            item: (*item).clone(),
            outcome,
        });
    }
    Ok(entries)
}

async fn summarise_one<M, S>(
    summariser: &Summariser<M>,
    source: &S,
    item: &FeedItem,
    max_chars: usize,
) -> Result<ArticleOutcome, SummarizeError>
where
    M: SummaryModel,
    S: PageSource,
{
    if item.link.is_empty() {
        return Ok(ArticleOutcome::Skipped(
            "no link available; skipping summarisation".to_string(),
        ));
    }

    let text = match source.fetch_content(&item.link).await {
        Ok(content) => content.text,
        Err(e) => {
            warn!(link = %item.link, error = %e, "could not fetch article");
            return Ok(ArticleOutcome::Skipped(format!(
                "error fetching article text: {e}"
            )));
        }
    };

    match summariser.summarize(&text, max_chars).await {
        Ok(result) => Ok(ArticleOutcome::Summarised(result)),
        Err(SummarizeError::EmptyInput) => Ok(ArticleOutcome::Skipped(
            "could not extract text from this article".to_string(),
        )),
        Err(e @ SummarizeError::ModelUnavailable(_)) => Err(e),
        Err(e @ SummarizeError::Summarization(_)) => {
            warn!(link = %item.link, error = %e, "summarisation failed");
            Ok(ArticleOutcome::Failed(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GenerationParams, ModelError};
    use crate::scraper::{ScraperError, WebContent};
    use crate::summariser::tests::EchoModel;
    use std::collections::HashMap;
    use std::sync::Arc;

    struct StaticPages(HashMap<String, String>);

    impl StaticPages {
        fn new(pages: &[(&str, &str)]) -> Self {
            Self(
                pages
                    .iter()
                    .map(|(url, text)| (url.to_string(), text.to_string()))
                    .collect(),
            )
        }
    }

    impl PageSource for StaticPages {
        async fn fetch_content(&self, url: &str) -> Result<WebContent, ScraperError> {
            self.0
                .get(url)
                .map(|text| WebContent {
                    url: url.to_string(),
                    title: None,
                    text: text.clone(),
                })
                .ok_or(ScraperError::NoContent)
        }
    }

    struct DownModel;

    impl SummaryModel for DownModel {
        async fn generate(
            &self,
            _text: &str,
            _params: &GenerationParams,
        ) -> Result<String, ModelError> {
            Err(ModelError::Unavailable("no weights".to_string()))
        }
    }

    fn article(n: usize) -> FeedItem {
        FeedItem::new(
            &format!("France story {n}"),
            &format!("https://example.com/{n}"),
            "",
        )
    }

    const ARTICLE: &str = "The vote count finished overnight. Turnout was the highest in decades.";

    #[test]
    fn query_selects_only_matching_items() {
        let items = vec![
            FeedItem::new("France election results", "https://example.com/fr", ""),
            FeedItem::new("Weather in Tokyo", "https://example.com/jp", ""),
        ];
        let options = DigestOptions::new("France", 3, 200).unwrap();
        let selected = select_articles(&items, &options);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].title, "France election results");
    }

    #[test]
    fn selection_never_exceeds_cap() {
        let items: Vec<FeedItem> = (0..6).map(article).collect();
        let options = DigestOptions::new("france", 10, 200).unwrap();
        let selected = select_articles(&items, &options);
        assert_eq!(selected.len(), MAX_DIGEST_ARTICLES);
        assert_eq!(selected[0].title, "France story 0");
    }

    #[tokio::test]
    async fn summarises_at_most_three_articles() {
        let items: Vec<FeedItem> = (0..5).map(article).collect();
        let refs: Vec<&FeedItem> = items.iter().collect();
        let pages: Vec<(String, &str)> = items.iter().map(|i| (i.link.clone(), ARTICLE)).collect();
        let pages: Vec<(&str, &str)> = pages.iter().map(|(u, t)| (u.as_str(), *t)).collect();
        let source = StaticPages::new(&pages);
        let model = Arc::new(EchoModel::default());
        let summariser = Summariser::new(Arc::clone(&model));

        let entries = summarise_articles(&summariser, &source, &refs, 120)
            .await
            .unwrap();

        assert_eq!(entries.len(), 3);
        assert!(entries
            .iter()
            .all(|e| matches!(e.outcome, ArticleOutcome::Summarised(_))));
        assert_eq!(model.calls.load(std::sync::atomic::Ordering::SeqCst), 6);
    }

    #[tokio::test]
    async fn unreadable_articles_are_skipped() {
        let items = vec![
            FeedItem::new("France no link", "", "no link here"),
            FeedItem::new("France gone", "https://example.com/404", ""),
            FeedItem::new("France ok", "https://example.com/ok", ""),
        ];
        let refs: Vec<&FeedItem> = items.iter().collect();
        let source = StaticPages::new(&[("https://example.com/ok", ARTICLE)]);
        let summariser = Summariser::new(Arc::new(EchoModel::default()));

        let entries = summarise_articles(&summariser, &source, &refs, 120)
            .await
            .unwrap();

        assert!(matches!(&entries[0].outcome, ArticleOutcome::Skipped(r) if r.contains("no link")));
        assert!(matches!(&entries[1].outcome, ArticleOutcome::Skipped(r) if r.contains("fetching")));
        assert!(matches!(&entries[2].outcome, ArticleOutcome::Summarised(_)));
    }

    #[tokio::test]
    async fn single_word_article_is_a_failed_entry() {
        let items = vec![FeedItem::new("France", "https://example.com/w", "")];
        let refs: Vec<&FeedItem> = items.iter().collect();
        let source = StaticPages::new(&[("https://example.com/w", "Bonjour")]);
        let summariser = Summariser::new(Arc::new(EchoModel::default()));

        let entries = summarise_articles(&summariser, &source, &refs, 120)
            .await
            .unwrap();
        assert!(matches!(entries[0].outcome, ArticleOutcome::Failed(_)));
    }

    #[tokio::test]
    async fn unavailable_model_aborts_the_digest() {
        let items = vec![article(0), article(1)];
        let refs: Vec<&FeedItem> = items.iter().collect();
        let source = StaticPages::new(&[
            ("https://example.com/0", ARTICLE),
            ("https://example.com/1", ARTICLE),
        ]);
        let summariser = Summariser::new(Arc::new(DownModel));

        let err = summarise_articles(&summariser, &source, &refs, 120)
            .await
            .unwrap_err();
        assert!(matches!(err, SummarizeError::ModelUnavailable(_)));
    }

    #[test]
    fn outcome_serializes_with_status_tag() {
        let json = serde_json::to_value(ArticleOutcome::Skipped("gone".to_string())).unwrap();
        assert_eq!(json["status"], "skipped");
        assert_eq!(json["detail"], "gone");
    }
}
