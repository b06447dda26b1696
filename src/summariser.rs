//! The summariser: length budgeting and bullet extraction over model output.
//!
//! Every call makes two model requests against the same (truncated) source
//! text, one short-form for the TL;DR and one long-form that is split into
//! bullet points.

use crate::budget::{self, MAX_INPUT_CHARS};
use crate::bullets::extract_bullets;
use crate::config::Config;
use crate::model::{self, GenerationParams, InferenceClient, ModelError, SummaryModel};
use crate::summary::SummaryResult;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum SummarizeError {
    #[error("nothing to summarise: the input text is empty")]
    EmptyInput,
    #[error("summarisation model unavailable: {0}")]
    ModelUnavailable(#[source] ModelError),
    #[error("summarisation failed: {0}")]
    Summarization(#[source] ModelError),
}

impl From<ModelError> for SummarizeError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::Unavailable(_) => SummarizeError::ModelUnavailable(err),
            other => SummarizeError::Summarization(other),
        }
    }
}

/// Produces [`SummaryResult`]s from raw text using an injected model.
///
/// Model calls made through one `Summariser` never overlap, so share a single
/// instance (behind an `Arc`) between concurrent callers. For the process-wide
/// model that instance is [`shared`].
pub struct Summariser<M> {
    model: Arc<M>,
    gate: Mutex<()>,
}

impl<M: SummaryModel> Summariser<M> {
    pub fn new(model: Arc<M>) -> Self {
        Self {
            model,
            gate: Mutex::new(()),
        }
    }

    /// Summarise `text` into a TL;DR of roughly `max_chars` characters plus
    /// two to five bullet points.
    pub async fn summarize(
        &self,
        text: &str,
        max_chars: usize,
    ) -> Result<SummaryResult, SummarizeError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SummarizeError::EmptyInput);
        }

        let max_chars = budget::clamp_max_chars(max_chars);
        let input = budget::truncate_at_boundary(text, MAX_INPUT_CHARS);
        debug!(
            source_chars = text.chars().count(),
            input_chars = input.chars().count(),
            max_chars,
            "summarising"
        );

        let (raw_tldr, raw_long) = {
            let _guard = self.gate.lock().await;
            let raw_tldr = self.call(&input, budget::tldr_params(max_chars)).await?;
            let raw_long = self.call(&input, budget::bullet_params(max_chars)).await?;
            (raw_tldr, raw_long)
        };

        let mut tldr = budget::truncate_at_boundary(&raw_tldr, max_chars);
        if tldr.is_empty() {
            warn!("model returned an empty TL;DR, using the lead of the source");
            tldr = budget::truncate_at_boundary(&input, max_chars);
        }

        let bullets = extract_bullets(&raw_long, &input, &tldr).ok_or_else(|| {
            SummarizeError::Summarization(ModelError::MalformedResponse(
                "could not derive two bullet points".to_string(),
            ))
        })?;

        debug!(
            tldr_chars = tldr.chars().count(),
            bullets = bullets.len(),
            "summary ready"
        );
        Ok(SummaryResult::new(tldr, bullets))
    }

    async fn call(&self, input: &str, params: GenerationParams) -> Result<String, SummarizeError> {
        self.model.generate(input, &params).await.map_err(|e| {
            warn!(error = %e, "model call failed");
            SummarizeError::from(e)
        })
    }
}

static SHARED: OnceCell<Arc<Summariser<InferenceClient>>> = OnceCell::const_new();

/// The summariser over [`model::shared`], built once per process.
///
/// Wrapping the shared model in a second `Summariser` would give it a second
/// gate, so every caller goes through this one.
pub async fn shared(config: &Config) -> Result<Arc<Summariser<InferenceClient>>, ModelError> {
    SHARED
        .get_or_try_init(|| async {
            let model = model::shared(config).await?;
            Ok::<_, ModelError>(Arc::new(Summariser::new(model)))
        })
        .await
        .cloned()
}
