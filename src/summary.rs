//! SummaryResult - the record produced for every summarised text.

use serde::Serialize;

/// A TL;DR paragraph plus the bullet points derived from the same source text.
///
/// Built only by the summariser, which guarantees a non-empty `tldr` and
/// between two and five bullets, none of them equal to the TL;DR.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryResult {
    tldr: String,
    bullets: Vec<String>,
}

impl SummaryResult {
    pub(crate) fn new(tldr: String, bullets: Vec<String>) -> Self {
        Self { tldr, bullets }
    }

    /// The single-paragraph summary
    pub fn tldr(&self) -> &str {
        &self.tldr
    }

    /// Bullet points in model output order
    pub fn bullets(&self) -> &[String] {
        &self.bullets
    }
}
