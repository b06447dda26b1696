//! Length budgeting for summariser input and output.
//!
//! All lengths are counted in characters, never bytes, so truncation is
//! always on a `char` boundary.

use crate::model::GenerationParams;

/// Budgets below this are raised to it
pub const MIN_MAX_CHARS: usize = 30;

/// Source text beyond this is cut before it reaches the model
pub const MAX_INPUT_CHARS: usize = 4000;

/// Rough characters-per-token ratio for English model output
pub const CHARS_PER_TOKEN: usize = 4;

const TLDR_TOKENS: (usize, usize) = (12, 200);
const BULLET_TOKENS: (usize, usize) = (60, 256);

/// Raise a caller-supplied character budget to the practical minimum.
pub fn clamp_max_chars(max_chars: usize) -> usize {
    max_chars.max(MIN_MAX_CHARS)
}

/// Approximate token count for `chars` characters.
pub fn approx_tokens(chars: usize) -> usize {
    chars.div_ceil(CHARS_PER_TOKEN)
}

/// Generation limits for the short-form TL;DR call.
pub fn tldr_params(max_chars: usize) -> GenerationParams {
    let max_length = approx_tokens(max_chars).clamp(TLDR_TOKENS.0, TLDR_TOKENS.1);
    GenerationParams::new(max_length, max_length / 4)
}

/// Generation limits for the long-form call that feeds the bullet points.
pub fn bullet_params(max_chars: usize) -> GenerationParams {
    let tldr_tokens = approx_tokens(max_chars).clamp(TLDR_TOKENS.0, TLDR_TOKENS.1);
    let max_length = (tldr_tokens * 3).clamp(BULLET_TOKENS.0, BULLET_TOKENS.1);
    GenerationParams::new(max_length, max_length / 3)
}

/// Cut `text` to at most `max_chars` characters.
///
/// Prefers the last sentence terminator in the second half of the window,
/// then the last word boundary, then a hard cut. Text that already fits is
/// returned trimmed.
pub fn truncate_at_boundary(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    let cut = match text.char_indices().nth(max_chars) {
        Some((idx, _)) => idx,
        None => return text.to_string(),
    };
    let window = &text[..cut];

    if let Some(end) = last_sentence_end(text, window, max_chars / 2) {
        return window[..end].trim_end().to_string();
    }

    let word_end = if text[cut..].starts_with(char::is_whitespace) {
        Some(cut)
    } else {
        window.rfind(char::is_whitespace)
    };
    if let Some(end) = word_end {
        let trimmed = window[..end]
            .trim_end()
            .trim_end_matches([',', ';', ':'])
            .trim_end();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    window.to_string()
}

/// Byte offset just past the last `.`/`!`/`?` in `window` that ends a
/// sentence in `text` and sits at or beyond `min_chars` characters.
fn last_sentence_end(text: &str, window: &str, min_chars: usize) -> Option<usize> {
    window
        .char_indices()
        .enumerate()
        .filter(|(_, (_, c))| is_terminator(*c))
        .filter_map(|(pos, (idx, c))| {
            let after = idx + c.len_utf8();
            let ends_sentence = text[after..]
                .chars()
                .next()
                .map_or(true, char::is_whitespace);
            (ends_sentence && pos + 1 >= min_chars).then_some(after)
        })
        .last()
}

pub(crate) fn is_terminator(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}
