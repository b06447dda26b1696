//! Delimiter-based bullet extraction.
//!
//! Model output is split on sentence terminators and newlines first. When that
//! yields fewer than [`MIN_BULLETS`] usable entries the same output is split
//! again on commas and semicolons, then the source text is tried the same way,
//! and as a last resort the model output (then the source) is split at its
//! middle word. The two halves are kept even when they read the same, so only
//! a single-word text can fail.

use crate::budget::is_terminator;

pub const MIN_BULLETS: usize = 2;
pub const MAX_BULLETS: usize = 5;

/// Derive 2..=5 bullets from `model_output`, falling back to `source`.
///
/// No returned bullet equals `tldr`. Returns `None` only when neither text
/// has two words left over once the TL;DR is excluded.
pub fn extract_bullets(model_output: &str, source: &str, tldr: &str) -> Option<Vec<String>> {
    let tldr = tldr.trim();
    let stages = [
        split_sentences(model_output),
        split_clauses(model_output),
        split_sentences(source),
        split_clauses(source),
    ];

    for pieces in &stages {
        let bullets = clean(pieces, tldr);
        if bullets.len() >= MIN_BULLETS {
            return Some(cap(bullets));
        }
    }

    [model_output, source]
        .into_iter()
        .filter_map(halve)
        .map(|halves| halves.into_iter().filter(|h| h != tldr).collect::<Vec<_>>())
        .find(|bullets| bullets.len() >= MIN_BULLETS)
}

/// Split on `.`/`!`/`?` followed by whitespace or end of line, and on newlines.
pub fn split_sentences(text: &str) -> Vec<String> {
    split_on(text, is_terminator)
}

/// Like [`split_sentences`], additionally splitting on `,` and `;`.
pub fn split_clauses(text: &str) -> Vec<String> {
    split_on(text, |c| is_terminator(c) || matches!(c, ',' | ';'))
}

fn split_on(text: &str, is_delim: impl Fn(char) -> bool) -> Vec<String> {
    let mut pieces = Vec::new();
    for line in text.lines() {
        let mut start = 0;
        let mut chars = line.char_indices().peekable();
        while let Some((idx, c)) = chars.next() {
            if !is_delim(c) {
                continue;
            }
            let at_boundary = chars.peek().map_or(true, |(_, next)| next.is_whitespace());
            if at_boundary {
                let end = idx + c.len_utf8();
                pieces.push(line[start..end].to_string());
                start = end;
            }
        }
        if !line[start..].trim().is_empty() {
            pieces.push(line[start..].to_string());
        }
    }
    pieces
}

fn halve(text: &str) -> Option<Vec<String>> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() < 2 {
        return None;
    }
    let (head, tail) = words.split_at(words.len() / 2);
    Some(vec![head.join(" "), tail.join(" ")])
}

fn clean(pieces: &[String], tldr: &str) -> Vec<String> {
    let mut bullets: Vec<String> = Vec::new();
    for piece in pieces {
        let text = strip_marker(piece.trim())
            .trim_end_matches([',', ';'])
            .trim();
        if !text.chars().any(char::is_alphanumeric) || text == tldr {
            continue;
        }
        if !bullets.iter().any(|b| b == text) {
            bullets.push(text.to_string());
        }
    }
    bullets
}

fn cap(mut bullets: Vec<String>) -> Vec<String> {
    bullets.truncate(MAX_BULLETS);
    bullets
}

/// Strip a leading list marker such as `-`, `*`, `•`, `1.` or `2)`.
fn strip_marker(text: &str) -> &str {
    let text = text.trim_start_matches(['-', '*', '•', '·']).trim_start();
    let rest = text.trim_start_matches(|c: char| c.is_ascii_digit());
    if rest.len() == text.len() {
        return text;
    }
    match rest.strip_prefix(['.', ')']) {
        Some(after) if after.is_empty() || after.starts_with(char::is_whitespace) => {
            after.trim_start()
        }
        _ => text,
    }
}
