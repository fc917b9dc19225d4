//! Extractive fallback used when no summarization model is configured

use super::{Summarizer, SummarizerError, SummaryParams};
use async_trait::async_trait;

/// Keeps leading whole sentences up to roughly `max_length` words
#[derive(Debug, Default, Clone)]
pub struct PassthroughSummarizer;

impl PassthroughSummarizer {
    pub fn new() -> Self {
        Self
    }

    /// Leading sentences whose combined word count stays within `max_words`
    ///
    /// The first sentence is always kept, truncated by words if it alone is too long.
    pub fn leading_sentences(text: &str, max_words: usize) -> String {
        let mut kept: Vec<&str> = Vec::new();
        let mut words = 0;

        for sentence in split_sentences(text) {
            let count = sentence.split_whitespace().count();
            if !kept.is_empty() && words + count > max_words {
                break;
            }
            kept.push(sentence);
            words += count;
        }

        let joined = kept.join(" ");
        if words > max_words {
            joined
                .split_whitespace()
                .take(max_words)
                .collect::<Vec<_>>()
                .join(" ")
        } else {
            joined
        }
    }
}

/// Split after `.`, `!` or `?` followed by whitespace
fn split_sentences(text: &str) -> impl Iterator<Item = &str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((index, ch)) = chars.next() {
        if matches!(ch, '.' | '!' | '?') {
            if let Some(&(next_index, next)) = chars.peek() {
                if next.is_whitespace() {
                    sentences.push(&text[start..next_index]);
                    start = next_index;
                }
            } else {
                sentences.push(&text[start..index + ch.len_utf8()]);
                start = text.len();
            }
        }
    }

    if start < text.len() {
        sentences.push(&text[start..]);
    }

    sentences
        .into_iter()
        .map(str::trim)
        .filter(|sentence| !sentence.is_empty())
}

#[async_trait]
impl Summarizer for PassthroughSummarizer {
    fn name(&self) -> &str {
        "passthrough"
    }

    async fn summarize(
        &self,
        text: &str,
        params: SummaryParams,
    ) -> Result<String, SummarizerError> {
        Ok(Self::leading_sentences(text, params.max_length as usize))
    }
}
