//! Plain-text formula detection
//!
//! When an article has no `<math>` markup, formulas are recovered from the
//! summary text itself: any line that is nothing but an equation.

use crate::scrape::{Formula, MAX_FORMULAS};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static FORMULA_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_ ()^/\\+\-*=.{}]+=[A-Za-z0-9_ ()^/\\+\-*=.{}]+$")
        .expect("valid regex")
});

/// Lines of `text` that consist solely of an equation, unique, in first-seen order
pub fn extract_formula_like_strings(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();

    text.split('\n')
        .map(str::trim)
        .filter(|line| line.contains('=') && FORMULA_LINE.is_match(line))
        .filter(|line| seen.insert(*line))
        .map(str::to_string)
        .collect()
}

/// Pick the formulas to display for a concept
///
/// Scraped `<math>` formulas win. Otherwise equation lines from the Wikipedia
/// text are used, then equation lines from the generated explanation.
pub fn choose_formulas(scraped: Vec<Formula>, wiki_text: &str, explanation: &str) -> Vec<Formula> {
    if !scraped.is_empty() {
        return scraped;
    }

    let mut candidates = extract_formula_like_strings(wiki_text);
    if candidates.is_empty() {
        candidates = extract_formula_like_strings(explanation);
    }

    candidates
        .into_iter()
        .take(MAX_FORMULAS)
        .map(Formula::unnamed)
        .collect()
}
