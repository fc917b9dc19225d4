//! HTML scraping of rendered Wikipedia articles
//!
//! Two extractions run over the same page: named formulas taken from `<math>`
//! elements, and a short plain-text digest of the first substantial paragraphs.

use crate::wiki::{KnowledgeSource, WikiPage};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Node, Selector};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// At most this many `<math>` elements are collected per page
pub const MAX_FORMULAS: usize = 5;

/// Labels and captions longer than this are treated as prose, not names
const MAX_NAME_LEN: usize = 50;

/// Paragraphs at or below this length are skipped by the digest
const MIN_PARAGRAPH_LEN: usize = 50;

const MAX_PARAGRAPHS: usize = 3;

/// Subtrees ignored when building the plain-text digest
const EXCLUDED_TAGS: [&str; 6] = ["math", "script", "style", "table", "img", "figure"];

static MATH: Lazy<Selector> = Lazy::new(|| selector("math"));
static TEX_ANNOTATION: Lazy<Selector> =
    Lazy::new(|| selector(r#"annotation[encoding="application/x-tex"]"#));
static PARAGRAPH: Lazy<Selector> = Lazy::new(|| selector("p"));

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid selector")
}

/// A formula in TeX notation with an optional human-readable name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Formula {
    pub name: Option<String>,
    pub tex: String,
}

impl Formula {
    pub fn unnamed(tex: impl Into<String>) -> Self {
        Self {
            name: None,
            tex: tex.into(),
        }
    }
}

/// Collect up to five formulas from `<math>` elements, deduplicated by TeX
pub fn extract_formulas_with_names(html: &str) -> Vec<Formula> {
    let document = Html::parse_document(html);
    let mut formulas = Vec::new();

    for math in document.select(&MATH) {
        let tex = formula_text(math);
        if tex.is_empty() {
            continue;
        }

        let name = label_from_preceding_text(math).or_else(|| label_from_preceding_bold(math));
        formulas.push(Formula { name, tex });

        if formulas.len() >= MAX_FORMULAS {
            break;
        }
    }

    let mut seen = std::collections::HashSet::new();
    formulas.retain(|formula| seen.insert(formula.tex.clone()));
    formulas
}

/// First three substantial paragraphs as plain text, separated by blank lines
pub fn extract_clean_text(html: &str) -> String {
    let document = Html::parse_document(html);

    document
        .select(&PARAGRAPH)
        .filter(|p| !has_excluded_ancestor(*p))
        .map(|p| {
            let mut text = String::new();
            collect_visible_text(p, &mut text);
            text.trim().to_string()
        })
        .filter(|text| text.chars().count() > MIN_PARAGRAPH_LEN)
        .take(MAX_PARAGRAPHS)
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// TeX annotation if present, then `alttext`, then the element's own text
fn formula_text(math: ElementRef<'_>) -> String {
    if let Some(annotation) = math.select(&TEX_ANNOTATION).next() {
        let tex = annotation.text().collect::<String>();
        if !tex.trim().is_empty() {
            return tex.trim().to_string();
        }
    }

    if let Some(alt) = math.value().attr("alttext") {
        if !alt.trim().is_empty() {
            return alt.trim().to_string();
        }
    }

    math.text().collect::<String>().trim().to_string()
}

/// "Ohm's law:" style label in the closest non-blank text before the formula
fn label_from_preceding_text(math: ElementRef<'_>) -> Option<String> {
    let previous = find_preceding(math, |node, _| {
        node.as_text()
            .map(|text| text.trim())
            .filter(|text| !text.is_empty())
            .map(str::to_string)
    })?;

    let lower = previous.to_lowercase();
    let looks_like_label = previous.chars().count() < MAX_NAME_LEN
        && (previous.contains(':') || lower.contains("law") || lower.contains("equation"));

    looks_like_label.then(|| previous.replace(':', "").trim().to_string())
}

/// Closest preceding `<b>`/`<strong>` element with short text
fn label_from_preceding_bold(math: ElementRef<'_>) -> Option<String> {
    let bold_text = find_preceding(math, |_, element| {
        element
            .filter(|el| matches!(el.value().name(), "b" | "strong"))
            .map(|el| el.text().collect::<String>().trim().to_string())
    })?;

    (!bold_text.is_empty() && bold_text.chars().count() < MAX_NAME_LEN).then_some(bold_text)
}

/// Walk nodes before `start` in reverse document order (ancestors included)
/// and return the first value `visit` produces
fn find_preceding<'a, T>(
    start: ElementRef<'a>,
    mut visit: impl FnMut(&'a Node, Option<ElementRef<'a>>) -> Option<T>,
) -> Option<T> {
    let mut current = *start;

    loop {
        if let Some(previous) = current.prev_sibling() {
            current = previous;
            while let Some(last) = current.last_child() {
                current = last;
            }
        } else if let Some(parent) = current.parent() {
            current = parent;
        } else {
            return None;
        }

        if let Some(found) = visit(current.value(), ElementRef::wrap(current)) {
            return Some(found);
        }
    }
}

fn has_excluded_ancestor(element: ElementRef<'_>) -> bool {
    element.ancestors().any(|ancestor| {
        ancestor
            .value()
            .as_element()
            .is_some_and(|el| EXCLUDED_TAGS.contains(&el.name()))
    })
}

fn collect_visible_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(child_element) = ElementRef::wrap(child) {
            if !EXCLUDED_TAGS.contains(&child_element.value().name()) {
                collect_visible_text(child_element, out);
            }
        }
    }
}

/// Scraped formulas and digest for one concept's article
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageContent {
    pub formulas: Vec<Formula>,
    pub details: String,
}

/// Fetch the concept's article once and run both extractions over it
///
/// Scraping is best-effort: any retrieval failure yields empty content.
pub async fn page_content_for(
    source: &dyn KnowledgeSource,
    concept: &str,
    auto_suggest: bool,
) -> PageContent {
    let page: WikiPage = match source.page(concept, auto_suggest).await {
        Ok(page) => page,
        Err(e) => {
            warn!("Could not resolve article for '{}': {}", concept, e);
            return PageContent::default();
        }
    };

    let html = match source.page_html(&page).await {
        Ok(html) => html,
        Err(e) => {
            warn!("Could not fetch article HTML for '{}': {}", page.title, e);
            return PageContent::default();
        }
    };

    let content = PageContent {
        formulas: extract_formulas_with_names(&html),
        details: extract_clean_text(&html),
    };
    debug!(
        "Scraped '{}': {} formulas, {} chars of detail",
        page.title,
        content.formulas.len(),
        content.details.len()
    );
    content
}
