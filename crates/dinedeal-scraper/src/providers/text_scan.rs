//! Fallback extraction over every visible text node of a page.

use scraper::{ElementRef, Html};

use crate::normalize::{collapse_whitespace, extract_offer_texts};

/// Elements whose text content never renders.
const HIDDEN_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

/// Trimmed, non-empty text nodes in document order, skipping anything inside
/// [`HIDDEN_ELEMENTS`].
pub(super) fn visible_text_lines(document: &Html) -> Vec<String> {
    document
        .root_element()
        .descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let hidden = node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .is_some_and(|el| HIDDEN_ELEMENTS.contains(&el.name()))
            });
            if hidden {
                return None;
            }
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_owned())
        })
        .collect()
}

/// Offer candidates from the whole page, used when no structured carrier
/// yielded anything.
pub(super) fn fallback_offer_texts(document: &Html, limit: usize) -> Vec<String> {
    extract_offer_texts(visible_text_lines(document), limit)
}

/// Visible text of `element` with whitespace collapsed.
pub(super) fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}
