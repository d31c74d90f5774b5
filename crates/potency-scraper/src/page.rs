//! Reduces a product page's HTML to the [`PageContent`] the text extractor reads.

use std::sync::LazyLock;

use potency_extract::{PageContent, PercentNode};
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};

static HAS_PERCENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?%").expect("valid percent regex"));

/// Elements whose text is never shown.
const HIDDEN: [&str; 4] = ["script", "style", "noscript", "template"];

/// Elements that start a new line in rendered text.
const BLOCKS: [&str; 17] = [
    "address", "article", "aside", "br", "dd", "div", "dl", "dt", "footer", "h1", "h2", "h3",
    "h4", "h5", "h6", "li", "p",
];

/// Heading text marking the terpene breakdown.
const TERPENE_HEADING: &str = "terpenes";

/// Parses `html` and collects the page text, the terpene section text and the
/// section's percent-bearing elements.
#[must_use]
pub fn read_page(html: &str) -> PageContent {
    let document = Html::parse_document(html);

    let text = Selector::parse("body")
        .ok()
        .and_then(|body| document.select(&body).next())
        .map_or_else(|| rendered_text(document.root_element()), rendered_text);

    let section = terpene_section(&document);

    tracing::debug!(
        text_len = text.len(),
        has_section = section.is_some(),
        "read product page"
    );

    PageContent {
        text,
        terpene_section: section.map(rendered_text),
        percent_nodes: section.map(percent_nodes).unwrap_or_default(),
    }
}

/// Closest `section`, `div` or `article` around an `h4` to `h6` heading whose
/// text is "Terpenes".
fn terpene_section(document: &Html) -> Option<ElementRef<'_>> {
    let headings = Selector::parse("h6, h5, h4").ok()?;
    let heading = document
        .select(&headings)
        .find(|h| text_content(*h).trim().eq_ignore_ascii_case(TERPENE_HEADING))?;

    heading
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| matches!(el.value().name(), "section" | "div" | "article"))
}

/// Every element below `section` whose text holds a percentage, with the
/// texts of the elements inside its nearest `div`, `li`, `p` or `span`.
fn percent_nodes(section: ElementRef<'_>) -> Vec<PercentNode> {
    section
        .descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .filter_map(|el| {
            let text = text_content(el);
            if !HAS_PERCENT.is_match(&text) {
                return None;
            }
            let container = closest_container(el)?;
            let container_texts = container
                .descendants()
                .skip(1)
                .filter_map(ElementRef::wrap)
                .map(|child| text_content(child).trim().to_owned())
                .collect();
            Some(PercentNode {
                text,
                container_texts,
            })
        })
        .collect()
}

/// The element itself or its nearest ancestor that is a `div`, `li`, `p` or
/// `span`, else its parent element.
fn closest_container(el: ElementRef<'_>) -> Option<ElementRef<'_>> {
    let is_container = |e: &ElementRef<'_>| matches!(e.value().name(), "div" | "li" | "p" | "span");
    if is_container(&el) {
        return Some(el);
    }
    let mut ancestors = el.ancestors().filter_map(ElementRef::wrap);
    let parent = el.parent().and_then(ElementRef::wrap);
    ancestors.find(is_container).or(parent)
}

/// All descendant text, concatenated as-is.
fn text_content(el: ElementRef<'_>) -> String {
    el.text().collect()
}

/// Visible text with a line break before each block element, skipping
/// hidden elements.
fn rendered_text(el: ElementRef<'_>) -> String {
    let mut out = String::new();
    for node in el.descendants() {
        match node.value() {
            Node::Text(text) => {
                let hidden = node
                    .ancestors()
                    .filter_map(ElementRef::wrap)
                    .any(|a| HIDDEN.contains(&a.value().name()));
                if !hidden {
                    out.push_str(text);
                }
            }
            Node::Element(element) if BLOCKS.contains(&element.name()) => out.push('\n'),
            _ => {}
        }
    }
    out.trim().to_owned()
}

#[cfg(test)]
#[path = "page_test.rs"]
mod tests;
