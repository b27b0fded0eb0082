//! Content extraction: turn a rendered DOM into a title and structured text.
//!
//! The output text uses `\n` as its only structural marker:
//!
//! * headings are surrounded by blank lines,
//! * paragraphs sit on their own line,
//! * list items become `• item` lines,
//! * loose text nodes flow inline, separated by single spaces.
//!
//! The renderer's heading heuristic ([`crate::pipeline::layout`]) reads those
//! markers back, so the two modules agree on this format.

use crate::job::ExtractedContent;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};

/// Elements removed before extraction; nothing inside them reaches the output.
pub const NOISE_SELECTORS: &[&str] = &[
    "script",
    "style",
    "noscript",
    "template",
    "nav",
    "header",
    "footer",
    "[role=\"navigation\"]",
    ".ad",
    ".ads",
    ".advert",
    ".advertisement",
    "[class^=\"ad-\"]",
    "[class*=\" ad-\"]",
    "[id^=\"ad-\"]",
    ".social",
    ".social-share",
    ".share-buttons",
    "[class*=\"social\"]",
    ".cookie",
    "[class*=\"cookie\"]",
    "[id*=\"cookie\"]",
    ".popup",
    "[class*=\"popup\"]",
    ".modal",
];

/// Content roots in priority order; the first match wins, else `body`.
pub const CONTENT_ROOT_SELECTORS: &[&str] = &[
    "main, [role=\"main\"]",
    "article, [role=\"article\"]",
    ".content, #content, .post-content, .entry-content, .article-content",
];

pub const UNTITLED: &str = "Untitled";
pub const NO_CONTENT: &str = "No content found";

static RE_EXCESS_NEWLINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

/// Parse an HTML document and extract its readable content.
pub fn extract_from_html(html: &str) -> ExtractedContent {
    let mut document = Html::parse_document(html);
    extract(&mut document)
}

/// Extract title and structured text from a parsed document.
///
/// Noise elements are detached from `document` first, so the caller's tree
/// is modified. Never fails: missing pieces fall back to [`UNTITLED`] and
/// [`NO_CONTENT`].
pub fn extract(document: &mut Html) -> ExtractedContent {
    remove_noise(document);

    let title = resolve_title(document);
    let root = content_root(document);

    let mut out = String::new();
    walk(root, &mut out);

    let text = RE_EXCESS_NEWLINES
        .replace_all(&out, "\n\n")
        .trim()
        .to_string();
    let text = if text.is_empty() {
        NO_CONTENT.to_string()
    } else {
        text
    };

    ExtractedContent { title, text }
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

/// First match among elements still attached to the document.
///
/// `Html::select` scans the whole node arena, detached noise included, so
/// searches start from the root element instead.
// The binding keeps the `Select` temporary from outliving `sel`.
#[allow(clippy::let_and_return)]
fn first_match<'a>(document: &'a Html, css: &str) -> Option<ElementRef<'a>> {
    let sel = selector(css)?;
    let found = document.root_element().select(&sel).next();
    found
}

fn remove_noise(document: &mut Html) {
    let Some(noise) = selector(&NOISE_SELECTORS.join(", ")) else {
        return;
    };
    let ids: Vec<_> = document
        .root_element()
        .select(&noise)
        .map(|el| el.id())
        .collect();
    for id in ids {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }
}

fn resolve_title(document: &Html) -> String {
    let first_text = |css: &str| -> Option<String> {
        let text = element_text(first_match(document, css)?);
        (!text.is_empty()).then_some(text)
    };

    first_text("title")
        .or_else(|| first_text("h1"))
        .unwrap_or_else(|| UNTITLED.to_string())
}

fn content_root(document: &Html) -> ElementRef<'_> {
    CONTENT_ROOT_SELECTORS
        .iter()
        .find_map(|css| first_match(document, css))
        .or_else(|| first_match(document, "body"))
        .unwrap_or_else(|| document.root_element())
}

/// Depth-first, document-order walk emitting structural markers.
fn walk(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(el) = ElementRef::wrap(child) {
            match el.value().name() {
                "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                    let text = element_text(el);
                    if !text.is_empty() {
                        out.push_str("\n\n");
                        out.push_str(&text);
                        out.push_str("\n\n");
                    }
                }
                "p" => {
                    let text = element_text(el);
                    if !text.is_empty() {
                        out.push('\n');
                        out.push_str(&text);
                        out.push('\n');
                    }
                }
                "li" => {
                    let text = element_text(el);
                    if !text.is_empty() {
                        if !out.is_empty() && !out.ends_with('\n') {
                            out.push('\n');
                        }
                        out.push_str("• ");
                        out.push_str(&text);
                        out.push('\n');
                    }
                }
                _ => walk(el, out),
            }
        } else if let Node::Text(text) = child.value() {
            let text = normalize_whitespace(text);
            if !text.is_empty() {
                out.push_str(&text);
                out.push(' ');
            }
        }
    }
}

/// Concatenated descendant text with whitespace runs collapsed.
fn element_text(el: ElementRef<'_>) -> String {
    normalize_whitespace(&el.text().collect::<String>())
}

fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
