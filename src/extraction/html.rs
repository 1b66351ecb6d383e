//! HTML Content Stages
//!
//! Synchronous helpers over parsed HTML. `scraper::Html` is not `Send`, so
//! callers parse and extract in one go after all awaits are done.

use scraper::{ElementRef, Html, Selector};

// `form` is left out: ASP.NET-style pages wrap the whole body in one.
const BOILERPLATE_TAGS: [&str; 7] = [
    "nav", "header", "footer", "aside", "script", "style", "noscript",
];
const BLOCK_TAGS: [&str; 3] = ["p", "li", "blockquote"];

/// Paragraphs shorter than this are treated as captions or link lists.
const MIN_PARAGRAPH_CHARS: usize = 40;

fn selector(css: &'static str) -> Selector {
    Selector::parse(css).expect("static selector is valid")
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn element_text(el: ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<Vec<_>>().join(" "))
}

fn has_ancestor(el: ElementRef<'_>, names: &[&str]) -> bool {
    el.ancestors().any(|node| {
        node.value()
            .as_element()
            .is_some_and(|e| names.contains(&e.name()))
    })
}

/// Main-content text: blocks under `<article>`, `<main>` or the body,
/// skipping navigation and other page chrome.
pub fn main_content_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let blocks = selector("h1, h2, h3, h4, p, li, blockquote, pre");

    let root = ["article", "main", "[role=main]", "body"]
        .into_iter()
        .find_map(|css| document.select(&selector(css)).next());
    let Some(root) = root else {
        return String::new();
    };

    root.select(&blocks)
        .filter(|el| !has_ancestor(*el, &BOILERPLATE_TAGS) && !has_ancestor(*el, &BLOCK_TAGS))
        .map(element_text)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// News-article style text: every substantial `<p>` in the document.
pub fn article_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let paragraphs = selector("p");

    document
        .select(&paragraphs)
        .filter(|el| !has_ancestor(*el, &BOILERPLATE_TAGS))
        .map(element_text)
        .filter(|t| t.chars().count() >= MIN_PARAGRAPH_CHARS)
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// `<meta name="description">` or `og:description`, whichever comes first
/// with content.
pub fn meta_description(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let metas = selector(r#"meta[name="description"], meta[property="og:description"]"#);

    document
        .select(&metas)
        .filter_map(|el| el.value().attr("content"))
        .map(collapse_whitespace)
        .find(|c| !c.is_empty())
}

/// Readability-style summary: the container whose direct paragraphs carry
/// the most text, one line per text node.
pub fn readability_summary(html: &str) -> String {
    let document = Html::parse_document(html);
    let containers = selector("article, main, section, div, td");

    let best = document
        .select(&containers)
        .filter(|el| !has_ancestor(*el, &BOILERPLATE_TAGS))
        .map(|el| (direct_paragraph_chars(el), el))
        .filter(|(score, _)| *score > 0)
        .max_by_key(|(score, _)| *score);

    let Some((_, container)) = best else {
        return String::new();
    };

    container
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn direct_paragraph_chars(container: ElementRef<'_>) -> usize {
    container
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|child| child.value().name() == "p")
        .map(|p| element_text(p).chars().count())
        .sum()
}

/// Plain text of an HTML fragment such as a feed item description.
pub fn fragment_text(fragment: &str) -> String {
    let document = Html::parse_fragment(fragment);
    collapse_whitespace(&document.root_element().text().collect::<Vec<_>>().join(" "))
}

/// Normalizes a model answer for HTML embedding: a full document is reduced
/// to its body's inner HTML; text without markup is wrapped in `<p>`.
pub fn body_inner_html(answer: &str) -> String {
    let trimmed = answer.trim();
    let lower = trimmed.to_lowercase();

    if lower.starts_with("<!doctype") || lower.starts_with("<html") || lower.contains("<body") {
        let document = Html::parse_document(trimmed);
        if let Some(body) = document.select(&selector("body")).next() {
            return body.inner_html().trim().to_string();
        }
    }

    if !trimmed.starts_with('<') {
        return format!("<p>{trimmed}</p>");
    }

    trimmed.to_string()
}
