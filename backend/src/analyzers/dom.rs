// Helpers for the DOM-based analyzers
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::line_col;

/// Elements matching a CSS selector, in document order. An invalid selector
/// matches nothing.
pub(crate) fn select<'a>(doc: &'a Html, css: &str) -> Vec<ElementRef<'a>> {
    Selector::parse(css)
        .map(|selector| doc.select(&selector).collect())
        .unwrap_or_default()
}

pub(crate) fn text(el: &ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

pub(crate) fn attr<'a>(el: &ElementRef<'a>, name: &str) -> Option<&'a str> {
    el.value().attr(name)
}

pub(crate) fn has_nonempty_attr(el: &ElementRef, name: &str) -> bool {
    attr(el, name).is_some_and(|v| !v.trim().is_empty())
}

/// Line of every opening `<tag` in the raw source, in order
pub(crate) fn tag_lines(source: &str, tag: &str) -> Vec<usize> {
    let pattern = format!(r"(?i)<{}(?:[\s/>]|$)", regex::escape(tag));
    Regex::new(&pattern)
        .map(|re| {
            re.find_iter(source)
                .map(|m| line_col(source, m.start()).0)
                .collect()
        })
        .unwrap_or_default()
}

/// Source line of a parsed element, found by pairing the n-th element of its
/// tag name with the n-th `<tag` in the source. Elements the parser invented
/// have no line.
pub(crate) fn line_of(doc: &Html, source: &str, el: &ElementRef) -> Option<usize> {
    let name = el.value().name();
    let position = select(doc, name).iter().position(|e| e.id() == el.id())?;
    tag_lines(source, name).get(position).copied()
}

/// Outer HTML, shortened for display
pub(crate) fn snippet(el: &ElementRef) -> String {
    let html = el.html();
    if html.chars().count() <= 120 {
        return html;
    }
    let short: String = html.chars().take(117).collect();
    format!("{}...", short)
}
