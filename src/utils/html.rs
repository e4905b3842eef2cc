//! Small DOM helpers on top of `scraper` shared by the site adapters.

use scraper::{ElementRef, Selector};

/// First descendant of `scope` matching `css`. Invalid selectors match nothing.
pub fn select_first<'a>(scope: ElementRef<'a>, css: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(css).ok()?;
    scope.select(&selector).next()
}

/// All descendants of `scope` matching `css`, in document order.
pub fn select_all<'a>(scope: ElementRef<'a>, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => scope.select(&selector).collect(),
        Err(e) => {
            tracing::debug!("Invalid CSS selector '{}': {:?}", css, e);
            Vec::new()
        }
    }
}

/// Collapse whitespace runs to a single space, drop direction marks, trim.
pub fn clean_text(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, '\u{200e}' | '\u{200f}'))
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Full text content of an element, cleaned.
pub fn text_of(element: ElementRef<'_>) -> String {
    clean_text(&element.text().collect::<String>())
}

/// Text nodes trimmed individually and concatenated without separators.
pub fn stripped_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("")
}

/// Text nodes trimmed individually and joined with `sep`.
pub fn joined_text(element: ElementRef<'_>, sep: &str) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(sep)
}

pub fn parent_element(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element.parent().and_then(ElementRef::wrap)
}

pub fn next_element_siblings(element: ElementRef<'_>) -> impl Iterator<Item = ElementRef<'_>> {
    element.next_siblings().filter_map(ElementRef::wrap)
}

pub fn prev_element_siblings(element: ElementRef<'_>) -> impl Iterator<Item = ElementRef<'_>> {
    element.prev_siblings().filter_map(ElementRef::wrap)
}

pub fn element_children(element: ElementRef<'_>) -> impl Iterator<Item = ElementRef<'_>> {
    element.children().filter_map(ElementRef::wrap)
}

pub fn is_tag(element: ElementRef<'_>, name: &str) -> bool {
    element.value().name() == name
}

/// Elements that follow `element` in document order (descendants first,
/// then following siblings and their subtrees, walking up the ancestors).
pub fn following_elements(element: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    let mut result: Vec<ElementRef<'_>> = element.descendants().skip(1).filter_map(ElementRef::wrap).collect();

    let mut current = Some(*element);
    while let Some(node) = current {
        for sibling in node.next_siblings() {
            result.extend(sibling.descendants().filter_map(ElementRef::wrap));
        }
        current = node.parent();
    }

    result
}
