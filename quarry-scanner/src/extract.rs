use crate::resolve::resolve;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

/// An outbound link discovered on a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRef {
    pub url: String,
    pub tag: String,
    pub attribute: String,
    pub text: String,
}

/// Resolve `reference` and keep only candidates that are real absolute URLs.
fn absolute_candidates(reference: &str, base: &str) -> Vec<String> {
    resolve(reference, base)
        .into_iter()
        .filter(|candidate| match Url::parse(candidate) {
            Ok(_) => true,
            Err(e) => {
                debug!("Dropping unresolvable reference {:?}: {}", candidate, e);
                false
            }
        })
        .collect()
}

/// Text held directly by the element, not by its descendants.
fn direct_text(element: &ElementRef) -> String {
    let text: String = element
        .children()
        .filter_map(|child| child.value().as_text())
        .map(|t| &**t)
        .collect();
    text.trim().to_string()
}

/// Resources and links of one page, from a single parse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRefs {
    pub resources: Vec<String>,
    pub links: Vec<LinkRef>,
}

/// Parse `markup` once and pull out both resource references and links.
pub fn extract_page(markup: &str, base_url: &str) -> PageRefs {
    let document = Html::parse_document(markup);
    PageRefs {
        resources: resources_in(&document, base_url),
        links: links_in(&document, base_url),
    }
}

/// Extract every `a[href]` in document order.
///
/// Each resolved candidate becomes its own entry, so an ambiguous relative
/// reference produces two links sharing the same text.
pub fn extract_links(markup: &str, base_url: &str) -> Vec<LinkRef> {
    links_in(&Html::parse_document(markup), base_url)
}

fn links_in(document: &Html, base_url: &str) -> Vec<LinkRef> {
    let selector = Selector::parse("a[href]").unwrap();

    let mut links = Vec::new();
    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let text = direct_text(&element);

        for url in absolute_candidates(href, base_url) {
            links.push(LinkRef {
                url,
                tag: "a".to_string(),
                attribute: "href".to_string(),
                text: text.clone(),
            });
        }
    }

    links
}

/// Extract `script[src]`, `link[href]` and `img[src]` references in
/// document order. Duplicates are kept.
pub fn extract_resources(markup: &str, base_url: &str) -> Vec<String> {
    resources_in(&Html::parse_document(markup), base_url)
}

fn resources_in(document: &Html, base_url: &str) -> Vec<String> {
    let selector = Selector::parse("script[src], link[href], img[src]").unwrap();

    let mut resources = Vec::new();
    for element in document.select(&selector) {
        let attribute = match element.value().name() {
            "link" => "href",
            _ => "src",
        };
        if let Some(reference) = element.value().attr(attribute) {
            resources.extend(absolute_candidates(reference, base_url));
        }
    }

    resources
}
