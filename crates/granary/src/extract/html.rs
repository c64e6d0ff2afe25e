// ABOUTME: HTML extraction: reads title, named meta tags, headings, paragraphs, links, and images.
// ABOUTME: Pure DOM reads over a fetched PageDocument; attribute URLs resolve against the final URL.

use scraper::{Html, Selector};
use url::Url;

use crate::capability::PageDocument;
use crate::record::{MetaFields, RawExtraction, RawImage, RawLink};

/// Read the raw payload out of a fetched page.
///
/// All text content is trimmed. Meta fields default to `None` independently
/// when the tag or attribute is absent or empty. Anchors without an href
/// attribute are not links and are skipped, as are images without a src
/// attribute; an empty attribute survives as an empty string per the
/// non-null contract.
pub fn extract_page(doc: &PageDocument) -> RawExtraction {
    let dom = Html::parse_document(&doc.html);
    let base = Url::parse(&doc.final_url).ok();

    let title = select_first_text(&dom, "title").unwrap_or_default();

    let meta = MetaFields {
        description: meta_content(&dom, "description"),
        keywords: meta_content(&dom, "keywords"),
        author: meta_content(&dom, "author"),
    };

    // "h1, h2, h3" matches in tree traversal order, which is document order.
    let headings = select_all_text(&dom, "h1, h2, h3");
    let paragraphs = select_all_text(&dom, "p");

    let mut links = Vec::new();
    if let Ok(sel) = Selector::parse("a") {
        for elem in dom.select(&sel) {
            let Some(href) = elem.value().attr("href") else {
                continue;
            };
            let text = elem.text().collect::<String>().trim().to_string();
            links.push(RawLink {
                href: Some(resolve_url(base.as_ref(), href)),
                text: Some(text),
            });
        }
    }

    let mut images = Vec::new();
    if let Ok(sel) = Selector::parse("img") {
        for elem in dom.select(&sel) {
            let Some(src) = elem.value().attr("src") else {
                continue;
            };
            let alt = elem
                .value()
                .attr("alt")
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(str::to_string);
            images.push(RawImage {
                src: Some(resolve_url(base.as_ref(), src)),
                alt,
            });
        }
    }

    RawExtraction {
        title,
        meta,
        headings,
        paragraphs,
        links,
        images,
    }
}

/// Resolve a raw attribute value against the page base URL.
///
/// An empty attribute stays an empty string; unresolvable values pass
/// through untouched.
fn resolve_url(base: Option<&Url>, raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    match base {
        Some(base) => base
            .join(trimmed)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| trimmed.to_string()),
        None => trimmed.to_string(),
    }
}

fn select_first_text(dom: &Html, selector: &str) -> Option<String> {
    let sel = Selector::parse(selector).ok()?;
    dom.select(&sel)
        .next()
        .map(|e| e.text().collect::<String>().trim().to_string())
}

fn select_all_text(dom: &Html, selector: &str) -> Vec<String> {
    let Ok(sel) = Selector::parse(selector) else {
        return Vec::new();
    };
    dom.select(&sel)
        .map(|e| e.text().collect::<String>().trim().to_string())
        .collect()
}

fn meta_content(dom: &Html, name: &str) -> Option<String> {
    let sel = Selector::parse(&format!("meta[name='{}']", name)).ok()?;
    let elem = dom.select(&sel).next()?;
    let content = elem.value().attr("content")?.trim();
    if content.is_empty() {
        None
    } else {
        Some(content.to_string())
    }
}
