// ABOUTME: Integration tests for the full extract-normalize-route-store pipeline.
// ABOUTME: Uses a fixture-backed capability and the in-memory store to cover both persistence paths.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use pretty_assertions::assert_eq;

use granary::{
    DocumentCapability, MemoryStore, MetaFields, PageDocument, Pipeline, PipelineError,
    ScrapeOutcome, ScrapeRequest, ScrapeSource, SourceKind, Store,
};

/// Capability serving a fixed markup fixture for every navigation.
struct FixtureCapability {
    html: String,
}

impl FixtureCapability {
    fn new(html: &str) -> Self {
        Self {
            html: html.to_string(),
        }
    }
}

#[async_trait]
impl DocumentCapability for FixtureCapability {
    async fn navigate(&self, url: &str) -> Result<PageDocument, PipelineError> {
        Ok(PageDocument {
            url: url.to_string(),
            final_url: url.to_string(),
            html: self.html.clone(),
        })
    }
}

/// Capability whose every navigation fails.
struct UnreachableCapability;

#[async_trait]
impl DocumentCapability for UnreachableCapability {
    async fn navigate(&self, _url: &str) -> Result<PageDocument, PipelineError> {
        Err(PipelineError::extraction(
            "Navigate",
            Some(anyhow::anyhow!("connection refused")),
        ))
    }
}

/// Capability that hangs longer than any test timeout.
struct HangingCapability;

#[async_trait]
impl DocumentCapability for HangingCapability {
    async fn navigate(&self, url: &str) -> Result<PageDocument, PipelineError> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(PageDocument {
            url: url.to_string(),
            final_url: url.to_string(),
            html: String::new(),
        })
    }
}

/// Build a minimal PDF with one page per entry in `pages_text`.
fn build_pdf(pages_text: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages_text {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![100.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

fn partner_request(url: &str, key: &str, display_name: &str) -> ScrapeRequest {
    ScrapeRequest {
        source: ScrapeSource::Website {
            url: url.to_string(),
        },
        owner_id: "u1".to_string(),
        partner_key: Some(key.to_string()),
        display_name: Some(display_name.to_string()),
        logo_url: None,
    }
}

#[tokio::test]
async fn website_scrape_stores_canonical_record() {
    let capability = FixtureCapability::new(
        "<html><head><title>Example</title></head><body><h1>Welcome</h1></body></html>",
    );
    let store = Arc::new(MemoryStore::new());
    let pipeline = Pipeline::new(capability, store.clone());

    let outcome = pipeline
        .scrape(ScrapeRequest::website("https://example.com", "u1"))
        .await
        .unwrap();

    let ScrapeOutcome::ScrapedRecord(row) = outcome else {
        panic!("expected a scrape record");
    };
    assert_eq!(row.record.title, "Example");
    assert_eq!(row.record.meta, MetaFields::default());
    assert_eq!(row.record.headings, vec!["Welcome"]);
    assert_eq!(row.record.paragraphs, Vec::<String>::new());
    assert!(row.record.links.is_empty());
    assert!(row.record.images.is_empty());
    assert_eq!(row.record.owner_id, "u1");
    assert_eq!(row.record.source_kind, SourceKind::Website);

    let stored = store.select_all().await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, row.id);
}

#[tokio::test]
async fn repeated_scrapes_append_distinct_rows() {
    let capability = FixtureCapability::new("<html><head><title>Same</title></head></html>");
    let store = Arc::new(MemoryStore::new());
    let pipeline = Pipeline::new(capability, store.clone());

    let first = pipeline
        .scrape(ScrapeRequest::website("https://example.com", "u1"))
        .await
        .unwrap();
    let second = pipeline
        .scrape(ScrapeRequest::website("https://example.com", "u1"))
        .await
        .unwrap();

    assert_ne!(first.id(), second.id());
    assert_eq!(store.select_all().await.unwrap().len(), 2);
}

#[tokio::test]
async fn partner_resubmission_upserts_last_write_wins() {
    let capability = FixtureCapability::new(
        "<html><head><title>X</title></head><body><p>about us</p></body></html>",
    );
    let store = Arc::new(MemoryStore::new());
    let pipeline = Pipeline::new(capability, store.clone());

    let first = pipeline
        .scrape(partner_request("https://x.test", "biz42", "Biz"))
        .await
        .unwrap();
    let second = pipeline
        .scrape(partner_request("https://x.test", "biz42", "Biz Updated"))
        .await
        .unwrap();

    // The scrape table is unaffected by the partner path.
    assert!(store.select_all().await.unwrap().is_empty());

    assert_eq!(first.id(), second.id());
    let partners = store.partner_rows();
    assert_eq!(partners.len(), 1);
    assert_eq!(partners[0].profile.external_key, "biz42");
    assert_eq!(
        partners[0].profile.display_name.as_deref(),
        Some("Biz Updated")
    );
    assert_eq!(partners[0].profile.scraped_text, "about us");
    assert_eq!(partners[0].profile.owner_id, "u1");
}

#[tokio::test]
async fn pdf_scrape_skips_blank_pages_and_joins_text() {
    let store = Arc::new(MemoryStore::new());
    let pipeline = Pipeline::new(UnreachableCapability, store.clone());

    let bytes = build_pdf(&["A", " ", "B"]);
    let outcome = pipeline
        .scrape(ScrapeRequest::pdf(
            bytes,
            "u1",
            Some("report.pdf".to_string()),
        ))
        .await
        .unwrap();

    let ScrapeOutcome::ScrapedRecord(row) = outcome else {
        panic!("expected a scrape record");
    };
    assert_eq!(row.record.title, "report.pdf");
    assert_eq!(row.record.paragraphs, vec!["A\nB"]);
    assert!(row.record.headings.is_empty());
    assert!(row.record.links.is_empty());
    assert!(row.record.images.is_empty());
    assert_eq!(row.record.source_kind, SourceKind::Pdf);
}

#[tokio::test]
async fn pdf_filename_traversal_is_neutralized() {
    let store = Arc::new(MemoryStore::new());
    let pipeline = Pipeline::new(UnreachableCapability, store.clone());

    let bytes = build_pdf(&["content"]);
    let outcome = pipeline
        .scrape(ScrapeRequest::pdf(
            bytes,
            "u1",
            Some("../../etc/passwd".to_string()),
        ))
        .await
        .unwrap();

    let ScrapeOutcome::ScrapedRecord(row) = outcome else {
        panic!("expected a scrape record");
    };
    assert_eq!(row.record.title, "passwd");
}

#[tokio::test]
async fn pdf_without_filename_gets_default_title() {
    let store = Arc::new(MemoryStore::new());
    let pipeline = Pipeline::new(UnreachableCapability, store.clone());

    let bytes = build_pdf(&["content"]);
    let outcome = pipeline
        .scrape(ScrapeRequest::pdf(bytes, "u1", None))
        .await
        .unwrap();

    let ScrapeOutcome::ScrapedRecord(row) = outcome else {
        panic!("expected a scrape record");
    };
    assert_eq!(row.record.title, "document.pdf");
}

#[tokio::test]
async fn unreachable_source_persists_nothing() {
    let store = Arc::new(MemoryStore::new());
    let pipeline = Pipeline::new(UnreachableCapability, store.clone());

    let err = pipeline
        .scrape(ScrapeRequest::website("https://down.test", "u1"))
        .await
        .expect_err("should fail");

    assert!(err.is_extraction());
    assert!(store.select_all().await.unwrap().is_empty());
    assert!(store.partner_rows().is_empty());
}

#[tokio::test]
async fn hung_navigation_is_bounded_by_timeout() {
    let store = Arc::new(MemoryStore::new());
    let pipeline = Pipeline::new(HangingCapability, store.clone())
        .with_navigation_timeout(Duration::from_millis(20));

    let err = pipeline
        .scrape(ScrapeRequest::website("https://slow.test", "u1"))
        .await
        .expect_err("should time out");

    assert!(err.is_extraction());
    assert!(err.to_string().contains("timed out"));
    assert!(store.select_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn list_scrapes_for_owner_filters() {
    let capability = FixtureCapability::new("<html><head><title>T</title></head></html>");
    let store = Arc::new(MemoryStore::new());
    let pipeline = Pipeline::new(capability, store.clone());

    pipeline
        .scrape(ScrapeRequest::website("https://example.com", "u1"))
        .await
        .unwrap();
    pipeline
        .scrape(ScrapeRequest::website("https://example.com", "u2"))
        .await
        .unwrap();

    let all = pipeline.list_scrapes().await.unwrap();
    assert_eq!(all.len(), 2);

    let mine = pipeline.list_scrapes_for_owner("u2").await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].record.owner_id, "u2");
}

#[tokio::test]
async fn concurrent_requests_stay_independent() {
    let capability = Arc::new(FixtureCapability::new(
        "<html><head><title>T</title></head></html>",
    ));
    let store = Arc::new(MemoryStore::new());

    let mut handles = Vec::new();
    for i in 0..8 {
        let capability = capability.clone();
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            let pipeline = Pipeline::new(capability, store);
            pipeline
                .scrape(ScrapeRequest::website(
                    "https://example.com",
                    format!("u{}", i),
                ))
                .await
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap().unwrap().id());
    }
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 8);
}
