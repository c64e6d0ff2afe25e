// ABOUTME: Data shapes for the granary pipeline: raw extraction payloads and canonical persisted records.
// ABOUTME: RawExtraction is ephemeral per request; ScrapedRecord and PartnerProfile are the two persisted shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceKind {
    Website,
    Pdf,
}

/// The three named meta-tag fields read from a page head.
///
/// Each field is independently nullable: an absent tag or attribute yields
/// `None`, never an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetaFields {
    pub description: Option<String>,
    pub keywords: Option<String>,
    pub author: Option<String>,
}

/// A link as pulled straight off the page, before validation.
///
/// `href` stays optional at this stage so the validator can enforce the
/// non-null contract; the extractor skips anchors with no href attribute,
/// so a `None` here indicates an extractor bug.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawLink {
    pub href: Option<String>,
    pub text: Option<String>,
}

/// An image as pulled straight off the page, before validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawImage {
    pub src: Option<String>,
    pub alt: Option<String>,
}

/// Unvalidated payload pulled directly from a rendered page.
///
/// Owned solely by the extraction call that produced it; the normalizer
/// consumes it to build a [`ScrapedRecord`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawExtraction {
    pub title: String,
    pub meta: MetaFields,
    pub headings: Vec<String>,
    pub paragraphs: Vec<String>,
    pub links: Vec<RawLink>,
    pub images: Vec<RawImage>,
}

/// A validated link: `href` is always present, `text` stays nullable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
    pub text: Option<String>,
}

/// A validated image reference: `src` is always present, `alt` stays nullable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub src: String,
    pub alt: Option<String>,
}

/// Canonical append-only persisted extraction result.
///
/// Sequence fields are never null; absent document content is an empty
/// sequence. For PDF sources `headings`/`links`/`images` are empty,
/// `paragraphs` holds the full extracted text as its single element, and
/// `title` holds the sanitized filename.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapedRecord {
    pub title: String,
    pub meta: MetaFields,
    pub headings: Vec<String>,
    pub paragraphs: Vec<String>,
    pub links: Vec<Link>,
    pub images: Vec<Image>,
    pub owner_id: String,
    pub source_kind: SourceKind,
}

/// Canonical upsert-keyed partner/chatbot profile derived from extraction.
///
/// `external_key` is the upsert conflict target: re-submission under the
/// same key replaces every other field, never creates a duplicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartnerProfile {
    pub external_key: String,
    pub display_name: Option<String>,
    pub logo_url: Option<String>,
    pub scraped_text: String,
    pub owner_id: String,
}

/// A stored scrape row: the record echo plus the system-assigned identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapeRow {
    pub id: i64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub record: ScrapedRecord,
}

/// A stored partner profile row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartnerRow {
    pub id: i64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub profile: PartnerProfile,
}
