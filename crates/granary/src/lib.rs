// ABOUTME: Main library entry point for the granary extraction pipeline.
// ABOUTME: Re-exports the public API: Pipeline, records, capability and store seams, PipelineError.

//! Granary - an extraction-normalization-persistence pipeline.
//!
//! Takes a heterogeneous raw source (a rendered HTML page or a PDF byte
//! stream), extracts structured content, validates it into one canonical
//! record shape, and routes it to one of two persistence behaviors: an
//! append-only scrape record or a partner profile upserted on its external
//! key.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use granary::{HttpCapability, MemoryStore, Pipeline, ScrapeRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), granary::PipelineError> {
//!     let capability = HttpCapability::new(Duration::from_secs(30), false)?;
//!     let pipeline = Pipeline::new(capability, MemoryStore::new());
//!     let outcome = pipeline
//!         .scrape(ScrapeRequest::website("https://example.com", "u1"))
//!         .await?;
//!     println!("stored id {}", outcome.id());
//!     Ok(())
//! }
//! ```

pub mod capability;
pub mod error;
pub mod extract;
pub mod normalize;
pub mod pipeline;
pub mod record;
pub mod route;
pub mod store;

pub use crate::capability::{DocumentCapability, HttpCapability, PageDocument};
pub use crate::error::{FailureKind, PipelineError};
pub use crate::extract::{extract_page, extract_pdf_text, sanitize_filename, Extraction};
pub use crate::normalize::normalize;
pub use crate::pipeline::{
    Pipeline, ScrapeOutcome, ScrapeRequest, ScrapeSource, DEFAULT_NAVIGATION_TIMEOUT,
};
pub use crate::record::{
    Image, Link, MetaFields, PartnerProfile, PartnerRow, RawExtraction, RawImage, RawLink,
    ScrapeRow, ScrapedRecord, SourceKind,
};
pub use crate::route::{route, Routed};
pub use crate::store::{MemoryStore, RestStore, Store, StoreConfig};
