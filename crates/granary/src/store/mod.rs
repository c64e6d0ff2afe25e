// ABOUTME: Store adapter seam: the abstract keyed datastore the pipeline persists into.
// ABOUTME: rest.rs talks to a hosted Postgres-REST backend; memory.rs is the in-tree fake.

pub mod memory;
pub mod rest;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::PipelineError;
use crate::record::{PartnerProfile, PartnerRow, ScrapeRow, ScrapedRecord};

pub use memory::MemoryStore;
pub use rest::{RestStore, StoreConfig};

/// Abstract keyed datastore consumed by the pipeline.
///
/// `insert` is append-only: every call produces a new row with a fresh
/// system-assigned identifier. `upsert` is keyed on the profile's
/// `external_key` and must be atomic with respect to that key: no two
/// concurrent upserts on the same key may both insert, and the last
/// committed write wins. The connection may be shared across concurrent
/// requests.
#[async_trait]
pub trait Store: Send + Sync {
    /// Idempotent readiness check, run once at process start.
    async fn init(&self) -> Result<(), PipelineError>;

    /// Append a new scrape record, returning the stored row.
    async fn insert(&self, record: &ScrapedRecord) -> Result<ScrapeRow, PipelineError>;

    /// Insert or replace the partner profile stored under its external key.
    async fn upsert(&self, profile: &PartnerProfile) -> Result<PartnerRow, PipelineError>;

    /// All stored scrape rows.
    async fn select_all(&self) -> Result<Vec<ScrapeRow>, PipelineError>;

    /// Scrape rows whose `field` equals `value`.
    async fn select_by_field(&self, field: &str, value: &str)
        -> Result<Vec<ScrapeRow>, PipelineError>;
}

// A shared handle to a store is itself a store, so one connection pool can
// serve concurrent requests.
#[async_trait]
impl<S: Store + ?Sized> Store for Arc<S> {
    async fn init(&self) -> Result<(), PipelineError> {
        (**self).init().await
    }

    async fn insert(&self, record: &ScrapedRecord) -> Result<ScrapeRow, PipelineError> {
        (**self).insert(record).await
    }

    async fn upsert(&self, profile: &PartnerProfile) -> Result<PartnerRow, PipelineError> {
        (**self).upsert(profile).await
    }

    async fn select_all(&self) -> Result<Vec<ScrapeRow>, PipelineError> {
        (**self).select_all().await
    }

    async fn select_by_field(
        &self,
        field: &str,
        value: &str,
    ) -> Result<Vec<ScrapeRow>, PipelineError> {
        (**self).select_by_field(field, value).await
    }
}
