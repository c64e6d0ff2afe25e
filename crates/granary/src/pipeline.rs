// ABOUTME: Pipeline orchestration: extract -> normalize -> route -> store for one request.
// ABOUTME: Capability and store are constructor-injected; navigation is bounded by a timeout.

use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use crate::capability::DocumentCapability;
use crate::error::PipelineError;
use crate::extract::{extract_page, extract_pdf_text, sanitize_filename, Extraction};
use crate::normalize::normalize;
use crate::record::{PartnerRow, ScrapeRow};
use crate::route::{route, Routed};
use crate::store::Store;

/// Default bound on one navigation, acquisition included.
pub const DEFAULT_NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);

/// The source document of one scrape request.
#[derive(Debug, Clone, PartialEq)]
pub enum ScrapeSource {
    Website { url: String },
    Pdf { bytes: Vec<u8>, filename: Option<String> },
}

/// One logical scrape request, transport-agnostic.
///
/// A non-empty `partner_key` marks partner intent and switches persistence
/// from append-only insert to upsert on that key.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapeRequest {
    pub source: ScrapeSource,
    pub owner_id: String,
    pub partner_key: Option<String>,
    pub display_name: Option<String>,
    pub logo_url: Option<String>,
}

impl ScrapeRequest {
    /// A plain website scrape with no partner intent.
    pub fn website(url: impl Into<String>, owner_id: impl Into<String>) -> Self {
        Self {
            source: ScrapeSource::Website { url: url.into() },
            owner_id: owner_id.into(),
            partner_key: None,
            display_name: None,
            logo_url: None,
        }
    }

    /// A PDF scrape from raw bytes.
    pub fn pdf(
        bytes: Vec<u8>,
        owner_id: impl Into<String>,
        filename: Option<String>,
    ) -> Self {
        Self {
            source: ScrapeSource::Pdf { bytes, filename },
            owner_id: owner_id.into(),
            partner_key: None,
            display_name: None,
            logo_url: None,
        }
    }
}

/// Echo of the stored payload plus its assigned identifier.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "target", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScrapeOutcome {
    ScrapedRecord(ScrapeRow),
    PartnerProfile(PartnerRow),
}

impl ScrapeOutcome {
    /// The system-assigned identifier of the stored row.
    pub fn id(&self) -> i64 {
        match self {
            ScrapeOutcome::ScrapedRecord(row) => row.id,
            ScrapeOutcome::PartnerProfile(row) => row.id,
        }
    }
}

/// The extraction-normalization-persistence pipeline.
///
/// One request runs end-to-end on one task, strictly sequential across
/// stages; concurrent requests share nothing but the store. Either the
/// record fully normalizes and persists or nothing is persisted.
pub struct Pipeline<C, S> {
    capability: C,
    store: S,
    navigation_timeout: Duration,
}

impl<C: DocumentCapability, S: Store> Pipeline<C, S> {
    pub fn new(capability: C, store: S) -> Self {
        Self {
            capability,
            store,
            navigation_timeout: DEFAULT_NAVIGATION_TIMEOUT,
        }
    }

    /// Bound the time one navigation may take before it is aborted and the
    /// session released.
    pub fn with_navigation_timeout(mut self, timeout: Duration) -> Self {
        self.navigation_timeout = timeout;
        self
    }

    /// Run one request through extract, normalize, route, and persist.
    pub async fn scrape(&self, req: ScrapeRequest) -> Result<ScrapeOutcome, PipelineError> {
        let extraction = match &req.source {
            ScrapeSource::Website { url } => {
                let document =
                    tokio::time::timeout(self.navigation_timeout, self.capability.navigate(url))
                        .await
                        .map_err(|_| {
                            PipelineError::extraction(
                                "Navigate",
                                Some(anyhow::anyhow!(
                                    "navigation timed out after {:?}",
                                    self.navigation_timeout
                                )),
                            )
                        })??;
                // The fetched document is dropped at the end of this arm,
                // releasing the session before any persistence happens.
                Extraction::Page(extract_page(&document))
            }
            ScrapeSource::Pdf { bytes, filename } => {
                let name = sanitize_filename(filename.as_deref().unwrap_or(""));
                let text = extract_pdf_text(bytes)?;
                Extraction::PdfText {
                    filename: name,
                    text,
                }
            }
        };

        let record = normalize(extraction, &req.owner_id)?;

        match route(record, &req) {
            Routed::Scrape(record) => {
                let row = self.store.insert(&record).await.inspect_err(|e| {
                    warn!(owner = %req.owner_id, error = %e, "scrape insert failed");
                })?;
                info!(id = row.id, owner = %req.owner_id, "stored scrape record");
                Ok(ScrapeOutcome::ScrapedRecord(row))
            }
            Routed::Partner(profile) => {
                let row = self.store.upsert(&profile).await.inspect_err(|e| {
                    warn!(key = %profile.external_key, error = %e, "partner upsert failed");
                })?;
                info!(id = row.id, key = %row.profile.external_key, "stored partner profile");
                Ok(ScrapeOutcome::PartnerProfile(row))
            }
        }
    }

    /// All stored scrape records.
    pub async fn list_scrapes(&self) -> Result<Vec<ScrapeRow>, PipelineError> {
        self.store.select_all().await
    }

    /// Stored scrape records for one owner.
    pub async fn list_scrapes_for_owner(
        &self,
        owner_id: &str,
    ) -> Result<Vec<ScrapeRow>, PipelineError> {
        self.store.select_by_field("owner_id", owner_id).await
    }
}
