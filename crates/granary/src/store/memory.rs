// ABOUTME: In-memory Store implementation with mutexed tables and monotonic ids.
// ABOUTME: Backs tests and the CLI dry-run mode; upsert replaces by external key under one lock.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::error::PipelineError;
use crate::record::{PartnerProfile, PartnerRow, ScrapeRow, ScrapedRecord};
use crate::store::Store;

#[derive(Debug, Default)]
struct Tables {
    next_id: i64,
    scrapes: Vec<ScrapeRow>,
    partners: Vec<PartnerRow>,
}

impl Tables {
    fn assign_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-memory store. The mutex makes upsert atomic on the external key.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All stored partner rows, for inspection in tests and dry runs.
    pub fn partner_rows(&self) -> Vec<PartnerRow> {
        self.tables.lock().expect("store lock").partners.clone()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn init(&self) -> Result<(), PipelineError> {
        Ok(())
    }

    async fn insert(&self, record: &ScrapedRecord) -> Result<ScrapeRow, PipelineError> {
        let mut tables = self.tables.lock().expect("store lock");
        let row = ScrapeRow {
            id: tables.assign_id(),
            created_at: Some(Utc::now()),
            record: record.clone(),
        };
        tables.scrapes.push(row.clone());
        Ok(row)
    }

    async fn upsert(&self, profile: &PartnerProfile) -> Result<PartnerRow, PipelineError> {
        let mut tables = self.tables.lock().expect("store lock");
        if let Some(existing) = tables
            .partners
            .iter_mut()
            .find(|row| row.profile.external_key == profile.external_key)
        {
            existing.profile = profile.clone();
            return Ok(existing.clone());
        }
        let row = PartnerRow {
            id: tables.assign_id(),
            created_at: Some(Utc::now()),
            profile: profile.clone(),
        };
        tables.partners.push(row.clone());
        Ok(row)
    }

    async fn select_all(&self) -> Result<Vec<ScrapeRow>, PipelineError> {
        Ok(self.tables.lock().expect("store lock").scrapes.clone())
    }

    async fn select_by_field(
        &self,
        field: &str,
        value: &str,
    ) -> Result<Vec<ScrapeRow>, PipelineError> {
        let tables = self.tables.lock().expect("store lock");
        let mut matches = Vec::new();
        for row in &tables.scrapes {
            let as_value = serde_json::to_value(&row.record).map_err(|e| {
                PipelineError::persistence(
                    "SelectByField",
                    Some(anyhow::anyhow!("failed to project record: {}", e)),
                )
            })?;
            let hit = match as_value.get(field) {
                Some(serde_json::Value::String(s)) => s == value,
                Some(other) => other.to_string() == value,
                None => false,
            };
            if hit {
                matches.push(row.clone());
            }
        }
        Ok(matches)
    }
}
