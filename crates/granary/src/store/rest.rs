// ABOUTME: RestStore: Store implementation against a hosted Postgres-REST backend.
// ABOUTME: Insert, conflict-keyed upsert, and filtered selects over {endpoint}/rest/v1/{table}.

use std::env;

use async_trait::async_trait;
use url::Url;

use crate::error::PipelineError;
use crate::record::{PartnerProfile, PartnerRow, ScrapeRow, ScrapedRecord};
use crate::store::Store;

const SCRAPES_TABLE: &str = "scrapes";
const PARTNERS_TABLE: &str = "partner_profiles";

/// Environment variable naming the store endpoint.
pub const ENV_STORE_URL: &str = "GRANARY_STORE_URL";
/// Environment variable naming the store credential.
pub const ENV_STORE_KEY: &str = "GRANARY_STORE_KEY";

/// Store endpoint and credential, both required at startup.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub url: String,
    pub api_key: String,
}

impl StoreConfig {
    /// Read the configuration from the environment.
    ///
    /// A missing variable is a fatal startup error, not a per-request one;
    /// callers should exit rather than retry.
    pub fn from_env() -> Result<Self, PipelineError> {
        let url = env::var(ENV_STORE_URL).map_err(|_| {
            PipelineError::persistence(
                "Configure",
                Some(anyhow::anyhow!("{} is not set", ENV_STORE_URL)),
            )
        })?;
        let api_key = env::var(ENV_STORE_KEY).map_err(|_| {
            PipelineError::persistence(
                "Configure",
                Some(anyhow::anyhow!("{} is not set", ENV_STORE_KEY)),
            )
        })?;
        Ok(Self { url, api_key })
    }
}

/// Postgres-REST backed store.
///
/// The HTTP client is pooled and may be shared across concurrent requests;
/// upsert atomicity on the conflict key is the backend's guarantee.
#[derive(Debug, Clone)]
pub struct RestStore {
    client: reqwest::Client,
    base: Url,
    api_key: String,
}

impl RestStore {
    pub fn new(config: StoreConfig) -> Result<Self, PipelineError> {
        let base = Url::parse(&config.url).map_err(|e| {
            PipelineError::persistence(
                "Configure",
                Some(anyhow::anyhow!("invalid store URL: {}", e)),
            )
        })?;
        let client = reqwest::Client::builder()
            .user_agent(concat!("granary/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                PipelineError::persistence(
                    "Configure",
                    Some(anyhow::anyhow!("failed to build HTTP client: {}", e)),
                )
            })?;
        Ok(Self {
            client,
            base,
            api_key: config.api_key,
        })
    }

    fn table_url(&self, table: &str) -> Result<Url, PipelineError> {
        self.base
            .join(&format!("rest/v1/{}", table))
            .map_err(|e| {
                PipelineError::persistence(
                    "Request",
                    Some(anyhow::anyhow!("failed to build table URL: {}", e)),
                )
            })
    }

    fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }

    async fn read_rows<T: serde::de::DeserializeOwned>(
        op: &str,
        response: reqwest::Response,
    ) -> Result<Vec<T>, PipelineError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::persistence(
                op,
                Some(anyhow::anyhow!("store rejected request: {} {}", status, body)),
            ));
        }
        response.json::<Vec<T>>().await.map_err(|e| {
            PipelineError::persistence(
                op,
                Some(anyhow::anyhow!("malformed store response: {}", e)),
            )
        })
    }

    fn single<T>(op: &str, mut rows: Vec<T>) -> Result<T, PipelineError> {
        if rows.len() == 1 {
            Ok(rows.remove(0))
        } else {
            Err(PipelineError::persistence(
                op,
                Some(anyhow::anyhow!(
                    "expected exactly one returned row, got {}",
                    rows.len()
                )),
            ))
        }
    }
}

/// Column names are interpolated into the filter query string, so only plain
/// identifiers are accepted.
fn check_field(field: &str) -> Result<(), PipelineError> {
    let valid = !field.is_empty()
        && field
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(PipelineError::persistence(
            "SelectByField",
            Some(anyhow::anyhow!("invalid field name: {:?}", field)),
        ))
    }
}

#[async_trait]
impl Store for RestStore {
    async fn init(&self) -> Result<(), PipelineError> {
        let url = self.table_url(SCRAPES_TABLE)?;
        let response = self
            .authed(self.client.get(url))
            .query(&[("select", "id"), ("limit", "1")])
            .send()
            .await
            .map_err(|e| {
                PipelineError::persistence(
                    "Init",
                    Some(anyhow::anyhow!("store unreachable: {}", e)),
                )
            })?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::persistence(
                "Init",
                Some(anyhow::anyhow!("store not ready: {} {}", status, body)),
            ));
        }
        Ok(())
    }

    async fn insert(&self, record: &ScrapedRecord) -> Result<ScrapeRow, PipelineError> {
        let url = self.table_url(SCRAPES_TABLE)?;
        let response = self
            .authed(self.client.post(url))
            .header("Prefer", "return=representation")
            .json(record)
            .send()
            .await
            .map_err(|e| {
                PipelineError::persistence(
                    "Insert",
                    Some(anyhow::anyhow!("store unreachable: {}", e)),
                )
            })?;
        let rows = Self::read_rows::<ScrapeRow>("Insert", response).await?;
        Self::single("Insert", rows)
    }

    async fn upsert(&self, profile: &PartnerProfile) -> Result<PartnerRow, PipelineError> {
        let url = self.table_url(PARTNERS_TABLE)?;
        let response = self
            .authed(self.client.post(url))
            .query(&[("on_conflict", "external_key")])
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .json(profile)
            .send()
            .await
            .map_err(|e| {
                PipelineError::persistence(
                    "Upsert",
                    Some(anyhow::anyhow!("store unreachable: {}", e)),
                )
            })?;
        let rows = Self::read_rows::<PartnerRow>("Upsert", response).await?;
        Self::single("Upsert", rows)
    }

    async fn select_all(&self) -> Result<Vec<ScrapeRow>, PipelineError> {
        let url = self.table_url(SCRAPES_TABLE)?;
        let response = self
            .authed(self.client.get(url))
            .query(&[("select", "*"), ("order", "id.asc")])
            .send()
            .await
            .map_err(|e| {
                PipelineError::persistence(
                    "SelectAll",
                    Some(anyhow::anyhow!("store unreachable: {}", e)),
                )
            })?;
        Self::read_rows("SelectAll", response).await
    }

    async fn select_by_field(
        &self,
        field: &str,
        value: &str,
    ) -> Result<Vec<ScrapeRow>, PipelineError> {
        check_field(field)?;
        let url = self.table_url(SCRAPES_TABLE)?;
        let filter = format!("eq.{}", value);
        let response = self
            .authed(self.client.get(url))
            .query(&[
                ("select", "*"),
                ("order", "id.asc"),
                (field, filter.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                PipelineError::persistence(
                    "SelectByField",
                    Some(anyhow::anyhow!("store unreachable: {}", e)),
                )
            })?;
        Self::read_rows("SelectByField", response).await
    }
}
