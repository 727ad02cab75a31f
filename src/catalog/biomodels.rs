//! BioModels REST catalog client.
//!
//! See: <https://www.ebi.ac.uk/biomodels/docs/>

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use super::CatalogGateway;
use crate::types::ModelRecord;
use crate::{CacheError, Result};

/// Default base URL of the BioModels service.
pub const DEFAULT_BASE_URL: &str = "https://www.ebi.ac.uk/biomodels";

const JSON: &str = "application/json";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for the BioModels catalog.
#[derive(Clone)]
pub struct BioModelsCatalog {
    http: Client,
    base_url: String,
}

impl BioModelsCatalog {
    /// Client for the public BioModels service.
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Client with a custom base URL (for testing with wiremock).
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        Self::with_options(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_options(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                CacheError::InvalidConfiguration(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get(&self, url: &str, id: Option<&str>, accept: &str) -> Result<reqwest::Response> {
        debug!(url, "requesting catalog");
        let response = self
            .http
            .get(url)
            .header("Accept", accept)
            .send()
            .await
            .map_err(|e| CacheError::remote(e.to_string()))?;

        Self::handle_response_errors(&response, id)?;
        Ok(response)
    }

    fn handle_response_errors(response: &reqwest::Response, id: Option<&str>) -> Result<()> {
        let status = response.status();

        if status.is_success() {
            return Ok(());
        }

        match (status.as_u16(), id) {
            (404, Some(id)) => Err(CacheError::NotFound(id.to_string())),
            (code, _) => Err(CacheError::RemoteUnavailable {
                message: format!("BioModels API error: {status}"),
                status: Some(code),
            }),
        }
    }

    // A body that does not decode is a permanent failure of this request.
    fn decode_error(e: reqwest::Error) -> CacheError {
        CacheError::RemoteUnavailable {
            message: format!("invalid catalog response: {e}"),
            status: e.status().map(|s| s.as_u16()).or(Some(200)),
        }
    }
}

#[async_trait]
impl CatalogGateway for BioModelsCatalog {
    fn name(&self) -> &str {
        "biomodels"
    }

    async fn fetch_one(&self, id: &str) -> Result<ModelRecord> {
        let url = format!("{}/models/{}", self.base_url, id);
        let response = self.get(&url, Some(id), JSON).await?;

        let mut record: ModelRecord = response.json().await.map_err(Self::decode_error)?;
        // The request identifier is the cache key, whatever the payload says.
        record.id = id.to_string();
        Ok(record)
    }

    async fn fetch_all(&self) -> Result<Vec<ModelRecord>> {
        let url = format!("{}/models", self.base_url);
        let response = self.get(&url, None, JSON).await?;

        let listing: ModelListing = response.json().await.map_err(Self::decode_error)?;
        let records = listing.into_records();
        let total = records.len();
        let records: Vec<ModelRecord> = records.into_iter().filter(|r| !r.id.is_empty()).collect();
        if records.len() < total {
            warn!(
                skipped = total - records.len(),
                "catalog listing contained records without an id"
            );
        }
        Ok(records)
    }

    async fn download(&self, id: &str) -> Result<Vec<u8>> {
        let url = format!("{}/models/{}/download", self.base_url, id);
        let response = self.get(&url, Some(id), "*/*").await?;

        let body = response
            .bytes()
            .await
            .map_err(|e| CacheError::remote(format!("download of {id} interrupted: {e}")))?;
        debug!(id, bytes = body.len(), "downloaded model file");
        Ok(body.to_vec())
    }
}

/// `/models` payload: either `{ "models": [...] }` or a bare array.
#[derive(Deserialize)]
#[serde(untagged)]
enum ModelListing {
    Wrapped { models: Vec<ModelRecord> },
    Bare(Vec<ModelRecord>),
}

impl ModelListing {
    fn into_records(self) -> Vec<ModelRecord> {
        match self {
            ModelListing::Wrapped { models } => models,
            ModelListing::Bare(models) => models,
        }
    }
}
