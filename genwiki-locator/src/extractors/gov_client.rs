//! GOV gazetteer client
//!
//! Fetches place records from the GOV web service with a read-through file
//! cache: one `<gov_id>.json` per object in the cache directory, written
//! after every successful fetch.
//!
//! Endpoint: https://gov.genealogy.net/api/getObject?itemId=<id>

use crate::geo::Coordinate;
use crate::types::{ExternalReference, GazetteerError, GazetteerObject, GazetteerSource, NameRecord};
use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, warn};

/// Raw GOV object; only the fields the engine consumes
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawGovObject {
    id: String,
    #[serde(default)]
    position: Option<RawPosition>,
    #[serde(default)]
    external_reference: Vec<RawValue>,
    #[serde(default)]
    name: Vec<RawName>,
}

#[derive(Debug, Deserialize)]
struct RawPosition {
    lat: Option<f64>,
    lon: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawValue {
    value: String,
}

#[derive(Debug, Deserialize)]
struct RawName {
    lang: String,
    value: String,
}

impl From<RawGovObject> for GazetteerObject {
    fn from(raw: RawGovObject) -> Self {
        GazetteerObject {
            id: raw.id,
            position: raw
                .position
                .and_then(|p| Coordinate::from_parts(p.lat, p.lon)),
            external_references: raw
                .external_reference
                .into_iter()
                .map(|r| ExternalReference::parse(r.value))
                .collect(),
            names: raw
                .name
                .into_iter()
                .map(|n| NameRecord {
                    language: n.lang,
                    value: n.value,
                })
                .collect(),
        }
    }
}

/// Decode a GOV `getObject` response body
pub fn decode_object(body: &str) -> Result<GazetteerObject, GazetteerError> {
    let raw: RawGovObject = serde_json::from_str(body)
        .map_err(|e| GazetteerError::Decode(format!("Invalid GOV object: {}", e)))?;
    Ok(raw.into())
}

/// GOV web service client
pub struct GovClient {
    http_client: Client,
    endpoint: String,
    cache_dir: Option<PathBuf>,
}

impl GovClient {
    pub fn new(
        endpoint: &str,
        user_agent: &str,
        timeout: Duration,
        cache_dir: Option<PathBuf>,
    ) -> Result<Self, GazetteerError> {
        let mut headers = header::HeaderMap::new();
        let user_agent = header::HeaderValue::from_str(user_agent)
            .map_err(|e| GazetteerError::Transport(format!("Invalid User-Agent: {}", e)))?;
        headers.insert(header::USER_AGENT, user_agent);

        let http_client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| GazetteerError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            endpoint: endpoint.to_string(),
            cache_dir,
        })
    }

    /// Cache file for an id; path separators are replaced
    fn cache_path(&self, gov_id: &str) -> Option<PathBuf> {
        let file_name = format!("{}.json", gov_id.replace(['/', '\\'], "_"));
        self.cache_dir.as_ref().map(|dir| dir.join(file_name))
    }

    async fn read_cache(&self, gov_id: &str) -> Option<GazetteerObject> {
        let path = self.cache_path(gov_id)?;
        let body = tokio::fs::read_to_string(&path).await.ok()?;
        match decode_object(&body) {
            Ok(object) => {
                debug!(gov_id = %gov_id, "GOV object served from cache");
                Some(object)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring unreadable cache entry");
                None
            }
        }
    }

    async fn write_cache(&self, gov_id: &str, body: &str) -> Result<(), GazetteerError> {
        let Some(path) = self.cache_path(gov_id) else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, body).await?;
        Ok(())
    }

    async fn fetch(&self, gov_id: &str) -> Result<String, GazetteerError> {
        debug!(gov_id = %gov_id, "Fetching GOV object");

        let response = self
            .http_client
            .get(&self.endpoint)
            .query(&[("itemId", gov_id)])
            .send()
            .await
            .map_err(|e| GazetteerError::Transport(format!("GOV request failed: {}", e)))?;

        match response.status() {
            status if status.is_success() => response
                .text()
                .await
                .map_err(|e| GazetteerError::Transport(format!("Failed to read GOV response: {}", e))),
            StatusCode::NOT_FOUND | StatusCode::NOT_IMPLEMENTED => {
                Err(GazetteerError::NotFound(gov_id.to_string()))
            }
            status => Err(GazetteerError::Transport(format!(
                "GOV service returned {}",
                status
            ))),
        }
    }
}

#[async_trait]
impl GazetteerSource for GovClient {
    async fn get_object(&self, gov_id: &str) -> Result<GazetteerObject, GazetteerError> {
        if let Some(object) = self.read_cache(gov_id).await {
            return Ok(object);
        }

        let body = self.fetch(gov_id).await?;
        let object = decode_object(&body)?;
        self.write_cache(gov_id, &body).await?;
        Ok(object)
    }
}
