//! Wikidata entity search
//!
//! Label search through the MediaWiki action API (`wbsearchentities`).

use crate::types::{EntitySearch, SearchError, SearchHit};
use async_trait::async_trait;
use reqwest::{header, Client};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Upper bound accepted by `wbsearchentities`
const MAX_LIMIT: usize = 50;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    search: Vec<RawHit>,
    /// API errors are reported in the body with status 200
    #[serde(default)]
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: String,
    #[serde(default)]
    info: String,
}

#[derive(Debug, Deserialize)]
struct RawHit {
    id: String,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

/// Decode a `wbsearchentities` response, keeping the service's ranking
pub fn decode_hits(body: &str) -> Result<Vec<SearchHit>, SearchError> {
    let response: SearchResponse = serde_json::from_str(body)
        .map_err(|e| SearchError::Decode(format!("Invalid search response: {}", e)))?;
    if let Some(error) = response.error {
        return Err(SearchError::Rejected {
            status: 200,
            message: format!("{}: {}", error.code, error.info),
        });
    }
    Ok(response
        .search
        .into_iter()
        .map(|hit| SearchHit {
            id: hit.id,
            label: hit.label.unwrap_or_default(),
            description: hit.description.unwrap_or_default(),
        })
        .collect())
}

pub struct WikidataSearchClient {
    http_client: Client,
    endpoint: String,
}

impl WikidataSearchClient {
    pub fn new(endpoint: &str, user_agent: &str, timeout: Duration) -> Result<Self, SearchError> {
        let mut headers = header::HeaderMap::new();
        let user_agent = header::HeaderValue::from_str(user_agent)
            .map_err(|e| SearchError::Transport(format!("Invalid User-Agent: {}", e)))?;
        headers.insert(header::USER_AGENT, user_agent);

        let http_client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| SearchError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            endpoint: endpoint.to_string(),
        })
    }
}

#[async_trait]
impl EntitySearch for WikidataSearchClient {
    async fn search(
        &self,
        term: &str,
        language: &str,
        limit: usize,
    ) -> Result<Vec<SearchHit>, SearchError> {
        let limit = limit.clamp(1, MAX_LIMIT).to_string();
        debug!(term = %term, language = %language, "Searching Wikidata entities");

        let response = self
            .http_client
            .get(&self.endpoint)
            .query(&[
                ("action", "wbsearchentities"),
                ("format", "json"),
                ("type", "item"),
                ("search", term),
                ("language", language),
                ("uselang", language),
                ("limit", limit.as_str()),
            ])
            .send()
            .await
            .map_err(|e| SearchError::Transport(format!("Search request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SearchError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| SearchError::Transport(format!("Failed to read search response: {}", e)))?;
        let hits = decode_hits(&body)?;
        debug!(term = %term, hits = hits.len(), "Search complete");
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_hits_keeps_order_and_fills_missing_text() {
        let body = r#"{
            "searchinfo": {"search": "Weimar"},
            "search": [
                {"id": "Q3955", "label": "Weimar", "description": "Stadt in Thüringen"},
                {"id": "Q41304", "label": "Weimarer Republik"},
                {"id": "Q999"}
            ],
            "success": 1
        }"#;
        let hits = decode_hits(body).unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].id, "Q3955");
        assert_eq!(hits[1].description, "");
        assert_eq!(hits[2].label, "");
    }

    #[test]
    fn test_error_body_is_rejection() {
        let body = r#"{"error": {"code": "param-missing", "info": "search required"}}"#;
        match decode_hits(body) {
            Err(SearchError::Rejected { message, .. }) => {
                assert_eq!(message, "param-missing: search required")
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_empty_result() {
        assert!(decode_hits(r#"{"search": []}"#).unwrap().is_empty());
    }

    #[test]
    fn test_decode_rejects_non_json() {
        assert!(matches!(decode_hits("oops"), Err(SearchError::Decode(_))));
    }
}
