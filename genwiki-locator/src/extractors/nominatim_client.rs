//! Nominatim Geocoder Client
//!
//! Resolves free text (a place name or an unknown gazetteer id) to a Wikidata
//! id via the `wikidata` extra tag of the best OpenStreetMap match.
//!
//! # API Reference
//! - Endpoint: https://nominatim.openstreetmap.org/search
//! - Usage Policy: at most 1 request/second, identifying User-Agent required

use crate::types::{Geocoder, GeocoderError};
use crate::utils::retry::retry_transient;
use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use std::num::NonZeroU32;
use std::time::Duration;
use tracing::info;

/// Rate limit: 1 request per second (Nominatim usage policy)
const REQUESTS_PER_SECOND: NonZeroU32 = NonZeroU32::MIN;

#[derive(Debug, Deserialize)]
struct Place {
    #[serde(default)]
    extratags: Option<ExtraTags>,
}

#[derive(Debug, Deserialize)]
struct ExtraTags {
    #[serde(default)]
    wikidata: Option<String>,
}

/// Wikidata id of the first match, if it carries one
pub fn decode_wikidata_id(body: &str) -> Result<Option<String>, GeocoderError> {
    let places: Vec<Place> = serde_json::from_str(body)
        .map_err(|e| GeocoderError::Query(format!("Invalid Nominatim response: {}", e)))?;
    Ok(places
        .into_iter()
        .next()
        .and_then(|place| place.extratags)
        .and_then(|tags| tags.wikidata)
        .filter(|id| !id.is_empty()))
}

/// Map an HTTP status onto the retry classification
fn classify_status(status: StatusCode, body: String) -> GeocoderError {
    match status {
        StatusCode::TOO_MANY_REQUESTS
        | StatusCode::SERVICE_UNAVAILABLE
        | StatusCode::GATEWAY_TIMEOUT
        | StatusCode::BAD_GATEWAY => {
            GeocoderError::Transient(format!("Nominatim returned {}", status))
        }
        _ => GeocoderError::Query(format!("Nominatim returned {}: {}", status, body)),
    }
}

fn classify_transport(err: reqwest::Error) -> GeocoderError {
    if err.is_timeout() || err.is_connect() {
        GeocoderError::Transient(format!("Nominatim unreachable: {}", err))
    } else {
        GeocoderError::Query(format!("Nominatim request failed: {}", err))
    }
}

/// Nominatim client with politeness rate limiting and bounded retry
pub struct NominatimClient {
    http_client: Client,
    endpoint: String,
    max_attempts: u32,
    initial_backoff: Duration,
    /// Token bucket shared by every attempt, retries included
    rate_limiter: RateLimiter<
        governor::state::direct::NotKeyed,
        governor::state::InMemoryState,
        governor::clock::DefaultClock,
    >,
}

impl NominatimClient {
    pub fn new(
        endpoint: &str,
        user_agent: &str,
        timeout: Duration,
        max_attempts: u32,
        initial_backoff: Duration,
    ) -> Result<Self, GeocoderError> {
        let mut headers = header::HeaderMap::new();
        let user_agent = header::HeaderValue::from_str(user_agent)
            .map_err(|e| GeocoderError::Query(format!("Invalid User-Agent: {}", e)))?;
        headers.insert(header::USER_AGENT, user_agent);

        let http_client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| GeocoderError::Query(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            endpoint: endpoint.to_string(),
            max_attempts,
            initial_backoff,
            rate_limiter: RateLimiter::direct(Quota::per_second(REQUESTS_PER_SECOND)),
        })
    }

    /// One geocoding attempt
    async fn geocode_once(&self, text: &str) -> Result<Option<String>, GeocoderError> {
        // Wait for a permit (1 req/sec)
        self.rate_limiter.until_ready().await;

        let response = self
            .http_client
            .get(&self.endpoint)
            .query(&[
                ("q", text),
                ("format", "jsonv2"),
                ("limit", "1"),
                ("extratags", "1"),
            ])
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, body));
        }

        let body = response.text().await.map_err(classify_transport)?;
        decode_wikidata_id(&body)
    }
}

#[async_trait]
impl Geocoder for NominatimClient {
    async fn lookup_identifier(&self, text: &str) -> Result<Option<String>, GeocoderError> {
        let result = retry_transient("nominatim lookup", self.max_attempts, self.initial_backoff, || {
            self.geocode_once(text)
        })
        .await;

        match result {
            Ok(id) => {
                info!(text = %text, wikidata_id = ?id, "Nominatim lookup complete");
                Ok(id)
            }
            // exhaustion was logged by the retry loop
            Err(err) if err.is_transient() => Ok(None),
            Err(err) => Err(err),
        }
    }
}
