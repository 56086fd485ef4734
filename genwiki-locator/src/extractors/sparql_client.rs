//! Wikidata SPARQL client
//!
//! Implements [`KnowledgeBase`] on top of the public query service. Queries
//! come from the named [`QueryCatalog`]; results are decoded from the
//! SPARQL JSON results format into flat string records.
//!
//! Endpoint: https://query.wikidata.org/sparql

use crate::extractors::query_catalog::{
    QueryCatalog, ITEMS_COORDINATES, ITEMS_HAS_PARTS, LOOKUP_BY_GEONAMES, LOOKUP_BY_NUTS,
    LOOKUP_HIERARCHY,
};
use crate::geo::Coordinate;
use crate::types::{AdminRow, KnowledgeBase, PartRecord, QueryError, ReferenceKind};
use async_trait::async_trait;
use reqwest::{header, Client};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Prefix of entity URIs in query results
pub const ENTITY_PREFIX: &str = "http://www.wikidata.org/entity/";

const SPARQL_RESULTS_JSON: &str = "application/sparql-results+json";

/// One result row: variable name → value
pub type Record = HashMap<String, String>;

#[derive(Debug, Deserialize)]
struct SparqlResponse {
    results: SparqlResults,
}

#[derive(Debug, Deserialize)]
struct SparqlResults {
    bindings: Vec<HashMap<String, SparqlTerm>>,
}

#[derive(Debug, Deserialize)]
struct SparqlTerm {
    value: String,
}

/// Strip the entity URI prefix (`http://www.wikidata.org/entity/Q3955` → `Q3955`)
pub fn unprefix(uri: &str) -> &str {
    uri.strip_prefix(ENTITY_PREFIX).unwrap_or(uri)
}

/// `Q` followed by digits
pub fn is_item_id(id: &str) -> bool {
    id.len() > 1 && id.starts_with('Q') && id[1..].bytes().all(|b| b.is_ascii_digit())
}

/// Escape a value for use inside a double-quoted SPARQL string literal
pub fn escape_literal(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Decode a SPARQL JSON results document into records, preserving row order
pub fn decode_results(body: &str) -> Result<Vec<Record>, QueryError> {
    let response: SparqlResponse = serde_json::from_str(body)
        .map_err(|e| QueryError::Decode(format!("Invalid SPARQL JSON results: {}", e)))?;
    Ok(response
        .results
        .bindings
        .into_iter()
        .map(|binding| binding.into_iter().map(|(k, t)| (k, t.value)).collect())
        .collect())
}

/// `VALUES` list for a set of items; invalid ids are skipped
fn values_list(items: &[String]) -> String {
    items
        .iter()
        .filter(|item| {
            let valid = is_item_id(item);
            if !valid {
                warn!(item = %item, "Skipping invalid item id");
            }
            valid
        })
        .map(|item| format!("wd:{}", item))
        .collect::<Vec<_>>()
        .join(" ")
}

fn require<'a>(record: &'a Record, field: &str) -> Result<&'a str, QueryError> {
    record
        .get(field)
        .map(String::as_str)
        .ok_or_else(|| QueryError::Decode(format!("Result row without '{}'", field)))
}

/// Item ids from exact lookup rows
pub fn records_to_items(records: &[Record]) -> Result<Vec<String>, QueryError> {
    records
        .iter()
        .map(|r| require(r, "item").map(|item| unprefix(item).to_string()))
        .collect()
}

/// Coordinates keyed by item id. Unparseable literals are skipped.
pub fn records_to_coordinates(records: &[Record]) -> Result<HashMap<String, Coordinate>, QueryError> {
    let mut coordinates = HashMap::new();
    for record in records {
        let item = unprefix(require(record, "item")?).to_string();
        let literal = require(record, "coordinates")?;
        match Coordinate::from_wkt_point(literal) {
            // first coordinate of an item wins
            Some(coordinate) => {
                coordinates.entry(item).or_insert(coordinate);
            }
            None => warn!(item = %item, literal = %literal, "Unparseable coordinate literal"),
        }
    }
    Ok(coordinates)
}

pub fn records_to_admin_rows(records: &[Record]) -> Result<Vec<AdminRow>, QueryError> {
    records
        .iter()
        .map(|record| -> Result<AdminRow, QueryError> {
            let level = require(record, "level")?;
            let level = level
                .parse::<u32>()
                .map_err(|_| QueryError::Decode(format!("Invalid hierarchy level '{}'", level)))?;
            Ok(AdminRow {
                level,
                iso_code: require(record, "iso_code")?.to_string(),
                item_label: require(record, "itemLabel")?.to_string(),
                admin: record.get("admin").map(|a| unprefix(a).to_string()),
                admin_label: record.get("adminLabel").cloned(),
            })
        })
        .collect()
}

pub fn records_to_parts(records: &[Record]) -> Result<Vec<PartRecord>, QueryError> {
    records
        .iter()
        .map(|record| -> Result<PartRecord, QueryError> {
            let item = unprefix(require(record, "item")?).to_string();
            let part = unprefix(require(record, "part")?).to_string();
            Ok(PartRecord {
                item_label: record.get("itemLabel").cloned().unwrap_or_else(|| item.clone()),
                part_label: record.get("partLabel").cloned().unwrap_or_else(|| part.clone()),
                item,
                part,
            })
        })
        .collect()
}

/// Wikidata query service client
pub struct WikidataSparqlClient {
    http_client: Client,
    endpoint: String,
    catalog: QueryCatalog,
}

impl WikidataSparqlClient {
    pub fn new(endpoint: &str, user_agent: &str, timeout: Duration) -> Result<Self, QueryError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static(SPARQL_RESULTS_JSON),
        );
        let user_agent = header::HeaderValue::from_str(user_agent)
            .map_err(|e| QueryError::Transport(format!("Invalid User-Agent: {}", e)))?;
        headers.insert(header::USER_AGENT, user_agent);

        let http_client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| QueryError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            endpoint: endpoint.to_string(),
            catalog: QueryCatalog::embedded()?,
        })
    }

    /// Run a named query and return its rows
    pub async fn query(
        &self,
        name: &str,
        values: &HashMap<&str, String>,
    ) -> Result<Vec<Record>, QueryError> {
        let sparql = self.catalog.render(name, values)?;
        debug!(query = name, "Executing SPARQL query");

        let response = self
            .http_client
            .post(&self.endpoint)
            .form(&[("query", sparql.as_str()), ("format", "json")])
            .send()
            .await
            .map_err(|e| QueryError::Transport(format!("SPARQL request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(QueryError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| QueryError::Transport(format!("Failed to read SPARQL response: {}", e)))?;
        let records = decode_results(&body)?;
        debug!(query = name, rows = records.len(), "SPARQL query complete");
        Ok(records)
    }
}

#[async_trait]
impl KnowledgeBase for WikidataSparqlClient {
    async fn lookup_by_reference(
        &self,
        kind: ReferenceKind,
        code: &str,
        language: &str,
    ) -> Result<Vec<String>, QueryError> {
        let (query_name, param) = match kind {
            ReferenceKind::Geonames => (LOOKUP_BY_GEONAMES, "geonames_id"),
            ReferenceKind::Nuts1999 | ReferenceKind::Nuts2003 => (LOOKUP_BY_NUTS, "nuts_code"),
            ReferenceKind::Other => return Err(QueryError::UnsupportedKind(kind)),
        };
        let values = HashMap::from([
            (param, escape_literal(code)),
            ("lang", escape_literal(language)),
        ]);
        let records = self.query(query_name, &values).await?;
        records_to_items(&records)
    }

    async fn coordinates(&self, items: &[String]) -> Result<HashMap<String, Coordinate>, QueryError> {
        let items = values_list(items);
        if items.is_empty() {
            return Ok(HashMap::new());
        }
        let records = self
            .query(ITEMS_COORDINATES, &HashMap::from([("items", items)]))
            .await?;
        records_to_coordinates(&records)
    }

    async fn admin_hierarchy(&self, item: &str, language: &str) -> Result<Vec<AdminRow>, QueryError> {
        if !is_item_id(item) {
            return Err(QueryError::Decode(format!("Invalid item id '{}'", item)));
        }
        let values = HashMap::from([
            ("item", item.to_string()),
            ("lang", escape_literal(language)),
        ]);
        let records = self.query(LOOKUP_HIERARCHY, &values).await?;
        records_to_admin_rows(&records)
    }

    async fn parts(&self, items: &[String], language: &str) -> Result<Vec<PartRecord>, QueryError> {
        let items = values_list(items);
        if items.is_empty() {
            return Ok(Vec::new());
        }
        let values = HashMap::from([("items", items), ("lang", escape_literal(language))]);
        let records = self.query(ITEMS_HAS_PARTS, &values).await?;
        records_to_parts(&records)
    }
}
