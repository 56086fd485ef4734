//! Core Types and Collaborator Traits for the Location Resolution Engine
//!
//! Defines the data shapes exchanged between the engine and its external
//! collaborators, and the traits those collaborators implement:
//! - [`GazetteerSource`] - GOV place records
//! - [`KnowledgeBase`] - structured Wikidata queries (SPARQL)
//! - [`EntitySearch`] - fuzzy label search
//! - [`Geocoder`] - free-text geocoding with bounded retry
//!
//! Every collaborator is injected as a trait object so resolution calls can
//! be exercised against in-memory doubles.

use crate::geo::Coordinate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

// ============================================================================
// Gazetteer Types
// ============================================================================

/// Kind of an external reference attached to a gazetteer object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferenceKind {
    Geonames,
    Nuts1999,
    Nuts2003,
    /// Any reference the engine does not resolve
    Other,
}

impl ReferenceKind {
    fn from_prefix(prefix: &str) -> Self {
        match prefix {
            "geonames" => ReferenceKind::Geonames,
            "NUTS1999" => ReferenceKind::Nuts1999,
            "NUTS2003" => ReferenceKind::Nuts2003,
            _ => ReferenceKind::Other,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, ReferenceKind::Other)
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReferenceKind::Geonames => "geonames",
            ReferenceKind::Nuts1999 => "NUTS1999",
            ReferenceKind::Nuts2003 => "NUTS2003",
            ReferenceKind::Other => "other",
        };
        f.write_str(name)
    }
}

/// External reference such as `geonames:3092080` or `NUTS2003:DEG05`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalReference {
    pub kind: ReferenceKind,
    /// Raw reference value including the kind prefix
    pub value: String,
}

impl ExternalReference {
    /// Classify a raw reference value by its `<kind>:` prefix
    pub fn parse(value: impl Into<String>) -> Self {
        let value = value.into();
        let kind = match value.split_once(':') {
            Some((prefix, code)) if !code.is_empty() => ReferenceKind::from_prefix(prefix),
            _ => ReferenceKind::Other,
        };
        Self { kind, value }
    }

    /// Code without the kind prefix (`3092080` for `geonames:3092080`)
    pub fn code(&self) -> &str {
        self.value
            .split_once(':')
            .map(|(_, code)| code)
            .unwrap_or(&self.value)
    }
}

/// Name of a place in one source language (`deu`, `pol`, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameRecord {
    pub language: String,
    pub value: String,
}

/// Gazetteer place record, reduced to the fields the engine consumes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GazetteerObject {
    pub id: String,
    /// Reported position; `None` when missing or incomplete
    pub position: Option<Coordinate>,
    pub external_references: Vec<ExternalReference>,
    pub names: Vec<NameRecord>,
}

// ============================================================================
// Knowledge Base Types
// ============================================================================

/// One administrative-hierarchy row for a candidate item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminRow {
    /// Hierarchy level (3 = country, 4 = first-level region)
    pub level: u32,
    /// ISO 3166 code of the ancestor (`DE`, `DE-TH`)
    pub iso_code: String,
    /// Label of the queried item itself
    pub item_label: String,
    /// Ancestor item id, unprefixed
    pub admin: Option<String>,
    /// Ancestor label
    pub admin_label: Option<String>,
}

/// Intermediate administrative unit used when materializing a chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyRecord {
    pub level: u32,
    pub iso_code: String,
    pub item: String,
    pub label: String,
    /// Path of the enclosing unit (`DE` for `DE-TH`), empty at the top
    pub parent_path: String,
}

impl AdminRow {
    /// Intermediate-admin view of this row, if the ancestor is known
    pub fn hierarchy_record(&self) -> Option<HierarchyRecord> {
        let item = self.admin.clone()?;
        let parent_path = self
            .iso_code
            .rsplit_once('-')
            .map(|(parent, _)| parent.replace('-', "/"))
            .unwrap_or_default();
        Some(HierarchyRecord {
            level: self.level,
            iso_code: self.iso_code.clone(),
            label: self.admin_label.clone().unwrap_or_else(|| item.clone()),
            item,
            parent_path,
        })
    }
}

/// `has part` relation between two items
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartRecord {
    pub item: String,
    pub item_label: String,
    pub part: String,
    pub part_label: String,
}

/// Fuzzy search result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub label: String,
    pub description: String,
}

impl SearchHit {
    /// Literal, case-sensitive containment in label or description
    pub fn mentions(&self, name: &str) -> bool {
        self.description.contains(name) || self.label.contains(name)
    }
}

// ============================================================================
// Collaborator Traits
// ============================================================================

/// Gazetteer client (GOV web service)
#[async_trait::async_trait]
pub trait GazetteerSource: Send + Sync {
    /// Fetch the place record for a gazetteer id
    ///
    /// # Errors
    /// `GazetteerError::NotFound` when the service does not know the id (or
    /// does not support the request); other variants for transport faults.
    async fn get_object(&self, gov_id: &str) -> Result<GazetteerObject, GazetteerError>;
}

/// Knowledge-base query client
#[async_trait::async_trait]
pub trait KnowledgeBase: Send + Sync {
    /// Exact lookup by external code; one item id per result row
    async fn lookup_by_reference(
        &self,
        kind: ReferenceKind,
        code: &str,
        language: &str,
    ) -> Result<Vec<String>, QueryError>;

    /// Batched coordinate lookup. Items without a coordinate are absent.
    async fn coordinates(&self, items: &[String]) -> Result<HashMap<String, Coordinate>, QueryError>;

    /// Administrative ancestor rows for one item
    async fn admin_hierarchy(&self, item: &str, language: &str)
        -> Result<Vec<AdminRow>, QueryError>;

    /// `has part` rows for a set of items
    async fn parts(&self, items: &[String], language: &str) -> Result<Vec<PartRecord>, QueryError>;
}

/// Fuzzy entity search service
#[async_trait::async_trait]
pub trait EntitySearch: Send + Sync {
    /// Ranked search results, at most `limit`
    async fn search(
        &self,
        term: &str,
        language: &str,
        limit: usize,
    ) -> Result<Vec<SearchHit>, SearchError>;
}

/// Free-text geocoder
#[async_trait::async_trait]
pub trait Geocoder: Send + Sync {
    /// Knowledge-base id for a free-text location, `None` when not found.
    ///
    /// Transient failures are retried internally; once retries are exhausted
    /// the result is `Ok(None)`. Query errors are returned immediately.
    async fn lookup_identifier(&self, text: &str) -> Result<Option<String>, GeocoderError>;
}

// ============================================================================
// Collaborator Errors
// ============================================================================

/// Gazetteer client error
#[derive(Debug, Error)]
pub enum GazetteerError {
    /// Object unknown or request unsupported (HTTP 404 / 501)
    #[error("Gazetteer object not found: {0}")]
    NotFound(String),

    /// Network or server failure
    #[error("Gazetteer transport error: {0}")]
    Transport(String),

    /// Response body could not be decoded
    #[error("Gazetteer decode error: {0}")]
    Decode(String),

    /// Local response cache could not be read or written
    #[error("Gazetteer cache error: {0}")]
    Cache(#[from] std::io::Error),
}

/// Knowledge-base query error
#[derive(Debug, Error)]
pub enum QueryError {
    /// Named query missing from the catalog
    #[error("Unknown query: {0}")]
    UnknownQuery(String),

    /// Query template references a parameter that was not supplied
    #[error("Missing query parameter '{param}' for {query}")]
    MissingParameter { query: String, param: String },

    /// Query template could not be compiled or rendered
    #[error("Invalid query template {query}: {message}")]
    InvalidTemplate { query: String, message: String },

    /// Reference kind has no lookup query
    #[error("Unsupported reference kind: {0}")]
    UnsupportedKind(ReferenceKind),

    /// Network failure
    #[error("Query transport error: {0}")]
    Transport(String),

    /// Service rejected the query
    #[error("Query rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },

    /// Result could not be decoded
    #[error("Query decode error: {0}")]
    Decode(String),
}

/// Search service error
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Search transport error: {0}")]
    Transport(String),

    #[error("Search rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("Search decode error: {0}")]
    Decode(String),
}

/// Geocoder error
#[derive(Debug, Error)]
pub enum GeocoderError {
    /// Timeout or service unavailable; retried by the client
    #[error("Geocoder temporarily unavailable: {0}")]
    Transient(String),

    /// Malformed query or service-side rejection; never retried
    #[error("Geocoder query error: {0}")]
    Query(String),
}

impl GeocoderError {
    pub fn is_transient(&self) -> bool {
        matches!(self, GeocoderError::Transient(_))
    }
}

// ============================================================================
// Tests
// ============================================================================
