//! Named query catalog
//!
//! SPARQL queries are kept in an embedded TOML file and addressed by name.
//! Templates contain `{{ name }}` placeholders and are rendered with
//! Handlebars in strict mode, so a placeholder without a value is an error
//! instead of an empty string.

use crate::types::QueryError;
use handlebars::{Handlebars, RenderError, RenderErrorReason};
use serde::Deserialize;
use std::collections::HashMap;

const EMBEDDED_QUERIES: &str = include_str!("queries.toml");

pub const LOOKUP_HIERARCHY: &str = "WikidataLookup";
pub const LOOKUP_BY_NUTS: &str = "WikidataLookupByNutsCode";
pub const LOOKUP_BY_GEONAMES: &str = "WikidataLookupByGeoNamesID";
pub const ITEMS_COORDINATES: &str = "WikidataItemsCoordinates";
pub const ITEMS_HAS_PARTS: &str = "WikidataItemHasParts";

/// Strict registry without HTML escaping; values are inserted verbatim
fn query_registry() -> Handlebars<'static> {
    let mut handlebars = Handlebars::new();
    handlebars.set_strict_mode(true);
    handlebars.register_escape_fn(handlebars::no_escape);
    handlebars
}

fn render_error(query: &str, err: RenderError) -> QueryError {
    match err.reason() {
        RenderErrorReason::MissingVariable(param) => QueryError::MissingParameter {
            query: query.to_string(),
            param: param.clone().unwrap_or_default(),
        },
        _ => QueryError::InvalidTemplate {
            query: query.to_string(),
            message: err.to_string(),
        },
    }
}

/// One parameterised query
#[derive(Debug, Clone, Deserialize)]
pub struct NamedQuery {
    pub name: String,
    #[serde(default)]
    pub params: Vec<String>,
    pub query: String,
}

impl NamedQuery {
    /// Substitute every placeholder, failing on any that has no value
    pub fn apply_parameters_with_check(
        &self,
        values: &HashMap<&str, String>,
    ) -> Result<String, QueryError> {
        query_registry()
            .render_template(&self.query, values)
            .map_err(|e| render_error(&self.name, e))
    }
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    query: Vec<NamedQuery>,
}

/// Queries indexed by name, templates compiled once
#[derive(Debug, Clone)]
pub struct QueryCatalog {
    queries: HashMap<String, NamedQuery>,
    templates: Handlebars<'static>,
}

impl QueryCatalog {
    /// Catalog shipped with the binary
    pub fn embedded() -> Result<Self, QueryError> {
        Self::from_toml(EMBEDDED_QUERIES)
    }

    pub fn from_toml(content: &str) -> Result<Self, QueryError> {
        let file: CatalogFile = toml::from_str(content)
            .map_err(|e| QueryError::Decode(format!("Invalid query catalog: {}", e)))?;

        let mut templates = query_registry();
        let mut queries = HashMap::new();
        for query in file.query {
            templates
                .register_template_string(&query.name, &query.query)
                .map_err(|e| QueryError::InvalidTemplate {
                    query: query.name.clone(),
                    message: e.to_string(),
                })?;
            queries.insert(query.name.clone(), query);
        }

        Ok(Self { queries, templates })
    }

    pub fn get(&self, name: &str) -> Result<&NamedQuery, QueryError> {
        self.queries
            .get(name)
            .ok_or_else(|| QueryError::UnknownQuery(name.to_string()))
    }

    /// Look up a query and fill in its parameters
    pub fn render(&self, name: &str, values: &HashMap<&str, String>) -> Result<String, QueryError> {
        self.get(name)?;
        self.templates
            .render(name, values)
            .map_err(|e| render_error(name, e))
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.queries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
