//! Collaborator clients
//!
//! HTTP clients for the external services the engine consumes. Each client
//! implements one trait from [`crate::types`]:
//! - **gov_client** - GOV gazetteer objects (`GazetteerSource`), file cached
//! - **sparql_client** - Wikidata query service (`KnowledgeBase`)
//! - **wikidata_search** - Wikidata label search (`EntitySearch`)
//! - **nominatim_client** - free-text geocoding (`Geocoder`), rate limited

pub mod gov_client;
pub mod nominatim_client;
pub mod query_catalog;
pub mod sparql_client;
pub mod wikidata_search;

pub use gov_client::GovClient;
pub use nominatim_client::NominatimClient;
pub use query_catalog::QueryCatalog;
pub use sparql_client::WikidataSparqlClient;
pub use wikidata_search::WikidataSearchClient;
