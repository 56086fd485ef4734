//! Location Resolution Engine facade
//!
//! Wires the pipeline together:
//! gazetteer id → [`EvidenceGatherer`] → [`GeoValidator`] → [`ConsensusRanker`]
//! → first non-null candidate → [`PathResolver`].
//!
//! The engine holds its collaborators as trait objects and keeps no mutable
//! state between calls, so one `Locator` can serve concurrent requests.

use crate::config::{LocatorConfig, LocatorSettings};
use crate::error::{LocatorError, LocatorResult};
use crate::evidence::EvidenceMap;
use crate::extractors::{GovClient, NominatimClient, WikidataSearchClient, WikidataSparqlClient};
use crate::fusion::ConsensusRanker;
use crate::gatherer::EvidenceGatherer;
use crate::hierarchy::path_resolver::leaf_path;
use crate::hierarchy::{FileLocationStore, LocationStore, PathResolver};
use crate::types::{EntitySearch, GazetteerSource, Geocoder, KnowledgeBase};
use crate::validators::GeoValidator;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// External services used by the engine
#[derive(Clone)]
pub struct Collaborators {
    pub gazetteer: Arc<dyn GazetteerSource>,
    pub knowledge_base: Arc<dyn KnowledgeBase>,
    pub search: Arc<dyn EntitySearch>,
    pub geocoder: Arc<dyn Geocoder>,
    pub store: Arc<dyn LocationStore>,
}

impl Collaborators {
    /// HTTP clients and file store as configured
    pub fn from_config(config: &LocatorConfig) -> LocatorResult<Self> {
        let settings = &config.locator;
        let endpoints = &config.endpoints;
        let timeout = settings.request_timeout();
        let setup = |e: &dyn std::fmt::Display| LocatorError::Setup(e.to_string());

        let gazetteer = GovClient::new(
            &endpoints.gov_url,
            &settings.user_agent,
            timeout,
            settings.resolved_cache_dir(),
        )
        .map_err(|e| setup(&e))?;
        let knowledge_base =
            WikidataSparqlClient::new(&endpoints.sparql_url, &settings.user_agent, timeout)
                .map_err(|e| setup(&e))?;
        let search =
            WikidataSearchClient::new(&endpoints.wikidata_api_url, &settings.user_agent, timeout)
                .map_err(|e| setup(&e))?;
        let geocoder = NominatimClient::new(
            &endpoints.nominatim_url,
            &settings.user_agent,
            timeout,
            settings.geocoder_max_retries,
            settings.geocoder_backoff(),
        )
        .map_err(|e| setup(&e))?;
        let store = FileLocationStore::new(settings.resolved_store_dir());

        Ok(Self {
            gazetteer: Arc::new(gazetteer),
            knowledge_base: Arc::new(knowledge_base),
            search: Arc::new(search),
            geocoder: Arc::new(geocoder),
            store: Arc::new(store),
        })
    }
}

/// Page materialization mode for [`Locator::resolve`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Materialize {
    /// Resolve the path only
    #[default]
    None,
    /// Write pages that do not exist yet
    Missing,
    /// Rewrite every page of the chain
    Force,
}

/// Outcome of a full resolution
#[derive(Debug, Clone, Serialize)]
pub struct Resolution {
    pub gov_id: String,
    /// Validated and ranked evidence
    pub evidence: EvidenceMap,
    /// Candidate the path was derived from
    pub item: Option<String>,
    pub path: Option<String>,
    /// Pages written by this call
    pub materialized: Vec<String>,
}

pub struct Locator {
    gatherer: EvidenceGatherer,
    validator: GeoValidator,
    ranker: ConsensusRanker,
    resolver: PathResolver,
}

impl Locator {
    pub fn new(collaborators: Collaborators, settings: &LocatorSettings) -> Self {
        let Collaborators {
            gazetteer,
            knowledge_base,
            search,
            geocoder,
            store,
        } = collaborators;

        Self {
            gatherer: EvidenceGatherer::new(gazetteer, knowledge_base.clone(), search, geocoder)
                .with_search_limit(settings.search_limit)
                .with_reference_language(settings.reference_language.clone())
                .with_ambiguity(settings.ambiguity),
            validator: GeoValidator::new(knowledge_base.clone())
                .with_max_distance_km(settings.max_distance_km),
            ranker: ConsensusRanker::new(),
            resolver: PathResolver::new(knowledge_base, store)
                .with_language(settings.path_language.clone()),
        }
    }

    /// Engine backed by the configured web services
    pub fn from_config(config: &LocatorConfig) -> LocatorResult<Self> {
        Ok(Self::new(Collaborators::from_config(config)?, &config.locator))
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// Raw evidence, before validation and ranking
    pub async fn locate_unranked(&self, gov_id: &str) -> LocatorResult<EvidenceMap> {
        Ok(self.gatherer.locate(gov_id).await?.evidence)
    }

    /// Validated and ranked evidence; the first non-null entry is the winner
    pub async fn locate(&self, gov_id: &str) -> LocatorResult<EvidenceMap> {
        let gathered = self.gatherer.locate(gov_id).await?;
        let validated = self
            .validator
            .validate(gathered.object.as_ref(), &gathered.evidence)
            .await?;
        Ok(self.ranker.rank(&validated))
    }

    /// Locate, then derive the path of the winning candidate
    ///
    /// The winner is the first non-null entry of the ranked evidence. A
    /// winner without a level-4 ancestor has no path; later candidates are
    /// not consulted.
    pub async fn resolve(&self, gov_id: &str, materialize: Materialize) -> LocatorResult<Resolution> {
        let evidence = self.locate(gov_id).await?;

        let mut resolution = Resolution {
            gov_id: gov_id.to_string(),
            evidence: EvidenceMap::new(),
            item: None,
            path: None,
            materialized: Vec::new(),
        };

        if let Some((key, item)) = evidence.first_candidate() {
            let rows = self.resolver.hierarchy(item).await?;
            match leaf_path(&rows) {
                Some(leaf) => {
                    resolution.materialized = match materialize {
                        Materialize::None => Vec::new(),
                        Materialize::Missing => {
                            self.resolver.ensure_hierarchy(&leaf, item, &rows, false).await?
                        }
                        Materialize::Force => {
                            self.resolver.ensure_hierarchy(&leaf, item, &rows, true).await?
                        }
                    };
                    resolution.path = Some(leaf.path());
                }
                None => debug!(gov_id = %gov_id, key = %key, item = %item, "Winner has no hierarchy path"),
            }
            resolution.item = Some(item.to_string());
        }

        info!(
            gov_id = %gov_id,
            item = ?resolution.item,
            path = ?resolution.path,
            materialized = resolution.materialized.len(),
            "Resolution complete"
        );

        resolution.evidence = evidence;
        Ok(resolution)
    }
}
