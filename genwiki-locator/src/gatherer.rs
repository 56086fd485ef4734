//! Evidence Gatherer
//!
//! Builds the raw evidence map for one gazetteer id:
//! 1. Fetch the GOV object. If the gazetteer does not know the id, the id is
//!    resolved as free text through the geocoder (`nominatim` key) and the
//!    single-entry map is returned.
//! 2. Exact knowledge-base lookup for every recognized external reference.
//! 3. Fuzzy label search for every name of the object.
//!
//! References come before names, each group in source order. All calls of
//! one run are awaited sequentially.

use crate::config::AmbiguityPolicy;
use crate::error::{LocatorError, LocatorResult};
use crate::evidence::{name_key, EvidenceMap, NOMINATIM_KEY};
use crate::types::{
    EntitySearch, ExternalReference, GazetteerError, GazetteerObject, GazetteerSource, Geocoder,
    KnowledgeBase, NameRecord,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Search language for a GOV source language code
pub fn search_language(source_language: &str) -> &'static str {
    match source_language {
        "deu" => "de",
        "pol" => "pl",
        _ => "en",
    }
}

/// Result of one gathering run
#[derive(Debug, Clone)]
pub struct Gathered {
    /// Gazetteer object; `None` when the free-text fallback was used
    pub object: Option<GazetteerObject>,
    pub evidence: EvidenceMap,
}

pub struct EvidenceGatherer {
    gazetteer: Arc<dyn GazetteerSource>,
    knowledge_base: Arc<dyn KnowledgeBase>,
    search: Arc<dyn EntitySearch>,
    geocoder: Arc<dyn Geocoder>,
    search_limit: usize,
    reference_language: String,
    ambiguity: AmbiguityPolicy,
}

impl EvidenceGatherer {
    pub fn new(
        gazetteer: Arc<dyn GazetteerSource>,
        knowledge_base: Arc<dyn KnowledgeBase>,
        search: Arc<dyn EntitySearch>,
        geocoder: Arc<dyn Geocoder>,
    ) -> Self {
        Self {
            gazetteer,
            knowledge_base,
            search,
            geocoder,
            search_limit: 11,
            reference_language: "en".to_string(),
            ambiguity: AmbiguityPolicy::Strict,
        }
    }

    pub fn with_search_limit(mut self, limit: usize) -> Self {
        self.search_limit = limit;
        self
    }

    pub fn with_reference_language(mut self, language: impl Into<String>) -> Self {
        self.reference_language = language.into();
        self
    }

    pub fn with_ambiguity(mut self, policy: AmbiguityPolicy) -> Self {
        self.ambiguity = policy;
        self
    }

    /// Gather raw evidence for a gazetteer id
    ///
    /// # Errors
    /// Gazetteer failures other than "not found", knowledge-base and search
    /// failures, geocoder query errors, and `ConflictingEvidence` under the
    /// strict ambiguity policy.
    pub async fn locate(&self, gov_id: &str) -> LocatorResult<Gathered> {
        let object = match self.gazetteer.get_object(gov_id).await {
            Ok(object) => object,
            Err(GazetteerError::NotFound(_)) => {
                info!(gov_id = %gov_id, "Gazetteer has no object, falling back to geocoder");
                let candidate = self.geocoder.lookup_identifier(gov_id).await?;
                let mut evidence = EvidenceMap::new();
                evidence.insert(NOMINATIM_KEY, candidate);
                return Ok(Gathered {
                    object: None,
                    evidence,
                });
            }
            Err(e) => return Err(e.into()),
        };

        let mut evidence = EvidenceMap::new();

        for reference in object.external_references.iter().filter(|r| r.kind.is_recognized()) {
            if evidence.contains_key(&reference.value) {
                debug!(reference = %reference.value, "Duplicate reference skipped");
                continue;
            }
            let candidate = self.lookup_reference(reference).await?;
            evidence.insert(reference.value.clone(), candidate);
        }

        for name in &object.names {
            let language = search_language(&name.language);
            let key = name_key(&name.value, language);
            if evidence.contains_key(&key) {
                debug!(key = %key, "Duplicate name skipped");
                continue;
            }
            let candidate = self.locate_by_name(name, language).await?;
            evidence.insert(key, candidate);
        }

        info!(
            gov_id = %gov_id,
            entries = evidence.len(),
            candidates = evidence.candidates().len(),
            "Evidence gathered"
        );

        Ok(Gathered {
            object: Some(object),
            evidence,
        })
    }

    /// Exact lookup; more than one match is an integrity violation
    async fn lookup_reference(&self, reference: &ExternalReference) -> LocatorResult<Option<String>> {
        let mut items = self
            .knowledge_base
            .lookup_by_reference(reference.kind, reference.code(), &self.reference_language)
            .await?;

        match items.len() {
            0 => Ok(None),
            1 => Ok(items.pop()),
            count => match self.ambiguity {
                AmbiguityPolicy::Strict => Err(LocatorError::ConflictingEvidence {
                    reference: reference.value.clone(),
                    count,
                    items,
                }),
                AmbiguityPolicy::Lenient => {
                    warn!(
                        reference = %reference.value,
                        count,
                        items = ?items,
                        "Knowledge base has multiple entries, recording null"
                    );
                    Ok(None)
                }
            },
        }
    }

    /// First search hit whose label or description contains the name
    async fn locate_by_name(&self, name: &NameRecord, language: &str) -> LocatorResult<Option<String>> {
        let hits = self
            .search
            .search(&name.value, language, self.search_limit)
            .await?;

        for (rank, hit) in hits.iter().enumerate() {
            debug!(rank, id = %hit.id, label = %hit.label, description = %hit.description, "Search hit");
        }

        Ok(hits
            .into_iter()
            .find(|hit| hit.mentions(&name.value))
            .map(|hit| hit.id))
    }
}
