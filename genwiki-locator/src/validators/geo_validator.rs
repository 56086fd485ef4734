//! Geospatial Validator
//!
//! Drops evidence whose candidate lies too far from the position reported by
//! the gazetteer.
//!
//! # Rules
//! - No gazetteer object: evidence is returned unchanged
//! - Null candidates are always removed
//! - Missing gazetteer position: warning, nothing else is removed
//! - Known candidate coordinate: kept when `distance <= max_distance_km`
//! - Unknown candidate coordinate: kept
//!
//! Validation only removes entries. Order of the survivors is unchanged.

use crate::error::LocatorResult;
use crate::evidence::EvidenceMap;
use crate::types::{GazetteerObject, KnowledgeBase};
use std::sync::Arc;
use tracing::{debug, warn};

/// Default acceptance radius
pub const DEFAULT_MAX_DISTANCE_KM: f64 = 3.0;

pub struct GeoValidator {
    knowledge_base: Arc<dyn KnowledgeBase>,
    max_distance_km: f64,
}

impl GeoValidator {
    pub fn new(knowledge_base: Arc<dyn KnowledgeBase>) -> Self {
        Self {
            knowledge_base,
            max_distance_km: DEFAULT_MAX_DISTANCE_KM,
        }
    }

    pub fn with_max_distance_km(mut self, max_distance_km: f64) -> Self {
        self.max_distance_km = max_distance_km;
        self
    }

    pub fn max_distance_km(&self) -> f64 {
        self.max_distance_km
    }

    /// Validated copy of `evidence`
    ///
    /// # Errors
    /// Knowledge-base failures while fetching candidate coordinates.
    pub async fn validate(
        &self,
        object: Option<&GazetteerObject>,
        evidence: &EvidenceMap,
    ) -> LocatorResult<EvidenceMap> {
        let Some(object) = object else {
            return Ok(evidence.clone());
        };

        let Some(position) = object.position else {
            warn!(gov_id = %object.id, "Gazetteer object has no valid position, skipping distance check");
            return Ok(evidence.filtered(|_, candidate| candidate.is_some()));
        };

        let candidates = evidence.candidates();
        let coordinates = if candidates.is_empty() {
            Default::default()
        } else {
            self.knowledge_base.coordinates(&candidates).await?
        };

        let validated = evidence.filtered(|key, candidate| {
            let Some(candidate) = candidate else {
                return false;
            };
            match coordinates.get(candidate) {
                Some(coordinate) => {
                    let distance = position.distance_km(coordinate);
                    let ok = distance <= self.max_distance_km;
                    debug!(
                        key = %key,
                        candidate = %candidate,
                        distance_km = distance,
                        accepted = ok,
                        "Distance check"
                    );
                    ok
                }
                None => true,
            }
        });

        debug!(
            gov_id = %object.id,
            before = evidence.len(),
            after = validated.len(),
            "Evidence validated"
        );

        Ok(validated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Coordinate;
    use crate::types::{AdminRow, PartRecord, QueryError, ReferenceKind};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubKnowledgeBase {
        coordinates: HashMap<String, Coordinate>,
        coordinate_calls: AtomicUsize,
    }

    impl StubKnowledgeBase {
        fn new(coordinates: &[(&str, Coordinate)]) -> Arc<Self> {
            Arc::new(Self {
                coordinates: coordinates
                    .iter()
                    .map(|(k, c)| (k.to_string(), *c))
                    .collect(),
                coordinate_calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait::async_trait]
    impl KnowledgeBase for StubKnowledgeBase {
        async fn lookup_by_reference(
            &self,
            _kind: ReferenceKind,
            _code: &str,
            _language: &str,
        ) -> Result<Vec<String>, QueryError> {
            Ok(Vec::new())
        }

        async fn coordinates(&self, items: &[String]) -> Result<HashMap<String, Coordinate>, QueryError> {
            self.coordinate_calls.fetch_add(1, Ordering::SeqCst);
            Ok(items
                .iter()
                .filter_map(|i| self.coordinates.get(i).map(|c| (i.clone(), *c)))
                .collect())
        }

        async fn admin_hierarchy(&self, _item: &str, _language: &str) -> Result<Vec<AdminRow>, QueryError> {
            Ok(Vec::new())
        }

        async fn parts(&self, _items: &[String], _language: &str) -> Result<Vec<PartRecord>, QueryError> {
            Ok(Vec::new())
        }
    }

    fn object_at(position: Option<Coordinate>) -> GazetteerObject {
        GazetteerObject {
            id: "TESTOBJ".to_string(),
            position,
            external_references: Vec::new(),
            names: Vec::new(),
        }
    }

    const ORIGIN: Coordinate = Coordinate { lat: 50.0, lon: 11.0 };

    #[tokio::test]
    async fn test_absent_object_leaves_map_unchanged() {
        let kb = StubKnowledgeBase::new(&[]);
        let validator = GeoValidator::new(kb.clone());
        let evidence: EvidenceMap = vec![("a", Some("Q1")), ("b", None)].into_iter().collect();

        let validated = validator.validate(None, &evidence).await.unwrap();

        assert_eq!(validated, evidence);
        assert_eq!(kb.coordinate_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_position_removes_only_nulls() {
        let kb = StubKnowledgeBase::new(&[("Q1", Coordinate::new(-30.0, 100.0))]);
        let validator = GeoValidator::new(kb.clone());
        let evidence: EvidenceMap = vec![("a", Some("Q1")), ("b", None), ("c", Some("Q2"))]
            .into_iter()
            .collect();

        let validated = validator
            .validate(Some(&object_at(None)), &evidence)
            .await
            .unwrap();

        assert_eq!(validated.keys().collect::<Vec<_>>(), vec!["a", "c"]);
        assert_eq!(kb.coordinate_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_far_candidates_removed_unknown_kept() {
        let near = Coordinate::new(50.01, 11.0);
        let far = Coordinate::new(50.5, 11.0);
        let kb = StubKnowledgeBase::new(&[("Q1", near), ("Q2", far)]);
        let validator = GeoValidator::new(kb);
        let evidence: EvidenceMap = vec![
            ("far", Some("Q2")),
            ("near", Some("Q1")),
            ("unknown", Some("Q3")),
            ("null", None),
        ]
        .into_iter()
        .collect();

        let validated = validator
            .validate(Some(&object_at(Some(ORIGIN))), &evidence)
            .await
            .unwrap();

        assert_eq!(validated.keys().collect::<Vec<_>>(), vec!["near", "unknown"]);
        assert_eq!(evidence.len(), 4);
    }

    #[tokio::test]
    async fn test_distance_threshold_is_inclusive() {
        let candidate = Coordinate::new(50.02, 11.01);
        let exact = ORIGIN.distance_km(&candidate);
        let kb = StubKnowledgeBase::new(&[("Q1", candidate)]);
        let evidence: EvidenceMap = vec![("a", Some("Q1"))].into_iter().collect();
        let object = object_at(Some(ORIGIN));

        let at_limit = GeoValidator::new(kb.clone()).with_max_distance_km(exact);
        assert_eq!(at_limit.validate(Some(&object), &evidence).await.unwrap().len(), 1);

        let below_limit = GeoValidator::new(kb).with_max_distance_km(exact - 1e-9);
        assert!(below_limit.validate(Some(&object), &evidence).await.unwrap().is_empty());
    }
}
