//! In-memory collaborators for engine and API tests
//!
//! `World::weimar()` models one GOV object (Weimar, Thüringen) with the
//! knowledge-base rows, search hits and coordinates needed to resolve it.

#![allow(dead_code)]

use async_trait::async_trait;
use genwiki_locator::config::{AmbiguityPolicy, LocatorSettings};
use genwiki_locator::error::StoreError;
use genwiki_locator::geo::Coordinate;
use genwiki_locator::hierarchy::LocationStore;
use genwiki_locator::types::*;
use genwiki_locator::{Collaborators, Locator};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const WEIMAR_GOV_ID: &str = "WEIMARJO50KX";
pub const WEIMAR: &str = "Q3955";
pub const WEIMAR_REPUBLIC: &str = "Q41304";
pub const GERMANY: &str = "Q183";
pub const THURINGIA: &str = "Q1205";

// ============================================================================
// Gazetteer
// ============================================================================

#[derive(Default)]
pub struct MockGazetteer {
    pub objects: Mutex<HashMap<String, GazetteerObject>>,
    /// Answer every request with a transport error
    pub broken: Mutex<bool>,
    pub calls: AtomicUsize,
}

impl MockGazetteer {
    pub fn insert(&self, object: GazetteerObject) {
        self.objects.lock().unwrap().insert(object.id.clone(), object);
    }
}

#[async_trait]
impl GazetteerSource for MockGazetteer {
    async fn get_object(&self, gov_id: &str) -> Result<GazetteerObject, GazetteerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if *self.broken.lock().unwrap() {
            return Err(GazetteerError::Transport("connection reset".to_string()));
        }
        self.objects
            .lock()
            .unwrap()
            .get(gov_id)
            .cloned()
            .ok_or_else(|| GazetteerError::NotFound(gov_id.to_string()))
    }
}

// ============================================================================
// Knowledge base
// ============================================================================

#[derive(Default)]
pub struct MockKnowledgeBase {
    /// Reference code → items
    pub references: Mutex<HashMap<String, Vec<String>>>,
    pub coordinates: Mutex<HashMap<String, Coordinate>>,
    pub hierarchy: Mutex<HashMap<String, Vec<AdminRow>>>,
    pub parts: Mutex<Vec<PartRecord>>,
    pub lookup_languages: Mutex<Vec<String>>,
    pub coordinate_calls: AtomicUsize,
}

impl MockKnowledgeBase {
    pub fn reference(&self, code: &str, items: &[&str]) {
        self.references
            .lock()
            .unwrap()
            .insert(code.to_string(), items.iter().map(|s| s.to_string()).collect());
    }

    pub fn coordinate(&self, item: &str, lat: f64, lon: f64) {
        self.coordinates
            .lock()
            .unwrap()
            .insert(item.to_string(), Coordinate::new(lat, lon));
    }

    pub fn hierarchy(&self, item: &str, rows: Vec<AdminRow>) {
        self.hierarchy.lock().unwrap().insert(item.to_string(), rows);
    }
}

#[async_trait]
impl KnowledgeBase for MockKnowledgeBase {
    async fn lookup_by_reference(
        &self,
        kind: ReferenceKind,
        code: &str,
        language: &str,
    ) -> Result<Vec<String>, QueryError> {
        if !kind.is_recognized() {
            return Err(QueryError::UnsupportedKind(kind));
        }
        self.lookup_languages.lock().unwrap().push(language.to_string());
        Ok(self
            .references
            .lock()
            .unwrap()
            .get(code)
            .cloned()
            .unwrap_or_default())
    }

    async fn coordinates(&self, items: &[String]) -> Result<HashMap<String, Coordinate>, QueryError> {
        self.coordinate_calls.fetch_add(1, Ordering::SeqCst);
        let known = self.coordinates.lock().unwrap();
        Ok(items
            .iter()
            .filter_map(|item| known.get(item).map(|c| (item.clone(), *c)))
            .collect())
    }

    async fn admin_hierarchy(&self, item: &str, _language: &str) -> Result<Vec<AdminRow>, QueryError> {
        Ok(self
            .hierarchy
            .lock()
            .unwrap()
            .get(item)
            .cloned()
            .unwrap_or_default())
    }

    async fn parts(&self, items: &[String], _language: &str) -> Result<Vec<PartRecord>, QueryError> {
        Ok(self
            .parts
            .lock()
            .unwrap()
            .iter()
            .filter(|p| items.contains(&p.item))
            .cloned()
            .collect())
    }
}

// ============================================================================
// Search
// ============================================================================

#[derive(Default)]
pub struct MockSearch {
    /// (term, language) → hits
    pub hits: Mutex<HashMap<(String, String), Vec<SearchHit>>>,
    /// (term, language, limit) per call
    pub calls: Mutex<Vec<(String, String, usize)>>,
}

impl MockSearch {
    pub fn results(&self, term: &str, language: &str, hits: &[(&str, &str, &str)]) {
        self.hits.lock().unwrap().insert(
            (term.to_string(), language.to_string()),
            hits.iter()
                .map(|(id, label, description)| SearchHit {
                    id: id.to_string(),
                    label: label.to_string(),
                    description: description.to_string(),
                })
                .collect(),
        );
    }
}

#[async_trait]
impl EntitySearch for MockSearch {
    async fn search(
        &self,
        term: &str,
        language: &str,
        limit: usize,
    ) -> Result<Vec<SearchHit>, SearchError> {
        self.calls
            .lock()
            .unwrap()
            .push((term.to_string(), language.to_string(), limit));
        let mut hits = self
            .hits
            .lock()
            .unwrap()
            .get(&(term.to_string(), language.to_string()))
            .cloned()
            .unwrap_or_default();
        hits.truncate(limit);
        Ok(hits)
    }
}

// ============================================================================
// Geocoder
// ============================================================================

#[derive(Default)]
pub struct MockGeocoder {
    pub answers: Mutex<HashMap<String, String>>,
    /// Fail every request with a query error
    pub reject: Mutex<bool>,
    pub calls: AtomicUsize,
}

#[async_trait]
impl Geocoder for MockGeocoder {
    async fn lookup_identifier(&self, text: &str) -> Result<Option<String>, GeocoderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if *self.reject.lock().unwrap() {
            return Err(GeocoderError::Query("malformed query".to_string()));
        }
        Ok(self.answers.lock().unwrap().get(text).cloned())
    }
}

// ============================================================================
// Location store
// ============================================================================

#[derive(Default)]
pub struct MemoryStore {
    pub pages: Mutex<HashMap<String, String>>,
    pub writes: AtomicUsize,
}

impl MemoryStore {
    pub fn page(&self, path: &str) -> Option<String> {
        self.pages.lock().unwrap().get(path).cloned()
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LocationStore for MemoryStore {
    async fn exists(&self, path: &str) -> Result<bool, StoreError> {
        Ok(self.pages.lock().unwrap().contains_key(path))
    }

    async fn read(&self, path: &str) -> Result<Option<String>, StoreError> {
        Ok(self.page(path))
    }

    async fn write(&self, path: &str, markup: &str) -> Result<(), StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.pages
            .lock()
            .unwrap()
            .insert(path.to_string(), markup.to_string());
        Ok(())
    }
}

// ============================================================================
// Fixture
// ============================================================================

pub fn admin_row(level: u32, iso_code: &str, item_label: &str, admin: &str, admin_label: &str) -> AdminRow {
    AdminRow {
        level,
        iso_code: iso_code.to_string(),
        item_label: item_label.to_string(),
        admin: Some(admin.to_string()),
        admin_label: Some(admin_label.to_string()),
    }
}

pub fn gov_object(id: &str, position: Option<(f64, f64)>, references: &[&str], names: &[(&str, &str)]) -> GazetteerObject {
    GazetteerObject {
        id: id.to_string(),
        position: position.map(|(lat, lon)| Coordinate::new(lat, lon)),
        external_references: references.iter().map(|r| ExternalReference::parse(*r)).collect(),
        names: names
            .iter()
            .map(|(language, value)| NameRecord {
                language: language.to_string(),
                value: value.to_string(),
            })
            .collect(),
    }
}

/// All collaborators of one test
#[derive(Default)]
pub struct World {
    pub gazetteer: Arc<MockGazetteer>,
    pub knowledge_base: Arc<MockKnowledgeBase>,
    pub search: Arc<MockSearch>,
    pub geocoder: Arc<MockGeocoder>,
    pub store: Arc<MemoryStore>,
}

impl World {
    /// Weimar: a geonames reference that resolves, a NUTS code that does
    /// not, an ignored reference kind, and two names. The German name search
    /// ranks "Weimarer Republik" first, which literally contains "Weimar".
    pub fn weimar() -> Self {
        let world = World::default();

        world.gazetteer.insert(gov_object(
            WEIMAR_GOV_ID,
            Some((50.9803, 11.3292)),
            &["geonames:2812482", "NUTS2003:DEG05", "opengeodb:99423"],
            &[("deu", "Weimar"), ("pol", "Wejmar")],
        ));

        let kb = &world.knowledge_base;
        kb.reference("2812482", &[WEIMAR]);
        kb.coordinate(WEIMAR, 50.9794, 11.3235);
        kb.coordinate(WEIMAR_REPUBLIC, 52.5200, 13.4050);
        kb.coordinate(GERMANY, 51.0, 10.0);
        kb.coordinate(THURINGIA, 50.8614, 11.0522);
        kb.hierarchy(
            WEIMAR,
            vec![
                admin_row(3, "DE", "Weimar", GERMANY, "Deutschland"),
                admin_row(4, "DE-TH", "Weimar", THURINGIA, "Thüringen"),
            ],
        );

        world.search.results(
            "Weimar",
            "de",
            &[
                (WEIMAR_REPUBLIC, "Weimarer Republik", "Staat im Deutschen Reich 1918-1933"),
                (WEIMAR, "Weimar", "Stadt in Thüringen"),
            ],
        );

        world
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            gazetteer: self.gazetteer.clone(),
            knowledge_base: self.knowledge_base.clone(),
            search: self.search.clone(),
            geocoder: self.geocoder.clone(),
            store: self.store.clone(),
        }
    }

    pub fn locator(&self) -> Locator {
        Locator::new(self.collaborators(), &LocatorSettings::default())
    }

    pub fn lenient_locator(&self) -> Locator {
        let settings = LocatorSettings {
            ambiguity: AmbiguityPolicy::Lenient,
            ..Default::default()
        };
        Locator::new(self.collaborators(), &settings)
    }
}
