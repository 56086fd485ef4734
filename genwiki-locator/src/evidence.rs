//! Evidence map: evidence key → candidate id (or null), in insertion order
//!
//! Keys name the source that produced a candidate: an external reference
//! value (`geonames:3092080`), a name search (`gov-Weimar@de`) or the
//! free-text fallback (`nominatim`). Order is significant: it is the tie
//! breaker for ranking.

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Key used for the free-text geocoder fallback
pub const NOMINATIM_KEY: &str = "nominatim";

/// Evidence key for a name search
pub fn name_key(name: &str, language: &str) -> String {
    format!("gov-{}@{}", name, language)
}

/// Ordered evidence collection with unique keys
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvidenceMap {
    entries: Vec<(String, Option<String>)>,
}

impl EvidenceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite. An overwritten key keeps its original position.
    pub fn insert(&mut self, key: impl Into<String>, candidate: Option<String>) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = candidate,
            None => self.entries.push((key, candidate)),
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Candidate for a key; `Some(None)` for a key recorded as null
    pub fn get(&self, key: &str) -> Option<Option<&str>> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_deref())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Distinct non-null candidates in first-seen order
    pub fn candidates(&self) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        for (_, candidate) in &self.entries {
            if let Some(candidate) = candidate {
                if !seen.contains(candidate) {
                    seen.push(candidate.clone());
                }
            }
        }
        seen
    }

    /// First entry with a non-null candidate
    pub fn first_candidate(&self) -> Option<(&str, &str)> {
        self.entries
            .iter()
            .find_map(|(k, v)| v.as_deref().map(|v| (k.as_str(), v)))
    }

    /// Keep only entries matching the predicate; order of the rest is unchanged
    pub fn filtered<F>(&self, mut keep: F) -> EvidenceMap
    where
        F: FnMut(&str, Option<&str>) -> bool,
    {
        EvidenceMap {
            entries: self
                .entries
                .iter()
                .filter(|(k, v)| keep(k, v.as_deref()))
                .cloned()
                .collect(),
        }
    }

    pub(crate) fn entries(&self) -> &[(String, Option<String>)] {
        &self.entries
    }

    pub(crate) fn from_entries(entries: Vec<(String, Option<String>)>) -> Self {
        Self { entries }
    }
}

impl<K, V> FromIterator<(K, Option<V>)> for EvidenceMap
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, Option<V>)>>(iter: I) -> Self {
        let mut map = EvidenceMap::new();
        for (key, value) in iter {
            map.insert(key, value.map(Into::into));
        }
        map
    }
}

/// Serialized as a JSON object in evidence order
impl Serialize for EvidenceMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
