//! Hierarchy Path Resolver
//!
//! Turns a winning candidate into a canonical location path such as
//! `DE/TH/Weimar` and materializes location pages for the leaf and its
//! administrative ancestors.
//!
//! The path comes from the level-4 row of the candidate's administrative
//! hierarchy: its ISO code with `-` replaced by `/`, then the item label.

use crate::error::{LocatorError, LocatorResult};
use crate::geo::Coordinate;
use crate::hierarchy::location_store::LocationStore;
use crate::types::{AdminRow, KnowledgeBase, PartRecord};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Hierarchy level of a leaf location
pub const LEAF_LEVEL: u32 = 5;

/// Hierarchy level that determines the path
const PATH_LEVEL: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LocationKind {
    Country,
    Region,
    City,
}

impl LocationKind {
    pub fn from_level(level: u32) -> Option<Self> {
        match level {
            3 => Some(LocationKind::Country),
            4 => Some(LocationKind::Region),
            5 => Some(LocationKind::City),
            _ => None,
        }
    }
}

impl fmt::Display for LocationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LocationKind::Country => "Country",
            LocationKind::Region => "Region",
            LocationKind::City => "City",
        };
        f.write_str(name)
    }
}

/// Structured record of one location page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationRecord {
    pub path: String,
    pub name: String,
    pub coordinates: Option<Coordinate>,
    pub item: String,
    pub kind: LocationKind,
    pub level: u32,
    pub part_of: String,
}

impl LocationRecord {
    /// `{{Location ...}}` page markup
    pub fn to_markup(&self) -> String {
        let coordinates = self
            .coordinates
            .map(|c| format!("{},{}", c.lat, c.lon))
            .unwrap_or_default();
        format!(
            "{{{{Location\n|path={}\n|name={}\n|coordinates={}\n|wikidataid={}\n|locationKind={}\n|level={}\n|partOf={}\n}}}}\n",
            self.path, self.name, coordinates, self.item, self.kind, self.level, self.part_of
        )
    }
}

/// Leaf location: parent path from the ISO code, name from the item label
///
/// The name is kept whole even when it contains `/` (`Biel/Bienne`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeafPath {
    pub parent: String,
    pub name: String,
}

impl LeafPath {
    /// Full path, `<parent>/<name>`
    pub fn path(&self) -> String {
        format!("{}/{}", self.parent, self.name)
    }
}

/// Leaf path from hierarchy rows; the last level-4 row wins
pub fn leaf_path(rows: &[AdminRow]) -> Option<LeafPath> {
    rows.iter()
        .rev()
        .find(|row| row.level == PATH_LEVEL)
        .map(|row| LeafPath {
            parent: iso_path(&row.iso_code),
            name: row.item_label.clone(),
        })
}

/// Canonical path from hierarchy rows (`DE/TH/Weimar`)
pub fn to_path(rows: &[AdminRow]) -> Option<String> {
    leaf_path(rows).map(|leaf| leaf.path())
}

/// Path of an administrative unit (`DE-TH` → `DE/TH`)
fn iso_path(iso_code: &str) -> String {
    iso_code.replace('-', "/")
}

pub struct PathResolver {
    knowledge_base: Arc<dyn KnowledgeBase>,
    store: Arc<dyn LocationStore>,
    language: String,
}

impl PathResolver {
    pub fn new(knowledge_base: Arc<dyn KnowledgeBase>, store: Arc<dyn LocationStore>) -> Self {
        Self {
            knowledge_base,
            store,
            language: "de".to_string(),
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Administrative ancestor rows of an item
    pub async fn hierarchy(&self, item: &str) -> LocatorResult<Vec<AdminRow>> {
        Ok(self
            .knowledge_base
            .admin_hierarchy(item, &self.language)
            .await?)
    }

    /// Path for an item, `None` without a level-4 ancestor
    pub async fn path_for(&self, item: &str) -> LocatorResult<Option<String>> {
        let rows = self.hierarchy(item).await?;
        let path = to_path(&rows);
        debug!(item = %item, path = ?path, rows = rows.len(), "Path resolved");
        Ok(path)
    }

    /// `has part` relations for a set of items
    pub async fn parts_of(&self, items: &[String]) -> LocatorResult<Vec<PartRecord>> {
        Ok(self.knowledge_base.parts(items, &self.language).await?)
    }

    /// Write the location page unless it exists; `force` rewrites it
    ///
    /// Returns whether the page was written.
    pub async fn ensure_location_page(
        &self,
        path: &str,
        item: &str,
        name: &str,
        part_of: &str,
        level: u32,
        force: bool,
    ) -> LocatorResult<bool> {
        let kind = LocationKind::from_level(level).ok_or(LocatorError::InvalidLevel(level))?;
        if path.is_empty() {
            return Err(LocatorError::InvalidPath(path.to_string()));
        }

        if !force && self.store.exists(path).await? {
            debug!(path = %path, "Location page exists");
            return Ok(false);
        }

        let coordinates = self
            .knowledge_base
            .coordinates(&[item.to_string()])
            .await?
            .remove(item);
        if coordinates.is_none() {
            warn!(item = %item, path = %path, "No coordinates for location");
        }

        let record = LocationRecord {
            path: path.to_string(),
            name: name.to_string(),
            coordinates,
            item: item.to_string(),
            kind,
            level,
            part_of: part_of.to_string(),
        };
        self.store.write(path, &record.to_markup()).await?;

        info!(path = %path, item = %item, kind = %kind, "Location page written");
        Ok(true)
    }

    /// Materialize the leaf (level 5) and its intermediate admin units
    ///
    /// Rows without an ancestor id or with a level that has no location kind
    /// are skipped. Returns the paths written.
    pub async fn ensure_hierarchy(
        &self,
        leaf: &LeafPath,
        item: &str,
        rows: &[AdminRow],
        force: bool,
    ) -> LocatorResult<Vec<String>> {
        let mut written = Vec::new();
        let leaf_path = leaf.path();
        let mut seen = vec![leaf_path.clone()];

        if self
            .ensure_location_page(&leaf_path, item, &leaf.name, &leaf.parent, LEAF_LEVEL, force)
            .await?
        {
            written.push(leaf_path);
        }

        for row in rows {
            let Some(record) = row.hierarchy_record() else {
                debug!(level = row.level, iso_code = %row.iso_code, "Hierarchy row without admin unit");
                continue;
            };
            if LocationKind::from_level(record.level).is_none() {
                warn!(level = record.level, item = %record.item, "Skipping hierarchy row with unknown level");
                continue;
            }

            let path = iso_path(&record.iso_code);
            if path.is_empty() || seen.contains(&path) {
                continue;
            }
            if self
                .ensure_location_page(
                    &path,
                    &record.item,
                    &record.label,
                    &record.parent_path,
                    record.level,
                    force,
                )
                .await?
            {
                written.push(path.clone());
            }
            seen.push(path);
        }

        Ok(written)
    }
}
