// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::geo::GeoPoint;
use crate::HudError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// A point of interest. Immutable once loaded; `name` is its identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub name: String,
    pub position: GeoPoint,
    pub tag: String,
    pub description: String,
}

/// A raw catalog entry as handed over by an external loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetRecord {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub tag: String,
    #[serde(default)]
    pub description: String,
}

impl TargetRecord {
    pub fn new(name: &str, lat: f64, lon: f64, tag: &str) -> Self {
        Self {
            name: name.to_string(),
            lat,
            lon,
            tag: tag.to_string(),
            description: String::new(),
        }
    }

    fn into_target(self) -> Result<Target, HudError> {
        let position = GeoPoint::new(self.lat, self.lon);
        if !position.is_valid() {
            return Err(HudError::MalformedCoordinate {
                name: self.name,
                lat: self.lat,
                lon: self.lon,
            });
        }
        Ok(Target {
            name: self.name,
            position,
            tag: self.tag,
            description: self.description,
        })
    }
}

/// The catalog file shape: target records plus an optional onboarding message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogDocument {
    #[serde(default, rename = "permissionMessage")]
    pub permission_message: Option<String>,
    pub targets: Vec<TargetRecord>,
}

/// Read-only set of targets, in load order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    targets: Vec<Target>,
    index: HashMap<String, usize>,
}

impl Catalog {
    /// Builds a catalog, failing on the first duplicate name or malformed coordinate.
    pub fn load<I>(records: I) -> Result<Self, HudError>
    where
        I: IntoIterator<Item = TargetRecord>,
    {
        let mut catalog = Catalog::default();
        for record in records {
            let target = record.into_target()?;
            catalog.insert(target)?;
        }
        log::debug!("Catalog loaded — targets={}", catalog.len());
        Ok(catalog)
    }

    /// Like [`Catalog::load`], but records with malformed coordinates are skipped
    /// and returned alongside the catalog. Duplicate names still fail the load.
    pub fn load_lenient<I>(records: I) -> Result<(Self, Vec<HudError>), HudError>
    where
        I: IntoIterator<Item = TargetRecord>,
    {
        let mut catalog = Catalog::default();
        let mut skipped = Vec::new();
        for record in records {
            match record.into_target() {
                Ok(target) => catalog.insert(target)?,
                Err(e) => {
                    log::warn!("Skipping catalog record — {}", e);
                    skipped.push(e);
                }
            }
        }
        log::debug!(
            "Catalog loaded (lenient) — targets={} skipped={}",
            catalog.len(),
            skipped.len()
        );
        Ok((catalog, skipped))
    }

    fn insert(&mut self, target: Target) -> Result<(), HudError> {
        if self.index.contains_key(&target.name) {
            return Err(HudError::DuplicateKey(target.name));
        }
        self.index.insert(target.name.clone(), self.targets.len());
        self.targets.push(target);
        Ok(())
    }

    /// Targets whose tag is in `selected`; an empty selection means the whole catalog.
    pub fn filter_by_tags(&self, selected: &BTreeSet<String>) -> Vec<&Target> {
        if selected.is_empty() {
            return self.targets.iter().collect();
        }
        self.targets
            .iter()
            .filter(|t| selected.contains(&t.tag))
            .collect()
    }

    /// Distinct tags, sorted.
    pub fn tags(&self) -> Vec<&str> {
        let tags: BTreeSet<&str> = self.targets.iter().map(|t| t.tag.as_str()).collect();
        tags.into_iter().collect()
    }

    pub fn get(&self, name: &str) -> Option<&Target> {
        self.index.get(name).map(|&i| &self.targets[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Target> {
        self.targets.iter()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}
