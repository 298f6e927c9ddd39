//! Static place corpus: coordinates, per-category sub-places, transport notes.
//!
//! Loaded once at startup and shared read-only behind an `Arc`. A missing or
//! malformed corpus file degrades to an empty gazetteer; the dialogue still
//! runs, it just never matches a location.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::normalize::normalize;

/// Corpus keys that are not category labels.
const RESERVED_KEYS: [&str; 2] = ["coordinates", "transport"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubPlace {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone)]
pub struct PlaceEntry {
    pub name: String,
    /// (latitude, longitude) in decimal degrees.
    pub coordinates: (f64, f64),
    pub transport: Option<String>,
    categories: Vec<(String, Vec<SubPlace>)>,
}

impl PlaceEntry {
    pub fn categories(&self) -> impl Iterator<Item = (&str, &[SubPlace])> {
        self.categories
            .iter()
            .map(|(key, places)| (key.as_str(), places.as_slice()))
    }

    /// Case-insensitive category lookup. Returns the actual corpus key
    /// together with its sub-places so replies can echo the original casing.
    pub fn subplaces_for(&self, category: &str) -> Option<(&str, &[SubPlace])> {
        let wanted = category.to_lowercase();
        self.categories
            .iter()
            .find(|(key, _)| key.to_lowercase() == wanted)
            .map(|(key, places)| (key.as_str(), places.as_slice()))
    }
}

#[derive(Debug, Default)]
pub struct Gazetteer {
    entries: Vec<PlaceEntry>,
    by_name: HashMap<String, usize>,
}

impl Gazetteer {
    /// Load the corpus from a JSON file. Never fails: any problem is logged
    /// and an empty gazetteer is returned instead.
    pub fn load(path: &Path) -> Self {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Corpus file {} not readable ({}), starting with an empty gazetteer", path.display(), e);
                return Self::default();
            }
        };
        match Self::parse(&raw) {
            Ok(gazetteer) => {
                let sample: Vec<&str> = gazetteer.place_names().take(5).collect();
                tracing::info!(
                    "Loaded {} places from {} (first: {:?})",
                    gazetteer.len(),
                    path.display(),
                    sample
                );
                gazetteer
            }
            Err(e) => {
                tracing::warn!("Corpus file {} is malformed ({}), starting with an empty gazetteer", path.display(), e);
                Self::default()
            }
        }
    }

    /// Parse corpus JSON. Entry order in the file is preserved and defines
    /// gazetteer iteration order.
    pub fn parse(raw: &str) -> Result<Self> {
        let root: serde_json::Map<String, Value> =
            serde_json::from_str(raw).context("corpus root must be a JSON object")?;

        let mut entries = Vec::with_capacity(root.len());
        for (name, value) in root {
            match parse_entry(&name, &value) {
                Some(entry) => entries.push(entry),
                None => {
                    tracing::warn!("Skipping corpus entry {:?}: missing or malformed coordinates", name);
                }
            }
        }
        Ok(Self::from_entries(entries))
    }

    pub fn from_entries(entries: Vec<PlaceEntry>) -> Self {
        let by_name = entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (entry.name.clone(), i))
            .collect();
        Self { entries, by_name }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlaceEntry> {
        self.entries.iter()
    }

    pub fn place_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.name.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&PlaceEntry> {
        self.by_name.get(name).map(|&i| &self.entries[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn coordinates_of(&self, name: &str) -> Option<(f64, f64)> {
        self.get(name).map(|entry| entry.coordinates)
    }

    /// Place names whose normalized form occurs in the normalized prompt,
    /// in gazetteer order.
    pub fn names_contained_in(&self, prompt: &str) -> Vec<String> {
        let haystack = normalize(prompt);
        self.entries
            .iter()
            .filter(|entry| haystack.contains(&normalize(&entry.name)))
            .map(|entry| entry.name.clone())
            .collect()
    }

    /// Lowercased union of category keys across every place.
    pub fn category_vocabulary(&self) -> HashSet<String> {
        self.entries
            .iter()
            .flat_map(|entry| entry.categories().map(|(key, _)| key.to_lowercase()))
            .collect()
    }
}

fn parse_entry(name: &str, value: &Value) -> Option<PlaceEntry> {
    let object = value.as_object()?;

    let coords = object.get("coordinates")?.as_array()?;
    if coords.len() != 2 {
        return None;
    }
    let lat = coords[0].as_f64()?;
    let lng = coords[1].as_f64()?;

    let transport = object
        .get("transport")
        .and_then(Value::as_str)
        .map(str::to_string);

    let mut categories = Vec::new();
    for (key, entry) in object {
        if RESERVED_KEYS.contains(&key.as_str()) || !entry.is_array() {
            continue;
        }
        match serde_json::from_value::<Vec<SubPlace>>(entry.clone()) {
            Ok(places) => categories.push((key.clone(), places)),
            Err(e) => {
                tracing::warn!("Skipping category {:?} of {:?}: {}", key, name, e);
            }
        }
    }

    Some(PlaceEntry {
        name: name.to_string(),
        coordinates: (lat, lng),
        transport,
        categories,
    })
}
