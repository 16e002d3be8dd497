use crate::{PropertySchemaEntry, statics};
use anyhow::Context;
use indexmap::IndexMap;
use serde::Deserialize;
use std::{collections::HashMap, fs, path::Path};

/// A schema line as written in the schema document: one key and its
/// description in several languages.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchemaProperty {
    pub key: String,
    #[serde(default)]
    pub desc: IndexMap<String, String>,
}

impl SchemaProperty {
    fn entry(&self, language: &str) -> PropertySchemaEntry {
        let description = self
            .desc
            .get(language)
            .or_else(|| self.desc.get(statics::DEFAULT_LANGUAGE))
            .or_else(|| self.desc.values().next())
            .cloned()
            .unwrap_or_default();
        PropertySchemaEntry {
            key: self.key.clone(),
            description,
        }
    }
}

/// The layered schema document. Shared sections are concatenated in front of
/// the type-specific one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PropertySchema {
    #[serde(default)]
    pub unit: Vec<SchemaProperty>,
    #[serde(default)]
    pub moving_unit: Vec<SchemaProperty>,
    #[serde(default)]
    pub infantry: Vec<SchemaProperty>,
    #[serde(default)]
    pub vehicle: Vec<SchemaProperty>,
    #[serde(default)]
    pub aircraft: Vec<SchemaProperty>,
    #[serde(default)]
    pub building: Vec<SchemaProperty>,
}

impl PropertySchema {
    pub fn parse_json5(text: &str) -> anyhow::Result<Self> {
        Ok(json5::from_str::<PropertySchema>(text)?)
    }

    pub fn load_path(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path).with_context(|| format!("reading {path:?}"))?;
        Self::parse_json5(&text).with_context(|| format!("parsing schema {path:?}"))
    }

    /// Sections that make up the schema of `unit_type`, in display order.
    fn layers(&self, unit_type: &str) -> Vec<&[SchemaProperty]> {
        match unit_type {
            statics::UNIT_TYPE_INFANTRY => vec![
                self.unit.as_slice(),
                self.moving_unit.as_slice(),
                self.infantry.as_slice(),
            ],
            statics::UNIT_TYPE_VEHICLE => vec![
                self.unit.as_slice(),
                self.moving_unit.as_slice(),
                self.vehicle.as_slice(),
            ],
            statics::UNIT_TYPE_AIRCRAFT => vec![
                self.unit.as_slice(),
                self.moving_unit.as_slice(),
                self.aircraft.as_slice(),
            ],
            statics::UNIT_TYPE_BUILDING => vec![self.unit.as_slice(), self.building.as_slice()],
            _ => Vec::new(),
        }
    }

    pub fn properties_for(&self, unit_type: &str, language: &str) -> Vec<PropertySchemaEntry> {
        self.layers(unit_type)
            .into_iter()
            .flatten()
            .map(|p| p.entry(language))
            .collect()
    }
}

/// Case-insensitive substring match of `input` against each candidate key.
pub fn filter_suggestions<'a>(
    candidates: &'a [PropertySchemaEntry],
    input: &str,
) -> Vec<&'a PropertySchemaEntry> {
    let needle = input.trim().to_lowercase();
    candidates
        .iter()
        .filter(|c| c.key.to_lowercase().contains(&needle))
        .collect()
}

/// Per-type cache of the available properties, fetched on first use.
#[derive(Debug, Default)]
pub struct PropertySchemaCache {
    by_type: HashMap<String, Vec<PropertySchemaEntry>>,
}

impl PropertySchemaCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, unit_type: &str) -> bool {
        self.by_type.contains_key(unit_type)
    }

    pub fn get(&self, unit_type: &str) -> Option<&[PropertySchemaEntry]> {
        self.by_type.get(unit_type).map(Vec::as_slice)
    }

    pub fn insert(&mut self, unit_type: impl Into<String>, entries: Vec<PropertySchemaEntry>) {
        self.by_type.insert(unit_type.into(), entries);
    }

    pub fn suggest(&self, unit_type: &str, input: &str) -> Vec<&PropertySchemaEntry> {
        self.get(unit_type)
            .map(|entries| filter_suggestions(entries, input))
            .unwrap_or_default()
    }

    pub fn describe(&self, unit_type: &str, key: &str) -> Option<&str> {
        self.get(unit_type)?
            .iter()
            .find(|e| e.key == key)
            .map(|e| e.description.as_str())
            .filter(|d| !d.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::{PropertySchema, PropertySchemaCache, filter_suggestions};
    use crate::PropertySchemaEntry;

    const DOC: &str = r#"{
  // shared by everything
  unit: [ { key: "Strength", desc: { en: "Hit points", zh: "生命值" } } ],
  moving_unit: [ { key: "Speed", desc: { en: "Movement speed" } } ],
  infantry: [ { key: "Ammo", desc: { zh: "弹药" } } ],
  building: [ { key: "Power" } ],
}"#;

    fn entry(key: &str) -> PropertySchemaEntry {
        PropertySchemaEntry {
            key: key.to_string(),
            description: String::new(),
        }
    }

    #[test]
    fn layers_concatenate_per_type() {
        let schema = PropertySchema::parse_json5(DOC).unwrap();

        let infantry: Vec<_> = schema
            .properties_for("infantry", "en")
            .into_iter()
            .map(|e| e.key)
            .collect();
        assert_eq!(infantry, ["Strength", "Speed", "Ammo"]);

        let building: Vec<_> = schema
            .properties_for("building", "en")
            .into_iter()
            .map(|e| e.key)
            .collect();
        assert_eq!(building, ["Strength", "Power"]);

        assert!(schema.properties_for("", "en").is_empty());
    }

    #[test]
    fn description_language_falls_back() {
        let schema = PropertySchema::parse_json5(DOC).unwrap();
        let zh = schema.properties_for("infantry", "zh");
        assert_eq!(zh[0].description, "生命值");
        // no zh text: falls back to en
        assert_eq!(zh[1].description, "Movement speed");

        let en = schema.properties_for("infantry", "en");
        // no en text: first available
        assert_eq!(en[2].description, "弹药");
    }

    #[test]
    fn filter_is_case_insensitive_substring() {
        let candidates = vec![entry("Ammo"), entry("Armor"), entry("PrimaryWeapon")];
        let hits: Vec<_> = filter_suggestions(&candidates, "amo")
            .into_iter()
            .map(|e| e.key.as_str())
            .collect();
        assert_eq!(hits, ["Ammo"]);

        let hits: Vec<_> = filter_suggestions(&candidates, "AR")
            .into_iter()
            .map(|e| e.key.as_str())
            .collect();
        assert_eq!(hits, ["Armor", "PrimaryWeapon"]);

        assert_eq!(filter_suggestions(&candidates, "").len(), 3);
    }

    #[test]
    fn cache_answers_descriptions() {
        let mut cache = PropertySchemaCache::new();
        cache.insert(
            "infantry",
            vec![PropertySchemaEntry {
                key: "Ammo".to_string(),
                description: "Rounds before reload".to_string(),
            }],
        );
        assert_eq!(
            cache.describe("infantry", "Ammo"),
            Some("Rounds before reload")
        );
        assert_eq!(cache.describe("infantry", "Cost"), None);
        assert!(cache.suggest("vehicle", "a").is_empty());
    }
}
