use crate::{EditorError, statics};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Compound identity of a unit record. `id` alone is only unique within a type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitKey {
    #[serde(rename = "type")]
    pub unit_type: String,
    pub id: i64,
}

impl UnitKey {
    pub fn new(unit_type: impl Into<String>, id: i64) -> Self {
        Self {
            unit_type: unit_type.into(),
            id,
        }
    }
}

impl fmt::Display for UnitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", group_label(&self.unit_type), self.id)
    }
}

/// Catalog label for a unit type; untyped units are grouped together.
pub fn group_label(unit_type: &str) -> &str {
    if unit_type.is_empty() {
        statics::GROUP_OTHER
    } else {
        unit_type
    }
}

/// One key/value/comment line of a unit. `ukey` is assigned once and never
/// derived from the other fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPropertyEntry")]
pub struct PropertyEntry {
    ukey: String,
    key: String,
    value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
}

#[derive(Deserialize)]
struct RawPropertyEntry {
    ukey: String,
    key: String,
    value: String,
    #[serde(default)]
    comment: Option<String>,
}

impl TryFrom<RawPropertyEntry> for PropertyEntry {
    type Error = EditorError;

    fn try_from(raw: RawPropertyEntry) -> Result<Self, Self::Error> {
        PropertyEntry::new(raw.ukey, raw.key, raw.value, raw.comment)
    }
}

impl PropertyEntry {
    pub fn new(
        ukey: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
        comment: Option<String>,
    ) -> Result<Self, EditorError> {
        let ukey = ukey.into();
        if ukey.trim().is_empty() {
            return Err(EditorError::InvalidRecord(
                statics::EN_ERR_EMPTY_UKEY.to_string(),
            ));
        }
        Ok(Self {
            ukey,
            key: key.into(),
            value: value.into(),
            comment: comment.filter(|c| !c.is_empty()),
        })
    }

    /// A freshly added, still empty line.
    pub fn blank(ukey: impl Into<String>) -> Result<Self, EditorError> {
        Self::new(ukey, "", "", None)
    }

    pub fn ukey(&self) -> &str {
        &self.ukey
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// The persisted part of the entry, without its ukey.
    pub fn content(&self) -> (&str, &str, Option<&str>) {
        (&self.key, &self.value, self.comment())
    }

    pub(crate) fn set(&mut self, field: PropertyField, value: String) {
        match field {
            PropertyField::Key => self.key = value,
            PropertyField::Value => self.value = value,
            PropertyField::Comment => self.comment = Some(value).filter(|c| !c.is_empty()),
        }
    }
}

/// Editable fields of a [`PropertyEntry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyField {
    Key,
    Value,
    Comment,
}

impl FromStr for PropertyField {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "key" => Ok(Self::Key),
            "value" => Ok(Self::Value),
            "comment" => Ok(Self::Comment),
            other => Err(EditorError::InvalidField(format!(
                "unknown property field `{other}`"
            ))),
        }
    }
}

/// Identity and naming fields of a [`UnitRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BasicField {
    Name,
    Id,
    Type,
}

impl fmt::Display for BasicField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BasicField::Name => "name",
            BasicField::Id => "id",
            BasicField::Type => "type",
        })
    }
}

impl FromStr for BasicField {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Self::Name),
            "id" => Ok(Self::Id),
            "type" => Ok(Self::Type),
            other => Err(EditorError::InvalidField(format!(
                "unknown unit field `{other}`"
            ))),
        }
    }
}

/// A unit of the rules store with its properties in source order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawUnitRecord")]
pub struct UnitRecord {
    #[serde(rename = "type")]
    unit_type: String,
    id: i64,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ui_name: Option<String>,
    properties: Vec<PropertyEntry>,
}

#[derive(Deserialize)]
struct RawUnitRecord {
    #[serde(rename = "type")]
    unit_type: String,
    id: i64,
    name: String,
    #[serde(default)]
    ui_name: Option<String>,
    #[serde(default)]
    properties: Vec<PropertyEntry>,
}

impl TryFrom<RawUnitRecord> for UnitRecord {
    type Error = EditorError;

    fn try_from(raw: RawUnitRecord) -> Result<Self, Self::Error> {
        UnitRecord::with_properties(raw.unit_type, raw.id, raw.name, raw.ui_name, raw.properties)
    }
}

impl UnitRecord {
    /// A record without properties, as built by the new-unit flow.
    pub fn new(unit_type: impl Into<String>, id: i64, name: impl Into<String>) -> Self {
        Self {
            unit_type: unit_type.into(),
            id,
            name: name.into(),
            ui_name: None,
            properties: Vec::new(),
        }
    }

    pub fn with_properties(
        unit_type: impl Into<String>,
        id: i64,
        name: impl Into<String>,
        ui_name: Option<String>,
        properties: Vec<PropertyEntry>,
    ) -> Result<Self, EditorError> {
        let mut record = Self::new(unit_type, id, name).with_ui_name(ui_name);
        for entry in properties {
            record.push_property(entry)?;
        }
        Ok(record)
    }

    pub fn with_ui_name(mut self, ui_name: Option<String>) -> Self {
        self.ui_name = ui_name.filter(|n| !n.is_empty());
        self
    }

    pub fn unit_type(&self) -> &str {
        &self.unit_type
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ui_name(&self) -> Option<&str> {
        self.ui_name.as_deref()
    }

    pub fn display_name(&self) -> &str {
        self.ui_name().unwrap_or(&self.name)
    }

    pub fn properties(&self) -> &[PropertyEntry] {
        &self.properties
    }

    pub fn key(&self) -> UnitKey {
        UnitKey::new(self.unit_type.clone(), self.id)
    }

    pub fn summary(&self) -> UnitSummary {
        UnitSummary {
            unit_type: self.unit_type.clone(),
            id: self.id,
            name: self.name.clone(),
            ui_name: self.ui_name.clone(),
        }
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub(crate) fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    pub(crate) fn set_unit_type(&mut self, unit_type: String) {
        self.unit_type = unit_type;
    }

    pub(crate) fn push_property(&mut self, entry: PropertyEntry) -> Result<(), EditorError> {
        if self.properties.iter().any(|p| p.ukey == entry.ukey) {
            return Err(EditorError::InvalidRecord(format!(
                "duplicate property ukey `{}`",
                entry.ukey
            )));
        }
        self.properties.push(entry);
        Ok(())
    }

    pub(crate) fn property_mut(&mut self, index: usize) -> Option<&mut PropertyEntry> {
        self.properties.get_mut(index)
    }

    pub(crate) fn remove_property(&mut self, index: usize) -> Option<PropertyEntry> {
        (index < self.properties.len()).then(|| self.properties.remove(index))
    }
}

/// A unit as listed by the catalog: identity and names only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitSummary {
    #[serde(rename = "type")]
    pub unit_type: String,
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ui_name: Option<String>,
}

impl UnitSummary {
    pub fn key(&self) -> UnitKey {
        UnitKey::new(self.unit_type.clone(), self.id)
    }

    pub fn display_name(&self) -> &str {
        self.ui_name.as_deref().unwrap_or(&self.name)
    }
}

/// Advisory schema entry for a unit type, used only for suggestions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertySchemaEntry {
    pub key: String,
    #[serde(default)]
    pub description: String,
}
