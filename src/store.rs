//! A file-backed [`PersistenceGateway`].
//!
//! The store keeps the whole unit list in memory and reads/writes it as one
//! JSON5 document, optionally gzip-compressed. Property ukeys are not stored:
//! every fetch hands out fresh ones.
//!
//! A document may carry read-only `base` units. User units with the same key
//! override them; base units cannot be deleted.

use crate::{
    GatewayError, PersistenceGateway, PropertyEntry, PropertySchema, PropertySchemaEntry, UnitKey,
    UnitRecord, gateway::GatewayResult, statics,
};
use anyhow::Context;
use async_trait::async_trait;
use flate2::{Compression, GzBuilder, read::GzDecoder};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    io::{Read, Write},
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard, PoisonError},
};
use tracing::{debug, info};
use ulid::Ulid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreFormat {
    Json5,
    GzipJson5,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredProperty {
    pub key: String,
    #[serde(default)]
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredUnit {
    #[serde(rename = "type")]
    pub unit_type: String,
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub properties: Vec<StoredProperty>,
}

impl StoredUnit {
    fn key(&self) -> UnitKey {
        UnitKey::new(self.unit_type.clone(), self.id)
    }

    fn key_matches(&self, key: &UnitKey) -> bool {
        self.unit_type == key.unit_type && self.id == key.id
    }

    fn property(&self, key: &str) -> Option<&StoredProperty> {
        self.properties.iter().find(|p| p.key == key)
    }
}

/// The on-disk shape of a store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreDocument {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub base: Vec<StoredUnit>,
    #[serde(default)]
    pub units: Vec<StoredUnit>,
    /// `UIName` label -> display string.
    #[serde(default)]
    pub translations: IndexMap<String, String>,
}

impl StoreDocument {
    pub fn parse_json5(text: &str) -> anyhow::Result<Self> {
        Ok(json5::from_str::<StoreDocument>(text)?)
    }

    pub fn load_path(path: &Path) -> anyhow::Result<(Self, StoreFormat, LineEnding)> {
        let bytes = fs::read(path).with_context(|| format!("reading {path:?}"))?;
        let format = detect_format(path, &bytes);
        let text_bytes = match format {
            StoreFormat::Json5 => bytes,
            StoreFormat::GzipJson5 => {
                let mut decoder = GzDecoder::new(&bytes[..]);
                let mut out = Vec::new();
                decoder.read_to_end(&mut out).context("gzip decompress")?;
                out
            }
        };
        let line_ending = detect_line_ending(&text_bytes);
        let text = std::str::from_utf8(&text_bytes).context("store file is not valid UTF-8")?;
        let doc = Self::parse_json5(text).context("parsing JSON5")?;
        Ok((doc, format, line_ending))
    }

    pub fn to_bytes(&self, format: StoreFormat, line_ending: LineEnding) -> anyhow::Result<Vec<u8>> {
        let mut text = serde_json::to_string_pretty(self).context("serializing store")?;
        text.push('\n');
        if line_ending == LineEnding::CrLf {
            text = text.replace('\n', "\r\n");
        }
        match format {
            StoreFormat::Json5 => Ok(text.into_bytes()),
            StoreFormat::GzipJson5 => {
                let mut encoder = GzBuilder::new()
                    .mtime(0)
                    .write(Vec::new(), Compression::default());
                encoder.write_all(text.as_bytes()).context("gzip compress")?;
                encoder.finish().context("gzip finish")
            }
        }
    }

    pub fn save_path(
        &self,
        path: &Path,
        format: StoreFormat,
        line_ending: LineEnding,
    ) -> anyhow::Result<()> {
        let bytes = self.to_bytes(format, line_ending)?;
        fs::write(path, &bytes).with_context(|| format!("writing {path:?}"))?;
        Ok(())
    }

    /// Base units (or their user override) in base order, then user-only units.
    fn merged(&self) -> Vec<&StoredUnit> {
        let mut out: Vec<&StoredUnit> = self
            .base
            .iter()
            .map(|b| {
                let key = b.key();
                self.units.iter().find(|u| u.key_matches(&key)).unwrap_or(b)
            })
            .collect();
        out.extend(
            self.units
                .iter()
                .filter(|u| !self.base.iter().any(|b| b.key_matches(&u.key()))),
        );
        out
    }

    fn find(&self, key: &UnitKey) -> Option<&StoredUnit> {
        self.units
            .iter()
            .find(|u| u.key_matches(key))
            .or_else(|| self.base.iter().find(|u| u.key_matches(key)))
    }

    fn ui_name(&self, unit: &StoredUnit) -> Option<String> {
        let label = unit.property(statics::PROP_UI_NAME)?;
        self.translations.get(label.value.trim()).cloned()
    }
}

#[derive(Debug, Default)]
struct StoreState {
    doc: StoreDocument,
    path: Option<PathBuf>,
    /// The file last read and the format it was in.
    opened: Option<(PathBuf, StoreFormat)>,
    line_ending: LineEnding,
}

impl StoreState {
    /// The format a save to `path` should use: whatever the file was when it
    /// was opened, else what the extension says.
    fn format_for(&self, path: &Path) -> StoreFormat {
        match &self.opened {
            Some((opened, format)) if opened.as_path() == path => *format,
            _ => format_for_path(path),
        }
    }
}

/// In-memory unit store persisted to a single file on demand.
#[derive(Debug)]
pub struct LocalStore {
    schema: PropertySchema,
    language: String,
    state: Mutex<StoreState>,
}

impl LocalStore {
    pub fn new(schema: PropertySchema, language: impl Into<String>) -> Self {
        Self::with_document(StoreDocument::default(), schema, language)
    }

    pub fn with_document(
        doc: StoreDocument,
        schema: PropertySchema,
        language: impl Into<String>,
    ) -> Self {
        Self {
            schema,
            language: language.into(),
            state: Mutex::new(StoreState {
                doc,
                ..Default::default()
            }),
        }
    }

    /// Point the store at a file. Takes effect on the next open/save.
    pub fn with_path(self, path: impl Into<PathBuf>) -> Self {
        self.set_path(path);
        self
    }

    pub fn set_path(&self, path: impl Into<PathBuf>) {
        self.state().path = Some(path.into());
    }

    /// Swap the target file, returning the previous one.
    pub fn replace_path(&self, path: Option<PathBuf>) -> Option<PathBuf> {
        std::mem::replace(&mut self.state().path, path)
    }

    pub fn path(&self) -> Option<PathBuf> {
        self.state().path.clone()
    }

    pub fn document(&self) -> StoreDocument {
        self.state().doc.clone()
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn selected_path(&self) -> GatewayResult<PathBuf> {
        self.path()
            .ok_or_else(|| GatewayError::Validation(statics::EN_ERR_NO_FILE.to_string()))
    }

    fn validate(&self, doc: &StoreDocument, unit: &UnitRecord) -> GatewayResult<()> {
        if !statics::UNIT_TYPES.contains(&unit.unit_type()) {
            return Err(GatewayError::Validation(format!(
                "unknown unit type `{}`",
                unit.unit_type()
            )));
        }
        let name = unit.name().trim();
        if name.is_empty() {
            return Err(GatewayError::Validation("unit name is empty".to_string()));
        }
        let key = unit.key();
        if doc
            .merged()
            .iter()
            .any(|u| u.name == name && !u.key_matches(&key))
        {
            return Err(GatewayError::Validation(format!(
                "unit name `{name}` already used"
            )));
        }
        if let Some(pos) = unit.properties().iter().position(|p| p.key().trim().is_empty()) {
            return Err(GatewayError::Validation(format!(
                "property #{pos} has an empty key"
            )));
        }
        Ok(())
    }
}

fn transport(e: anyhow::Error) -> GatewayError {
    GatewayError::Transport(format!("{e:#}"))
}

fn fresh_ukey() -> String {
    Ulid::new().to_string()
}

#[async_trait]
impl PersistenceGateway for LocalStore {
    async fn list_all_units(&self) -> GatewayResult<Vec<UnitRecord>> {
        let state = self.state();
        Ok(state
            .doc
            .merged()
            .into_iter()
            .map(|u| {
                UnitRecord::new(u.unit_type.clone(), u.id, u.name.clone())
                    .with_ui_name(state.doc.ui_name(u))
            })
            .collect())
    }

    async fn get_unit(&self, key: &UnitKey) -> GatewayResult<UnitRecord> {
        let state = self.state();
        let unit = state
            .doc
            .find(key)
            .ok_or_else(|| GatewayError::NotFound(format!("unit {key}")))?;
        let properties = unit
            .properties
            .iter()
            .map(|p| PropertyEntry::new(fresh_ukey(), &p.key, &p.value, p.comment.clone()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        UnitRecord::with_properties(
            unit.unit_type.clone(),
            unit.id,
            unit.name.clone(),
            state.doc.ui_name(unit),
            properties,
        )
        .map_err(|e| GatewayError::Transport(e.to_string()))
    }

    async fn save_unit(&self, unit: &UnitRecord) -> GatewayResult<()> {
        let mut state = self.state();
        self.validate(&state.doc, unit)?;
        let stored = StoredUnit {
            unit_type: unit.unit_type().to_string(),
            id: unit.id(),
            name: unit.name().trim().to_string(),
            properties: unit
                .properties()
                .iter()
                .map(|p| StoredProperty {
                    key: p.key().trim().to_string(),
                    value: p.value().to_string(),
                    comment: p.comment().map(str::to_string),
                })
                .collect(),
        };
        let key = unit.key();
        let units = &mut state.doc.units;
        match units.iter().position(|u| u.key_matches(&key)) {
            Some(pos) => units[pos] = stored,
            None => units.push(stored),
        }
        debug!(unit = %key, "stored");
        Ok(())
    }

    async fn delete_unit(&self, key: &UnitKey) -> GatewayResult<()> {
        let mut state = self.state();
        let pos = state.doc.units.iter().position(|u| u.key_matches(key));
        match pos {
            Some(pos) => {
                state.doc.units.remove(pos);
                debug!(unit = %key, "removed");
                Ok(())
            }
            None if state.doc.base.iter().any(|u| u.key_matches(key)) => Err(
                GatewayError::Validation(statics::EN_ERR_BASE_UNIT.to_string()),
            ),
            None => Err(GatewayError::NotFound(format!("unit {key}"))),
        }
    }

    async fn next_unit_id(&self, unit_type: &str) -> GatewayResult<i64> {
        let state = self.state();
        let max = state
            .doc
            .merged()
            .iter()
            .filter(|u| u.unit_type == unit_type)
            .map(|u| u.id)
            .fold(0, i64::max);
        max.checked_add(1).ok_or_else(|| {
            GatewayError::Validation(format!("no id left after {max} for `{unit_type}`"))
        })
    }

    async fn new_property_key(&self) -> GatewayResult<String> {
        Ok(fresh_ukey())
    }

    async fn list_available_properties(
        &self,
        unit_type: &str,
    ) -> GatewayResult<Vec<PropertySchemaEntry>> {
        Ok(self.schema.properties_for(unit_type, &self.language))
    }

    async fn open_file(&self) -> GatewayResult<()> {
        let path = self.selected_path()?;
        let read_path = path.clone();
        let (doc, format, line_ending) =
            tokio::task::spawn_blocking(move || StoreDocument::load_path(&read_path))
                .await
                .map_err(|e| GatewayError::Transport(e.to_string()))?
                .map_err(transport)?;
        info!(path = %path.display(), units = doc.units.len(), ?format, "store opened");
        let mut state = self.state();
        state.doc = doc;
        state.opened = Some((path, format));
        state.line_ending = line_ending;
        Ok(())
    }

    async fn save_file(&self) -> GatewayResult<()> {
        let path = self.selected_path()?;
        let (doc, format, line_ending) = {
            let state = self.state();
            (state.doc.clone(), state.format_for(&path), state.line_ending)
        };
        let write_path = path.clone();
        tokio::task::spawn_blocking(move || doc.save_path(&write_path, format, line_ending))
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?
            .map_err(transport)?;
        info!(path = %path.display(), ?format, "store saved");
        Ok(())
    }
}

fn format_for_path(path: &Path) -> StoreFormat {
    if path.extension().and_then(|e| e.to_str()) == Some("gz") {
        StoreFormat::GzipJson5
    } else {
        StoreFormat::Json5
    }
}

fn detect_format(path: &Path, bytes: &[u8]) -> StoreFormat {
    if format_for_path(path) == StoreFormat::GzipJson5 {
        return StoreFormat::GzipJson5;
    }
    // Gzip magic: 1F 8B
    if bytes.len() >= 2 && bytes[0] == 0x1F && bytes[1] == 0x8B {
        return StoreFormat::GzipJson5;
    }
    StoreFormat::Json5
}

fn detect_line_ending(text_bytes: &[u8]) -> LineEnding {
    // Majority of terminators wins; a few stray CRLFs do not flip the file.
    let mut lf_count = 0usize;
    let mut crlf_count = 0usize;

    for (i, b) in text_bytes.iter().enumerate() {
        if *b != b'\n' {
            continue;
        }
        if i > 0 && text_bytes[i - 1] == b'\r' {
            crlf_count += 1;
        } else {
            lf_count += 1;
        }
    }

    if crlf_count > lf_count {
        LineEnding::CrLf
    } else {
        LineEnding::Lf
    }
}
