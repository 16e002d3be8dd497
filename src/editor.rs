//! The process-scoped editing core.
//!
//! `Editor` owns the catalog, the single editing session and the schema cache
//! and is the only place that sequences collaborator calls. Its methods take
//! `&self` so a front-end can hold it in an `Arc` and dispatch requests from
//! tasks. State is behind a mutex that is never held across an `.await`:
//! local edits never wait on the network, and every collaborator operation
//! that mutates something is guarded against a second concurrent dispatch.

use crate::{
    BasicField, EditingSession, EditorConfig, EditorError, InFlight, NewUnitState,
    NewUnitWorkflow, Operation, PersistenceGateway, PropertyEntry, PropertyField,
    PropertySchemaCache, PropertySchemaEntry, UnitCatalog, UnitKey, UnitRecord, UnitSummary,
};
use indexmap::IndexMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

#[derive(Debug, Default)]
struct EditorState {
    catalog: UnitCatalog,
    session: Option<EditingSession>,
    schema: PropertySchemaCache,
    new_unit: NewUnitWorkflow,
}

pub struct Editor {
    gateway: Arc<dyn PersistenceGateway>,
    config: EditorConfig,
    state: Mutex<EditorState>,
    inflight: InFlight,
}

impl Editor {
    pub fn new(gateway: Arc<dyn PersistenceGateway>, config: EditorConfig) -> Self {
        Self {
            gateway,
            config,
            state: Mutex::new(EditorState::default()),
            inflight: InFlight::new(),
        }
    }

    fn state(&self) -> MutexGuard<'_, EditorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    fn session_for(&self, record: UnitRecord) -> EditingSession {
        EditingSession::persisted(record).with_name_lock(self.config.lock_persisted_name)
    }

    // ---- catalog ----

    /// Initial population of the catalog.
    pub async fn start(&self) -> Result<(), EditorError> {
        self.refresh_catalog().await
    }

    pub async fn refresh_catalog(&self) -> Result<(), EditorError> {
        let units = UnitCatalog::fetch(self.gateway.as_ref()).await?;
        self.state().catalog.replace(units);
        Ok(())
    }

    /// Refresh after a mutation that already succeeded. Failures are only logged.
    async fn refresh_after(&self, op: Operation) {
        if let Err(e) = self.refresh_catalog().await {
            warn!(%op, error = %e, "catalog refresh failed");
        }
    }

    pub fn groups(&self) -> IndexMap<String, Vec<UnitSummary>> {
        self.state().catalog.groups().clone()
    }

    pub fn units(&self) -> Vec<UnitSummary> {
        self.state().catalog.units().to_vec()
    }

    pub fn catalog_loaded(&self) -> bool {
        self.state().catalog.is_loaded()
    }

    // ---- selection ----

    /// Load `key` into the editing session, discarding any unsaved edits.
    /// A unit that vanished clears the selection; other failures keep it.
    /// The schema for the unit's type is fetched afterwards on a best-effort
    /// basis; a failure there leaves suggestions empty until the next sync.
    pub async fn select(&self, key: &UnitKey) -> Result<(), EditorError> {
        match self.gateway.get_unit(key).await {
            Ok(record) => {
                let session = self.session_for(record);
                self.state().session = Some(session);
                debug!(unit = %key, "selected");
                self.sync_schema_quietly().await;
                Ok(())
            }
            Err(e) => {
                let e = EditorError::from(e);
                if e.is_not_found() {
                    warn!(unit = %key, "selected unit no longer exists");
                    self.state().session = None;
                }
                Err(e)
            }
        }
    }

    pub fn clear_selection(&self) {
        self.state().session = None;
    }

    pub fn selection(&self) -> Option<UnitKey> {
        self.state().session.as_ref().map(EditingSession::key)
    }

    pub fn draft(&self) -> Option<UnitRecord> {
        self.state().session.as_ref().map(|s| s.draft().clone())
    }

    pub fn is_read_only(&self, field: BasicField) -> bool {
        self.state()
            .session
            .as_ref()
            .is_some_and(|s| s.is_read_only(field))
    }

    fn with_session<T>(
        &self,
        f: impl FnOnce(&mut EditingSession) -> Result<T, EditorError>,
    ) -> Result<T, EditorError> {
        let mut state = self.state();
        let session = state.session.as_mut().ok_or(EditorError::NoSelection)?;
        f(session)
    }

    // ---- local edits ----

    pub fn set_basic_field(&self, field: BasicField, value: &str) -> Result<(), EditorError> {
        self.with_session(|s| s.set_basic_field(field, value))
    }

    pub fn upsert_property(
        &self,
        index: usize,
        field: PropertyField,
        value: &str,
    ) -> Result<(), EditorError> {
        self.with_session(|s| s.upsert_property(index, field, value))
    }

    pub fn delete_property(&self, index: usize) -> Result<PropertyEntry, EditorError> {
        self.with_session(|s| s.delete_property(index))
    }

    /// Accepting a suggestion replaces the whole key.
    pub fn accept_suggestion(&self, index: usize, key: &str) -> Result<(), EditorError> {
        self.upsert_property(index, PropertyField::Key, key)
    }

    // ---- schema ----

    /// Make sure the schema for the draft's current type is cached. Only a
    /// type that has not been seen before causes a fetch.
    pub async fn sync_schema(&self) -> Result<(), EditorError> {
        let unit_type = {
            let state = self.state();
            let Some(session) = state.session.as_ref() else {
                return Ok(());
            };
            let unit_type = session.draft().unit_type().to_string();
            if state.schema.contains(&unit_type) {
                return Ok(());
            }
            unit_type
        };
        let entries = self.gateway.list_available_properties(&unit_type).await?;
        debug!(unit_type, count = entries.len(), "schema fetched");
        self.state().schema.insert(unit_type, entries);
        Ok(())
    }

    async fn sync_schema_quietly(&self) {
        if let Err(e) = self.sync_schema().await {
            warn!(error = %e, "schema fetch failed");
        }
    }

    /// Suggestions for the draft's type matching `input`.
    pub fn suggest(&self, input: &str) -> Vec<PropertySchemaEntry> {
        let state = self.state();
        let Some(session) = state.session.as_ref() else {
            return Vec::new();
        };
        state
            .schema
            .suggest(session.draft().unit_type(), input)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn describe(&self, key: &str) -> Option<String> {
        let state = self.state();
        let unit_type = state.session.as_ref()?.draft().unit_type().to_string();
        state.schema.describe(&unit_type, key).map(str::to_string)
    }

    // ---- collaborator operations ----

    /// Append an empty property once the collaborator has handed out a ukey.
    pub async fn add_property(&self) -> Result<usize, EditorError> {
        let _guard = self.inflight.try_begin(Operation::AddProperty)?;
        let key = self.selection().ok_or(EditorError::NoSelection)?;
        let ukey = self.gateway.new_property_key().await?;
        let entry = PropertyEntry::blank(ukey)?;
        let mut state = self.state();
        match state.session.as_mut() {
            Some(session) if session.key() == key => session.push_property(entry),
            _ => Err(EditorError::SelectionChanged),
        }
    }

    /// Save the draft, then replace it with the canonical record.
    pub async fn commit(&self) -> Result<(), EditorError> {
        let _guard = self.inflight.try_begin(Operation::Commit)?;
        let draft = self.draft().ok_or(EditorError::NoSelection)?;
        let key = draft.key();
        let canonical = EditingSession::persist(self.gateway.as_ref(), &draft).await?;
        {
            let mut state = self.state();
            match state.session.as_mut() {
                Some(session) if session.key() == key => session.load(canonical),
                _ => debug!(unit = %key, "selection moved during commit; draft left alone"),
            }
        }
        self.refresh_after(Operation::Commit).await;
        Ok(())
    }

    /// Create a unit of `unit_type` named `name` and select it.
    pub async fn create_unit(&self, unit_type: &str, name: &str) -> Result<UnitKey, EditorError> {
        let _guard = self.inflight.try_begin(Operation::NewUnit)?;
        {
            let mut state = self.state();
            // With the guard held no other creation runs, so an in-flight
            // state here belongs to a call that was dropped mid-way.
            state.new_unit.abandon();
            state.new_unit.begin(unit_type, name)?;
        }

        let id = match self.gateway.next_unit_id(unit_type.trim()).await {
            Ok(id) => id,
            Err(e) => return Err(self.abort_new_unit(e.into())),
        };
        let record = self.state().new_unit.id_allocated(id)?;
        if let Err(e) = self.gateway.save_unit(&record).await {
            return Err(self.abort_new_unit(e.into()));
        }

        let key = {
            let mut state = self.state();
            let record = state.new_unit.saved()?;
            let key = record.key();
            state.session = Some(self.session_for(record));
            key
        };
        self.refresh_after(Operation::NewUnit).await;
        self.sync_schema_quietly().await;
        Ok(key)
    }

    fn abort_new_unit(&self, e: EditorError) -> EditorError {
        self.state().new_unit.abort(&e);
        e
    }

    pub fn new_unit_state(&self) -> NewUnitState {
        self.state().new_unit.state().clone()
    }

    /// Delete the selected unit. Nothing changes locally unless the
    /// collaborator confirms.
    pub async fn delete_selected(&self) -> Result<UnitKey, EditorError> {
        let key = self.selection().ok_or(EditorError::NoSelection)?;
        self.delete_unit(&key).await?;
        Ok(key)
    }

    pub async fn delete_unit(&self, key: &UnitKey) -> Result<(), EditorError> {
        let _guard = self.inflight.try_begin(Operation::DeleteUnit)?;
        self.gateway.delete_unit(key).await?;
        info!(unit = %key, "unit deleted");
        {
            let mut state = self.state();
            if state.session.as_ref().is_some_and(|s| &s.key() == key) {
                state.session = None;
            }
        }
        self.refresh_after(Operation::DeleteUnit).await;
        Ok(())
    }

    /// Reload the backing file. The catalog is invalidated and rebuilt and
    /// the selection is dropped, since it may not exist in the new file.
    pub async fn open_file(&self) -> Result<(), EditorError> {
        let _guard = self.inflight.try_begin(Operation::OpenFile)?;
        self.gateway.open_file().await?;
        {
            let mut state = self.state();
            state.catalog.invalidate();
            state.session = None;
        }
        self.refresh_catalog().await
    }

    pub async fn save_file(&self) -> Result<(), EditorError> {
        let _guard = self.inflight.try_begin(Operation::SaveFile)?;
        self.gateway.save_file().await?;
        Ok(())
    }

    pub fn is_pending(&self, op: Operation) -> bool {
        self.inflight.is_pending(op)
    }
}
