use crate::{
    BasicField, EditorError, PersistenceGateway, PropertyEntry, PropertyField, UnitKey, UnitRecord,
};
use tracing::{debug, info, warn};

/// The one editable copy of a unit.
///
/// The draft is detached from whatever it was loaded from; nothing but
/// [`EditingSession::load`] and a successful commit replaces it. Local edits
/// are synchronous. Collaborator round trips are sequenced by the caller;
/// [`persist`](Self::persist) is the save half of a commit and never touches
/// the draft, so a failed save leaves it exactly as it was.
#[derive(Debug, Clone)]
pub struct EditingSession {
    draft: UnitRecord,
    persisted: bool,
    lock_persisted_name: bool,
}

impl EditingSession {
    /// A session over a record fetched from the backend.
    pub fn persisted(record: UnitRecord) -> Self {
        Self {
            draft: record,
            persisted: true,
            lock_persisted_name: true,
        }
    }

    /// A session over a record that only exists locally.
    pub fn local(record: UnitRecord) -> Self {
        Self {
            draft: record,
            persisted: false,
            lock_persisted_name: true,
        }
    }

    /// Whether `name` stays read-only once the record is persisted.
    pub fn with_name_lock(mut self, lock: bool) -> Self {
        self.lock_persisted_name = lock;
        self
    }

    /// Replace the draft with a persisted record. Unsaved edits are dropped.
    pub fn load(&mut self, record: UnitRecord) {
        if self.draft.key() != record.key() {
            debug!(from = %self.draft.key(), to = %record.key(), "draft replaced");
        }
        self.draft = record;
        self.persisted = true;
    }

    pub fn draft(&self) -> &UnitRecord {
        &self.draft
    }

    pub fn key(&self) -> UnitKey {
        self.draft.key()
    }

    pub fn is_persisted(&self) -> bool {
        self.persisted
    }

    pub fn is_read_only(&self, field: BasicField) -> bool {
        self.persisted
            && match field {
                BasicField::Id | BasicField::Type => true,
                BasicField::Name => self.lock_persisted_name,
            }
    }

    pub fn set_basic_field(&mut self, field: BasicField, value: &str) -> Result<(), EditorError> {
        if self.is_read_only(field) {
            return Err(EditorError::ReadOnlyField(field));
        }
        match field {
            BasicField::Name => self.draft.set_name(value.to_string()),
            BasicField::Type => self.draft.set_unit_type(value.trim().to_string()),
            BasicField::Id => {
                let id = value.trim().parse::<i64>().map_err(|e| {
                    EditorError::InvalidField(format!("invalid unit id `{value}`: {e}"))
                })?;
                self.draft.set_id(id);
            }
        }
        Ok(())
    }

    /// Overwrite one field of the property at `index`.
    pub fn upsert_property(
        &mut self,
        index: usize,
        field: PropertyField,
        value: impl Into<String>,
    ) -> Result<(), EditorError> {
        let len = self.draft.properties().len();
        let entry = self
            .draft
            .property_mut(index)
            .ok_or(EditorError::PropertyIndex { index, len })?;
        entry.set(field, value.into());
        Ok(())
    }

    /// Append an already keyed entry; the ukey must be new to this draft.
    pub fn push_property(&mut self, entry: PropertyEntry) -> Result<usize, EditorError> {
        self.draft.push_property(entry)?;
        Ok(self.draft.properties().len() - 1)
    }

    pub fn delete_property(&mut self, index: usize) -> Result<PropertyEntry, EditorError> {
        let len = self.draft.properties().len();
        self.draft
            .remove_property(index)
            .ok_or(EditorError::PropertyIndex { index, len })
    }

    /// Save `draft` and read back the canonical record under the same key.
    pub async fn persist(
        gateway: &dyn PersistenceGateway,
        draft: &UnitRecord,
    ) -> Result<UnitRecord, EditorError> {
        let key = draft.key();
        if let Err(e) = gateway.save_unit(draft).await {
            warn!(unit = %key, error = %e, "save rejected");
            return Err(e.into());
        }
        let canonical = gateway.get_unit(&key).await?;
        info!(unit = %key, properties = canonical.properties().len(), "unit saved");
        Ok(canonical)
    }
}
