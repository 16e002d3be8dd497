use crate::{EditorError, UnitKey, UnitRecord};
use tracing::{debug, info, warn};

/// Progress of a unit creation.
///
/// `Idle -> RequestingId -> Constructed -> Saving -> Selected`; a failure in
/// any in-flight state goes through `Aborted` straight back to `Idle`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum NewUnitState {
    #[default]
    Idle,
    RequestingId {
        unit_type: String,
        name: String,
    },
    Constructed(UnitRecord),
    Saving(UnitRecord),
    Selected(UnitKey),
    Aborted,
}

impl NewUnitState {
    fn label(&self) -> &'static str {
        match self {
            NewUnitState::Idle => "idle",
            NewUnitState::RequestingId { .. } => "requesting-id",
            NewUnitState::Constructed(_) => "constructed",
            NewUnitState::Saving(_) => "saving",
            NewUnitState::Selected(_) => "selected",
            NewUnitState::Aborted => "aborted",
        }
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            NewUnitState::RequestingId { .. }
                | NewUnitState::Constructed(_)
                | NewUnitState::Saving(_)
        )
    }
}

#[derive(Debug, Default)]
pub struct NewUnitWorkflow {
    state: NewUnitState,
    last_abort: Option<String>,
}

impl NewUnitWorkflow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &NewUnitState {
        &self.state
    }

    /// Why the most recent attempt was abandoned, if it was.
    pub fn last_abort(&self) -> Option<&str> {
        self.last_abort.as_deref()
    }

    fn transition(&mut self, next: NewUnitState) {
        debug!(from = self.state.label(), to = next.label(), "new-unit transition");
        self.state = next;
    }

    fn unexpected(&self, step: &str) -> EditorError {
        EditorError::InvalidField(format!(
            "new unit: cannot {step} while {}",
            self.state.label()
        ))
    }

    pub fn begin(&mut self, unit_type: &str, name: &str) -> Result<(), EditorError> {
        if self.state.is_in_flight() {
            return Err(self.unexpected("start"));
        }
        let unit_type = unit_type.trim();
        let name = name.trim();
        if unit_type.is_empty() {
            return Err(EditorError::InvalidField("unit type is required".to_string()));
        }
        if name.is_empty() {
            return Err(EditorError::InvalidField("unit name is required".to_string()));
        }
        self.last_abort = None;
        self.transition(NewUnitState::RequestingId {
            unit_type: unit_type.to_string(),
            name: name.to_string(),
        });
        Ok(())
    }

    /// Build the record in memory around the allocated id and move on to
    /// saving it. Returns the record to hand to the collaborator.
    pub fn id_allocated(&mut self, id: i64) -> Result<UnitRecord, EditorError> {
        let NewUnitState::RequestingId { unit_type, name } = &self.state else {
            return Err(self.unexpected("accept an id"));
        };
        let record = UnitRecord::new(unit_type.clone(), id, name.clone());
        self.transition(NewUnitState::Constructed(record.clone()));
        self.transition(NewUnitState::Saving(record.clone()));
        Ok(record)
    }

    pub fn saved(&mut self) -> Result<UnitRecord, EditorError> {
        let NewUnitState::Saving(record) = &self.state else {
            return Err(self.unexpected("finish"));
        };
        let record = record.clone();
        self.transition(NewUnitState::Selected(record.key()));
        info!(unit = %record.key(), "unit created");
        Ok(record)
    }

    /// Drop the attempt. Nothing built so far is kept.
    pub fn abort(&mut self, reason: &EditorError) {
        if !self.state.is_in_flight() {
            return;
        }
        warn!(state = self.state.label(), error = %reason, "new unit aborted");
        self.reset(reason.to_string());
    }

    /// Drop an attempt whose driver went away before it finished.
    pub fn abandon(&mut self) {
        if !self.state.is_in_flight() {
            return;
        }
        warn!(state = self.state.label(), "new unit abandoned");
        self.reset("interrupted".to_string());
    }

    fn reset(&mut self, reason: String) {
        self.last_abort = Some(reason);
        self.transition(NewUnitState::Aborted);
        self.transition(NewUnitState::Idle);
    }
}
