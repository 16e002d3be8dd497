use crate::EditorError;
use std::{
    collections::HashSet,
    fmt,
    sync::{Mutex, MutexGuard, PoisonError},
};
use tracing::debug;

/// Collaborator-facing operations that must not be dispatched twice at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Commit,
    AddProperty,
    DeleteUnit,
    NewUnit,
    OpenFile,
    SaveFile,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Commit => "commit",
            Operation::AddProperty => "add property",
            Operation::DeleteUnit => "delete unit",
            Operation::NewUnit => "new unit",
            Operation::OpenFile => "open file",
            Operation::SaveFile => "save file",
        })
    }
}

/// Set of operations currently awaiting the collaborator.
#[derive(Debug, Default)]
pub struct InFlight {
    pending: Mutex<HashSet<Operation>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    fn pending(&self) -> MutexGuard<'_, HashSet<Operation>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claim `op`, or fail with [`EditorError::Busy`] if it is already pending.
    /// The claim is released when the guard drops, whatever the outcome.
    pub fn try_begin(&self, op: Operation) -> Result<FlightGuard<'_>, EditorError> {
        if !self.pending().insert(op) {
            debug!(%op, "rejected duplicate dispatch");
            return Err(EditorError::Busy(op));
        }
        Ok(FlightGuard { owner: self, op })
    }

    pub fn is_pending(&self, op: Operation) -> bool {
        self.pending().contains(&op)
    }
}

#[must_use]
pub struct FlightGuard<'a> {
    owner: &'a InFlight,
    op: Operation,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.owner.pending().remove(&self.op);
    }
}
