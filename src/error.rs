use crate::{BasicField, GatewayError, Operation};

/// Errors surfaced by the editing core. None of them are fatal: after any of
/// these the editor is back in its last consistent state.
#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("{0} is already in progress")]
    Busy(Operation),
    #[error("no unit selected")]
    NoSelection,
    #[error("property index {index} out of range (len {len})")]
    PropertyIndex { index: usize, len: usize },
    #[error("`{0}` is read-only for a saved unit")]
    ReadOnlyField(BasicField),
    #[error("{0}")]
    InvalidField(String),
    #[error("invalid record: {0}")]
    InvalidRecord(String),
    #[error("selection changed while the request was in flight")]
    SelectionChanged,
}

impl EditorError {
    /// True when the unit the caller referred to no longer exists remotely.
    pub fn is_not_found(&self) -> bool {
        matches!(self, EditorError::Gateway(GatewayError::NotFound(_)))
    }
}
