//! Core library for ra2ed, the Red Alert 2 rules unit editor.
//! Provides the client-side editing model: the unit catalog, a single editing
//! session with its save/discard protocol, schema-assisted autocomplete and the
//! new-unit workflow, all driven against a pluggable persistence collaborator.

mod catalog;
mod config;
mod editor;
mod error;
pub mod gateway;
mod inflight;
mod schema;
mod session;
mod shell;
pub mod statics;
pub mod store;
mod unit;
mod workflow;

pub use catalog::UnitCatalog;
pub use config::EditorConfig;
pub use editor::Editor;
pub use error::EditorError;
pub use gateway::{GatewayError, PersistenceGateway};
pub use inflight::{InFlight, Operation};
pub use schema::{PropertySchema, PropertySchemaCache, filter_suggestions};
pub use session::EditingSession;
pub use shell::run_shell;
pub use store::LocalStore;
pub use unit::{
    BasicField, PropertyEntry, PropertyField, PropertySchemaEntry, UnitKey, UnitRecord,
    UnitSummary, group_label,
};
pub use workflow::{NewUnitState, NewUnitWorkflow};
