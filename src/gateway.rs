//! The persistence collaborator consumed by the editing core.
//!
//! Every call is a plain request/response; once issued it cannot be cancelled
//! and it either resolves or fails. The core never talks to storage any other way.

use crate::{PropertySchemaEntry, UnitKey, UnitRecord};
use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("rejected: {0}")]
    Validation(String),
    #[error("backend error: {0}")]
    Transport(String),
}

pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// All units in store order. Listed records carry no properties.
    async fn list_all_units(&self) -> GatewayResult<Vec<UnitRecord>>;

    async fn get_unit(&self, key: &UnitKey) -> GatewayResult<UnitRecord>;

    /// Insert or replace the unit addressed by the record's compound key.
    async fn save_unit(&self, unit: &UnitRecord) -> GatewayResult<()>;

    async fn delete_unit(&self, key: &UnitKey) -> GatewayResult<()>;

    /// A candidate id for a new unit of `unit_type`. Not a durable reservation.
    async fn next_unit_id(&self, unit_type: &str) -> GatewayResult<i64>;

    /// A fresh, never reused property ukey.
    async fn new_property_key(&self) -> GatewayResult<String>;

    async fn list_available_properties(
        &self,
        unit_type: &str,
    ) -> GatewayResult<Vec<PropertySchemaEntry>>;

    /// Reload the backing file; the unit list changes wholesale.
    async fn open_file(&self) -> GatewayResult<()>;

    /// Persist the whole store.
    async fn save_file(&self) -> GatewayResult<()>;
}
