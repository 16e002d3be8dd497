#![allow(dead_code)]

use async_trait::async_trait;
use ra2ed::{
    GatewayError, PersistenceGateway, PropertyEntry, PropertySchemaEntry, UnitKey, UnitRecord,
    gateway::GatewayResult,
};
use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};
use tokio::sync::Notify;

pub const LIST: &str = "list";
pub const GET: &str = "get";
pub const SAVE: &str = "save";
pub const DELETE: &str = "delete";
pub const NEXT_ID: &str = "next_id";
pub const NEW_KEY: &str = "new_key";
pub const SCHEMA: &str = "schema";
pub const OPEN: &str = "open";
pub const SAVE_FILE: &str = "save_file";

/// Lets a test observe that a call is in flight and decide when it returns.
#[derive(Default)]
pub struct Gate {
    pub entered: Notify,
    pub release: Notify,
}

/// In-memory collaborator whose calls can be failed or held per operation.
#[derive(Default)]
pub struct ScriptedGateway {
    units: Mutex<Vec<UnitRecord>>,
    schema: Mutex<HashMap<String, Vec<PropertySchemaEntry>>>,
    next_id: Mutex<Option<i64>>,
    failures: Mutex<HashMap<&'static str, GatewayError>>,
    gates: Mutex<HashMap<&'static str, Arc<Gate>>>,
    calls: Mutex<Vec<&'static str>>,
    ukeys: AtomicUsize,
}

impl ScriptedGateway {
    pub fn new(units: Vec<UnitRecord>) -> Arc<Self> {
        let gw = Self::default();
        *gw.units.lock().unwrap() = units;
        Arc::new(gw)
    }

    pub fn set_schema(&self, unit_type: &str, keys: &[(&str, &str)]) {
        let entries = keys
            .iter()
            .map(|(key, description)| PropertySchemaEntry {
                key: key.to_string(),
                description: description.to_string(),
            })
            .collect();
        self.schema
            .lock()
            .unwrap()
            .insert(unit_type.to_string(), entries);
    }

    pub fn set_next_id(&self, id: i64) {
        *self.next_id.lock().unwrap() = Some(id);
    }

    pub fn fail(&self, op: &'static str, error: GatewayError) {
        self.failures.lock().unwrap().insert(op, error);
    }

    pub fn heal(&self, op: &'static str) {
        self.failures.lock().unwrap().remove(op);
    }

    pub fn hold(&self, op: &'static str) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        self.gates.lock().unwrap().insert(op, gate.clone());
        gate
    }

    pub fn unhold(&self, op: &'static str) {
        self.gates.lock().unwrap().remove(op);
    }

    pub fn calls(&self, op: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| **c == op).count()
    }

    pub fn stored(&self, key: &UnitKey) -> Option<UnitRecord> {
        self.units
            .lock()
            .unwrap()
            .iter()
            .find(|u| &u.key() == key)
            .cloned()
    }

    pub fn remove_behind_our_back(&self, key: &UnitKey) {
        self.units.lock().unwrap().retain(|u| &u.key() != key);
    }

    async fn pass(&self, op: &'static str) -> GatewayResult<()> {
        self.calls.lock().unwrap().push(op);
        let gate = self.gates.lock().unwrap().get(op).cloned();
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        match self.failures.lock().unwrap().get(op) {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PersistenceGateway for ScriptedGateway {
    async fn list_all_units(&self) -> GatewayResult<Vec<UnitRecord>> {
        self.pass(LIST).await?;
        Ok(self
            .units
            .lock()
            .unwrap()
            .iter()
            .map(|u| {
                UnitRecord::new(u.unit_type(), u.id(), u.name())
                    .with_ui_name(u.ui_name().map(str::to_string))
            })
            .collect())
    }

    async fn get_unit(&self, key: &UnitKey) -> GatewayResult<UnitRecord> {
        self.pass(GET).await?;
        self.stored(key)
            .ok_or_else(|| GatewayError::NotFound(key.to_string()))
    }

    async fn save_unit(&self, unit: &UnitRecord) -> GatewayResult<()> {
        self.pass(SAVE).await?;
        // normalize the name the way a real backend might
        let props: Vec<PropertyEntry> = unit.properties().to_vec();
        let normalized = UnitRecord::with_properties(
            unit.unit_type(),
            unit.id(),
            unit.name().trim(),
            unit.ui_name().map(str::to_string),
            props,
        )
        .map_err(|e| GatewayError::Validation(e.to_string()))?;
        let mut units = self.units.lock().unwrap();
        match units.iter().position(|u| u.key() == unit.key()) {
            Some(pos) => units[pos] = normalized,
            None => units.push(normalized),
        }
        Ok(())
    }

    async fn delete_unit(&self, key: &UnitKey) -> GatewayResult<()> {
        self.pass(DELETE).await?;
        let mut units = self.units.lock().unwrap();
        let before = units.len();
        units.retain(|u| &u.key() != key);
        if units.len() == before {
            return Err(GatewayError::NotFound(key.to_string()));
        }
        Ok(())
    }

    async fn next_unit_id(&self, unit_type: &str) -> GatewayResult<i64> {
        self.pass(NEXT_ID).await?;
        if let Some(id) = *self.next_id.lock().unwrap() {
            return Ok(id);
        }
        Ok(self
            .units
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.unit_type() == unit_type)
            .map(|u| u.id())
            .max()
            .unwrap_or(0)
            + 1)
    }

    async fn new_property_key(&self) -> GatewayResult<String> {
        self.pass(NEW_KEY).await?;
        let n = self.ukeys.fetch_add(1, Ordering::SeqCst);
        Ok(format!("fresh-{n}"))
    }

    async fn list_available_properties(
        &self,
        unit_type: &str,
    ) -> GatewayResult<Vec<PropertySchemaEntry>> {
        self.pass(SCHEMA).await?;
        Ok(self
            .schema
            .lock()
            .unwrap()
            .get(unit_type)
            .cloned()
            .unwrap_or_default())
    }

    async fn open_file(&self) -> GatewayResult<()> {
        self.pass(OPEN).await
    }

    async fn save_file(&self) -> GatewayResult<()> {
        self.pass(SAVE_FILE).await
    }
}

pub fn prop(ukey: &str, key: &str, value: &str) -> PropertyEntry {
    PropertyEntry::new(ukey, key, value, None).unwrap()
}

/// E1 (infantry 1) with three properties, MTNK (vehicle 1), and an untyped unit.
pub fn sample_units() -> Vec<UnitRecord> {
    vec![
        UnitRecord::with_properties(
            "infantry",
            1,
            "E1",
            Some("GI".to_string()),
            vec![
                prop("a", "Strength", "125"),
                prop("b", "Cost", "200"),
                prop("c", "Speed", "4"),
            ],
        )
        .unwrap(),
        UnitRecord::with_properties("vehicle", 1, "MTNK", None, vec![prop("d", "Cost", "700")])
            .unwrap(),
        UnitRecord::new("", 3, "MYSTERY"),
    ]
}
