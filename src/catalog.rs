use crate::{EditorError, PersistenceGateway, UnitKey, UnitSummary, unit::group_label};
use indexmap::IndexMap;
use tracing::debug;

/// The unit list as last returned by the backend, grouped by type.
///
/// Groups appear in first-seen order and each group keeps backend order; the
/// catalog never sorts. Refreshing is always explicit.
#[derive(Debug, Default, Clone)]
pub struct UnitCatalog {
    units: Vec<UnitSummary>,
    groups: IndexMap<String, Vec<UnitSummary>>,
    loaded: bool,
}

impl UnitCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_units(units: Vec<UnitSummary>) -> Self {
        let mut catalog = Self::new();
        catalog.replace(units);
        catalog
    }

    /// Fetch the full unit list without touching any catalog.
    pub async fn fetch(gateway: &dyn PersistenceGateway) -> Result<Vec<UnitSummary>, EditorError> {
        let units = gateway.list_all_units().await?;
        Ok(units.iter().map(|u| u.summary()).collect())
    }

    pub fn replace(&mut self, units: Vec<UnitSummary>) {
        self.groups = group_units(&units);
        self.units = units;
        self.loaded = true;
        debug!(
            units = self.units.len(),
            groups = self.groups.len(),
            "catalog regrouped"
        );
    }

    /// Drop everything; used when the backing file changes wholesale.
    pub fn invalidate(&mut self) {
        self.units.clear();
        self.groups.clear();
        self.loaded = false;
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn groups(&self) -> &IndexMap<String, Vec<UnitSummary>> {
        &self.groups
    }

    pub fn units(&self) -> &[UnitSummary] {
        &self.units
    }

    pub fn get(&self, key: &UnitKey) -> Option<&UnitSummary> {
        self.units
            .iter()
            .find(|u| u.unit_type == key.unit_type && u.id == key.id)
    }

    pub fn contains(&self, key: &UnitKey) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

fn group_units(units: &[UnitSummary]) -> IndexMap<String, Vec<UnitSummary>> {
    let mut groups: IndexMap<String, Vec<UnitSummary>> = IndexMap::new();
    for unit in units {
        groups
            .entry(group_label(&unit.unit_type).to_string())
            .or_default()
            .push(unit.clone());
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::UnitCatalog;
    use crate::{UnitKey, UnitSummary};

    fn summary(unit_type: &str, id: i64, name: &str) -> UnitSummary {
        UnitSummary {
            unit_type: unit_type.to_string(),
            id,
            name: name.to_string(),
            ui_name: None,
        }
    }

    #[test]
    fn untyped_units_group_under_other() {
        let catalog = UnitCatalog::from_units(vec![summary("", 1, "A"), summary("vehicle", 2, "B")]);
        let groups = catalog.groups();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups["Other"], vec![summary("", 1, "A")]);
        assert_eq!(groups["vehicle"], vec![summary("vehicle", 2, "B")]);
    }

    #[test]
    fn groups_keep_backend_order() {
        let catalog = UnitCatalog::from_units(vec![
            summary("vehicle", 9, "Z"),
            summary("infantry", 3, "Y"),
            summary("vehicle", 1, "X"),
        ]);
        let keys: Vec<_> = catalog.groups().keys().cloned().collect();
        assert_eq!(keys, ["vehicle", "infantry"]);
        let ids: Vec<_> = catalog.groups()["vehicle"].iter().map(|u| u.id).collect();
        assert_eq!(ids, [9, 1]);
    }

    #[test]
    fn lookup_uses_type_and_id() {
        let catalog = UnitCatalog::from_units(vec![
            summary("infantry", 1, "E1"),
            summary("vehicle", 1, "MTNK"),
        ]);
        assert_eq!(
            catalog.get(&UnitKey::new("vehicle", 1)).map(|u| u.name.as_str()),
            Some("MTNK")
        );
        assert!(!catalog.contains(&UnitKey::new("aircraft", 1)));
    }

    #[test]
    fn invalidate_clears_everything() {
        let mut catalog = UnitCatalog::from_units(vec![summary("infantry", 1, "E1")]);
        assert!(catalog.is_loaded());
        catalog.invalidate();
        assert!(!catalog.is_loaded());
        assert!(catalog.is_empty());
        assert!(catalog.groups().is_empty());
    }
}
