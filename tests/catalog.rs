mod common;

use common::{DELETE, LIST, OPEN, ScriptedGateway, sample_units};
use pretty_assertions::assert_eq;
use ra2ed::{Editor, EditorConfig, EditorError, GatewayError, UnitCatalog, UnitKey, UnitRecord};

fn names(editor: &Editor, group: &str) -> Vec<String> {
    editor.groups()[group]
        .iter()
        .map(|u| u.name.clone())
        .collect()
}

#[tokio::test]
async fn units_are_grouped_by_type_in_backend_order() {
    let gw = ScriptedGateway::new(vec![
        UnitRecord::new("infantry", 1, "E1"),
        UnitRecord::new("vehicle", 1, "MTNK"),
        UnitRecord::new("infantry", 2, "E2"),
        UnitRecord::new("", 9, "ODD"),
    ]);
    let editor = Editor::new(gw, EditorConfig::default());
    assert!(!editor.catalog_loaded());
    editor.start().await.unwrap();

    let labels: Vec<_> = editor.groups().keys().cloned().collect();
    assert_eq!(labels, ["infantry", "vehicle", "Other"]);
    assert_eq!(names(&editor, "infantry"), ["E1", "E2"]);
    assert_eq!(names(&editor, "Other"), ["ODD"]);
    assert_eq!(editor.units().len(), 4);
}

#[tokio::test]
async fn same_id_in_different_types_are_distinct_units() {
    let gw = ScriptedGateway::new(sample_units());
    let catalog = UnitCatalog::from_units(UnitCatalog::fetch(&*gw).await.unwrap());
    assert_eq!(catalog.len(), 3);
    assert_eq!(
        catalog.get(&UnitKey::new("infantry", 1)).unwrap().name,
        "E1"
    );
    assert_eq!(
        catalog.get(&UnitKey::new("vehicle", 1)).unwrap().name,
        "MTNK"
    );
    assert_eq!(
        catalog
            .get(&UnitKey::new("infantry", 1))
            .unwrap()
            .display_name(),
        "GI"
    );
}

#[tokio::test]
async fn failed_refresh_keeps_previous_catalog() {
    let gw = ScriptedGateway::new(sample_units());
    let editor = Editor::new(gw.clone(), EditorConfig::default());
    editor.start().await.unwrap();

    gw.fail(LIST, GatewayError::Transport("offline".into()));
    assert!(editor.refresh_catalog().await.is_err());
    assert_eq!(editor.units().len(), 3);
}

#[tokio::test]
async fn delete_removes_unit_and_clears_matching_selection() {
    let gw = ScriptedGateway::new(sample_units());
    let editor = Editor::new(gw.clone(), EditorConfig::default());
    editor.start().await.unwrap();
    editor.select(&UnitKey::new("vehicle", 1)).await.unwrap();

    let key = editor.delete_selected().await.unwrap();
    assert_eq!(key, UnitKey::new("vehicle", 1));
    assert_eq!(editor.selection(), None);
    assert!(!editor.groups().contains_key("vehicle"));
    assert!(gw.stored(&key).is_none());
}

#[tokio::test]
async fn delete_of_other_unit_keeps_selection() {
    let gw = ScriptedGateway::new(sample_units());
    let editor = Editor::new(gw.clone(), EditorConfig::default());
    editor.start().await.unwrap();
    editor.select(&UnitKey::new("infantry", 1)).await.unwrap();

    editor.delete_unit(&UnitKey::new("", 3)).await.unwrap();
    assert_eq!(editor.selection(), Some(UnitKey::new("infantry", 1)));
    assert!(!editor.groups().contains_key("Other"));
}

#[tokio::test]
async fn failed_delete_changes_nothing() {
    let gw = ScriptedGateway::new(sample_units());
    let editor = Editor::new(gw.clone(), EditorConfig::default());
    editor.start().await.unwrap();
    editor.select(&UnitKey::new("vehicle", 1)).await.unwrap();
    gw.fail(DELETE, GatewayError::Transport("locked".into()));
    let lists_before = gw.calls(LIST);

    let err = editor.delete_selected().await.unwrap_err();
    assert!(matches!(err, EditorError::Gateway(GatewayError::Transport(_))));
    assert_eq!(editor.selection(), Some(UnitKey::new("vehicle", 1)));
    assert_eq!(names(&editor, "vehicle"), ["MTNK"]);
    assert_eq!(gw.calls(LIST), lists_before);
}

#[tokio::test]
async fn delete_without_selection_is_an_error() {
    let gw = ScriptedGateway::new(sample_units());
    let editor = Editor::new(gw.clone(), EditorConfig::default());
    assert!(matches!(
        editor.delete_selected().await,
        Err(EditorError::NoSelection)
    ));
    assert_eq!(gw.calls(DELETE), 0);
}

#[tokio::test]
async fn open_file_rebuilds_catalog_and_drops_selection() {
    let gw = ScriptedGateway::new(sample_units());
    let editor = Editor::new(gw.clone(), EditorConfig::default());
    editor.start().await.unwrap();
    editor.select(&UnitKey::new("infantry", 1)).await.unwrap();

    editor.open_file().await.unwrap();
    assert_eq!(gw.calls(OPEN), 1);
    assert!(editor.catalog_loaded());
    assert_eq!(editor.selection(), None);

    gw.fail(OPEN, GatewayError::Validation("no file selected".into()));
    editor.select(&UnitKey::new("infantry", 1)).await.unwrap();
    assert!(editor.open_file().await.is_err());
    assert_eq!(editor.selection(), Some(UnitKey::new("infantry", 1)));
}
