//! Commands run against files on disk.

use std::path::PathBuf;
use std::sync::Arc;

use fieldmeta::check::run_check;
use fieldmeta::decode::run_decode;
use fieldmeta_config::load_configuration;
use fieldmeta_schema::FieldTypeRegistry;
use tempfile::TempDir;

const REFERENCES: &str = r#"{
    "entityTypes": [{"ID": 7, "Name": "Customer"}],
    "fields": {
        "7": [{"ID": 1, "DisplayName": "Name"}, {"ID": 2, "DisplayName": "Code"}],
        "12": [{"ID": 3, "DisplayName": "X"}]
    },
    "enums": {"Currency": {"US Dollar": "USD", "Euro": "EUR"}}
}"#;

fn write(dir: &TempDir, name: &str, body: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, body).unwrap();
    path
}

#[tokio::test]
async fn test_check_normalizes_definition_from_yaml() {
    let dir = TempDir::new().unwrap();
    let definition = write(
        &dir,
        "currency.yaml",
        "DisplayName: Price\nColumnType: 6\nEntityTypeID: 12\nmetaType1: GBP\nmetaType3: 2\n",
    );
    let references = write(&dir, "refs.json", REFERENCES);
    let config = load_configuration(None).unwrap();

    let report = run_check(
        Arc::new(FieldTypeRegistry::builtin()),
        &config,
        &definition,
        &references,
    )
    .await
    .unwrap();

    assert!(!report.is_clean());
    assert_eq!(report.definition.slots.meta_type1.as_deref(), Some("USD"));
    assert_eq!(report.definition.slots.meta_type3.as_deref(), Some("2"));
    let rendered = report.render(true).unwrap();
    assert!(rendered.contains("metaType1: USD"));
}

#[tokio::test]
async fn test_check_with_seeding_disabled() {
    let dir = TempDir::new().unwrap();
    let config_path = write(&dir, "fieldmeta.toml", "[filter_table]\nseed_new_rows = false\n");
    let config = load_configuration(Some(&config_path)).unwrap();
    assert!(!config.filter_table.seed_new_rows);

    let definition = write(
        &dir,
        "lookup.json",
        r#"{"DisplayName": "Customer", "ColumnType": 18, "EntityTypeID": 12, "metaType1": 7}"#,
    );
    let references = write(&dir, "refs.json", REFERENCES);
    let report = run_check(
        Arc::new(FieldTypeRegistry::builtin()),
        &config,
        &definition,
        &references,
    )
    .await
    .unwrap();
    assert!(report.is_clean());
}

#[tokio::test]
async fn test_check_missing_fixture_is_an_error() {
    let dir = TempDir::new().unwrap();
    let definition = write(&dir, "def.json", r#"{"ColumnType": 4}"#);
    let err = run_check(
        Arc::new(FieldTypeRegistry::builtin()),
        &Default::default(),
        &definition,
        &dir.path().join("missing.json"),
    )
    .await
    .unwrap_err();
    assert!(err.to_string().contains("missing.json"));
}

#[test]
fn test_decode_yaml_output() {
    let dir = TempDir::new().unwrap();
    let definition = write(
        &dir,
        "hyperlink.json",
        r#"{"ColumnType": 14, "metaTypeJson": "{\"Target\": \"_blank\", \"Label\": \"Open\"}"}"#,
    );
    let output = run_decode(&FieldTypeRegistry::builtin(), &definition, true).unwrap();
    assert!(output.warnings.is_empty());
    assert!(output.rendered.contains("_blank"));
}
