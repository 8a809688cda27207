//! Reading definitions and writing command output.

use std::path::Path;

use anyhow::Context;
use fieldmeta_schema::FieldDefinition;
use serde::Serialize;

/// Read a stored definition from JSON, or YAML for `.yaml`/`.yml` files.
pub fn read_definition(path: &Path) -> anyhow::Result<FieldDefinition> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let yaml = matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml" | "yml")
    );
    let definition = if yaml {
        serde_yaml_ng::from_str(&text)
            .with_context(|| format!("invalid definition in {}", path.display()))?
    } else {
        serde_json::from_str(&text)
            .with_context(|| format!("invalid definition in {}", path.display()))?
    };
    Ok(definition)
}

/// Serialize command output as pretty JSON or YAML.
pub fn render<T: Serialize + ?Sized>(value: &T, yaml: bool) -> anyhow::Result<String> {
    if yaml {
        Ok(serde_yaml_ng::to_string(value)?)
    } else {
        Ok(serde_json::to_string_pretty(value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_json_and_yaml() {
        let dir = tempfile::TempDir::new().unwrap();
        let json = dir.path().join("def.json");
        std::fs::write(&json, r#"{"DisplayName": "Qty", "ColumnType": 4, "metaType1": 10}"#)
            .unwrap();
        let def = read_definition(&json).unwrap();
        assert_eq!(def.column_type, Some(4));
        assert_eq!(def.slots.meta_type1.as_deref(), Some("10"));

        let yaml = dir.path().join("def.yml");
        std::fs::write(&yaml, "DisplayName: Qty\nColumnType: 4\nmetaType1: 10\n").unwrap();
        assert_eq!(read_definition(&yaml).unwrap(), def);
    }

    #[test]
    fn test_missing_file_names_the_path() {
        let err = read_definition(Path::new("/nonexistent/def.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/def.json"));
    }
}
