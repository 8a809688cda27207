//! Boundary traits for the remote reference and persistence services, plus
//! in-process implementations for offline tooling and tests.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use fieldmeta_schema::slot::{canonical, de_canonical};
use fieldmeta_schema::{FieldDefinition, ListKey, RefItem};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::debug;
use ulid::Ulid;

use crate::error::ServiceError;

/// One entry of the entity-type list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityTypeSummary {
    #[serde(rename = "ID", deserialize_with = "de_canonical")]
    pub id: String,
    #[serde(rename = "Name", default, deserialize_with = "de_canonical")]
    pub name: String,
}

impl From<EntityTypeSummary> for RefItem {
    fn from(summary: EntityTypeSummary) -> Self {
        RefItem::new(summary.id, summary.name)
    }
}

/// Identifier returned by the persistence service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedId {
    #[serde(rename = "ID", deserialize_with = "de_canonical")]
    pub id: String,
}

/// Read-only reference data consumed by the resolver
#[async_trait]
pub trait ReferenceSource: Send + Sync {
    /// All entity types, in service order
    async fn list_entity_types(&self) -> Result<Vec<EntityTypeSummary>, ServiceError>;

    /// Fields of one entity type, in service order
    async fn list_fields_by_entity_type(
        &self,
        entity_type_id: &str,
    ) -> Result<Vec<RefItem>, ServiceError>;

    /// A named enum as `{label: code}`; codes may be numbers or strings
    async fn list_enum(&self, name: &str) -> Result<IndexMap<String, Value>, ServiceError>;
}

/// Persistence of field definitions
#[async_trait]
pub trait FieldDefinitionStore: Send + Sync {
    async fn insert_field_definition(
        &self,
        definition: &FieldDefinition,
    ) -> Result<PersistedId, ServiceError>;

    async fn update_field_definition(
        &self,
        definition: &FieldDefinition,
    ) -> Result<PersistedId, ServiceError>;
}

/// Fetch the list behind `key`, mapped to `{ID, DisplayName}` items.
pub async fn fetch_list(
    source: &dyn ReferenceSource,
    key: &ListKey,
) -> Result<Vec<RefItem>, ServiceError> {
    debug!(%key, "fetching reference list");
    match key {
        ListKey::EntityTypes => Ok(source
            .list_entity_types()
            .await?
            .into_iter()
            .map(RefItem::from)
            .collect()),
        ListKey::EntityFields(id) | ListKey::FormFields(id) => {
            source.list_fields_by_entity_type(id).await
        }
        ListKey::Enum(name) => Ok(source
            .list_enum(name)
            .await?
            .into_iter()
            .map(|(label, code)| RefItem::new(canonical(&code), label))
            .collect()),
    }
}

/// Reference data loaded from a JSON fixture
///
/// ```json
/// {
///   "entityTypes": [{"ID": 7, "Name": "Customer"}],
///   "fields": {"7": [{"ID": 1, "DisplayName": "Name"}]},
///   "enums": {"Currency": {"US Dollar": "USD"}},
///   "failing": ["entityFields:9"]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceFixture {
    #[serde(default)]
    pub entity_types: Vec<EntityTypeSummary>,
    #[serde(default)]
    pub fields: HashMap<String, Vec<RefItem>>,
    #[serde(default)]
    pub enums: IndexMap<String, IndexMap<String, Value>>,
    /// List keys (as displayed, e.g. `entityFields:9`) that fail on fetch
    #[serde(default)]
    pub failing: HashSet<String>,
}

/// A [`ReferenceSource`] answering from a fixture, with optional per-key latency.
#[derive(Debug, Clone, Default)]
pub struct StaticReferenceSource {
    fixture: ReferenceFixture,
    delays: HashMap<ListKey, Duration>,
}

impl StaticReferenceSource {
    pub fn new(fixture: ReferenceFixture) -> Self {
        Self {
            fixture,
            delays: HashMap::new(),
        }
    }

    /// Load a fixture from a JSON file.
    pub fn from_json_file(path: &Path) -> std::io::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let fixture = serde_json::from_str(&text)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        Ok(Self::new(fixture))
    }

    /// Delay every answer for `key`.
    pub fn with_delay(mut self, key: ListKey, delay: Duration) -> Self {
        self.delays.insert(key, delay);
        self
    }

    pub fn fixture(&self) -> &ReferenceFixture {
        &self.fixture
    }

    async fn answer(&self, key: ListKey, operation: &'static str) -> Result<(), ServiceError> {
        if let Some(delay) = self.delays.get(&key) {
            tokio::time::sleep(*delay).await;
        }
        if self.fixture.failing.contains(&key.to_string()) {
            return Err(ServiceError::unavailable(operation, format!("{key} is unavailable")));
        }
        Ok(())
    }
}

#[async_trait]
impl ReferenceSource for StaticReferenceSource {
    async fn list_entity_types(&self) -> Result<Vec<EntityTypeSummary>, ServiceError> {
        self.answer(ListKey::EntityTypes, "listEntityTypes").await?;
        Ok(self.fixture.entity_types.clone())
    }

    /// Unknown entity types have no fields.
    async fn list_fields_by_entity_type(
        &self,
        entity_type_id: &str,
    ) -> Result<Vec<RefItem>, ServiceError> {
        self.answer(
            ListKey::EntityFields(entity_type_id.to_string()),
            "listFieldsByEntityType",
        )
        .await?;
        Ok(self
            .fixture
            .fields
            .get(entity_type_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_enum(&self, name: &str) -> Result<IndexMap<String, Value>, ServiceError> {
        self.answer(ListKey::Enum(name.to_string()), "listEnum")
            .await?;
        self.fixture
            .enums
            .get(name)
            .cloned()
            .ok_or_else(|| ServiceError::not_found(format!("enum {name}")))
    }
}

/// An in-memory [`FieldDefinitionStore`].
#[derive(Debug, Default)]
pub struct MemoryFieldStore {
    definitions: Mutex<IndexMap<String, FieldDefinition>>,
}

impl MemoryFieldStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, id: &str) -> Option<FieldDefinition> {
        self.definitions.lock().await.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.definitions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.definitions.lock().await.is_empty()
    }
}

#[async_trait]
impl FieldDefinitionStore for MemoryFieldStore {
    async fn insert_field_definition(
        &self,
        definition: &FieldDefinition,
    ) -> Result<PersistedId, ServiceError> {
        let id = Ulid::new().to_string();
        let mut stored = definition.clone();
        stored.id = Some(id.clone());
        self.definitions.lock().await.insert(id.clone(), stored);
        debug!(%id, "field definition inserted");
        Ok(PersistedId { id })
    }

    async fn update_field_definition(
        &self,
        definition: &FieldDefinition,
    ) -> Result<PersistedId, ServiceError> {
        let id = definition
            .id
            .clone()
            .ok_or_else(|| ServiceError::not_found("field definition without ID"))?;
        let mut definitions = self.definitions.lock().await;
        match definitions.get_mut(&id) {
            Some(slot) => {
                *slot = definition.clone();
                debug!(%id, "field definition updated");
                Ok(PersistedId { id })
            }
            None => Err(ServiceError::not_found(format!("field definition {id}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Parsed from text so enum maps keep the order they were written in.
    const FIXTURE: &str = r#"{
        "entityTypes": [{"ID": 7, "Name": "Customer"}, {"ID": "9", "Name": "Order"}],
        "fields": {"7": [{"ID": 1, "DisplayName": "Name"}, {"ID": 2, "DisplayName": "Code"}]},
        "enums": {"Currency": {"US Dollar": "USD", "Euro": 978}},
        "failing": ["entityFields:13"]
    }"#;

    fn fixture() -> ReferenceFixture {
        serde_json::from_str(FIXTURE).unwrap()
    }

    #[tokio::test]
    async fn test_entity_types_map_to_items() {
        let source = StaticReferenceSource::new(fixture());
        let items = fetch_list(&source, &ListKey::EntityTypes).await.unwrap();
        assert_eq!(
            items,
            vec![RefItem::new("7", "Customer"), RefItem::new("9", "Order")]
        );
    }

    #[tokio::test]
    async fn test_enum_preserves_service_order() {
        let source = StaticReferenceSource::new(fixture());
        let items = fetch_list(&source, &ListKey::Enum("Currency".into()))
            .await
            .unwrap();
        assert_eq!(
            items,
            vec![RefItem::new("USD", "US Dollar"), RefItem::new("978", "Euro")]
        );
        assert!(fetch_list(&source, &ListKey::Enum("Nope".into()))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_fields_and_failures() {
        let source = StaticReferenceSource::new(fixture());
        let fields = fetch_list(&source, &ListKey::EntityFields("7".into()))
            .await
            .unwrap();
        assert_eq!(fields.len(), 2);
        let none = fetch_list(&source, &ListKey::FormFields("42".into()))
            .await
            .unwrap();
        assert!(none.is_empty());
        let err = fetch_list(&source, &ListKey::EntityFields("13".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Unavailable { .. }));
    }

    #[tokio::test]
    async fn test_fixture_file_loading() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("refs.json");
        std::fs::write(&path, serde_json::to_string(&fixture()).unwrap()).unwrap();
        let source = StaticReferenceSource::from_json_file(&path).unwrap();
        assert_eq!(source.fixture().entity_types.len(), 2);

        std::fs::write(&path, "{ nope").unwrap();
        assert!(StaticReferenceSource::from_json_file(&path).is_err());
    }

    #[tokio::test]
    async fn test_memory_store_insert_then_update() {
        let store = MemoryFieldStore::new();
        let def = FieldDefinition {
            display_name: "Qty".into(),
            column_type: Some(4),
            ..Default::default()
        };
        let id = store.insert_field_definition(&def).await.unwrap().id;
        assert_eq!(store.len().await, 1);

        let mut changed = store.get(&id).await.unwrap();
        changed.display_name = "Quantity".into();
        store.update_field_definition(&changed).await.unwrap();
        assert_eq!(store.get(&id).await.unwrap().display_name, "Quantity");

        let missing = FieldDefinition {
            id: Some("missing".into()),
            ..Default::default()
        };
        assert!(store.update_field_definition(&missing).await.is_err());
    }
}
