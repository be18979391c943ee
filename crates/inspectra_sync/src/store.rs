use std::{collections::HashMap, path::Path};

use serde::{Deserialize, Serialize};

use crate::{error::StoreError, ids::SubObjectId};

/// Namespace of a group of persistent properties.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OwnerId {
    SubObject(SubObjectId),
    /// Resource UUID as reported by the asset library.
    Resource(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyName {
    /// Fold state of a component body. Absent means expanded.
    Expanded,
    Named(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PropertyKey {
    pub owner: OwnerId,
    pub name: PropertyName,
}

impl PropertyKey {
    pub fn new(owner: OwnerId, name: PropertyName) -> Self {
        Self { owner, name }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    Bool(bool),
    String(String),
    Number(f64),
}

/// UI-only state that outlives the widgets it belongs to: fold state and
/// similar. Lives for the editor session, not for one inspected object, and is
/// handed to inspectors explicitly instead of being looked up globally.
///
/// Entries are never deleted when their owner's widgets go away, so reselecting
/// the same object restores its layout.
#[derive(Clone, Debug, Default)]
pub struct PropertyStore {
    values: HashMap<PropertyKey, PropertyValue>,
}

#[derive(Serialize, Deserialize)]
struct StoredProperty {
    owner: OwnerId,
    name: PropertyName,
    value: PropertyValue,
}

impl PropertyStore {
    pub fn get(&self, owner: &OwnerId, name: &PropertyName) -> Option<&PropertyValue> {
        self.values
            .get(&PropertyKey::new(owner.clone(), name.clone()))
    }

    pub fn set(&mut self, owner: OwnerId, name: PropertyName, value: PropertyValue) {
        self.values.insert(PropertyKey::new(owner, name), value);
    }

    /// Returns `default` when the key is absent or holds a different type.
    pub fn get_bool(&self, owner: &OwnerId, name: &PropertyName, default: bool) -> bool {
        match self.get(owner, name) {
            Some(PropertyValue::Bool(value)) => *value,
            _ => default,
        }
    }

    pub fn set_bool(&mut self, owner: OwnerId, name: PropertyName, value: bool) {
        self.set(owner, name, PropertyValue::Bool(value));
    }

    pub fn get_string(&self, owner: &OwnerId, name: &PropertyName) -> Option<&str> {
        match self.get(owner, name) {
            Some(PropertyValue::String(value)) => Some(value),
            _ => None,
        }
    }

    pub fn set_string(&mut self, owner: OwnerId, name: PropertyName, value: impl Into<String>) {
        self.set(owner, name, PropertyValue::String(value.into()));
    }

    pub fn get_number(&self, owner: &OwnerId, name: &PropertyName) -> Option<f64> {
        match self.get(owner, name) {
            Some(PropertyValue::Number(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn set_number(&mut self, owner: OwnerId, name: PropertyName, value: f64) {
        self.set(owner, name, PropertyValue::Number(value));
    }

    pub fn has_owner(&self, owner: &OwnerId) -> bool {
        self.values.keys().any(|key| &key.owner == owner)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn to_json(&self) -> Result<String, StoreError> {
        let entries: Vec<StoredProperty> = self
            .values
            .iter()
            .map(|(key, value)| StoredProperty {
                owner: key.owner.clone(),
                name: key.name.clone(),
                value: value.clone(),
            })
            .collect();
        Ok(serde_json::to_string_pretty(&entries)?)
    }

    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        let entries: Vec<StoredProperty> = serde_json::from_str(json)?;
        let values = entries
            .into_iter()
            .map(|entry| (PropertyKey::new(entry.owner, entry.name), entry.value))
            .collect();
        Ok(Self { values })
    }

    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let json = self.to_json()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(path, json).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let json = std::fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }
}
