use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use bevy::prelude::*;
use inspectra_sync::{InspectorSettings, PropertyStore};
use serde::{Deserialize, Serialize};

/// Directory under the working directory holding inspector files.
pub const CONFIG_DIR: &str = "inspectra";
const SETTINGS_FILE: &str = "settings.json";
const STORE_FILE: &str = "inspector_state.json";

/// Inspector configuration, persisted as JSON.
#[derive(Resource, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InspectorConfig {
    pub settings: InspectorSettings,
    /// Keep fold states between editor sessions.
    pub persist_ui_state: bool,
}

impl Default for InspectorConfig {
    fn default() -> Self {
        Self {
            settings: InspectorSettings::default(),
            persist_ui_state: true,
        }
    }
}

impl InspectorConfig {
    pub fn file_path() -> PathBuf {
        Path::new(CONFIG_DIR).join(SETTINGS_FILE)
    }

    /// Load settings from disk, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        Self::load_from(path).unwrap_or_else(|err| {
            warn!("Using default inspector settings: {err:#}");
            Self::default()
        })
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
    }
}

pub fn store_path() -> PathBuf {
    Path::new(CONFIG_DIR).join(STORE_FILE)
}

/// Files the inspector reads at startup and writes back.
#[derive(Resource, Clone, Debug, PartialEq)]
pub struct InspectorFiles {
    pub settings: PathBuf,
    pub store: PathBuf,
}

impl Default for InspectorFiles {
    fn default() -> Self {
        Self {
            settings: InspectorConfig::file_path(),
            store: store_path(),
        }
    }
}

/// Reads the persisted fold states. A missing file is an empty store.
pub fn load_property_store(path: &Path) -> PropertyStore {
    if !path.exists() {
        return PropertyStore::default();
    }
    match PropertyStore::load(path) {
        Ok(store) => store,
        Err(err) => {
            warn!("Discarding inspector state {}: {err}", path.display());
            PropertyStore::default()
        }
    }
}

pub fn save_property_store(store: &PropertyStore, path: &Path) -> anyhow::Result<()> {
    store
        .save(path)
        .with_context(|| format!("failed to save inspector state to {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use inspectra_sync::{CoordinateSpace, OwnerId, PropertyName, SubObjectId};

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("inspectra-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn config_round_trips_through_disk() {
        let dir = scratch_dir("config");
        let path = dir.join(SETTINGS_FILE);
        let mut config = InspectorConfig::default();
        config.settings.coordinate_space = CoordinateSpace::Local;
        config.persist_ui_state = false;

        config.save_to(&path).unwrap();
        assert_eq!(InspectorConfig::load_from(&path).unwrap(), config);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_config_file_gives_defaults() {
        let dir = scratch_dir("no-config");
        assert_eq!(
            InspectorConfig::load(&dir.join(SETTINGS_FILE)),
            InspectorConfig::default()
        );
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let config: InspectorConfig =
            serde_json::from_str(r#"{ "settings": { "padding": 8.0 } }"#).unwrap();
        assert_eq!(config.settings.padding, 8.0);
        assert_eq!(config.settings.component_spacing, 10.0);
        assert!(config.persist_ui_state);
    }

    #[test]
    fn malformed_config_reports_the_path() {
        let dir = scratch_dir("malformed");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(SETTINGS_FILE);
        fs::write(&path, "not json").unwrap();

        let err = InspectorConfig::load_from(&path).unwrap_err();
        assert!(format!("{err:#}").contains("failed to parse"));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn property_store_survives_a_session() {
        let dir = scratch_dir("store");
        let path = dir.join(STORE_FILE);
        let mut store = PropertyStore::default();
        let owner = OwnerId::SubObject(SubObjectId(4));
        store.set_bool(owner.clone(), PropertyName::Expanded, false);

        save_property_store(&store, &path).unwrap();
        let loaded = load_property_store(&path);
        assert!(!loaded.get_bool(&owner, &PropertyName::Expanded, true));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_store_file_is_empty() {
        let dir = scratch_dir("missing");
        assert!(load_property_store(&dir.join(STORE_FILE)).is_empty());
    }
}
