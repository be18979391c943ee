//! Property inspector for Bevy scenes.
//!
//! Add [`InspectorPlugin`], spawn [`panel::inspector_panel`] somewhere in the
//! UI and drive [`selection::Selection`]. The panel follows the selection:
//! one entity shows its header and components, one asset shows its settings,
//! anything else shows a placeholder.

pub mod assets;
pub mod config;
pub mod host;
pub mod panel;
mod reflect_fields;
pub mod scene;
pub mod selection;

use bevy::prelude::*;
use inspectra_commands::CommandHistoryPlugin;
use inspectra_fields::{FieldsPlugin, FieldsSystems};

use crate::{
    assets::{AssetLibrary, DragState},
    config::{InspectorConfig, InspectorFiles, load_property_store},
    host::SceneDirty,
    panel::InspectorState,
    scene::SceneMobility,
};

pub use inspectra_sync as sync;

pub struct InspectorPlugin;

impl Plugin for InspectorPlugin {
    fn build(&self, app: &mut App) {
        let files = InspectorFiles::default();
        let config = InspectorConfig::load(&files.settings);
        let store = if config.persist_ui_state {
            load_property_store(&files.store)
        } else {
            default()
        };

        app.add_plugins((FieldsPlugin, CommandHistoryPlugin, selection::SelectionPlugin))
            .register_type::<SceneMobility>()
            .init_resource::<AssetLibrary>()
            .init_resource::<DragState>()
            .init_resource::<SceneDirty>()
            .insert_resource(InspectorState::new(config.settings.clone(), store))
            .insert_resource(config)
            .insert_resource(files)
            .add_systems(
                Update,
                (
                    assets::track_drag_pointer,
                    assets::release_drag_on_mouse_up,
                    panel::apply_config_changes,
                    panel::sync_inspector,
                    assets::finish_drop,
                )
                    .chain()
                    .after(FieldsSystems),
            )
            .add_systems(Last, panel::save_ui_state_on_exit);
    }
}
