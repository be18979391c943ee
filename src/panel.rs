use bevy::{
    ecs::message::{MessageCursor, Messages},
    prelude::*,
    window::WindowResized,
};
use inspectra_fields::tokens;
use inspectra_sync::{InspectorRegistry, InspectorSettings, PropertyStore, SelectionCoordinator};

use crate::{
    config::{InspectorConfig, InspectorFiles, save_property_store},
    host::{WidgetTable, WorldHost},
    scene::object_id,
    selection::Selection,
};

/// UI node the inspector builds its content into.
#[derive(Component)]
pub struct InspectorPanel;

pub fn inspector_panel(settings: &InspectorSettings) -> impl Bundle {
    (
        InspectorPanel,
        Node {
            flex_direction: FlexDirection::Column,
            width: px(320),
            height: percent(100),
            padding: UiRect::all(px(settings.padding)),
            overflow: Overflow::clip(),
            ..default()
        },
        BackgroundColor(tokens::PANEL_BG),
    )
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct SelectionSnapshot {
    entities: Vec<Entity>,
    assets: Vec<String>,
}

impl SelectionSnapshot {
    fn of(selection: &Selection) -> Self {
        Self {
            entities: selection.entities.clone(),
            assets: selection.assets.clone(),
        }
    }
}

/// Inspector session: the coordinator, the widgets it owns and the selection
/// it currently shows.
#[derive(Resource)]
pub struct InspectorState {
    coordinator: SelectionCoordinator,
    widgets: WidgetTable,
    shown: Option<SelectionSnapshot>,
    resized: MessageCursor<WindowResized>,
}

impl InspectorState {
    pub fn new(settings: InspectorSettings, store: PropertyStore) -> Self {
        Self {
            coordinator: SelectionCoordinator::new(settings, InspectorRegistry::default())
                .with_store(store),
            widgets: WidgetTable::default(),
            shown: None,
            resized: MessageCursor::default(),
        }
    }

    pub fn coordinator(&self) -> &SelectionCoordinator {
        &self.coordinator
    }

    /// Register custom inspectors through [`SelectionCoordinator::registry_mut`].
    pub fn coordinator_mut(&mut self) -> &mut SelectionCoordinator {
        &mut self.coordinator
    }

    pub fn widgets(&self) -> &WidgetTable {
        &self.widgets
    }

    /// Rebuilds the display on the next frame as if the selection changed.
    pub fn invalidate(&mut self) {
        self.shown = None;
    }
}

/// One inspector frame: follows the selection and the window size, then
/// synchronizes the display with the inspected target.
pub fn sync_inspector(world: &mut World) {
    let Some(panel) = world
        .query_filtered::<Entity, With<InspectorPanel>>()
        .iter(world)
        .next()
    else {
        return;
    };
    let Some(selection) = world.get_resource::<Selection>().map(SelectionSnapshot::of) else {
        return;
    };

    world.try_resource_scope(|world, mut state: Mut<InspectorState>| {
        let state = &mut *state;
        let resized = world
            .get_resource::<Messages<WindowResized>>()
            .is_some_and(|messages| state.resized.read(messages).count() > 0);

        let mut host = WorldHost::new(world, &mut state.widgets, panel);
        if state.shown.as_ref() != Some(&selection) {
            let objects: Vec<_> = selection.entities.iter().copied().map(object_id).collect();
            state
                .coordinator
                .on_selection_changed(&mut host, &objects, &selection.assets);
            state.shown = Some(selection);
        }
        if resized {
            state.coordinator.on_resize();
        }
        if let Some(outcome) = state.coordinator.update(&mut host) {
            trace!("Inspector frame: {outcome:?}");
        }
    });
}

/// Applies settings edited at runtime and writes them back to disk.
pub(crate) fn apply_config_changes(
    config: Res<InspectorConfig>,
    files: Res<InspectorFiles>,
    mut state: ResMut<InspectorState>,
) {
    if !config.is_changed() || config.is_added() {
        return;
    }
    state.coordinator.set_settings(config.settings.clone());
    state.invalidate();
    match config.save_to(&files.settings) {
        Ok(()) => info!("Inspector settings saved to: {}", files.settings.display()),
        Err(err) => error!("Failed to save inspector settings: {err:#}"),
    }
}

pub(crate) fn save_ui_state_on_exit(
    mut exits: MessageReader<AppExit>,
    state: Res<InspectorState>,
    config: Res<InspectorConfig>,
    files: Res<InspectorFiles>,
) {
    if exits.read().next().is_none() || !config.persist_ui_state {
        return;
    }
    match save_property_store(state.coordinator.store(), &files.store) {
        Ok(()) => info!("Inspector state saved to: {}", files.store.display()),
        Err(err) => warn!("{err:#}"),
    }
}
