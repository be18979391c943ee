//! Inspector panel next to a small scene.
//!
//! Keys: `1` selects the fan, `2` the crate instance, `3` both, `4` the
//! material asset, `0` clears. `D` starts dragging the spin script; release
//! the mouse over the panel to attach it.
//!
//! ```sh
//! cargo run --example inspector
//! ```

use bevy::prelude::*;
use inspectra::{
    InspectorPlugin,
    assets::{AssetEntry, AssetLibrary, DragState},
    config::InspectorConfig,
    panel::inspector_panel,
    selection::Selection,
    sync::{DragPayload, EditorKind, FieldDescriptor, FieldValue},
};
use inspectra_commands::{PrefabTemplate, instantiate_prefab};

#[derive(Component, Reflect, Default)]
#[reflect(Component, Default)]
struct Spin {
    speed: f32,
    reverse: bool,
}

#[derive(Component, Reflect, Default)]
#[reflect(Component, Default)]
struct Health {
    current: u32,
    max: u32,
}

#[derive(Resource)]
struct DemoEntities {
    fan: Entity,
    instance: Entity,
}

fn main() -> AppExit {
    App::new()
        .add_plugins((DefaultPlugins, InspectorPlugin))
        .register_type::<Spin>()
        .register_type::<Health>()
        .add_systems(Startup, (setup_ui, setup_scene))
        .add_systems(Update, (spin, select_with_keys))
        .run()
}

fn setup_ui(mut commands: Commands, config: Res<InspectorConfig>) {
    commands.spawn(Camera2d);
    commands.spawn(inspector_panel(&config.settings));
}

fn setup_scene(world: &mut World) {
    let fan = world
        .spawn((
            Name::new("Fan"),
            Transform::from_xyz(0.0, 1.0, 0.0),
            Spin {
                speed: 1.5,
                reverse: false,
            },
        ))
        .id();
    let template = world
        .spawn((
            PrefabTemplate,
            Name::new("Crate"),
            Visibility::Hidden,
            Health {
                current: 50,
                max: 50,
            },
        ))
        .id();
    let instance = instantiate_prefab(world, template).unwrap_or(template);
    world.insert_resource(DemoEntities { fan, instance });

    let mut library = world.resource_mut::<AssetLibrary>();
    library.insert("scripts/spin.rs", AssetEntry::script::<Spin>("5f0c-spin"));
    library.insert(
        "materials/metal.mat",
        AssetEntry::new("9a1e-metal", "Material")
            .with_field(FieldDescriptor::float("roughness", 0.4))
            .with_field(FieldDescriptor::bool("double_sided", false))
            .with_field(FieldDescriptor::new(
                "blend",
                EditorKind::Choice(vec!["Opaque".into(), "Mask".into(), "Blend".into()]),
                FieldValue::Choice(0),
            )),
    );
}

fn spin(time: Res<Time>, mut spinners: Query<(&Spin, &mut Transform)>) {
    for (spin, mut transform) in &mut spinners {
        let direction = if spin.reverse { -1.0 } else { 1.0 };
        transform.rotate_y(direction * spin.speed * time.delta_secs());
    }
}

fn select_with_keys(
    keyboard: Res<ButtonInput<KeyCode>>,
    demo: Res<DemoEntities>,
    mut selection: ResMut<Selection>,
    mut drag: ResMut<DragState>,
    mut commands: Commands,
) {
    if keyboard.just_pressed(KeyCode::Digit1) {
        selection.select_single(&mut commands, demo.fan);
    } else if keyboard.just_pressed(KeyCode::Digit2) {
        selection.select_single(&mut commands, demo.instance);
    } else if keyboard.just_pressed(KeyCode::Digit3) {
        selection.select_single(&mut commands, demo.fan);
        selection.extend(&mut commands, demo.instance);
    } else if keyboard.just_pressed(KeyCode::Digit4) {
        selection.select_asset(&mut commands, "materials/metal.mat");
    } else if keyboard.just_pressed(KeyCode::Digit0) {
        selection.clear(&mut commands);
    } else if keyboard.just_pressed(KeyCode::KeyD) {
        drag.begin(DragPayload::Resources(vec!["scripts/spin.rs".into()]));
    }
}
