use std::{any::TypeId, collections::HashSet, sync::Mutex};

use bevy::{ecs::entity::EntityHashMap, prelude::*, scene::DynamicEntity};

use crate::EditorCommand;

/// Create a DynamicScene snapshot of a single entity, hierarchy excluded.
pub fn snapshot_entity(world: &World, entity: Entity) -> DynamicScene {
    DynamicSceneBuilder::from_world(world)
        .deny_component::<ChildOf>()
        .deny_component::<Children>()
        .extract_entities(std::iter::once(entity))
        .build()
}

/// Rebuild a DynamicScene by copying its entity data (since DynamicScene doesn't impl Clone).
pub fn snapshot_rebuild(scene: &DynamicScene) -> DynamicScene {
    DynamicScene {
        resources: scene.resources.iter().map(|r| r.to_dynamic()).collect(),
        entities: scene
            .entities
            .iter()
            .map(|e| DynamicEntity {
                entity: e.entity,
                components: e.components.iter().map(|c| c.to_dynamic()).collect(),
            })
            .collect(),
    }
}

/// Writes `scene` back onto `entity` in place. Reflected components the
/// snapshot does not contain are removed first.
pub fn restore_entity(world: &mut World, entity: Entity, scene: &DynamicScene) {
    write_snapshot(world, scene, entity, entity, &[]);
}

/// Writes the components `scene` holds for `source` onto `target`.
///
/// Reflected components of `target` missing from the snapshot are removed,
/// except hierarchy components and the types in `preserve`.
pub fn write_snapshot(
    world: &mut World,
    scene: &DynamicScene,
    source: Entity,
    target: Entity,
    preserve: &[TypeId],
) {
    let keep: HashSet<TypeId> = scene
        .entities
        .iter()
        .filter(|e| e.entity == source)
        .flat_map(|e| e.components.iter())
        .filter_map(|c| c.get_represented_type_info().map(|info| info.type_id()))
        .chain([TypeId::of::<ChildOf>(), TypeId::of::<Children>()])
        .chain(preserve.iter().copied())
        .collect();

    let stale: Vec<_> = {
        let registry = world.resource::<AppTypeRegistry>().clone();
        let registry = registry.read();
        let Ok(components) = world.inspect_entity(target) else {
            return;
        };
        components
            .filter_map(|info| {
                let type_id = info.type_id()?;
                registry.get(type_id)?.data::<ReflectComponent>()?;
                (!keep.contains(&type_id)).then_some(info.id())
            })
            .collect()
    };

    let mut entity_mut = world.entity_mut(target);
    for id in stale {
        entity_mut.remove_by_id(id);
    }

    let mut snapshot = snapshot_rebuild(scene);
    snapshot.entities.retain(|e| e.entity == source);
    let mut entity_map = EntityHashMap::default();
    entity_map.insert(source, target);
    if let Err(err) = snapshot.write_to_world(world, &mut entity_map) {
        warn!("Failed to write snapshot of {source} onto {target}: {err}");
    }
}

// ---------------------------------------------------------------------------
// RecordEntity: whole-entity snapshot for a series of live edits
// ---------------------------------------------------------------------------

/// Undo entry recorded before an entity is edited in place. Undo captures the
/// current state for redo and restores the recorded one.
pub struct RecordEntity {
    pub entity: Entity,
    pub label: String,
    before: DynamicScene,
    after: Mutex<Option<DynamicScene>>,
}

impl RecordEntity {
    pub fn from_world(world: &World, entity: Entity, label: impl Into<String>) -> Self {
        Self {
            entity,
            label: label.into(),
            before: snapshot_entity(world, entity),
            after: Mutex::new(None),
        }
    }
}

impl EditorCommand for RecordEntity {
    fn execute(&self, world: &mut World) {
        if let Ok(after) = self.after.lock()
            && let Some(scene) = after.as_ref()
        {
            restore_entity(world, self.entity, scene);
        }
    }

    fn undo(&self, world: &mut World) {
        if world.get_entity(self.entity).is_err() {
            return;
        }
        let current = snapshot_entity(world, self.entity);
        if let Ok(mut after) = self.after.lock() {
            *after = Some(current);
        }
        restore_entity(world, self.entity, &self.before);
    }

    fn description(&self) -> &str {
        &self.label
    }
}
