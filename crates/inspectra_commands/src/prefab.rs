use std::any::TypeId;

use bevy::{prelude::*, scene::SceneFilter};

use crate::{EditorCommand, snapshot::write_snapshot};

/// Source entity that prefab instances are stamped from. Templates stay
/// hidden and are never edited through an instance directly.
#[derive(Component, Reflect, Default, Clone, Copy, Debug)]
#[reflect(Component, Default)]
pub struct PrefabTemplate;

/// Links an instance to the template it was stamped from.
#[derive(Component, Reflect, Clone, Copy, Debug, PartialEq, Eq)]
#[reflect(Component)]
pub struct PrefabLink {
    pub template: Entity,
}

/// Components that belong to one instance and never travel between a
/// template and its instances.
fn instance_local() -> [TypeId; 8] {
    [
        TypeId::of::<Name>(),
        TypeId::of::<Transform>(),
        TypeId::of::<GlobalTransform>(),
        TypeId::of::<Visibility>(),
        TypeId::of::<InheritedVisibility>(),
        TypeId::of::<ViewVisibility>(),
        TypeId::of::<PrefabLink>(),
        TypeId::of::<PrefabTemplate>(),
    ]
}

fn shared_snapshot(world: &World, entity: Entity) -> DynamicScene {
    let filter = instance_local()
        .into_iter()
        .fold(SceneFilter::allow_all(), SceneFilter::deny_by_id)
        .deny_by_id(TypeId::of::<ChildOf>())
        .deny_by_id(TypeId::of::<Children>());
    DynamicSceneBuilder::from_world(world)
        .with_component_filter(filter)
        .extract_entity(entity)
        .build()
}

fn copy_shared(world: &mut World, source: Entity, target: Entity) {
    let scene = shared_snapshot(world, source);
    write_snapshot(world, &scene, source, target, &instance_local());
}

fn linked_template(world: &World, instance: Entity) -> Option<Entity> {
    let template = world.get::<PrefabLink>(instance)?.template;
    world.get::<PrefabTemplate>(template).map(|_| template)
}

/// Spawns a new instance of `template`, named after it.
pub fn instantiate_prefab(world: &mut World, template: Entity) -> Option<Entity> {
    world.get::<PrefabTemplate>(template)?;
    let name = world
        .get::<Name>(template)
        .cloned()
        .unwrap_or_else(|| Name::new("Prefab"));
    let instance = world
        .spawn((name, Transform::default(), PrefabLink { template }))
        .id();
    copy_shared(world, template, instance);
    Some(instance)
}

/// Pushes the instance's shared components into its template.
pub fn apply_prefab(world: &mut World, instance: Entity) -> bool {
    let Some(template) = linked_template(world, instance) else {
        return false;
    };
    copy_shared(world, instance, template);
    debug!("Applied {instance} to prefab template {template}");
    true
}

/// Overwrites the instance's shared components with the template's.
pub fn revert_prefab(world: &mut World, instance: Entity) -> bool {
    let Some(template) = linked_template(world, instance) else {
        return false;
    };
    copy_shared(world, template, instance);
    debug!("Reverted {instance} to prefab template {template}");
    true
}

// ---------------------------------------------------------------------------
// BreakPrefab
// ---------------------------------------------------------------------------

/// Unlinks an instance from its template, keeping its components.
pub struct BreakPrefab {
    pub entity: Entity,
    pub link: PrefabLink,
}

impl BreakPrefab {
    pub fn from_world(world: &World, entity: Entity) -> Option<Self> {
        let link = *world.get::<PrefabLink>(entity)?;
        Some(Self { entity, link })
    }
}

impl EditorCommand for BreakPrefab {
    fn execute(&self, world: &mut World) {
        if let Ok(mut entity) = world.get_entity_mut(self.entity) {
            entity.remove::<PrefabLink>();
        }
    }

    fn undo(&self, world: &mut World) {
        if let Ok(mut entity) = world.get_entity_mut(self.entity) {
            entity.insert(self.link);
        }
    }

    fn description(&self) -> &str {
        "Break prefab"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CommandHistory;

    #[derive(Component, Reflect, Default, Debug, PartialEq)]
    #[reflect(Component, Default)]
    struct Speed(f32);

    #[derive(Component, Reflect, Default, Debug, PartialEq)]
    #[reflect(Component, Default)]
    struct Glow;

    fn world() -> World {
        let mut world = World::new();
        let registry = AppTypeRegistry::default();
        {
            let mut registry = registry.write();
            registry.register::<Speed>();
            registry.register::<Glow>();
            registry.register::<PrefabLink>();
            registry.register::<PrefabTemplate>();
            registry.register::<Name>();
            registry.register::<Transform>();
        }
        world.insert_resource(registry);
        world
    }

    fn template(world: &mut World) -> Entity {
        world
            .spawn((PrefabTemplate, Name::new("Crate"), Speed(2.0)))
            .id()
    }

    #[test]
    fn instantiate_copies_shared_components() {
        let mut world = world();
        let template = template(&mut world);
        let instance = instantiate_prefab(&mut world, template).unwrap();

        assert_eq!(world.get::<Speed>(instance), Some(&Speed(2.0)));
        assert_eq!(world.get::<PrefabLink>(instance), Some(&PrefabLink { template }));
        assert!(world.get::<PrefabTemplate>(instance).is_none());
        assert_eq!(world.get::<Name>(instance).map(Name::as_str), Some("Crate"));
    }

    #[test]
    fn instantiate_requires_a_template() {
        let mut world = world();
        let plain = world.spawn(Speed(1.0)).id();
        assert!(instantiate_prefab(&mut world, plain).is_none());
    }

    #[test]
    fn revert_restores_template_values_and_keeps_placement() {
        let mut world = world();
        let template = template(&mut world);
        let instance = instantiate_prefab(&mut world, template).unwrap();
        world
            .entity_mut(instance)
            .insert((Speed(9.0), Glow, Transform::from_xyz(1.0, 2.0, 3.0)));

        assert!(revert_prefab(&mut world, instance));
        assert_eq!(world.get::<Speed>(instance), Some(&Speed(2.0)));
        assert!(world.get::<Glow>(instance).is_none());
        assert_eq!(
            world.get::<Transform>(instance).map(|t| t.translation),
            Some(Vec3::new(1.0, 2.0, 3.0))
        );
        assert!(world.get::<PrefabLink>(instance).is_some());
    }

    #[test]
    fn apply_updates_the_template() {
        let mut world = world();
        let template = template(&mut world);
        let instance = instantiate_prefab(&mut world, template).unwrap();
        world.entity_mut(instance).insert((Speed(4.0), Glow));

        assert!(apply_prefab(&mut world, instance));
        assert_eq!(world.get::<Speed>(template), Some(&Speed(4.0)));
        assert!(world.get::<Glow>(template).is_some());
        assert!(world.get::<PrefabTemplate>(template).is_some());
        assert!(world.get::<PrefabLink>(template).is_none());
    }

    #[test]
    fn unlinked_entities_are_ignored() {
        let mut world = world();
        let entity = world.spawn(Speed(1.0)).id();
        assert!(!apply_prefab(&mut world, entity));
        assert!(!revert_prefab(&mut world, entity));
        assert!(BreakPrefab::from_world(&world, entity).is_none());
    }

    #[test]
    fn break_is_undoable() {
        let mut world = world();
        let template = template(&mut world);
        let instance = instantiate_prefab(&mut world, template).unwrap();
        let mut history = CommandHistory::default();

        let command = BreakPrefab::from_world(&world, instance).unwrap();
        history.execute(Box::new(command), &mut world);
        assert!(world.get::<PrefabLink>(instance).is_none());
        assert_eq!(world.get::<Speed>(instance), Some(&Speed(2.0)));

        history.undo(&mut world);
        assert_eq!(world.get::<PrefabLink>(instance), Some(&PrefabLink { template }));
    }
}
