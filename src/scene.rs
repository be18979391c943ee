use std::{any::TypeId, hash::BuildHasher};

use bevy::{
    ecs::component::{ComponentId, ComponentInfo},
    platform::hash::FixedHasher,
    prelude::*,
    transform::components::TransformTreeChanged,
};
use inspectra_commands::{PrefabLink, PrefabTemplate};
use inspectra_sync::{
    Axis, CoordinateSpace, FieldDescriptor, FieldValue, Mobility, ObjectEdit, ObjectFields,
    ObjectId, PrefabStatus, SceneAccess, SubObjectId, SubObjectInfo, TypeKey,
};

use crate::{
    host::WorldHost,
    reflect_fields::{ROOT_FIELD, collect_fields, write_leaf},
    selection::Selected,
};

/// How an entity may move at runtime. Shown in the inspector header.
#[derive(Component, Reflect, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[reflect(Component, Default)]
pub enum SceneMobility {
    Static,
    Stationary,
    #[default]
    Movable,
}

impl From<SceneMobility> for Mobility {
    fn from(value: SceneMobility) -> Self {
        match value {
            SceneMobility::Static => Mobility::Static,
            SceneMobility::Stationary => Mobility::Stationary,
            SceneMobility::Movable => Mobility::Movable,
        }
    }
}

impl From<Mobility> for SceneMobility {
    fn from(value: Mobility) -> Self {
        match value {
            Mobility::Static => SceneMobility::Static,
            Mobility::Stationary => SceneMobility::Stationary,
            Mobility::Movable => SceneMobility::Movable,
        }
    }
}

pub fn object_id(entity: Entity) -> ObjectId {
    ObjectId(entity.to_bits())
}

pub fn entity_of(object: ObjectId) -> Entity {
    Entity::from_bits(object.0)
}

/// Identifier of one component instance: the entity, the component and the
/// tick it was added at. Removing and re-adding a component yields a new id.
fn instance_id(entity_ref: &EntityRef, component: ComponentId) -> Option<SubObjectId> {
    let added = entity_ref.get_change_ticks_by_id(component)?.added;
    Some(SubObjectId(FixedHasher.hash_one((
        entity_ref.id().to_bits(),
        component.index(),
        added.get(),
    ))))
}

fn component_of(world: &World, entity: Entity, sub: SubObjectId) -> Option<ComponentId> {
    let entity_ref = world.get_entity(entity).ok()?;
    world
        .inspect_entity(entity)
        .ok()?
        .map(ComponentInfo::id)
        .find(|&component| instance_id(&entity_ref, component) == Some(sub))
}

/// Components edited through the header or owned by the editor itself.
/// They never show up as sub-objects.
fn is_header_component(type_id: TypeId) -> bool {
    [
        TypeId::of::<Name>(),
        TypeId::of::<Transform>(),
        TypeId::of::<GlobalTransform>(),
        TypeId::of::<TransformTreeChanged>(),
        TypeId::of::<Visibility>(),
        TypeId::of::<InheritedVisibility>(),
        TypeId::of::<ViewVisibility>(),
        TypeId::of::<ChildOf>(),
        TypeId::of::<Children>(),
        TypeId::of::<SceneMobility>(),
        TypeId::of::<PrefabLink>(),
        TypeId::of::<PrefabTemplate>(),
        TypeId::of::<Selected>(),
    ]
    .contains(&type_id)
}

fn euler_degrees(rotation: Quat) -> Vec3 {
    let (x, y, z) = rotation.to_euler(EulerRot::XYZ);
    Vec3::new(x.to_degrees(), y.to_degrees(), z.to_degrees())
}

fn from_euler_degrees(degrees: Vec3) -> Quat {
    Quat::from_euler(
        EulerRot::XYZ,
        degrees.x.to_radians(),
        degrees.y.to_radians(),
        degrees.z.to_radians(),
    )
}

fn parent_global(world: &World, entity: Entity) -> Option<GlobalTransform> {
    let parent = world.get::<ChildOf>(entity)?.parent();
    world.get::<GlobalTransform>(parent).copied()
}

/// World placement from the parent's global transform and the current local
/// one, so edits made earlier in the frame are already visible.
fn world_transform(world: &World, entity: Entity) -> Option<Transform> {
    let local = *world.get::<Transform>(entity)?;
    Some(match parent_global(world, entity) {
        Some(parent) => parent.mul_transform(local).compute_transform(),
        None => local,
    })
}

impl WorldHost<'_> {
    /// Reflected component of `sub` on `entity`, with its type id.
    fn reflected_component(&self, entity: Entity, sub: SubObjectId) -> Option<(TypeId, &dyn Reflect)> {
        let component = component_of(self.world, entity, sub)?;
        let type_id = self.world.components().get_info(component)?.type_id()?;
        let registry = self.world.get_resource::<AppTypeRegistry>()?.read();
        let reflect_component = registry.get(type_id)?.data::<ReflectComponent>()?.clone();
        drop(registry);
        let entity_ref = self.world.get_entity(entity).ok()?;
        reflect_component
            .reflect(entity_ref)
            .map(|reflected| (type_id, reflected))
    }

    /// Moves one axis of the position or rotation, honouring the coordinate
    /// space. World-space edits are converted through the parent transform.
    fn edit_placement(
        &mut self,
        entity: Entity,
        space: CoordinateSpace,
        edit: impl FnOnce(&mut Transform),
    ) -> bool {
        let Some(local) = self.world.get::<Transform>(entity).copied() else {
            return false;
        };
        let new_local = match space {
            CoordinateSpace::Local => {
                let mut local = local;
                edit(&mut local);
                local
            }
            CoordinateSpace::World => {
                let Some(mut desired) = world_transform(self.world, entity) else {
                    return false;
                };
                edit(&mut desired);
                match parent_global(self.world, entity) {
                    Some(parent) => {
                        let mut relative = GlobalTransform::from(desired).reparented_to(&parent);
                        relative.scale = local.scale;
                        relative
                    }
                    None => Transform {
                        scale: local.scale,
                        ..desired
                    },
                }
            }
        };
        if new_local == local {
            return false;
        }
        self.world.entity_mut(entity).insert(new_local);
        true
    }
}

impl SceneAccess for WorldHost<'_> {
    fn is_alive(&self, object: ObjectId) -> bool {
        self.world.get_entity(entity_of(object)).is_ok()
    }

    fn sub_objects(&self, object: ObjectId) -> Vec<SubObjectInfo> {
        let Some(registry) = self.world.get_resource::<AppTypeRegistry>() else {
            return Vec::new();
        };
        let registry = registry.read();
        let entity = entity_of(object);
        let (Ok(entity_ref), Ok(components)) =
            (self.world.get_entity(entity), self.world.inspect_entity(entity))
        else {
            return Vec::new();
        };
        let mut subs: Vec<_> = components
            .filter_map(|info| {
                let type_id = info.type_id()?;
                if is_header_component(type_id) {
                    return None;
                }
                let registration = registry.get(type_id)?;
                registration.data::<ReflectComponent>()?;
                let sub = SubObjectInfo {
                    id: instance_id(&entity_ref, info.id())?,
                    type_key: TypeKey::new(registration.type_info().type_path()),
                };
                Some((info.id().index(), sub))
            })
            .collect();
        subs.sort_by_key(|(order, _)| *order);
        subs.into_iter().map(|(_, sub)| sub).collect()
    }

    fn object_fields(&self, object: ObjectId, space: CoordinateSpace) -> Option<ObjectFields> {
        let entity = entity_of(object);
        let entity_ref = self.world.get_entity(entity).ok()?;
        let local = entity_ref.get::<Transform>().copied().unwrap_or_default();
        let placement = match space {
            CoordinateSpace::Local => local,
            CoordinateSpace::World => world_transform(self.world, entity).unwrap_or(local),
        };
        Some(ObjectFields {
            name: entity_ref
                .get::<Name>()
                .map(|name| name.as_str().to_string())
                .unwrap_or_default(),
            active: entity_ref.get::<Visibility>() != Some(&Visibility::Hidden),
            mobility: entity_ref
                .get::<SceneMobility>()
                .copied()
                .unwrap_or_default()
                .into(),
            prefab: if entity_ref.contains::<PrefabLink>() {
                PrefabStatus::Instance
            } else {
                PrefabStatus::None
            },
            position: placement.translation,
            rotation: euler_degrees(placement.rotation),
            scale: local.scale,
        })
    }

    fn edit_object(&mut self, object: ObjectId, space: CoordinateSpace, edit: ObjectEdit) -> bool {
        let entity = entity_of(object);
        match edit {
            ObjectEdit::Position(axis, value) => self.edit_placement(entity, space, |t| {
                t.translation = axis.with(t.translation, value);
            }),
            ObjectEdit::Rotation(axis, value) => self.edit_placement(entity, space, |t| {
                let degrees = axis.with(euler_degrees(t.rotation), value);
                t.rotation = from_euler_degrees(degrees);
            }),
            other => {
                let Ok(mut entity_mut) = self.world.get_entity_mut(entity) else {
                    return false;
                };
                match other {
                    ObjectEdit::Name(name) => {
                        entity_mut.insert(Name::new(name));
                    }
                    ObjectEdit::Active(active) => {
                        entity_mut.insert(if active {
                            Visibility::Inherited
                        } else {
                            Visibility::Hidden
                        });
                    }
                    ObjectEdit::Mobility(mobility) => {
                        entity_mut.insert(SceneMobility::from(mobility));
                    }
                    ObjectEdit::Scale(axis, value) => {
                        let Some(mut transform) = entity_mut.get_mut::<Transform>() else {
                            return false;
                        };
                        transform.scale = axis.with(transform.scale, value);
                    }
                    ObjectEdit::Position(..) | ObjectEdit::Rotation(..) => return false,
                }
                true
            }
        }
    }

    fn sub_object_fields(&self, object: ObjectId, sub: SubObjectId) -> Vec<FieldDescriptor> {
        self.reflected_component(entity_of(object), sub)
            .map(|(_, reflected)| collect_fields(reflected.as_partial_reflect()))
            .unwrap_or_default()
    }

    fn set_sub_object_field(
        &mut self,
        object: ObjectId,
        sub: SubObjectId,
        field: &str,
        value: FieldValue,
    ) -> bool {
        let entity = entity_of(object);
        let Some(type_id) = component_of(self.world, entity, sub)
            .and_then(|component| self.world.components().get_info(component))
            .and_then(|info| info.type_id())
        else {
            return false;
        };
        let Some(registry) = self.world.get_resource::<AppTypeRegistry>().cloned() else {
            return false;
        };
        let registry = registry.read();
        let Some(reflect_component) = registry
            .get(type_id)
            .and_then(|registration| registration.data::<ReflectComponent>())
        else {
            return false;
        };
        let Ok(entity_mut) = self.world.get_entity_mut(entity) else {
            return false;
        };
        let Some(reflected) = reflect_component.reflect_mut(entity_mut) else {
            return false;
        };
        let reflected = reflected.into_inner();
        if field == ROOT_FIELD && write_leaf(reflected.as_partial_reflect_mut(), &value) {
            return true;
        }
        match reflected.reflect_path_mut(field) {
            Ok(target) => write_leaf(target, &value),
            Err(err) => {
                debug!("No field {field} on {type_id:?}: {err}");
                false
            }
        }
    }

    fn can_attach(&self, type_key: &TypeKey) -> bool {
        let Some(registry) = self.world.get_resource::<AppTypeRegistry>() else {
            return false;
        };
        let registry = registry.read();
        registry
            .get_with_type_path(type_key.as_str())
            .is_some_and(|registration| {
                registration.data::<ReflectComponent>().is_some()
                    && registration.data::<ReflectDefault>().is_some()
                    && !is_header_component(registration.type_id())
            })
    }

    fn add_sub_object(&mut self, object: ObjectId, type_key: &TypeKey) -> bool {
        let entity = entity_of(object);
        let Some(registry) = self.world.get_resource::<AppTypeRegistry>().cloned() else {
            return false;
        };
        let registry = registry.read();
        let Some(registration) = registry.get_with_type_path(type_key.as_str()) else {
            return false;
        };
        if let Some(id) = self.world.components().get_id(registration.type_id())
            && self
                .world
                .get_entity(entity)
                .is_ok_and(|entity_ref| entity_ref.contains_id(id))
        {
            return false;
        }
        let Some(reflect_default) = registration.data::<ReflectDefault>() else {
            warn!("No ReflectDefault for {type_key}, cannot add it");
            return false;
        };
        let Some(reflect_component) = registration.data::<ReflectComponent>() else {
            return false;
        };
        let Ok(mut entity_mut) = self.world.get_entity_mut(entity) else {
            return false;
        };
        let default_value = reflect_default.default();
        reflect_component.insert(
            &mut entity_mut,
            default_value.as_partial_reflect(),
            &registry,
        );
        true
    }

    fn remove_sub_object(&mut self, object: ObjectId, sub: SubObjectId) -> bool {
        let entity = entity_of(object);
        let Some(component) = component_of(self.world, entity, sub) else {
            return false;
        };
        let Ok(mut entity_mut) = self.world.get_entity_mut(entity) else {
            return false;
        };
        entity_mut.remove_by_id(component);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::WidgetTable;

    #[derive(Component, Reflect, Default, Debug, PartialEq)]
    #[reflect(Component, Default)]
    struct Spin {
        speed: f32,
        reverse: bool,
    }

    #[derive(Component, Reflect, Debug, PartialEq)]
    #[reflect(Component)]
    struct NoDefault(u32);

    fn world() -> World {
        let mut world = World::new();
        let registry = AppTypeRegistry::default();
        {
            let mut registry = registry.write();
            registry.register::<Spin>();
            registry.register::<NoDefault>();
            registry.register::<Name>();
            registry.register::<Transform>();
            registry.register::<GlobalTransform>();
            registry.register::<Visibility>();
            registry.register::<SceneMobility>();
        }
        world.insert_resource(registry);
        world
    }

    fn with_host<R>(world: &mut World, f: impl FnOnce(&mut WorldHost) -> R) -> R {
        let root = world.spawn(Node::default()).id();
        let mut widgets = WidgetTable::default();
        let mut host = WorldHost::new(world, &mut widgets, root);
        f(&mut host)
    }

    #[test]
    fn header_components_are_not_sub_objects() {
        let mut world = world();
        let entity = world
            .spawn((Name::new("Fan"), Transform::default(), Spin::default()))
            .id();
        let subs = with_host(&mut world, |host| host.sub_objects(object_id(entity)));
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].type_key.short_name(), "Spin");
    }

    #[test]
    fn dead_entities_read_as_empty() {
        let mut world = world();
        let entity = world.spawn(Spin::default()).id();
        world.despawn(entity);
        with_host(&mut world, |host| {
            let object = object_id(entity);
            assert!(!host.is_alive(object));
            assert!(host.sub_objects(object).is_empty());
            assert!(host.object_fields(object, CoordinateSpace::World).is_none());
            assert!(!host.edit_object(object, CoordinateSpace::Local, ObjectEdit::Active(false)));
        });
    }

    #[test]
    fn reflected_fields_read_and_write() {
        let mut world = world();
        let entity = world.spawn(Spin { speed: 1.5, reverse: false }).id();
        with_host(&mut world, |host| {
            let object = object_id(entity);
            let sub = host.sub_objects(object)[0].id;
            let fields = host.sub_object_fields(object, sub);
            assert_eq!(fields[0], FieldDescriptor::float("speed", 1.5));
            assert_eq!(fields[1], FieldDescriptor::bool("reverse", false));

            assert!(host.set_sub_object_field(object, sub, "speed", FieldValue::Float(3.0)));
            assert!(!host.set_sub_object_field(object, sub, "missing", FieldValue::Float(3.0)));
            assert!(!host.set_sub_object_field(object, sub, "reverse", FieldValue::Text("x".into())));
        });
        assert_eq!(world.get::<Spin>(entity).map(|s| s.speed), Some(3.0));
    }

    #[test]
    fn header_edits_apply_to_the_entity() {
        let mut world = world();
        let entity = world.spawn((Name::new("Fan"), Transform::default())).id();
        with_host(&mut world, |host| {
            let object = object_id(entity);
            let space = CoordinateSpace::Local;
            assert!(host.edit_object(object, space, ObjectEdit::Name("Vent".into())));
            assert!(host.edit_object(object, space, ObjectEdit::Active(false)));
            assert!(host.edit_object(object, space, ObjectEdit::Mobility(Mobility::Static)));
            assert!(host.edit_object(object, space, ObjectEdit::Position(Axis::Y, 2.0)));
            assert!(host.edit_object(object, space, ObjectEdit::Rotation(Axis::Z, 90.0)));
            assert!(host.edit_object(object, space, ObjectEdit::Scale(Axis::X, 3.0)));

            let fields = host.object_fields(object, space).unwrap();
            assert_eq!(fields.name, "Vent");
            assert!(!fields.active);
            assert_eq!(fields.mobility, Mobility::Static);
            assert_eq!(fields.position, Vec3::new(0.0, 2.0, 0.0));
            assert!((fields.rotation.z - 90.0).abs() < 1e-3);
            assert_eq!(fields.scale, Vec3::new(3.0, 1.0, 1.0));
        });
    }

    #[test]
    fn world_space_edits_go_through_the_parent() {
        let mut world = world();
        let parent_transform = Transform::from_xyz(10.0, 0.0, 0.0);
        let parent = world
            .spawn((parent_transform, GlobalTransform::from(parent_transform)))
            .id();
        let child_local = Transform::from_xyz(1.0, 0.0, 0.0);
        let child = world
            .spawn((
                child_local,
                GlobalTransform::from(parent_transform * child_local),
                ChildOf(parent),
            ))
            .id();

        with_host(&mut world, |host| {
            let object = object_id(child);
            let fields = host.object_fields(object, CoordinateSpace::World).unwrap();
            assert_eq!(fields.position.x, 11.0);
            let fields = host.object_fields(object, CoordinateSpace::Local).unwrap();
            assert_eq!(fields.position.x, 1.0);

            assert!(host.edit_object(object, CoordinateSpace::World, ObjectEdit::Position(Axis::X, 15.0)));
        });
        let local = world.get::<Transform>(child).unwrap();
        assert!((local.translation.x - 5.0).abs() < 1e-4);
    }

    #[test]
    fn attach_requires_reflect_default() {
        let mut world = world();
        let entity = world.spawn(Transform::default()).id();
        with_host(&mut world, |host| {
            let object = object_id(entity);
            let spin = TypeKey::new(Spin::type_path());
            let no_default = TypeKey::new(NoDefault::type_path());
            assert!(host.can_attach(&spin));
            assert!(!host.can_attach(&no_default));
            assert!(!host.can_attach(&TypeKey::new(Transform::type_path())));
            assert!(!host.can_attach(&TypeKey::new("game::Unknown")));

            assert!(host.add_sub_object(object, &spin));
            assert!(!host.add_sub_object(object, &spin));
            assert!(!host.add_sub_object(object, &no_default));
        });
        assert_eq!(world.get::<Spin>(entity), Some(&Spin::default()));
    }

    #[test]
    fn remove_detaches_the_component() {
        let mut world = world();
        let entity = world.spawn(Spin::default()).id();
        with_host(&mut world, |host| {
            let object = object_id(entity);
            let sub = host.sub_objects(object)[0].id;
            assert!(host.remove_sub_object(object, sub));
            assert!(!host.remove_sub_object(object, sub));
        });
        assert!(world.get::<Spin>(entity).is_none());
    }

    #[test]
    fn sub_object_ids_are_per_instance() {
        let mut world = world();
        let a = world.spawn(Spin::default()).id();
        let b = world.spawn(Spin::default()).id();
        let (first, on_b) = with_host(&mut world, |host| {
            let first = host.sub_objects(object_id(a))[0].id;
            let on_b = host.sub_objects(object_id(b))[0].id;
            (first, on_b)
        });
        assert_ne!(first, on_b);

        world.increment_change_tick();
        world.entity_mut(a).remove::<Spin>();
        world.entity_mut(a).insert(Spin::default());
        with_host(&mut world, |host| {
            let object = object_id(a);
            let readded = host.sub_objects(object)[0].id;
            assert_ne!(readded, first);
            assert!(host.sub_object_fields(object, first).is_empty());
            assert!(!host.remove_sub_object(object, first));
            assert!(host.remove_sub_object(object, readded));
        });
        assert!(world.get::<Spin>(a).is_none());
    }
}
