//! Collaborator contracts. The engine owns none of these; it observes and
//! mutates through them once per frame.

use bevy::math::{Rect, Vec2};

use crate::{
    fields::{FieldDescriptor, FieldValue, ObjectEdit, ObjectFields, WidgetEvent, WidgetSpec},
    ids::{ObjectId, SubObjectId, TypeKey, WidgetId},
    settings::CoordinateSpace,
};

/// Retained widget tree.
pub trait WidgetHost {
    /// `None` parent attaches the widget to the inspector window root.
    fn create(&mut self, parent: Option<WidgetId>, spec: WidgetSpec) -> WidgetId;
    /// Destroys the widget and its whole subtree. Unknown ids are ignored.
    fn destroy(&mut self, widget: WidgetId);
    fn destroy_children(&mut self, widget: WidgetId);
    /// Current bounds in window space.
    fn bounds(&self, widget: WidgetId) -> Rect;
    fn has_focus(&self, widget: WidgetId) -> bool;
    fn set_value(&mut self, widget: WidgetId, value: FieldValue);
    fn set_visible(&mut self, widget: WidgetId, visible: bool);
    /// Positions an overlay widget relative to its parent.
    fn place(&mut self, widget: WidgetId, rect: Rect);
    /// Drains every input event raised since the previous call.
    fn drain_events(&mut self) -> Vec<WidgetEvent>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubObjectInfo {
    pub id: SubObjectId,
    pub type_key: TypeKey,
}

/// Live scene objects. Every read tolerates a vanished object by returning
/// empty data.
pub trait SceneAccess {
    fn is_alive(&self, object: ObjectId) -> bool;
    /// Attached sub-objects in display order.
    fn sub_objects(&self, object: ObjectId) -> Vec<SubObjectInfo>;
    fn object_fields(&self, object: ObjectId, space: CoordinateSpace) -> Option<ObjectFields>;
    fn edit_object(&mut self, object: ObjectId, space: CoordinateSpace, edit: ObjectEdit) -> bool;
    fn sub_object_fields(&self, object: ObjectId, sub: SubObjectId) -> Vec<FieldDescriptor>;
    fn set_sub_object_field(
        &mut self,
        object: ObjectId,
        sub: SubObjectId,
        field: &str,
        value: FieldValue,
    ) -> bool;
    /// Whether `type_key` names a sub-object type that can be attached.
    fn can_attach(&self, type_key: &TypeKey) -> bool;
    fn add_sub_object(&mut self, object: ObjectId, type_key: &TypeKey) -> bool;
    fn remove_sub_object(&mut self, object: ObjectId, sub: SubObjectId) -> bool;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceKind {
    ScriptCode,
    Other,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceMeta {
    pub uuid: String,
    pub type_name: String,
    pub kind: ResourceKind,
}

/// Asset database.
pub trait ResourceLibrary {
    fn resource_meta(&self, path: &str) -> Option<ResourceMeta>;
    /// Types declared by a script asset, in declaration order.
    fn script_types(&self, path: &str) -> Vec<TypeKey>;
    fn resource_fields(&self, path: &str) -> Vec<FieldDescriptor>;
    fn set_resource_field(&mut self, path: &str, field: &str, value: FieldValue) -> bool;
}

/// Position in the undo log at the moment an inspection session started.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UndoAnchor(pub u64);

/// Append-only undo log, except for [`pop_at`](UndoLog::pop_at).
pub trait UndoLog {
    fn record_snapshot(&mut self, object: ObjectId, description: &str) -> UndoAnchor;
    /// Removes the entry at `anchor` if nothing was pushed after it.
    fn pop_at(&mut self, anchor: UndoAnchor) -> bool;
    fn apply_prefab(&mut self, object: ObjectId);
    fn revert_prefab(&mut self, object: ObjectId);
    fn break_prefab(&mut self, object: ObjectId);
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DragPhase {
    #[default]
    Idle,
    Dragging,
    /// The payload is being released this frame.
    Dropping,
}

#[derive(Clone, Debug, PartialEq)]
pub enum DragPayload {
    Resources(Vec<String>),
    SceneObjects(Vec<ObjectId>),
}

pub trait DragSource {
    fn drag_phase(&self) -> DragPhase;
    fn drag_payload(&self) -> Option<DragPayload>;
    /// Pointer position in window space.
    fn pointer_position(&self) -> Vec2;
}

pub trait DirtySink {
    fn mark_scene_dirty(&mut self);
}

/// Everything the inspector needs from its surroundings.
pub trait InspectorHost:
    WidgetHost + SceneAccess + ResourceLibrary + UndoLog + DragSource + DirtySink
{
}

impl<T> InspectorHost for T where
    T: WidgetHost + SceneAccess + ResourceLibrary + UndoLog + DragSource + DirtySink
{
}
