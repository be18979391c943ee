//! In-memory [`InspectorHost`](crate::host::InspectorHost) for tests and
//! tooling that runs without a window.
//!
//! Objects have no hierarchy, so world and local coordinates coincide.

use std::collections::HashMap;

use bevy::math::{Rect, Vec2, Vec3};

use crate::{
    fields::{
        FieldDescriptor, FieldValue, ObjectEdit, ObjectFields, PrefabStatus, WidgetEvent,
        WidgetEventKind, WidgetSpec,
    },
    host::{
        DirtySink, DragPayload, DragPhase, DragSource, ResourceLibrary, ResourceMeta, SceneAccess,
        SubObjectInfo, UndoAnchor, UndoLog, WidgetHost,
    },
    ids::{ObjectId, SubObjectId, TypeKey, WidgetId},
    settings::CoordinateSpace,
};

#[derive(Clone, Debug)]
pub struct HeadlessWidget {
    pub parent: Option<WidgetId>,
    pub spec: WidgetSpec,
    pub children: Vec<WidgetId>,
    pub value: Option<FieldValue>,
    pub visible: bool,
    pub bounds: Rect,
    pub placed: Option<Rect>,
}

#[derive(Clone, Debug)]
struct HeadlessSubObject {
    id: SubObjectId,
    type_key: TypeKey,
    fields: Vec<FieldDescriptor>,
}

#[derive(Clone, Debug)]
struct HeadlessObject {
    fields: ObjectFields,
    sub_objects: Vec<HeadlessSubObject>,
}

#[derive(Clone, Debug)]
struct HeadlessResource {
    meta: ResourceMeta,
    fields: Vec<FieldDescriptor>,
    script_types: Vec<TypeKey>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UndoRecord {
    pub anchor: UndoAnchor,
    pub object: ObjectId,
    pub description: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrefabOp {
    Apply,
    Revert,
    Break,
}

#[derive(Default)]
pub struct HeadlessHost {
    next_widget: u64,
    widgets: HashMap<WidgetId, HeadlessWidget>,
    created: Vec<WidgetId>,
    destroyed: Vec<WidgetId>,
    focus: Option<WidgetId>,
    events: Vec<WidgetEvent>,
    next_object: u64,
    next_sub: u64,
    objects: HashMap<ObjectId, HeadlessObject>,
    attachable: HashMap<TypeKey, Vec<FieldDescriptor>>,
    resources: HashMap<String, HeadlessResource>,
    next_undo: u64,
    undo: Vec<UndoRecord>,
    prefab_ops: Vec<(PrefabOp, ObjectId)>,
    drag_phase: DragPhase,
    drag_payload: Option<DragPayload>,
    pointer: Vec2,
    dirty_marks: usize,
}

impl HeadlessHost {
    pub fn spawn_object(&mut self, name: &str) -> ObjectId {
        self.next_object += 1;
        let id = ObjectId(self.next_object);
        self.objects.insert(
            id,
            HeadlessObject {
                fields: ObjectFields {
                    name: name.to_string(),
                    active: true,
                    scale: Vec3::ONE,
                    ..Default::default()
                },
                sub_objects: Vec::new(),
            },
        );
        id
    }

    pub fn despawn_object(&mut self, object: ObjectId) {
        self.objects.remove(&object);
    }

    pub fn attach(
        &mut self,
        object: ObjectId,
        type_key: impl Into<String>,
        fields: Vec<FieldDescriptor>,
    ) -> SubObjectId {
        self.next_sub += 1;
        let id = SubObjectId(self.next_sub);
        if let Some(entry) = self.objects.get_mut(&object) {
            entry.sub_objects.push(HeadlessSubObject {
                id,
                type_key: TypeKey::new(type_key),
                fields,
            });
        }
        id
    }

    pub fn detach(&mut self, object: ObjectId, sub: SubObjectId) {
        if let Some(entry) = self.objects.get_mut(&object) {
            entry.sub_objects.retain(|s| s.id != sub);
        }
    }

    /// Reorders sub-objects to `order`. Ids not listed keep their relative
    /// order at the end.
    pub fn reorder(&mut self, object: ObjectId, order: &[SubObjectId]) {
        let Some(entry) = self.objects.get_mut(&object) else {
            return;
        };
        entry.sub_objects.sort_by_key(|s| {
            order
                .iter()
                .position(|id| *id == s.id)
                .unwrap_or(order.len())
        });
    }

    pub fn replace_fields(&mut self, object: ObjectId, sub: SubObjectId, fields: Vec<FieldDescriptor>) {
        if let Some(sub) = self.sub_object_mut(object, sub) {
            sub.fields = fields;
        }
    }

    pub fn object(&self, object: ObjectId) -> Option<&ObjectFields> {
        self.objects.get(&object).map(|o| &o.fields)
    }

    pub fn update_object(&mut self, object: ObjectId, update: impl FnOnce(&mut ObjectFields)) {
        if let Some(entry) = self.objects.get_mut(&object) {
            update(&mut entry.fields);
        }
    }

    pub fn set_prefab(&mut self, object: ObjectId, status: PrefabStatus) {
        self.update_object(object, |fields| fields.prefab = status);
    }

    pub fn sub_object_field(&self, object: ObjectId, sub: SubObjectId, field: &str) -> Option<FieldValue> {
        self.objects
            .get(&object)?
            .sub_objects
            .iter()
            .find(|s| s.id == sub)?
            .fields
            .iter()
            .find(|f| f.name == field)
            .map(|f| f.value.clone())
    }

    pub fn register_component_type(&mut self, type_key: impl Into<String>, fields: Vec<FieldDescriptor>) {
        self.attachable.insert(TypeKey::new(type_key), fields);
    }

    pub fn add_resource(
        &mut self,
        path: &str,
        meta: ResourceMeta,
        fields: Vec<FieldDescriptor>,
        script_types: Vec<TypeKey>,
    ) {
        self.resources.insert(
            path.to_string(),
            HeadlessResource {
                meta,
                fields,
                script_types,
            },
        );
    }

    pub fn remove_resource(&mut self, path: &str) {
        self.resources.remove(path);
    }

    pub fn push_event(&mut self, widget: WidgetId, kind: WidgetEventKind) {
        self.events.push(WidgetEvent::new(widget, kind));
    }

    pub fn set_focus(&mut self, widget: Option<WidgetId>) {
        self.focus = widget;
    }

    pub fn set_bounds(&mut self, widget: WidgetId, bounds: Rect) {
        if let Some(w) = self.widgets.get_mut(&widget) {
            w.bounds = bounds;
        }
    }

    pub fn set_drag(&mut self, phase: DragPhase, payload: Option<DragPayload>, pointer: Vec2) {
        self.drag_phase = phase;
        self.drag_payload = payload;
        self.pointer = pointer;
    }

    pub fn widget(&self, widget: WidgetId) -> Option<&HeadlessWidget> {
        self.widgets.get(&widget)
    }

    pub fn is_live(&self, widget: WidgetId) -> bool {
        self.widgets.contains_key(&widget)
    }

    pub fn is_visible(&self, widget: WidgetId) -> bool {
        self.widgets.get(&widget).is_some_and(|w| w.visible)
    }

    pub fn value(&self, widget: WidgetId) -> Option<&FieldValue> {
        self.widgets.get(&widget)?.value.as_ref()
    }

    /// Every value currently shown, ordered by widget.
    pub fn displayed_values(&self) -> Vec<(WidgetId, FieldValue)> {
        let mut values: Vec<_> = self
            .widgets
            .iter()
            .filter_map(|(id, widget)| Some((*id, widget.value.clone()?)))
            .collect();
        values.sort_by_key(|(id, _)| *id);
        values
    }

    pub fn live_widget_count(&self) -> usize {
        self.widgets.len()
    }

    pub fn created(&self) -> &[WidgetId] {
        &self.created
    }

    pub fn destroyed(&self) -> &[WidgetId] {
        &self.destroyed
    }

    pub fn clear_logs(&mut self) {
        self.created.clear();
        self.destroyed.clear();
    }

    /// Depth-first search below `root` for the first widget whose spec matches.
    pub fn find(&self, root: WidgetId, predicate: impl Fn(&WidgetSpec) -> bool) -> Option<WidgetId> {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let widget = self.widgets.get(&id)?;
            if predicate(&widget.spec) {
                return Some(id);
            }
            stack.extend(widget.children.iter().rev());
        }
        None
    }

    pub fn find_label(&self, root: WidgetId, text: &str) -> Option<WidgetId> {
        self.find(root, |spec| matches!(spec, WidgetSpec::Label(label) if label == text))
    }

    pub fn find_field(&self, root: WidgetId, name: &str) -> Option<WidgetId> {
        self.find(root, |spec| matches!(spec, WidgetSpec::Field { label, .. } if label == name))
    }

    pub fn undo_entries(&self) -> &[UndoRecord] {
        &self.undo
    }

    /// Simulates an unrelated edit recorded by another tool.
    pub fn push_undo(&mut self, object: ObjectId, description: &str) -> UndoAnchor {
        self.record_snapshot(object, description)
    }

    pub fn prefab_ops(&self) -> &[(PrefabOp, ObjectId)] {
        &self.prefab_ops
    }

    pub fn dirty_marks(&self) -> usize {
        self.dirty_marks
    }

    fn sub_object_mut(&mut self, object: ObjectId, sub: SubObjectId) -> Option<&mut HeadlessSubObject> {
        self.objects
            .get_mut(&object)?
            .sub_objects
            .iter_mut()
            .find(|s| s.id == sub)
    }

    fn remove_subtree(&mut self, widget: WidgetId) {
        let Some(removed) = self.widgets.remove(&widget) else {
            return;
        };
        self.destroyed.push(widget);
        if self.focus == Some(widget) {
            self.focus = None;
        }
        for child in removed.children {
            self.remove_subtree(child);
        }
    }
}

fn initial_value(spec: &WidgetSpec) -> Option<FieldValue> {
    match spec {
        WidgetSpec::Field { value, .. } => Some(value.clone()),
        WidgetSpec::Foldout { expanded, .. } => Some(FieldValue::Bool(*expanded)),
        _ => None,
    }
}

impl WidgetHost for HeadlessHost {
    fn create(&mut self, parent: Option<WidgetId>, spec: WidgetSpec) -> WidgetId {
        self.next_widget += 1;
        let id = WidgetId(self.next_widget);
        if let Some(parent) = parent.and_then(|p| self.widgets.get_mut(&p)) {
            parent.children.push(id);
        }
        self.widgets.insert(
            id,
            HeadlessWidget {
                parent,
                value: initial_value(&spec),
                spec,
                children: Vec::new(),
                visible: true,
                bounds: Rect::default(),
                placed: None,
            },
        );
        self.created.push(id);
        id
    }

    fn destroy(&mut self, widget: WidgetId) {
        let parent = self.widgets.get(&widget).and_then(|w| w.parent);
        if let Some(parent) = parent.and_then(|p| self.widgets.get_mut(&p)) {
            parent.children.retain(|c| *c != widget);
        }
        self.remove_subtree(widget);
    }

    fn destroy_children(&mut self, widget: WidgetId) {
        let children = match self.widgets.get_mut(&widget) {
            Some(w) => std::mem::take(&mut w.children),
            None => return,
        };
        for child in children {
            self.remove_subtree(child);
        }
    }

    fn bounds(&self, widget: WidgetId) -> Rect {
        self.widgets
            .get(&widget)
            .map(|w| w.bounds)
            .unwrap_or_default()
    }

    fn has_focus(&self, widget: WidgetId) -> bool {
        self.focus == Some(widget)
    }

    fn set_value(&mut self, widget: WidgetId, value: FieldValue) {
        if let Some(w) = self.widgets.get_mut(&widget) {
            w.value = Some(value);
        }
    }

    fn set_visible(&mut self, widget: WidgetId, visible: bool) {
        if let Some(w) = self.widgets.get_mut(&widget) {
            w.visible = visible;
        }
    }

    fn place(&mut self, widget: WidgetId, rect: Rect) {
        if let Some(w) = self.widgets.get_mut(&widget) {
            w.placed = Some(rect);
        }
    }

    fn drain_events(&mut self) -> Vec<WidgetEvent> {
        std::mem::take(&mut self.events)
    }
}

impl SceneAccess for HeadlessHost {
    fn is_alive(&self, object: ObjectId) -> bool {
        self.objects.contains_key(&object)
    }

    fn sub_objects(&self, object: ObjectId) -> Vec<SubObjectInfo> {
        self.objects
            .get(&object)
            .map(|o| {
                o.sub_objects
                    .iter()
                    .map(|s| SubObjectInfo {
                        id: s.id,
                        type_key: s.type_key.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn object_fields(&self, object: ObjectId, _space: CoordinateSpace) -> Option<ObjectFields> {
        self.objects.get(&object).map(|o| o.fields.clone())
    }

    fn edit_object(&mut self, object: ObjectId, _space: CoordinateSpace, edit: ObjectEdit) -> bool {
        let Some(entry) = self.objects.get_mut(&object) else {
            return false;
        };
        let fields = &mut entry.fields;
        match edit {
            ObjectEdit::Name(name) => fields.name = name,
            ObjectEdit::Active(active) => fields.active = active,
            ObjectEdit::Mobility(mobility) => fields.mobility = mobility,
            ObjectEdit::Position(axis, value) => fields.position = axis.with(fields.position, value),
            ObjectEdit::Rotation(axis, value) => fields.rotation = axis.with(fields.rotation, value),
            ObjectEdit::Scale(axis, value) => fields.scale = axis.with(fields.scale, value),
        }
        true
    }

    fn sub_object_fields(&self, object: ObjectId, sub: SubObjectId) -> Vec<FieldDescriptor> {
        self.objects
            .get(&object)
            .and_then(|o| o.sub_objects.iter().find(|s| s.id == sub))
            .map(|s| s.fields.clone())
            .unwrap_or_default()
    }

    fn set_sub_object_field(
        &mut self,
        object: ObjectId,
        sub: SubObjectId,
        field: &str,
        value: FieldValue,
    ) -> bool {
        let Some(sub) = self.sub_object_mut(object, sub) else {
            return false;
        };
        match sub.fields.iter_mut().find(|f| f.name == field) {
            Some(descriptor) => {
                descriptor.value = value;
                true
            }
            None => false,
        }
    }

    fn can_attach(&self, type_key: &TypeKey) -> bool {
        self.attachable.contains_key(type_key)
    }

    fn add_sub_object(&mut self, object: ObjectId, type_key: &TypeKey) -> bool {
        let Some(fields) = self.attachable.get(type_key).cloned() else {
            return false;
        };
        if !self.objects.contains_key(&object) {
            return false;
        }
        self.attach(object, type_key.as_str(), fields);
        true
    }

    fn remove_sub_object(&mut self, object: ObjectId, sub: SubObjectId) -> bool {
        let Some(entry) = self.objects.get_mut(&object) else {
            return false;
        };
        let before = entry.sub_objects.len();
        entry.sub_objects.retain(|s| s.id != sub);
        entry.sub_objects.len() != before
    }
}

impl ResourceLibrary for HeadlessHost {
    fn resource_meta(&self, path: &str) -> Option<ResourceMeta> {
        self.resources.get(path).map(|r| r.meta.clone())
    }

    fn script_types(&self, path: &str) -> Vec<TypeKey> {
        self.resources
            .get(path)
            .map(|r| r.script_types.clone())
            .unwrap_or_default()
    }

    fn resource_fields(&self, path: &str) -> Vec<FieldDescriptor> {
        self.resources
            .get(path)
            .map(|r| r.fields.clone())
            .unwrap_or_default()
    }

    fn set_resource_field(&mut self, path: &str, field: &str, value: FieldValue) -> bool {
        let Some(resource) = self.resources.get_mut(path) else {
            return false;
        };
        match resource.fields.iter_mut().find(|f| f.name == field) {
            Some(descriptor) => {
                descriptor.value = value;
                true
            }
            None => false,
        }
    }
}

impl UndoLog for HeadlessHost {
    fn record_snapshot(&mut self, object: ObjectId, description: &str) -> UndoAnchor {
        self.next_undo += 1;
        let anchor = UndoAnchor(self.next_undo);
        self.undo.push(UndoRecord {
            anchor,
            object,
            description: description.to_string(),
        });
        anchor
    }

    fn pop_at(&mut self, anchor: UndoAnchor) -> bool {
        if self.undo.last().is_some_and(|entry| entry.anchor == anchor) {
            self.undo.pop();
            true
        } else {
            false
        }
    }

    fn apply_prefab(&mut self, object: ObjectId) {
        self.prefab_ops.push((PrefabOp::Apply, object));
    }

    fn revert_prefab(&mut self, object: ObjectId) {
        self.prefab_ops.push((PrefabOp::Revert, object));
    }

    fn break_prefab(&mut self, object: ObjectId) {
        self.prefab_ops.push((PrefabOp::Break, object));
        self.set_prefab(object, PrefabStatus::None);
    }
}

impl DragSource for HeadlessHost {
    fn drag_phase(&self) -> DragPhase {
        self.drag_phase
    }

    fn drag_payload(&self) -> Option<DragPayload> {
        self.drag_payload.clone()
    }

    fn pointer_position(&self) -> Vec2 {
        self.pointer
    }
}

impl DirtySink for HeadlessHost {
    fn mark_scene_dirty(&mut self) {
        self.dirty_marks += 1;
    }
}
