//! Per-frame reconciliation of one live scene object with its displayed
//! widget subtree.
//!
//! Each frame [`EntityView::sync_frame`] routes this frame's widget events,
//! compares the live sub-object list with the displayed one, then either
//! refreshes in place, prunes removed entries, or tears everything down and
//! rebuilds. Drop regions and the drag highlight are updated last.

use bevy::math::Rect;
use tracing::debug;

use crate::{
    drop_target::{self, ComponentGeometry, DropRegions, DropTarget},
    fields::{
        Axis, EditorKind, FieldValue, Mobility, ObjectEdit, PrefabStatus, WidgetEvent,
        WidgetEventKind, WidgetSpec,
    },
    host::{DragPhase, SubObjectInfo},
    ids::{ObjectId, SubObjectId, TypeKey, WidgetId},
    inspector::{Inspectable, Inspector, InspectorCx, InspectorRegistry},
    modification::ModificationState,
    store::{OwnerId, PropertyName},
};

/// What a call to [`EntityView::sync_frame`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Widgets were refreshed in place. Carries the frame's aggregate state.
    Refreshed(ModificationState),
    /// Entries of removed sub-objects were destroyed, the rest refreshed.
    Pruned(ModificationState),
    /// The whole subtree was rebuilt.
    Rebuilt,
    /// The inspected target no longer exists.
    TargetLost,
}

/// How the live sub-object list differs from the displayed one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Divergence {
    None,
    /// Live list is the displayed list minus the entries at these indices.
    Removed(Vec<usize>),
    /// Anything else: reorder, addition or replacement.
    Structural,
}

pub fn detect_divergence(displayed: &[SubObjectId], live: &[SubObjectId]) -> Divergence {
    if displayed == live {
        return Divergence::None;
    }
    if live.len() < displayed.len() {
        let mut removed = Vec::new();
        let mut next = 0;
        for (index, id) in displayed.iter().enumerate() {
            if live.get(next) == Some(id) {
                next += 1;
            } else {
                removed.push(index);
            }
        }
        if next == live.len() {
            return Divergence::Removed(removed);
        }
    }
    Divergence::Structural
}

/// Editable widget in the scene-object header.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HeaderField {
    Name,
    Active,
    Mobility,
    Position(Axis),
    Rotation(Axis),
    Scale(Axis),
    PrefabApply,
    PrefabRevert,
    PrefabBreak,
}

struct Header {
    name: WidgetId,
    active: WidgetId,
    mobility: WidgetId,
    prefab_row: WidgetId,
    prefab_buttons: Option<[WidgetId; 3]>,
    has_prefab: bool,
    position: [WidgetId; 3],
    rotation: [WidgetId; 3],
    scale: [WidgetId; 3],
}

impl Header {
    fn build(cx: &mut InspectorCx<'_>, parent: WidgetId) -> Self {
        let panel = cx.host.create(
            Some(parent),
            WidgetSpec::Panel {
                height: Some(cx.settings.header_height),
            },
        );
        let layout = cx.host.create(Some(panel), WidgetSpec::Column);

        let name_row = cx.host.create(Some(layout), WidgetSpec::Row);
        let active = cx.host.create(
            Some(name_row),
            WidgetSpec::Field {
                label: String::new(),
                kind: EditorKind::Bool,
                value: FieldValue::Bool(true),
            },
        );
        cx.host.create(Some(name_row), WidgetSpec::Space(3.0));
        cx.host
            .create(Some(name_row), WidgetSpec::Label("Name".to_string()));
        let name = cx.host.create(
            Some(name_row),
            WidgetSpec::Field {
                label: String::new(),
                kind: EditorKind::Text,
                value: FieldValue::Text(String::new()),
            },
        );

        let mobility_row = cx.host.create(Some(layout), WidgetSpec::Row);
        cx.host
            .create(Some(mobility_row), WidgetSpec::Label("Mobility".to_string()));
        let mobility = cx.host.create(
            Some(mobility_row),
            WidgetSpec::Field {
                label: String::new(),
                kind: EditorKind::Choice(Mobility::options()),
                value: FieldValue::Choice(Mobility::default().index()),
            },
        );

        let prefab_row = cx.host.create(Some(layout), WidgetSpec::Row);
        let position = vector_row(cx, layout, "Position");
        let rotation = vector_row(cx, layout, "Rotation");
        let scale = vector_row(cx, layout, "Scale");
        cx.host.create(Some(layout), WidgetSpec::FlexibleSpace);

        Self {
            name,
            active,
            mobility,
            prefab_row,
            prefab_buttons: None,
            has_prefab: false,
            position,
            rotation,
            scale,
        }
    }

    fn lookup(&self, widget: WidgetId) -> Option<HeaderField> {
        if widget == self.name {
            return Some(HeaderField::Name);
        }
        if widget == self.active {
            return Some(HeaderField::Active);
        }
        if widget == self.mobility {
            return Some(HeaderField::Mobility);
        }
        for axis in Axis::ALL {
            let i = axis.index();
            if widget == self.position[i] {
                return Some(HeaderField::Position(axis));
            }
            if widget == self.rotation[i] {
                return Some(HeaderField::Rotation(axis));
            }
            if widget == self.scale[i] {
                return Some(HeaderField::Scale(axis));
            }
        }
        let [apply, revert, brk] = self.prefab_buttons?;
        match widget {
            w if w == apply => Some(HeaderField::PrefabApply),
            w if w == revert => Some(HeaderField::PrefabRevert),
            w if w == brk => Some(HeaderField::PrefabBreak),
            _ => None,
        }
    }

    fn widget(&self, field: HeaderField) -> Option<WidgetId> {
        Some(match field {
            HeaderField::Name => self.name,
            HeaderField::Active => self.active,
            HeaderField::Mobility => self.mobility,
            HeaderField::Position(axis) => self.position[axis.index()],
            HeaderField::Rotation(axis) => self.rotation[axis.index()],
            HeaderField::Scale(axis) => self.scale[axis.index()],
            HeaderField::PrefabApply => self.prefab_buttons?[0],
            HeaderField::PrefabRevert => self.prefab_buttons?[1],
            HeaderField::PrefabBreak => self.prefab_buttons?[2],
        })
    }

    /// Pulls live values into every unfocused header widget. The prefab row
    /// is only rebuilt when the link status flips or `force` is set.
    fn refresh(&mut self, cx: &mut InspectorCx<'_>, object: ObjectId, force: bool) {
        let Some(fields) = cx.host.object_fields(object, cx.settings.coordinate_space) else {
            return;
        };

        set_unfocused(cx, self.name, FieldValue::Text(fields.name));
        set_unfocused(cx, self.active, FieldValue::Bool(fields.active));
        set_unfocused(cx, self.mobility, FieldValue::Choice(fields.mobility.index()));

        let has_prefab = fields.prefab == PrefabStatus::Instance;
        if force || has_prefab != self.has_prefab {
            self.rebuild_prefab_row(cx, has_prefab);
        }

        for axis in Axis::ALL {
            let i = axis.index();
            set_unfocused(cx, self.position[i], FieldValue::Float(axis.get(fields.position)));
            set_unfocused(cx, self.rotation[i], FieldValue::Float(axis.get(fields.rotation)));
            set_unfocused(cx, self.scale[i], FieldValue::Float(axis.get(fields.scale)));
        }
    }

    fn rebuild_prefab_row(&mut self, cx: &mut InspectorCx<'_>, has_prefab: bool) {
        cx.host.destroy_children(self.prefab_row);
        cx.host
            .create(Some(self.prefab_row), WidgetSpec::Label("Prefab".to_string()));
        self.prefab_buttons = if has_prefab {
            let mut button = |label: &str| {
                cx.host.create(
                    Some(self.prefab_row),
                    WidgetSpec::Button {
                        label: label.to_string(),
                        width: Some(60.0),
                    },
                )
            };
            Some([button("Apply"), button("Revert"), button("Break")])
        } else {
            cx.host
                .create(Some(self.prefab_row), WidgetSpec::Label("None".to_string()));
            None
        };
        self.has_prefab = has_prefab;
    }
}

fn vector_row(cx: &mut InspectorCx<'_>, layout: WidgetId, label: &str) -> [WidgetId; 3] {
    let row = cx.host.create(Some(layout), WidgetSpec::Row);
    cx.host
        .create(Some(row), WidgetSpec::Label(label.to_string()));
    Axis::ALL.map(|axis| {
        cx.host.create(
            Some(row),
            WidgetSpec::Field {
                label: axis.label().to_string(),
                kind: EditorKind::Float,
                value: FieldValue::Float(0.0),
            },
        )
    })
}

fn set_unfocused(cx: &mut InspectorCx<'_>, widget: WidgetId, value: FieldValue) {
    if !cx.host.has_focus(widget) {
        cx.host.set_value(widget, value);
    }
}

/// Displayed state of one sub-object: title bar, body panel and the inspector
/// filling it.
pub struct ComponentEntry {
    id: SubObjectId,
    type_key: TypeKey,
    spacer: WidgetId,
    title: WidgetId,
    foldout: WidgetId,
    remove_button: WidgetId,
    panel: WidgetId,
    inspector: Box<dyn Inspector>,
    folded: bool,
    title_rect: Rect,
    body_rect: Rect,
}

impl ComponentEntry {
    fn build(
        cx: &mut InspectorCx<'_>,
        registry: &InspectorRegistry,
        object: ObjectId,
        content: WidgetId,
        info: &SubObjectInfo,
    ) -> Self {
        let owner = OwnerId::SubObject(info.id);
        let expanded = cx.store.get_bool(&owner, &PropertyName::Expanded, true);

        let spacer = cx.host.create(
            Some(content),
            WidgetSpec::Space(cx.settings.component_spacing),
        );
        let title = cx.host.create(Some(content), WidgetSpec::Row);
        let foldout = cx.host.create(
            Some(title),
            WidgetSpec::Foldout {
                label: info.type_key.short_name().to_string(),
                expanded,
            },
        );
        let remove_button = cx.host.create(
            Some(title),
            WidgetSpec::Button {
                label: "X".to_string(),
                width: Some(cx.settings.remove_button_width),
            },
        );
        let panel = cx
            .host
            .create(Some(content), WidgetSpec::Panel { height: None });

        let mut inspector = registry.create(&info.type_key);
        inspector.initialize(
            cx,
            panel,
            Inspectable::SubObject {
                object,
                sub: info.id,
            },
            owner,
        );
        if !expanded {
            inspector.set_visible(cx, false);
            cx.host.set_visible(panel, false);
        }

        Self {
            id: info.id,
            type_key: info.type_key.clone(),
            spacer,
            title,
            foldout,
            remove_button,
            panel,
            inspector,
            folded: !expanded,
            title_rect: Rect::default(),
            body_rect: Rect::default(),
        }
    }

    fn destroy(mut self, cx: &mut InspectorCx<'_>) {
        self.inspector.destroy(cx);
        for widget in [self.spacer, self.title, self.panel] {
            cx.host.destroy(widget);
        }
    }

    pub fn id(&self) -> SubObjectId {
        self.id
    }

    pub fn type_key(&self) -> &TypeKey {
        &self.type_key
    }

    pub fn title(&self) -> WidgetId {
        self.title
    }

    pub fn foldout(&self) -> WidgetId {
        self.foldout
    }

    pub fn remove_button(&self) -> WidgetId {
        self.remove_button
    }

    pub fn panel(&self) -> WidgetId {
        self.panel
    }

    pub fn is_folded(&self) -> bool {
        self.folded
    }

    /// Every widget this entry created directly.
    pub fn widgets(&self) -> [WidgetId; 5] {
        [
            self.spacer,
            self.title,
            self.foldout,
            self.remove_button,
            self.panel,
        ]
    }
}

/// Inspector session for one live scene object.
pub struct EntityView {
    object: ObjectId,
    root: WidgetId,
    content: WidgetId,
    highlight: WidgetId,
    header: Header,
    entries: Vec<ComponentEntry>,
    drop_regions: DropRegions,
    content_rect: Rect,
    regions_stale: bool,
    drop_target: Option<DropTarget>,
    modification: ModificationState,
}

impl EntityView {
    pub fn build(
        cx: &mut InspectorCx<'_>,
        registry: &InspectorRegistry,
        object: ObjectId,
    ) -> Self {
        Self::construct(cx, registry, object, ModificationState::NotModified)
    }

    fn construct(
        cx: &mut InspectorCx<'_>,
        registry: &InspectorRegistry,
        object: ObjectId,
        modification: ModificationState,
    ) -> Self {
        let root = cx.host.create(None, WidgetSpec::ScrollArea);
        let container = cx
            .host
            .create(Some(root), WidgetSpec::Panel { height: None });
        let content = cx.host.create(Some(container), WidgetSpec::Column);
        let highlight = cx.host.create(Some(container), WidgetSpec::Highlight);
        cx.host.set_visible(highlight, false);

        let mut header = Header::build(cx, content);
        header.refresh(cx, object, true);

        let live = cx.host.sub_objects(object);
        let entries: Vec<ComponentEntry> = live
            .iter()
            .map(|info| ComponentEntry::build(cx, registry, object, content, info))
            .collect();
        cx.host.create(Some(content), WidgetSpec::FlexibleSpace);

        debug!(
            "Built inspector for {:?} with {} components",
            object,
            entries.len()
        );

        let mut view = Self {
            object,
            root,
            content,
            highlight,
            header,
            entries,
            drop_regions: DropRegions::default(),
            content_rect: Rect::default(),
            regions_stale: true,
            drop_target: None,
            modification,
        };
        view.update_drop_regions(cx);
        view
    }

    pub fn object(&self) -> ObjectId {
        self.object
    }

    pub fn root(&self) -> WidgetId {
        self.root
    }

    pub fn content(&self) -> WidgetId {
        self.content
    }

    pub fn highlight(&self) -> WidgetId {
        self.highlight
    }

    pub fn entries(&self) -> &[ComponentEntry] {
        &self.entries
    }

    pub fn header_widget(&self, field: HeaderField) -> Option<WidgetId> {
        self.header.widget(field)
    }

    pub fn modification(&self) -> ModificationState {
        self.modification
    }

    pub fn drop_regions(&self) -> &DropRegions {
        &self.drop_regions
    }

    pub fn drop_target(&self) -> Option<&DropTarget> {
        self.drop_target.as_ref()
    }

    /// Forces drop regions to be recomputed next frame.
    pub fn mark_layout_stale(&mut self) {
        self.regions_stale = true;
    }

    pub fn sync_frame(
        &mut self,
        cx: &mut InspectorCx<'_>,
        registry: &InspectorRegistry,
        events: &[WidgetEvent],
    ) -> FrameOutcome {
        if !cx.host.is_alive(self.object) {
            return FrameOutcome::TargetLost;
        }

        let event_state = self.apply_events(cx, events);

        let displayed: Vec<SubObjectId> = self.entries.iter().map(|e| e.id).collect();
        let live: Vec<SubObjectId> = cx
            .host
            .sub_objects(self.object)
            .into_iter()
            .map(|info| info.id)
            .collect();

        let outcome = match detect_divergence(&displayed, &live) {
            Divergence::None => FrameOutcome::Refreshed(self.refresh(cx, event_state)),
            Divergence::Removed(indices) => {
                self.prune(cx, &indices);
                FrameOutcome::Pruned(self.refresh(cx, event_state))
            }
            Divergence::Structural => {
                debug!(
                    "Sub-objects of {:?} diverged ({} displayed, {} live), rebuilding",
                    self.object,
                    displayed.len(),
                    live.len()
                );
                self.settle(cx, event_state);
                self.rebuild(cx, registry);
                FrameOutcome::Rebuilt
            }
        };

        self.update_drop_regions(cx);
        self.update_drag(cx);
        outcome
    }

    pub fn destroy(mut self, cx: &mut InspectorCx<'_>) {
        self.destroy_widgets(cx);
    }

    fn destroy_widgets(&mut self, cx: &mut InspectorCx<'_>) {
        for entry in self.entries.drain(..) {
            entry.destroy(cx);
        }
        cx.host.destroy(self.root);
    }

    fn rebuild(&mut self, cx: &mut InspectorCx<'_>, registry: &InspectorRegistry) {
        let modification = self.modification;
        self.destroy_widgets(cx);
        *self = Self::construct(cx, registry, self.object, modification);
    }

    fn prune(&mut self, cx: &mut InspectorCx<'_>, indices: &[usize]) {
        for &index in indices.iter().rev() {
            let entry = self.entries.remove(index);
            debug!("Pruned {} from inspector", entry.type_key);
            entry.destroy(cx);
        }
        self.regions_stale = true;
    }

    fn refresh(
        &mut self,
        cx: &mut InspectorCx<'_>,
        event_state: ModificationState,
    ) -> ModificationState {
        self.header.refresh(cx, self.object, false);

        let mut frame = event_state;
        for entry in &mut self.entries {
            frame = frame.combine(entry.inspector.refresh(cx));
        }
        self.settle(cx, frame);
        frame
    }

    /// Folds one frame's aggregate into the session state.
    fn settle(&mut self, cx: &mut InspectorCx<'_>, frame: ModificationState) {
        if frame.marks_dirty() {
            cx.host.mark_scene_dirty();
        }
        self.modification = self.modification.absorb(frame);
    }

    fn apply_events(
        &mut self,
        cx: &mut InspectorCx<'_>,
        events: &[WidgetEvent],
    ) -> ModificationState {
        let mut frame = ModificationState::NotModified;
        for event in events {
            if let Some(field) = self.header.lookup(event.widget) {
                if event.is_commit() {
                    let editing = frame == ModificationState::ModifyInProgress
                        || (frame == ModificationState::NotModified
                            && self.modification == ModificationState::ModifyInProgress);
                    if editing {
                        frame = ModificationState::Modified;
                    }
                } else {
                    frame = frame.combine(self.apply_header_event(cx, field, &event.kind));
                }
                continue;
            }

            if let Some(index) = self.entries.iter().position(|e| e.foldout == event.widget) {
                if let WidgetEventKind::Toggled(expanded) = event.kind {
                    self.set_folded(cx, index, !expanded);
                }
                continue;
            }

            if let Some(index) = self
                .entries
                .iter()
                .position(|e| e.remove_button == event.widget)
            {
                if event.kind == WidgetEventKind::Clicked {
                    self.remove_component(cx, index);
                }
                continue;
            }

            for entry in &mut self.entries {
                if entry.inspector.handle_event(cx, event) {
                    break;
                }
            }
        }
        frame
    }

    fn apply_header_event(
        &mut self,
        cx: &mut InspectorCx<'_>,
        field: HeaderField,
        kind: &WidgetEventKind,
    ) -> ModificationState {
        let space = cx.settings.coordinate_space;
        let edit = match (field, kind) {
            (HeaderField::Name, WidgetEventKind::ValueChanged(FieldValue::Text(name))) => {
                ObjectEdit::Name(name.clone())
            }
            (HeaderField::Active, WidgetEventKind::Toggled(active))
            | (HeaderField::Active, WidgetEventKind::ValueChanged(FieldValue::Bool(active))) => {
                ObjectEdit::Active(*active)
            }
            (HeaderField::Mobility, WidgetEventKind::ValueChanged(FieldValue::Choice(index))) => {
                let Some(mobility) = Mobility::from_index(*index) else {
                    return ModificationState::NotModified;
                };
                ObjectEdit::Mobility(mobility)
            }
            (HeaderField::Position(axis), WidgetEventKind::ValueChanged(value)) => {
                let Some(value) = value.as_f32() else {
                    return ModificationState::NotModified;
                };
                ObjectEdit::Position(axis, value)
            }
            (HeaderField::Rotation(axis), WidgetEventKind::ValueChanged(value)) => {
                let Some(value) = value.as_f32() else {
                    return ModificationState::NotModified;
                };
                ObjectEdit::Rotation(axis, value)
            }
            (HeaderField::Scale(axis), WidgetEventKind::ValueChanged(value)) => {
                let Some(value) = value.as_f32() else {
                    return ModificationState::NotModified;
                };
                ObjectEdit::Scale(axis, value)
            }
            (HeaderField::PrefabApply, WidgetEventKind::Clicked) => {
                cx.host.apply_prefab(self.object);
                return ModificationState::NotModified;
            }
            (HeaderField::PrefabRevert, WidgetEventKind::Clicked) => {
                let name = cx
                    .host
                    .object_fields(self.object, space)
                    .map(|fields| fields.name)
                    .unwrap_or_default();
                cx.host
                    .record_snapshot(self.object, &format!("Reverting \"{name}\" to prefab."));
                cx.host.revert_prefab(self.object);
                cx.host.mark_scene_dirty();
                return ModificationState::NotModified;
            }
            (HeaderField::PrefabBreak, WidgetEventKind::Clicked) => {
                cx.host.break_prefab(self.object);
                cx.host.mark_scene_dirty();
                return ModificationState::NotModified;
            }
            _ => return ModificationState::NotModified,
        };

        // Activation and mobility are discrete toggles outside the edit session.
        let tracked = !matches!(edit, ObjectEdit::Active(_) | ObjectEdit::Mobility(_));
        if cx.host.edit_object(self.object, space, edit) && tracked {
            ModificationState::ModifyInProgress
        } else {
            ModificationState::NotModified
        }
    }

    fn set_folded(&mut self, cx: &mut InspectorCx<'_>, index: usize, folded: bool) {
        let entry = &mut self.entries[index];
        cx.store
            .set_bool(OwnerId::SubObject(entry.id), PropertyName::Expanded, !folded);
        entry.inspector.set_visible(cx, !folded);
        cx.host.set_visible(entry.panel, !folded);
        entry.folded = folded;
        self.regions_stale = true;
    }

    fn remove_component(&mut self, cx: &mut InspectorCx<'_>, index: usize) {
        let id = self.entries[index].id;
        if cx.host.remove_sub_object(self.object, id) {
            debug!("Removed {} from {:?}", self.entries[index].type_key, self.object);
            self.modification = ModificationState::Modified;
            cx.host.mark_scene_dirty();
        }
    }

    fn update_drop_regions(&mut self, cx: &mut InspectorCx<'_>) {
        let content_rect = cx.host.bounds(self.content);
        let mut changed = self.regions_stale || content_rect != self.content_rect;
        for entry in &mut self.entries {
            let title = cx.host.bounds(entry.title);
            let body = cx.host.bounds(entry.panel);
            if title != entry.title_rect || body != entry.body_rect {
                entry.title_rect = title;
                entry.body_rect = body;
                changed = true;
            }
        }
        if !changed {
            return;
        }

        self.content_rect = content_rect;
        let geometry: Vec<ComponentGeometry> = self
            .entries
            .iter()
            .map(|entry| ComponentGeometry {
                title_height: entry.title_rect.height(),
                body_height: entry.body_rect.height(),
                folded: entry.folded,
            })
            .collect();
        self.drop_regions = DropRegions::compute(
            cx.settings.header_height,
            cx.settings.component_spacing,
            content_rect.size(),
            &geometry,
        );
        self.regions_stale = false;
    }

    fn update_drag(&mut self, cx: &mut InspectorCx<'_>) {
        let phase = cx.host.drag_phase();
        self.drop_target = match phase {
            DragPhase::Idle => None,
            DragPhase::Dragging | DragPhase::Dropping => {
                let pointer = cx.host.pointer_position() - self.content_rect.min;
                let payload = cx.host.drag_payload();
                drop_target::resolve(&self.drop_regions, pointer, payload.as_ref(), &*cx.host)
            }
        };

        let Some(target) = &self.drop_target else {
            cx.host.set_visible(self.highlight, false);
            return;
        };
        cx.host.place(self.highlight, target.rect);
        cx.host.set_visible(self.highlight, true);

        if phase == DragPhase::Dropping && cx.host.add_sub_object(self.object, &target.component) {
            debug!("Dropped {} onto {:?}", target.component, self.object);
            self.modification = ModificationState::Modified;
            cx.host.mark_scene_dirty();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use bevy::math::{Rect, Vec2, Vec3};

    use super::*;
    use crate::{
        fields::FieldDescriptor,
        headless::{HeadlessHost, PrefabOp},
        host::{DragPayload, ResourceKind, ResourceMeta, WidgetHost},
        settings::InspectorSettings,
        store::PropertyStore,
    };

    struct Fixture {
        host: HeadlessHost,
        store: PropertyStore,
        settings: InspectorSettings,
        registry: InspectorRegistry,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                host: HeadlessHost::default(),
                store: PropertyStore::default(),
                settings: InspectorSettings::default(),
                registry: InspectorRegistry::default(),
            }
        }

        fn build(&mut self, object: ObjectId) -> EntityView {
            let mut cx = InspectorCx {
                host: &mut self.host,
                store: &mut self.store,
                settings: &self.settings,
            };
            EntityView::build(&mut cx, &self.registry, object)
        }

        fn sync(&mut self, view: &mut EntityView) -> FrameOutcome {
            let events = self.host.drain_events();
            let mut cx = InspectorCx {
                host: &mut self.host,
                store: &mut self.store,
                settings: &self.settings,
            };
            view.sync_frame(&mut cx, &self.registry, &events)
        }

        fn object_with(&mut self, types: &[&str]) -> (ObjectId, Vec<SubObjectId>) {
            let object = self.host.spawn_object("Crate");
            let subs = types
                .iter()
                .map(|ty| {
                    self.host
                        .attach(object, *ty, vec![FieldDescriptor::float("speed", 1.0)])
                })
                .collect();
            (object, subs)
        }
    }

    fn ids(view: &EntityView) -> Vec<SubObjectId> {
        view.entries().iter().map(|e| e.id()).collect()
    }

    #[test]
    fn divergence_detection() {
        let [a, b, c] = [SubObjectId(1), SubObjectId(2), SubObjectId(3)];
        assert_eq!(detect_divergence(&[a, b, c], &[a, b, c]), Divergence::None);
        assert_eq!(
            detect_divergence(&[a, b, c], &[a, c]),
            Divergence::Removed(vec![1])
        );
        assert_eq!(
            detect_divergence(&[a, b, c], &[]),
            Divergence::Removed(vec![0, 1, 2])
        );
        assert_eq!(detect_divergence(&[a, b, c], &[c, a, b]), Divergence::Structural);
        assert_eq!(detect_divergence(&[a, b, c], &[c, a]), Divergence::Structural);
        assert_eq!(detect_divergence(&[a, b], &[a, b, c]), Divergence::Structural);
        assert_eq!(
            detect_divergence(&[a, b], &[a, SubObjectId(9)]),
            Divergence::Structural
        );
    }

    #[test]
    fn quiet_frames_touch_nothing() {
        let mut fx = Fixture::new();
        let (object, _) = fx.object_with(&["game::Spin", "game::Health"]);
        fx.host.update_object(object, |fields| fields.position = Vec3::new(1.0, 2.0, 3.0));
        let mut view = fx.build(object);
        fx.sync(&mut view);
        fx.host.clear_logs();
        let shown = fx.host.displayed_values();

        for _ in 0..3 {
            assert_eq!(
                fx.sync(&mut view),
                FrameOutcome::Refreshed(ModificationState::NotModified)
            );
            assert_eq!(fx.host.displayed_values(), shown);
        }
        let y = view.header_widget(HeaderField::Position(Axis::Y)).unwrap();
        assert_eq!(fx.host.value(y), Some(&FieldValue::Float(2.0)));
        let speed = fx.host.find_field(view.entries()[1].panel(), "speed").unwrap();
        assert_eq!(fx.host.value(speed), Some(&FieldValue::Float(1.0)));
        assert!(fx.host.created().is_empty());
        assert!(fx.host.destroyed().is_empty());
        assert_eq!(fx.host.dirty_marks(), 0);
        assert_eq!(view.modification(), ModificationState::NotModified);
    }

    #[test]
    fn reorder_rebuilds_every_widget() {
        let mut fx = Fixture::new();
        let (object, subs) = fx.object_with(&["game::A", "game::B", "game::C"]);
        let mut view = fx.build(object);
        let old: HashSet<WidgetId> = view.entries().iter().flat_map(|e| e.widgets()).collect();
        let old_root = view.root();

        fx.host.reorder(object, &[subs[2], subs[0], subs[1]]);
        assert_eq!(fx.sync(&mut view), FrameOutcome::Rebuilt);

        assert_eq!(ids(&view), vec![subs[2], subs[0], subs[1]]);
        assert!(!fx.host.is_live(old_root));
        assert!(old.iter().all(|w| !fx.host.is_live(*w)));
        assert!(
            view.entries()
                .iter()
                .flat_map(|e| e.widgets())
                .all(|w| !old.contains(&w) && fx.host.is_live(w))
        );
    }

    #[test]
    fn removal_prunes_only_the_removed_entry() {
        let mut fx = Fixture::new();
        let (object, subs) = fx.object_with(&["game::A", "game::B", "game::C"]);
        let mut view = fx.build(object);

        let b_foldout = view.entries()[1].foldout();
        fx.host.push_event(b_foldout, WidgetEventKind::Toggled(false));
        fx.sync(&mut view);

        let a = view.entries()[0].widgets();
        let b = view.entries()[1].widgets();
        let c = view.entries()[2].widgets();
        fx.host.clear_logs();

        fx.host.detach(object, subs[1]);
        assert_eq!(
            fx.sync(&mut view),
            FrameOutcome::Pruned(ModificationState::NotModified)
        );

        assert_eq!(ids(&view), vec![subs[0], subs[2]]);
        assert_eq!(view.entries()[0].widgets(), a);
        assert_eq!(view.entries()[1].widgets(), c);
        assert!(b.iter().all(|w| !fx.host.is_live(*w)));
        assert!(fx.host.created().is_empty());
        assert!(
            !fx.store
                .get_bool(&OwnerId::SubObject(subs[1]), &PropertyName::Expanded, true)
        );
    }

    #[test]
    fn addition_rebuilds() {
        let mut fx = Fixture::new();
        let (object, _) = fx.object_with(&["game::A"]);
        let mut view = fx.build(object);
        fx.host.attach(object, "game::B", Vec::new());
        assert_eq!(fx.sync(&mut view), FrameOutcome::Rebuilt);
        assert_eq!(view.entries().len(), 2);
        assert_eq!(view.entries()[1].type_key().short_name(), "B");
    }

    #[test]
    fn edits_coalesce_into_one_modification() {
        let mut fx = Fixture::new();
        let (object, subs) = fx.object_with(&["game::Spin"]);
        let mut view = fx.build(object);
        let speed = fx.host.find_field(view.entries()[0].panel(), "speed").unwrap();

        for value in [2.0, 3.0, 4.0] {
            fx.host
                .push_event(speed, WidgetEventKind::ValueChanged(FieldValue::Float(value)));
            assert_eq!(
                fx.sync(&mut view),
                FrameOutcome::Refreshed(ModificationState::ModifyInProgress)
            );
            assert_eq!(view.modification(), ModificationState::ModifyInProgress);
        }

        fx.host.push_event(speed, WidgetEventKind::Confirmed);
        assert_eq!(
            fx.sync(&mut view),
            FrameOutcome::Refreshed(ModificationState::Modified)
        );
        assert_eq!(view.modification(), ModificationState::Modified);
        assert_eq!(fx.host.dirty_marks(), 4);
        assert_eq!(
            fx.host.sub_object_field(object, subs[0], "speed"),
            Some(FieldValue::Float(4.0))
        );

        // Quiet frames keep the committed state.
        fx.sync(&mut view);
        assert_eq!(view.modification(), ModificationState::Modified);
        assert_eq!(fx.host.dirty_marks(), 4);
    }

    #[test]
    fn focused_fields_are_not_overwritten() {
        let mut fx = Fixture::new();
        let (object, _) = fx.object_with(&[]);
        let mut view = fx.build(object);
        let x = view.header_widget(HeaderField::Position(Axis::X)).unwrap();
        let y = view.header_widget(HeaderField::Position(Axis::Y)).unwrap();

        fx.host.set_focus(Some(x));
        fx.host
            .update_object(object, |fields| fields.position = Vec3::new(5.0, 6.0, 7.0));
        fx.sync(&mut view);

        assert_eq!(fx.host.value(x), Some(&FieldValue::Float(0.0)));
        assert_eq!(fx.host.value(y), Some(&FieldValue::Float(6.0)));

        fx.host.set_focus(None);
        fx.sync(&mut view);
        assert_eq!(fx.host.value(x), Some(&FieldValue::Float(5.0)));
    }

    #[test]
    fn header_edits_track_modification() {
        let mut fx = Fixture::new();
        let (object, _) = fx.object_with(&[]);
        let mut view = fx.build(object);
        let active = view.header_widget(HeaderField::Active).unwrap();
        let mobility = view.header_widget(HeaderField::Mobility).unwrap();
        let name = view.header_widget(HeaderField::Name).unwrap();

        fx.host.push_event(active, WidgetEventKind::Toggled(false));
        fx.host
            .push_event(mobility, WidgetEventKind::ValueChanged(FieldValue::Choice(0)));
        fx.sync(&mut view);
        assert_eq!(view.modification(), ModificationState::NotModified);
        assert_eq!(fx.host.dirty_marks(), 0);
        let fields = fx.host.object(object).unwrap();
        assert!(!fields.active);
        assert_eq!(fields.mobility, Mobility::Static);

        fx.host
            .push_event(name, WidgetEventKind::ValueChanged(FieldValue::Text("Barrel".into())));
        fx.sync(&mut view);
        assert_eq!(view.modification(), ModificationState::ModifyInProgress);
        assert_eq!(fx.host.object(object).unwrap().name, "Barrel");

        fx.host.push_event(name, WidgetEventKind::FocusLost);
        fx.sync(&mut view);
        assert_eq!(view.modification(), ModificationState::Modified);
    }

    #[test]
    fn change_and_confirm_in_one_frame_commits() {
        let mut fx = Fixture::new();
        let (object, _) = fx.object_with(&[]);
        let mut view = fx.build(object);
        let scale = view.header_widget(HeaderField::Scale(Axis::Z)).unwrap();

        fx.host
            .push_event(scale, WidgetEventKind::ValueChanged(FieldValue::Float(2.0)));
        fx.host.push_event(scale, WidgetEventKind::Confirmed);
        assert_eq!(
            fx.sync(&mut view),
            FrameOutcome::Refreshed(ModificationState::Modified)
        );
        assert_eq!(fx.host.object(object).unwrap().scale, Vec3::new(1.0, 1.0, 2.0));
    }

    #[test]
    fn fold_state_persists_across_rebuilds() {
        let mut fx = Fixture::new();
        let (object, subs) = fx.object_with(&["game::A", "game::B"]);
        let mut view = fx.build(object);
        let foldout = view.entries()[0].foldout();
        let panel = view.entries()[0].panel();

        fx.host.push_event(foldout, WidgetEventKind::Toggled(false));
        fx.sync(&mut view);
        assert!(view.entries()[0].is_folded());
        assert!(!fx.host.is_visible(panel));
        assert_eq!(fx.host.dirty_marks(), 0);

        let rebuilt = fx.build(object);
        assert!(rebuilt.entries()[0].is_folded());
        assert!(!rebuilt.entries()[1].is_folded());
        assert!(!fx.host.is_visible(rebuilt.entries()[0].panel()));
        assert!(
            !fx.store
                .get_bool(&OwnerId::SubObject(subs[0]), &PropertyName::Expanded, true)
        );
    }

    #[test]
    fn remove_button_detaches_component() {
        let mut fx = Fixture::new();
        let (object, subs) = fx.object_with(&["game::A", "game::B"]);
        let mut view = fx.build(object);
        let remove = view.entries()[0].remove_button();

        fx.host.push_event(remove, WidgetEventKind::Clicked);
        assert!(matches!(fx.sync(&mut view), FrameOutcome::Pruned(_)));
        assert_eq!(ids(&view), vec![subs[1]]);
        assert_eq!(view.modification(), ModificationState::Modified);
        assert_eq!(fx.host.dirty_marks(), 1);
    }

    #[test]
    fn prefab_row_follows_link_status() {
        let mut fx = Fixture::new();
        let (object, _) = fx.object_with(&[]);
        let mut view = fx.build(object);
        assert!(view.header_widget(HeaderField::PrefabApply).is_none());

        fx.host.set_prefab(object, PrefabStatus::Instance);
        fx.sync(&mut view);
        let revert = view.header_widget(HeaderField::PrefabRevert).unwrap();

        fx.host.clear_logs();
        fx.sync(&mut view);
        assert!(fx.host.created().is_empty());

        fx.host.push_event(revert, WidgetEventKind::Clicked);
        fx.sync(&mut view);
        assert_eq!(fx.host.prefab_ops(), &[(PrefabOp::Revert, object)]);
        assert_eq!(fx.host.undo_entries().len(), 1);
        assert_eq!(fx.host.dirty_marks(), 1);

        let brk = view.header_widget(HeaderField::PrefabBreak).unwrap();
        fx.host.push_event(brk, WidgetEventKind::Clicked);
        fx.sync(&mut view);
        fx.sync(&mut view);
        assert!(view.header_widget(HeaderField::PrefabBreak).is_none());
        assert!(!fx.host.is_live(brk));
    }

    #[test]
    fn dropping_a_script_attaches_its_component() {
        let mut fx = Fixture::new();
        let (object, _) = fx.object_with(&["game::A"]);
        fx.host
            .register_component_type("game::Spin", vec![FieldDescriptor::float("rate", 0.5)]);
        fx.host.add_resource(
            "scripts/spin.rs",
            ResourceMeta {
                uuid: "spin".into(),
                type_name: "Script".into(),
                kind: ResourceKind::ScriptCode,
            },
            Vec::new(),
            vec![TypeKey::new("game::Spin")],
        );
        let mut view = fx.build(object);
        fx.host
            .set_bounds(view.content(), Rect::new(0.0, 0.0, 300.0, 600.0));

        let payload = Some(DragPayload::Resources(vec!["scripts/spin.rs".into()]));
        fx.host
            .set_drag(DragPhase::Dragging, payload.clone(), Vec2::new(10.0, 300.0));
        fx.sync(&mut view);
        assert!(fx.host.is_visible(view.highlight()));
        assert_eq!(view.drop_target().map(|t| t.region), Some(1));
        assert_eq!(fx.host.dirty_marks(), 0);

        fx.host
            .set_drag(DragPhase::Dropping, payload, Vec2::new(10.0, 300.0));
        fx.sync(&mut view);
        assert_eq!(view.modification(), ModificationState::Modified);
        assert_eq!(fx.host.dirty_marks(), 1);

        fx.host.set_drag(DragPhase::Idle, None, Vec2::ZERO);
        assert_eq!(fx.sync(&mut view), FrameOutcome::Rebuilt);
        assert_eq!(view.entries().len(), 2);
        assert_eq!(view.entries()[1].type_key().short_name(), "Spin");
        assert!(!fx.host.is_visible(view.highlight()));
    }

    #[test]
    fn non_script_drag_shows_no_highlight() {
        let mut fx = Fixture::new();
        let (object, _) = fx.object_with(&[]);
        let mut view = fx.build(object);
        fx.host
            .set_bounds(view.content(), Rect::new(0.0, 0.0, 300.0, 600.0));
        let other = fx.host.spawn_object("Other");
        fx.host.set_drag(
            DragPhase::Dropping,
            Some(DragPayload::SceneObjects(vec![other])),
            Vec2::new(10.0, 300.0),
        );
        fx.sync(&mut view);
        assert!(!fx.host.is_visible(view.highlight()));
        assert_eq!(view.modification(), ModificationState::NotModified);
    }

    #[test]
    fn despawned_object_is_lost() {
        let mut fx = Fixture::new();
        let (object, _) = fx.object_with(&["game::A"]);
        let mut view = fx.build(object);
        fx.host.despawn_object(object);
        assert_eq!(fx.sync(&mut view), FrameOutcome::TargetLost);
    }
}
