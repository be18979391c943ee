use std::collections::HashMap;

use bevy::{prelude::*, reflect::TypePath, window::PrimaryWindow};
use inspectra_sync::{
    DragPayload, DragPhase, DragSource, EditorKind, FieldDescriptor, FieldValue, ResourceKind,
    ResourceLibrary, ResourceMeta, TypeKey,
};

use crate::host::WorldHost;

/// Metadata and editable settings of one asset.
#[derive(Clone, Debug, PartialEq)]
pub struct AssetEntry {
    pub uuid: String,
    pub type_name: String,
    pub kind: ResourceKind,
    /// Component types a script asset declares, in declaration order.
    pub script_types: Vec<TypeKey>,
    pub fields: Vec<FieldDescriptor>,
}

impl AssetEntry {
    pub fn new(uuid: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            type_name: type_name.into(),
            kind: ResourceKind::Other,
            script_types: Vec::new(),
            fields: Vec::new(),
        }
    }

    /// A script asset declaring the component `T`.
    pub fn script<T: TypePath>(uuid: impl Into<String>) -> Self {
        Self {
            kind: ResourceKind::ScriptCode,
            script_types: vec![TypeKey::new(T::type_path())],
            ..Self::new(uuid, "Script")
        }
    }

    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn meta(&self) -> ResourceMeta {
        ResourceMeta {
            uuid: self.uuid.clone(),
            type_name: self.type_name.clone(),
            kind: self.kind,
        }
    }
}

/// In-memory asset database keyed by asset path.
#[derive(Resource, Default, Debug)]
pub struct AssetLibrary {
    entries: HashMap<String, AssetEntry>,
}

impl AssetLibrary {
    pub fn insert(&mut self, path: impl Into<String>, entry: AssetEntry) {
        self.entries.insert(path.into(), entry);
    }

    pub fn remove(&mut self, path: &str) -> Option<AssetEntry> {
        self.entries.remove(path)
    }

    pub fn get(&self, path: &str) -> Option<&AssetEntry> {
        self.entries.get(path)
    }

    pub fn get_mut(&mut self, path: &str) -> Option<&mut AssetEntry> {
        self.entries.get_mut(path)
    }
}

/// Converts `value` to the shape `kind` stores, if it fits.
fn coerce(kind: &EditorKind, value: FieldValue) -> Option<FieldValue> {
    match (kind, value) {
        (EditorKind::Float, value) => value.as_f32().map(FieldValue::Float),
        (EditorKind::Int, FieldValue::Int(v)) => Some(FieldValue::Int(v)),
        (EditorKind::Bool, FieldValue::Bool(v)) => Some(FieldValue::Bool(v)),
        (EditorKind::Text, FieldValue::Text(v)) => Some(FieldValue::Text(v)),
        (EditorKind::Choice(options), FieldValue::Choice(index)) if index < options.len() => {
            Some(FieldValue::Choice(index))
        }
        _ => None,
    }
}

impl ResourceLibrary for WorldHost<'_> {
    fn resource_meta(&self, path: &str) -> Option<ResourceMeta> {
        self.world
            .get_resource::<AssetLibrary>()?
            .get(path)
            .map(AssetEntry::meta)
    }

    fn script_types(&self, path: &str) -> Vec<TypeKey> {
        self.world
            .get_resource::<AssetLibrary>()
            .and_then(|library| library.get(path))
            .filter(|entry| entry.kind == ResourceKind::ScriptCode)
            .map(|entry| entry.script_types.clone())
            .unwrap_or_default()
    }

    fn resource_fields(&self, path: &str) -> Vec<FieldDescriptor> {
        self.world
            .get_resource::<AssetLibrary>()
            .and_then(|library| library.get(path))
            .map(|entry| entry.fields.clone())
            .unwrap_or_default()
    }

    fn set_resource_field(&mut self, path: &str, field: &str, value: FieldValue) -> bool {
        let Some(mut library) = self.world.get_resource_mut::<AssetLibrary>() else {
            return false;
        };
        let Some(descriptor) = library
            .get_mut(path)
            .and_then(|entry| entry.fields.iter_mut().find(|f| f.name == field))
        else {
            return false;
        };
        let Some(value) = coerce(&descriptor.kind, value) else {
            return false;
        };
        descriptor.value = value;
        true
    }
}

// ---------------------------------------------------------------------------
// Drag and drop
// ---------------------------------------------------------------------------

/// Drag in progress between editor panels. Drop targets observe it; the
/// panel that started the drag owns the payload.
#[derive(Resource, Default, Debug)]
pub struct DragState {
    phase: DragPhase,
    payload: Option<DragPayload>,
    /// Cursor position in logical window pixels.
    pointer: Vec2,
}

impl DragState {
    pub fn begin(&mut self, payload: DragPayload) {
        self.phase = DragPhase::Dragging;
        self.payload = Some(payload);
    }

    /// Releases the payload. It is visible as [`DragPhase::Dropping`] for
    /// exactly one frame.
    pub fn release(&mut self) {
        if self.phase == DragPhase::Dragging {
            self.phase = DragPhase::Dropping;
        }
    }

    pub fn cancel(&mut self) {
        self.phase = DragPhase::Idle;
        self.payload = None;
    }

    pub fn phase(&self) -> DragPhase {
        self.phase
    }

    pub fn payload(&self) -> Option<&DragPayload> {
        self.payload.as_ref()
    }

    pub fn pointer(&self) -> Vec2 {
        self.pointer
    }

    pub fn set_pointer(&mut self, pointer: Vec2) {
        self.pointer = pointer;
    }
}

impl DragSource for WorldHost<'_> {
    fn drag_phase(&self) -> DragPhase {
        self.world
            .get_resource::<DragState>()
            .map(DragState::phase)
            .unwrap_or_default()
    }

    fn drag_payload(&self) -> Option<DragPayload> {
        self.world.get_resource::<DragState>()?.payload().cloned()
    }

    fn pointer_position(&self) -> Vec2 {
        self.world
            .get_resource::<DragState>()
            .map(DragState::pointer)
            .unwrap_or_default()
    }
}

pub(crate) fn track_drag_pointer(
    windows: Query<&Window, With<PrimaryWindow>>,
    mut drag: ResMut<DragState>,
) {
    if drag.phase() == DragPhase::Idle {
        return;
    }
    if let Ok(window) = windows.single()
        && let Some(cursor) = window.cursor_position()
    {
        drag.set_pointer(cursor);
    }
}

pub(crate) fn release_drag_on_mouse_up(
    mouse: Res<ButtonInput<MouseButton>>,
    mut drag: ResMut<DragState>,
) {
    if drag.phase() == DragPhase::Dragging && mouse.just_released(MouseButton::Left) {
        drag.release();
    }
}

/// Ends a drop once every target had its frame to react.
pub(crate) fn finish_drop(mut drag: ResMut<DragState>) {
    if drag.phase() == DragPhase::Dropping {
        drag.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::WidgetTable;

    #[derive(Component, Reflect, Default)]
    struct Spin;

    fn library() -> AssetLibrary {
        let mut library = AssetLibrary::default();
        library.insert("scripts/spin.rs", AssetEntry::script::<Spin>("uuid-spin"));
        library.insert(
            "materials/metal.mat",
            AssetEntry::new("uuid-metal", "Material")
                .with_field(FieldDescriptor::float("roughness", 0.5))
                .with_field(FieldDescriptor::new(
                    "blend",
                    EditorKind::Choice(vec!["Opaque".into(), "Blend".into()]),
                    FieldValue::Choice(0),
                )),
        );
        library
    }

    #[test]
    fn library_answers_through_the_host() {
        let mut world = World::new();
        world.insert_resource(library());
        let root = world.spawn_empty().id();
        let mut widgets = WidgetTable::default();
        let mut host = WorldHost::new(&mut world, &mut widgets, root);

        let meta = host.resource_meta("scripts/spin.rs").unwrap();
        assert_eq!(meta.kind, ResourceKind::ScriptCode);
        assert_eq!(meta.uuid, "uuid-spin");
        assert_eq!(
            host.script_types("scripts/spin.rs"),
            vec![TypeKey::new(Spin::type_path())]
        );
        assert!(host.script_types("materials/metal.mat").is_empty());
        assert!(host.resource_meta("missing.png").is_none());

        assert!(host.set_resource_field("materials/metal.mat", "roughness", FieldValue::Int(1)));
        assert!(host.set_resource_field("materials/metal.mat", "blend", FieldValue::Choice(1)));
        assert!(!host.set_resource_field("materials/metal.mat", "blend", FieldValue::Choice(7)));
        assert!(!host.set_resource_field("materials/metal.mat", "missing", FieldValue::Int(1)));
        assert_eq!(
            host.resource_fields("materials/metal.mat")[0].value,
            FieldValue::Float(1.0)
        );
    }

    #[test]
    fn drop_lasts_one_frame() {
        let mut app = App::new();
        app.init_resource::<DragState>()
            .add_systems(Update, finish_drop);

        let mut drag = app.world_mut().resource_mut::<DragState>();
        drag.begin(DragPayload::Resources(vec!["scripts/spin.rs".into()]));
        drag.release();
        assert_eq!(drag.phase(), DragPhase::Dropping);

        app.update();
        let drag = app.world().resource::<DragState>();
        assert_eq!(drag.phase(), DragPhase::Idle);
        assert!(drag.payload().is_none());
    }

    #[test]
    fn release_without_drag_is_ignored() {
        let mut drag = DragState::default();
        drag.release();
        assert_eq!(drag.phase(), DragPhase::Idle);
    }
}
