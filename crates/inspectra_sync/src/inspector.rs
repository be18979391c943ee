use std::collections::HashMap;

use crate::{
    fields::{EditorKind, FieldDescriptor, FieldValue, WidgetEvent, WidgetEventKind, WidgetSpec},
    host::InspectorHost,
    ids::{ObjectId, SubObjectId, TypeKey, WidgetId},
    modification::ModificationState,
    settings::InspectorSettings,
    store::{OwnerId, PropertyStore},
};

/// Collaborators handed to inspectors for the duration of one call.
pub struct InspectorCx<'a> {
    pub host: &'a mut dyn InspectorHost,
    pub store: &'a mut PropertyStore,
    pub settings: &'a InspectorSettings,
}

/// What an inspector displays.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Inspectable {
    SubObject { object: ObjectId, sub: SubObjectId },
    Resource { path: String },
}

/// Displays and edits the fields of one sub-object or resource.
///
/// Events raised by the inspector's own widgets are routed to
/// [`handle_event`](Inspector::handle_event) before
/// [`refresh`](Inspector::refresh) runs in the same frame, so `refresh` reports
/// what happened during that frame.
pub trait Inspector: Send + Sync {
    fn initialize(
        &mut self,
        cx: &mut InspectorCx<'_>,
        container: WidgetId,
        target: Inspectable,
        owner: OwnerId,
    );

    /// Pulls live values into the widgets and returns this frame's state.
    fn refresh(&mut self, cx: &mut InspectorCx<'_>) -> ModificationState;

    /// Returns `false` if `event` does not belong to this inspector.
    fn handle_event(&mut self, cx: &mut InspectorCx<'_>, event: &WidgetEvent) -> bool;

    /// Hidden inspectors keep their widgets but skip per-frame work.
    fn set_visible(&mut self, cx: &mut InspectorCx<'_>, visible: bool);

    fn destroy(&mut self, cx: &mut InspectorCx<'_>);
}

pub type InspectorFactory = Box<dyn Fn() -> Box<dyn Inspector> + Send + Sync>;

/// Picks an inspector implementation per sub-object or resource type, falling
/// back to [`GenericInspector`].
pub struct InspectorRegistry {
    factories: HashMap<TypeKey, InspectorFactory>,
    fallback: InspectorFactory,
}

impl Default for InspectorRegistry {
    fn default() -> Self {
        Self {
            factories: HashMap::new(),
            fallback: Box::new(|| Box::new(GenericInspector::new())),
        }
    }
}

impl InspectorRegistry {
    pub fn register<F>(&mut self, type_key: TypeKey, factory: F)
    where
        F: Fn() -> Box<dyn Inspector> + Send + Sync + 'static,
    {
        self.factories.insert(type_key, Box::new(factory));
    }

    pub fn set_fallback<F>(&mut self, factory: F)
    where
        F: Fn() -> Box<dyn Inspector> + Send + Sync + 'static,
    {
        self.fallback = Box::new(factory);
    }

    pub fn has_custom(&self, type_key: &TypeKey) -> bool {
        self.factories.contains_key(type_key)
    }

    pub fn create(&self, type_key: &TypeKey) -> Box<dyn Inspector> {
        match self.factories.get(type_key) {
            Some(factory) => factory(),
            None => (self.fallback)(),
        }
    }
}

struct FieldRow {
    name: String,
    kind: EditorKind,
    widget: WidgetId,
}

/// Renders every field the host reports for its target, one editor per field.
pub struct GenericInspector {
    target: Option<Inspectable>,
    layout: Option<WidgetId>,
    rows: Vec<FieldRow>,
    visible: bool,
    editing: bool,
    pending: ModificationState,
}

impl Default for GenericInspector {
    fn default() -> Self {
        Self::new()
    }
}

impl GenericInspector {
    pub fn new() -> Self {
        Self {
            target: None,
            layout: None,
            rows: Vec::new(),
            visible: true,
            editing: false,
            pending: ModificationState::NotModified,
        }
    }

    /// Widget of the editor bound to `field`, if displayed.
    pub fn field_widget(&self, field: &str) -> Option<WidgetId> {
        self.rows
            .iter()
            .find(|row| row.name == field)
            .map(|row| row.widget)
    }

    fn read_fields(&self, cx: &InspectorCx<'_>) -> Vec<FieldDescriptor> {
        match &self.target {
            Some(Inspectable::SubObject { object, sub }) => cx.host.sub_object_fields(*object, *sub),
            Some(Inspectable::Resource { path }) => cx.host.resource_fields(path),
            None => Vec::new(),
        }
    }

    fn write_field(&self, cx: &mut InspectorCx<'_>, field: &str, value: FieldValue) -> bool {
        match &self.target {
            Some(Inspectable::SubObject { object, sub }) => {
                cx.host.set_sub_object_field(*object, *sub, field, value)
            }
            Some(Inspectable::Resource { path }) => cx.host.set_resource_field(path, field, value),
            None => false,
        }
    }

    fn build_rows(&mut self, cx: &mut InspectorCx<'_>, fields: Vec<FieldDescriptor>) {
        let Some(layout) = self.layout else {
            return;
        };
        self.rows = fields
            .into_iter()
            .map(|field| {
                let widget = cx.host.create(
                    Some(layout),
                    WidgetSpec::Field {
                        label: field.name.clone(),
                        kind: field.kind.clone(),
                        value: field.value,
                    },
                );
                FieldRow {
                    name: field.name,
                    kind: field.kind,
                    widget,
                }
            })
            .collect();
    }

    fn same_layout(&self, fields: &[FieldDescriptor]) -> bool {
        self.rows.len() == fields.len()
            && self
                .rows
                .iter()
                .zip(fields)
                .all(|(row, field)| row.name == field.name && row.kind == field.kind)
    }

    fn apply_change(&mut self, cx: &mut InspectorCx<'_>, row: usize, value: FieldValue) {
        let (name, commits) = {
            let row = &self.rows[row];
            (row.name.clone(), row.kind.commits_immediately())
        };
        if !self.write_field(cx, &name, value) {
            return;
        }
        if commits {
            self.pending = self.pending.combine(ModificationState::Modified);
        } else {
            self.editing = true;
            self.pending = self.pending.combine(ModificationState::ModifyInProgress);
        }
    }
}

impl Inspector for GenericInspector {
    fn initialize(
        &mut self,
        cx: &mut InspectorCx<'_>,
        container: WidgetId,
        target: Inspectable,
        _owner: OwnerId,
    ) {
        self.target = Some(target);
        self.layout = Some(cx.host.create(Some(container), WidgetSpec::Column));
        let fields = self.read_fields(cx);
        self.build_rows(cx, fields);
    }

    fn refresh(&mut self, cx: &mut InspectorCx<'_>) -> ModificationState {
        let frame = std::mem::take(&mut self.pending);
        if !self.visible {
            return frame;
        }

        let fields = self.read_fields(cx);
        if self.same_layout(&fields) {
            for (row, field) in self.rows.iter().zip(fields) {
                if !cx.host.has_focus(row.widget) {
                    cx.host.set_value(row.widget, field.value);
                }
            }
        } else if let Some(layout) = self.layout {
            // Field set changed shape (e.g. enum variant switched), rebuild rows.
            cx.host.destroy_children(layout);
            self.editing = false;
            self.build_rows(cx, fields);
        }
        frame
    }

    fn handle_event(&mut self, cx: &mut InspectorCx<'_>, event: &WidgetEvent) -> bool {
        let Some(row) = self.rows.iter().position(|row| row.widget == event.widget) else {
            return false;
        };

        match &event.kind {
            WidgetEventKind::ValueChanged(value) => self.apply_change(cx, row, value.clone()),
            WidgetEventKind::Toggled(value) => {
                self.apply_change(cx, row, FieldValue::Bool(*value));
            }
            WidgetEventKind::Confirmed | WidgetEventKind::FocusLost => {
                if self.editing {
                    self.editing = false;
                    self.pending = ModificationState::Modified;
                }
            }
            WidgetEventKind::Clicked => {}
        }
        true
    }

    fn set_visible(&mut self, cx: &mut InspectorCx<'_>, visible: bool) {
        self.visible = visible;
        if let Some(layout) = self.layout {
            cx.host.set_visible(layout, visible);
        }
    }

    fn destroy(&mut self, cx: &mut InspectorCx<'_>) {
        if let Some(layout) = self.layout.take() {
            cx.host.destroy(layout);
        }
        self.rows.clear();
    }
}
