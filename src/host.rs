use std::collections::HashMap;

use bevy::{
    ecs::message::{MessageCursor, Messages},
    input_focus::InputFocus,
    prelude::*,
    ui::UiGlobalTransform,
};
use inspectra_commands::{
    BreakPrefab, CommandHistory, EntryId, RecordEntity, apply_prefab, revert_prefab,
};
use inspectra_fields::{
    FieldInput, action_button, choice_field, foldout, text_field, toggle_field, tokens,
    write_value,
};
use inspectra_sync::{
    DirtySink, EditorKind, FieldValue, ObjectId, UndoAnchor, UndoLog, WidgetEvent, WidgetHost,
    WidgetId, WidgetSpec,
};

use crate::scene::entity_of;

/// Set whenever the inspector changes the scene. Cleared by whoever saves it.
#[derive(Resource, Default, Debug)]
pub struct SceneDirty {
    pub dirty: bool,
    /// Number of times the scene was marked since startup.
    pub marks: u64,
}

impl SceneDirty {
    pub fn mark(&mut self) {
        self.dirty = true;
        self.marks += 1;
    }

    pub fn clear(&mut self) {
        self.dirty = false;
    }
}

struct WidgetNode {
    /// Outermost UI node of the widget.
    node: Entity,
    /// Entity carrying the editor component, for widgets that raise input.
    editor: Option<Entity>,
    parent: Option<WidgetId>,
    children: Vec<WidgetId>,
}

/// Widgets handed out to the inspector core and the UI entities behind them.
#[derive(Default)]
pub struct WidgetTable {
    next: u64,
    nodes: HashMap<WidgetId, WidgetNode>,
    by_editor: HashMap<Entity, WidgetId>,
    inputs: MessageCursor<FieldInput>,
}

impl WidgetTable {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, widget: WidgetId) -> Option<Entity> {
        self.nodes.get(&widget).map(|node| node.node)
    }

    pub fn editor(&self, widget: WidgetId) -> Option<Entity> {
        self.nodes.get(&widget).and_then(|node| node.editor)
    }

    fn remove_subtree(&mut self, widget: WidgetId) {
        let Some(node) = self.nodes.remove(&widget) else {
            return;
        };
        if let Some(editor) = node.editor {
            self.by_editor.remove(&editor);
        }
        for child in node.children {
            self.remove_subtree(child);
        }
    }
}

/// Adapter giving the inspector core access to a Bevy world.
///
/// Widgets are spawned under `root`, the inspector panel's content node.
pub struct WorldHost<'w> {
    pub(crate) world: &'w mut World,
    widgets: &'w mut WidgetTable,
    root: Entity,
}

impl<'w> WorldHost<'w> {
    pub fn new(world: &'w mut World, widgets: &'w mut WidgetTable, root: Entity) -> Self {
        Self {
            world,
            widgets,
            root,
        }
    }

    pub fn world(&self) -> &World {
        self.world
    }

    pub fn widgets(&self) -> &WidgetTable {
        self.widgets
    }

    fn node_of(&self, widget: WidgetId) -> Option<Entity> {
        self.widgets.node(widget)
    }
}

fn label_text(text: impl Into<String>, color: Color) -> impl Bundle {
    (
        Text::new(text),
        TextFont {
            font_size: tokens::TEXT_SIZE,
            ..default()
        },
        TextColor(color),
    )
}

/// Spawns the UI entities for `spec`. Returns the outer node and, for input
/// widgets, the entity that raises [`FieldInput`].
fn spawn_widget(world: &mut World, spec: WidgetSpec) -> (Entity, Option<Entity>) {
    match spec {
        WidgetSpec::ScrollArea => {
            let node = world
                .spawn((
                    Node {
                        flex_direction: FlexDirection::Column,
                        flex_grow: 1.0,
                        width: percent(100),
                        overflow: Overflow::scroll_y(),
                        ..default()
                    },
                    ScrollPosition::default(),
                ))
                .id();
            (node, None)
        }
        WidgetSpec::Panel { height } => {
            let node = world
                .spawn(Node {
                    flex_direction: FlexDirection::Column,
                    width: percent(100),
                    height: height.map_or(Val::Auto, Val::Px),
                    flex_shrink: 0.0,
                    ..default()
                })
                .id();
            (node, None)
        }
        WidgetSpec::Column => {
            let node = world
                .spawn(Node {
                    flex_direction: FlexDirection::Column,
                    width: percent(100),
                    flex_grow: 1.0,
                    ..default()
                })
                .id();
            (node, None)
        }
        WidgetSpec::Row => {
            let node = world
                .spawn((
                    Node {
                        flex_direction: FlexDirection::Row,
                        align_items: AlignItems::Center,
                        column_gap: px(4),
                        width: percent(100),
                        ..default()
                    },
                    BackgroundColor(tokens::TITLE_BG),
                ))
                .id();
            (node, None)
        }
        WidgetSpec::Space(height) => {
            let node = world
                .spawn(Node {
                    height: px(height),
                    flex_shrink: 0.0,
                    ..default()
                })
                .id();
            (node, None)
        }
        WidgetSpec::FlexibleSpace => {
            let node = world
                .spawn(Node {
                    flex_grow: 1.0,
                    ..default()
                })
                .id();
            (node, None)
        }
        WidgetSpec::Label(text) => {
            let node = world.spawn(label_text(text, tokens::TEXT_SECONDARY)).id();
            (node, None)
        }
        WidgetSpec::Field { label, kind, value } => {
            let row = world
                .spawn(Node {
                    flex_direction: FlexDirection::Row,
                    align_items: AlignItems::Center,
                    column_gap: px(4),
                    padding: UiRect::horizontal(px(4)),
                    min_height: px(tokens::ROW_HEIGHT),
                    ..default()
                })
                .id();
            if !label.is_empty() {
                let label = world
                    .spawn((
                        label_text(label, tokens::TEXT_SECONDARY),
                        Node {
                            min_width: px(72),
                            ..default()
                        },
                    ))
                    .id();
                world.entity_mut(row).add_child(label);
            }
            let editor = match kind {
                EditorKind::Bool => world
                    .spawn(toggle_field(value.as_bool().unwrap_or_default()))
                    .id(),
                EditorKind::Choice(options) => world
                    .spawn(choice_field(options, value.as_choice().unwrap_or_default()))
                    .id(),
                kind => world.spawn(text_field(kind, &value)).id(),
            };
            world.entity_mut(row).add_child(editor);
            (row, Some(editor))
        }
        WidgetSpec::Foldout { label, expanded } => {
            let node = world.spawn(foldout(label, expanded)).id();
            (node, Some(node))
        }
        WidgetSpec::Button { label, width } => {
            let node = world.spawn(action_button(label, width)).id();
            (node, Some(node))
        }
        WidgetSpec::Highlight => {
            let node = world
                .spawn((
                    Node {
                        position_type: PositionType::Absolute,
                        display: Display::None,
                        ..default()
                    },
                    BackgroundColor(tokens::DROP_HIGHLIGHT),
                    ZIndex(1),
                ))
                .id();
            (node, None)
        }
    }
}

impl WidgetHost for WorldHost<'_> {
    fn create(&mut self, parent: Option<WidgetId>, spec: WidgetSpec) -> WidgetId {
        let (node, editor) = spawn_widget(self.world, spec);
        let parent_node = parent.and_then(|p| self.node_of(p)).unwrap_or(self.root);
        self.world.entity_mut(parent_node).add_child(node);
        // Content of a scroll area spans at least the viewport, so trailing
        // flexible space has height to hand out.
        if self.world.get::<ScrollPosition>(parent_node).is_some()
            && let Some(mut style) = self.world.get_mut::<Node>(node)
        {
            style.min_height = percent(100);
            style.flex_grow = 1.0;
        }

        self.widgets.next += 1;
        let widget = WidgetId(self.widgets.next);
        if let Some(parent) = parent
            && let Some(parent) = self.widgets.nodes.get_mut(&parent)
        {
            parent.children.push(widget);
        }
        if let Some(editor) = editor {
            self.widgets.by_editor.insert(editor, widget);
        }
        self.widgets.nodes.insert(
            widget,
            WidgetNode {
                node,
                editor,
                parent,
                children: Vec::new(),
            },
        );
        widget
    }

    fn destroy(&mut self, widget: WidgetId) {
        let Some(node) = self.widgets.nodes.get(&widget) else {
            return;
        };
        let entity = node.node;
        if let Some(parent) = node.parent
            && let Some(parent) = self.widgets.nodes.get_mut(&parent)
        {
            parent.children.retain(|&child| child != widget);
        }
        self.widgets.remove_subtree(widget);
        if let Ok(entity) = self.world.get_entity_mut(entity) {
            entity.despawn();
        }
    }

    fn destroy_children(&mut self, widget: WidgetId) {
        let children = self
            .widgets
            .nodes
            .get(&widget)
            .map(|node| node.children.clone())
            .unwrap_or_default();
        for child in children {
            self.destroy(child);
        }
    }

    fn bounds(&self, widget: WidgetId) -> Rect {
        let Some(node) = self.node_of(widget) else {
            return Rect::default();
        };
        let (Some(computed), Some(transform)) = (
            self.world.get::<ComputedNode>(node),
            self.world.get::<UiGlobalTransform>(node),
        ) else {
            return Rect::default();
        };
        // Layout is in physical pixels, the pointer in logical ones.
        let scale = computed.inverse_scale_factor();
        let center = transform.translation * scale;
        let size = computed.size() * scale;
        Rect::from_center_size(center, size)
    }

    fn has_focus(&self, widget: WidgetId) -> bool {
        let Some(editor) = self.widgets.editor(widget) else {
            return false;
        };
        self.world
            .get_resource::<InputFocus>()
            .is_some_and(|focus| focus.0 == Some(editor))
    }

    fn set_value(&mut self, widget: WidgetId, value: FieldValue) {
        if let Some(editor) = self.widgets.editor(widget) {
            write_value(self.world, editor, &value);
        }
    }

    fn set_visible(&mut self, widget: WidgetId, visible: bool) {
        let Some(node) = self.node_of(widget) else {
            return;
        };
        let display = if visible { Display::Flex } else { Display::None };
        if let Some(mut node) = self.world.get_mut::<Node>(node)
            && node.display != display
        {
            node.display = display;
        }
    }

    fn place(&mut self, widget: WidgetId, rect: Rect) {
        let Some(node) = self.node_of(widget) else {
            return;
        };
        if let Some(mut node) = self.world.get_mut::<Node>(node) {
            node.left = px(rect.min.x);
            node.top = px(rect.min.y);
            node.width = px(rect.width());
            node.height = px(rect.height());
        }
    }

    fn drain_events(&mut self) -> Vec<WidgetEvent> {
        let Some(messages) = self.world.get_resource::<Messages<FieldInput>>() else {
            return Vec::new();
        };
        let by_editor = &self.widgets.by_editor;
        self.widgets
            .inputs
            .read(messages)
            .filter_map(|input| {
                let widget = by_editor.get(&input.editor)?;
                Some(WidgetEvent::new(*widget, input.kind.clone()))
            })
            .collect()
    }
}

impl UndoLog for WorldHost<'_> {
    fn record_snapshot(&mut self, object: ObjectId, description: &str) -> UndoAnchor {
        let command = RecordEntity::from_world(self.world, entity_of(object), description);
        let id = self
            .world
            .get_resource_or_init::<CommandHistory>()
            .push_recorded(Box::new(command));
        UndoAnchor(id.0)
    }

    fn pop_at(&mut self, anchor: UndoAnchor) -> bool {
        self.world
            .get_resource_mut::<CommandHistory>()
            .is_some_and(|mut history| history.pop_at(EntryId(anchor.0)))
    }

    fn apply_prefab(&mut self, object: ObjectId) {
        apply_prefab(self.world, entity_of(object));
    }

    fn revert_prefab(&mut self, object: ObjectId) {
        revert_prefab(self.world, entity_of(object));
    }

    fn break_prefab(&mut self, object: ObjectId) {
        let entity = entity_of(object);
        let Some(command) = BreakPrefab::from_world(self.world, entity) else {
            return;
        };
        self.world.get_resource_or_init::<CommandHistory>();
        self.world
            .resource_scope(|world, mut history: Mut<CommandHistory>| {
                history.execute(Box::new(command), world);
            });
    }
}

impl DirtySink for WorldHost<'_> {
    fn mark_scene_dirty(&mut self) {
        self.world.get_resource_or_init::<SceneDirty>().mark();
    }
}
