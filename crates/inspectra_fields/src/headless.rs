use bevy::{
    input::keyboard::{Key, KeyboardInput},
    input_focus::InputFocus,
    prelude::*,
};
use inspectra_sync::{EditorKind, FieldValue, WidgetEventKind};

/// Raised by any field editor. `editor` is the entity carrying the editor
/// component.
#[derive(Message, Clone, Debug, PartialEq)]
pub struct FieldInput {
    pub editor: Entity,
    pub kind: WidgetEventKind,
}

/// Single-line editor for text, float and integer fields.
///
/// `cursor` is a byte offset into `buffer` and always sits on a char boundary.
#[derive(Component, Clone, Debug)]
pub struct TextField {
    pub kind: EditorKind,
    pub buffer: String,
    pub cursor: usize,
}

impl TextField {
    pub fn new(kind: EditorKind, value: &FieldValue) -> Self {
        let buffer = format_value(value);
        Self {
            kind,
            cursor: buffer.len(),
            buffer,
        }
    }

    pub fn set_value(&mut self, value: &FieldValue) {
        let buffer = format_value(value);
        if buffer != self.buffer {
            self.cursor = buffer.len();
            self.buffer = buffer;
        }
    }

    /// Current buffer as a value of this field's kind. `None` while the
    /// buffer does not parse, e.g. a lone `-` in a number field.
    pub fn parse(&self) -> Option<FieldValue> {
        let trimmed = self.buffer.trim();
        match self.kind {
            EditorKind::Float => trimmed.parse().ok().map(FieldValue::Float),
            EditorKind::Int => trimmed.parse().ok().map(FieldValue::Int),
            EditorKind::Text => Some(FieldValue::Text(self.buffer.clone())),
            EditorKind::Bool | EditorKind::Choice(_) => None,
        }
    }

    pub fn insert(&mut self, text: &str) {
        self.buffer.insert_str(self.cursor, text);
        self.cursor += text.len();
    }

    pub fn backspace(&mut self) {
        if let Some(c) = self.buffer[..self.cursor].chars().next_back() {
            self.cursor -= c.len_utf8();
            self.buffer.remove(self.cursor);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.buffer.len() {
            self.buffer.remove(self.cursor);
        }
    }

    pub fn move_left(&mut self) {
        if let Some(c) = self.buffer[..self.cursor].chars().next_back() {
            self.cursor -= c.len_utf8();
        }
    }

    pub fn move_right(&mut self) {
        if let Some(c) = self.buffer[self.cursor..].chars().next() {
            self.cursor += c.len_utf8();
        }
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.buffer.len();
    }
}

pub fn format_value(value: &FieldValue) -> String {
    match value {
        FieldValue::Float(v) => format!("{v:.3}"),
        FieldValue::Int(v) => v.to_string(),
        FieldValue::Bool(v) => v.to_string(),
        FieldValue::Text(v) => v.clone(),
        FieldValue::Choice(index) => index.to_string(),
    }
}

#[derive(Component, Clone, Copy, Debug, Default)]
pub struct ToggleField {
    pub checked: bool,
}

/// Cycles through `options` on every press.
#[derive(Component, Clone, Debug)]
pub struct ChoiceField {
    pub options: Vec<String>,
    pub index: usize,
}

impl ChoiceField {
    pub fn label(&self) -> &str {
        self.options.get(self.index).map_or("", String::as_str)
    }
}

/// Fold toggle of a component title bar.
#[derive(Component, Clone, Debug)]
pub struct Foldout {
    pub label: String,
    pub expanded: bool,
}

#[derive(Component, Clone, Copy, Debug, Default)]
pub struct ActionButton;

/// Pushes a value coming from the inspected data into whichever editor
/// `editor` carries. Values of the wrong shape are ignored.
pub fn write_value(world: &mut World, editor: Entity, value: &FieldValue) {
    let Ok(mut entity) = world.get_entity_mut(editor) else {
        return;
    };
    if let Some(mut field) = entity.get_mut::<TextField>() {
        if format_value(value) != field.buffer {
            field.set_value(value);
        }
        return;
    }
    if let (Some(mut toggle), FieldValue::Bool(checked)) = (entity.get_mut::<ToggleField>(), value) {
        if toggle.checked != *checked {
            toggle.checked = *checked;
        }
        return;
    }
    if let (Some(mut choice), FieldValue::Choice(index)) = (entity.get_mut::<ChoiceField>(), value) {
        if choice.index != *index {
            choice.index = *index;
        }
        return;
    }
    if let (Some(mut foldout), FieldValue::Bool(expanded)) = (entity.get_mut::<Foldout>(), value)
        && foldout.expanded != *expanded
    {
        foldout.expanded = *expanded;
    }
}

/// Clicking a text field focuses it; clicking anywhere else drops focus held
/// by a text field.
pub fn text_field_focus_system(
    mouse: Res<ButtonInput<MouseButton>>,
    fields: Query<(Entity, &Interaction), With<TextField>>,
    mut focus: ResMut<InputFocus>,
) {
    if !mouse.just_pressed(MouseButton::Left) {
        return;
    }
    let pressed = fields
        .iter()
        .find(|(_, interaction)| **interaction == Interaction::Pressed)
        .map(|(entity, _)| entity);
    let holds_field = focus.0.is_some_and(|entity| fields.contains(entity));
    if pressed.is_some() || holds_field {
        focus.0 = pressed;
    }
}

pub fn text_field_keyboard_system(
    mut keyboard_events: MessageReader<KeyboardInput>,
    mut focus: ResMut<InputFocus>,
    mut last_focus: Local<Option<Entity>>,
    mut fields: Query<&mut TextField>,
    mut input: MessageWriter<FieldInput>,
) {
    if *last_focus != focus.0 {
        if let Some(previous) = *last_focus
            && fields.contains(previous)
        {
            input.write(FieldInput {
                editor: previous,
                kind: WidgetEventKind::FocusLost,
            });
        }
        *last_focus = focus.0;
    }

    let Some(entity) = focus.0 else {
        keyboard_events.clear();
        return;
    };
    let Ok(mut field) = fields.get_mut(entity) else {
        keyboard_events.clear();
        return;
    };

    let mut edited = false;
    for event in keyboard_events
        .read()
        .filter(|event| event.state.is_pressed())
    {
        if let Some(text) = &event.text
            && text.chars().all(|c| !c.is_control())
        {
            field.insert(text);
            edited = true;
        }

        match &event.logical_key {
            Key::Backspace => {
                field.backspace();
                edited = true;
            }
            Key::Delete => {
                field.delete();
                edited = true;
            }
            Key::ArrowLeft => field.move_left(),
            Key::ArrowRight => field.move_right(),
            Key::Home => field.home(),
            Key::End => field.end(),
            Key::Enter | Key::Escape => {
                flush_edit(&field, entity, edited, &mut input);
                edited = false;
                let kind = if event.logical_key == Key::Enter {
                    WidgetEventKind::Confirmed
                } else {
                    WidgetEventKind::FocusLost
                };
                input.write(FieldInput { editor: entity, kind });
                focus.0 = None;
                *last_focus = None;
                break;
            }
            _ => {}
        }
    }

    flush_edit(&field, entity, edited, &mut input);
}

fn flush_edit(field: &TextField, editor: Entity, edited: bool, input: &mut MessageWriter<FieldInput>) {
    if edited && let Some(value) = field.parse() {
        input.write(FieldInput {
            editor,
            kind: WidgetEventKind::ValueChanged(value),
        });
    }
}

pub fn toggle_press_system(
    mut toggles: Query<(Entity, &Interaction, &mut ToggleField), Changed<Interaction>>,
    mut input: MessageWriter<FieldInput>,
) {
    for (entity, interaction, mut toggle) in &mut toggles {
        if *interaction != Interaction::Pressed {
            continue;
        }
        toggle.checked = !toggle.checked;
        input.write(FieldInput {
            editor: entity,
            kind: WidgetEventKind::ValueChanged(FieldValue::Bool(toggle.checked)),
        });
    }
}

pub fn choice_press_system(
    mut choices: Query<(Entity, &Interaction, &mut ChoiceField), Changed<Interaction>>,
    mut input: MessageWriter<FieldInput>,
) {
    for (entity, interaction, mut choice) in &mut choices {
        if *interaction != Interaction::Pressed || choice.options.is_empty() {
            continue;
        }
        choice.index = (choice.index + 1) % choice.options.len();
        input.write(FieldInput {
            editor: entity,
            kind: WidgetEventKind::ValueChanged(FieldValue::Choice(choice.index)),
        });
    }
}

pub fn foldout_press_system(
    mut foldouts: Query<(Entity, &Interaction, &mut Foldout), Changed<Interaction>>,
    mut input: MessageWriter<FieldInput>,
) {
    for (entity, interaction, mut foldout) in &mut foldouts {
        if *interaction != Interaction::Pressed {
            continue;
        }
        foldout.expanded = !foldout.expanded;
        input.write(FieldInput {
            editor: entity,
            kind: WidgetEventKind::Toggled(foldout.expanded),
        });
    }
}

pub fn button_press_system(
    buttons: Query<(Entity, &Interaction), (Changed<Interaction>, With<ActionButton>)>,
    mut input: MessageWriter<FieldInput>,
) {
    for (entity, interaction) in &buttons {
        if *interaction == Interaction::Pressed {
            input.write(FieldInput {
                editor: entity,
                kind: WidgetEventKind::Clicked,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use bevy::ecs::{message::Messages, system::RunSystemOnce};

    use super::*;

    fn drain(world: &mut World) -> Vec<FieldInput> {
        world
            .resource_mut::<Messages<FieldInput>>()
            .drain()
            .collect()
    }

    fn world() -> World {
        let mut world = World::new();
        world.init_resource::<Messages<FieldInput>>();
        world
    }

    #[test]
    fn editing_respects_char_boundaries() {
        let mut field = TextField::new(EditorKind::Text, &FieldValue::Text("héllo".into()));
        field.move_left();
        field.move_left();
        field.move_left();
        field.move_left();
        field.backspace();
        assert_eq!(field.buffer, "éllo");
        field.move_right();
        field.insert("ü");
        assert_eq!(field.buffer, "éüllo");
        field.end();
        field.backspace();
        assert_eq!(field.buffer, "éüll");
    }

    #[test]
    fn numbers_parse_by_kind() {
        let mut field = TextField::new(EditorKind::Float, &FieldValue::Float(1.5));
        assert_eq!(field.buffer, "1.500");
        assert_eq!(field.parse(), Some(FieldValue::Float(1.5)));

        field.buffer = "-".into();
        assert_eq!(field.parse(), None);

        let field = TextField::new(EditorKind::Int, &FieldValue::Int(-4));
        assert_eq!(field.parse(), Some(FieldValue::Int(-4)));
    }

    #[test]
    fn write_value_targets_the_right_editor() {
        let mut world = world();
        let text = world
            .spawn(TextField::new(EditorKind::Float, &FieldValue::Float(0.0)))
            .id();
        let toggle = world.spawn(ToggleField { checked: false }).id();
        let choice = world
            .spawn(ChoiceField {
                options: vec!["A".into(), "B".into()],
                index: 0,
            })
            .id();

        write_value(&mut world, text, &FieldValue::Float(2.25));
        write_value(&mut world, toggle, &FieldValue::Bool(true));
        write_value(&mut world, choice, &FieldValue::Choice(1));
        write_value(&mut world, choice, &FieldValue::Bool(true));

        assert_eq!(world.get::<TextField>(text).unwrap().buffer, "2.250");
        assert!(world.get::<ToggleField>(toggle).unwrap().checked);
        assert_eq!(world.get::<ChoiceField>(choice).unwrap().label(), "B");
    }

    #[test]
    fn pressing_a_toggle_flips_and_reports() {
        let mut world = world();
        let toggle = world
            .spawn((ToggleField { checked: false }, Interaction::Pressed))
            .id();

        world.run_system_once(toggle_press_system).unwrap();
        assert!(world.get::<ToggleField>(toggle).unwrap().checked);
        assert_eq!(
            drain(&mut world),
            vec![FieldInput {
                editor: toggle,
                kind: WidgetEventKind::ValueChanged(FieldValue::Bool(true)),
            }]
        );
    }

    #[test]
    fn choice_wraps_around() {
        let mut world = world();
        let choice = world
            .spawn((
                ChoiceField {
                    options: vec!["Static".into(), "Movable".into()],
                    index: 1,
                },
                Interaction::Pressed,
            ))
            .id();

        world.run_system_once(choice_press_system).unwrap();
        assert_eq!(world.get::<ChoiceField>(choice).unwrap().index, 0);
        assert_eq!(
            drain(&mut world)[0].kind,
            WidgetEventKind::ValueChanged(FieldValue::Choice(0))
        );
    }

    #[test]
    fn foldout_reports_new_state() {
        let mut world = world();
        let foldout = world
            .spawn((
                Foldout {
                    label: "Spin".into(),
                    expanded: true,
                },
                Interaction::Pressed,
            ))
            .id();

        world.run_system_once(foldout_press_system).unwrap();
        assert_eq!(
            drain(&mut world),
            vec![FieldInput {
                editor: foldout,
                kind: WidgetEventKind::Toggled(false),
            }]
        );
    }
}
