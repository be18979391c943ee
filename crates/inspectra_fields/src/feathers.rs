use bevy::{input_focus::InputFocus, prelude::*};
use inspectra_sync::{EditorKind, FieldValue};

use crate::{headless::*, tokens::*};

#[derive(Component)]
pub struct FieldDisplay;

fn display_text(text: impl Into<String>, color: Color) -> impl Bundle {
    (
        FieldDisplay,
        Text::new(text),
        TextFont {
            font_size: TEXT_SIZE,
            ..default()
        },
        TextColor(color),
    )
}

pub fn text_field(kind: EditorKind, value: &FieldValue) -> impl Bundle {
    let field = TextField::new(kind, value);
    let text = field.buffer.clone();
    (
        field,
        Button,
        Node {
            min_width: px(48),
            height: px(ROW_HEIGHT),
            flex_grow: 1.0,
            padding: UiRect::axes(px(4), px(2)),
            align_items: AlignItems::Center,
            border: px(1).all(),
            border_radius: BorderRadius::all(px(2.0)),
            ..default()
        },
        BackgroundColor(INPUT_BG),
        BorderColor::all(BORDER_COLOR),
        children![display_text(text, TEXT_PRIMARY)],
    )
}

pub fn toggle_field(checked: bool) -> impl Bundle {
    (
        ToggleField { checked },
        Button,
        Node {
            width: px(16),
            height: px(16),
            border: px(1).all(),
            border_radius: BorderRadius::all(px(2.0)),
            justify_content: JustifyContent::Center,
            align_items: AlignItems::Center,
            ..default()
        },
        BackgroundColor(INPUT_BG),
        BorderColor::all(BORDER_COLOR),
        children![display_text(check_mark(checked), TEXT_PRIMARY)],
    )
}

pub fn choice_field(options: Vec<String>, index: usize) -> impl Bundle {
    let choice = ChoiceField { options, index };
    let label = choice.label().to_string();
    (
        choice,
        Button,
        Node {
            min_width: px(80),
            height: px(ROW_HEIGHT),
            padding: UiRect::axes(px(6), px(2)),
            align_items: AlignItems::Center,
            border: px(1).all(),
            border_radius: BorderRadius::all(px(2.0)),
            ..default()
        },
        BackgroundColor(INPUT_BG),
        BorderColor::all(BORDER_COLOR),
        children![display_text(label, TEXT_PRIMARY)],
    )
}

pub fn foldout(label: impl Into<String>, expanded: bool) -> impl Bundle {
    let label = label.into();
    let text = foldout_text(&label, expanded);
    (
        Foldout { label, expanded },
        Button,
        Node {
            flex_grow: 1.0,
            height: px(ROW_HEIGHT),
            padding: UiRect::horizontal(px(4)),
            align_items: AlignItems::Center,
            ..default()
        },
        children![display_text(text, TEXT_PRIMARY)],
    )
}

pub fn action_button(label: impl Into<String>, width: Option<f32>) -> impl Bundle {
    (
        ActionButton,
        Button,
        Node {
            width: width.map_or(Val::Auto, Val::Px),
            height: px(ROW_HEIGHT),
            padding: UiRect::horizontal(px(6)),
            justify_content: JustifyContent::Center,
            align_items: AlignItems::Center,
            border_radius: BorderRadius::all(px(2.0)),
            ..default()
        },
        BackgroundColor(BUTTON_BG),
        children![display_text(label, TEXT_PRIMARY)],
    )
}

fn check_mark(checked: bool) -> &'static str {
    if checked { "x" } else { "" }
}

fn foldout_text(label: &str, expanded: bool) -> String {
    let arrow = if expanded { "v" } else { ">" };
    format!("{arrow} {label}")
}

fn set_display(children: &Children, displays: &mut Query<&mut Text, With<FieldDisplay>>, value: String) {
    if let Some(entity) = children.iter().find(|&entity| displays.contains(entity))
        && let Ok(mut text) = displays.get_mut(entity)
        && text.0 != value
    {
        text.0 = value;
    }
}

pub(crate) fn sync_text_display(
    fields: Query<(&TextField, &Children), Changed<TextField>>,
    mut displays: Query<&mut Text, With<FieldDisplay>>,
) {
    for (field, children) in &fields {
        set_display(children, &mut displays, field.buffer.clone());
    }
}

pub(crate) fn sync_toggle_display(
    toggles: Query<(&ToggleField, &Children), Changed<ToggleField>>,
    mut displays: Query<&mut Text, With<FieldDisplay>>,
) {
    for (toggle, children) in &toggles {
        set_display(children, &mut displays, check_mark(toggle.checked).to_string());
    }
}

pub(crate) fn sync_choice_display(
    choices: Query<(&ChoiceField, &Children), Changed<ChoiceField>>,
    mut displays: Query<&mut Text, With<FieldDisplay>>,
) {
    for (choice, children) in &choices {
        set_display(children, &mut displays, choice.label().to_string());
    }
}

pub(crate) fn sync_foldout_display(
    foldouts: Query<(&Foldout, &Children), Changed<Foldout>>,
    mut displays: Query<&mut Text, With<FieldDisplay>>,
) {
    for (foldout, children) in &foldouts {
        set_display(
            children,
            &mut displays,
            foldout_text(&foldout.label, foldout.expanded),
        );
    }
}

pub(crate) fn highlight_focused_field(
    focus: Res<InputFocus>,
    mut fields: Query<(Entity, &mut BorderColor), With<TextField>>,
) {
    if !focus.is_changed() {
        return;
    }
    for (entity, mut border) in &mut fields {
        let color = if focus.0 == Some(entity) {
            FOCUS_BORDER
        } else {
            BORDER_COLOR
        };
        *border = BorderColor::all(color);
    }
}
