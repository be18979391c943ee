//! Leaf field editors for the inspector panel: text and number fields,
//! toggles, choice cyclers, foldouts and buttons.
//!
//! Editors never touch the inspected data. They raise [`FieldInput`] messages
//! that the inspector host turns into widget events.

mod feathers;
mod headless;
pub mod tokens;

pub use feathers::*;
pub use headless::*;

use bevy::{input_focus::InputFocus, prelude::*};

/// Editor input handling. [`FieldInput`] messages of a frame are written by
/// the end of this set.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldsSystems;

pub struct FieldsPlugin;

impl Plugin for FieldsPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<FieldInput>()
            .init_resource::<InputFocus>()
            .add_systems(
                Update,
                (
                    headless::text_field_focus_system,
                    headless::text_field_keyboard_system,
                    (
                        headless::toggle_press_system,
                        headless::choice_press_system,
                        headless::foldout_press_system,
                        headless::button_press_system,
                    ),
                    (
                        feathers::sync_text_display,
                        feathers::sync_toggle_display,
                        feathers::sync_choice_display,
                        feathers::sync_foldout_display,
                        feathers::highlight_focused_field,
                    ),
                )
                    .chain()
                    .in_set(FieldsSystems),
            );
    }
}
