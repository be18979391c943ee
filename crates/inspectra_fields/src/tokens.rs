use bevy::color::palettes::tailwind;
use bevy::prelude::*;

pub const TEXT_SIZE: f32 = 13.0;
pub const ROW_HEIGHT: f32 = 22.0;

/// Panel body background
pub const PANEL_BG: Color = Color::Srgba(tailwind::ZINC_800);
/// Component title bar background
pub const TITLE_BG: Color = Color::Srgba(tailwind::ZINC_700);
/// Text input background
pub const INPUT_BG: Color = Color::Srgba(tailwind::ZINC_900);
pub const BUTTON_BG: Color = Color::Srgba(tailwind::ZINC_700);

pub const BORDER_COLOR: Color = Color::Srgba(tailwind::ZINC_700);
pub const FOCUS_BORDER: Color = Color::Srgba(tailwind::BLUE_500);

pub const TEXT_PRIMARY: Color = Color::Srgba(tailwind::ZINC_200);
pub const TEXT_SECONDARY: Color = Color::Srgba(tailwind::ZINC_400);

/// Tint of the drop region under a valid drag
pub const DROP_HIGHLIGHT: Color = Color::Srgba(Srgba {
    red: 0.3,
    green: 0.7,
    blue: 0.4,
    alpha: 0.5,
});
