//! Color constants for the terminal user interface.

use ratatui::style::Color;

use crate::fields::Category;

/// Today's section header
pub const GOLD: Color = Color::Rgb(255, 215, 0);
/// Other weekday headers
pub const LEAF_GREEN: Color = Color::Rgb(110, 190, 110);
pub const AMBER: Color = Color::Rgb(255, 150, 40);
pub const LAVENDER: Color = Color::Rgb(160, 130, 185);
/// Completed tasks and the Completed header
pub const ASH: Color = Color::Rgb(120, 120, 120);
/// High-priority task text
pub const DARK_RED: Color = Color::Rgb(200, 40, 40);

pub const STATUS_BAR_BG: Color = Color::Rgb(0, 80, 0);
pub const SELECTED_BG: Color = Color::Rgb(50, 50, 70);

pub fn section_color(category: Category, is_today: bool) -> Color {
    match category {
        Category::Day(_) if is_today => GOLD,
        Category::Day(_) => LEAF_GREEN,
        Category::Immediate | Category::Soon => AMBER,
        Category::Waiting => LAVENDER,
        Category::Completed => ASH,
    }
}
