//! Color constants for the terminal user interface.

use ratatui::style::Color;

use crate::fields::Priority;

/// Used for the High column (#f44336).
pub const HIGH_RED: Color = Color::Rgb(244, 67, 54);
/// Used for the Medium column (#ff9800).
pub const MEDIUM_ORANGE: Color = Color::Rgb(255, 152, 0);
/// Used for the Low column (#4caf50).
pub const LOW_GREEN: Color = Color::Rgb(76, 175, 80);

/// Accent color for a priority lane.
pub fn priority_color(p: Priority) -> Color {
    match p {
        Priority::High => HIGH_RED,
        Priority::Medium => MEDIUM_ORANGE,
        Priority::Low => LOW_GREEN,
    }
}
