//! Colors and sizes for the loop timeline

use iced::Color;

/// Timeline canvas height in pixels
pub const TIMELINE_HEIGHT: f32 = 64.0;

/// Height of the segment band inside the timeline
pub const SEGMENT_BAND_HEIGHT: f32 = 40.0;

pub const BACKGROUND_COLOR: Color = Color::from_rgb(0.1, 0.1, 0.12);
pub const TRACK_COLOR: Color = Color::from_rgb(0.18, 0.18, 0.2);
pub const PLAYHEAD_COLOR: Color = Color::from_rgb(1.0, 1.0, 1.0);
pub const HANDLE_COLOR: Color = Color::from_rgba(1.0, 1.0, 1.0, 0.7);
pub const HANDLE_HOVER_COLOR: Color = Color::from_rgb(1.0, 0.8, 0.3);
pub const SELECTED_OUTLINE_COLOR: Color = Color::from_rgb(1.0, 0.8, 0.3);
pub const LABEL_COLOR: Color = Color::from_rgb(0.85, 0.85, 0.85);
pub const PREVIEW_COLOR: Color = Color::from_rgba(0.3, 0.7, 1.0, 0.35);
pub const PREVIEW_COLLIDING_COLOR: Color = Color::from_rgba(1.0, 0.3, 0.3, 0.35);

/// Fallback when a segment color cannot be parsed
pub const DEFAULT_SEGMENT_COLOR: Color = Color::from_rgb(0.2, 0.6, 0.8);

/// Parse a `#RRGGBB` segment color
pub fn parse_hex_color(hex: &str) -> Option<Color> {
    let hex = hex.strip_prefix('#').unwrap_or(hex);
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some(Color::from_rgb8(channel(0)?, channel(2)?, channel(4)?))
}

/// Segment fill color, dimmed unless the loop is active
pub fn segment_fill(hex: &str, active: bool) -> Color {
    let color = parse_hex_color(hex).unwrap_or(DEFAULT_SEGMENT_COLOR);
    Color {
        a: if active { 0.85 } else { 0.55 },
        ..color
    }
}
