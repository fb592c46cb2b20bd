use ratatui::style::{Color, Modifier, Style};

use neurotype_core::models::Emotion;

// Color palette
pub const PRIMARY: Color = Color::Rgb(112, 96, 192);
pub const SECONDARY: Color = Color::Rgb(96, 160, 96);
pub const ACCENT: Color = Color::Rgb(192, 160, 64);
pub const ERROR: Color = Color::Rgb(192, 64, 64);
pub const MUTED: Color = Color::Rgb(128, 128, 128);
pub const HIGHLIGHT: Color = Color::Rgb(48, 48, 64);

// Styles
pub fn title_style() -> Style {
    Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD)
}

pub fn selected_style() -> Style {
    Style::default().bg(HIGHLIGHT).add_modifier(Modifier::BOLD)
}

pub fn list_item_style() -> Style {
    Style::default().fg(Color::White)
}

pub fn muted_style() -> Style {
    Style::default().fg(MUTED)
}

pub fn highlight_style() -> Style {
    Style::default().fg(ACCENT)
}

pub fn success_style() -> Style {
    Style::default().fg(SECONDARY)
}

pub fn error_style() -> Style {
    Style::default().fg(ERROR)
}

pub fn border_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(PRIMARY)
    } else {
        Style::default().fg(MUTED)
    }
}

pub fn status_bar_style() -> Style {
    Style::default().bg(Color::Rgb(32, 32, 40)).fg(Color::White)
}

pub fn help_key_style() -> Style {
    Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
}

pub fn help_desc_style() -> Style {
    Style::default().fg(Color::White)
}

pub fn emotion_color(emotion: Emotion) -> Color {
    let (r, g, b) = emotion.rgb();
    Color::Rgb(r, g, b)
}

/// Heatmap cell: dark text on the emotion's colour
pub fn emotion_cell_style(emotion: Emotion) -> Style {
    Style::default()
        .bg(emotion_color(emotion))
        .fg(Color::Black)
        .add_modifier(Modifier::BOLD)
}

pub fn user_message_style() -> Style {
    Style::default().fg(ACCENT)
}

pub fn bot_message_style() -> Style {
    Style::default().fg(PRIMARY)
}
