//! One module per group of screens. Each exposes `render*` functions taking
//! the frame, the app and the content area.

pub mod account;
pub mod auth;
pub mod calendar;
pub mod chat;
pub mod dashboard;
pub mod notes;

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use neurotype_core::utils::{mask, truncate_string};

use crate::app::Form;
use crate::ui::render::centered_rect_fixed;
use crate::ui::styles;

/// Visible width of a field's input box
const FIELD_WIDTH: usize = 28;

/// Lines for a form: one per field, the button, then any errors
pub fn form_lines(form: &Form) -> Vec<Line<'static>> {
    let label_width = form
        .fields
        .iter()
        .map(|f| f.label.chars().count())
        .max()
        .unwrap_or(0);

    let mut lines = Vec::new();
    for (i, field) in form.fields.iter().enumerate() {
        let focused = form.focus == i;
        let style = if focused {
            styles::selected_style()
        } else {
            styles::list_item_style()
        };
        let shown = if field.masked {
            mask(&field.value)
        } else {
            field.value.clone()
        };
        // Keep the tail visible while typing past the box width
        let skip = shown.chars().count().saturating_sub(FIELD_WIDTH);
        let visible: String = shown.chars().skip(skip).collect();
        let cursor = if focused { "▌" } else { "" };

        lines.push(Line::from(vec![
            Span::styled(
                format!("  {:>width$}: [", field.label, width = label_width),
                styles::muted_style(),
            ),
            Span::styled(format!("{:<width$}{}", visible, cursor, width = FIELD_WIDTH), style),
            Span::styled("]", styles::muted_style()),
        ]));
    }

    lines.push(Line::from(""));
    let button = if form.submitting {
        format!("  {}...  ", form.button)
    } else if form.on_button() {
        format!(" ▶ {} ◀ ", form.button)
    } else {
        format!("   {}   ", form.button)
    };
    let button_style = if form.on_button() {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    lines.push(Line::from(vec![
        Span::raw(" ".repeat(label_width + 6)),
        Span::raw("["),
        Span::styled(button, button_style),
        Span::raw("]"),
    ]));

    if !form.errors.is_empty() {
        lines.push(Line::from(""));
        for error in &form.errors {
            lines.push(Line::from(Span::styled(
                format!("  {}", truncate_string(error, 60)),
                styles::error_style(),
            )));
        }
    }
    lines
}

/// A titled, bordered box centered in `area`
pub fn render_dialog(frame: &mut Frame, area: Rect, title: &str, lines: Vec<Line>, width: u16) {
    let height = lines.len() as u16 + 2;
    let area = centered_rect_fixed(width, height, area);
    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(format!(" {} ", title))
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

/// Rows `lines` fill once wrapped inside a bordered box drawn over `area`
pub fn wrapped_rows(lines: &[Line], area: Rect) -> usize {
    let inner_width = area.width.saturating_sub(2);
    Paragraph::new(lines.to_vec())
        .wrap(Wrap { trim: false })
        .line_count(inner_width)
}

/// Visible rows inside a bordered box drawn over `area`
pub fn inner_rows(area: Rect) -> usize {
    usize::from(area.height.saturating_sub(2))
}
