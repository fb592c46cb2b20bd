use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use neurotype_core::export::default_export_dir;
use neurotype_core::models::Plan;

use crate::app::{photo_label, App, PROFILE_PHOTO};
use crate::ui::styles;

use super::{form_lines, render_dialog};

pub fn render_select_plan(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = vec![
        Line::from(Span::styled("  Choose the plan that fits you", styles::highlight_style())),
        Line::from(""),
    ];
    for plan in Plan::SELECTABLE {
        let chosen = plan == app.plan;
        let marker = if chosen { "(•)" } else { "( )" };
        let style = if chosen {
            styles::selected_style()
        } else {
            styles::list_item_style()
        };
        lines.push(Line::from(Span::styled(
            format!("  {} {}", marker, plan.label()),
            style,
        )));
    }
    lines.push(Line::from(Span::styled(
        "      Plus unlocks the chat assistant",
        styles::muted_style(),
    )));
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::raw("  "),
        Span::styled("[Enter]", styles::help_key_style()),
        Span::styled(" Confirm Plan   ", styles::help_desc_style()),
        Span::styled("[Esc]", styles::help_key_style()),
        Span::styled(" Back", styles::help_desc_style()),
    ]));
    if let Some(ref error) = app.plan_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(format!("  {}", error), styles::error_style())));
    }
    render_dialog(frame, area, "Select Plan", lines, 52);
}

pub fn render_profile(frame: &mut Frame, app: &App, area: Rect) {
    let email = app
        .session_view
        .user
        .as_ref()
        .map(|u| u.email.as_str())
        .unwrap_or("");

    let mut lines = vec![
        Line::from(vec![
            Span::styled("  Signed in as ", styles::muted_style()),
            Span::styled(email.to_string(), styles::list_item_style()),
        ]),
        Line::from(Span::styled(
            "  Photo: path to an image file (optional)",
            styles::muted_style(),
        )),
        Line::from(""),
    ];
    lines.extend(form_lines(&app.profile));

    let photo = app.profile.value(PROFILE_PHOTO).trim();
    if !photo.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("  Uploading {}", photo_label(photo)),
            styles::muted_style(),
        )));
    }
    render_dialog(frame, area, "Profile", lines, 60);
}

pub fn render_recommendations(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = vec![];
    if app.recommendations.is_empty() {
        let text = if app.pending_requests > 0 {
            "Loading recommendations..."
        } else {
            "No recommendations yet. Write a few notes first."
        };
        lines.push(Line::from(Span::styled(text, styles::muted_style())));
    }
    for (i, rec) in app.recommendations.iter().enumerate() {
        lines.push(Line::from(vec![
            Span::styled(format!("{:>2}. ", i + 1), styles::highlight_style()),
            Span::styled(rec.clone(), styles::list_item_style()),
        ]));
        lines.push(Line::from(""));
    }

    let block = Block::default()
        .title(" Recommendations ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

pub fn render_export(frame: &mut Frame, app: &App, area: Rect) {
    let dir = default_export_dir(app.config.export_dir.as_deref());
    let mut lines = vec![
        Line::from(Span::styled(
            "  Download all your notes as a CSV file.",
            styles::list_item_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Folder: ", styles::muted_style()),
            Span::styled(dir.display().to_string(), styles::list_item_style()),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::raw("  "),
            Span::styled("[Enter]", styles::help_key_style()),
            Span::styled(" Export Data", styles::help_desc_style()),
        ]),
    ];
    if let Some(ref path) = app.export_path {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("  Saved to {}", path.display()),
            styles::success_style(),
        )));
    }
    render_dialog(frame, area, "Export Notes", lines, 64);
}
