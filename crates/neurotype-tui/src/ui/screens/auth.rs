use ratatui::{
    layout::Rect,
    text::{Line, Span},
    Frame,
};

use crate::app::App;
use crate::ui::styles;

use super::{form_lines, render_dialog};

pub fn render_landing(frame: &mut Frame, area: Rect) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled("            N E U R O T Y P E", styles::title_style())),
        Line::from(""),
        Line::from(Span::styled("   Your journey begins here.", styles::list_item_style())),
        Line::from(Span::styled(
            "   Track your health with the help of NLP",
            styles::muted_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::raw("   "),
            Span::styled("[Enter]", styles::help_key_style()),
            Span::styled(" Get Started   ", styles::help_desc_style()),
            Span::styled("[r]", styles::help_key_style()),
            Span::styled(" Register", styles::help_desc_style()),
        ]),
        Line::from(""),
    ];
    render_dialog(frame, area, "Welcome", lines, 48);
}

pub fn render_login(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = vec![
        Line::from(Span::styled("  Welcome back", styles::highlight_style())),
        Line::from(""),
    ];
    lines.extend(form_lines(&app.login));
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("  No account? ", styles::muted_style()),
        Span::styled("[Ctrl+R]", styles::help_key_style()),
        Span::styled(" Register", styles::muted_style()),
    ]));
    render_dialog(frame, area, "Login", lines, 56);
}

pub fn render_register(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = vec![
        Line::from(Span::styled("  Create your account", styles::highlight_style())),
        Line::from(Span::styled(
            "  Passwords need at least 8 characters.",
            styles::muted_style(),
        )),
        Line::from(""),
    ];
    lines.extend(form_lines(&app.register));
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("  Have an account? ", styles::muted_style()),
        Span::styled("[Ctrl+L]", styles::help_key_style()),
        Span::styled(" Login", styles::muted_style()),
    ]));
    render_dialog(frame, area, "Register", lines, 56);
}
