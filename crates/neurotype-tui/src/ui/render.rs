use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use neurotype_core::routes::Route;

use crate::app::{App, AppState};

use super::screens::{account, auth, calendar, chat, dashboard, notes};
use super::styles;

pub fn render(frame: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Min(10),   // Main content
            Constraint::Length(2), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    render_main_content(frame, app, chunks[1]);
    render_status_bar(frame, app, chunks[2]);

    // Render overlays
    match app.state {
        AppState::ShowingHelp => render_help_overlay(frame),
        AppState::ConfirmingQuit => render_confirm_overlay(frame, "Are you sure you want to quit?", "quit"),
        AppState::ConfirmingDelete => {
            render_confirm_overlay(frame, "Delete this note permanently?", "delete")
        }
        AppState::Normal | AppState::Quitting => {}
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = format!("  NEUROTYPE · {}", app.current_route().title());

    let who = if app.session_view.is_loading {
        "Loading profile...".to_string()
    } else if let Some(ref user) = app.session_view.user {
        user.display_name().to_string()
    } else {
        String::new()
    };
    let right = format!("{}  [?] Help", who);

    let title_line = Line::from(vec![
        Span::styled(title.clone(), styles::title_style()),
        Span::raw(" ".repeat(
            (area.width as usize).saturating_sub(title.chars().count() + right.chars().count() + 2),
        )),
        Span::styled(right, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    frame.render_widget(Paragraph::new(title_line).block(block), area);
}

fn render_main_content(frame: &mut Frame, app: &mut App, area: Rect) {
    match app.current_route() {
        Route::Landing => auth::render_landing(frame, area),
        Route::Login => auth::render_login(frame, app, area),
        Route::Register => auth::render_register(frame, app, area),
        Route::SelectPlan => account::render_select_plan(frame, app, area),
        Route::Profile => account::render_profile(frame, app, area),
        Route::Dashboard => dashboard::render(frame, app, area),
        Route::Notes => notes::render_list(frame, app, area),
        Route::NoteDetail(_) => notes::render_detail(frame, app, area),
        Route::Calendar => calendar::render(frame, app, area),
        Route::Recommendations => account::render_recommendations(frame, app, area),
        Route::Export => account::render_export(frame, app, area),
        Route::Chat => chat::render(frame, app, area),
    }
}

/// Key hints for the current screen
fn shortcuts(app: &App) -> &'static str {
    match app.current_route() {
        Route::Landing => "[Enter] login | [r]egister | [q]uit",
        Route::Login | Route::Register | Route::Profile => "[Tab] next field | [Enter] submit | [Esc] back",
        Route::SelectPlan => "[←/→] choose | [Enter] confirm | [Esc] back",
        Route::Dashboard => "[u]pdate | [l]ogout | [q]uit",
        Route::Notes => "[Enter] open | [n]ew | [u]pdate | [Esc] back",
        Route::NoteDetail(_) if app.editor.editing => "[Ctrl+S] save | [Esc] stop editing",
        Route::NoteDetail(_) => "[e]dit | [d]elete | [PgUp/PgDn] scroll | [Esc] back",
        Route::Calendar => "[←/→] month | [t]oday | [Esc] back",
        Route::Recommendations => "[u]pdate | [Esc] back",
        Route::Export => "[Enter] export | [Esc] back",
        Route::Chat => "[Enter] send | [PgUp/PgDn] scroll | [Esc] leave chat",
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let left_text = if app.pending_requests > 0 {
        " Loading... ".to_string()
    } else if let Some(ref msg) = app.status_message {
        format!(" {} ", msg)
    } else {
        String::new()
    };
    let right_text = format!(" {} ", shortcuts(app));

    let width = area.width as usize;
    let padding_len = width
        .saturating_sub(left_text.chars().count())
        .saturating_sub(right_text.chars().count());
    let status_line = Line::from(vec![
        Span::styled(left_text, styles::muted_style()),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right_text, styles::muted_style()),
    ]);
    let paragraph = Paragraph::new(status_line).style(styles::status_bar_style());
    frame.render_widget(paragraph, area);
}

fn help_line(key: &'static str, desc: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<10}", key), styles::help_key_style()),
        Span::styled(desc, styles::help_desc_style()),
    ])
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(52, 25, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(Span::styled("  NEUROTYPE", styles::title_style())),
        Line::from(Span::styled(
            "  Track your health with the help of NLP",
            styles::muted_style(),
        )),
        Line::from(""),
        Line::from(Span::styled(" Navigation", styles::highlight_style())),
        help_line("Esc", "Go back"),
        help_line("↑/↓", "Move selection / focus"),
        help_line("PgUp/PgDn", "Scroll page"),
        help_line("Tab", "Next field"),
        help_line("Enter", "Select / submit"),
        Line::from(""),
        Line::from(Span::styled(" Dashboard", styles::highlight_style())),
        help_line("n", "Notes"),
        help_line("c", "Emotion calendar"),
        help_line("r", "Recommendations"),
        help_line("x", "Export notes"),
        help_line("t", "Chat (Plus plan)"),
        help_line("p / s", "Profile / select plan"),
        Line::from(""),
        Line::from(Span::styled(" Actions", styles::highlight_style())),
        help_line("u", "Update data"),
        help_line("l", "Log out"),
        help_line("q", "Quit"),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_confirm_overlay(frame: &mut Frame, question: &str, verb: &str) {
    let area = centered_rect_fixed(46, 7, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(format!("   {}", question), styles::highlight_style())),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(format!(" to {}, ", verb), styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Create a centered rectangle with fixed dimensions
pub fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_rect_fixed() {
        let outer = Rect::new(0, 0, 100, 40);
        assert_eq!(centered_rect_fixed(46, 10, outer), Rect::new(27, 15, 46, 10));

        let small = Rect::new(0, 0, 20, 5);
        assert_eq!(centered_rect_fixed(46, 10, small), Rect::new(0, 0, 20, 5));
    }
}
