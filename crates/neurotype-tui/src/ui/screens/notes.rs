use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

use neurotype_core::models::NoteRef;

use crate::app::App;
use crate::ui::screens::{inner_rows, wrapped_rows};
use crate::ui::styles;

pub fn render_list(frame: &mut Frame, app: &App, area: Rect) {
    if app.notes.is_empty() {
        let text = if !app.notes_loaded {
            "Loading notes..."
        } else {
            "No notes found. Press [n] to write your first note."
        };
        let paragraph = Paragraph::new(Span::styled(text, styles::muted_style())).block(
            Block::default()
                .title(" Your Notes ")
                .title_style(styles::title_style())
                .borders(Borders::ALL)
                .border_style(styles::border_style(true)),
        );
        frame.render_widget(paragraph, area);
        return;
    }

    let header = Row::new([
        Cell::from("Title"),
        Cell::from("Created"),
        Cell::from("Mood"),
        Cell::from("Preview"),
    ])
    .style(styles::title_style())
    .height(1);

    let rows: Vec<Row> = app
        .notes
        .iter()
        .enumerate()
        .map(|(i, note)| {
            let style = if i == app.notes_selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };
            let mood = match note.emotion {
                Some(emotion) => Cell::from(Span::styled(
                    format!("{} {}", emotion.emoji(), emotion.display_name()),
                    Style::default().fg(styles::emotion_color(emotion)),
                )),
                None => Cell::from("-"),
            };
            Row::new(vec![
                Cell::from(note.display_title().to_string()),
                Cell::from(note.created_display()),
                mood,
                Cell::from(note.preview()),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Percentage(25),
        Constraint::Length(14),
        Constraint::Length(12),
        Constraint::Fill(1),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(format!(" Your Notes ({}) ", app.notes.len()))
                .title_style(styles::title_style())
                .borders(Borders::ALL)
                .border_style(styles::border_style(true)),
        )
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    state.select(Some(app.notes_selection));

    frame.render_stateful_widget(table, area, &mut state);
}

pub fn render_detail(frame: &mut Frame, app: &mut App, area: Rect) {
    let editor = &mut app.editor;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(5)])
        .split(area);

    let heading = match (&editor.note, editor.target) {
        (_, Some(NoteRef::New)) => Line::from(Span::styled("New note", styles::highlight_style())),
        (Some(note), _) => {
            let mut spans = vec![
                Span::styled(note.display_title().to_string(), styles::highlight_style()),
                Span::styled(format!("  {}", note.created_display()), styles::muted_style()),
            ];
            if let Some(emotion) = note.emotion {
                spans.push(Span::styled(
                    format!("  {} {}", emotion.emoji(), emotion.display_name()),
                    Style::default().fg(styles::emotion_color(emotion)),
                ));
            }
            Line::from(spans)
        }
        (None, _) if editor.loading => {
            Line::from(Span::styled("Loading note...", styles::muted_style()))
        }
        (None, _) => Line::from(""),
    };

    let mut header_lines = vec![heading];
    if let Some(ref error) = editor.error {
        header_lines.push(Line::from(Span::styled(error.clone(), styles::error_style())));
    } else if editor.saving {
        header_lines.push(Line::from(Span::styled("Saving...", styles::muted_style())));
    }
    let header_block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());
    frame.render_widget(Paragraph::new(header_lines).block(header_block), chunks[0]);

    let body: Vec<Line> = if editor.text.is_empty() && editor.editing {
        vec![Line::from(vec![
            Span::styled("Write your note here...", styles::muted_style()),
            Span::raw("▌"),
        ])]
    } else {
        let mut lines: Vec<Line> = editor
            .text
            .split('\n')
            .map(|l| Line::from(l.to_string()))
            .collect();
        if editor.editing {
            if let Some(last) = lines.last_mut() {
                last.spans.push(Span::raw("▌"));
            }
        }
        lines
    };

    let title = if editor.editing { " Editing " } else { " Note " };
    let block = Block::default()
        .title(title)
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(editor.editing));

    // The cursor sits at the end of the text, so editing follows the last row
    let max_scroll = wrapped_rows(&body, chunks[1]).saturating_sub(inner_rows(chunks[1]));
    editor.scroll = editor.scroll.min(max_scroll);
    let scroll = if editor.editing { max_scroll } else { editor.scroll };

    let paragraph = Paragraph::new(body)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((u16::try_from(scroll).unwrap_or(u16::MAX), 0));
    frame.render_widget(paragraph, chunks[1]);
}
