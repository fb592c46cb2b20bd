use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use neurotype_core::chat::{Speaker, Transcript};

use crate::app::{App, ChatStatus};
use crate::ui::screens::{inner_rows, wrapped_rows};
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &mut App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(3)])
        .split(area);

    let status = match app.chat.status {
        ChatStatus::Connecting => "connecting...",
        ChatStatus::Connected => "connected",
        ChatStatus::Closed => "closed",
        ChatStatus::Disconnected => "offline",
    };

    let mut lines = transcript_lines(&app.chat.transcript);
    if let Some(ref error) = app.chat.error {
        lines.push(Line::from(Span::styled(error.clone(), styles::error_style())));
    }

    // Newest rows at the bottom unless the user paged back
    let max_scroll = wrapped_rows(&lines, chunks[0]).saturating_sub(inner_rows(chunks[0]));
    app.chat.scroll_back = app.chat.scroll_back.min(max_scroll);
    let top = max_scroll - app.chat.scroll_back;

    let title = if app.chat.scroll_back > 0 {
        format!(" Chat ({}) [{} more below] ", status, app.chat.scroll_back)
    } else {
        format!(" Chat ({}) ", status)
    };
    let block = Block::default()
        .title(title)
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((u16::try_from(top).unwrap_or(u16::MAX), 0));
    frame.render_widget(paragraph, chunks[0]);

    let input = if app.chat.input.is_empty() {
        Line::from(vec![
            Span::styled("Type your message...", styles::muted_style()),
            Span::raw("▌"),
        ])
    } else {
        Line::from(format!("{}▌", app.chat.input))
    };
    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(app.chat.status == ChatStatus::Connected));
    frame.render_widget(Paragraph::new(input).block(input_block), chunks[1]);
}

fn transcript_lines(transcript: &Transcript) -> Vec<Line<'static>> {
    if transcript.is_empty() {
        return vec![Line::from(Span::styled(
            "Say hello to start the conversation.",
            styles::muted_style(),
        ))];
    }
    transcript
        .messages()
        .iter()
        .map(|message| {
            let (who, style) = match message.sender {
                Speaker::User => ("You", styles::user_message_style()),
                Speaker::Bot => ("Bot", styles::bot_message_style()),
            };
            Line::from(vec![
                Span::styled(format!("{}: ", who), style),
                Span::styled(message.text.clone(), styles::list_item_style()),
            ])
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_lines() {
        let mut transcript = Transcript::default();
        transcript.push_user("hi");
        transcript.push_bot("hello!");

        let lines = transcript_lines(&transcript);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].spans[0].content, "You: ");
        assert_eq!(lines[1].spans[1].content, "hello!");
    }

    #[test]
    fn test_long_reply_keeps_its_end_in_view() {
        use crate::app::PAGE_SCROLL_SIZE;
        use crate::ui::screens::test_support::{draw, offline_app};

        let mut app = offline_app();
        app.chat.transcript.push_user("first");
        app.chat.transcript.push_user("second");
        app.chat.transcript.push_user("third");
        app.chat.transcript.push_bot(format!("{}LATEST_END", "word ".repeat(58)));

        let screen = draw(&mut app, 40, 14, render);
        assert!(screen.contains("LATEST_END"));
        assert!(!screen.contains("You: first"));

        app.chat.scroll_older(PAGE_SCROLL_SIZE);
        let screen = draw(&mut app, 40, 14, render);
        assert!(screen.contains("You: first"));
        assert!(!screen.contains("LATEST_END"));
        // Clamped to the rows that actually overflow
        assert!(app.chat.scroll_back > 0 && app.chat.scroll_back < PAGE_SCROLL_SIZE);

        app.chat.scroll_newer(PAGE_SCROLL_SIZE);
        let screen = draw(&mut app, 40, 14, render);
        assert!(screen.contains("LATEST_END"));
    }
}
