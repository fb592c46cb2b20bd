use chrono::{Datelike, NaiveDate};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use neurotype_core::calendar::{Heatmap, Month};
use neurotype_core::models::Emotion;

use crate::app::App;
use crate::ui::styles;

/// Columns per day cell
const CELL_WIDTH: usize = 5;

const WEEKDAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(40), Constraint::Min(20)])
        .split(area);

    let today = chrono::Local::now().date_naive();
    let block = Block::default()
        .title(format!(" ◀ {} ▶ ", app.month.title()))
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));
    let grid = Paragraph::new(grid_lines(app.month, &app.heatmap, today)).block(block);
    frame.render_widget(grid, chunks[0]);

    render_legend(frame, app, chunks[1]);
}

/// Weekday header then one line per week; days with a summary are coloured
fn grid_lines(month: Month, heatmap: &Heatmap, today: NaiveDate) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(
        WEEKDAYS
            .iter()
            .map(|d| Span::styled(format!("{:^CELL$}", d, CELL = CELL_WIDTH), styles::muted_style()))
            .collect::<Vec<_>>(),
    )];

    for week in month.weeks() {
        let spans: Vec<Span> = week
            .iter()
            .map(|cell| match cell {
                None => Span::raw(" ".repeat(CELL_WIDTH)),
                Some(date) => match heatmap.get(*date) {
                    // Emoji are two columns wide
                    Some(emotion) => Span::styled(
                        format!("{:>2}{} ", date.day(), emotion.emoji()),
                        styles::emotion_cell_style(emotion),
                    ),
                    None => {
                        let style = if *date == today {
                            styles::highlight_style()
                        } else {
                            styles::list_item_style()
                        };
                        Span::styled(format!("{:^CELL$}", date.day(), CELL = CELL_WIDTH), style)
                    }
                },
            })
            .collect();
        lines.push(Line::from(spans));
    }
    lines
}

fn render_legend(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = vec![Line::from(Span::styled("Prevalent emotion", styles::highlight_style()))];
    for emotion in Emotion::ALL {
        lines.push(Line::from(vec![
            Span::styled("  ██ ", Style::default().fg(styles::emotion_color(emotion))),
            Span::styled(
                format!("{} {}", emotion.emoji(), emotion.display_name()),
                styles::list_item_style(),
            ),
        ]));
    }
    lines.push(Line::from(""));
    let summary = if app.heatmap.is_empty() {
        "No entries this month".to_string()
    } else {
        format!("{} day(s) with entries", app.heatmap.len())
    };
    lines.push(Line::from(Span::styled(summary, styles::muted_style())));

    let block = Block::default()
        .title(" Legend ")
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use neurotype_core::models::EmotionSummary;

    #[test]
    fn test_grid_shape_and_colouring() {
        let month = Month::new(2024, 9).unwrap();
        let sept_2 = NaiveDate::from_ymd_opt(2024, 9, 2).unwrap();
        let heatmap = Heatmap::from_summaries(&[EmotionSummary {
            date: sept_2,
            prevalent_emotion: Emotion::Sad,
        }]);
        let today = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();

        let lines = grid_lines(month, &heatmap, today);
        // header + five weeks
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[1].spans.len(), 7);
        assert_eq!(lines[1].spans[1].style, styles::emotion_cell_style(Emotion::Sad));
        assert_eq!(lines[1].spans[0].style, styles::list_item_style());
        assert_eq!(lines[1].spans[0].content.trim(), "1");
        assert_eq!(lines[1].spans[1].content, " 2😢 ");
    }
}
