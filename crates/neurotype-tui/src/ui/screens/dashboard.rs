use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use neurotype_core::models::{DailyEmotions, Dashboard, Emotion};

use crate::app::App;
use crate::ui::styles;

/// Width of the longest bar in the weekly chart
const BAR_WIDTH: u64 = 24;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let Some(ref dashboard) = app.dashboard else {
        let text = if app.pending_requests > 0 {
            "Loading dashboard..."
        } else {
            "No dashboard data. Press [u] to retry."
        };
        let paragraph = Paragraph::new(Span::styled(text, styles::muted_style())).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(styles::border_style(false)),
        );
        frame.render_widget(paragraph, area);
        return;
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(8), Constraint::Min(6)])
        .split(area);
    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[0]);

    render_summary(frame, dashboard, top[0]);
    render_shortcuts(frame, dashboard, top[1]);
    render_week(frame, dashboard, rows[1]);
}

fn render_summary(frame: &mut Frame, dashboard: &Dashboard, area: Rect) {
    let today = dashboard.prevalent_today();
    let plan = dashboard.plan.map(|p| p.label()).unwrap_or("-");

    let lines = vec![
        Line::from(Span::styled(
            format!("Hello, {}!", dashboard.display_name()),
            styles::highlight_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("Notes written:  ", styles::muted_style()),
            Span::styled(dashboard.total_notes.to_string(), styles::list_item_style()),
        ]),
        Line::from(vec![
            Span::styled("Today's mood:   ", styles::muted_style()),
            Span::styled(
                format!("{} {}", today.emoji(), today.display_name()),
                Style::default().fg(styles::emotion_color(today)),
            ),
        ]),
        Line::from(vec![
            Span::styled("Plan:           ", styles::muted_style()),
            Span::styled(plan, styles::list_item_style()),
        ]),
    ];

    let block = Block::default()
        .title(" Dashboard ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn shortcut(key: &'static str, label: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("[{}] ", key), styles::help_key_style()),
        Span::styled(label, styles::help_desc_style()),
    ])
}

fn render_shortcuts(frame: &mut Frame, dashboard: &Dashboard, area: Rect) {
    let mut lines = vec![
        shortcut("n", "Notes"),
        shortcut("c", "Emotion calendar"),
        shortcut("r", "Recommendations"),
        shortcut("x", "Export notes"),
    ];
    if dashboard.chat_enabled() {
        lines.push(shortcut("t", "Chat"));
    }
    lines.push(shortcut("p", "Profile"));
    lines.push(shortcut("s", "Select plan"));

    let block = Block::default()
        .title(" Go to ")
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// One text bar per emotion per day, scaled to the week's largest count
fn week_lines(days: &[DailyEmotions]) -> Vec<Line<'static>> {
    let max = days.iter().map(|d| d.emotions.max()).max().unwrap_or(0);
    if max == 0 {
        return vec![Line::from(Span::styled(
            "No emotions recorded this week.",
            styles::muted_style(),
        ))];
    }

    let mut lines = Vec::new();
    for day in days {
        lines.push(Line::from(Span::styled(day.label(), styles::highlight_style())));
        for emotion in Emotion::ALL {
            let count = day.emotions.get(emotion);
            if count == 0 {
                continue;
            }
            let len = (u64::from(count) * BAR_WIDTH).div_ceil(u64::from(max)) as usize;
            lines.push(Line::from(vec![
                Span::styled(format!("  {:<6} ", emotion.display_name()), styles::muted_style()),
                Span::styled(
                    "█".repeat(len),
                    Style::default().fg(styles::emotion_color(emotion)),
                ),
                Span::styled(format!(" {}", count), styles::muted_style()),
            ]));
        }
    }
    lines
}

fn render_week(frame: &mut Frame, dashboard: &Dashboard, area: Rect) {
    let block = Block::default()
        .title(" This week ")
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));
    let paragraph = Paragraph::new(week_lines(&dashboard.weekly_emotion_data)).block(block);
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use neurotype_core::models::EmotionCounts;

    #[test]
    fn test_week_lines_scale_to_largest_count() {
        let days = vec![DailyEmotions {
            date: "2024-10-03".to_string(),
            emotions: EmotionCounts {
                happy: 4,
                calm: 0,
                sad: 1,
                upset: 0,
            },
        }];
        let lines = week_lines(&days);
        // label + happy + sad
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1].spans[1].content.chars().count(), BAR_WIDTH as usize);
        assert_eq!(lines[2].spans[1].content.chars().count(), 6);
    }

    #[test]
    fn test_huge_counts_do_not_overflow() {
        let days = vec![DailyEmotions {
            date: "2024-10-03".to_string(),
            emotions: EmotionCounts {
                happy: u32::MAX,
                calm: u32::MAX / 2,
                sad: 0,
                upset: 0,
            },
        }];
        let lines = week_lines(&days);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1].spans[1].content.chars().count(), BAR_WIDTH as usize);
        assert_eq!(lines[2].spans[1].content.chars().count(), 12);
    }

    #[test]
    fn test_empty_week() {
        let lines = week_lines(&[]);
        assert_eq!(lines.len(), 1);
    }
}
