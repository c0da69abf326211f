use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};

use crate::analytics::Recommendation;
use crate::analytics::recommendations::Priority;

pub fn draw_recommendations(f: &mut Frame, area: Rect, recommendations: &[Recommendation]) {
    let mut text = Text::default();

    if recommendations.is_empty() {
        text.push_line(Line::from(Span::styled(
            "Nothing to recommend right now",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )));
    }

    for rec in recommendations {
        let (label, color) = match rec.priority {
            Priority::High => ("HIGH", Color::Red),
            Priority::Medium => ("MEDIUM", Color::Yellow),
        };
        text.push_line(Line::from(vec![
            Span::styled(
                format!("[{}] ", label),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                rec.title.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ]));
        text.push_line(Line::from(rec.description.clone()));
        for item in &rec.action_items {
            text.push_line(Line::from(format!("  - {}", item)));
        }
        text.push_line(Line::from(""));
    }

    let body = Paragraph::new(text)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title(" Recommendations "));
    f.render_widget(body, area);
}
