use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use std::collections::BTreeMap;
use std::fmt::Display;

use crate::analytics::Dashboard;
use crate::analytics::dashboard::RateGroup;

fn rate_style(rate: f64) -> Style {
    if rate >= 70.0 {
        Style::default().fg(Color::Green)
    } else if rate >= 50.0 {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::Red)
    }
}

fn section<K: Display>(text: &mut Text<'_>, heading: &str, groups: &BTreeMap<K, RateGroup>) {
    text.push_line(Line::from(Span::styled(
        heading.to_string(),
        Style::default().add_modifier(Modifier::BOLD),
    )));
    if groups.is_empty() {
        text.push_line(Line::from(Span::styled(
            "  no rated questions yet",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )));
    }
    for (key, group) in groups {
        text.push_line(Line::from(vec![
            Span::from(format!("  {:<16}", key.to_string())),
            Span::from(format!("{:>4} questions  ", group.question_count)),
            Span::styled(
                format!("{:>5.1}%", group.average_correct_rate),
                rate_style(group.average_correct_rate),
            ),
        ]));
    }
    text.push_line(Line::from(""));
}

pub fn draw_dashboard(f: &mut Frame, area: Rect, dashboard: &Dashboard) {
    let o = &dashboard.overview;
    let mut text = Text::default();

    text.push_line(Line::from(format!("Lectures:   {}", o.total_lectures)));
    text.push_line(Line::from(format!("Questions:  {}", o.total_questions)));
    text.push_line(Line::from(format!(
        "Responses:  {} ({} in the last 7 days)",
        o.total_responses, o.recent_responses
    )));
    text.push_line(Line::from(vec![
        Span::from("Average correct rate: "),
        Span::styled(
            format!("{:.1}%", o.average_correct_rate),
            rate_style(o.average_correct_rate).add_modifier(Modifier::BOLD),
        ),
    ]));
    text.push_line(Line::from(""));

    section(&mut text, "By difficulty", &dashboard.difficulty_analysis);
    section(&mut text, "By question type", &dashboard.type_analysis);

    let body = Paragraph::new(text)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title(" Dashboard "));
    f.render_widget(body, area);
}
