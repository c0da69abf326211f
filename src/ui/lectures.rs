use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
};

use crate::analytics::LecturePerformance;
use crate::models::{Lecture, ProcessingStatus};
use crate::ui::layout::calculate_split_chunks;
use crate::utils::fit_width;

fn status_style(status: ProcessingStatus) -> Style {
    match status {
        ProcessingStatus::Completed => Style::default().fg(Color::Green),
        ProcessingStatus::Processing | ProcessingStatus::Uploaded => {
            Style::default().fg(Color::Yellow)
        }
        ProcessingStatus::Error => Style::default().fg(Color::Red),
    }
}

fn performance_text(performance: &LecturePerformance) -> Text<'static> {
    let mut text = Text::default();
    match performance {
        LecturePerformance::NoQuestions { message, .. } => {
            text.push_line(Line::from(Span::styled(
                message.clone(),
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            )));
        }
        LecturePerformance::Report {
            overall_statistics: stats,
            question_statistics,
            ..
        } => {
            text.push_line(Line::from(format!(
                "{} questions, {} responses, {:.1}% correct",
                stats.total_questions, stats.total_responses, stats.overall_correct_rate
            )));
            text.push_line(Line::from(""));
            for (tier, b) in &stats.difficulty_breakdown {
                text.push_line(Line::from(format!(
                    "{:<8} {:>3} q  {:>4} r  {:>5.1}%",
                    tier.as_str(),
                    b.question_count,
                    b.response_count,
                    b.correct_rate
                )));
            }
            text.push_line(Line::from(""));
            for q in question_statistics {
                text.push_line(Line::from(vec![
                    Span::styled(
                        format!("#{:<4} slide {:<3} ", q.question_id, q.slide_number),
                        Style::default().fg(Color::Cyan),
                    ),
                    Span::from(format!("{:>5.1}%  ", q.correct_rate)),
                    Span::from(q.question_text.clone()),
                ]));
            }
        }
    }
    text
}

pub fn draw_lectures(
    f: &mut Frame,
    area: Rect,
    lectures: &[Lecture],
    selected: usize,
    performance: Option<&LecturePerformance>,
) {
    let layout = calculate_split_chunks(area);
    let title_width = layout.list_area.width.saturating_sub(14) as usize;

    let items: Vec<ListItem> = if lectures.is_empty() {
        vec![ListItem::new("No lectures yet").style(
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )]
    } else {
        lectures
            .iter()
            .enumerate()
            .map(|(i, lecture)| {
                let style = if i == selected {
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                ListItem::new(Line::from(vec![
                    Span::styled(fit_width(&lecture.title, title_width), style),
                    Span::from(" "),
                    Span::styled(
                        lecture.processing_status.as_str(),
                        status_style(lecture.processing_status),
                    ),
                ]))
            })
            .collect()
    };

    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(" Lectures "));
    f.render_widget(list, layout.list_area);

    let detail = match (lectures.get(selected), performance) {
        (Some(lecture), Some(performance)) => {
            let mut text = performance_text(performance);
            if let Some(error) = &lecture.error_message {
                text.push_line(Line::from(Span::styled(
                    format!("Error: {}", error),
                    Style::default().fg(Color::Red),
                )));
            }
            text
        }
        _ => Text::from("Select a lecture"),
    };
    let title = lectures
        .get(selected)
        .map(|l| format!(" {} ", l.title))
        .unwrap_or_default();
    let paragraph = Paragraph::new(detail)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(paragraph, layout.detail_area);
}
