use chrono::{DateTime, Utc};
use crossterm::event::KeyCode;
use ratatui::{
    Frame,
    layout::Alignment,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::analytics::{
    Dashboard, LecturePerformance, Recommendation, Snapshot, dashboard as build_dashboard,
    lecture_performance, recommendations as build_recommendations,
};

mod dashboard;
pub mod layout;
mod lectures;
mod recommendations;

pub use dashboard::draw_dashboard;
pub use layout::{calculate_split_chunks, calculate_view_chunks};
pub use lectures::draw_lectures;
pub use recommendations::draw_recommendations;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Dashboard,
    Lectures,
    Recommendations,
}

impl View {
    const ORDER: [View; 3] = [View::Dashboard, View::Lectures, View::Recommendations];

    fn title(&self) -> &'static str {
        match self {
            View::Dashboard => "Dashboard",
            View::Lectures => "Lectures",
            View::Recommendations => "Recommendations",
        }
    }

    fn next(self) -> View {
        let idx = View::ORDER.iter().position(|v| *v == self).unwrap_or(0);
        View::ORDER[(idx + 1) % View::ORDER.len()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerAction {
    Continue,
    Reload,
    Quit,
}

pub struct ViewerState {
    pub view: View,
    pub selected_lecture: usize,
    snapshot: Snapshot,
    dashboard: Dashboard,
    recommendations: Vec<Recommendation>,
    performance: Option<LecturePerformance>,
}

impl ViewerState {
    pub fn new(snapshot: Snapshot, now: DateTime<Utc>) -> Self {
        let mut state = Self {
            view: View::Dashboard,
            selected_lecture: 0,
            dashboard: build_dashboard(&snapshot, now),
            recommendations: build_recommendations(&snapshot, None, None),
            performance: None,
            snapshot,
        };
        state.select(0);
        state
    }

    /// Swap in fresh data, keeping the current view and selection where possible.
    pub fn reload(&mut self, snapshot: Snapshot, now: DateTime<Utc>) {
        let view = self.view;
        let selected = self.selected_lecture;
        *self = Self::new(snapshot, now);
        self.view = view;
        self.select(selected);
    }

    fn select(&mut self, index: usize) {
        let last = self.snapshot.lectures.len().saturating_sub(1);
        self.selected_lecture = index.min(last);
        self.performance = self
            .snapshot
            .lectures
            .get(self.selected_lecture)
            .and_then(|l| lecture_performance(&self.snapshot, l.id).ok());
    }

    pub fn performance(&self) -> Option<&LecturePerformance> {
        self.performance.as_ref()
    }

    pub fn handle_key(&mut self, key: KeyCode) -> ViewerAction {
        match key {
            KeyCode::Char('q') | KeyCode::Esc => return ViewerAction::Quit,
            KeyCode::Char('r') => return ViewerAction::Reload,
            KeyCode::Tab => self.view = self.view.next(),
            KeyCode::Char('1') => self.view = View::Dashboard,
            KeyCode::Char('2') => self.view = View::Lectures,
            KeyCode::Char('3') => self.view = View::Recommendations,
            KeyCode::Up if self.view == View::Lectures => {
                self.select(self.selected_lecture.saturating_sub(1))
            }
            KeyCode::Down if self.view == View::Lectures => self.select(self.selected_lecture + 1),
            _ => {}
        }
        ViewerAction::Continue
    }
}

fn key_hint(key: &'static str, label: &'static str) -> [Span<'static>; 2] {
    [
        Span::styled(
            key,
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::from(label),
    ]
}

pub fn draw_viewer(f: &mut Frame, state: &ViewerState) {
    let layout = calculate_view_chunks(f.area());

    let tabs: Vec<Span> = View::ORDER
        .iter()
        .enumerate()
        .flat_map(|(i, view)| {
            let style = if *view == state.view {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            [
                Span::styled(format!("[{}] {}", i + 1, view.title()), style),
                Span::from("   "),
            ]
        })
        .collect();
    let header = Paragraph::new(Line::from(tabs))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title(" lecture-qa "));
    f.render_widget(header, layout.header_area);

    match state.view {
        View::Dashboard => draw_dashboard(f, layout.body_area, &state.dashboard),
        View::Lectures => draw_lectures(
            f,
            layout.body_area,
            &state.snapshot.lectures,
            state.selected_lecture,
            state.performance(),
        ),
        View::Recommendations => {
            draw_recommendations(f, layout.body_area, &state.recommendations)
        }
    }

    let mut hints: Vec<Span> = Vec::new();
    hints.extend(key_hint("Tab", " Next view  "));
    if state.view == View::Lectures {
        hints.extend(key_hint("↑/↓", " Select  "));
    }
    hints.extend(key_hint("r", " Reload  "));
    hints.extend(key_hint("q", " Quit"));
    let footer = Paragraph::new(Line::from(hints))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(footer, layout.footer_area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::fixtures::*;
    use crate::models::{DifficultyTier, QuestionType};
    use ratatui::{Terminal, backend::TestBackend};

    fn sample() -> Snapshot {
        snapshot(
            vec![lecture(1, "Cell Biology"), lecture(2, "Organic Chemistry")],
            vec![
                question(1, 1, DifficultyTier::Easy, QuestionType::Essay, Some(40)),
                question(2, 1, DifficultyTier::Hard, QuestionType::ShortAnswer, Some(55)),
            ],
            vec![
                response(1, 1, "s1", Some(false), 1),
                response(2, 2, "s1", Some(true), 2),
            ],
        )
    }

    fn render(state: &ViewerState) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 40)).unwrap();
        terminal.draw(|f| draw_viewer(f, state)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer
            .content
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|c| c.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_dashboard_view_renders_overview() {
        let state = ViewerState::new(sample(), epoch());
        let screen = render(&state);
        assert!(screen.contains("Lectures:   2"));
        assert!(screen.contains("47.5%"));
        assert!(screen.contains("By difficulty"));
    }

    #[test]
    fn test_lecture_view_follows_selection() {
        let mut state = ViewerState::new(sample(), epoch());
        state.handle_key(KeyCode::Char('2'));
        let screen = render(&state);
        assert!(screen.contains("Cell Biology"));
        assert!(screen.contains("2 questions, 2 responses, 50.0% correct"));

        state.handle_key(KeyCode::Down);
        state.handle_key(KeyCode::Down);
        assert_eq!(state.selected_lecture, 1);
        let screen = render(&state);
        assert!(screen.contains("No questions available for this lecture yet"));
    }

    #[test]
    fn test_recommendation_view() {
        let mut state = ViewerState::new(sample(), epoch());
        state.handle_key(KeyCode::Tab);
        state.handle_key(KeyCode::Tab);
        assert_eq!(state.view, View::Recommendations);
        let screen = render(&state);
        assert!(screen.contains("Overall understanding improvement needed"));
    }

    #[test]
    fn test_keys() {
        let mut state = ViewerState::new(Snapshot::default(), epoch());
        assert_eq!(state.handle_key(KeyCode::Char('r')), ViewerAction::Reload);
        assert_eq!(state.handle_key(KeyCode::Esc), ViewerAction::Quit);
        // selection in an empty list stays put
        state.handle_key(KeyCode::Char('2'));
        state.handle_key(KeyCode::Down);
        assert_eq!(state.selected_lecture, 0);
        assert!(state.performance().is_none());
        assert!(render(&state).contains("No lectures yet"));
    }

    #[test]
    fn test_reload_keeps_view() {
        let mut state = ViewerState::new(sample(), epoch());
        state.handle_key(KeyCode::Char('2'));
        state.handle_key(KeyCode::Down);
        state.reload(sample(), epoch());
        assert_eq!(state.view, View::Lectures);
        assert_eq!(state.selected_lecture, 1);
    }
}
