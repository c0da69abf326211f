use ratatui::layout::{Constraint, Direction, Layout, Rect};

pub struct ViewLayout {
    pub header_area: Rect,
    pub body_area: Rect,
    pub footer_area: Rect,
}

pub struct SplitLayout {
    pub list_area: Rect,
    pub detail_area: Rect,
}

pub fn calculate_view_chunks(area: Rect) -> ViewLayout {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(3),
        ])
        .split(area);

    ViewLayout {
        header_area: chunks[0],
        body_area: chunks[1],
        footer_area: chunks[2],
    }
}

/// List on the left third, details on the rest.
pub fn calculate_split_chunks(area: Rect) -> SplitLayout {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(area);

    SplitLayout {
        list_area: chunks[0],
        detail_area: chunks[1],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_layout() {
        let layout = calculate_view_chunks(Rect::new(0, 0, 100, 40));

        // margin 1 leaves 38 rows
        assert_eq!(layout.header_area.height, 3);
        assert_eq!(layout.footer_area.height, 3);
        assert_eq!(layout.body_area.height, 32);
        assert_eq!(layout.body_area.y, 4);
    }

    #[test]
    fn test_split_layout() {
        let layout = calculate_split_chunks(Rect::new(0, 0, 100, 20));
        assert_eq!(layout.list_area.width, 35);
        assert_eq!(layout.detail_area.width, 65);
        assert_eq!(layout.detail_area.x, 35);
    }
}
