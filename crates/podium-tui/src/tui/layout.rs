// Screen layout.
//
// +--------------------------------------------------+
// | Status Bar (1 row)                                |
// +--------------------------------------------------+
// | Leaderboard (fill, bordered)                      |
// +--------------------------------------------------+
// | Help Bar (1 row)                                  |
// +--------------------------------------------------+

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Resolved screen areas for each zone.
#[derive(Debug, Clone)]
pub struct AppLayout {
    /// Top row: load progress, known ranks, avatar queue.
    pub status_bar: Rect,
    /// The scrolling slot board, including its border.
    pub board: Rect,
    /// Bottom row: keyboard shortcut hints.
    pub help_bar: Rect,
}

impl AppLayout {
    /// Content rows inside the board border.
    pub fn board_rows(&self) -> u16 {
        self.board.height.saturating_sub(2)
    }
}

pub fn build_layout(area: Rect) -> AppLayout {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // status bar
            Constraint::Min(3),    // board
            Constraint::Length(1), // help bar
        ])
        .split(area);

    AppLayout {
        status_bar: vertical[0],
        board: vertical[1],
        help_bar: vertical[2],
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bars_are_one_row_and_board_fills_the_rest() {
        let layout = build_layout(Rect::new(0, 0, 100, 30));
        assert_eq!(layout.status_bar.height, 1);
        assert_eq!(layout.help_bar.height, 1);
        assert_eq!(layout.board.height, 28);
        assert_eq!(layout.board_rows(), 26);
        assert_eq!(layout.board.y, 1);
        assert_eq!(layout.help_bar.y, 29);
    }

    #[test]
    fn tiny_terminal_does_not_underflow() {
        let layout = build_layout(Rect::new(0, 0, 10, 2));
        assert!(layout.board_rows() <= layout.board.height);
    }
}
