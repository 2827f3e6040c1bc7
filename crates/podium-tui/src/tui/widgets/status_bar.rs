// Status bar widget: load progress, known ranks, avatar queue depth.

use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use podium_core::leaderboard::LoadProgress;

use crate::tui::ViewState;

/// Layout: [load indicator] [pages] | [ranks] | [avatars] | [finished at]
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let separator = || Span::styled(" | ", Style::default().fg(Color::Gray));

    let (dot, dot_color) = load_indicator(&state.progress);
    let mut spans = vec![
        Span::styled(format!(" {dot} "), Style::default().fg(dot_color)),
        Span::styled(page_summary(&state.progress), Style::default().fg(Color::White)),
        separator(),
        Span::styled(
            format!("{} players, ranks to #{}", state.entries, state.max_known_rank),
            Style::default().fg(Color::White),
        ),
        separator(),
        Span::styled(
            format!("Avatars queued: {}", state.avatar_queue),
            Style::default().fg(Color::White),
        ),
    ];

    if let Some(done) = state.progress.completed_at {
        spans.push(separator());
        spans.push(Span::styled(
            format!("Loaded {}", done.format("%H:%M:%S")),
            Style::default().fg(Color::DarkGray),
        ));
    }

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
    frame.render_widget(paragraph, area);
}

/// Yellow while pages are loading, green when done, red when done with gaps.
pub fn load_indicator(progress: &LoadProgress) -> (&'static str, Color) {
    match (progress.is_complete(), progress.pages_failed) {
        (false, _) => ("●", Color::Yellow),
        (true, 0) => ("●", Color::Green),
        (true, _) => ("●", Color::Red),
    }
}

pub fn page_summary(progress: &LoadProgress) -> String {
    let total = if progress.page_count == 0 {
        "?".to_string()
    } else {
        progress.page_count.to_string()
    };
    let mut text = format!("Pages {}/{}", progress.pages_loaded, total);
    if progress.pages_failed > 0 {
        text.push_str(&format!(" ({} failed)", progress.pages_failed));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;

    #[test]
    fn indicator_tracks_completion_and_failures() {
        let mut progress = LoadProgress::default();
        assert_eq!(load_indicator(&progress).1, Color::Yellow);

        progress.completed_at = Some(Local::now());
        assert_eq!(load_indicator(&progress).1, Color::Green);

        progress.pages_failed = 1;
        assert_eq!(load_indicator(&progress).1, Color::Red);
    }

    #[test]
    fn page_summary_text() {
        let mut progress = LoadProgress::default();
        assert_eq!(page_summary(&progress), "Pages 0/?");

        progress.page_count = 4;
        progress.pages_loaded = 2;
        assert_eq!(page_summary(&progress), "Pages 2/4");

        progress.pages_failed = 1;
        assert_eq!(page_summary(&progress), "Pages 2/4 (1 failed)");
    }

    #[test]
    fn render_does_not_panic_with_defaults() {
        let backend = ratatui::backend::TestBackend::new(80, 1);
        let mut terminal = ratatui::Terminal::new(backend).unwrap();
        let mut state = ViewState::default();
        state.progress.completed_at = Some(Local::now());
        terminal
            .draw(|frame| render(frame, frame.area(), &state))
            .unwrap();
    }
}
