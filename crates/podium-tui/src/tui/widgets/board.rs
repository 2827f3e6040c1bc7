// Leaderboard board: draws the bound display slots at their scroll position.
//
// Each slot is `slot_height` rows tall and starts at
// `offset_of(rank) - scroll_offset`; rows outside the board are clipped, so a
// slot can be partially visible at either edge.
//
// Slot layout (two rows):
//   ● #1    Ada                      98,120
//           ⠹ avatar
// Podium ranks use gold, silver, and bronze; lower ranks share the last color.

use ratatui::layout::{Margin, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState};
use ratatui::Frame;

use podium_core::window::SlotView;

use crate::tui::ViewState;

const PLACE_COLORS: [Color; 4] = [
    Color::Yellow,             // gold
    Color::Gray,               // silver
    Color::Rgb(205, 127, 50),  // bronze
    Color::White,
];

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title(state));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if state.slots.bound_count() == 0 {
        let message = if state.progress.is_complete() {
            "  No players to show."
        } else {
            "  Loading leaderboard..."
        };
        let paragraph = Paragraph::new(message).style(Style::default().fg(Color::DarkGray));
        frame.render_widget(paragraph, inner);
        return;
    }

    let rows = usize::from(inner.height);
    let mut lines = vec![Line::default(); rows];
    for view in state.slots.visible() {
        let top = (view.offset - state.scroll_offset).round() as i64;
        for (i, line) in slot_lines(view, state).into_iter().enumerate() {
            let y = top + i as i64;
            if (0..rows as i64).contains(&y) {
                lines[y as usize] = line;
            }
        }
    }
    frame.render_widget(Paragraph::new(lines), inner);

    let extent = state.slots.content_extent().ceil() as usize;
    if extent > rows {
        let mut scrollbar_state = ScrollbarState::new(extent - rows)
            .position(state.scroll_offset.max(0.0) as usize);
        frame.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight),
            area.inner(Margin {
                vertical: 1,
                horizontal: 0,
            }),
            &mut scrollbar_state,
        );
    }
}

fn title(state: &ViewState) -> String {
    let mut ranks = state.slots.visible().map(|v| v.rank);
    match (ranks.next(), ranks.last()) {
        (Some(first), Some(last)) => format!(" Leaderboard #{first}-#{last} "),
        (Some(only), None) => format!(" Leaderboard #{only} "),
        _ => " Leaderboard ".to_string(),
    }
}

/// Color for a finishing place; ranks past the table reuse its last entry.
pub fn place_color(rank: u32) -> Color {
    let index = (rank as usize).saturating_sub(1).min(PLACE_COLORS.len() - 1);
    PLACE_COLORS[index]
}

/// The rows of one slot, at most `slot_height` of them.
pub fn slot_lines(view: &SlotView, state: &ViewState) -> Vec<Line<'static>> {
    let color = place_color(view.rank);
    let top = view.rank <= state.top_rank_threshold;

    let badge = if top {
        Span::styled(
            format!(" ● #{:<4}", view.rank),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )
    } else {
        Span::styled(format!("   #{:<4}", view.rank), Style::default().fg(color))
    };
    let name_style = if top {
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    };
    let mut header = vec![
        badge,
        Span::styled(format!("{:<24}", view.player_name), name_style),
        Span::styled(
            format!("{:>10}", group_thousands(view.score)),
            Style::default().fg(Color::Cyan),
        ),
    ];
    let avatar = avatar_badge(view, state.spinner_frame);

    let height = state.geometry.slot_height.round().max(1.0) as usize;
    if height == 1 {
        header.push(Span::raw("  "));
        header.push(avatar);
        return vec![Line::from(header)];
    }

    let mut lines = vec![Line::from(header), Line::from(vec![Span::raw("         "), avatar])];
    lines.resize(height, Line::default());
    lines
}

/// Loaded avatars show their size; anything else spins.
pub fn avatar_badge(view: &SlotView, spinner_frame: usize) -> Span<'static> {
    match &view.image {
        Some(image) => {
            let text = match image.size() {
                Some((w, h)) => format!("[avatar {w:.0}x{h:.0}]"),
                None => "[avatar]".to_string(),
            };
            Span::styled(text, Style::default().fg(Color::Green))
        }
        None => Span::styled(
            format!("{} avatar", SPINNER[spinner_frame % SPINNER.len()]),
            Style::default().fg(Color::DarkGray),
        ),
    }
}

fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if value < 0 {
        grouped.insert(0, '-');
    }
    grouped
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
