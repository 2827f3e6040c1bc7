// Keyboard input handling.
//
// Scrolling mutates `ViewState` locally; only quitting leaves the TUI.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::ViewState;

/// Commands that leave the input handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserCommand {
    Quit,
}

/// Handle a keyboard event.
///
/// Returns `Some(UserCommand)` when the TUI should act on the key beyond
/// updating `ViewState`.
pub fn handle_key(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    // Only process key press events. On Windows, crossterm emits both
    // Press and Release events for each physical keypress.
    if key_event.kind != KeyEventKind::Press {
        return None;
    }

    // Ctrl+C always quits immediately regardless of mode
    if key_event.modifiers.contains(KeyModifiers::CONTROL) && key_event.code == KeyCode::Char('c')
    {
        return Some(UserCommand::Quit);
    }

    if view_state.confirm_quit {
        return handle_confirm_quit(key_event, view_state);
    }

    match key_event.code {
        KeyCode::Up | KeyCode::Char('k') => scroll_by(view_state, -1.0),
        KeyCode::Down | KeyCode::Char('j') => scroll_by(view_state, 1.0),
        KeyCode::PageUp => scroll_by(view_state, -page_rows(view_state)),
        KeyCode::PageDown => scroll_by(view_state, page_rows(view_state)),
        KeyCode::Home => view_state.scroll_offset = 0.0,
        KeyCode::End => view_state.scroll_offset = max_scroll(view_state),

        // Quit: enter confirmation mode instead of quitting immediately
        KeyCode::Char('q') => view_state.confirm_quit = true,

        _ => {}
    }
    None
}

/// In quit confirmation mode `y`/`q` confirm, `n`/Esc cancel, and every
/// other key is swallowed.
fn handle_confirm_quit(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    match key_event.code {
        KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Char('q') | KeyCode::Char('Q') => {
            Some(UserCommand::Quit)
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            view_state.confirm_quit = false;
            None
        }
        _ => None,
    }
}

fn scroll_by(view_state: &mut ViewState, rows: f32) {
    let target = view_state.scroll_offset + rows;
    view_state.scroll_offset = target.clamp(0.0, max_scroll(view_state));
}

/// Largest offset that still fills the viewport.
pub fn max_scroll(view_state: &ViewState) -> f32 {
    (view_state.slots.content_extent() - f32::from(view_state.viewport_rows)).max(0.0)
}

fn page_rows(view_state: &ViewState) -> f32 {
    f32::from(view_state.viewport_rows.max(1))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
