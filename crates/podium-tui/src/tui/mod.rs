// TUI host: per-frame window ticks, keyboard scrolling, and widget rendering.
//
// The TUI owns the load `Session` and a `ViewState`. Session events are merged
// into the leaderboard as they arrive; once per frame the window controller
// rebinds the slot board and the dashboard is redrawn.

pub mod input;
pub mod layout;
pub mod widgets;

use crossterm::event::{Event, EventStream};
use futures_util::StreamExt;
use ratatui::Frame;
use tracing::info;

use podium_core::config::Config;
use podium_core::leaderboard::{Leaderboard, LoadProgress};
use podium_core::session::Session;
use podium_core::window::{ScrollWindowController, TickOutcome, WindowGeometry};

use crate::slots::SlotBoard;
use input::UserCommand;
use layout::build_layout;

// ---------------------------------------------------------------------------
// ViewState
// ---------------------------------------------------------------------------

/// TUI-local state read by `render_frame`.
pub struct ViewState {
    pub geometry: WindowGeometry,
    /// Ranks at or above this get podium styling.
    pub top_rank_threshold: u32,
    /// Display slots, bound by the window controller.
    pub slots: SlotBoard,
    /// Scroll position in content rows.
    pub scroll_offset: f32,
    /// Rows available to the board on the last draw.
    pub viewport_rows: u16,
    /// Whether the quit confirmation dialog is showing.
    pub confirm_quit: bool,
    /// Advances every frame; drives the avatar spinner.
    pub spinner_frame: usize,
    pub progress: LoadProgress,
    pub max_known_rank: u32,
    pub entries: usize,
    pub avatar_queue: usize,
}

impl Default for ViewState {
    fn default() -> Self {
        ViewState::with_geometry(
            WindowGeometry {
                slot_height: 2.0,
                slot_padding: 1.0,
                viewport_slot_count: 16,
            },
            3,
        )
    }
}

impl ViewState {
    pub fn new(config: &Config) -> Self {
        ViewState::with_geometry(
            WindowGeometry::from_config(&config.window),
            config.display.top_rank_threshold,
        )
    }

    pub fn with_geometry(geometry: WindowGeometry, top_rank_threshold: u32) -> Self {
        ViewState {
            geometry,
            top_rank_threshold,
            slots: SlotBoard::new(geometry.viewport_slot_count),
            scroll_offset: 0.0,
            viewport_rows: 0,
            confirm_quit: false,
            spinner_frame: 0,
            progress: LoadProgress::default(),
            max_known_rank: 0,
            entries: 0,
            avatar_queue: 0,
        }
    }

    /// Copy the status-bar figures from the leaderboard.
    pub fn sync_status(&mut self, board: &Leaderboard) {
        self.progress = board.progress().clone();
        self.max_known_rank = board.cache().max_known_rank();
        self.entries = board.cache().len();
        self.avatar_queue = board.avatar_queue_len();
    }
}

/// One host frame: tick the window controller, pick up finished avatars for
/// bound slots, and refresh the status figures.
pub fn advance_frame(
    view_state: &mut ViewState,
    window: &mut ScrollWindowController,
    board: &mut Leaderboard,
) -> TickOutcome {
    view_state.spinner_frame = view_state.spinner_frame.wrapping_add(1);
    let outcome = window.on_tick(view_state.scroll_offset, board, &mut view_state.slots);
    view_state.slots.sync_watches(board);
    view_state.slots.refresh(board.cache());
    view_state.sync_status(board);
    outcome
}

// ---------------------------------------------------------------------------
// Render frame
// ---------------------------------------------------------------------------

/// Render the complete dashboard frame.
pub fn render_frame(frame: &mut Frame, state: &ViewState) {
    let layout = build_layout(frame.area());

    widgets::status_bar::render(frame, layout.status_bar, state);
    widgets::board::render(frame, layout.board, state);
    widgets::help_bar::render(frame, layout.help_bar);

    if state.confirm_quit {
        widgets::quit_confirm::render(frame, frame.area());
    }
}

// ---------------------------------------------------------------------------
// Main TUI loop
// ---------------------------------------------------------------------------

/// Run the TUI event loop until the user quits.
///
/// 1. Initializes the terminal (raw mode, alternate screen).
/// 2. Installs a panic hook to restore the terminal on crash.
/// 3. Runs an async select loop: session events, keyboard input, frame ticks.
/// 4. Restores the terminal and stops the session on exit.
pub async fn run(mut session: Session, config: &Config) -> anyhow::Result<()> {
    // 1. Initialize terminal
    let mut terminal = ratatui::init();

    // 2. Restore the terminal before the original panic hook prints
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        ratatui::restore();
        original_hook(panic_info);
    }));

    // 3. View state and window controller
    let mut view_state = ViewState::new(config);
    let mut window = ScrollWindowController::new(view_state.geometry);

    // 4. Async keyboard input
    let mut event_stream = EventStream::new();

    // 5. Frame ticker
    let mut frame_tick = tokio::time::interval(config.display.frame_interval());
    frame_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    // 6. Main loop
    let result = loop {
        tokio::select! {
            event = session.recv() => {
                session.apply(event);
            }

            maybe_event = event_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key_event))) => {
                        if let Some(UserCommand::Quit) = input::handle_key(key_event, &mut view_state) {
                            info!("Quit requested");
                            break Ok(());
                        }
                    }
                    // Resize is picked up on the next draw
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        break Err(anyhow::Error::from(e).context("terminal input failed"));
                    }
                    None => break Ok(()),
                }
            }

            _ = frame_tick.tick() => {
                advance_frame(&mut view_state, &mut window, session.board_mut());
                let drawn = terminal.draw(|frame| {
                    view_state.viewport_rows = build_layout(frame.area()).board_rows();
                    render_frame(frame, &view_state);
                });
                if let Err(e) = drawn {
                    break Err(anyhow::Error::from(e).context("failed to draw frame"));
                }
            }
        }
    };

    // 7. Cleanup
    ratatui::restore();
    session.shutdown();
    result
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
