// Virtualized scroll window: maps a scroll offset to the visible rank range and
// binds a fixed pool of display slots to it.

use tracing::trace;

use crate::cache::LoadState;
use crate::config::WindowConfig;
use crate::image::ImageHandle;
use crate::leaderboard::Leaderboard;

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// Vertical layout of the slot list. Slot `rank` occupies
/// `[offset_of(rank), offset_of(rank) + slot_height)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowGeometry {
    pub slot_height: f32,
    pub slot_padding: f32,
    pub viewport_slot_count: usize,
}

impl WindowGeometry {
    pub fn from_config(config: &WindowConfig) -> Self {
        Self {
            slot_height: config.slot_height,
            slot_padding: config.slot_padding,
            viewport_slot_count: config.viewport_slot_count,
        }
    }

    /// First visible rank at `scroll_offset`, never below 1.
    pub fn top_rank(&self, scroll_offset: f32) -> u32 {
        let stride = self.slot_height + self.slot_padding;
        let top = ((scroll_offset + self.slot_height) / stride).floor();
        if top.is_finite() && top > 1.0 {
            top.min(u32::MAX as f32) as u32
        } else {
            1
        }
    }

    /// Top edge of the slot for `rank`.
    pub fn offset_of(&self, rank: u32) -> f32 {
        rank as f32 * self.slot_padding + rank.saturating_sub(1) as f32 * self.slot_height
    }

    /// Scrollable extent with room for one rank past `max_known_rank`.
    pub fn content_extent(&self, max_known_rank: u32) -> f32 {
        self.offset_of(max_known_rank.saturating_add(1))
    }
}

// ---------------------------------------------------------------------------
// Presentation binding
// ---------------------------------------------------------------------------

/// Everything a display slot shows for one rank.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotView {
    pub rank: u32,
    pub score: i64,
    pub player_name: String,
    /// `None` means show the placeholder.
    pub image: Option<ImageHandle>,
    pub load_state: LoadState,
    /// Top edge in content coordinates.
    pub offset: f32,
}

/// Receiver of slot bindings, implemented by the host's display layer.
pub trait SlotPresenter {
    fn bind_slot(&mut self, index: usize, view: SlotView);
    fn hide_slot(&mut self, index: usize);
    fn set_content_extent(&mut self, extent: f32);
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing changed since the last rebind.
    Skipped,
    Rebound { top_rank: u32, bound: usize },
}

#[derive(Debug)]
pub struct ScrollWindowController {
    geometry: WindowGeometry,
    last_top_rank: Option<u32>,
    last_max_rank: Option<u32>,
    /// Rank whose cache miss cut the last rebind short.
    first_missing: Option<u32>,
    slots: Vec<Option<u32>>,
}

impl ScrollWindowController {
    pub fn new(geometry: WindowGeometry) -> Self {
        Self {
            geometry,
            last_top_rank: None,
            last_max_rank: None,
            first_missing: None,
            slots: vec![None; geometry.viewport_slot_count],
        }
    }

    pub fn geometry(&self) -> &WindowGeometry {
        &self.geometry
    }

    /// Rank bound to each pool slot, by slot index.
    pub fn bound_ranks(&self) -> &[Option<u32>] {
        &self.slots
    }

    /// Called once per host frame.
    pub fn on_tick<P: SlotPresenter>(
        &mut self,
        scroll_offset: f32,
        board: &mut Leaderboard,
        presenter: &mut P,
    ) -> TickOutcome {
        let top_rank = self.geometry.top_rank(scroll_offset);
        let max_rank = board.cache().max_known_rank();

        let gap_filled = self
            .first_missing
            .is_some_and(|rank| board.cache().get(rank).is_some());
        if self.last_top_rank == Some(top_rank) && self.last_max_rank == Some(max_rank) && !gap_filled
        {
            return TickOutcome::Skipped;
        }
        self.last_top_rank = Some(top_rank);
        self.last_max_rank = Some(max_rank);
        self.first_missing = None;

        presenter.set_content_extent(self.geometry.content_extent(max_rank));

        let pool = self.slots.len();
        let last_wanted = top_rank.saturating_add(pool.saturating_sub(1) as u32);
        let bottom_rank = max_rank.min(last_wanted);

        let mut bound = 0;
        for rank in top_rank..=bottom_rank {
            if board.cache().get(rank).is_none() {
                self.first_missing = Some(rank);
                break;
            }
            board.request_avatar(rank);

            let Some(entry) = board.cache().get(rank) else {
                break;
            };
            let view = SlotView {
                rank,
                score: entry.score,
                player_name: entry.player_name.clone(),
                image: entry.image.clone(),
                load_state: entry.load_state,
                offset: self.geometry.offset_of(rank),
            };
            presenter.bind_slot(bound, view);
            self.slots[bound] = Some(rank);
            bound += 1;
        }

        for index in bound..pool {
            presenter.hide_slot(index);
            self.slots[index] = None;
        }

        trace!(top_rank, bottom_rank, bound, max_rank, "window rebound");
        TickOutcome::Rebound { top_rank, bound }
    }
}
