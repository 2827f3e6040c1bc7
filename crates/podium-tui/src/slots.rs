// Display-slot board: the terminal's side of the slot binding.
//
// Holds one view per pool slot. A bound slot keeps an `EntryWatch` on its rank
// so an avatar that finishes while the window is idle still reaches the
// screen; rebinding or hiding the slot drops the watch.

use podium_core::cache::{EntryCache, EntryWatch};
use podium_core::leaderboard::Leaderboard;
use podium_core::protocol::CacheEvent;
use podium_core::window::{SlotPresenter, SlotView};

pub struct SlotBoard {
    views: Vec<Option<SlotView>>,
    watches: Vec<Option<EntryWatch>>,
    content_extent: f32,
}

impl SlotBoard {
    pub fn new(pool_size: usize) -> Self {
        Self {
            views: vec![None; pool_size],
            watches: std::iter::repeat_with(|| None).take(pool_size).collect(),
            content_extent: 0.0,
        }
    }

    /// Bound views in slot order, which is also rank order.
    pub fn visible(&self) -> impl Iterator<Item = &SlotView> {
        self.views.iter().flatten()
    }

    pub fn bound_count(&self) -> usize {
        self.views.iter().filter(|v| v.is_some()).count()
    }

    pub fn content_extent(&self) -> f32 {
        self.content_extent
    }

    /// Subscribe to each newly bound rank and drop watches of slots that
    /// were rebound or hidden.
    pub fn sync_watches(&mut self, board: &Leaderboard) {
        for (view, watch) in self.views.iter().zip(self.watches.iter_mut()) {
            let wanted = view.as_ref().map(|v| v.rank);
            if watch.as_ref().map(EntryWatch::rank) != wanted {
                *watch = wanted.map(|rank| board.watch(rank));
            }
        }
    }

    /// Pull image changes for bound slots from the cache. Returns how many
    /// slots changed.
    pub fn refresh(&mut self, cache: &EntryCache) -> usize {
        let mut changed = 0;
        for (view, watch) in self.views.iter_mut().zip(self.watches.iter_mut()) {
            let (Some(view), Some(watch)) = (view.as_mut(), watch.as_mut()) else {
                continue;
            };
            let mut dirty = false;
            while let Some(event) = watch.try_changed() {
                dirty |= matches!(
                    event,
                    CacheEvent::ImageReady { .. } | CacheEvent::ImageFailed { .. }
                );
            }
            if !dirty {
                continue;
            }
            if let Some(entry) = cache.get(view.rank) {
                view.image = entry.image.clone();
                view.load_state = entry.load_state;
                changed += 1;
            }
        }
        changed
    }
}

impl SlotPresenter for SlotBoard {
    fn bind_slot(&mut self, index: usize, view: SlotView) {
        if let Some(slot) = self.views.get_mut(index) {
            *slot = Some(view);
        }
    }

    fn hide_slot(&mut self, index: usize) {
        if let Some(slot) = self.views.get_mut(index) {
            *slot = None;
        }
    }

    fn set_content_extent(&mut self, extent: f32) {
        self.content_extent = extent;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use podium_core::avatar::{AvatarLoadQueue, AvatarLoader};
    use podium_core::cache::LoadState;
    use podium_core::image::{ImageHandle, SvgHeaderProbe};
    use podium_core::page::RankedRecord;
    use podium_core::protocol::{AvatarEvent, FetchEvent};
    use podium_core::retry::RetryPolicy;
    use podium_core::transport::HttpTransport;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn view(rank: u32) -> SlotView {
        SlotView {
            rank,
            score: 10,
            player_name: format!("p{rank}"),
            image: None,
            load_state: LoadState::Queued,
            offset: rank as f32,
        }
    }

    #[test]
    fn bind_and_hide() {
        let mut slots = SlotBoard::new(3);
        slots.bind_slot(0, view(4));
        slots.bind_slot(1, view(5));
        slots.set_content_extent(42.0);
        assert_eq!(slots.bound_count(), 2);
        assert_eq!(slots.visible().map(|v| v.rank).collect::<Vec<_>>(), vec![4, 5]);

        slots.hide_slot(0);
        // out of range is ignored
        slots.hide_slot(9);
        assert_eq!(slots.visible().map(|v| v.rank).collect::<Vec<_>>(), vec![5]);
        assert_eq!(slots.content_extent(), 42.0);
    }

    #[tokio::test]
    async fn refresh_picks_up_images_for_bound_ranks() {
        let (tx, _rx) = mpsc::channel(4);
        let transport = HttpTransport::new(Duration::from_millis(10)).unwrap();
        let loader = AvatarLoader::new(
            Arc::new(transport),
            Arc::new(SvgHeaderProbe),
            RetryPolicy::new(1, Duration::from_secs(1)),
        );
        let mut board = Leaderboard::new(AvatarLoadQueue::new(loader, tx));
        board.apply_fetch_event(FetchEvent::PageLoaded {
            page: 1,
            page_count: 1,
            records: (1..=2)
                .map(|rank| RankedRecord {
                    rank,
                    score: 5,
                    player_name: format!("p{rank}"),
                    avatar_url: format!("http://127.0.0.1:1/{rank}.svg"),
                })
                .collect(),
        });

        let mut slots = SlotBoard::new(2);
        slots.bind_slot(0, view(2));
        slots.sync_watches(&board);

        board.request_avatar(2);
        board.apply_avatar_event(AvatarEvent::Finished {
            rank: 2,
            result: Ok(ImageHandle::new(Some((8.0, 8.0)), 64)),
        });

        assert_eq!(slots.refresh(board.cache()), 1);
        let bound = slots.visible().next().unwrap();
        assert_eq!(bound.load_state, LoadState::Loaded);
        assert_eq!(bound.image.as_ref().and_then(|i| i.size()), Some((8.0, 8.0)));
        // nothing new since
        assert_eq!(slots.refresh(board.cache()), 0);
    }
}
