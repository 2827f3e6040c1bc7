// Library root: leaderboard data pipeline, avatar loading, and the
// virtualized window controller. UI-agnostic; a host drives it per frame.

pub mod avatar;
pub mod cache;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod image;
pub mod leaderboard;
pub mod page;
pub mod protocol;
pub mod retry;
pub mod session;
pub mod transport;
pub mod window;

#[cfg(test)]
pub(crate) mod test_support;
