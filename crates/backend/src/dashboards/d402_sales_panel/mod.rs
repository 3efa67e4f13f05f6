//! D402 sales panel: filter state, staged table edits, the two cross-filter
//! pairs and the cached queries behind them.

pub mod chart_selection;
pub mod error;
pub mod filter_state;
pub mod leaderboard_selection;
pub mod map_view;
pub mod repository;
pub mod service;
pub mod session;
pub mod staged_edits;

#[cfg(test)]
pub(crate) mod test_support;
