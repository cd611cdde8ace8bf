//! TileLife engine internals and public API.

mod activity;
mod board;
mod engine;
pub mod geometry;
mod kernel;
mod rng;
mod scan;
mod seed;
mod tile;

pub use activity::{build_active_from_board, build_active_from_live, build_live_from_board};
pub use board::{Board, BoardPair};
pub use engine::{StepStats, TileLife, TileLifeConfig};
pub use geometry::Geometry;
pub use kernel::{PruneGranularity, life_next_word, neighbor_count, step_row};
pub use rng::{DEFAULT_LFSR_STATE, Entropy, Lfsr16};
pub use seed::{DEFAULT_DENSITY, DEFAULT_DROPOUT, SeedConfig, seed_board};
pub use tile::{TileCoord, TileMap, TileMaps};
