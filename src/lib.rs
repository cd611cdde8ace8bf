//! Toroidal Conway's Game of Life (B3/S23) on a bit-packed board, with
//! active-tile pruning and dirty-tile rendering to a TMS9918A-style VDP.

pub mod app;
pub mod display;
pub mod error;
pub mod tilelife;

pub use app::{Simulation, SimulationConfig};
pub use error::ConfigError;
pub use tilelife::{PruneGranularity, TileLife, TileLifeConfig};
