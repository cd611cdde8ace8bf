//! Configuration errors.
//!
//! The simulation itself has no failure modes once it is running; every
//! error here is raised while validating a configuration, before any board
//! or display state exists.

use thiserror::Error;

/// Reasons a configuration is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("grid width {0} must be a non-zero multiple of 16 cells")]
    InvalidWidth(usize),

    #[error("grid height {0} must be a non-zero multiple of 4 cells")]
    InvalidHeight(usize),

    #[error("render scale {0} is not supported (expected 1 or 2)")]
    InvalidScale(u8),

    #[error("life region {width}x{height} px does not fit the {screen_w}x{screen_h} px screen")]
    RegionTooLarge {
        width: usize,
        height: usize,
        screen_w: usize,
        screen_h: usize,
    },

    #[error("life region height {0} px must be a multiple of 8 px to leave room for a border")]
    UnalignedRegion(usize),

    #[error("failed to build worker pool: {0}")]
    ThreadPool(String),
}
