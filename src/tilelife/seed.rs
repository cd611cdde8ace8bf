//! Random block seeding.
//!
//! The board is covered with a lattice of 4x4 blocks (shifted by a random
//! sub-block offset); each block is filled with probability `density / 256`,
//! and each cell of a filled block is dropped with probability
//! `dropout / 256`. Optional edge blocks guarantee activity across the
//! wraparound seams.

use super::board::Board;
use super::geometry::TILE_SIZE;
use super::rng::Lfsr16;

const BLOCK: usize = TILE_SIZE;

pub const DEFAULT_DENSITY: u8 = 70;
/// 20% of 256.
pub const DEFAULT_DROPOUT: u8 = 51;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SeedConfig {
    /// Block fill threshold out of 256.
    pub density: u8,
    /// Per-cell skip threshold out of 256 inside filled blocks. 0 disables.
    pub dropout: u8,
    /// Seed one block on each edge, straddling the wraparound.
    pub edge_blocks: bool,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            density: DEFAULT_DENSITY,
            dropout: DEFAULT_DROPOUT,
            edge_blocks: true,
        }
    }
}

impl SeedConfig {
    pub fn density(mut self, density: u8) -> Self {
        self.density = density;
        self
    }

    pub fn dropout(mut self, dropout: u8) -> Self {
        self.dropout = dropout;
        self
    }

    pub fn edge_blocks(mut self, enabled: bool) -> Self {
        self.edge_blocks = enabled;
        self
    }
}

fn seed_block(board: &mut Board, x0: usize, y0: usize, dropout: u8, rng: &mut Lfsr16) {
    for y in 0..BLOCK {
        for x in 0..BLOCK {
            if dropout != 0 && rng.next_byte() < dropout {
                continue;
            }
            board.set_cell_wrapping(x0 + x, y0 + y);
        }
    }
}

/// Clear `board` and fill it with random blocks drawn from `rng`.
pub fn seed_board(board: &mut Board, rng: &mut Lfsr16, config: &SeedConfig) {
    let geometry = board.geometry();
    let (w, h) = (geometry.cell_w(), geometry.cell_h());
    let x_offset = rng.step() as usize & (BLOCK - 1);
    let y_offset = rng.step() as usize & (BLOCK - 1);

    board.clear();

    for y in (0..h).step_by(BLOCK) {
        let y_pos = (y + y_offset) % h;
        for x in (0..w).step_by(BLOCK) {
            let x_pos = (x + x_offset) % w;
            if rng.next_byte() < config.density {
                seed_block(board, x_pos, y_pos, config.dropout, rng);
            }
        }
    }

    if config.edge_blocks {
        let mask = !(BLOCK - 1);
        let edge_x = (rng.step() as usize % w) & mask;
        let edge_y = (rng.step() as usize % h) & mask;
        seed_block(board, 0, edge_y, config.dropout, rng);
        seed_block(board, w - BLOCK, edge_y, config.dropout, rng);
        seed_block(board, edge_x, 0, config.dropout, rng);
        seed_block(board, edge_x, h - BLOCK, config.dropout, rng);
    }
}
