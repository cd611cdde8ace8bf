//! Live/dirty tile summary of a freshly computed generation.
//!
//! Runs as a separate pass after the kernel: for each band and word the four
//! rows are ORed together (raw next value for `live`, next XOR source for
//! `dirty`), then each 4-bit lane group of the accumulator maps to one tile.

use super::board::Board;
use super::geometry::{TILE_SIZE, TILES_PER_WORD};

const TILE_NIBBLES: [u16; TILES_PER_WORD] = [0xF000, 0x0F00, 0x00F0, 0x000F];

/// Fill the `live` and `dirty` flag rows of band `ty`.
///
/// Both rows must be cleared beforehand; flags are only ever set.
pub fn scan_band(src: &Board, dst: &Board, ty: usize, live_row: &mut [u8], dirty_row: &mut [u8]) {
    let row_words = dst.geometry().row_words();
    let y_base = ty * TILE_SIZE;

    for wx in 0..row_words {
        let mut live_acc = 0u16;
        let mut dirty_acc = 0u16;
        for row in 0..TILE_SIZE {
            let next = dst.row(y_base + row)[wx];
            let prev = src.row(y_base + row)[wx];
            live_acc |= next;
            dirty_acc |= next ^ prev;
        }
        let tile_x = wx * TILES_PER_WORD;
        for (k, &mask) in TILE_NIBBLES.iter().enumerate() {
            if live_acc & mask != 0 {
                live_row[tile_x + k] = 1;
            }
            if dirty_acc & mask != 0 {
                dirty_row[tile_x + k] = 1;
            }
        }
    }
}
