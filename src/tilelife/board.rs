//! Bit-packed toroidal boards.
//!
//! A row is `cell_w / 16` words. Cell `x` lives in word `x / 16` at bit
//! `15 - x % 16`, so the most significant bit is the leftmost cell. Read as
//! big-endian bytes this is the display's native layout: byte `x / 8`, bit
//! `x % 8` counted from the MSB.

use super::geometry::{Geometry, TILE_SIZE, WORD_BITS};

#[inline(always)]
const fn word_mask(x: usize) -> u16 {
    0x8000 >> (x % WORD_BITS)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    geometry: Geometry,
    words: Vec<u16>,
}

impl Board {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            words: vec![0; geometry.row_words() * geometry.cell_h()],
        }
    }

    #[inline]
    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn clear(&mut self) {
        self.words.fill(0);
    }

    #[inline]
    fn check_bounds(&self, x: usize, y: usize) {
        let (w, h) = (self.geometry.cell_w(), self.geometry.cell_h());
        assert!(x < w && y < h, "cell ({x},{y}) outside {w}x{h} board");
    }

    pub fn set_cell(&mut self, x: usize, y: usize, alive: bool) {
        self.check_bounds(x, y);
        let idx = y * self.geometry.row_words() + x / WORD_BITS;
        if alive {
            self.words[idx] |= word_mask(x);
        } else {
            self.words[idx] &= !word_mask(x);
        }
    }

    /// Set a cell, wrapping coordinates onto the torus.
    #[inline]
    pub fn set_cell_wrapping(&mut self, x: usize, y: usize) {
        let x = x % self.geometry.cell_w();
        let y = y % self.geometry.cell_h();
        self.set_cell(x, y, true);
    }

    #[inline]
    pub fn get_cell(&self, x: usize, y: usize) -> bool {
        self.check_bounds(x, y);
        let idx = y * self.geometry.row_words() + x / WORD_BITS;
        self.words[idx] & word_mask(x) != 0
    }

    #[inline]
    pub fn row(&self, y: usize) -> &[u16] {
        let n = self.geometry.row_words();
        &self.words[y * n..(y + 1) * n]
    }

    #[inline]
    pub fn words(&self) -> &[u16] {
        &self.words
    }

    #[inline]
    pub fn words_mut(&mut self) -> &mut [u16] {
        &mut self.words
    }

    /// Byte `byte_index` of row `y`, MSB = leftmost cell.
    #[inline]
    pub fn byte(&self, y: usize, byte_index: usize) -> u8 {
        let word = self.row(y)[byte_index / 2];
        if byte_index & 1 == 0 {
            (word >> 8) as u8
        } else {
            word as u8
        }
    }

    /// The four cells of tile column `tx` in row `y`, MSB-first in the low nibble.
    #[inline]
    pub fn nibble(&self, y: usize, tx: usize) -> u8 {
        let cell_x = tx * TILE_SIZE;
        let v = self.byte(y, cell_x / 8);
        if cell_x & 4 != 0 { v & 0x0F } else { v >> 4 }
    }

    pub fn population(&self) -> u64 {
        self.words.iter().map(|w| w.count_ones() as u64).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    pub fn for_each_live<F: FnMut(usize, usize)>(&self, mut f: F) {
        let row_words = self.geometry.row_words();
        for (i, &word) in self.words.iter().enumerate() {
            let mut bits = word;
            while bits != 0 {
                let lead = bits.leading_zeros() as usize;
                let y = i / row_words;
                let x = (i % row_words) * WORD_BITS + lead;
                f(x, y);
                bits &= !(0x8000 >> lead);
            }
        }
    }
}

/// Two boards with a phase bit selecting the current one.
///
/// Swapping flips the phase; no cell data moves.
#[derive(Clone, Debug)]
pub struct BoardPair {
    boards: [Board; 2],
    phase: u8,
}

impl BoardPair {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            boards: [Board::new(geometry), Board::new(geometry)],
            phase: 0,
        }
    }

    #[inline]
    pub fn current(&self) -> &Board {
        &self.boards[self.phase as usize]
    }

    #[inline]
    pub fn current_mut(&mut self) -> &mut Board {
        &mut self.boards[self.phase as usize]
    }

    /// The board that was current before the last swap.
    #[inline]
    pub fn previous(&self) -> &Board {
        &self.boards[1 - self.phase as usize]
    }

    #[inline]
    pub fn swap(&mut self) {
        self.phase ^= 1;
    }

    /// Split into the superseded board (read) and the current board (write).
    #[inline]
    pub fn previous_and_current_mut(&mut self) -> (&Board, &mut Board) {
        let (a, b) = self.boards.split_at_mut(1);
        if self.phase == 0 {
            (&b[0], &mut a[0])
        } else {
            (&a[0], &mut b[0])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry() -> Geometry {
        Geometry::new(32, 8).unwrap()
    }

    #[test]
    fn set_cell_uses_msb_first_byte_layout() {
        let mut board = Board::new(geometry());
        board.set_cell(0, 0, true);
        board.set_cell(9, 0, true);
        board.set_cell(17, 1, true);
        assert_eq!(board.byte(0, 0), 0x80);
        assert_eq!(board.byte(0, 1), 0x40);
        assert_eq!(board.row(0)[0], 0x8040);
        assert_eq!(board.byte(1, 2), 0x40);
        assert!(board.get_cell(17, 1));
        assert!(!board.get_cell(16, 1));

        board.set_cell(9, 0, false);
        assert_eq!(board.row(0)[0], 0x8000);
    }

    #[test]
    #[should_panic(expected = "outside 32x8 board")]
    fn set_cell_rejects_column_past_row_end() {
        let mut board = Board::new(geometry());
        board.set_cell(32, 0, true);
    }

    #[test]
    #[should_panic(expected = "outside 32x8 board")]
    fn get_cell_rejects_row_past_board_end() {
        let board = Board::new(geometry());
        board.get_cell(0, 8);
    }

    #[test]
    fn nibble_selects_tile_column() {
        let mut board = Board::new(geometry());
        board.set_cell(4, 2, true);
        board.set_cell(7, 2, true);
        board.set_cell(8, 2, true);
        assert_eq!(board.nibble(2, 0), 0x0);
        assert_eq!(board.nibble(2, 1), 0x9);
        assert_eq!(board.nibble(2, 2), 0x8);
    }

    #[test]
    fn for_each_live_visits_every_set_cell() {
        let mut board = Board::new(geometry());
        let cells = [(0, 0), (15, 0), (16, 3), (31, 7)];
        for &(x, y) in &cells {
            board.set_cell(x, y, true);
        }
        let mut seen = Vec::new();
        board.for_each_live(|x, y| seen.push((x, y)));
        assert_eq!(seen, cells);
        assert_eq!(board.population(), 4);
    }

    #[test]
    fn set_cell_wrapping_folds_onto_torus() {
        let mut board = Board::new(geometry());
        board.set_cell_wrapping(33, 9);
        assert!(board.get_cell(1, 1));
    }

    #[test]
    fn swap_exchanges_roles_without_copying() {
        let mut pair = BoardPair::new(geometry());
        pair.current_mut().set_cell(3, 3, true);
        pair.swap();
        assert!(pair.previous().get_cell(3, 3));
        assert!(pair.current().is_empty());
        let (prev, cur) = pair.previous_and_current_mut();
        assert!(prev.get_cell(3, 3));
        cur.set_cell(1, 1, true);
        pair.swap();
        assert!(pair.current().get_cell(3, 3));
        assert!(pair.previous().get_cell(1, 1));
    }
}
