//! Grid dimensions and the derived word/tile counts.

use crate::error::ConfigError;

/// Edge length of a tile in cells.
pub const TILE_SIZE: usize = 4;
/// Cells packed into one board word.
pub const WORD_BITS: usize = 16;
/// Tiles covered by one board word along a row.
pub const TILES_PER_WORD: usize = WORD_BITS / TILE_SIZE;

/// Cell grid of the TI-99/4A build: a 256x192 screen at 2x scale.
pub const DEFAULT_CELL_W: usize = 128;
pub const DEFAULT_CELL_H: usize = 96;

const _: () = assert!(
    DEFAULT_CELL_W % WORD_BITS == 0,
    "default width must be a multiple of 16 cells for word-wide updates"
);
const _: () = assert!(
    DEFAULT_CELL_H % TILE_SIZE == 0,
    "default height must be a multiple of the tile height"
);

/// Validated board dimensions.
///
/// Width is a multiple of 16 so every row is a whole number of words, height
/// a multiple of 4 so rows split evenly into tile bands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Geometry {
    cell_w: usize,
    cell_h: usize,
}

impl Geometry {
    pub const DEFAULT: Geometry = Geometry {
        cell_w: DEFAULT_CELL_W,
        cell_h: DEFAULT_CELL_H,
    };

    pub fn new(cell_w: usize, cell_h: usize) -> Result<Self, ConfigError> {
        if cell_w == 0 || cell_w % WORD_BITS != 0 || cell_w > u16::MAX as usize {
            return Err(ConfigError::InvalidWidth(cell_w));
        }
        if cell_h == 0 || cell_h % TILE_SIZE != 0 || cell_h > u16::MAX as usize {
            return Err(ConfigError::InvalidHeight(cell_h));
        }
        Ok(Self { cell_w, cell_h })
    }

    #[inline]
    pub const fn cell_w(&self) -> usize {
        self.cell_w
    }

    #[inline]
    pub const fn cell_h(&self) -> usize {
        self.cell_h
    }

    #[inline]
    pub const fn row_words(&self) -> usize {
        self.cell_w / WORD_BITS
    }

    #[inline]
    pub const fn row_bytes(&self) -> usize {
        self.cell_w / 8
    }

    #[inline]
    pub const fn tiles_w(&self) -> usize {
        self.cell_w / TILE_SIZE
    }

    #[inline]
    pub const fn tiles_h(&self) -> usize {
        self.cell_h / TILE_SIZE
    }

    #[inline]
    pub const fn tile_count(&self) -> usize {
        self.tiles_w() * self.tiles_h()
    }

    #[inline]
    pub const fn cell_count(&self) -> usize {
        self.cell_w * self.cell_h
    }
}

impl Default for Geometry {
    fn default() -> Self {
        Self::DEFAULT
    }
}
