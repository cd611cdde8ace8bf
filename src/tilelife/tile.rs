//! Per-tile flag maps.
//!
//! Three parallel maps of `tiles_h x tiles_w` byte flags:
//! - `active`: the tile must be recomputed on the next step
//! - `live`: the tile held a live cell after the last step
//! - `dirty`: the tile must be redrawn: it differs from the generation
//!   before it, or was edited outside the step engine
//! - `pending`: edits made since the last step, carried into the next
//!   step's `dirty` map

use super::geometry::Geometry;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileCoord {
    pub tx: usize,
    pub ty: usize,
}

/// A row-major grid of tile flags. Each flag is one byte holding 0 or 1.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileMap {
    tiles_w: usize,
    tiles_h: usize,
    flags: Vec<u8>,
}

impl TileMap {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            tiles_w: geometry.tiles_w(),
            tiles_h: geometry.tiles_h(),
            flags: vec![0; geometry.tile_count()],
        }
    }

    #[inline]
    pub fn tiles_w(&self) -> usize {
        self.tiles_w
    }

    #[inline]
    pub fn tiles_h(&self) -> usize {
        self.tiles_h
    }

    #[inline]
    pub fn get(&self, tx: usize, ty: usize) -> bool {
        self.flags[ty * self.tiles_w + tx] != 0
    }

    #[inline]
    pub fn set(&mut self, tx: usize, ty: usize) {
        self.flags[ty * self.tiles_w + tx] = 1;
    }

    pub fn clear(&mut self) {
        self.flags.fill(0);
    }

    pub fn fill(&mut self) {
        self.flags.fill(1);
    }

    #[inline]
    pub fn row(&self, ty: usize) -> &[u8] {
        &self.flags[ty * self.tiles_w..(ty + 1) * self.tiles_w]
    }

    #[inline]
    pub fn flags_mut(&mut self) -> &mut [u8] {
        &mut self.flags
    }

    /// Whether any flag in tile row `ty` is set.
    ///
    /// Rows are always a multiple of four tiles wide, so flags are ORed a
    /// word at a time.
    #[inline]
    pub fn row_any(&self, ty: usize) -> bool {
        self.row(ty)
            .chunks_exact(2)
            .fold(0u16, |acc, pair| acc | u16::from_ne_bytes([pair[0], pair[1]]))
            != 0
    }

    /// Set every flag that is set in `other`.
    pub fn union_with(&mut self, other: &TileMap) {
        debug_assert_eq!(self.flags.len(), other.flags.len());
        for (f, &o) in self.flags.iter_mut().zip(&other.flags) {
            *f |= o;
        }
    }

    pub fn count(&self) -> usize {
        self.flags.iter().filter(|&&f| f != 0).count()
    }

    pub fn iter_set(&self) -> impl Iterator<Item = TileCoord> + '_ {
        let w = self.tiles_w;
        self.flags
            .iter()
            .enumerate()
            .filter(|(_, f)| **f != 0)
            .map(move |(i, _)| TileCoord { tx: i % w, ty: i / w })
    }
}

/// The tile maps of one simulation.
#[derive(Clone, Debug)]
pub struct TileMaps {
    pub active: TileMap,
    pub live: TileMap,
    pub dirty: TileMap,
    pub pending: TileMap,
}

impl TileMaps {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            active: TileMap::new(geometry),
            live: TileMap::new(geometry),
            dirty: TileMap::new(geometry),
            pending: TileMap::new(geometry),
        }
    }

    /// Flag every tile for redraw, now and after the next step.
    pub fn mark_all_dirty(&mut self) {
        self.dirty.fill();
        self.pending.fill();
    }

    /// Record an edit to tile `(tx, ty)` made outside the step engine.
    pub fn mark_edited(&mut self, tx: usize, ty: usize) {
        self.dirty.set(tx, ty);
        self.pending.set(tx, ty);
    }
}
