use rayon::prelude::*;
use tracing::{Level, event};

use super::activity::{build_active_from_board, build_active_from_live};
use super::board::{Board, BoardPair};
use super::geometry::{DEFAULT_CELL_H, DEFAULT_CELL_W, Geometry, TILE_SIZE};
use super::kernel::{PruneGranularity, step_band};
use super::rng::Lfsr16;
use super::scan::scan_band;
use super::seed::{SeedConfig, seed_board};
use super::tile::TileMaps;
use crate::error::ConfigError;

/// Grids with fewer tile bands than this always step on the calling thread.
const PARALLEL_MIN_BANDS: usize = 8;

#[inline]
fn physical_core_count() -> usize {
    num_cpus::get_physical().max(1)
}

fn resolve_thread_count(config: &TileLifeConfig) -> usize {
    match config.thread_count {
        None => 1,
        Some(0) => physical_core_count(),
        Some(n) => n,
    }
}

/// Configuration for a TileLife engine instance.
///
/// `TileLifeConfig::default()` is the TI-99/4A build: a 128x96 grid pruned
/// per tile row on a single thread.
#[derive(Clone, Debug)]
pub struct TileLifeConfig {
    /// Grid width in cells. Must be a non-zero multiple of 16.
    pub width: usize,
    /// Grid height in cells. Must be a non-zero multiple of 4.
    pub height: usize,
    pub granularity: PruneGranularity,
    /// Worker threads for the band computation.
    /// `None` or 1 runs on the calling thread; `Some(0)` uses one worker per
    /// physical core.
    pub thread_count: Option<usize>,
}

impl Default for TileLifeConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_CELL_W,
            height: DEFAULT_CELL_H,
            granularity: PruneGranularity::TileRow,
            thread_count: None,
        }
    }
}

impl TileLifeConfig {
    pub fn size(mut self, width: usize, height: usize) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn granularity(mut self, granularity: PruneGranularity) -> Self {
        self.granularity = granularity;
        self
    }

    /// Set the worker count. 0 selects one per physical core.
    pub fn thread_count(mut self, n: usize) -> Self {
        self.thread_count = Some(n);
        self
    }
}

/// Counters from the most recent step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepStats {
    /// Tile bands the kernel computed.
    pub active_bands: usize,
    /// Tile bands skipped as inactive.
    pub skipped_bands: usize,
}

/// Toroidal Life simulation with tile-level activity and dirty tracking.
pub struct TileLife {
    geometry: Geometry,
    boards: BoardPair,
    tiles: TileMaps,
    granularity: PruneGranularity,
    pool: Option<rayon::ThreadPool>,
    generation: u64,
    last_step: StepStats,
}

impl Default for TileLife {
    fn default() -> Self {
        Self::new()
    }
}

impl TileLife {
    pub fn new() -> Self {
        Self::build(Geometry::DEFAULT, PruneGranularity::TileRow, None)
    }

    /// Create an engine, validating the grid before anything is allocated.
    pub fn with_config(config: TileLifeConfig) -> Result<Self, ConfigError> {
        let geometry = Geometry::new(config.width, config.height)?;
        let threads = resolve_thread_count(&config);
        let pool = if threads > 1 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .map_err(|e| ConfigError::ThreadPool(e.to_string()))?;
            Some(pool)
        } else {
            None
        };
        event!(
            Level::DEBUG,
            "TileLife {}x{} cells, {}x{} tiles, {:?} pruning, {} thread(s)",
            geometry.cell_w(),
            geometry.cell_h(),
            geometry.tiles_w(),
            geometry.tiles_h(),
            config.granularity,
            threads
        );
        Ok(Self::build(geometry, config.granularity, pool))
    }

    fn build(
        geometry: Geometry,
        granularity: PruneGranularity,
        pool: Option<rayon::ThreadPool>,
    ) -> Self {
        Self {
            geometry,
            boards: BoardPair::new(geometry),
            tiles: TileMaps::new(geometry),
            granularity,
            pool,
            generation: 0,
            last_step: StepStats::default(),
        }
    }

    #[inline]
    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    #[inline]
    pub fn granularity(&self) -> PruneGranularity {
        self.granularity
    }

    /// The authoritative board: the one to render and to step from.
    #[inline]
    pub fn board(&self) -> &Board {
        self.boards.current()
    }

    /// The board superseded by the last step.
    #[inline]
    pub fn previous_board(&self) -> &Board {
        self.boards.previous()
    }

    #[inline]
    pub fn tiles(&self) -> &TileMaps {
        &self.tiles
    }

    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[inline]
    pub fn last_step(&self) -> StepStats {
        self.last_step
    }

    pub fn get_cell(&self, x: usize, y: usize) -> bool {
        self.boards.current().get_cell(x, y)
    }

    /// Edit one cell of the current board, keeping the tile maps sound.
    ///
    /// The edited tile stays dirty through the next step, so a render after
    /// that step still draws it, unless [`mark_rendered`](Self::mark_rendered)
    /// is called first.
    pub fn set_cell(&mut self, x: usize, y: usize, alive: bool) {
        let board = self.boards.current_mut();
        if board.get_cell(x, y) == alive {
            return;
        }
        board.set_cell(x, y, alive);
        let (tx, ty) = (x / TILE_SIZE, y / TILE_SIZE);
        self.tiles.mark_edited(tx, ty);
        if alive {
            self.tiles.live.set(tx, ty);
        }
        // Births and deaths both change neighbor counts around the tile.
        let (w, h) = (self.geometry.tiles_w(), self.geometry.tiles_h());
        for ny in [ty + h - 1, ty, ty + 1] {
            for nx in [tx + w - 1, tx, tx + 1] {
                self.tiles.active.set(nx % w, ny % h);
            }
        }
    }

    /// Replace the current board with `cells`, rebuilding every tile map.
    /// Every tile stays dirty through the next step unless
    /// [`mark_rendered`](Self::mark_rendered) is called first.
    pub fn load_cells<I>(&mut self, cells: I)
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        let board = self.boards.current_mut();
        board.clear();
        for (x, y) in cells {
            board.set_cell(x, y, true);
        }
        self.refresh_from_board();
    }

    /// Reseed the current board from `rng` and schedule a full redraw.
    pub fn seed(&mut self, rng: &mut Lfsr16, config: &SeedConfig) {
        seed_board(self.boards.current_mut(), rng, config);
        self.refresh_from_board();
        event!(
            Level::DEBUG,
            "seeded density={} population={}",
            config.density,
            self.population()
        );
    }

    fn refresh_from_board(&mut self) {
        let TileMaps { active, live, .. } = &mut self.tiles;
        build_active_from_board(self.boards.current(), live, active);
        self.tiles.mark_all_dirty();
    }

    pub fn mark_all_dirty(&mut self) {
        self.tiles.mark_all_dirty();
    }

    /// Drop the edits a render has already drawn from the next step's
    /// dirty map.
    pub fn mark_rendered(&mut self) {
        self.tiles.pending.clear();
    }

    /// Advance one generation.
    ///
    /// Swaps the boards, computes the active bands of the new current board
    /// from the superseded one, summarises live/dirty tiles, folds in tiles
    /// edited since the last step and rebuilds the active map for the
    /// following step.
    pub fn step(&mut self) {
        let Self {
            geometry,
            boards,
            tiles,
            granularity,
            pool,
            ..
        } = self;
        let parallel = pool
            .as_ref()
            .filter(|_| geometry.tiles_h() >= PARALLEL_MIN_BANDS);

        boards.swap();
        let (src, dst) = boards.previous_and_current_mut();
        dst.clear();
        tiles.live.clear();
        tiles.dirty.clear();

        let active_bands = match parallel {
            Some(pool) => pool.install(|| {
                let active = compute_bands_parallel(src, dst, tiles, *granularity);
                scan_bands_parallel(src, dst, tiles);
                active
            }),
            None => {
                let active = compute_bands(src, dst, tiles, *granularity);
                scan_bands(src, dst, tiles);
                active
            }
        };

        let TileMaps {
            active,
            live,
            dirty,
            pending,
        } = tiles;
        dirty.union_with(pending);
        pending.clear();
        build_active_from_live(live, active);

        self.generation += 1;
        self.last_step = StepStats {
            active_bands,
            skipped_bands: self.geometry.tiles_h() - active_bands,
        };
        event!(
            Level::TRACE,
            "generation {} active_bands={} skipped_bands={}",
            self.generation,
            self.last_step.active_bands,
            self.last_step.skipped_bands
        );
    }

    pub fn step_n(&mut self, n: u64) {
        for _ in 0..n {
            self.step();
        }
    }

    pub fn population(&self) -> u64 {
        self.boards.current().population()
    }

    pub fn is_empty(&self) -> bool {
        self.boards.current().is_empty()
    }

    pub fn for_each_live<F: FnMut(usize, usize)>(&self, f: F) {
        self.boards.current().for_each_live(f);
    }
}

fn compute_bands(
    src: &Board,
    dst: &mut Board,
    tiles: &TileMaps,
    granularity: PruneGranularity,
) -> usize {
    let band_words = src.geometry().row_words() * TILE_SIZE;
    let mut active_bands = 0;
    for (ty, band) in dst.words_mut().chunks_exact_mut(band_words).enumerate() {
        if !tiles.active.row_any(ty) {
            continue;
        }
        step_band(src, band, ty, tiles.active.row(ty), granularity);
        active_bands += 1;
    }
    active_bands
}

fn compute_bands_parallel(
    src: &Board,
    dst: &mut Board,
    tiles: &TileMaps,
    granularity: PruneGranularity,
) -> usize {
    let band_words = src.geometry().row_words() * TILE_SIZE;
    dst.words_mut()
        .par_chunks_exact_mut(band_words)
        .enumerate()
        .map(|(ty, band)| -> usize {
            if !tiles.active.row_any(ty) {
                return 0;
            }
            step_band(src, band, ty, tiles.active.row(ty), granularity);
            1
        })
        .sum()
}

fn scan_bands(src: &Board, dst: &Board, tiles: &mut TileMaps) {
    let w = tiles.live.tiles_w();
    let TileMaps { live, dirty, .. } = tiles;
    let rows = live
        .flags_mut()
        .chunks_exact_mut(w)
        .zip(dirty.flags_mut().chunks_exact_mut(w));
    for (ty, (live_row, dirty_row)) in rows.enumerate() {
        scan_band(src, dst, ty, live_row, dirty_row);
    }
}

fn scan_bands_parallel(src: &Board, dst: &Board, tiles: &mut TileMaps) {
    let w = tiles.live.tiles_w();
    let TileMaps { live, dirty, .. } = tiles;
    live.flags_mut()
        .par_chunks_exact_mut(w)
        .zip(dirty.flags_mut().par_chunks_exact_mut(w))
        .enumerate()
        .for_each(|(ty, (live_row, dirty_row))| {
            scan_band(src, dst, ty, live_row, dirty_row);
        });
}
