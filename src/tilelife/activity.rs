//! Active-region tracking.
//!
//! A tile is active for the next step if it or any of its 8 toroidal
//! neighbors held a live cell after this step. Anything outside the active
//! set is dead now and stays dead, so the step engine may skip it.

use super::board::Board;
use super::geometry::TILE_SIZE;
use super::tile::TileMap;

#[inline(always)]
fn wrap_prev(i: usize, n: usize) -> usize {
    if i == 0 { n - 1 } else { i - 1 }
}

#[inline(always)]
fn wrap_next(i: usize, n: usize) -> usize {
    if i + 1 == n { 0 } else { i + 1 }
}

/// Rebuild `active` from `live`: every live tile activates its 3x3
/// neighborhood, wrapping at the tile-grid edges.
pub fn build_active_from_live(live: &TileMap, active: &mut TileMap) {
    active.clear();
    let w = live.tiles_w();
    let h = live.tiles_h();

    for ty in 0..h {
        if !live.row_any(ty) {
            continue;
        }
        let ty_prev = wrap_prev(ty, h);
        let ty_next = wrap_next(ty, h);
        for tx in 0..w {
            if !live.get(tx, ty) {
                continue;
            }
            let tx_prev = wrap_prev(tx, w);
            let tx_next = wrap_next(tx, w);
            for row in [ty_prev, ty, ty_next] {
                active.set(tx_prev, row);
                active.set(tx, row);
                active.set(tx_next, row);
            }
        }
    }
}

/// Mark every tile of `board` that contains a live cell.
pub fn build_live_from_board(board: &Board, live: &mut TileMap) {
    live.clear();
    for ty in 0..live.tiles_h() {
        let y_base = ty * TILE_SIZE;
        for tx in 0..live.tiles_w() {
            let mut any = 0u8;
            for row in 0..TILE_SIZE {
                any |= board.nibble(y_base + row, tx);
            }
            if any != 0 {
                live.set(tx, ty);
            }
        }
    }
}

/// Derive both `live` and `active` from a board written outside the step
/// engine (seeding, direct cell edits).
pub fn build_active_from_board(board: &Board, live: &mut TileMap, active: &mut TileMap) {
    build_live_from_board(board, live);
    build_active_from_live(live, active);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tilelife::geometry::Geometry;

    #[test]
    fn live_tile_activates_its_neighborhood() {
        let geometry = Geometry::new(32, 16).unwrap();
        let mut live = TileMap::new(geometry);
        let mut active = TileMap::new(geometry);
        live.set(3, 2);
        build_active_from_live(&live, &mut active);
        assert_eq!(active.count(), 9);
        for ty in 1..=3 {
            for tx in 2..=4 {
                assert!(active.get(tx, ty), "({tx},{ty}) should be active");
            }
        }
        assert!(!active.get(5, 2));
        assert!(!active.get(3, 0));
    }

    #[test]
    fn corner_tile_wraps_to_opposite_edges() {
        let geometry = Geometry::new(32, 16).unwrap();
        let mut live = TileMap::new(geometry);
        let mut active = TileMap::new(geometry);
        live.set(0, 0);
        build_active_from_live(&live, &mut active);
        let (w, h) = (geometry.tiles_w(), geometry.tiles_h());
        for &(tx, ty) in &[
            (w - 1, h - 1),
            (0, h - 1),
            (1, h - 1),
            (w - 1, 0),
            (0, 0),
            (1, 0),
            (w - 1, 1),
            (0, 1),
            (1, 1),
        ] {
            assert!(active.get(tx, ty), "({tx},{ty}) should be active");
        }
        assert_eq!(active.count(), 9);
    }

    #[test]
    fn rebuild_drops_stale_activity() {
        let geometry = Geometry::new(16, 16).unwrap();
        let mut live = TileMap::new(geometry);
        let mut active = TileMap::new(geometry);
        active.fill();
        build_active_from_live(&live, &mut active);
        assert_eq!(active.count(), 0);
        live.set(1, 1);
        build_active_from_live(&live, &mut active);
        assert_eq!(active.count(), 9);
    }

    #[test]
    fn board_scan_marks_tiles_with_live_cells() {
        let geometry = Geometry::new(32, 8).unwrap();
        let mut board = Board::new(geometry);
        board.set_cell(5, 1, true);
        board.set_cell(31, 7, true);
        let mut live = TileMap::new(geometry);
        let mut active = TileMap::new(geometry);
        build_active_from_board(&board, &mut live, &mut active);
        assert!(live.get(1, 0));
        assert!(live.get(7, 1));
        assert_eq!(live.count(), 2);
        assert!(active.get(0, 0));
        assert!(active.get(0, 1));
    }
}
