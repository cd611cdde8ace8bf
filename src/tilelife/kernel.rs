//! Bit-parallel Life kernel over 16-cell words.
//!
//! Each board word holds 16 independent lanes. The eight neighbor planes of a
//! word are built by shifting the word and pulling the edge bit in from the
//! adjacent word (never zero-filling), then summed with a carry-save adder
//! network into a 4-bit per-lane count.

use super::board::Board;
use super::geometry::{TILE_SIZE, TILES_PER_WORD};

/// How finely the step engine prunes inactive regions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PruneGranularity {
    /// Skip whole 4-row bands with no active tile; compute every word of an
    /// active band with a sliding window.
    #[default]
    TileRow,
    /// Additionally skip words of an active band whose four tiles are all
    /// inactive. Fewer words computed, but every word reloads its window.
    Word,
}

#[inline(always)]
fn full_add(a: u16, b: u16, c: u16) -> (u16, u16) {
    let sum = a ^ b ^ c;
    let carry = (a & b) | (b & c) | (a & c);
    (sum, carry)
}

#[inline(always)]
fn half_add(a: u16, b: u16) -> (u16, u16) {
    (a ^ b, a & b)
}

/// Plane of left neighbors: lane `x` receives cell `x - 1`.
#[inline(always)]
fn west_plane(center: u16, left: u16) -> u16 {
    (center >> 1) | (left << 15)
}

/// Plane of right neighbors: lane `x` receives cell `x + 1`.
#[inline(always)]
fn east_plane(center: u16, right: u16) -> u16 {
    (center << 1) | (right >> 15)
}

/// Per-lane live-neighbor count as four bit planes (bit 0 first).
#[inline(always)]
pub fn neighbor_count(
    up: [u16; 3],
    mid: [u16; 3],
    down: [u16; 3],
) -> [u16; 4] {
    let u_left = west_plane(up[1], up[0]);
    let u_right = east_plane(up[1], up[2]);
    let m_left = west_plane(mid[1], mid[0]);
    let m_right = east_plane(mid[1], mid[2]);
    let d_left = west_plane(down[1], down[0]);
    let d_right = east_plane(down[1], down[2]);

    let (sum1, carry1) = full_add(u_left, up[1], u_right);
    let (sum2, carry2) = full_add(m_left, m_right, d_left);
    let (sum3, carry3) = half_add(down[1], d_right);

    let (bit0, carry4) = full_add(sum1, sum2, sum3);
    let (t_sum, t_carry) = full_add(carry1, carry2, carry3);
    let (bit1, c1) = half_add(t_sum, carry4);
    let (bit2, bit3) = half_add(t_carry, c1);

    [bit0, bit1, bit2, bit3]
}

/// Next state of 16 cells given the 3x3 words around them.
///
/// `up`, `mid` and `down` are the left, center and right words of the rows
/// above, at and below the computed word.
#[inline(always)]
pub fn life_next_word(up: [u16; 3], mid: [u16; 3], down: [u16; 3]) -> u16 {
    let [bit0, bit1, bit2, bit3] = neighbor_count(up, mid, down);
    // count == 3, or count == 2 with the center alive.
    bit1 & !bit2 & !bit3 & (bit0 | mid[1])
}

/// Compute one full row with a sliding window, wrapping at both ends.
#[inline]
pub fn step_row(prev: &[u16], row: &[u16], next: &[u16], out: &mut [u16]) {
    let n = row.len();
    debug_assert!(n > 0 && prev.len() == n && next.len() == n && out.len() == n);
    let last = n - 1;
    let first_right = if n > 1 { 1 } else { 0 };

    let mut up = [prev[last], prev[0], prev[first_right]];
    let mut mid = [row[last], row[0], row[first_right]];
    let mut down = [next[last], next[0], next[first_right]];
    out[0] = life_next_word(up, mid, down);

    for wx in 1..n {
        let right = if wx == last { 0 } else { wx + 1 };
        up = [up[1], up[2], prev[right]];
        mid = [mid[1], mid[2], row[right]];
        down = [down[1], down[2], next[right]];
        out[wx] = life_next_word(up, mid, down);
    }
}

/// Whether any of the four tiles under word `wx` is active.
#[inline(always)]
fn word_active(active_row: &[u8], wx: usize) -> bool {
    let base = wx * TILES_PER_WORD;
    let tiles = [
        active_row[base],
        active_row[base + 1],
        active_row[base + 2],
        active_row[base + 3],
    ];
    u32::from_ne_bytes(tiles) != 0
}

/// Compute only the words of a row whose tiles are active in `active_row`;
/// others are left untouched.
#[inline]
fn step_row_sparse(prev: &[u16], row: &[u16], next: &[u16], out: &mut [u16], active_row: &[u8]) {
    let n = row.len();
    debug_assert_eq!(active_row.len(), n * TILES_PER_WORD);
    let last = n - 1;
    for wx in 0..n {
        if !word_active(active_row, wx) {
            continue;
        }
        let left = if wx == 0 { last } else { wx - 1 };
        let right = if wx == last { 0 } else { wx + 1 };
        out[wx] = life_next_word(
            [prev[left], prev[wx], prev[right]],
            [row[left], row[wx], row[right]],
            [next[left], next[wx], next[right]],
        );
    }
}

/// Compute the four rows of tile band `ty` from `src` into `band`.
///
/// `band` is the band's slice of the destination board (4 rows of words);
/// `active_row` is the band's row of the active map.
pub fn step_band(
    src: &Board,
    band: &mut [u16],
    ty: usize,
    active_row: &[u8],
    granularity: PruneGranularity,
) {
    let geometry = src.geometry();
    let cell_h = geometry.cell_h();
    let row_words = geometry.row_words();
    debug_assert_eq!(band.len(), row_words * TILE_SIZE);

    let y_base = ty * TILE_SIZE;
    for (dy, out) in band.chunks_exact_mut(row_words).enumerate() {
        let y = y_base + dy;
        let y_prev = if y == 0 { cell_h - 1 } else { y - 1 };
        let y_next = if y + 1 == cell_h { 0 } else { y + 1 };
        let (prev, row, next) = (src.row(y_prev), src.row(y), src.row(y_next));
        match granularity {
            PruneGranularity::TileRow => step_row(prev, row, next, out),
            PruneGranularity::Word => step_row_sparse(prev, row, next, out, active_row),
        }
    }
}
