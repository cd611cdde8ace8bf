//! Dirty-tile renderer.
//!
//! At scale 2 every 4x4 tile fills exactly one 8x8 character; at scale 1 a
//! tile is one nibble column of half a character. Either way a tile is
//! redrawn with a single address setup followed by a short data burst.

use std::ops::Range;

use tracing::{Level, event};

use super::port::{
    CHAR_COLS, CHAR_ROWS, Palette, SCREEN_H, SCREEN_W, Vdp, VideoPort, pattern_addr,
};
use crate::error::ConfigError;
use crate::tilelife::geometry::TILE_SIZE;
use crate::tilelife::{Board, Geometry, TileMap};

/// Each bit of a nibble doubled: `0b1011` becomes `0b11_00_11_11`.
pub const EXPAND4: [u8; 16] = [
    0x00, 0x03, 0x0C, 0x0F, 0x30, 0x33, 0x3C, 0x3F, 0xC0, 0xC3, 0xCC, 0xCF, 0xF0, 0xF3, 0xFC,
    0xFF,
];

/// Frame line thickness in pixels, both across the top/bottom and down the sides.
const FRAME_LINES_TOP: Range<usize> = 6..8;
const FRAME_LINES_BOTTOM: Range<usize> = 0..2;
const FRAME_MASK_LEFT: u8 = 0x03;
const FRAME_MASK_RIGHT: u8 = 0xC0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderConfig {
    /// Pixels per cell edge: 1 or 2.
    pub scale: u8,
    pub palette: Palette,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            scale: 2,
            palette: Palette::DEFAULT,
        }
    }
}

impl RenderConfig {
    pub fn scale(mut self, scale: u8) -> Self {
        self.scale = scale;
        self
    }

    pub fn palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }
}

/// Placement of the life region on the 256x192 screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Layout {
    geometry: Geometry,
    scale: usize,
    region_w: usize,
    region_h: usize,
    x0: usize,
    y0: usize,
    border_x: bool,
    border_y: bool,
}

impl Layout {
    /// Center the region, snapped to 16 px horizontally and 8 px vertically.
    pub fn new(geometry: Geometry, scale: u8) -> Result<Self, ConfigError> {
        if !matches!(scale, 1 | 2) {
            return Err(ConfigError::InvalidScale(scale));
        }
        let scale = scale as usize;
        let region_w = geometry.cell_w() * scale;
        let region_h = geometry.cell_h() * scale;
        let too_large = ConfigError::RegionTooLarge {
            width: region_w,
            height: region_h,
            screen_w: SCREEN_W,
            screen_h: SCREEN_H,
        };
        if region_w > SCREEN_W || region_h > SCREEN_H {
            return Err(too_large);
        }

        let x0 = ((SCREEN_W - region_w) / 2) & !15;
        let y0 = ((SCREEN_H - region_h) / 2) & !7;
        let border_x = region_w < SCREEN_W;
        let border_y = region_h < SCREEN_H;

        // The frame needs a whole character of margin on each framed side.
        if border_x && (x0 < 8 || x0 + region_w + 8 > SCREEN_W) {
            return Err(too_large);
        }
        if border_y && (y0 < 8 || y0 + region_h + 8 > SCREEN_H) {
            return Err(too_large);
        }
        if border_y && region_h % 8 != 0 {
            return Err(ConfigError::UnalignedRegion(region_h));
        }

        Ok(Self {
            geometry,
            scale,
            region_w,
            region_h,
            x0,
            y0,
            border_x,
            border_y,
        })
    }

    #[inline]
    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    #[inline]
    pub fn scale(&self) -> usize {
        self.scale
    }

    /// Top-left pixel of the region.
    #[inline]
    pub fn origin(&self) -> (usize, usize) {
        (self.x0, self.y0)
    }

    #[inline]
    pub fn region_size(&self) -> (usize, usize) {
        (self.region_w, self.region_h)
    }

    #[inline]
    pub fn draws_border(&self) -> bool {
        self.border_x || self.border_y
    }

    #[inline]
    pub fn char_col_start(&self) -> usize {
        self.x0 >> 3
    }

    #[inline]
    pub fn char_row_start(&self) -> usize {
        self.y0 >> 3
    }

    #[inline]
    pub fn char_col_end(&self) -> usize {
        (self.x0 + self.region_w - 1) >> 3
    }

    #[inline]
    pub fn char_row_end(&self) -> usize {
        (self.y0 + self.region_h - 1) >> 3
    }

    /// Tiles along one edge of a character: 1 at scale 2, 2 at scale 1.
    #[inline]
    pub fn tiles_per_char(&self) -> usize {
        8 / (TILE_SIZE * self.scale)
    }

    /// Characters covered by the region, as (columns, rows).
    pub fn char_dims(&self) -> (usize, usize) {
        let k = self.tiles_per_char();
        (
            self.geometry.tiles_w().div_ceil(k),
            self.geometry.tiles_h().div_ceil(k),
        )
    }

    /// Screen character holding tile `(tx, ty)`, as (row, col).
    #[inline]
    pub fn tile_char(&self, tx: usize, ty: usize) -> (usize, usize) {
        let k = self.tiles_per_char();
        (self.char_row_start() + ty / k, self.char_col_start() + tx / k)
    }

    /// Whether any tile inside region character `(cx, cy)` is set in `map`.
    pub fn char_any(&self, map: &TileMap, cx: usize, cy: usize) -> bool {
        let k = self.tiles_per_char();
        let ty_end = ((cy + 1) * k).min(map.tiles_h());
        let tx_end = ((cx + 1) * k).min(map.tiles_w());
        (cy * k..ty_end).any(|ty| (cx * k..tx_end).any(|tx| map.get(tx, ty)))
    }

    /// Pixel of the screen that shows cell `(x, y)`'s top-left corner.
    #[inline]
    pub fn cell_pixel(&self, x: usize, y: usize) -> (usize, usize) {
        (self.x0 + x * self.scale, self.y0 + y * self.scale)
    }
}

/// Frame piece for one character: `fill` ORed into `lines`, `side` on every line.
fn frame_pattern(lines: Range<usize>, fill: u8, side: u8) -> [u8; 8] {
    let mut pattern = [side; 8];
    for line in lines {
        pattern[line] |= fill;
    }
    pattern
}

/// Streams board tiles to the pattern table.
#[derive(Clone, Debug)]
pub struct Renderer {
    layout: Layout,
    palette: Palette,
}

impl Renderer {
    pub fn new(geometry: Geometry, config: &RenderConfig) -> Result<Self, ConfigError> {
        let layout = Layout::new(geometry, config.scale)?;
        Ok(Self {
            layout,
            palette: config.palette,
        })
    }

    #[inline]
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    #[inline]
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Redraw every tile flagged in `dirty`. Returns the number of tiles sent.
    pub fn write_dirty_tiles<P: VideoPort>(
        &self,
        vdp: &mut Vdp<P>,
        board: &Board,
        dirty: &TileMap,
    ) -> usize {
        let mut written = 0;
        for ty in 0..dirty.tiles_h() {
            if !dirty.row_any(ty) {
                continue;
            }
            for (tx, &flag) in dirty.row(ty).iter().enumerate() {
                if flag != 0 {
                    self.write_tile(vdp, board, tx, ty);
                    written += 1;
                }
            }
        }
        event!(Level::TRACE, "rendered {} dirty tiles", written);
        written
    }

    /// Redraw every tile regardless of any dirty map.
    pub fn write_all<P: VideoPort>(&self, vdp: &mut Vdp<P>, board: &Board) {
        let geometry = board.geometry();
        for ty in 0..geometry.tiles_h() {
            for tx in 0..geometry.tiles_w() {
                self.write_tile(vdp, board, tx, ty);
            }
        }
    }

    pub fn write_tile<P: VideoPort>(&self, vdp: &mut Vdp<P>, board: &Board, tx: usize, ty: usize) {
        let (row, col) = self.layout.tile_char(tx, ty);
        let cell_y = ty * TILE_SIZE;
        if self.layout.scale == 2 {
            vdp.set_write_addr(pattern_addr(row, col));
            for dy in 0..TILE_SIZE {
                let expanded = EXPAND4[board.nibble(cell_y + dy, tx) as usize];
                vdp.write_data(expanded);
                vdp.write_data(expanded);
            }
        } else {
            // Both nibbles of each byte go out; the neighbor's half is unchanged.
            let line = (self.layout.y0 + cell_y) & 7;
            vdp.set_write_addr(pattern_addr(row, col) + line as u16);
            let byte_index = tx * TILE_SIZE / 8;
            for dy in 0..TILE_SIZE {
                vdp.write_data(board.byte(cell_y + dy, byte_index));
            }
        }
    }

    fn write_frame_char<P: VideoPort>(
        &self,
        vdp: &mut Vdp<P>,
        row: usize,
        col: usize,
        pattern: &[u8; 8],
    ) {
        vdp.set_write_addr(pattern_addr(row, col));
        vdp.write_bytes(pattern);
    }

    /// Draw a 2-pixel frame in the characters surrounding the region.
    pub fn write_border_tiles<P: VideoPort>(&self, vdp: &mut Vdp<P>) {
        let layout = &self.layout;
        if !layout.draws_border() {
            return;
        }
        let (row_start, row_end) = (layout.char_row_start(), layout.char_row_end());
        let (col_start, col_end) = (layout.char_col_start(), layout.char_col_end());

        if layout.border_y {
            let (top, bottom) = (row_start - 1, row_end + 1);
            let top_edge = frame_pattern(FRAME_LINES_TOP, 0xFF, 0);
            let bottom_edge = frame_pattern(FRAME_LINES_BOTTOM, 0xFF, 0);
            for col in col_start..=col_end {
                self.write_frame_char(vdp, top, col, &top_edge);
                self.write_frame_char(vdp, bottom, col, &bottom_edge);
            }
            if layout.border_x {
                let (left, right) = (col_start - 1, col_end + 1);
                let corners = [
                    (top, left, frame_pattern(FRAME_LINES_TOP, FRAME_MASK_LEFT, 0)),
                    (top, right, frame_pattern(FRAME_LINES_TOP, FRAME_MASK_RIGHT, 0)),
                    (bottom, left, frame_pattern(FRAME_LINES_BOTTOM, FRAME_MASK_LEFT, 0)),
                    (bottom, right, frame_pattern(FRAME_LINES_BOTTOM, FRAME_MASK_RIGHT, 0)),
                ];
                for (row, col, pattern) in &corners {
                    self.write_frame_char(vdp, *row, *col, pattern);
                }
            }
        }

        if layout.border_x {
            let (left, right) = (col_start - 1, col_end + 1);
            let left_side = [FRAME_MASK_LEFT; 8];
            let right_side = [FRAME_MASK_RIGHT; 8];
            for row in row_start..=row_end {
                self.write_frame_char(vdp, row, left, &left_side);
                self.write_frame_char(vdp, row, right, &right_side);
            }
        }
    }

    /// Color the frame characters with the border color.
    pub fn apply_border_colors<P: VideoPort>(&self, vdp: &mut Vdp<P>) {
        let layout = &self.layout;
        if !layout.draws_border() {
            return;
        }
        let attr = self.palette.attr(self.palette.border);
        let (left, right) = if layout.border_x {
            (layout.char_col_start() - 1, layout.char_col_end() + 1)
        } else {
            (0, CHAR_COLS - 1)
        };
        let (top, bottom) = if layout.border_y {
            (layout.char_row_start() - 1, layout.char_row_end() + 1)
        } else {
            (0, CHAR_ROWS - 1)
        };

        if layout.border_y {
            for col in left..=right {
                vdp.set_tile_color(top, col, attr);
                vdp.set_tile_color(bottom, col, attr);
            }
        }
        if layout.border_x {
            for row in top..=bottom {
                vdp.set_tile_color(row, left, attr);
                vdp.set_tile_color(row, right, attr);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::tms9918::Tms9918;

    fn setup(w: usize, h: usize, scale: u8) -> (Renderer, Vdp<Tms9918>, Board) {
        let geometry = Geometry::new(w, h).unwrap();
        let renderer = Renderer::new(geometry, &RenderConfig::default().scale(scale)).unwrap();
        let mut vdp = Vdp::new(Tms9918::new());
        vdp.init_graphics2();
        vdp.init_name_table();
        (renderer, vdp, Board::new(geometry))
    }

    #[test]
    fn expand4_doubles_each_bit() {
        for (n, &e) in EXPAND4.iter().enumerate() {
            for bit in 0..4 {
                let set = (n >> bit) & 1;
                assert_eq!((e as usize >> (2 * bit)) & 3, set * 3);
            }
        }
    }

    #[test]
    fn default_layout_matches_ti_screen() {
        let layout = Layout::new(Geometry::DEFAULT, 2).unwrap();
        assert_eq!(layout.origin(), (0, 0));
        assert_eq!(layout.region_size(), (256, 192));
        assert!(!layout.draws_border());
        assert_eq!(layout.char_dims(), (32, 24));
    }

    #[test]
    fn small_region_is_centered_and_framed() {
        let layout = Layout::new(Geometry::new(64, 48).unwrap(), 2).unwrap();
        assert_eq!(layout.origin(), (64, 48));
        assert!(layout.draws_border());
        assert_eq!(layout.char_col_start(), 8);
        assert_eq!(layout.char_col_end(), 23);
        assert_eq!(layout.char_row_end(), 17);
    }

    #[test]
    fn rejects_bad_layouts() {
        assert_eq!(
            Layout::new(Geometry::DEFAULT, 3),
            Err(ConfigError::InvalidScale(3))
        );
        assert!(matches!(
            Layout::new(Geometry::new(256, 96).unwrap(), 2),
            Err(ConfigError::RegionTooLarge { .. })
        ));
        // 240 px wide leaves no room for a left frame column.
        assert!(matches!(
            Layout::new(Geometry::new(240, 192).unwrap(), 1),
            Err(ConfigError::RegionTooLarge { .. })
        ));
        assert_eq!(
            Layout::new(Geometry::new(64, 12).unwrap(), 1),
            Err(ConfigError::UnalignedRegion(12))
        );
    }

    #[test]
    fn scale2_tile_expands_each_row_twice() {
        let (renderer, mut vdp, mut board) = setup(128, 96, 2);
        // Tile (1, 0): cells 4..8 of rows 0..4.
        board.set_cell(4, 0, true);
        board.set_cell(7, 3, true);
        renderer.write_tile(&mut vdp, &board, 1, 0);
        let chip = vdp.port();
        let base = pattern_addr(0, 1) as usize;
        assert_eq!(&chip.vram()[base..base + 8], &[0xC0, 0xC0, 0, 0, 0, 0, 0x03, 0x03]);
        assert!(chip.pixel(8, 0) && chip.pixel(9, 1));
        assert!(chip.pixel(15, 7));
        assert!(!chip.pixel(10, 0));
    }

    #[test]
    fn scale1_tile_lands_in_half_character() {
        let (renderer, mut vdp, mut board) = setup(256, 192, 1);
        // Tile (3, 1) covers cells 12..16 of rows 4..8: character (0, 1), lines 4..8.
        board.set_cell(13, 5, true);
        board.set_cell(9, 6, true);
        renderer.write_tile(&mut vdp, &board, 3, 1);
        let chip = vdp.port();
        let base = pattern_addr(0, 1) as usize + 4;
        assert_eq!(&chip.vram()[base..base + 4], &[0, 0b0000_0100, 0b0100_0000, 0]);
        assert!(chip.pixel(13, 5));
        assert!(chip.pixel(9, 6));
    }

    #[test]
    fn dirty_render_only_touches_flagged_tiles() {
        let (renderer, mut vdp, board) = setup(64, 32, 2);
        let mut dirty = TileMap::new(board.geometry());
        dirty.set(2, 3);
        dirty.set(15, 7);
        vdp.port_mut().reset_counters();
        assert_eq!(renderer.write_dirty_tiles(&mut vdp, &board, &dirty), 2);
        assert_eq!(vdp.port().data_writes(), 16);
    }

    #[test]
    fn frame_surrounds_region() {
        let (renderer, mut vdp, _) = setup(64, 48, 2);
        renderer.write_border_tiles(&mut vdp);
        renderer.apply_border_colors(&mut vdp);
        let chip = vdp.port();
        // Region spans x 64..192, y 48..144.
        assert!(chip.pixel(100, 46) && chip.pixel(100, 47));
        assert!(!chip.pixel(100, 45));
        assert!(chip.pixel(100, 144) && chip.pixel(100, 145));
        assert!(chip.pixel(62, 100) && chip.pixel(63, 100));
        assert!(chip.pixel(192, 100) && chip.pixel(193, 100));
        assert!(!chip.pixel(61, 100));
        // Corners close the frame.
        assert!(chip.pixel(63, 47) && chip.pixel(192, 144));
        assert!(!chip.pixel(60, 47));
        assert_eq!(chip.foreground(100, 46), Palette::DEFAULT.border);
        assert_eq!(chip.foreground(63, 100), Palette::DEFAULT.border);
    }
}
