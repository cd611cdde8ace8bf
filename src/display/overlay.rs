//! Dirty-region highlight for debugging the renderer.
//!
//! Works per screen character: a character counts as dirty when any tile
//! inside it is dirty. Only color-table bytes are touched, so patterns drawn
//! by the renderer are unaffected.

use super::port::{Vdp, VideoPort};
use super::renderer::Renderer;
use crate::tilelife::TileMap;

#[derive(Clone, Debug)]
pub struct DebugOverlay {
    enabled: bool,
    chars_w: usize,
    chars_h: usize,
    prev: Vec<bool>,
}

impl DebugOverlay {
    pub fn new(renderer: &Renderer) -> Self {
        let (chars_w, chars_h) = renderer.layout().char_dims();
        Self {
            enabled: false,
            chars_w,
            chars_h,
            prev: vec![false; chars_w * chars_h],
        }
    }

    #[inline]
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Flip the highlight. Turning it off restores every highlighted character.
    pub fn toggle<P: VideoPort>(&mut self, vdp: &mut Vdp<P>, renderer: &Renderer) -> bool {
        self.enabled = !self.enabled;
        if !self.enabled {
            self.clear(vdp, renderer);
        }
        self.enabled
    }

    fn screen_char(&self, renderer: &Renderer, cx: usize, cy: usize) -> (usize, usize) {
        let layout = renderer.layout();
        (layout.char_row_start() + cy, layout.char_col_start() + cx)
    }

    /// Recolor characters whose dirty state changed since the last update.
    pub fn update<P: VideoPort>(&mut self, vdp: &mut Vdp<P>, renderer: &Renderer, dirty: &TileMap) {
        let palette = renderer.palette();
        let dirty_attr = palette.attr(palette.dirty);
        let normal_attr = palette.normal_attr();
        for cy in 0..self.chars_h {
            for cx in 0..self.chars_w {
                let i = cy * self.chars_w + cx;
                let is_dirty = renderer.layout().char_any(dirty, cx, cy);
                if is_dirty != self.prev[i] {
                    let (row, col) = self.screen_char(renderer, cx, cy);
                    let attr = if is_dirty { dirty_attr } else { normal_attr };
                    vdp.set_tile_color(row, col, attr);
                }
                self.prev[i] = is_dirty;
            }
        }
    }

    /// Restore the normal color wherever a highlight is showing.
    pub fn clear<P: VideoPort>(&mut self, vdp: &mut Vdp<P>, renderer: &Renderer) {
        let normal_attr = renderer.palette().normal_attr();
        for cy in 0..self.chars_h {
            for cx in 0..self.chars_w {
                let i = cy * self.chars_w + cx;
                if self.prev[i] {
                    let (row, col) = self.screen_char(renderer, cx, cy);
                    vdp.set_tile_color(row, col, normal_attr);
                    self.prev[i] = false;
                }
            }
        }
    }

    /// Paint every character with no dirty tile in the clean color.
    pub fn clean_snapshot<P: VideoPort>(&self, vdp: &mut Vdp<P>, renderer: &Renderer, dirty: &TileMap) {
        let palette = renderer.palette();
        let clean_attr = palette.attr(palette.clean);
        for cy in 0..self.chars_h {
            for cx in 0..self.chars_w {
                if !renderer.layout().char_any(dirty, cx, cy) {
                    let (row, col) = self.screen_char(renderer, cx, cy);
                    vdp.set_tile_color(row, col, clean_attr);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::port::Palette;
    use crate::display::renderer::RenderConfig;
    use crate::display::tms9918::Tms9918;
    use crate::tilelife::Geometry;

    fn setup(scale: u8) -> (Renderer, Vdp<Tms9918>, TileMap) {
        let geometry = Geometry::new(64, 32).unwrap();
        let renderer = Renderer::new(geometry, &RenderConfig::default().scale(scale)).unwrap();
        let mut vdp = Vdp::new(Tms9918::new());
        vdp.init_graphics2();
        vdp.init_name_table();
        vdp.init_color_table(Palette::DEFAULT.normal_attr());
        (renderer, vdp, TileMap::new(geometry))
    }

    #[test]
    fn highlights_follow_dirty_transitions() {
        let (renderer, mut vdp, mut dirty) = setup(2);
        let mut overlay = DebugOverlay::new(&renderer);
        assert!(overlay.toggle(&mut vdp, &renderer));

        // Scale 2 region origin is (64, 64); tile (3, 2) is character (10, 11).
        dirty.set(3, 2);
        overlay.update(&mut vdp, &renderer, &dirty);
        assert_eq!(vdp.port().foreground(88, 80), Palette::DEFAULT.dirty);
        assert_eq!(vdp.port().foreground(96, 80), Palette::DEFAULT.foreground);

        dirty.clear();
        overlay.update(&mut vdp, &renderer, &dirty);
        assert_eq!(vdp.port().foreground(88, 80), Palette::DEFAULT.foreground);
    }

    #[test]
    fn disabling_clears_highlights() {
        let (renderer, mut vdp, mut dirty) = setup(1);
        let mut overlay = DebugOverlay::new(&renderer);
        overlay.toggle(&mut vdp, &renderer);
        // Scale 1: tiles (4..6, 0..2) share one character.
        dirty.set(5, 1);
        overlay.update(&mut vdp, &renderer, &dirty);
        let (x0, y0) = renderer.layout().origin();
        assert_eq!(vdp.port().foreground(x0 + 16, y0), Palette::DEFAULT.dirty);

        assert!(!overlay.toggle(&mut vdp, &renderer));
        assert_eq!(vdp.port().foreground(x0 + 16, y0), Palette::DEFAULT.foreground);
    }

    #[test]
    fn clean_snapshot_skips_dirty_characters() {
        let (renderer, mut vdp, mut dirty) = setup(2);
        let overlay = DebugOverlay::new(&renderer);
        dirty.set(0, 0);
        overlay.clean_snapshot(&mut vdp, &renderer, &dirty);
        let (x0, y0) = renderer.layout().origin();
        assert_eq!(vdp.port().foreground(x0, y0), Palette::DEFAULT.foreground);
        assert_eq!(vdp.port().foreground(x0 + 8, y0), Palette::DEFAULT.clean);
    }
}
