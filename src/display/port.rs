//! Two-port video device interface and the Graphics II command layer.
//!
//! The device is driven through a control port (register writes and address
//! setup) and a data port (bytes streamed to the current address, which
//! auto-increments). Nothing here reads the device back.

// ── Screen and VRAM layout ─────────────────────────────────────────────

pub const SCREEN_W: usize = 256;
pub const SCREEN_H: usize = 192;
pub const CHAR_COLS: usize = SCREEN_W / 8;
pub const CHAR_ROWS: usize = SCREEN_H / 8;

pub const PATTERN_TABLE_ADDR: u16 = 0x0000;
pub const NAME_TABLE_ADDR: u16 = 0x1800;
pub const COLOR_TABLE_ADDR: u16 = 0x2000;
pub const SPRITE_ATTR_ADDR: u16 = 0x1B00;

/// Bytes of one Graphics II pattern (or color) table: three 0x800 thirds.
pub const BITMAP_TABLE_LEN: u16 = 0x1800;
/// Sprite Y value that terminates the attribute list.
const SPRITE_LIST_END: u8 = 0xD0;

/// Registers 0..7 for bitmap mode with the tables above, display blanked.
const GRAPHICS2_REGISTERS: [u8; 8] = [0x02, 0x80, 0x06, 0xFF, 0x03, 0x36, 0x07, 0x01];
const REG1_DISPLAY_ON: u8 = 0xE0;

/// Offset of character `(row, col)` within a Graphics II pattern or color
/// table: each screen third of 8 character rows owns 0x800 bytes.
#[inline]
pub const fn char_offset(row: usize, col: usize) -> u16 {
    let third = (row >> 3) as u16;
    let index = ((((row & 7) << 5) | col) as u16) << 3;
    third * 0x0800 + index
}

#[inline]
pub const fn pattern_addr(row: usize, col: usize) -> u16 {
    PATTERN_TABLE_ADDR + char_offset(row, col)
}

#[inline]
pub const fn color_addr(row: usize, col: usize) -> u16 {
    COLOR_TABLE_ADDR + char_offset(row, col)
}

// ── Palette ────────────────────────────────────────────────────────────

/// TMS9918A color indices used by the renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Palette {
    pub foreground: u8,
    pub background: u8,
    pub border: u8,
    /// Highlight for characters redrawn this frame.
    pub dirty: u8,
    /// Highlight for characters left untouched, painted by a clean snapshot.
    pub clean: u8,
}

impl Palette {
    /// Cyan on black, light yellow frame, light red / magenta highlights.
    pub const DEFAULT: Palette = Palette {
        foreground: 0x07,
        background: 0x01,
        border: 0x0B,
        dirty: 0x09,
        clean: 0x0D,
    };

    /// Color-table byte drawing `fg` over the palette background.
    #[inline]
    pub const fn attr(&self, fg: u8) -> u8 {
        (fg << 4) | (self.background & 0x0F)
    }

    #[inline]
    pub const fn normal_attr(&self) -> u8 {
        self.attr(self.foreground)
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::DEFAULT
    }
}

// ── Port trait ─────────────────────────────────────────────────────────

/// The two write ports of a TMS9918A-style video display processor.
pub trait VideoPort {
    fn write_control_port(&mut self, value: u8);
    fn write_data_port(&mut self, value: u8);
}

impl<P: VideoPort + ?Sized> VideoPort for &mut P {
    #[inline]
    fn write_control_port(&mut self, value: u8) {
        (**self).write_control_port(value);
    }

    #[inline]
    fn write_data_port(&mut self, value: u8) {
        (**self).write_data_port(value);
    }
}

// ── Driver ─────────────────────────────────────────────────────────────

/// Command layer over a [`VideoPort`].
#[derive(Debug)]
pub struct Vdp<P> {
    port: P,
}

impl<P: VideoPort> Vdp<P> {
    pub fn new(port: P) -> Self {
        Self { port }
    }

    #[inline]
    pub fn port(&self) -> &P {
        &self.port
    }

    #[inline]
    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }

    pub fn into_port(self) -> P {
        self.port
    }

    pub fn set_register(&mut self, reg: u8, value: u8) {
        self.port.write_control_port(value);
        self.port.write_control_port(reg | 0x80);
    }

    pub fn set_write_addr(&mut self, addr: u16) {
        self.port.write_control_port((addr & 0xFF) as u8);
        self.port.write_control_port((((addr >> 8) & 0x3F) as u8) | 0x40);
    }

    #[inline]
    pub fn write_data(&mut self, value: u8) {
        self.port.write_data_port(value);
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.port.write_data_port(b);
        }
    }

    /// Stream `len` copies of `value` from `addr`.
    pub fn fill(&mut self, addr: u16, value: u8, len: u16) {
        self.set_write_addr(addr);
        for _ in 0..len {
            self.port.write_data_port(value);
        }
    }

    pub fn init_graphics2(&mut self) {
        for (reg, &value) in GRAPHICS2_REGISTERS.iter().enumerate() {
            self.set_register(reg as u8, value);
        }
    }

    pub fn display_on(&mut self) {
        self.set_register(1, REG1_DISPLAY_ON);
    }

    pub fn clear_pattern_table(&mut self) {
        self.fill(PATTERN_TABLE_ADDR, 0, BITMAP_TABLE_LEN);
    }

    /// Give every screen position its own pattern: 0..=255 in each third.
    pub fn init_name_table(&mut self) {
        self.set_write_addr(NAME_TABLE_ADDR);
        for i in 0..CHAR_COLS * CHAR_ROWS {
            self.port.write_data_port((i & 0xFF) as u8);
        }
    }

    pub fn init_color_table(&mut self, attr: u8) {
        self.fill(COLOR_TABLE_ADDR, attr, BITMAP_TABLE_LEN);
    }

    /// Color all 8 pixel rows of character `(row, col)`.
    pub fn set_tile_color(&mut self, row: usize, col: usize, attr: u8) {
        self.fill(color_addr(row, col), attr, 8);
    }

    pub fn disable_sprites(&mut self) {
        self.set_write_addr(SPRITE_ATTR_ADDR);
        self.port.write_data_port(SPRITE_LIST_END);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        control: Vec<u8>,
        data: Vec<u8>,
    }

    impl VideoPort for Recorder {
        fn write_control_port(&mut self, value: u8) {
            self.control.push(value);
        }

        fn write_data_port(&mut self, value: u8) {
            self.data.push(value);
        }
    }

    #[test]
    fn register_write_sends_value_then_register() {
        let mut vdp = Vdp::new(Recorder::default());
        vdp.set_register(7, 0x01);
        assert_eq!(vdp.port().control, [0x01, 0x87]);
    }

    #[test]
    fn address_write_sets_write_bit() {
        let mut vdp = Vdp::new(Recorder::default());
        vdp.set_write_addr(0x2345);
        vdp.set_write_addr(0x3FFF);
        assert_eq!(vdp.port().control, [0x45, 0x63, 0xFF, 0x7F]);
    }

    #[test]
    fn graphics2_register_sequence() {
        let mut vdp = Vdp::new(Recorder::default());
        vdp.init_graphics2();
        let pairs: Vec<(u8, u8)> = vdp
            .port()
            .control
            .chunks_exact(2)
            .map(|p| (p[1], p[0]))
            .collect();
        assert_eq!(
            pairs,
            [
                (0x80, 0x02),
                (0x81, 0x80),
                (0x82, 0x06),
                (0x83, 0xFF),
                (0x84, 0x03),
                (0x85, 0x36),
                (0x86, 0x07),
                (0x87, 0x01),
            ]
        );
    }

    #[test]
    fn char_offsets_split_into_thirds() {
        assert_eq!(char_offset(0, 0), 0);
        assert_eq!(char_offset(0, 31), 31 * 8);
        assert_eq!(char_offset(7, 0), 7 * 32 * 8);
        assert_eq!(char_offset(8, 0), 0x0800);
        assert_eq!(char_offset(23, 31), 0x1800 - 8);
        assert_eq!(color_addr(8, 1), 0x2808);
    }

    #[test]
    fn name_table_counts_through_each_third() {
        let mut vdp = Vdp::new(Recorder::default());
        vdp.init_name_table();
        let data = &vdp.port().data;
        assert_eq!(data.len(), 768);
        assert_eq!(data[255], 255);
        assert_eq!(data[256], 0);
        assert_eq!(data[767], 255);
    }

    #[test]
    fn palette_attr_packs_nibbles() {
        let palette = Palette::DEFAULT;
        assert_eq!(palette.normal_attr(), 0x71);
        assert_eq!(palette.attr(palette.border), 0xB1);
    }
}
