//! In-memory TMS9918A.
//!
//! Models the write side of the chip: 16 KiB of VRAM, eight write-only
//! registers and the two-byte control latch. Graphics II pixels can be
//! decoded back out of VRAM so a frame can be inspected without hardware.

use super::port::{CHAR_COLS, SCREEN_H, SCREEN_W, VideoPort};

pub const VRAM_SIZE: usize = 0x4000;
const ADDR_MASK: u16 = 0x3FFF;

pub struct Tms9918 {
    vram: Box<[u8; VRAM_SIZE]>,
    registers: [u8; 8],
    latch: Option<u8>,
    addr: u16,
    data_writes: u64,
    control_writes: u64,
}

impl Default for Tms9918 {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Tms9918 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tms9918")
            .field("registers", &self.registers)
            .field("addr", &format_args!("{:#06x}", self.addr))
            .field("data_writes", &self.data_writes)
            .finish_non_exhaustive()
    }
}

impl Tms9918 {
    pub fn new() -> Self {
        Self {
            vram: Box::new([0; VRAM_SIZE]),
            registers: [0; 8],
            latch: None,
            addr: 0,
            data_writes: 0,
            control_writes: 0,
        }
    }

    #[inline]
    pub fn vram(&self) -> &[u8] {
        &self.vram[..]
    }

    #[inline]
    pub fn register(&self, reg: usize) -> u8 {
        self.registers[reg]
    }

    /// Current VRAM address pointer.
    #[inline]
    pub fn address(&self) -> u16 {
        self.addr
    }

    /// Bytes written through the data port since creation or the last reset.
    #[inline]
    pub fn data_writes(&self) -> u64 {
        self.data_writes
    }

    #[inline]
    pub fn control_writes(&self) -> u64 {
        self.control_writes
    }

    pub fn reset_counters(&mut self) {
        self.data_writes = 0;
        self.control_writes = 0;
    }

    /// Register 1 bit 6 (BLANK): set when the display is enabled.
    #[inline]
    pub fn display_enabled(&self) -> bool {
        self.registers[1] & 0x40 != 0
    }

    #[inline]
    pub fn bitmap_mode(&self) -> bool {
        self.registers[0] & 0x02 != 0
    }

    fn name_base(&self) -> usize {
        (self.registers[2] as usize & 0x0F) << 10
    }

    fn pattern_base(&self) -> usize {
        if self.registers[4] & 0x04 != 0 { 0x2000 } else { 0 }
    }

    fn color_base(&self) -> usize {
        if self.registers[3] & 0x80 != 0 { 0x2000 } else { 0 }
    }

    /// Pattern-table offset of pixel row `y` in the character covering `(x, y)`.
    fn bitmap_offset(&self, x: usize, y: usize) -> usize {
        let (row, col) = (y >> 3, x >> 3);
        let name = self.vram[self.name_base() + row * CHAR_COLS + col] as usize;
        (row >> 3) * 0x0800 + (name << 3) + (y & 7)
    }

    /// Whether pixel `(x, y)` shows the foreground color.
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        debug_assert!(x < SCREEN_W && y < SCREEN_H);
        let pattern = self.vram[self.pattern_base() + self.bitmap_offset(x, y)];
        pattern & (0x80 >> (x & 7)) != 0
    }

    /// Color-table byte governing pixel `(x, y)`.
    pub fn attr(&self, x: usize, y: usize) -> u8 {
        self.vram[self.color_base() + self.bitmap_offset(x, y)]
    }

    pub fn foreground(&self, x: usize, y: usize) -> u8 {
        self.attr(x, y) >> 4
    }

    pub fn background(&self, x: usize, y: usize) -> u8 {
        self.attr(x, y) & 0x0F
    }

    /// Final color index of a pixel; transparent (0) falls through to the
    /// backdrop color in register 7.
    pub fn color(&self, x: usize, y: usize) -> u8 {
        let c = if self.pixel(x, y) {
            self.foreground(x, y)
        } else {
            self.background(x, y)
        };
        if c == 0 { self.registers[7] & 0x0F } else { c }
    }

    /// Visit every lit pixel of the screen.
    pub fn for_each_lit<F: FnMut(usize, usize)>(&self, mut f: F) {
        for y in 0..SCREEN_H {
            for x in 0..SCREEN_W {
                if self.pixel(x, y) {
                    f(x, y);
                }
            }
        }
    }
}

impl VideoPort for Tms9918 {
    fn write_control_port(&mut self, value: u8) {
        self.control_writes += 1;
        let Some(low) = self.latch.take() else {
            self.latch = Some(value);
            return;
        };
        if value & 0x80 != 0 {
            self.registers[(value & 0x07) as usize] = low;
        } else {
            // Read setup (bit 6 clear) loads the pointer the same way.
            self.addr = (((value as u16) << 8) | low as u16) & ADDR_MASK;
        }
    }

    fn write_data_port(&mut self, value: u8) {
        self.latch = None;
        self.vram[self.addr as usize] = value;
        self.addr = (self.addr + 1) & ADDR_MASK;
        self.data_writes += 1;
    }
}
