//! 16-bit LFSR entropy source and the frame/keyboard entropy accumulator.

use rand::{RngCore, SeedableRng};

/// Seed used at power-on and whenever the register collapses to zero.
pub const DEFAULT_LFSR_STATE: u16 = 0x1D2B;
/// Galois feedback taps (x^16 + x^14 + x^13 + x^11 + 1).
const TAPS: u16 = 0xB400;

/// Maximal-length 16-bit Galois LFSR.
///
/// The all-zero state is a fixed point of the register, so every path that
/// can load a new state repairs zero to [`DEFAULT_LFSR_STATE`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Lfsr16 {
    state: u16,
}

impl Default for Lfsr16 {
    fn default() -> Self {
        Self::new(DEFAULT_LFSR_STATE)
    }
}

impl Lfsr16 {
    pub fn new(state: u16) -> Self {
        Self {
            state: repair(state),
        }
    }

    #[inline]
    pub fn state(&self) -> u16 {
        self.state
    }

    /// Advance one step and return the new state.
    #[inline]
    pub fn step(&mut self) -> u16 {
        let lsb = self.state & 1;
        self.state >>= 1;
        if lsb != 0 {
            self.state ^= TAPS;
        }
        self.state
    }

    /// Advance one step and return the low byte.
    #[inline]
    pub fn next_byte(&mut self) -> u8 {
        self.step() as u8
    }

    /// Fold external entropy into the register. Zero entropy is ignored.
    pub fn mix(&mut self, entropy: u16) {
        if entropy != 0 {
            self.state = repair(self.state ^ entropy);
        }
    }

    pub fn reseed(&mut self, state: u16) {
        self.state = repair(state);
    }
}

#[inline]
fn repair(state: u16) -> u16 {
    if state == 0 { DEFAULT_LFSR_STATE } else { state }
}

impl RngCore for Lfsr16 {
    fn next_u32(&mut self) -> u32 {
        let hi = self.step() as u32;
        let lo = self.step() as u32;
        (hi << 16) | lo
    }

    fn next_u64(&mut self) -> u64 {
        let hi = self.next_u32() as u64;
        let lo = self.next_u32() as u64;
        (hi << 32) | lo
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        for byte in dst {
            *byte = self.next_byte();
        }
    }
}

impl SeedableRng for Lfsr16 {
    type Seed = [u8; 2];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(u16::from_be_bytes(seed))
    }
}

/// Accumulates timing and keyboard noise for reseeding.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Entropy {
    value: u16,
    frame_prev: u8,
}

impl Entropy {
    #[inline]
    pub fn value(&self) -> u16 {
        self.value
    }

    /// Sample a free-running frame counter. Only changes contribute.
    pub fn observe_frame(&mut self, frame: u8) {
        if frame != self.frame_prev {
            self.value ^= ((frame as u16) << 8) | self.frame_prev as u16;
            self.frame_prev = frame;
        }
    }

    /// Stir in a digit key (1-9).
    pub fn stir(&mut self, digit: u8) {
        self.value = self.value.wrapping_add(digit as u16 * 0x1111);
        self.value ^= self.value.rotate_left(5);
    }
}
