//! Video output: the VDP port interface, an emulated TMS9918A and the
//! dirty-tile renderer.

mod overlay;
pub mod port;
mod renderer;
mod tms9918;

pub use overlay::DebugOverlay;
pub use port::{Palette, Vdp, VideoPort};
pub use renderer::{EXPAND4, Layout, RenderConfig, Renderer};
pub use tms9918::{Tms9918, VRAM_SIZE};
