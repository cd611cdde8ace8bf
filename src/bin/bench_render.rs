#[cfg(feature = "mimalloc-global")]
#[global_allocator]
static GLOBAL_ALLOCATOR: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::time::Instant;
use tile_life::app::{FrameInput, Simulation, SimulationConfig};
use tile_life::display::{RenderConfig, Tms9918};
use tile_life::tilelife::{SeedConfig, TileLifeConfig};

const FRAMES: u64 = 500;

/// Frames per second and VDP data bytes per frame for one configuration.
fn bench_frames(width: usize, height: usize, scale: u8, density: u8) -> (f64, f64) {
    let config = SimulationConfig::default()
        .life(TileLifeConfig::default().size(width, height))
        .render(RenderConfig::default().scale(scale))
        .seed(SeedConfig::default().density(density));
    let mut sim = Simulation::new(config, Tms9918::new()).expect("invalid benchmark layout");
    sim.port_mut().reset_counters();

    let start = Instant::now();
    sim.run(Some(FRAMES), None, |_| FrameInput::default());
    let secs = start.elapsed().as_secs_f64();

    let bytes_per_frame = sim.port().data_writes() as f64 / FRAMES as f64;
    (FRAMES as f64 / secs, bytes_per_frame)
}

fn main() {
    let cases: &[(usize, usize, u8, u8)] = &[
        (128, 96, 2, 70),
        (128, 96, 2, 30),
        (64, 48, 2, 70),
        (256, 192, 1, 70),
        (128, 96, 1, 70),
    ];

    println!(
        "{:<10} {:>6} {:>8} {:>12} {:>14} {:>14}",
        "Grid", "Scale", "Density", "Frames/s", "Bytes/frame", "Full/frame"
    );
    println!("{}", "-".repeat(70));

    for &(w, h, scale, density) in cases {
        let (fps, bytes) = bench_frames(w, h, scale, density);
        // Data bytes of a full redraw.
        let full = (w / 4) * (h / 4) * if scale == 2 { 8 } else { 4 };
        println!(
            "{:<10} {:>6} {:>8} {:>12.1} {:>14.1} {:>14}",
            format!("{}x{}", w, h),
            scale,
            density,
            fps,
            bytes,
            full
        );
    }
}
