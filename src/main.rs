#[cfg(feature = "mimalloc-global")]
#[global_allocator]
static GLOBAL_ALLOCATOR: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::error::Error;
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use tile_life::app::{FrameInput, Simulation, SimulationConfig};
use tile_life::display::{RenderConfig, Tms9918};
use tile_life::tilelife::geometry::{DEFAULT_CELL_H, DEFAULT_CELL_W};
use tile_life::tilelife::{DEFAULT_DENSITY, DEFAULT_LFSR_STATE, PruneGranularity, SeedConfig, TileLifeConfig};
use tracing::{Level, event};
use tracing_subscriber::prelude::*;

/// Video frames per second of the frame counter fed to the entropy pool.
const FRAME_HZ: f64 = 60.0;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Granularity {
    TileRow,
    Word,
}

impl From<Granularity> for PruneGranularity {
    fn from(g: Granularity) -> Self {
        match g {
            Granularity::TileRow => PruneGranularity::TileRow,
            Granularity::Word => PruneGranularity::Word,
        }
    }
}

fn parse_hex_or_dec(s: &str) -> Result<u16, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => s.parse::<u16>(),
    };
    parsed.map_err(|e| format!("invalid LFSR seed {s:?}: {e}"))
}

/// Game of Life on an emulated TMS9918A bitmap screen
#[derive(Parser, Debug)]
#[clap(version, about, long_about = None)]
struct Cli {
    /// Grid width in cells (multiple of 16)
    #[clap(long, default_value_t = DEFAULT_CELL_W)]
    width: usize,

    /// Grid height in cells (multiple of 4)
    #[clap(long, default_value_t = DEFAULT_CELL_H)]
    height: usize,

    /// Pixels per cell edge (1 or 2)
    #[clap(long, default_value_t = 2)]
    scale: u8,

    /// Probability out of 256 that a 4x4 seed block is filled
    #[clap(long, default_value_t = DEFAULT_DENSITY)]
    density: u8,

    /// Initial LFSR state, decimal or 0x-prefixed hex
    #[clap(long, value_parser = parse_hex_or_dec, default_value_t = DEFAULT_LFSR_STATE)]
    seed: u16,

    /// Frames to run; runs until interrupted when omitted
    #[clap(long)]
    generations: Option<u64>,

    /// Worker threads for the step engine (0 = one per physical core)
    #[clap(long)]
    threads: Option<usize>,

    /// Inactive-region pruning granularity
    #[clap(long, value_enum, default_value_t = Granularity::TileRow)]
    granularity: Granularity,

    /// Pause after every frame, in milliseconds
    #[clap(long)]
    delay_ms: Option<u64>,

    /// Start with the dirty-character highlight enabled
    #[clap(long)]
    debug_dirty: bool,

    /// Key presses to replay, one every other frame (D F 1-9 Z X C V B R)
    #[clap(long, default_value = "")]
    keys: String,

    /// Print the life region as text when the run ends
    #[clap(long)]
    dump: bool,
}

impl Cli {
    fn config(&self) -> SimulationConfig {
        let mut life = TileLifeConfig::default()
            .size(self.width, self.height)
            .granularity(self.granularity.into());
        if let Some(n) = self.threads {
            life = life.thread_count(n);
        }
        SimulationConfig::default()
            .life(life)
            .render(RenderConfig::default().scale(self.scale))
            .seed(SeedConfig::default().density(self.density))
            .lfsr_state(self.seed)
            .debug_dirty(self.debug_dirty)
    }
}

fn init_tracing() -> Result<(), Box<dyn Error>> {
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(true);
    let filter_layer = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new("info"))?;
    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
    Ok(())
}

fn dump_region(sim: &Simulation<Tms9918>) {
    let layout = sim.renderer().layout();
    let geometry = layout.geometry();
    let chip = sim.port();
    for y in 0..geometry.cell_h() {
        let line: String = (0..geometry.cell_w())
            .map(|x| {
                let (px, py) = layout.cell_pixel(x, y);
                if chip.pixel(px, py) { '#' } else { '.' }
            })
            .collect();
        println!("{line}");
    }
}

fn run_life() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing()?;

    let config = cli.config();
    event!(
        Level::INFO,
        "starting {}x{} grid, {:?} pruning, seed {:#06x}",
        cli.width,
        cli.height,
        config.life.granularity,
        cli.seed
    );
    let mut sim = Simulation::new(config, Tms9918::new())?;

    let keys = cli.keys.as_bytes();
    let start = Instant::now();
    let delay = cli.delay_ms.map(Duration::from_millis);
    let frames = sim.run(cli.generations, delay, |frame| {
        let index = frame as usize;
        // Gaps between presses let repeated keys register as separate presses.
        let key = if index % 2 == 0 {
            keys.get(index / 2).copied().unwrap_or(0)
        } else {
            0
        };
        FrameInput {
            frame: (start.elapsed().as_secs_f64() * FRAME_HZ) as u64 as u8,
            key,
        }
    });

    let elapsed = start.elapsed();
    event!(
        Level::INFO,
        "{} frames in {:.3} s, population {}, {} VDP data bytes",
        frames,
        elapsed.as_secs_f64(),
        sim.life().population(),
        sim.port().data_writes()
    );

    if cli.dump {
        dump_region(&sim);
    }
    Ok(())
}

fn main() {
    match run_life() {
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
        Ok(()) => {
            std::process::exit(0);
        }
    }
}
