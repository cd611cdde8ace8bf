use rand::RngCore;
use rand::SeedableRng;
use std::env;
use std::time::Instant;
use tile_life::tilelife::{PruneGranularity, TileLife, TileLifeConfig};

#[derive(Clone, Debug)]
struct BenchConfig {
    width: usize,
    height: usize,
    density: f64,
    warmup: u64,
    iters: u64,
    seed: u64,
    threads: Option<usize>,
    json: bool,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 768,
            density: 0.30,
            warmup: 3,
            iters: 200,
            seed: 0xA5A5_5EED_7788_1122,
            threads: None,
            json: false,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct RunResult {
    total_ms: f64,
    avg_ms: f64,
    population: u64,
    avg_active_bands: f64,
}

fn parse_args() -> BenchConfig {
    let mut cfg = BenchConfig::default();
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--width" => {
                if let Some(v) = args.next() {
                    cfg.width = v.parse().expect("--width expects usize");
                }
            }
            "--height" => {
                if let Some(v) = args.next() {
                    cfg.height = v.parse().expect("--height expects usize");
                }
            }
            "--density" => {
                if let Some(v) = args.next() {
                    cfg.density = v.parse().expect("--density expects f64");
                }
            }
            "--warmup" => {
                if let Some(v) = args.next() {
                    cfg.warmup = v.parse().expect("--warmup expects u64");
                }
            }
            "--iters" => {
                if let Some(v) = args.next() {
                    cfg.iters = v.parse().expect("--iters expects u64");
                }
            }
            "--seed" => {
                if let Some(v) = args.next() {
                    cfg.seed = if let Some(hex) = v.strip_prefix("0x") {
                        u64::from_str_radix(hex, 16).expect("--seed hex parse failed")
                    } else {
                        v.parse().expect("--seed expects u64")
                    };
                }
            }
            "--threads" => {
                if let Some(v) = args.next() {
                    cfg.threads = Some(v.parse().expect("--threads expects usize"));
                }
            }
            "--json" => {
                cfg.json = true;
            }
            other => panic!("unknown arg: {other}"),
        }
    }
    cfg
}

/// Random soup confined to the left third of the grid, so pruning has
/// dead bands and words to skip.
fn seed_soup(engine: &mut TileLife, cfg: &BenchConfig) {
    let mut rng = rand::rngs::StdRng::seed_from_u64(cfg.seed);
    let threshold = (u64::MAX as f64 * cfg.density) as u64;
    let mut cells = Vec::new();
    for y in 0..cfg.height / 2 {
        for x in 0..cfg.width / 3 {
            if rng.next_u64() <= threshold {
                cells.push((x, y));
            }
        }
    }
    engine.load_cells(cells);
}

fn run_granularity(cfg: &BenchConfig, granularity: PruneGranularity) -> RunResult {
    let mut config = TileLifeConfig::default()
        .size(cfg.width, cfg.height)
        .granularity(granularity);
    if let Some(t) = cfg.threads {
        config = config.thread_count(t);
    }
    let mut engine = TileLife::with_config(config).expect("invalid benchmark geometry");
    seed_soup(&mut engine, cfg);

    if cfg.warmup > 0 {
        engine.step_n(cfg.warmup);
    }

    let mut active_bands = 0u64;
    let start = Instant::now();
    for _ in 0..cfg.iters {
        engine.step();
        active_bands += engine.last_step().active_bands as u64;
    }
    let elapsed = start.elapsed();
    let total_ms = elapsed.as_secs_f64() * 1000.0;

    RunResult {
        total_ms,
        avg_ms: total_ms / cfg.iters as f64,
        population: engine.population(),
        avg_active_bands: active_bands as f64 / cfg.iters as f64,
    }
}

fn main() {
    let cfg = parse_args();
    let tile_row = run_granularity(&cfg, PruneGranularity::TileRow);
    let word = run_granularity(&cfg, PruneGranularity::Word);
    assert_eq!(
        tile_row.population, word.population,
        "pruning granularities disagree"
    );

    if cfg.json {
        println!(
            "{{\"width\":{},\"height\":{},\"density\":{},\"warmup\":{},\"iters\":{},\"seed\":{},\"threads\":{},\"tile_row\":{{\"total_ms\":{:.6},\"avg_ms\":{:.6},\"population\":{},\"active_bands\":{:.2}}},\"word\":{{\"total_ms\":{:.6},\"avg_ms\":{:.6},\"population\":{},\"active_bands\":{:.2}}}}}",
            cfg.width,
            cfg.height,
            cfg.density,
            cfg.warmup,
            cfg.iters,
            cfg.seed,
            cfg.threads.unwrap_or(1),
            tile_row.total_ms,
            tile_row.avg_ms,
            tile_row.population,
            tile_row.avg_active_bands,
            word.total_ms,
            word.avg_ms,
            word.population,
            word.avg_active_bands,
        );
    } else {
        println!(
            "tile-row: total_ms={:.6}, avg_ms={:.6}, population={}, active_bands={:.2}",
            tile_row.total_ms, tile_row.avg_ms, tile_row.population, tile_row.avg_active_bands
        );
        println!(
            "word:     total_ms={:.6}, avg_ms={:.6}, population={}, active_bands={:.2}, ratio={:.3}x",
            word.total_ms,
            word.avg_ms,
            word.population,
            word.avg_active_bands,
            tile_row.avg_ms / word.avg_ms
        );
    }
}
