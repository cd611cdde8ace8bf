//! Control loop: owns the engine, the display and the entropy state, and
//! drives seed -> (step -> input -> render) frames.

use std::time::Duration;

use tracing::{Level, event};

use crate::display::{DebugOverlay, RenderConfig, Renderer, Vdp, VideoPort};
use crate::error::ConfigError;
use crate::tilelife::{DEFAULT_LFSR_STATE, Entropy, Lfsr16, SeedConfig, TileLife, TileLifeConfig};

/// Everything needed to bring a simulation up.
#[derive(Clone, Debug)]
pub struct SimulationConfig {
    pub life: TileLifeConfig,
    pub render: RenderConfig,
    pub seed: SeedConfig,
    /// Initial LFSR register. Zero is repaired to the default.
    pub lfsr_state: u16,
    /// Start with the dirty-character highlight on.
    pub debug_dirty: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            life: TileLifeConfig::default(),
            render: RenderConfig::default(),
            seed: SeedConfig::default(),
            lfsr_state: DEFAULT_LFSR_STATE,
            debug_dirty: false,
        }
    }
}

impl SimulationConfig {
    pub fn life(mut self, life: TileLifeConfig) -> Self {
        self.life = life;
        self
    }

    pub fn render(mut self, render: RenderConfig) -> Self {
        self.render = render;
        self
    }

    pub fn seed(mut self, seed: SeedConfig) -> Self {
        self.seed = seed;
        self
    }

    pub fn lfsr_state(mut self, state: u16) -> Self {
        self.lfsr_state = state;
        self
    }

    pub fn debug_dirty(mut self, enabled: bool) -> Self {
        self.debug_dirty = enabled;
        self
    }
}

/// Keyboard commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// `D`: toggle the dirty-character highlight.
    ToggleDirtyHighlight,
    /// `F`: paint every clean character.
    CleanSnapshot,
    /// `1`-`9`: stir the digit into the entropy pool.
    Stir(u8),
    /// `Z X C V B` pick a density before reseeding; `R` keeps the current one.
    Reseed(Option<u8>),
}

impl Command {
    pub fn from_key(key: u8) -> Option<Self> {
        let cmd = match key.to_ascii_uppercase() {
            b'D' => Self::ToggleDirtyHighlight,
            b'F' => Self::CleanSnapshot,
            d @ b'1'..=b'9' => Self::Stir(d - b'0'),
            b'Z' => Self::Reseed(Some(70)),
            b'X' => Self::Reseed(Some(60)),
            b'C' => Self::Reseed(Some(50)),
            b'V' => Self::Reseed(Some(40)),
            b'B' => Self::Reseed(Some(30)),
            b'R' => Self::Reseed(None),
            _ => return None,
        };
        Some(cmd)
    }
}

/// Edge detector over successive keyboard scans. 0 means no key.
#[derive(Clone, Copy, Debug, Default)]
pub struct KeyLatch {
    prev: u8,
}

impl KeyLatch {
    /// Returns the key if this scan starts a new press.
    pub fn scan(&mut self, key: u8) -> Option<u8> {
        let pressed = key != 0 && key != self.prev;
        self.prev = key;
        pressed.then_some(key)
    }
}

/// Peripheral readings sampled once per frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameInput {
    /// Free-running video frame counter.
    pub frame: u8,
    /// Keyboard scan result, 0 when no key is down.
    pub key: u8,
}

/// Outcome of one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    pub generation: u64,
    pub tiles_drawn: usize,
    pub command: Option<Command>,
}

pub struct Simulation<P: VideoPort> {
    life: TileLife,
    vdp: Vdp<P>,
    renderer: Renderer,
    overlay: DebugOverlay,
    rng: Lfsr16,
    entropy: Entropy,
    seed: SeedConfig,
    keys: KeyLatch,
}

impl<P: VideoPort> Simulation<P> {
    /// Validate the configuration, program the display, seed the board and
    /// draw the first frame.
    pub fn new(config: SimulationConfig, port: P) -> Result<Self, ConfigError> {
        let mut life = TileLife::with_config(config.life)?;
        let renderer = Renderer::new(life.geometry(), &config.render)?;
        let mut vdp = Vdp::new(port);
        let layout = renderer.layout();
        event!(
            Level::INFO,
            "life region {}x{} cells at scale {}, origin {:?}, border {}",
            life.geometry().cell_w(),
            life.geometry().cell_h(),
            layout.scale(),
            layout.origin(),
            layout.draws_border()
        );

        vdp.init_graphics2();
        vdp.clear_pattern_table();
        vdp.init_name_table();
        vdp.init_color_table(renderer.palette().normal_attr());
        renderer.apply_border_colors(&mut vdp);
        vdp.disable_sprites();

        let mut rng = Lfsr16::new(config.lfsr_state);
        life.seed(&mut rng, &config.seed);
        renderer.write_border_tiles(&mut vdp);
        renderer.write_dirty_tiles(&mut vdp, life.board(), &life.tiles().dirty);
        life.mark_rendered();
        vdp.display_on();
        event!(
            Level::INFO,
            "seeded density={} population={}",
            config.seed.density,
            life.population()
        );

        let mut overlay = DebugOverlay::new(&renderer);
        if config.debug_dirty {
            overlay.toggle(&mut vdp, &renderer);
        }

        Ok(Self {
            life,
            vdp,
            renderer,
            overlay,
            rng,
            entropy: Entropy::default(),
            seed: config.seed,
            keys: KeyLatch::default(),
        })
    }

    #[inline]
    pub fn life(&self) -> &TileLife {
        &self.life
    }

    #[inline]
    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    #[inline]
    pub fn port(&self) -> &P {
        self.vdp.port()
    }

    #[inline]
    pub fn port_mut(&mut self) -> &mut P {
        self.vdp.port_mut()
    }

    pub fn into_port(self) -> P {
        self.vdp.into_port()
    }

    #[inline]
    pub fn rng(&self) -> &Lfsr16 {
        &self.rng
    }

    #[inline]
    pub fn entropy(&self) -> &Entropy {
        &self.entropy
    }

    #[inline]
    pub fn seed_config(&self) -> &SeedConfig {
        &self.seed
    }

    #[inline]
    pub fn overlay_enabled(&self) -> bool {
        self.overlay.enabled()
    }

    /// Run one frame: step, sample input, update the overlay, redraw dirty tiles.
    pub fn tick(&mut self, input: FrameInput) -> TickReport {
        self.life.step();
        self.entropy.observe_frame(input.frame);
        let command = self.handle_key(input.key);
        if self.overlay.enabled() {
            self.overlay
                .update(&mut self.vdp, &self.renderer, &self.life.tiles().dirty);
        }
        let tiles_drawn =
            self.renderer
                .write_dirty_tiles(&mut self.vdp, self.life.board(), &self.life.tiles().dirty);
        self.life.mark_rendered();
        TickReport {
            generation: self.life.generation(),
            tiles_drawn,
            command,
        }
    }

    /// Feed one keyboard scan through the edge detector and act on it.
    pub fn handle_key(&mut self, key: u8) -> Option<Command> {
        let command = self.keys.scan(key).and_then(Command::from_key)?;
        self.apply(command);
        Some(command)
    }

    pub fn apply(&mut self, command: Command) {
        match command {
            Command::ToggleDirtyHighlight => {
                let on = self.overlay.toggle(&mut self.vdp, &self.renderer);
                event!(Level::DEBUG, "dirty highlight {}", if on { "on" } else { "off" });
            }
            Command::CleanSnapshot => {
                self.overlay
                    .clean_snapshot(&mut self.vdp, &self.renderer, &self.life.tiles().dirty);
            }
            Command::Stir(digit) => self.entropy.stir(digit),
            Command::Reseed(density) => {
                if let Some(density) = density {
                    self.seed.density = density;
                }
                self.reseed();
            }
        }
    }

    /// Mix pending entropy into the LFSR and start over from a fresh board.
    /// The whole region is redrawn on the next render.
    pub fn reseed(&mut self) {
        self.rng.mix(self.entropy.value());
        self.life.seed(&mut self.rng, &self.seed);
        event!(
            Level::INFO,
            "reseeded density={} lfsr={:#06x} population={}",
            self.seed.density,
            self.rng.state(),
            self.life.population()
        );
    }

    /// Run `generations` frames, or forever when `None`, pausing `delay`
    /// after each. `input` is polled once per frame with the frame index.
    pub fn run<F>(&mut self, generations: Option<u64>, delay: Option<Duration>, mut input: F) -> u64
    where
        F: FnMut(u64) -> FrameInput,
    {
        let mut frames = 0u64;
        let mut tiles_drawn = 0u64;
        while generations.is_none_or(|n| frames < n) {
            let report = self.tick(input(frames));
            tiles_drawn += report.tiles_drawn as u64;
            frames += 1;
            if let Some(delay) = delay {
                std::thread::sleep(delay);
            }
        }
        event!(
            Level::DEBUG,
            "ran {} frames, generation {}, population {}, {} tiles drawn",
            frames,
            self.life.generation(),
            self.life.population(),
            tiles_drawn
        );
        frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::Tms9918;

    fn small() -> SimulationConfig {
        SimulationConfig::default().life(TileLifeConfig::default().size(64, 48))
    }

    #[test]
    fn keys_map_to_commands() {
        assert_eq!(Command::from_key(b'd'), Some(Command::ToggleDirtyHighlight));
        assert_eq!(Command::from_key(b'F'), Some(Command::CleanSnapshot));
        assert_eq!(Command::from_key(b'7'), Some(Command::Stir(7)));
        assert_eq!(Command::from_key(b'0'), None);
        assert_eq!(Command::from_key(b'x'), Some(Command::Reseed(Some(60))));
        assert_eq!(Command::from_key(b'B'), Some(Command::Reseed(Some(30))));
        assert_eq!(Command::from_key(b'r'), Some(Command::Reseed(None)));
        assert_eq!(Command::from_key(b'Q'), None);
    }

    #[test]
    fn key_latch_is_edge_triggered() {
        let mut latch = KeyLatch::default();
        assert_eq!(latch.scan(b'D'), Some(b'D'));
        assert_eq!(latch.scan(b'D'), None);
        assert_eq!(latch.scan(0), None);
        assert_eq!(latch.scan(b'D'), Some(b'D'));
        assert_eq!(latch.scan(b'F'), Some(b'F'));
    }

    #[test]
    fn new_draws_first_frame_and_enables_display() {
        let sim = Simulation::new(small(), Tms9918::new()).unwrap();
        let chip = sim.port();
        assert!(chip.display_enabled());
        assert!(chip.bitmap_mode());
        let mut lit = 0u64;
        sim.life().for_each_live(|x, y| {
            let (px, py) = sim.renderer().layout().cell_pixel(x, y);
            assert!(chip.pixel(px, py));
            lit += 1;
        });
        assert_eq!(lit, sim.life().population());
    }

    #[test]
    fn invalid_config_is_rejected_before_drawing() {
        let config = small().render(RenderConfig::default().scale(4));
        assert!(matches!(
            Simulation::new(config, Tms9918::new()),
            Err(ConfigError::InvalidScale(4))
        ));
    }

    #[test]
    fn reseed_key_sets_density_and_mixes_entropy() {
        let mut sim = Simulation::new(small(), Tms9918::new()).unwrap();
        sim.tick(FrameInput { frame: 1, key: b'3' });
        let entropy = sim.entropy().value();
        assert_ne!(entropy, 0);
        let report = sim.tick(FrameInput { frame: 2, key: b'v' });
        assert_eq!(report.command, Some(Command::Reseed(Some(40))));
        assert_eq!(sim.seed_config().density, 40);
        // Reseeding marks every tile dirty, so the whole region is redrawn.
        assert_eq!(report.tiles_drawn, sim.life().geometry().tile_count());
    }

    #[test]
    fn held_key_fires_once() {
        let mut sim = Simulation::new(small(), Tms9918::new()).unwrap();
        assert!(sim.tick(FrameInput { frame: 0, key: b'd' }).command.is_some());
        assert!(sim.overlay_enabled());
        assert!(sim.tick(FrameInput { frame: 0, key: b'd' }).command.is_none());
        assert!(sim.overlay_enabled());
    }

    #[test]
    fn run_counts_frames() {
        let mut sim = Simulation::new(small(), Tms9918::new()).unwrap();
        let frames = sim.run(Some(5), None, |_| FrameInput::default());
        assert_eq!(frames, 5);
        assert_eq!(sim.life().generation(), 5);
    }
}
