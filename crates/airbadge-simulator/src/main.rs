//! Headless desktop simulator for the airbadge firmware core.
//!
//! Drives an `airbadge_core::Badge` against synthetic sensors, a scripted
//! button timeline and a virtual clock, so a few minutes of badge life run in
//! well under a second. Every panel submit is flushed into an
//! `embedded-graphics-simulator` display and can be written out as a PNG.
//!
//! ```text
//! airbadge-simulator [OUTPUT_DIR] [SECONDS]
//! ```
//!
//! | Time  | Event                          |
//! |-------|--------------------------------|
//! | 30 s  | Middle: manual refresh         |
//! | 45 s  | Up: enter CO2 calibration      |
//! | 52 s  | Middle: confirm calibration    |
//! | 70 s  | Up: enter CO2 calibration      |
//! | 75 s  | Down: cancel calibration       |
//! | 90 s  | Sensors unplugged for 6 s      |

use std::convert::Infallible;
use std::path::PathBuf;

use embassy_time::{Duration, Instant};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use embedded_graphics_simulator::{OutputSettings, OutputSettingsBuilder, SimulatorDisplay};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, OutputPin};
use log::{debug, error, info, warn};

use airbadge_core::framebuffer::{DISPLAY_HEIGHT_PX, DISPLAY_WIDTH_PX};
use airbadge_core::platform::disable_indicator_led;
use airbadge_core::{
    Badge, BadgeConfig, Button, Buttons, Buzzer, Clock, EinkPanel, FrameBuffer, Mode,
    PowerControl, RefreshWindow, Rotation, SensorError, SensorEvent, SensorHub, Unit,
    UnitRegistry,
};

/// Virtual time advanced per loop iteration.
const STEP: Duration = Duration::from_millis(100);

/// Default length of a run in simulated seconds.
const DEFAULT_RUN_SECS: u64 = 120;

/// Pixel scale factor for PNG snapshots.
const SNAPSHOT_SCALE: u32 = 2;

/// Sensor outage window, in simulated seconds.
const OUTAGE: core::ops::Range<u64> = 90..96;

const BUTTON_SCRIPT: [(u64, Button); 5] = [
    (30, Button::Middle),
    (45, Button::Up),
    (52, Button::Middle),
    (70, Button::Up),
    (75, Button::Down),
];

// ---------------------------------------------------------------------------
// Mock sensors
// ---------------------------------------------------------------------------

/// Synthetic sensor layer: a CO2 sensor with its internal climate channels
/// plus a particulate sensor, all varying slowly over time.
struct MockSensorHub {
    units: Vec<(Unit, f32)>,
    cursor: usize,
    detected: bool,
    unplugged: bool,
    polls: u64,
    polls_per_sample: u64,
}

impl MockSensorHub {
    fn new() -> Self {
        Self {
            units: Vec::new(),
            cursor: 0,
            detected: true,
            unplugged: false,
            polls: 0,
            polls_per_sample: 20,
        }
    }

    /// Recompute every channel for the current poll count.
    fn sample(&mut self) {
        let t = self.polls as f64 * STEP.as_millis() as f64 / 1000.0;

        // CO2: 500-1100 ppm with a slow cycle
        let co2 = 800.0 + 300.0 * (t / 60.0).sin() + 20.0 * (t / 7.0).cos();
        // PM2.5 drifts around the alarm level
        let pm25 = 40.0 + 15.0 * (t / 45.0).sin();
        let pm10 = pm25 * 1.4 + 3.0 * (t / 11.0).cos();
        let temperature = 23.0 + 2.0 * (t / 120.0).sin();
        let humidity = 50.0 + 8.0 * (t / 90.0).sin();

        self.units = vec![
            (Unit::Pm25, pm25 as f32),
            (Unit::Pm10, pm10 as f32),
            (Unit::Co2, co2 as f32),
            (Unit::Co2Temperature, (temperature + 1.5) as f32),
            (Unit::Co2Humidity, (humidity - 4.0) as f32),
            (Unit::Temperature, temperature as f32),
            (Unit::Humidity, humidity as f32),
        ];
        self.cursor = 0;
    }
}

impl UnitRegistry for MockSensorHub {
    fn next_unit(&mut self) -> Option<Unit> {
        if !self.detected {
            return None;
        }
        match self.units.get(self.cursor) {
            Some((unit, _)) => {
                self.cursor += 1;
                Some(*unit)
            }
            None => {
                self.cursor = 0;
                None
            }
        }
    }

    fn value(&self, unit: Unit) -> f32 {
        self.units
            .iter()
            .find(|(u, _)| *u == unit)
            .map_or(0.0, |(_, v)| *v)
    }
}

impl SensorHub for MockSensorHub {
    fn poll(&mut self) -> SensorEvent {
        self.polls += 1;
        if self.polls % self.polls_per_sample != 0 {
            return SensorEvent::Idle;
        }
        if self.unplugged || !self.detected {
            self.units.clear();
            return SensorEvent::Absent;
        }
        self.sample();
        SensorEvent::Data
    }

    fn issue_recalibration(&mut self, reference_ppm: u16) -> Result<(), SensorError> {
        if !self.units.iter().any(|(u, _)| *u == Unit::Co2) {
            return Err(SensorError::NotDetected {
                operation: "CO2 recalibration",
            });
        }
        info!("SCD4x forced recalibration to {} ppm", reference_ppm);
        Ok(())
    }

    fn reset_all(&mut self) {
        debug!("Forgetting detected sensors");
        self.detected = false;
        self.units.clear();
        self.cursor = 0;
    }

    fn reinit(&mut self) {
        info!("Re-detecting sensors");
        self.detected = !self.unplugged;
    }

    fn set_sample_interval(&mut self, secs: u16) {
        let step_ms = STEP.as_millis().max(1);
        self.polls_per_sample = (u64::from(secs) * 1000 / step_ms).max(1);
        info!("Sample interval {} s ({} polls)", secs, self.polls_per_sample);
    }
}

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

/// Virtual-clock board. Suspend returns at once, like a badge on USB power.
struct SimBoard {
    micros: u64,
    script: Vec<(u64, Button)>,
    latched: [bool; 3],
}

impl SimBoard {
    fn new() -> Self {
        Self {
            micros: 0,
            script: BUTTON_SCRIPT.to_vec(),
            latched: [false; 3],
        }
    }

    fn advance(&mut self, duration: Duration) {
        self.micros += duration.as_micros();
    }

    fn elapsed_secs(&self) -> u64 {
        self.micros / 1_000_000
    }
}

impl Buttons for SimBoard {
    fn update(&mut self) {
        self.latched = [false; 3];
        let now = self.elapsed_secs();
        let latched = &mut self.latched;
        self.script.retain(|(at, button)| {
            if *at <= now {
                info!("[{} s] {:?} pressed", now, button);
                latched[button.index()] = true;
                false
            } else {
                true
            }
        });
    }

    fn is_pressed(&self, button: Button) -> bool {
        self.latched[button.index()]
    }

    fn was_pressed(&self, button: Button) -> bool {
        self.latched[button.index()]
    }
}

impl Buzzer for SimBoard {
    fn tone(&mut self, freq_hz: u32, duration_ms: u32) {
        info!("Beep {} Hz for {} ms", freq_hz, duration_ms);
    }

    fn mute(&mut self) {}
}

impl PowerControl for SimBoard {
    fn suspend(&mut self, duration: Duration) {
        info!(
            "Deep sleep requested for {} s, staying awake on USB power",
            duration.as_secs()
        );
    }
}

impl Clock for SimBoard {
    fn now(&self) -> Instant {
        Instant::from_micros(self.micros)
    }
}

impl DelayNs for SimBoard {
    fn delay_ns(&mut self, ns: u32) {
        self.micros += u64::from(ns).div_ceil(1000);
    }
}

/// External LED rail; only logs what a GPIO would do.
struct LedRail;

impl ErrorType for LedRail {
    type Error = Infallible;
}

impl OutputPin for LedRail {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        debug!("LED rail low");
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        info!("LED rail disabled");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Panel
// ---------------------------------------------------------------------------

/// E-ink stand-in: screens compose into a [`FrameBuffer`], submits flush it
/// into a simulator display and optionally snapshot it to disk.
struct SimPanel {
    frame: FrameBuffer,
    glass: SimulatorDisplay<BinaryColor>,
    output: Option<PathBuf>,
    settings: OutputSettings,
    snapshots: u32,
    powered: bool,
}

impl SimPanel {
    fn new(output: Option<PathBuf>) -> Self {
        Self {
            frame: FrameBuffer::new(),
            glass: SimulatorDisplay::new(Size::new(DISPLAY_WIDTH_PX, DISPLAY_HEIGHT_PX)),
            output,
            settings: OutputSettingsBuilder::new().scale(SNAPSHOT_SCALE).build(),
            snapshots: 0,
            powered: true,
        }
    }

    fn snapshot(&mut self, label: &str) {
        let Some(dir) = &self.output else {
            return;
        };
        self.snapshots += 1;
        let path = dir.join(format!("{:03}_{}.png", self.snapshots, label));
        match self.glass.to_rgb_output_image(&self.settings).save_png(&path) {
            Ok(()) => debug!("Saved {}", path.display()),
            Err(e) => error!("Failed to save {}: {}", path.display(), e),
        }
    }
}

impl OriginDimensions for SimPanel {
    fn size(&self) -> Size {
        self.frame.size()
    }
}

impl DrawTarget for SimPanel {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        self.frame.draw_iter(pixels)
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        self.frame.fill_solid(area, color)
    }
}

impl EinkPanel for SimPanel {
    fn set_rotation(&mut self, rotation: Rotation) {
        debug!("Panel rotation {:?}", rotation);
    }

    fn submit(&mut self, window: RefreshWindow) -> Result<(), Self::Error> {
        if !self.powered {
            info!("Panel powered on");
            self.powered = true;
        }
        match window {
            RefreshWindow::Full => {
                self.frame.flush_full(&mut self.glass)?;
                self.snapshot("full");
            }
            RefreshWindow::Partial => {
                if let Some(area) = self.frame.dirty_area() {
                    debug!("Partial refresh of {:?}", area);
                }
                self.frame.flush_partial(&mut self.glass)?;
                self.snapshot("partial");
            }
        }
        Ok(())
    }

    fn present(&mut self, charge_hint: bool) -> Result<(), Self::Error> {
        debug!("Final refresh (charging: {})", charge_hint);
        self.frame.flush_partial(&mut self.glass)
    }

    fn power_off(&mut self) -> Result<(), Self::Error> {
        self.powered = false;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let output = args.next().map(PathBuf::from);
    let run_secs = args
        .next()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(DEFAULT_RUN_SECS);

    if let Some(dir) = &output {
        if let Err(e) = std::fs::create_dir_all(dir) {
            error!("Cannot create {}: {}", dir.display(), e);
            std::process::exit(1);
        }
        info!("Writing panel snapshots to {}", dir.display());
    }
    info!("Starting airbadge simulator for {} simulated seconds", run_secs);

    let config = BadgeConfig::default().with_calibration_timeout(Some(Duration::from_secs(30)));
    if config.disable_indicator_led {
        disable_indicator_led(&mut LedRail);
    }

    let mut badge = match Badge::new(
        MockSensorHub::new(),
        SimPanel::new(output),
        SimBoard::new(),
        config,
    ) {
        Ok(badge) => badge,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = badge.start() {
        error!("{}", e);
        std::process::exit(1);
    }

    let mut mode = badge.mode();
    while badge.board().elapsed_secs() < run_secs {
        let now = badge.board().elapsed_secs();
        let unplugged = OUTAGE.contains(&now);
        if unplugged != badge.sensors().unplugged {
            warn!("[{} s] Sensors {}", now, if unplugged { "unplugged" } else { "reconnected" });
            let sensors = badge.sensors_mut();
            sensors.unplugged = unplugged;
            if !unplugged {
                sensors.reinit();
            }
        }

        badge.step();

        let current = badge.mode();
        if matches!(current, Mode::Monitoring) != matches!(mode, Mode::Monitoring) {
            info!("[{} s] Mode {:?}", now, current);
        }
        mode = current;

        badge.board_mut().advance(STEP);
    }

    let stats = badge.display().stats();
    info!(
        "Done: {} full and {} partial refreshes, {} coalesced, {} failed, {} sleep cycles",
        stats.full,
        stats.partial,
        stats.coalesced,
        stats.failed,
        badge.sleep_cycles()
    );
    if let Some(dir) = &badge.display().panel().output {
        info!("{} snapshots in {}", badge.display().panel().snapshots, dir.display());
    }
}
