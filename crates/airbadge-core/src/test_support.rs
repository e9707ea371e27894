//! Host-side doubles for the sensor layer, board and panel

use core::convert::Infallible;

use embassy_time::{Duration, Instant};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, OutputPin};
use heapless::{Deque, Vec};

use crate::display::{EinkPanel, RefreshWindow, Rotation};
use crate::framebuffer::FrameBuffer;
use crate::platform::{Button, Buttons, Buzzer, Clock, PowerControl};
use crate::sensors::{SensorError, SensorEvent, SensorHub, Unit, UnitRegistry};

pub struct MockHub {
    units: Vec<(Unit, f32), 16>,
    labels: Vec<(Unit, &'static str, &'static str), 4>,
    cursor: usize,
    events: Deque<SensorEvent, 64>,
    pub recalibrations: Vec<u16, 8>,
    pub recalibration_result: Result<(), SensorError>,
    pub resets: u32,
    pub reinits: u32,
    pub sample_interval: Option<u16>,
}

impl MockHub {
    pub fn with_units(units: &[(Unit, f32)]) -> Self {
        let mut hub = Self {
            units: Vec::new(),
            labels: Vec::new(),
            cursor: 0,
            events: Deque::new(),
            recalibrations: Vec::new(),
            recalibration_result: Ok(()),
            resets: 0,
            reinits: 0,
            sample_interval: None,
        };
        hub.set_units(units);
        hub
    }

    pub fn with_label(mut self, unit: Unit, name: &'static str, symbol: &'static str) -> Self {
        let _ = self.labels.push((unit, name, symbol));
        self
    }

    pub fn set_units(&mut self, units: &[(Unit, f32)]) {
        self.units.clear();
        for reading in units {
            let _ = self.units.push(*reading);
        }
        self.cursor = 0;
    }

    /// Queue events returned by successive polls. An empty queue polls `Idle`.
    pub fn push_events(&mut self, events: &[SensorEvent]) {
        for event in events {
            let _ = self.events.push_back(*event);
        }
    }

    pub fn push_repeated(&mut self, event: SensorEvent, count: usize) {
        for _ in 0..count {
            let _ = self.events.push_back(event);
        }
    }
}

impl UnitRegistry for MockHub {
    fn next_unit(&mut self) -> Option<Unit> {
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
            .map(|(_, v)| *v)
            .unwrap_or(0.0)
    }

    fn name(&self, unit: Unit) -> &str {
        self.labels
            .iter()
            .find(|(u, _, _)| *u == unit)
            .map(|(_, name, _)| *name)
            .unwrap_or(unit.name())
    }

    fn symbol(&self, unit: Unit) -> &str {
        self.labels
            .iter()
            .find(|(u, _, _)| *u == unit)
            .map(|(_, _, symbol)| *symbol)
            .unwrap_or(unit.symbol())
    }
}

impl SensorHub for MockHub {
    fn poll(&mut self) -> SensorEvent {
        self.events.pop_front().unwrap_or(SensorEvent::Idle)
    }

    fn issue_recalibration(&mut self, reference_ppm: u16) -> Result<(), SensorError> {
        let _ = self.recalibrations.push(reference_ppm);
        self.recalibration_result.clone()
    }

    fn reset_all(&mut self) {
        self.resets += 1;
        self.cursor = 0;
    }

    fn reinit(&mut self) {
        self.reinits += 1;
    }

    fn set_sample_interval(&mut self, secs: u16) {
        self.sample_interval = Some(secs);
    }
}

/// Board double with a manual clock that only advances through delays.
pub struct MockBoard {
    nanos: u64,
    pending: [bool; 3],
    latched: [bool; 3],
    pub tones: Vec<(u32, u32), 32>,
    pub mutes: usize,
    pub suspends: Vec<Duration, 8>,
}

impl MockBoard {
    pub fn new() -> Self {
        Self {
            nanos: 0,
            pending: [false; 3],
            latched: [false; 3],
            tones: Vec::new(),
            mutes: 0,
            suspends: Vec::new(),
        }
    }

    /// Press a button; it is reported by the next [`Buttons::update`].
    pub fn press(&mut self, button: Button) {
        self.pending[button.index()] = true;
    }

    pub fn advance(&mut self, duration: Duration) {
        self.nanos += duration.as_micros() * 1000;
    }
}

impl Buttons for MockBoard {
    fn update(&mut self) {
        self.latched = self.pending;
        self.pending = [false; 3];
    }

    fn is_pressed(&self, button: Button) -> bool {
        self.latched[button.index()]
    }

    fn was_pressed(&self, button: Button) -> bool {
        self.latched[button.index()]
    }
}

impl Buzzer for MockBoard {
    fn tone(&mut self, freq_hz: u32, duration_ms: u32) {
        let _ = self.tones.push((freq_hz, duration_ms));
    }

    fn mute(&mut self) {
        self.mutes += 1;
    }
}

impl PowerControl for MockBoard {
    fn suspend(&mut self, duration: Duration) {
        let _ = self.suspends.push(duration);
    }
}

impl Clock for MockBoard {
    fn now(&self) -> Instant {
        Instant::from_micros(self.nanos / 1000)
    }
}

impl DelayNs for MockBoard {
    fn delay_ns(&mut self, ns: u32) {
        self.nanos += u64::from(ns);
    }
}

#[derive(Default)]
pub struct MockPin {
    pub high: Option<bool>,
}

impl ErrorType for MockPin {
    type Error = Infallible;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.high = Some(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.high = Some(true);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelFault;

/// Panel double backed by a [`FrameBuffer`].
pub struct MockPanel {
    pub frame: FrameBuffer,
    pub rotation: Option<Rotation>,
    pub full_submits: u32,
    pub partial_submits: u32,
    pub presents: Vec<bool, 8>,
    pub power_offs: u32,
    pub fail_submits: bool,
    pub fail_power: bool,
}

impl MockPanel {
    pub fn new() -> Self {
        Self {
            frame: FrameBuffer::new(),
            rotation: None,
            full_submits: 0,
            partial_submits: 0,
            presents: Vec::new(),
            power_offs: 0,
            fail_submits: false,
            fail_power: false,
        }
    }
}

impl OriginDimensions for MockPanel {
    fn size(&self) -> Size {
        self.frame.size()
    }
}

impl DrawTarget for MockPanel {
    type Color = BinaryColor;
    type Error = PanelFault;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        self.frame.draw_iter(pixels).map_err(|e| match e {})
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        self.frame.fill_solid(area, color).map_err(|e| match e {})
    }
}

impl EinkPanel for MockPanel {
    fn set_rotation(&mut self, rotation: Rotation) {
        self.rotation = Some(rotation);
    }

    fn submit(&mut self, window: RefreshWindow) -> Result<(), Self::Error> {
        if self.fail_submits {
            return Err(PanelFault);
        }
        match window {
            RefreshWindow::Full => self.full_submits += 1,
            RefreshWindow::Partial => self.partial_submits += 1,
        }
        Ok(())
    }

    fn present(&mut self, charge_hint: bool) -> Result<(), Self::Error> {
        if self.fail_power {
            return Err(PanelFault);
        }
        let _ = self.presents.push(charge_hint);
        Ok(())
    }

    fn power_off(&mut self) -> Result<(), Self::Error> {
        if self.fail_power {
            return Err(PanelFault);
        }
        self.power_offs += 1;
        Ok(())
    }
}

/// Call `f` with every ordering of `items` (Heap's algorithm).
pub fn for_each_permutation(items: &[Unit], mut f: impl FnMut(&[Unit])) {
    let mut items: Vec<Unit, 16> = items.iter().copied().collect();
    let n = items.len();
    let mut counters = [0usize; 16];

    f(items.as_slice());
    let mut i = 1;
    while i < n {
        if counters[i] < i {
            if i % 2 == 0 {
                items.swap(0, i);
            } else {
                items.swap(counters[i], i);
            }
            f(items.as_slice());
            counters[i] += 1;
            i = 1;
        } else {
            counters[i] = 0;
            i += 1;
        }
    }
}
