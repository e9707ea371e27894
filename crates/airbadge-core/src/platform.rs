//! Board collaborators: buttons, buzzer, power rail and clock
//!
//! Debouncing, the speaker PWM and the sleep controller belong to the board
//! HAL. The badge only needs the narrow interfaces below, bundled into
//! [`Platform`] so the driver loop takes a single board handle.

use embassy_time::{Duration, Instant};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use log::warn;

/// Alarm tone frequency in Hz.
pub const ALARM_TONE_HZ: u32 = 2000;

/// Alarm tone duration in milliseconds.
pub const ALARM_TONE_MS: u32 = 50;

/// Busy-wait between starting the tone and muting the speaker.
pub const ALARM_MUTE_GUARD_MS: u32 = 30;

/// Physical buttons of the badge's three-way switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    Up,
    Middle,
    Down,
}

impl Button {
    pub const ALL: [Button; 3] = [Button::Up, Button::Middle, Button::Down];

    /// Index into per-button state arrays.
    pub const fn index(self) -> usize {
        match self {
            Button::Up => 0,
            Button::Middle => 1,
            Button::Down => 2,
        }
    }
}

pub trait Buttons {
    /// Sample the debounced button state for this iteration.
    fn update(&mut self);

    /// Whether the button is held right now.
    ///
    /// The driver loop reacts to edges only; the level is for board code
    /// such as wake-up or boot-time checks.
    fn is_pressed(&self, button: Button) -> bool;

    /// Whether the button went down since the previous [`update`](Self::update).
    fn was_pressed(&self, button: Button) -> bool;
}

pub trait Buzzer {
    /// Start a tone. The board stops it after `duration_ms` on its own.
    fn tone(&mut self, freq_hz: u32, duration_ms: u32);

    fn mute(&mut self);
}

pub trait PowerControl {
    /// Suspend the processor and wake after `duration`.
    ///
    /// On battery power this call does not return: the badge reboots on the
    /// wake timer. It returns immediately when external (USB) power keeps the
    /// processor running.
    fn suspend(&mut self, duration: Duration);
}

pub trait Clock {
    fn now(&self) -> Instant;
}

/// Everything the badge needs from the board.
pub trait Platform: Buttons + Buzzer + PowerControl + Clock + DelayNs {}

impl<T> Platform for T where T: Buttons + Buzzer + PowerControl + Clock + DelayNs {}

/// Emit one audible alarm pulse: fixed tone, fixed duration, short mute guard.
pub fn alarm_pulse<B: Buzzer + DelayNs + ?Sized>(board: &mut B) {
    board.tone(ALARM_TONE_HZ, ALARM_TONE_MS);
    board.delay_ms(ALARM_MUTE_GUARD_MS);
    board.mute();
}

/// Drive the external indicator LED rail off to save battery.
///
/// The LED is wired active-low, so "off" means driving the pin high.
pub fn disable_indicator_led<P: OutputPin>(pin: &mut P) {
    if let Err(e) = pin.set_high() {
        warn!("Failed to switch off the indicator LED: {:?}", e);
    }
}
