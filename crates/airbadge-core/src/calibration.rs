//! CO2 forced-recalibration workflow
//!
//! A [`CalibrationSession`] lives for as long as the badge shows the
//! calibration prompt. The driver checks [`CalibrationSession::exit`] on every
//! step and leaves the mode once it returns something.

use embassy_time::{Duration, Instant};
use embedded_hal::delay::DelayNs;
use log::{error, info, warn};

use crate::config::CALIBRATION_COUNTDOWN_START;
use crate::platform::{Button, Buttons, Buzzer, alarm_pulse};
use crate::sensors::SensorHub;

/// Pause after each confirmation beep.
pub const CONFIRM_PAUSE_MS: u32 = 300;

/// How a calibration session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationExit {
    /// Middle button: send the recalibration command
    Confirm,
    /// Down button
    Cancel,
    /// The configured timeout elapsed; handled like a cancel
    TimedOut,
}

/// State of one open calibration prompt.
///
/// The countdown is informational only. It is drawn on the prompt and drops
/// once per data event, but reaching zero never closes the session; only
/// [`exit`](Self::exit) does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalibrationSession {
    started: Instant,
    countdown: u16,
}

impl CalibrationSession {
    pub fn new(now: Instant) -> Self {
        info!("Entering CO2 calibration");
        Self {
            started: now,
            countdown: CALIBRATION_COUNTDOWN_START,
        }
    }

    /// Count one sensor data event seen during the session.
    pub fn on_data(&mut self) {
        self.countdown = self.countdown.saturating_sub(1);
    }

    pub fn countdown(&self) -> u16 {
        self.countdown
    }

    pub fn started(&self) -> Instant {
        self.started
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        now.checked_duration_since(self.started)
            .unwrap_or(Duration::from_ticks(0))
    }

    /// Exit guard, evaluated once per step after the buttons were sampled.
    ///
    /// Confirm wins over cancel when both buttons went down together.
    pub fn exit<B: Buttons + ?Sized>(
        &self,
        buttons: &B,
        now: Instant,
        timeout: Option<Duration>,
    ) -> Option<CalibrationExit> {
        if buttons.was_pressed(Button::Middle) {
            return Some(CalibrationExit::Confirm);
        }
        if buttons.was_pressed(Button::Down) {
            return Some(CalibrationExit::Cancel);
        }
        match timeout {
            Some(limit) if self.elapsed(now) >= limit => {
                warn!("Calibration prompt timed out after {} s", limit.as_secs());
                Some(CalibrationExit::TimedOut)
            }
            _ => None,
        }
    }
}

/// Acknowledge the confirmation audibly, then send the recalibration command.
///
/// Returns whether the sensor layer accepted the command.
pub fn recalibrate<S, B>(sensors: &mut S, board: &mut B, reference_ppm: u16) -> bool
where
    S: SensorHub + ?Sized,
    B: Buzzer + DelayNs + ?Sized,
{
    for _ in 0..2 {
        alarm_pulse(board);
        board.delay_ms(CONFIRM_PAUSE_MS);
    }

    match sensors.issue_recalibration(reference_ppm) {
        Ok(()) => {
            info!("CO2 recalibrated to {} ppm", reference_ppm);
            true
        }
        Err(e) => {
            error!("CO2 recalibration failed: {}", e);
            false
        }
    }
}
