//! Sleep/wake power cycle
//!
//! Once a values frame has reached the panel the badge has nothing left to do
//! until the next wake-up. The driver forgets its sensors, then the cycle
//! gives the panel a final refresh, powers it down and suspends the processor.
//!
//! # Wake paths
//!
//! - On battery, [`PowerControl::suspend`] never returns. The wake timer
//!   reboots the badge and the firmware starts from scratch.
//! - On USB power the processor keeps running and `suspend` returns at once.
//!   The badge then marks itself as charging and re-detects its sensors.

use core::fmt::Debug;

use embassy_time::Duration;
use log::info;

use crate::config::BadgeConfig;
use crate::display::{DisplayManager, EinkPanel};
use crate::platform::PowerControl;
use crate::sensors::SensorHub;

/// How the last sleep cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Deep sleep is disabled; only state was cleared
    StateCleared,
    /// Suspend returned because external power kept the processor awake
    ResumedOnExternalPower,
}

pub struct PowerStateMachine {
    deep_sleep: bool,
    sleep_duration: Duration,
    charging: bool,
    cycles: u32,
}

impl PowerStateMachine {
    pub fn new(config: &BadgeConfig) -> Self {
        Self {
            deep_sleep: config.deep_sleep,
            sleep_duration: config.sleep_duration,
            charging: false,
            cycles: 0,
        }
    }

    /// Run one sleep cycle after a completed redraw.
    ///
    /// The caller has already cleared the role and sample state. The
    /// completion signal is cleared last, whichever branch ran.
    pub fn sleep_cycle<S, P, B>(
        &mut self,
        sensors: &mut S,
        display: &mut DisplayManager<P>,
        board: &mut B,
    ) -> CycleOutcome
    where
        S: SensorHub + ?Sized,
        P: EinkPanel,
        P::Error: Debug,
        B: PowerControl + ?Sized,
    {
        self.cycles += 1;

        if !self.deep_sleep {
            display.clear_draw_ready();
            return CycleOutcome::StateCleared;
        }

        display.shut_down(self.charging);

        info!("Suspending for {} s", self.sleep_duration.as_secs());
        board.suspend(self.sleep_duration);

        // Still running: USB power kept the processor awake.
        self.charging = true;
        sensors.reinit();
        info!("Woke on external power, sensors re-initialised");

        display.clear_draw_ready();
        CycleOutcome::ResumedOnExternalPower
    }

    pub fn is_charging(&self) -> bool {
        self.charging
    }

    /// Number of sleep cycles run since start-up.
    pub fn cycles(&self) -> u32 {
        self.cycles
    }
}
