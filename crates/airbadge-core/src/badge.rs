//! The badge driver loop
//!
//! [`Badge`] owns every collaborator and all mutable state. The firmware (or
//! the simulator) calls [`Badge::start`] once and then [`Badge::step`] in a
//! loop; each step samples the buttons, polls the sensor layer once and reacts
//! according to the current [`Mode`].

use core::fmt::{Debug, Write};

use heapless::String;
use log::{debug, info, warn};
use thiserror_no_std::Error;

use crate::calibration::{CalibrationExit, CalibrationSession, recalibrate};
use crate::config::BadgeConfig;
use crate::display::{DisplayManager, EinkPanel, RedrawOutcome};
use crate::platform::{Button, Platform, alarm_pulse};
use crate::power::PowerStateMachine;
use crate::roles::{self, RoleAssignment, RoleSnapshot};
use crate::sampling::{SampleDecision, SamplingAggregator};
use crate::screens::Frame;
use crate::sensors::{Reading, SensorEvent, SensorHub, Unit, bounded};

#[derive(Error, Debug)]
pub enum BadgeError {
    #[error("Invalid configuration: {0}")]
    Config(String<64>),
    #[error("Display error: {0}")]
    Display(String<64>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Monitoring,
    Calibrating(CalibrationSession),
}

pub struct Badge<S, P, B> {
    sensors: S,
    display: DisplayManager<P>,
    board: B,
    config: BadgeConfig,
    roles: RoleAssignment,
    sampler: SamplingAggregator,
    power: PowerStateMachine,
    mode: Mode,
}

impl<S, P, B> Badge<S, P, B>
where
    S: SensorHub,
    P: EinkPanel,
    P::Error: Debug,
    B: Platform,
{
    pub fn new(sensors: S, panel: P, board: B, config: BadgeConfig) -> Result<Self, BadgeError> {
        if config.max_samples < 2 {
            return Err(BadgeError::Config(bounded("max_samples must be at least 2")));
        }
        if config.sample_interval_secs == 0 {
            return Err(BadgeError::Config(bounded("sample interval must be non-zero")));
        }

        Ok(Self {
            sensors,
            display: DisplayManager::new(panel, config.partial_refresh_interval),
            board,
            roles: RoleAssignment::default(),
            sampler: SamplingAggregator::new(&config),
            power: PowerStateMachine::new(&config),
            config,
            mode: Mode::Monitoring,
        })
    }

    /// Configure the sensor layer and show the splash screen.
    pub fn start(&mut self) -> Result<(), BadgeError> {
        self.sensors
            .set_sample_interval(self.config.sample_interval_secs);

        let now = self.board.now();
        if self.display.show(&Frame::Home, now) == RedrawOutcome::Failed {
            let mut details = String::new();
            let _ = write!(details, "splash screen at {} ms", now.as_millis());
            return Err(BadgeError::Display(details));
        }

        info!(
            "Badge started: {} samples per redraw, deep sleep {}",
            self.config.max_samples,
            if self.config.deep_sleep { "on" } else { "off" }
        );
        Ok(())
    }

    /// One cooperative iteration of the main loop.
    pub fn step(&mut self) {
        self.board.update();
        match self.mode {
            Mode::Monitoring => self.monitoring_step(),
            Mode::Calibrating(session) => self.calibration_step(session),
        }
    }

    fn monitoring_step(&mut self) {
        if self.board.was_pressed(Button::Up) {
            self.enter_calibration();
            return;
        }
        if self.board.was_pressed(Button::Middle) {
            self.user_refresh();
        }

        match self.sensors.poll() {
            SensorEvent::Data => self.on_data(),
            SensorEvent::Absent => self.on_absent(),
            SensorEvent::Idle => {}
        }
    }

    fn on_data(&mut self) {
        let snapshot = self.resolve_roles();
        if let SampleDecision::Redraw { alarm } =
            self.sampler.on_data(false, snapshot.primary.as_ref())
        {
            let now = self.board.now();
            self.display.request(&Frame::Values(snapshot), now);
            if alarm {
                alarm_pulse(&mut self.board);
            }
        }

        if self.display.draw_ready() {
            self.sleep();
        }
    }

    fn on_absent(&mut self) {
        warn!("No sensor data");
        if self.display.draw_ready() {
            self.sleep();
        } else {
            self.reset_state();
            let now = self.board.now();
            self.display
                .request(&Frame::Values(RoleSnapshot::default()), now);
        }
    }

    fn user_refresh(&mut self) {
        debug!("Manual refresh");
        let now = self.board.now();
        self.display.show(&Frame::Home, now);
        alarm_pulse(&mut self.board);

        let snapshot = self.roles.snapshot(&self.sensors);
        let now = self.board.now();
        self.display.request(&Frame::Values(snapshot), now);
    }

    fn enter_calibration(&mut self) {
        let now = self.board.now();
        let session = CalibrationSession::new(now);
        let prompt = self.prompt(&session);
        self.display.show(&prompt, now);
        self.mode = Mode::Calibrating(session);
    }

    fn calibration_step(&mut self, mut session: CalibrationSession) {
        match self.sensors.poll() {
            SensorEvent::Data => {
                let snapshot = self.resolve_roles();
                session.on_data();
                // Keeps counting and alarms suspended.
                self.sampler.on_data(true, snapshot.primary.as_ref());
            }
            SensorEvent::Absent => {
                warn!("No sensor data while calibrating");
                self.reset_state();
            }
            SensorEvent::Idle => {}
        }

        let now = self.board.now();
        match session.exit(&self.board, now, self.config.calibration_timeout) {
            Some(CalibrationExit::Confirm) => {
                let success = recalibrate(
                    &mut self.sensors,
                    &mut self.board,
                    self.config.calibration_reference_ppm,
                );
                let now = self.board.now();
                self.display
                    .show(&Frame::CalibrationResult { success }, now);
                self.mode = Mode::Monitoring;
            }
            Some(CalibrationExit::Cancel | CalibrationExit::TimedOut) => {
                info!("Calibration cancelled");
                self.display.request(&Frame::ShutdownNotice, now);
                self.sampler.fast_forward();
                self.mode = Mode::Monitoring;
            }
            None => {
                let prompt = self.prompt(&session);
                self.display.request(&prompt, now);
                self.mode = Mode::Calibrating(session);
            }
        }
    }

    fn prompt(&self, session: &CalibrationSession) -> Frame {
        Frame::CalibrationPrompt {
            co2: self.co2_reading(),
            countdown: session.countdown(),
        }
    }

    /// Live CO2 reading, if a CO2 sensor currently holds the primary role.
    fn co2_reading(&self) -> Option<Reading> {
        self.roles
            .primary
            .filter(|unit| *unit == Unit::Co2)
            .map(|unit| Reading::capture(&self.sensors, unit))
    }

    fn resolve_roles(&mut self) -> RoleSnapshot {
        self.roles = roles::resolve(&mut self.sensors);
        self.roles.snapshot(&self.sensors)
    }

    /// Forget every role, the sample count and the sensor registry.
    ///
    /// Runs on data absence and ahead of every sleep cycle.
    fn reset_state(&mut self) {
        self.roles.clear();
        self.sampler.reset();
        self.sensors.reset_all();
    }

    fn sleep(&mut self) {
        self.reset_state();
        self.power.sleep_cycle(
            &mut self.sensors,
            &mut self.display,
            &mut self.board,
        );
    }

    pub fn roles(&self) -> &RoleAssignment {
        &self.roles
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn sample_count(&self) -> u16 {
        self.sampler.count()
    }

    pub fn is_charging(&self) -> bool {
        self.power.is_charging()
    }

    pub fn sleep_cycles(&self) -> u32 {
        self.power.cycles()
    }

    pub fn config(&self) -> &BadgeConfig {
        &self.config
    }

    pub fn display(&self) -> &DisplayManager<P> {
        &self.display
    }

    pub fn sensors(&self) -> &S {
        &self.sensors
    }

    pub fn sensors_mut(&mut self) -> &mut S {
        &mut self.sensors
    }

    pub fn board(&self) -> &B {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut B {
        &mut self.board
    }
}
