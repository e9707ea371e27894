//! Hardware-independent core library for airbadge
//!
//! This crate contains the coordination layer of the airbadge e-ink
//! environmental sensor badge: unit priority resolution, sample counting and
//! alarms, the display state machine, the calibration workflow and the
//! sleep/wake power cycle.
//!
//! Sensor drivers, the e-ink panel driver and the board HAL are external
//! collaborators reached through the traits in [`sensors`], [`display`] and
//! [`platform`]. The crate is `#![no_std]` so it compiles on the badge and on
//! desktop hosts (for the simulator and tests).

#![no_std]

pub mod badge;
pub mod calibration;
pub mod config;
pub mod display;
pub mod framebuffer;
pub mod platform;
pub mod power;
pub mod roles;
pub mod sampling;
pub mod screens;
pub mod sensors;

#[cfg(test)]
pub(crate) mod test_support;

pub use badge::{Badge, BadgeError, Mode};
pub use calibration::{CalibrationExit, CalibrationSession};
pub use config::BadgeConfig;
pub use display::{DisplayManager, EinkPanel, RedrawOutcome, RefreshWindow, Rotation, Screen};
pub use framebuffer::FrameBuffer;
pub use platform::{Button, Buttons, Buzzer, Clock, Platform, PowerControl};
pub use power::{CycleOutcome, PowerStateMachine};
pub use roles::{Role, RoleAssignment, RoleSnapshot};
pub use sampling::{AlarmThresholds, SampleDecision, SamplingAggregator};
pub use screens::Frame;
pub use sensors::{Reading, SensorError, SensorEvent, SensorHub, Unit, UnitRegistry};
