//! Sampling counter and alarm predicate
//!
//! Every data event outside calibration bumps a counter. When it reaches
//! `max_samples` the values screen is due for a redraw, the counter wraps to
//! zero, and the primary reading is checked against its alarm threshold.

use log::{debug, warn};

use crate::config::BadgeConfig;
use crate::sensors::{Reading, Unit};

/// What the driver should do after a data event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleDecision {
    /// Calibration in progress, nothing counted
    Suspended,
    /// Counted, not enough samples yet
    Counting(u16),
    /// Enough samples accumulated: redraw the values screen
    Redraw { alarm: bool },
}

/// Per-unit alarm levels. Only the tag holding the primary role is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlarmThresholds {
    pub enabled: bool,
    pub pm25: u16,
    /// Level for every primary unit other than PM2.5
    pub default: u16,
}

impl AlarmThresholds {
    pub fn from_config(config: &BadgeConfig) -> Self {
        Self {
            enabled: config.alarm_enabled,
            pm25: config.pm25_alarm_level,
            default: config.co2_alarm_level,
        }
    }

    pub fn level_for(&self, unit: Unit) -> u16 {
        match unit {
            Unit::Pm25 => self.pm25,
            _ => self.default,
        }
    }

    /// Whether the primary reading is above its level.
    ///
    /// The value is truncated to a whole number before the comparison.
    pub fn exceeded(&self, primary: Option<&Reading>) -> bool {
        let Some(reading) = primary else {
            return false;
        };
        self.enabled && reading.whole_value() > self.level_for(reading.unit)
    }
}

pub struct SamplingAggregator {
    count: u16,
    max_samples: u16,
    thresholds: AlarmThresholds,
}

impl SamplingAggregator {
    pub fn new(config: &BadgeConfig) -> Self {
        Self {
            count: 0,
            max_samples: config.max_samples.max(2),
            thresholds: AlarmThresholds::from_config(config),
        }
    }

    pub fn on_data(&mut self, calibrating: bool, primary: Option<&Reading>) -> SampleDecision {
        if calibrating {
            return SampleDecision::Suspended;
        }

        self.count += 1;
        if self.count < self.max_samples {
            return SampleDecision::Counting(self.count);
        }

        self.count = 0;
        let alarm = self.thresholds.exceeded(primary);
        if alarm {
            if let Some(reading) = primary {
                warn!(
                    "{} at {} {} above alarm level {}",
                    reading.name,
                    reading.whole_value(),
                    reading.symbol,
                    self.thresholds.level_for(reading.unit)
                );
            }
        }
        debug!("Sample threshold reached, alarm: {}", alarm);
        SampleDecision::Redraw { alarm }
    }

    /// Jump to two samples short of a redraw.
    pub fn fast_forward(&mut self) {
        self.count = self.max_samples - 2;
    }

    pub fn reset(&mut self) {
        self.count = 0;
    }

    pub fn count(&self) -> u16 {
        self.count
    }

    pub fn max_samples(&self) -> u16 {
        self.max_samples
    }

    pub fn thresholds(&self) -> &AlarmThresholds {
        &self.thresholds
    }
}
