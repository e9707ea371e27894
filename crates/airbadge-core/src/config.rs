//! Compile-time configuration for the badge
//!
//! Defaults mirror the values the badge ships with. There is no configuration
//! storage: a firmware crate builds a [`BadgeConfig`] once at start-up and may
//! override individual fields with the `with_*` builders.

use embassy_time::Duration;

/// Data events accumulated before the values screen is redrawn.
pub const MAX_SAMPLES_COUNT: u16 = 8;

/// Sensor sample interval handed to the sensor layer, in seconds.
pub const SAMPLE_INTERVAL_SECS: u16 = 2;

/// Deep sleep duration between wake-ups, in seconds.
pub const DEEP_SLEEP_SECS: u64 = 600;

/// PM2.5 level (µg/m³) above which the alarm sounds.
pub const PM25_ALARM_LEVEL: u16 = 50;

/// CO2 level (ppm) above which the alarm sounds. Used for every primary unit
/// other than PM2.5.
pub const CO2_ALARM_LEVEL: u16 = 2000;

/// Minimum interval between two partial-window redraws of the same screen.
pub const PARTIAL_REFRESH_INTERVAL_MS: u64 = 1000;

/// Reference concentration (ppm) sent with a CO2 recalibration command.
pub const CALIBRATION_REFERENCE_PPM: u16 = 400;

/// Initial value of the calibration session countdown.
pub const CALIBRATION_COUNTDOWN_START: u16 = 60;

/// Runtime view of the badge configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BadgeConfig {
    /// Data events between two values redraws (must be at least 2)
    pub max_samples: u16,
    /// Sensor sample interval in seconds
    pub sample_interval_secs: u16,
    /// Whether the power cycle suspends the processor after a redraw
    pub deep_sleep: bool,
    /// How long the processor sleeps before the wake timer fires
    pub sleep_duration: Duration,
    /// Whether the high-level alarm pulse is enabled
    pub alarm_enabled: bool,
    /// PM2.5 alarm trigger level
    pub pm25_alarm_level: u16,
    /// CO2 (and default) alarm trigger level
    pub co2_alarm_level: u16,
    /// Rate limit for partial-window redraws
    pub partial_refresh_interval: Duration,
    /// Reference value for the recalibration command
    pub calibration_reference_ppm: u16,
    /// Optional upper bound on the calibration prompt. `None` waits for the user.
    pub calibration_timeout: Option<Duration>,
    /// Drive the external indicator LED rail off at start-up
    pub disable_indicator_led: bool,
}

impl Default for BadgeConfig {
    fn default() -> Self {
        Self {
            max_samples: MAX_SAMPLES_COUNT,
            sample_interval_secs: SAMPLE_INTERVAL_SECS,
            deep_sleep: true,
            sleep_duration: Duration::from_secs(DEEP_SLEEP_SECS),
            alarm_enabled: true,
            pm25_alarm_level: PM25_ALARM_LEVEL,
            co2_alarm_level: CO2_ALARM_LEVEL,
            partial_refresh_interval: Duration::from_millis(PARTIAL_REFRESH_INTERVAL_MS),
            calibration_reference_ppm: CALIBRATION_REFERENCE_PPM,
            calibration_timeout: None,
            disable_indicator_led: true,
        }
    }
}

impl BadgeConfig {
    /// Set the number of data events between redraws.
    ///
    /// Values below 2 are raised to 2 so the calibration cancel path can
    /// still fast-forward the counter.
    pub fn with_max_samples(mut self, max_samples: u16) -> Self {
        self.max_samples = max_samples.max(2);
        self
    }

    pub fn with_deep_sleep(mut self, enabled: bool) -> Self {
        self.deep_sleep = enabled;
        self
    }

    pub fn with_sleep_duration(mut self, duration: Duration) -> Self {
        self.sleep_duration = duration;
        self
    }

    pub fn with_alarm(mut self, enabled: bool) -> Self {
        self.alarm_enabled = enabled;
        self
    }

    pub fn with_calibration_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.calibration_timeout = timeout;
        self
    }

    pub fn with_partial_refresh_interval(mut self, interval: Duration) -> Self {
        self.partial_refresh_interval = interval;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_shipping_constants() {
        let config = BadgeConfig::default();
        assert_eq!(config.max_samples, 8);
        assert_eq!(config.sleep_duration, Duration::from_secs(600));
        assert_eq!(config.partial_refresh_interval, Duration::from_millis(1000));
        assert_eq!(config.calibration_reference_ppm, 400);
        assert!(config.calibration_timeout.is_none());
    }

    #[test]
    fn test_max_samples_has_a_floor() {
        let config = BadgeConfig::default().with_max_samples(0);
        assert_eq!(config.max_samples, 2);
    }
}
