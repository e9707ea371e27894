//! Sensor layer interface
//!
//! The sensor drivers (bus transport, per-chip decoding, auto-detection) live
//! outside this crate. The core only sees a registry of currently active
//! measurement channels ("units") and a hub that advances background I/O.

use core::fmt::Write;

use heapless::String;
use thiserror_no_std::Error;

/// Capacity of the name and symbol strings copied into a [`Reading`].
pub const LABEL_CAPACITY: usize = 16;

/// Measurement unit tag.
///
/// The "no unit" tag of the sensor layer is represented as `Option::None`
/// wherever a unit may be missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Unit {
    Co2,
    Pm1,
    Pm25,
    Pm4,
    Pm10,
    /// Ambient temperature
    Temperature,
    /// Ambient relative humidity
    Humidity,
    /// Temperature reported by the CO2 sensor die
    Co2Temperature,
    /// Humidity reported by the CO2 sensor die
    Co2Humidity,
    Pressure,
    Altitude,
    Gas,
}

impl Unit {
    /// Every unit tag, in declaration order.
    pub const ALL: [Unit; 12] = [
        Unit::Co2,
        Unit::Pm1,
        Unit::Pm25,
        Unit::Pm4,
        Unit::Pm10,
        Unit::Temperature,
        Unit::Humidity,
        Unit::Co2Temperature,
        Unit::Co2Humidity,
        Unit::Pressure,
        Unit::Altitude,
        Unit::Gas,
    ];

    /// Short display name.
    pub const fn name(self) -> &'static str {
        match self {
            Unit::Co2 => "CO2",
            Unit::Pm1 => "PM1",
            Unit::Pm25 => "PM2.5",
            Unit::Pm4 => "PM4",
            Unit::Pm10 => "PM10",
            Unit::Temperature => "Temp",
            Unit::Humidity => "Humi",
            Unit::Co2Temperature => "CO2T",
            Unit::Co2Humidity => "CO2H",
            Unit::Pressure => "Press",
            Unit::Altitude => "Alt",
            Unit::Gas => "Gas",
        }
    }

    /// Physical unit symbol.
    pub const fn symbol(self) -> &'static str {
        match self {
            Unit::Co2 => "ppm",
            Unit::Pm1 | Unit::Pm25 | Unit::Pm4 | Unit::Pm10 => "ug/m3",
            Unit::Temperature | Unit::Co2Temperature => "C",
            Unit::Humidity | Unit::Co2Humidity => "%",
            Unit::Pressure => "hPa",
            Unit::Altitude => "m",
            Unit::Gas => "Ohm",
        }
    }

    pub const fn is_temperature(self) -> bool {
        matches!(self, Unit::Temperature | Unit::Co2Temperature)
    }

    pub const fn is_humidity(self) -> bool {
        matches!(self, Unit::Humidity | Unit::Co2Humidity)
    }
}

/// Outcome of one sensor-layer poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorEvent {
    /// A complete set of readings is available in the registry
    Data,
    /// The sample interval elapsed without any usable reading
    Absent,
    /// Background I/O advanced, nothing to report yet
    Idle,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SensorError {
    #[error("No sensor able to handle {operation} was detected")]
    NotDetected { operation: &'static str },
    #[error("{sensor} rejected command: {details}")]
    CommandRejected {
        sensor: &'static str,
        details: &'static str,
    },
    #[error("Bus error talking to {sensor}: {details}")]
    Bus {
        sensor: &'static str,
        details: &'static str,
    },
}

/// Read-only view of the currently active measurement channels.
///
/// The registry owns unit lifetime. Callers keep only [`Unit`] tags across
/// events, never borrowed names or symbols.
pub trait UnitRegistry {
    /// Next active unit of the current pass.
    ///
    /// Returns `None` once the pass is exhausted; the following call starts a
    /// new pass from the first unit.
    fn next_unit(&mut self) -> Option<Unit>;

    /// Latest value of a unit. Meaningless for units that are not active.
    fn value(&self, unit: Unit) -> f32;

    fn name(&self, unit: Unit) -> &str {
        unit.name()
    }

    fn symbol(&self, unit: Unit) -> &str {
        unit.symbol()
    }
}

/// The sensor layer as seen by the badge driver loop.
pub trait SensorHub: UnitRegistry {
    /// Advance background sensor I/O and report what happened.
    fn poll(&mut self) -> SensorEvent;

    /// Send a forced recalibration command with the given reference (ppm).
    fn issue_recalibration(&mut self, reference_ppm: u16) -> Result<(), SensorError>;

    /// Forget every detected unit, sensor and cached variable.
    fn reset_all(&mut self);

    /// Re-run sensor detection as if the badge had just booted.
    fn reinit(&mut self);

    /// Configure the sensor sample interval.
    fn set_sample_interval(&mut self, secs: u16);
}

/// Snapshot of one unit copied out of the registry.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub unit: Unit,
    pub name: String<LABEL_CAPACITY>,
    pub value: f32,
    pub symbol: String<LABEL_CAPACITY>,
}

impl Reading {
    /// Copy the `(name, value, symbol)` triple of `unit` out of the registry.
    pub fn capture<R: UnitRegistry + ?Sized>(registry: &R, unit: Unit) -> Self {
        Self {
            unit,
            name: bounded(registry.name(unit)),
            value: registry.value(unit),
            symbol: bounded(registry.symbol(unit)),
        }
    }

    /// Value truncated to an unsigned integer, as shown in zero-padded fields.
    ///
    /// Negative and NaN values saturate to 0.
    pub fn whole_value(&self) -> u16 {
        self.value as u16
    }
}

/// Copy `text` into a bounded string, truncating on a char boundary.
pub(crate) fn bounded<const N: usize>(text: &str) -> String<N> {
    let mut out = String::new();
    for c in text.chars() {
        if out.write_char(c).is_err() {
            break;
        }
    }
    out
}
