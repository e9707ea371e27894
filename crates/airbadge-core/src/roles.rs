//! Unit priority resolution
//!
//! Maps the unordered set of active units onto the five display roles. Every
//! resolution pass starts from a clean slate, so a unit that disappears
//! between passes simply stops being assigned.
//!
//! # Precedence
//!
//! Each role keeps the rank of the claim that filled it and only accepts a
//! claim of strictly higher rank. This makes the final assignment depend on
//! which units are present, not on the order the registry yields them, with
//! one deliberate exception: PM2.5 is moved into `secondary` only when CO2
//! displaces it from `primary`, which can only happen when PM2.5 was seen
//! first.
//!
//! | role          | claims, highest rank first                          |
//! |---------------|-----------------------------------------------------|
//! | `primary`     | CO2, PM2.5, ambient temperature, sensor temperature |
//! | `secondary`   | displaced PM2.5, PM10, altitude                     |
//! | `temperature` | ambient temperature, sensor temperature             |
//! | `humidity`    | ambient humidity, sensor humidity                   |
//! | `auxiliary`   | pressure, sensor temperature                        |

use log::debug;

use crate::sensors::{Reading, Unit, UnitRegistry};

/// One of the five display slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Primary,
    Secondary,
    Temperature,
    Humidity,
    Auxiliary,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Primary,
        Role::Secondary,
        Role::Temperature,
        Role::Humidity,
        Role::Auxiliary,
    ];
}

/// Which unit currently fills each display role.
///
/// `None` means "no usable value", never zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoleAssignment {
    pub primary: Option<Unit>,
    pub secondary: Option<Unit>,
    pub temperature: Option<Unit>,
    pub humidity: Option<Unit>,
    pub auxiliary: Option<Unit>,
}

impl RoleAssignment {
    pub const fn get(&self, role: Role) -> Option<Unit> {
        match role {
            Role::Primary => self.primary,
            Role::Secondary => self.secondary,
            Role::Temperature => self.temperature,
            Role::Humidity => self.humidity,
            Role::Auxiliary => self.auxiliary,
        }
    }

    /// Reset every role to unassigned.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        Role::ALL.iter().all(|role| self.get(*role).is_none())
    }

    /// Copy the current value of every assigned role out of the registry.
    pub fn snapshot<R: UnitRegistry + ?Sized>(&self, registry: &R) -> RoleSnapshot {
        let capture = |unit: Option<Unit>| unit.map(|unit| Reading::capture(registry, unit));
        RoleSnapshot {
            primary: capture(self.primary),
            secondary: capture(self.secondary),
            temperature: capture(self.temperature),
            humidity: capture(self.humidity),
            auxiliary: capture(self.auxiliary),
        }
    }
}

/// Values behind a [`RoleAssignment`], frozen for drawing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoleSnapshot {
    pub primary: Option<Reading>,
    pub secondary: Option<Reading>,
    pub temperature: Option<Reading>,
    pub humidity: Option<Reading>,
    pub auxiliary: Option<Reading>,
}

impl RoleSnapshot {
    pub fn get(&self, role: Role) -> Option<&Reading> {
        match role {
            Role::Primary => self.primary.as_ref(),
            Role::Secondary => self.secondary.as_ref(),
            Role::Temperature => self.temperature.as_ref(),
            Role::Humidity => self.humidity.as_ref(),
            Role::Auxiliary => self.auxiliary.as_ref(),
        }
    }
}

/// A role being filled during one pass, with the rank of its current claim.
#[derive(Debug, Clone, Copy, Default)]
struct Slot {
    unit: Option<Unit>,
    rank: u8,
}

impl Slot {
    /// Claim the slot if it is empty or held by a lower-ranked claim.
    ///
    /// Returns the unit that was displaced, if any.
    fn claim(&mut self, unit: Unit, rank: u8) -> Option<Unit> {
        if self.unit.is_some() && rank <= self.rank {
            return None;
        }
        self.rank = rank;
        self.unit.replace(unit)
    }
}

/// Role slots of a single resolution pass.
#[derive(Debug, Default)]
struct ResolutionPass {
    primary: Slot,
    secondary: Slot,
    temperature: Slot,
    humidity: Slot,
    auxiliary: Slot,
}

impl ResolutionPass {
    fn observe(&mut self, unit: Unit) {
        match unit {
            Unit::Co2 => {
                // A PM2.5 pushed out of the main field moves to the minor one.
                if self.primary.claim(Unit::Co2, 4) == Some(Unit::Pm25) {
                    self.secondary.claim(Unit::Pm25, 3);
                }
            }
            Unit::Pm25 => {
                self.primary.claim(Unit::Pm25, 3);
            }
            Unit::Pm10 => {
                self.secondary.claim(Unit::Pm10, 2);
            }
            Unit::Temperature => {
                self.temperature.claim(unit, 2);
                self.primary.claim(unit, 2);
            }
            Unit::Co2Temperature => {
                self.temperature.claim(unit, 1);
                self.primary.claim(unit, 1);
                self.auxiliary.claim(unit, 1);
            }
            Unit::Humidity => {
                self.humidity.claim(unit, 2);
            }
            Unit::Co2Humidity => {
                self.humidity.claim(unit, 1);
            }
            Unit::Pressure => {
                self.auxiliary.claim(unit, 2);
            }
            Unit::Altitude => {
                self.secondary.claim(unit, 1);
            }
            Unit::Pm1 | Unit::Pm4 | Unit::Gas => {}
        }
    }

    fn finish(self) -> RoleAssignment {
        RoleAssignment {
            primary: self.primary.unit,
            secondary: self.secondary.unit,
            temperature: self.temperature.unit,
            humidity: self.humidity.unit,
            auxiliary: self.auxiliary.unit,
        }
    }
}

/// Run one resolution pass over the registry.
///
/// Consumes the registry's unit iteration until it reports the end of the
/// pass and returns a fresh assignment; nothing from earlier passes survives.
pub fn resolve<R: UnitRegistry + ?Sized>(registry: &mut R) -> RoleAssignment {
    let mut pass = ResolutionPass::default();
    while let Some(unit) = registry.next_unit() {
        debug!(
            "{} \t: {} {}",
            registry.name(unit),
            registry.value(unit),
            registry.symbol(unit)
        );
        pass.observe(unit);
    }
    pass.finish()
}
