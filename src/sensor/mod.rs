//! L4 — Sensor Protocol: TCS3472 register-level operations layered on the
//! bit engine, plus the typed outcome codes callers see instead of the raw
//! packed `i32` the original design returned.

#[cfg(feature = "hal")]
pub mod hal;
pub mod tcs3472;

#[cfg(feature = "hal")]
pub use hal::SingleBus;
pub use tcs3472::Tcs3472Array;

use crate::consts::flags;

/// One bit per packed outcome flag from spec.md §6, stored densely rather
/// than as a bitflags dependency — the teacher defines its register
/// bitfields by hand the same way (e.g. `gpio::Mode`/`Direction` via
/// `enum_from_primitive!`, or the raw bit constants in `pmc`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OutcomeFlags(u32);

impl OutcomeFlags {
    pub const NONE: OutcomeFlags = OutcomeFlags(0);
    pub const ID: OutcomeFlags = OutcomeFlags(flags::FLAG_ID);
    pub const INCOMPLETE_CONVERSION: OutcomeFlags = OutcomeFlags(flags::FLAG_INCOMPLETE_CONVERSION);
    pub const SATURATED: OutcomeFlags = OutcomeFlags(flags::FLAG_SATURATED);
    pub const DEVICE_FATAL: OutcomeFlags = OutcomeFlags(flags::DEVICE_FATAL);
    pub const USB: OutcomeFlags = OutcomeFlags(flags::USB);

    #[inline]
    pub fn contains(self, other: OutcomeFlags) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn bits(self) -> u32 {
        self.0
    }
}

impl core::ops::BitOr for OutcomeFlags {
    type Output = OutcomeFlags;
    #[inline]
    fn bitor(self, rhs: OutcomeFlags) -> OutcomeFlags {
        OutcomeFlags(self.0 | rhs.0)
    }
}

impl core::ops::BitOrAssign for OutcomeFlags {
    #[inline]
    fn bitor_assign(&mut self, rhs: OutcomeFlags) {
        self.0 |= rhs.0;
    }
}

/// A typed view of a sensor-protocol-level operation's result: which
/// packed flags applied, and which buses were affected.
///
/// `bus_mask` is meaningful only alongside a flag that is inherently
/// per-bus (`INCOMPLETE_CONVERSION`, `SATURATED`, `ID`); it is `0` for an
/// all-clear outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SensorOutcome {
    pub flags: OutcomeFlags,
    pub bus_mask: u16,
}

impl SensorOutcome {
    pub const fn clean() -> SensorOutcome {
        SensorOutcome { flags: OutcomeFlags::NONE, bus_mask: 0 }
    }

    pub fn is_clean(self) -> bool {
        self.flags.is_empty() && self.bus_mask == 0
    }
}

impl From<SensorOutcome> for i32 {
    fn from(outcome: SensorOutcome) -> i32 {
        (outcome.flags.bits() | outcome.bus_mask as u32) as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_outcome_round_trips_to_zero() {
        assert_eq!(i32::from(SensorOutcome::clean()), 0);
    }

    #[test]
    fn flags_combine_with_bitor() {
        let combined = OutcomeFlags::SATURATED | OutcomeFlags::INCOMPLETE_CONVERSION;
        assert!(combined.contains(OutcomeFlags::SATURATED));
        assert!(combined.contains(OutcomeFlags::INCOMPLETE_CONVERSION));
        assert!(!combined.contains(OutcomeFlags::ID));
    }
}
