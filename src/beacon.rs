//! Advertising parameters for the beacon role. The beacon broadcasts
//! `BEACON_ID` as its complete local name in non-connectable bursts.

/// Legacy advertising data is 31 bytes. The flags element takes 3 and the
/// name element header 2.
pub const MAX_NAME_LEN: usize = 31 - 3 - 2;

/// SoftDevice advertising interval bounds, in 0.625 ms units.
pub const MIN_INTERVAL_UNITS: u32 = 0x0020;
pub const MAX_INTERVAL_UNITS: u32 = 0x4000;

/// Advertising interval in 0.625 ms units, clamped to what the SoftDevice
/// accepts.
pub const fn interval_units(interval_ms: u32) -> u32 {
	let units = interval_ms.saturating_mul(8) / 5;
	if units < MIN_INTERVAL_UNITS {
		MIN_INTERVAL_UNITS
	} else if units > MAX_INTERVAL_UNITS {
		MAX_INTERVAL_UNITS
	} else {
		units
	}
}

/// Burst length in 10 ms units. Zero would mean "advertise forever".
pub const fn timeout_units(burst_ms: u32) -> u16 {
	let units = burst_ms / 10;
	if units == 0 {
		1
	} else if units > u16::MAX as u32 {
		u16::MAX
	} else {
		units as u16
	}
}
