//! Compile-time configuration for the beacon and the counting node.

use crate::{beacon::MAX_NAME_LEN, lorawan::region::Region, payload::CrowdThresholds};

/// Identifies this beacon in a multi-beacon system. The beacon advertises it
/// as its complete local name.
pub const BEACON_ID: &str = "DogHowler";

const _: () = assert!(!BEACON_ID.is_empty(), "BEACON_ID must not be empty");
const _: () = assert!(
	BEACON_ID.len() <= MAX_NAME_LEN,
	"BEACON_ID does not fit in one advertisement"
);

/// Blink the status LED after each advertising burst on the beacon, and on
/// join and uplink on the node (`status-led` feature).
pub const ENABLE_STATUS_LED: bool = cfg!(feature = "status-led");

/// Log every advertising burst on the beacon, every sighting and raw frame on
/// the node (`serial-debug` feature). Baseline logging is always on.
pub const ENABLE_SERIAL_DEBUG: bool = cfg!(feature = "serial-debug");

pub const BEACON_ADV_INTERVAL_MS: u32 = 100;
/// The beacon restarts advertising after each burst.
pub const BEACON_BURST_MS: u32 = 10_000;

pub const SCAN_WINDOW_MS: u64 = 10_000;
pub const UPLINK_INTERVAL_MS: u64 = 5 * 60 * 1000;

/// Advertisers weaker than this are not counted.
pub const RSSI_FLOOR: i8 = -90;

/// Capacity of the per-window advertiser set. Must be a power of two.
pub const MAX_TRACKED_DEVICES: usize = 128;

pub const CROWD_THRESHOLDS: CrowdThresholds = CrowdThresholds {
	moderate: 10,
	crowded: 25,
};

/// Fewer advertisers than this in both of two consecutive windows leaves the
/// environment unknown.
pub const ENVIRONMENT_MIN_DEVICES: usize = 3;

pub const UPLINK_PORT: u8 = 1;

pub const REGION: Region = Region::Au915;

pub const TX_POWER_DBM: i32 = 14;

pub const JOIN_BACKOFF_BASE_MS: u32 = 15_000;
pub const JOIN_BACKOFF_MAX_MS: u32 = 20 * 60 * 1000;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn beacon_id_is_set() {
		assert!(!BEACON_ID.is_empty());
		assert_eq!(BEACON_ID, "DogHowler");
	}

	#[test]
	fn tuning_is_consistent() {
		assert!(MAX_TRACKED_DEVICES.is_power_of_two());
		assert!(CROWD_THRESHOLDS.moderate < CROWD_THRESHOLDS.crowded);
		assert!(SCAN_WINDOW_MS < UPLINK_INTERVAL_MS);
		// A passive scan window must catch several advertisements
		assert!(BEACON_ADV_INTERVAL_MS as u64 * 4 <= SCAN_WINDOW_MS);
		assert!(JOIN_BACKOFF_BASE_MS <= JOIN_BACKOFF_MAX_MS);
		assert_eq!(ENABLE_STATUS_LED, cfg!(feature = "status-led"));
	}
}
