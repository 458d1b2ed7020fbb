//! BLE census: distinct advertisers per scan window, beacon sightings and the
//! static/mobile environment guess.

use crate::{
	credentials::MacAddress,
	payload::{CrowdLevel, CrowdThresholds, EnvironmentType, Uplink},
};
use heapless::FnvIndexSet;

/// Advertisers seen in one scan window. `N` must be a power of two.
pub struct ScanTally<const N: usize> {
	devices: FnvIndexSet<MacAddress, N>,
	beacon: Option<MacAddress>,
	beacon_rssi: Option<i8>,
	rssi_floor: i8,
	dropped: u16,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScanSummary {
	pub ble_count: u16,
	/// Strongest beacon sighting, if any.
	pub beacon_rssi: Option<i8>,
	/// Reports from new advertisers dropped because the set was full.
	pub dropped: u16,
}

impl<const N: usize> ScanTally<N> {
	pub fn new(beacon: Option<MacAddress>, rssi_floor: i8) -> Self {
		Self {
			devices: FnvIndexSet::new(),
			beacon,
			beacon_rssi: None,
			rssi_floor,
			dropped: 0,
		}
	}

	/// Records one advertisement report. The beacon is tracked at any signal
	/// strength, but only counted as an advertiser at or above the floor.
	pub fn observe(&mut self, mac: MacAddress, rssi: i8) {
		if self.beacon == Some(mac) {
			let strongest = self.beacon_rssi.map_or(rssi, |seen| seen.max(rssi));
			if self.beacon_rssi != Some(strongest) {
				debug!("beacon {} rssi {}", mac, strongest);
			}
			self.beacon_rssi = Some(strongest);
		}

		if rssi < self.rssi_floor || self.devices.contains(&mac) {
			return;
		}

		match self.devices.insert(mac) {
			Ok(_) => trace!("new advertiser {} rssi {}", mac, rssi),
			Err(_) => self.dropped = self.dropped.saturating_add(1),
		}
	}

	pub fn devices(&self) -> &FnvIndexSet<MacAddress, N> { &self.devices }

	pub fn finish(self) -> ScanSummary {
		if self.dropped > 0 {
			warn!("advertiser set full, {} reports not counted", self.dropped);
		}

		ScanSummary {
			ble_count: self.devices.len() as u16,
			beacon_rssi: self.beacon_rssi,
			dropped: self.dropped,
		}
	}
}

impl ScanSummary {
	pub fn into_uplink(self, environment: EnvironmentType, thresholds: &CrowdThresholds) -> Uplink {
		// No Wi-Fi radio on this board
		let wifi_count = 0;
		let total = self.ble_count.saturating_add(wifi_count);

		Uplink {
			ble_count: self.ble_count,
			wifi_count,
			crowd_level: CrowdLevel::classify(total, thresholds),
			beacon_rssi: self.beacon_rssi,
			environment,
		}
	}
}

/// Compares consecutive windows: when at least half of the current
/// advertisers were already there in the previous window the environment is
/// static, otherwise mobile. A window that empties out after a crowd is
/// mobile.
pub struct EnvironmentClassifier<const N: usize> {
	previous: Option<FnvIndexSet<MacAddress, N>>,
	min_devices: usize,
}

impl<const N: usize> EnvironmentClassifier<N> {
	pub const STATIC_PERCENT: usize = 50;

	pub fn new(min_devices: usize) -> Self {
		Self {
			previous: None,
			min_devices,
		}
	}

	pub fn update(&mut self, current: &FnvIndexSet<MacAddress, N>) -> EnvironmentType {
		let environment = match &self.previous {
			None => EnvironmentType::Unknown,
			Some(previous) => {
				let min_devices = self.min_devices.max(1);
				if current.len() < min_devices && previous.len() < min_devices {
					EnvironmentType::Unknown
				} else if current.is_empty() {
					EnvironmentType::Mobile
				} else {
					let shared = current.intersection(previous).count();
					if shared * 100 >= current.len() * Self::STATIC_PERCENT {
						EnvironmentType::Static
					} else {
						EnvironmentType::Mobile
					}
				}
			}
		};

		self.previous = Some(current.clone());
		environment
	}

	pub fn reset(&mut self) { self.previous = None; }
}
