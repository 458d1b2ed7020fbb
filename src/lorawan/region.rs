//! US915 and AU915 channel plans, restricted to sub-band 2 (channels 8-15)
//! as used by The Things Network.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Region {
	Au915,
	Us915,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DataRate {
	pub spreading_factor: u8,
	pub bandwidth_khz: u16,
}

const fn dr(spreading_factor: u8, bandwidth_khz: u16) -> Option<DataRate> {
	Some(DataRate {
		spreading_factor,
		bandwidth_khz,
	})
}

pub const SUB_BAND: u8 = 2;
pub const CHANNELS_PER_SUB_BAND: u8 = 8;

const RX1_BASE_HZ: u32 = 923_300_000;
const RX1_STEP_HZ: u32 = 600_000;
const UPLINK_STEP_HZ: u32 = 200_000;

impl Region {
	fn uplink_base_hz(&self) -> u32 {
		match self {
			Self::Au915 => 915_200_000,
			Self::Us915 => 902_300_000,
		}
	}

	pub fn data_rate(&self, index: u8) -> Option<DataRate> {
		match (self, index) {
			(Self::Au915, 0) => dr(12, 125),
			(Self::Au915, 1) => dr(11, 125),
			(Self::Au915, 2) => dr(10, 125),
			(Self::Au915, 3) => dr(9, 125),
			(Self::Au915, 4) => dr(8, 125),
			(Self::Au915, 5) => dr(7, 125),
			(Self::Au915, 6) => dr(8, 500),
			(Self::Us915, 0) => dr(10, 125),
			(Self::Us915, 1) => dr(9, 125),
			(Self::Us915, 2) => dr(8, 125),
			(Self::Us915, 3) => dr(7, 125),
			(Self::Us915, 4) => dr(8, 500),
			// Downlink rates are shared
			(_, 8..=13) => dr(20 - index, 500),
			_ => None,
		}
	}

	/// Both regions join at SF10 / 125 kHz.
	pub fn join_data_rate(&self) -> u8 {
		match self {
			Self::Au915 => 2,
			Self::Us915 => 0,
		}
	}

	pub fn default_uplink_data_rate(&self) -> u8 { self.join_data_rate() }

	pub fn rx2_data_rate(&self) -> u8 { 8 }

	pub fn rx2_frequency(&self) -> u32 { RX1_BASE_HZ }

	pub fn rx1_data_rate(&self, uplink_dr: u8, offset: u8) -> u8 {
		let base = match self {
			Self::Au915 => 8 + uplink_dr.min(6),
			Self::Us915 => 10 + uplink_dr.min(4),
		};
		base.saturating_sub(offset).clamp(8, 13)
	}

	/// Uplink frequency of a 125 kHz channel, 0-63.
	pub fn uplink_frequency(&self, channel: u8) -> u32 {
		self.uplink_base_hz() + channel as u32 * UPLINK_STEP_HZ
	}

	pub fn rx1_frequency(&self, channel: u8) -> u32 {
		RX1_BASE_HZ + (channel % 8) as u32 * RX1_STEP_HZ
	}

	/// Largest application payload at a data rate, no dwell time limit.
	pub fn max_payload(&self, data_rate: u8) -> usize {
		match (self, data_rate) {
			(Self::Au915, 0..=2) => 51,
			(Self::Au915, 3) => 115,
			(Self::Au915, 4..=6) => 242,
			(Self::Us915, 0) => 11,
			(Self::Us915, 1) => 53,
			(Self::Us915, 2) => 125,
			(Self::Us915, 3..=4) => 242,
			_ => 0,
		}
	}
}

/// Round-robin over the sub-band channels.
#[derive(Clone, Debug)]
pub struct ChannelHopper {
	next: u8,
}

impl Default for ChannelHopper {
	fn default() -> Self { Self::new() }
}

impl ChannelHopper {
	pub const fn new() -> Self { Self { next: 0 } }

	/// Starts at a random channel so devices powered up together spread out.
	pub const fn starting_at(offset: u8) -> Self {
		Self {
			next: offset % CHANNELS_PER_SUB_BAND,
		}
	}

	pub fn next_channel(&mut self) -> u8 {
		let channel = (SUB_BAND - 1) * CHANNELS_PER_SUB_BAND + self.next;
		self.next = (self.next + 1) % CHANNELS_PER_SUB_BAND;
		channel
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;

	#[test]
	fn sub_band_two_frequencies() {
		assert_eq!(Region::Au915.uplink_frequency(8), 916_800_000);
		assert_eq!(Region::Au915.uplink_frequency(15), 918_200_000);
		assert_eq!(Region::Us915.uplink_frequency(8), 903_900_000);
		assert_eq!(Region::Us915.uplink_frequency(15), 905_300_000);

		assert_eq!(Region::Au915.rx1_frequency(8), 923_300_000);
		assert_eq!(Region::Us915.rx1_frequency(15), 927_500_000);
		assert_eq!(Region::Au915.rx2_frequency(), 923_300_000);
	}

	#[test]
	fn data_rates() {
		for region in [Region::Au915, Region::Us915] {
			assert_eq!(
				region.data_rate(region.join_data_rate()),
				Some(DataRate {
					spreading_factor: 10,
					bandwidth_khz: 125
				})
			);
			assert_eq!(
				region.data_rate(region.rx2_data_rate()),
				Some(DataRate {
					spreading_factor: 12,
					bandwidth_khz: 500
				})
			);
			assert_eq!(region.data_rate(7), None);
			assert_eq!(region.data_rate(14), None);
		}
		assert_eq!(Region::Us915.data_rate(5), None);
	}

	#[test]
	fn rx1_data_rate_follows_uplink() {
		assert_eq!(Region::Au915.rx1_data_rate(2, 0), 10);
		assert_eq!(Region::Au915.rx1_data_rate(5, 0), 13);
		assert_eq!(Region::Au915.rx1_data_rate(0, 3), 8);
		assert_eq!(Region::Us915.rx1_data_rate(0, 0), 10);
		assert_eq!(Region::Us915.rx1_data_rate(4, 0), 13);
		assert_eq!(Region::Us915.rx1_data_rate(3, 1), 12);
	}

	#[test]
	fn uplink_payload_fits_default_rate() {
		for region in [Region::Au915, Region::Us915] {
			assert!(region.max_payload(region.default_uplink_data_rate()) >= 10);
		}
	}

	#[test]
	fn hopper_cycles_sub_band() {
		let mut hopper = ChannelHopper::new();
		let channels: Vec<u8> = (0..9).map(|_| hopper.next_channel()).collect();
		assert_eq!(channels, [8, 9, 10, 11, 12, 13, 14, 15, 8]);

		let mut hopper = ChannelHopper::starting_at(13);
		assert_eq!(hopper.next_channel(), 13);
	}
}
