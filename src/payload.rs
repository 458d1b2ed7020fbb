//! Uplink payload: crowd census sent on every duty cycle, and the lenient
//! decoder the network side runs on it.

use core::fmt;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, big_endian::U16};

/// Sent as `beacon_rssi` when the beacon was not seen.
pub const NO_RSSI: i8 = -128;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum CrowdLevel {
	Calm = 0,
	Moderate = 1,
	Crowded = 2,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CrowdThresholds {
	/// Lowest device count reported as moderate.
	pub moderate: u16,
	/// Lowest device count reported as crowded.
	pub crowded: u16,
}

impl CrowdLevel {
	pub fn classify(total: u16, thresholds: &CrowdThresholds) -> Self {
		if total >= thresholds.crowded {
			Self::Crowded
		} else if total >= thresholds.moderate {
			Self::Moderate
		} else {
			Self::Calm
		}
	}

	pub fn from_code(code: u8) -> Option<Self> {
		match code {
			0 => Some(Self::Calm),
			1 => Some(Self::Moderate),
			2 => Some(Self::Crowded),
			_ => None,
		}
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Calm => "CALM",
			Self::Moderate => "MODERATE",
			Self::Crowded => "CROWDED",
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum EnvironmentType {
	Static = 0,
	Mobile = 1,
	Unknown = 2,
}

impl EnvironmentType {
	pub fn from_code(code: u8) -> Option<Self> {
		match code {
			0 => Some(Self::Static),
			1 => Some(Self::Mobile),
			2 => Some(Self::Unknown),
			_ => None,
		}
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Static => "STATIC",
			Self::Mobile => "MOBILE",
			Self::Unknown => "UNKNOWN",
		}
	}
}

#[derive(Clone, FromBytes, IntoBytes, KnownLayout, Immutable, Debug)]
#[repr(C)]
pub struct UplinkFrame {
	pub ble_count: U16,
	pub wifi_count: U16,
	pub total_count: U16,
	pub crowd_level: u8,
	pub beacon_detected: u8,
	pub beacon_rssi: i8,
	pub environment_type: u8,
}

impl UplinkFrame {
	pub const SIZE: usize = size_of::<Self>();
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Uplink {
	pub ble_count: u16,
	pub wifi_count: u16,
	pub crowd_level: CrowdLevel,
	pub beacon_rssi: Option<i8>,
	pub environment: EnvironmentType,
}

impl Uplink {
	pub fn total_count(&self) -> u16 { self.ble_count.saturating_add(self.wifi_count) }

	pub fn encode(&self) -> [u8; UplinkFrame::SIZE] {
		let frame = UplinkFrame {
			ble_count: U16::new(self.ble_count),
			wifi_count: U16::new(self.wifi_count),
			total_count: U16::new(self.total_count()),
			crowd_level: self.crowd_level as u8,
			beacon_detected: self.beacon_rssi.is_some() as u8,
			beacon_rssi: self.beacon_rssi.unwrap_or(NO_RSSI),
			environment_type: self.environment as u8,
		};

		let mut out = [0u8; UplinkFrame::SIZE];
		out.copy_from_slice(frame.as_bytes());
		out
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodeWarning {
	/// Fewer than 7 bytes; even the core fields are incomplete.
	TooShort(usize),
	/// 7 to 9 bytes; the beacon and environment fields were defaulted.
	Truncated(usize),
}

impl fmt::Display for DecodeWarning {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::TooShort(len) => write!(
				f,
				"Payload too short: {len} bytes, fewer than 7 - unexpected payload"
			),
			Self::Truncated(len) => write!(
				f,
				"Short payload detected ({len} bytes) - extended fields defaulted"
			),
		}
	}
}

/// Decoded uplink. Codes are kept raw so unknown values survive decoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Decoded {
	pub ble_count: u16,
	pub wifi_count: u16,
	pub total_count: u16,
	pub crowd_level: u8,
	pub beacon_detected: bool,
	pub beacon_rssi: i8,
	pub environment_type: u8,
	pub warning: Option<DecodeWarning>,
}

impl Decoded {
	pub fn crowd_level_text(&self) -> &'static str {
		CrowdLevel::from_code(self.crowd_level).map_or("UNKNOWN", |c| c.as_str())
	}

	pub fn environment_text(&self) -> &'static str {
		EnvironmentType::from_code(self.environment_type).map_or("UNKNOWN", |e| e.as_str())
	}
}

/// Decodes any byte string. Missing fields take defaults instead of failing.
pub fn decode_uplink(bytes: &[u8]) -> Decoded {
	let len = bytes.len();
	let byte_at = |idx: usize| bytes.get(idx).copied();
	let u16_at = |idx: usize| match (byte_at(idx), byte_at(idx + 1)) {
		(Some(hi), Some(lo)) => u16::from_be_bytes([hi, lo]),
		_ => 0,
	};

	let warning = if len < 7 {
		Some(DecodeWarning::TooShort(len))
	} else if len < UplinkFrame::SIZE {
		Some(DecodeWarning::Truncated(len))
	} else {
		None
	};

	Decoded {
		ble_count: u16_at(0),
		wifi_count: u16_at(2),
		total_count: u16_at(4),
		crowd_level: byte_at(6).unwrap_or(0),
		beacon_detected: byte_at(7) == Some(1),
		beacon_rssi: byte_at(8).map_or(NO_RSSI, |b| b as i8),
		environment_type: byte_at(9).unwrap_or(EnvironmentType::Unknown as u8),
		warning,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;

	const THRESHOLDS: CrowdThresholds = CrowdThresholds {
		moderate: 10,
		crowded: 25,
	};

	#[test]
	fn frame_layout() {
		assert_eq!(UplinkFrame::SIZE, 10);

		let uplink = Uplink {
			ble_count: 300,
			wifi_count: 0,
			crowd_level: CrowdLevel::Crowded,
			beacon_rssi: Some(-67),
			environment: EnvironmentType::Mobile,
		};
		assert_eq!(
			uplink.encode(),
			[0x01, 0x2c, 0x00, 0x00, 0x01, 0x2c, 0x02, 0x01, 0xbd, 0x01]
		);
	}

	#[test]
	fn missing_beacon_encodes_floor_rssi() {
		let uplink = Uplink {
			ble_count: 3,
			wifi_count: 2,
			crowd_level: CrowdLevel::Calm,
			beacon_rssi: None,
			environment: EnvironmentType::Unknown,
		};
		let bytes = uplink.encode();
		assert_eq!(&bytes[4..], &[0x00, 0x05, 0x00, 0x00, 0x80, 0x02]);

		let decoded = decode_uplink(&bytes);
		assert!(!decoded.beacon_detected);
		assert_eq!(decoded.beacon_rssi, NO_RSSI);
		assert_eq!(decoded.total_count, 5);
		assert_eq!(decoded.warning, None);
	}

	#[test]
	fn total_count_saturates() {
		let uplink = Uplink {
			ble_count: u16::MAX,
			wifi_count: 5,
			crowd_level: CrowdLevel::Crowded,
			beacon_rssi: None,
			environment: EnvironmentType::Static,
		};
		assert_eq!(uplink.total_count(), u16::MAX);
	}

	#[test]
	fn decode_full_frame() {
		let decoded = decode_uplink(&[0x00, 0x0c, 0x00, 0x03, 0x00, 0x0f, 0x01, 0x01, 0xc4, 0x00]);
		assert_eq!(
			decoded,
			Decoded {
				ble_count: 12,
				wifi_count: 3,
				total_count: 15,
				crowd_level: 1,
				beacon_detected: true,
				beacon_rssi: -60,
				environment_type: 0,
				warning: None,
			}
		);
		assert_eq!(decoded.crowd_level_text(), "MODERATE");
		assert_eq!(decoded.environment_text(), "STATIC");
	}

	#[test]
	fn decode_seven_byte_frame_defaults_extended_fields() {
		let decoded = decode_uplink(&[0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x00]);
		assert_eq!(decoded.total_count, 1);
		assert!(!decoded.beacon_detected);
		assert_eq!(decoded.beacon_rssi, NO_RSSI);
		assert_eq!(decoded.environment_type, 2);
		assert_eq!(decoded.environment_text(), "UNKNOWN");
		assert_eq!(decoded.warning, Some(DecodeWarning::Truncated(7)));
	}

	#[test]
	fn decode_nine_byte_frame_keeps_rssi() {
		let decoded = decode_uplink(&[0, 0, 0, 0, 0, 0, 2, 1, 0xd8]);
		assert!(decoded.beacon_detected);
		assert_eq!(decoded.beacon_rssi, -40);
		assert_eq!(decoded.environment_type, 2);
		assert_eq!(decoded.warning, Some(DecodeWarning::Truncated(9)));
	}

	#[test]
	fn decode_short_frame() {
		let decoded = decode_uplink(&[0x00, 0x05, 0x00]);
		assert_eq!(decoded.ble_count, 5);
		assert_eq!(decoded.wifi_count, 0);
		assert_eq!(decoded.crowd_level_text(), "CALM");
		assert_eq!(decoded.warning, Some(DecodeWarning::TooShort(3)));

		let empty = decode_uplink(&[]);
		assert_eq!(empty.ble_count, 0);
		assert_eq!(empty.warning, Some(DecodeWarning::TooShort(0)));
		assert_eq!(
			empty.warning.unwrap().to_string(),
			"Payload too short: 0 bytes, fewer than 7 - unexpected payload"
		);
	}

	#[test]
	fn decode_unknown_codes() {
		let decoded = decode_uplink(&[0, 0, 0, 0, 0, 0, 7, 2, 0, 9]);
		assert_eq!(decoded.crowd_level, 7);
		assert_eq!(decoded.crowd_level_text(), "UNKNOWN");
		assert!(!decoded.beacon_detected);
		assert_eq!(decoded.environment_text(), "UNKNOWN");
	}

	#[test]
	fn crowd_classification() {
		assert_eq!(CrowdLevel::classify(0, &THRESHOLDS), CrowdLevel::Calm);
		assert_eq!(CrowdLevel::classify(9, &THRESHOLDS), CrowdLevel::Calm);
		assert_eq!(CrowdLevel::classify(10, &THRESHOLDS), CrowdLevel::Moderate);
		assert_eq!(CrowdLevel::classify(24, &THRESHOLDS), CrowdLevel::Moderate);
		assert_eq!(CrowdLevel::classify(25, &THRESHOLDS), CrowdLevel::Crowded);
	}
}
