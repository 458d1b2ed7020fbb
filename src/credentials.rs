//! LoRaWAN OTAA credentials and the address of the tracked beacon.
//!
//! Raw values live in `secrets.rs` at the crate root (a private copy of
//! `secrets_template.rs`). They are written msb first, the way the network
//! console shows them, and wrapped here in types that know their wire order.

use core::{fmt, str::FromStr};
use thiserror::Error;

#[cfg_attr(has_user_secrets, path = "../secrets.rs")]
#[cfg_attr(not(has_user_secrets), path = "../secrets_template.rs")]
mod secrets;

pub use secrets::{BEACON_MAC_ADDRESS, LORAWAN_APP_EUI, LORAWAN_APP_KEY, LORAWAN_DEV_EUI};

pub const CREDENTIALS: Credentials = Credentials {
	dev_eui: Eui::from_msb(LORAWAN_DEV_EUI),
	app_eui: Eui::from_msb(LORAWAN_APP_EUI),
	app_key: AppKey::new(LORAWAN_APP_KEY),
};

pub const BEACON_MAC: MacAddress = match MacAddress::parse(BEACON_MAC_ADDRESS) {
	Ok(mac) => mac,
	Err(_) => panic!("BEACON_MAC_ADDRESS must be formatted AA:BB:CC:DD:EE:FF"),
};

/// The beacon to look for, or `None` when tracking is turned off.
pub const fn beacon_target() -> Option<MacAddress> {
	if BEACON_MAC.is_unset() { None } else { Some(BEACON_MAC) }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Credentials {
	pub dev_eui: Eui,
	pub app_eui: Eui,
	pub app_key: AppKey,
}

/// 64-bit extended unique identifier (DevEUI, AppEUI).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Eui([u8; 8]);

impl Eui {
	pub const fn from_msb(bytes: [u8; 8]) -> Self { Self(bytes) }

	pub const fn as_msb(&self) -> &[u8; 8] { &self.0 }

	/// LoRaWAN frames carry EUIs lsb first.
	pub fn to_wire(&self) -> [u8; 8] {
		let mut bytes = self.0;
		bytes.reverse();
		bytes
	}

	pub fn from_wire(mut bytes: [u8; 8]) -> Self {
		bytes.reverse();
		Self(bytes)
	}
}

impl fmt::Display for Eui {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for b in self.0 {
			write!(f, "{b:02X}")?;
		}
		Ok(())
	}
}

impl fmt::Debug for Eui {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "Eui({self})") }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Eui {
	fn format(&self, f: defmt::Formatter) { defmt::write!(f, "{=[u8]:02X}", self.0) }
}

/// 128-bit OTAA root key. Never printed.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct AppKey([u8; 16]);

impl AppKey {
	pub const fn new(bytes: [u8; 16]) -> Self { Self(bytes) }

	pub const fn as_bytes(&self) -> &[u8; 16] { &self.0 }
}

impl fmt::Debug for AppKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str("AppKey(..)") }
}

#[cfg(feature = "defmt")]
impl defmt::Format for AppKey {
	fn format(&self, f: defmt::Formatter) { defmt::write!(f, "AppKey(..)") }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MacParseError {
	#[error("expected 17 characters, got {0}")]
	Length(usize),
	#[error("expected ':' at offset {0}")]
	Separator(usize),
	#[error("invalid hex digit at offset {0}")]
	Digit(usize),
}

/// Bluetooth device address, stored msb first as written in
/// "AA:BB:CC:DD:EE:FF".
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct MacAddress([u8; 6]);

impl MacAddress {
	pub const UNSET: Self = Self([0; 6]);

	pub const fn new(octets: [u8; 6]) -> Self { Self(octets) }

	pub const fn octets(&self) -> [u8; 6] { self.0 }

	pub const fn parse(s: &str) -> core::result::Result<Self, MacParseError> {
		let s = s.as_bytes();
		if s.len() != 17 {
			return Err(MacParseError::Length(s.len()));
		}

		let mut octets = [0u8; 6];
		let mut i = 0;
		while i < 6 {
			let at = i * 3;
			if i > 0 && s[at - 1] != b':' {
				return Err(MacParseError::Separator(at - 1));
			}
			let Some(hi) = hex_value(s[at]) else {
				return Err(MacParseError::Digit(at));
			};
			let Some(lo) = hex_value(s[at + 1]) else {
				return Err(MacParseError::Digit(at + 1));
			};
			octets[i] = (hi << 4) | lo;
			i += 1;
		}

		Ok(Self(octets))
	}

	/// BLE controllers report addresses lsb first.
	pub const fn from_le_bytes(bytes: [u8; 6]) -> Self {
		Self([bytes[5], bytes[4], bytes[3], bytes[2], bytes[1], bytes[0]])
	}

	pub const fn to_le_bytes(&self) -> [u8; 6] {
		let b = self.0;
		[b[5], b[4], b[3], b[2], b[1], b[0]]
	}

	pub const fn is_unset(&self) -> bool {
		let mut i = 0;
		while i < 6 {
			if self.0[i] != 0 {
				return false;
			}
			i += 1;
		}
		true
	}
}

const fn hex_value(c: u8) -> Option<u8> {
	match c {
		b'0'..=b'9' => Some(c - b'0'),
		b'a'..=b'f' => Some(c - b'a' + 10),
		b'A'..=b'F' => Some(c - b'A' + 10),
		_ => None,
	}
}

impl FromStr for MacAddress {
	type Err = MacParseError;

	fn from_str(s: &str) -> core::result::Result<Self, Self::Err> { Self::parse(s) }
}

impl fmt::Display for MacAddress {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let [a, b, c, d, e, g] = self.0;
		write!(f, "{a:02X}:{b:02X}:{c:02X}:{d:02X}:{e:02X}:{g:02X}")
	}
}

impl fmt::Debug for MacAddress {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "MacAddress({self})") }
}

#[cfg(feature = "defmt")]
impl defmt::Format for MacAddress {
	fn format(&self, f: defmt::Formatter) {
		let [a, b, c, d, e, g] = self.0;
		defmt::write!(f, "{=u8:02X}:{=u8:02X}:{=u8:02X}:{=u8:02X}:{=u8:02X}:{=u8:02X}", a, b, c, d, e, g)
	}
}

impl From<MacParseError> for crate::error::Error {
	fn from(e: MacParseError) -> Self { Self::MacAddress(e) }
}
