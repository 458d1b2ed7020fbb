//! LoRaWAN credentials and beacon address.
//!
//! Copy this file to `secrets.rs` and fill in your own values. `secrets.rs`
//! is ignored by git so credentials stay private; when it is missing the
//! build falls back to this template.
//!
//! The LoRaWAN values come from The Things Network console:
//! Applications > your app > End devices. Copy them in the order the console
//! shows them (msb).

/// DevEUI, 8 bytes.
pub const LORAWAN_DEV_EUI: [u8; 8] = [0x70, 0xB3, 0xD5, 0x7E, 0xD0, 0x07, 0x43, 0x59];

/// AppEUI (JoinEUI), 8 bytes.
pub const LORAWAN_APP_EUI: [u8; 8] = [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];

/// AppKey, 16 bytes.
pub const LORAWAN_APP_KEY: [u8; 16] = [
	0xCC, 0x4E, 0xEA, 0x15, 0x71, 0xB5, 0x82, 0x99, 0x35, 0x3C, 0xD1, 0x5D, 0x12, 0x6E, 0xDA, 0x5D,
];

/// MAC address of the beacon to look for, formatted "AA:BB:CC:DD:EE:FF".
/// Leave as "00:00:00:00:00:00" to turn beacon tracking off.
pub const BEACON_MAC_ADDRESS: &str = "00:00:00:00:00:00";
