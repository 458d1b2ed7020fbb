//! LoRaWAN 1.0.x end-device MAC subset: OTAA join and data frames.

pub mod backoff;
pub mod crypto;
pub mod frame;
pub mod join;
pub mod keys;
pub mod region;

pub const LORAWAN_PUBLIC_SYNCWORD: u8 = 0x34;
pub const PREAMBLE_LENGTH: u16 = 8;

pub const RECEIVE_DELAY1_MS: u32 = 1000;
pub const RECEIVE_DELAY2_MS: u32 = RECEIVE_DELAY1_MS + 1000;
pub const JOIN_ACCEPT_DELAY1_MS: u32 = 5000;
pub const JOIN_ACCEPT_DELAY2_MS: u32 = 6000;

/// RX2 opens one second after RX1, whatever delay the network assigned.
pub const fn rx2_delay_ms(rx1_delay_ms: u32) -> u32 {
	rx1_delay_ms + (RECEIVE_DELAY2_MS - RECEIVE_DELAY1_MS)
}

/// Largest accepted jump of the downlink frame counter.
pub const MAX_FCNT_GAP: u32 = 16384;

/// Largest FRMPayload any data rate allows.
pub const MAX_FRM_PAYLOAD: usize = 242;

pub const MIC_SIZE: usize = 4;

/// MHDR byte: MType in the top three bits, major version 0.
pub mod mhdr {
	pub const JOIN_REQUEST: u8 = 0x00;
	pub const JOIN_ACCEPT: u8 = 0x20;
	pub const UNCONFIRMED_UP: u8 = 0x40;
	pub const UNCONFIRMED_DOWN: u8 = 0x60;
	pub const CONFIRMED_UP: u8 = 0x80;
	pub const CONFIRMED_DOWN: u8 = 0xa0;

	pub const MTYPE_MASK: u8 = 0xe0;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Direction {
	Up = 0,
	Down = 1,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn rx2_trails_rx1_by_one_second() {
		assert_eq!(rx2_delay_ms(RECEIVE_DELAY1_MS), RECEIVE_DELAY2_MS);
		assert_eq!(rx2_delay_ms(JOIN_ACCEPT_DELAY1_MS), JOIN_ACCEPT_DELAY2_MS);
		assert_eq!(rx2_delay_ms(5_000), 6_000);
	}
}
