//! Board bring-up shared by the node and beacon binaries.

use crate::config::BEACON_ID;
use embassy_nrf::{Peripherals, interrupt::Priority};
use nrf_softdevice::raw;

#[derive(Clone, Copy, Debug, PartialEq, Eq, defmt::Format)]
pub enum Role {
	/// Passive BLE observer with a LoRaWAN uplink.
	Node,
	/// Non-connectable advertiser.
	Beacon,
}

/// Starts embassy with interrupt priorities that do not clash with the
/// softdevice.
pub fn init() -> Peripherals {
	let mut config = embassy_nrf::config::Config::default();
	config.gpiote_interrupt_priority = Priority::P2;
	config.time_interrupt_priority = Priority::P2;
	embassy_nrf::init(config)
}

pub fn softdevice_config(role: Role) -> nrf_softdevice::Config {
	let (periph_role_count, central_role_count) = match role {
		Role::Node => (0, 1),
		Role::Beacon => (1, 0),
	};

	nrf_softdevice::Config {
		clock: Some(raw::nrf_clock_lf_cfg_t {
			source: raw::NRF_CLOCK_LF_SRC_RC as u8,
			rc_ctiv: 16,
			rc_temp_ctiv: 2,
			accuracy: raw::NRF_CLOCK_LF_ACCURACY_500_PPM as u8,
		}),
		conn_gap: Some(raw::ble_gap_conn_cfg_t {
			conn_count: 1,
			event_length: 24,
		}),
		gap_role_count: Some(raw::ble_gap_cfg_role_count_t {
			adv_set_count: 1,
			periph_role_count,
			central_role_count,
			central_sec_count: 0,
			_bitfield_1: raw::ble_gap_cfg_role_count_t::new_bitfield_1(0),
		}),
		gap_device_name: Some(raw::ble_gap_cfg_device_name_t {
			p_value: BEACON_ID.as_ptr() as _,
			current_len: BEACON_ID.len() as u16,
			max_len: BEACON_ID.len() as u16,
			write_perm: unsafe { core::mem::zeroed() },
			_bitfield_1: raw::ble_gap_cfg_device_name_t::new_bitfield_1(
				raw::BLE_GATTS_VLOC_STACK as u8,
			),
		}),
		..Default::default()
	}
}
