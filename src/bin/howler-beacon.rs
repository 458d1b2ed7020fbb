#![feature(impl_trait_in_assoc_type)]
#![no_std]
#![no_main]

use defmt::*;
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_nrf::gpio::{Level, Output, OutputDrive};
use embassy_time::Timer;
use howler_node::{
	beacon::{interval_units, timeout_units},
	board::{self, Role},
	config::{BEACON_ADV_INTERVAL_MS, BEACON_BURST_MS, BEACON_ID, ENABLE_SERIAL_DEBUG, ENABLE_STATUS_LED},
	credentials::MacAddress,
};
use nrf_softdevice::{
	Softdevice,
	ble::{
		self,
		advertisement_builder::{Flag, LegacyAdvertisementBuilder, LegacyAdvertisementPayload},
		peripheral::{self, AdvertiseError, NonconnectableAdvertisement},
	},
};
use panic_probe as _;

#[embassy_executor::task]
async fn softdevice_task(sd: &'static Softdevice) -> ! { sd.run().await }

#[embassy_executor::task]
async fn beacon_task(sd: &'static Softdevice, led: Output<'static>) -> ! {
	advertise_loop(sd, led).await
}

async fn advertise_loop(sd: &Softdevice, mut led: Output<'static>) -> ! {
	static ADV_DATA: LegacyAdvertisementPayload = LegacyAdvertisementBuilder::new()
		.flags(&[Flag::GeneralDiscovery, Flag::LE_Only])
		.full_name(BEACON_ID)
		.build();

	let config = peripheral::Config {
		interval: interval_units(BEACON_ADV_INTERVAL_MS),
		timeout: Some(timeout_units(BEACON_BURST_MS)),
		..Default::default()
	};

	let mut bursts: u32 = 0;
	loop {
		let adv = NonconnectableAdvertisement::NonscannableUndirected { adv_data: &ADV_DATA };
		match peripheral::advertise(sd, adv, &config).await {
			Ok(()) | Err(AdvertiseError::Timeout) => {}
			Err(e) => {
				warn!("Advertising failed: {:?}", e);
				Timer::after_secs(1).await;
				continue;
			}
		}

		bursts = bursts.wrapping_add(1);
		if ENABLE_SERIAL_DEBUG {
			info!("{} burst {} done", BEACON_ID, bursts);
		}

		if ENABLE_STATUS_LED {
			led.set_high();
			Timer::after_millis(50).await;
			led.set_low();
		}
	}
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
	let p = board::init();
	let sd = Softdevice::enable(&board::softdevice_config(Role::Beacon));

	let led = Output::new(p.P1_03, Level::Low, OutputDrive::Standard);

	// The node matches on this address, see BEACON_MAC_ADDRESS
	let address = MacAddress::from_le_bytes(ble::get_address(sd).bytes());
	info!("Beacon {} advertising as {}", BEACON_ID, address);

	spawner.must_spawn(softdevice_task(sd));
	spawner.must_spawn(beacon_task(sd, led));
}
