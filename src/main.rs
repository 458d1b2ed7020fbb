#![feature(impl_trait_in_assoc_type)]
#![no_std]
#![no_main]

mod bluetooth;
mod node;
mod radio;

use defmt::*;
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_nrf::{
	bind_interrupts,
	gpio::{Input, Level, Output, OutputDrive, Pull},
	interrupt::{self, InterruptExt, Priority},
	peripherals, spim,
};
use embassy_time::Delay;
use embedded_hal_bus::spi::ExclusiveDevice;
use howler_node::{
	board::{self, Role},
	config::{BEACON_ID, REGION},
	credentials::{CREDENTIALS, beacon_target},
	lorawan::LORAWAN_PUBLIC_SYNCWORD,
};
use lora_phy::{
	LoRa,
	iv::GenericSx126xInterfaceVariant,
	sx126x::{self, Sx126x, Sx1262, TcxoCtrlVoltage},
};
use nrf_softdevice::{self as _, Softdevice, random_bytes};
use panic_probe as _;
use rand::{SeedableRng, rngs::StdRng};

type LoraRadio = LoRa<
	Sx126x<
		ExclusiveDevice<spim::Spim<'static, peripherals::TWISPI1>, Output<'static>, Delay>,
		GenericSx126xInterfaceVariant<Output<'static>, Input<'static>>,
		Sx1262,
	>,
	Delay,
>;

bind_interrupts!(struct Irqs {
	TWISPI1 => spim::InterruptHandler<peripherals::TWISPI1>;
});

#[embassy_executor::task]
async fn softdevice_task(sd: &'static Softdevice) -> ! { sd.run().await }

#[embassy_executor::task]
async fn node_task(
	sd: &'static Softdevice,
	lora: LoraRadio,
	rng: StdRng,
	led: Output<'static>,
) -> ! {
	node::run(sd, lora, rng, led).await
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
	let p = board::init();
	interrupt::TWISPI1.set_priority(Priority::P2);

	let sd = Softdevice::enable(&board::softdevice_config(Role::Node));

	// Configure LORA radio
	let nss = Output::new(p.P1_10, Level::High, OutputDrive::Standard);
	let reset = Output::new(p.P1_06, Level::High, OutputDrive::Standard);
	let dio1 = Input::new(p.P1_15, Pull::Down);
	let busy = Input::new(p.P1_14, Pull::None);
	let rf_switch_rx = Output::new(p.P1_05, Level::Low, OutputDrive::Standard);
	let rf_switch_tx = Output::new(p.P1_07, Level::Low, OutputDrive::Standard);

	let mut spi_config = spim::Config::default();
	spi_config.frequency = spim::Frequency::M16;
	let spim = spim::Spim::new(p.TWISPI1, Irqs, p.P1_11, p.P1_13, p.P1_12, spi_config);
	let spi = unwrap!(ExclusiveDevice::new(spim, nss, Delay));

	let config = sx126x::Config {
		chip: Sx1262,
		tcxo_ctrl: Some(TcxoCtrlVoltage::Ctrl1V7),
		use_dcdc: true,
		rx_boost: false,
	};
	let iv = unwrap!(GenericSx126xInterfaceVariant::new(
		reset,
		dio1,
		busy,
		Some(rf_switch_rx),
		Some(rf_switch_tx),
	));

	let lora = unwrap!(
		LoRa::with_syncword(Sx126x::new(spi, iv, config), LORAWAN_PUBLIC_SYNCWORD, Delay).await
	);

	let led = Output::new(p.P1_03, Level::Low, OutputDrive::Standard);

	// Configure RNG
	let mut seed = [0u8; 32];
	unwrap!(random_bytes(sd, &mut seed));
	let rng = StdRng::from_seed(seed);

	info!("Node for {} starting, region {}", BEACON_ID, REGION);
	info!("DevEUI {} AppEUI {}", CREDENTIALS.dev_eui, CREDENTIALS.app_eui);
	match beacon_target() {
		Some(mac) => info!("Tracking beacon {}", mac),
		None => warn!("No beacon MAC set, beacon RSSI will not be reported"),
	}

	spawner.must_spawn(softdevice_task(sd));
	spawner.must_spawn(node_task(sd, lora, rng, led));
}
