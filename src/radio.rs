use defmt::*;
use howler_node::{
	config::TX_POWER_DBM,
	error::{Error, Result},
	lorawan::{PREAMBLE_LENGTH, region::DataRate},
};
use lora_phy::{
	DelayNs, LoRa, RxMode,
	mod_params::{Bandwidth, CodingRate, ModulationParams, SpreadingFactor},
	mod_traits::RadioKind,
};

pub const PACKET_BUFFER_SIZE: usize = 255;

fn spreading_factor(sf: u8) -> SpreadingFactor {
	match sf {
		7 => SpreadingFactor::_7,
		8 => SpreadingFactor::_8,
		9 => SpreadingFactor::_9,
		10 => SpreadingFactor::_10,
		11 => SpreadingFactor::_11,
		_ => SpreadingFactor::_12,
	}
}

fn bandwidth(khz: u16) -> Bandwidth {
	match khz {
		125 => Bandwidth::_125KHz,
		250 => Bandwidth::_250KHz,
		_ => Bandwidth::_500KHz,
	}
}

pub fn modulation<RK: RadioKind, DLY: DelayNs>(
	lora: &mut LoRa<RK, DLY>,
	rate: DataRate,
	frequency: u32,
) -> Result<ModulationParams> {
	lora.create_modulation_params(
		spreading_factor(rate.spreading_factor),
		bandwidth(rate.bandwidth_khz),
		CodingRate::_4_5,
		frequency,
	)
	.map_err(Error::RadioError)
}

/// Uplinks carry a CRC and use normal IQ.
pub async fn tx_packet<RK: RadioKind, DLY: DelayNs>(
	lora: &mut LoRa<RK, DLY>,
	mod_params: &ModulationParams,
	buffer: &[u8],
) -> Result<()> {
	let mut tx_pkt_params = lora
		.create_tx_packet_params(PREAMBLE_LENGTH, false, true, false, mod_params)
		.map_err(Error::RadioError)?;

	lora.prepare_for_tx(mod_params, &mut tx_pkt_params, TX_POWER_DBM, buffer)
		.await
		.map_err(Error::RadioError)?;

	debug!("Ready for tx");

	lora.tx().await.map_err(Error::RadioError)?;

	debug!("Tx complete");

	Ok(())
}

/// Downlinks have no CRC and inverted IQ. Returns the received length.
pub async fn rx_packet<RK: RadioKind, DLY: DelayNs>(
	lora: &mut LoRa<RK, DLY>,
	mod_params: &ModulationParams,
	buffer: &mut [u8; PACKET_BUFFER_SIZE],
	timeout_symbols: u16,
) -> Result<usize> {
	let rx_pkt_params = lora
		.create_rx_packet_params(
			PREAMBLE_LENGTH,
			false,
			buffer.len() as u8,
			false,
			true,
			mod_params,
		)
		.map_err(Error::RadioError)?;

	lora.prepare_for_rx(RxMode::Single(timeout_symbols), mod_params, &rx_pkt_params)
		.await
		.map_err(Error::RadioError)?;

	debug!("Ready for rx");

	let (received_len, packet_status) = lora
		.rx(&rx_pkt_params, buffer)
		.await
		.map_err(Error::RadioError)?;

	debug!("Rx complete, rssi {} snr {}", packet_status.rssi, packet_status.snr);

	Ok(received_len as usize)
}

pub async fn sleep<RK: RadioKind, DLY: DelayNs>(lora: &mut LoRa<RK, DLY>) -> Result<()> {
	lora.sleep(false).await.map_err(Error::RadioError)
}
