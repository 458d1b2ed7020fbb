use crate::{
	bluetooth,
	radio::{self, PACKET_BUFFER_SIZE},
};
use defmt::*;
use embassy_nrf::gpio::Output;
use embassy_time::{Duration, Instant, Timer};
use howler_node::{
	config::{
		CROWD_THRESHOLDS, ENABLE_SERIAL_DEBUG, ENABLE_STATUS_LED, ENVIRONMENT_MIN_DEVICES,
		JOIN_BACKOFF_BASE_MS, JOIN_BACKOFF_MAX_MS, MAX_TRACKED_DEVICES, REGION, RSSI_FLOOR,
		SCAN_WINDOW_MS, UPLINK_INTERVAL_MS, UPLINK_PORT,
	},
	credentials::{CREDENTIALS, beacon_target},
	error::{Error, Result},
	lorawan::{
		JOIN_ACCEPT_DELAY1_MS, JOIN_ACCEPT_DELAY2_MS,
		backoff::JoinBackoff,
		frame::Session,
		join::{JoinAccept, JoinRequest},
		keys::DevNonce,
		region::ChannelHopper,
		rx2_delay_ms,
	},
	payload::Uplink,
	scan::{EnvironmentClassifier, ScanTally},
};
use lora_phy::{DelayNs, LoRa, mod_traits::RadioKind};
use nrf_softdevice::Softdevice;
use rand_core::RngCore;

/// Open the receiver this long before the window starts.
const RX_WINDOW_LEAD_MS: u32 = 20;
const RX_TIMEOUT_SYMBOLS: u16 = 32;

struct Joined {
	session: Session,
	rx_delays_ms: (u32, u32),
	rx1_dr_offset: u8,
}

struct Node<RK, DLY, R> {
	lora: LoRa<RK, DLY>,
	rng: R,
	led: Output<'static>,
	hopper: ChannelHopper,
}

pub async fn run<RK: RadioKind, DLY: DelayNs, R: RngCore>(
	sd: &'static Softdevice,
	lora: LoRa<RK, DLY>,
	mut rng: R,
	led: Output<'static>,
) -> ! {
	let hopper = ChannelHopper::starting_at(rng.next_u32() as u8);
	let mut node = Node {
		lora,
		rng,
		led,
		hopper,
	};
	let mut backoff = JoinBackoff::new(JOIN_BACKOFF_BASE_MS, JOIN_BACKOFF_MAX_MS);
	let mut classifier = EnvironmentClassifier::<MAX_TRACKED_DEVICES>::new(ENVIRONMENT_MIN_DEVICES);

	loop {
		let mut joined = node.join(&mut backoff).await;
		info!("Joined as {}", joined.session.dev_addr());
		node.blink(2).await;

		loop {
			let cycle_start = Instant::now();

			let mut tally = ScanTally::<MAX_TRACKED_DEVICES>::new(beacon_target(), RSSI_FLOOR);
			bluetooth::scan_window(sd, &mut tally, Duration::from_millis(SCAN_WINDOW_MS)).await;
			let environment = classifier.update(tally.devices());
			let summary = tally.finish();
			let uplink = summary.into_uplink(environment, &CROWD_THRESHOLDS);

			info!(
				"ble {} crowd {} beacon {} env {}",
				uplink.ble_count,
				uplink.crowd_level.as_str(),
				uplink.beacon_rssi,
				uplink.environment.as_str()
			);

			match node.send_uplink(&mut joined, &uplink).await {
				Ok(()) => node.blink(1).await,
				Err(Error::FrameCounterExhausted) => {
					warn!("Frame counter exhausted, rejoining");
					break;
				}
				Err(e) => warn!("Uplink failed: {}", e),
			}

			if let Err(e) = radio::sleep(&mut node.lora).await {
				warn!("Radio sleep failed: {}", e);
			}

			Timer::at(cycle_start + Duration::from_millis(UPLINK_INTERVAL_MS)).await;
		}

		classifier.reset();
	}
}

impl<RK: RadioKind, DLY: DelayNs, R: RngCore> Node<RK, DLY, R> {
	async fn join(&mut self, backoff: &mut JoinBackoff) -> Joined {
		let app_key = &CREDENTIALS.app_key;

		loop {
			let dev_nonce = DevNonce::random(&mut self.rng);
			let request = JoinRequest::new(CREDENTIALS.app_eui, CREDENTIALS.dev_eui, dev_nonce);
			let frame = request.encode(app_key);
			let channel = self.hopper.next_channel();

			info!("Join request on channel {}, {}", channel, dev_nonce);

			let mut buffer = [0u8; PACKET_BUFFER_SIZE];
			match self
				.exchange(
					&frame,
					channel,
					REGION.join_data_rate(),
					0,
					(JOIN_ACCEPT_DELAY1_MS, JOIN_ACCEPT_DELAY2_MS),
					&mut buffer,
				)
				.await
			{
				Ok(Some(len)) => match JoinAccept::decode(app_key, &buffer[..len]) {
					Ok(accept) => {
						backoff.reset();
						let rx1_delay_ms = accept.rx_delay_s as u32 * 1000;
						return Joined {
							session: Session::from_join_accept(&accept, app_key, dev_nonce),
							rx_delays_ms: (rx1_delay_ms, rx2_delay_ms(rx1_delay_ms)),
							rx1_dr_offset: accept.rx1_dr_offset,
						};
					}
					Err(e) => warn!("Bad join accept: {}", e),
				},
				Ok(None) => info!("No join accept"),
				Err(e) => warn!("Join exchange failed: {}", e),
			}

			let delay = backoff.next_delay_ms(&mut self.rng);
			info!("Retrying join in {} ms", delay);
			Timer::after_millis(delay as u64).await;
		}
	}

	async fn send_uplink(&mut self, joined: &mut Joined, uplink: &Uplink) -> Result<()> {
		let payload = uplink.encode();
		let mut frame_buf = [0u8; PACKET_BUFFER_SIZE];
		let frame = joined.session.uplink(UPLINK_PORT, &payload, false, &mut frame_buf)?;

		if ENABLE_SERIAL_DEBUG {
			info!("Uplink frame: {=[u8]:02x}", frame);
		}

		let channel = self.hopper.next_channel();
		let mut rx_buf = [0u8; PACKET_BUFFER_SIZE];
		let received = self
			.exchange(
				frame,
				channel,
				REGION.default_uplink_data_rate(),
				joined.rx1_dr_offset,
				joined.rx_delays_ms,
				&mut rx_buf,
			)
			.await?;

		if let Some(len) = received {
			if ENABLE_SERIAL_DEBUG {
				info!("Downlink frame: {=[u8]:02x}", &rx_buf[..len]);
			}

			let mut plain = [0u8; PACKET_BUFFER_SIZE];
			match joined.session.downlink(&rx_buf[..len], &mut plain) {
				Ok(downlink) => info!(
					"Downlink fcnt {} port {} ack {} payload {=[u8]:02x}",
					downlink.fcnt,
					downlink.port,
					downlink.ack,
					downlink.payload
				),
				Err(e) => warn!("Dropped downlink: {}", e),
			}
		}

		Ok(())
	}

	/// Transmits `frame`, then listens in RX1 and RX2, each delay counted from
	/// the end of the transmission. Returns the length of the first frame
	/// received.
	async fn exchange(
		&mut self,
		frame: &[u8],
		channel: u8,
		uplink_dr: u8,
		rx1_dr_offset: u8,
		(rx1_ms, rx2_ms): (u32, u32),
		buffer: &mut [u8; PACKET_BUFFER_SIZE],
	) -> Result<Option<usize>> {
		let rate = REGION.data_rate(uplink_dr).ok_or(Error::DataRate(uplink_dr))?;
		let tx_params = radio::modulation(&mut self.lora, rate, REGION.uplink_frequency(channel))?;
		radio::tx_packet(&mut self.lora, &tx_params, frame).await?;
		let tx_done = Instant::now();

		let windows = [
			(
				rx1_ms,
				REGION.rx1_frequency(channel),
				REGION.rx1_data_rate(uplink_dr, rx1_dr_offset),
			),
			(rx2_ms, REGION.rx2_frequency(), REGION.rx2_data_rate()),
		];

		for (delay_ms, frequency, dr) in windows {
			let rate = REGION.data_rate(dr).ok_or(Error::DataRate(dr))?;
			let rx_params = radio::modulation(&mut self.lora, rate, frequency)?;

			let open_at = delay_ms.saturating_sub(RX_WINDOW_LEAD_MS) as u64;
			Timer::at(tx_done + Duration::from_millis(open_at)).await;

			match radio::rx_packet(&mut self.lora, &rx_params, buffer, RX_TIMEOUT_SYMBOLS).await {
				Ok(len) if len > 0 => return Ok(Some(len)),
				Ok(_) => {}
				Err(e) => debug!("Rx window closed: {}", e),
			}
		}

		Ok(None)
	}

	async fn blink(&mut self, times: u8) {
		if !ENABLE_STATUS_LED {
			return;
		}
		for _ in 0..times {
			self.led.set_high();
			Timer::after_millis(100).await;
			self.led.set_low();
			Timer::after_millis(100).await;
		}
	}
}
