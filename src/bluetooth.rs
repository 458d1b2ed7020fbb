use defmt::*;
use embassy_futures::select::{Either, select};
use embassy_time::{Duration, Timer};
use howler_node::{config::ENABLE_SERIAL_DEBUG, credentials::MacAddress, scan::ScanTally};
use nrf_softdevice::{Softdevice, ble::central};

/// Passively scans for `window`, feeding every advertisement report into the
/// tally. Dropping the scan future stops the scan.
pub async fn scan_window<const N: usize>(
	sd: &Softdevice,
	tally: &mut ScanTally<N>,
	window: Duration,
) {
	let config = central::ScanConfig {
		active: false,
		..Default::default()
	};

	let scan = central::scan(sd, &config, |report| {
		let mac = MacAddress::from_le_bytes(report.peer_addr.addr);
		if ENABLE_SERIAL_DEBUG {
			info!("adv {} rssi {}", mac, report.rssi);
		}
		tally.observe(mac, report.rssi);
		None::<()>
	});

	match select(scan, Timer::after(window)).await {
		Either::First(Err(e)) => warn!("BLE scan failed: {:?}", e),
		Either::First(Ok(())) | Either::Second(()) => {}
	}
}
