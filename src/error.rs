use crate::credentials::MacParseError;
use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
	#[cfg(feature = "firmware")]
	#[error("Lora radio error: {0:?}")]
	RadioError(lora_phy::mod_params::RadioError),
	#[error("Zerocopy conversion error")]
	ZeroCopy,
	#[error("Invalid MAC address: {0}")]
	MacAddress(MacParseError),
	#[error("Unexpected frame length {0}")]
	FrameLength(usize),
	#[error("Unexpected message type {0:#04x}")]
	MessageType(u8),
	#[error("Invalid MIC")]
	InvalidMIC,
	#[error("Frame addressed to {0:#010x}")]
	DevAddrMismatch(u32),
	#[error("Frame counter {0} rejected")]
	FrameCounter(u32),
	#[error("Frame counter exhausted")]
	FrameCounterExhausted,
	#[error("Payload of {0} bytes too long")]
	PayloadTooLong(usize),
	#[error("FPort 0 only carries MAC commands")]
	MacCommandPort,
	#[error("Buffer too small")]
	BufferTooSmall,
	#[error("Unsupported data rate DR{0}")]
	DataRate(u8),
}
