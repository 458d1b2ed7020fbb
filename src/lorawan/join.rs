use crate::{
	credentials::{AppKey, Eui},
	error::{Error, Result},
	lorawan::{
		MIC_SIZE,
		crypto::{aes128_encrypt, mic},
		keys::{AppNonce, DevAddr, DevNonce, NetId, SessionKeys},
		mhdr,
	},
};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, little_endian::U16};

#[derive(Clone, FromBytes, IntoBytes, KnownLayout, Immutable, Debug)]
#[repr(C)]
pub struct JoinRequestFrame {
	pub mhdr: u8,
	pub app_eui: [u8; 8],
	pub dev_eui: [u8; 8],
	pub dev_nonce: U16,
	pub mic: [u8; MIC_SIZE],
}

impl JoinRequestFrame {
	pub const SIZE: usize = size_of::<Self>();
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct JoinRequest {
	pub app_eui: Eui,
	pub dev_eui: Eui,
	pub dev_nonce: DevNonce,
}

impl JoinRequest {
	pub fn new(app_eui: Eui, dev_eui: Eui, dev_nonce: DevNonce) -> Self {
		Self {
			app_eui,
			dev_eui,
			dev_nonce,
		}
	}

	pub fn encode(&self, app_key: &AppKey) -> [u8; JoinRequestFrame::SIZE] {
		let mut frame = JoinRequestFrame {
			mhdr: mhdr::JOIN_REQUEST,
			app_eui: self.app_eui.to_wire(),
			dev_eui: self.dev_eui.to_wire(),
			dev_nonce: U16::from_bytes(self.dev_nonce.to_wire()),
			mic: [0; MIC_SIZE],
		};
		let signed_len = JoinRequestFrame::SIZE - MIC_SIZE;
		frame.mic = mic(app_key.as_bytes(), &[&frame.as_bytes()[..signed_len]]);

		let mut out = [0u8; JoinRequestFrame::SIZE];
		out.copy_from_slice(frame.as_bytes());
		out
	}
}

/// Join accept fields between MHDR and CFList.
#[derive(Clone, FromBytes, IntoBytes, KnownLayout, Immutable, Debug)]
#[repr(C)]
pub struct JoinAcceptHeader {
	pub app_nonce: [u8; 3],
	pub net_id: [u8; 3],
	pub dev_addr: [u8; 4],
	pub dl_settings: u8,
	pub rx_delay: u8,
}

impl JoinAcceptHeader {
	pub const SIZE: usize = size_of::<Self>();
}

pub const CF_LIST_SIZE: usize = 16;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct JoinAccept {
	pub app_nonce: AppNonce,
	pub net_id: NetId,
	pub dev_addr: DevAddr,
	pub rx1_dr_offset: u8,
	pub rx2_data_rate: u8,
	/// Delay before RX1 in seconds.
	pub rx_delay_s: u8,
	pub cf_list: Option<[u8; CF_LIST_SIZE]>,
}

impl JoinAccept {
	pub const SIZE: usize = 1 + JoinAcceptHeader::SIZE + MIC_SIZE;

	pub const SIZE_WITH_CF_LIST: usize = Self::SIZE + CF_LIST_SIZE;

	/// Decrypts and checks a join accept. The network encrypts with AES
	/// decrypt, so the device recovers the plaintext with AES encrypt.
	pub fn decode(app_key: &AppKey, frame: &[u8]) -> Result<Self> {
		let len = frame.len();
		if len != Self::SIZE && len != Self::SIZE_WITH_CF_LIST {
			return Err(Error::FrameLength(len));
		}
		if frame[0] != mhdr::JOIN_ACCEPT {
			return Err(Error::MessageType(frame[0]));
		}

		let mut plain = [0u8; Self::SIZE_WITH_CF_LIST - 1];
		let plain = &mut plain[..len - 1];
		plain.copy_from_slice(&frame[1..]);
		for block in plain.chunks_exact_mut(16) {
			let block: &mut [u8; 16] = block.try_into().map_err(|_| Error::ZeroCopy)?;
			aes128_encrypt(app_key.as_bytes(), block);
		}

		let (fields, received_mic) = plain.split_at(plain.len() - MIC_SIZE);
		if mic(app_key.as_bytes(), &[&frame[..1], fields]) != received_mic {
			return Err(Error::InvalidMIC);
		}

		let (header, cf_list) =
			JoinAcceptHeader::ref_from_prefix(fields).map_err(|_| Error::ZeroCopy)?;
		let cf_list = match cf_list.len() {
			CF_LIST_SIZE => cf_list.try_into().ok(),
			_ => None,
		};

		let accept = Self {
			app_nonce: AppNonce(header.app_nonce),
			net_id: NetId(header.net_id),
			dev_addr: DevAddr::from_wire(header.dev_addr),
			rx1_dr_offset: (header.dl_settings >> 4) & 0b111,
			rx2_data_rate: header.dl_settings & 0x0f,
			rx_delay_s: (header.rx_delay & 0x0f).max(1),
			cf_list,
		};

		info!("join accept for {}", accept.dev_addr);

		Ok(accept)
	}

	pub fn session_keys(&self, app_key: &AppKey, dev_nonce: DevNonce) -> SessionKeys {
		SessionKeys::derive(app_key, self.app_nonce, self.net_id, dev_nonce)
	}
}
