use crate::{
	credentials::AppKey,
	error::{Error, Result},
	lorawan::{
		Direction, MAX_FCNT_GAP, MAX_FRM_PAYLOAD, MIC_SIZE,
		crypto::{b0_block, crypt_frm_payload, mic},
		join::JoinAccept,
		keys::{DevAddr, DevNonce, SessionKeys},
		mhdr,
	},
};
use zerocopy::{
	FromBytes, Immutable, IntoBytes, KnownLayout,
	little_endian::{U16, U32},
};

#[derive(Clone, FromBytes, IntoBytes, KnownLayout, Immutable, Debug)]
#[repr(C)]
pub struct FrameHeader {
	pub mhdr: u8,
	pub dev_addr: U32,
	pub fctrl: FCtrl,
	pub fcnt: U16,
}

impl FrameHeader {
	pub const SIZE: usize = size_of::<Self>();
}

#[derive(Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Debug, Default, PartialEq, Eq)]
#[repr(C)]
pub struct FCtrl(u8);

impl FCtrl {
	pub const ADR: u8 = 0x80;
	pub const ACK: u8 = 0x20;
	/// Downlink only: the network has more data queued.
	pub const FPENDING: u8 = 0x10;

	pub fn ack(ack: bool) -> Self { Self((ack as u8) << 5) }

	pub fn get_ack(&self) -> bool { self.0 & Self::ACK != 0 }

	pub fn get_fpending(&self) -> bool { self.0 & Self::FPENDING != 0 }

	pub fn fopts_len(&self) -> usize { (self.0 & 0x0f) as usize }

	pub fn as_raw(&self) -> u8 { self.0 }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Downlink<'a> {
	pub confirmed: bool,
	pub ack: bool,
	pub fpending: bool,
	pub fcnt: u32,
	pub fopts: &'a [u8],
	pub port: Option<u8>,
	pub payload: &'a [u8],
}

/// An activated device session.
#[derive(Debug)]
pub struct Session {
	dev_addr: DevAddr,
	keys: SessionKeys,
	fcnt_up: u32,
	fcnt_down: Option<u32>,
	ack_pending: bool,
}

impl Session {
	pub const fn new(dev_addr: DevAddr, keys: SessionKeys) -> Self {
		Self {
			dev_addr,
			keys,
			fcnt_up: 0,
			fcnt_down: None,
			ack_pending: false,
		}
	}

	pub fn from_join_accept(accept: &JoinAccept, app_key: &AppKey, dev_nonce: DevNonce) -> Self {
		Self::new(accept.dev_addr, accept.session_keys(app_key, dev_nonce))
	}

	pub fn dev_addr(&self) -> DevAddr { self.dev_addr }

	pub fn fcnt_up(&self) -> u32 { self.fcnt_up }

	/// Builds the next data uplink into `buf` and advances the frame counter.
	pub fn uplink<'a>(
		&mut self,
		port: u8,
		payload: &[u8],
		confirmed: bool,
		buf: &'a mut [u8],
	) -> Result<&'a [u8]> {
		if port == 0 && !payload.is_empty() {
			return Err(Error::MacCommandPort);
		}
		if payload.len() > MAX_FRM_PAYLOAD {
			return Err(Error::PayloadTooLong(payload.len()));
		}
		if self.fcnt_up == u32::MAX {
			return Err(Error::FrameCounterExhausted);
		}

		let body_len = 1 + payload.len();
		let frame_len = FrameHeader::SIZE + body_len + MIC_SIZE;
		let buf = buf.get_mut(..frame_len).ok_or(Error::BufferTooSmall)?;

		let fcnt = self.fcnt_up;
		let (header, body) = FrameHeader::mut_from_prefix(buf).map_err(|_| Error::ZeroCopy)?;
		*header = FrameHeader {
			mhdr: if confirmed {
				mhdr::CONFIRMED_UP
			} else {
				mhdr::UNCONFIRMED_UP
			},
			dev_addr: U32::from_bytes(self.dev_addr.to_wire()),
			fctrl: FCtrl::ack(self.ack_pending),
			fcnt: U16::new(fcnt as u16),
		};

		body[0] = port;
		let frm_payload = &mut body[1..body_len];
		frm_payload.copy_from_slice(payload);
		crypt_frm_payload(self.payload_key(port), Direction::Up, self.dev_addr, fcnt, frm_payload);

		let msg_len = frame_len - MIC_SIZE;
		let b0 = b0_block(Direction::Up, self.dev_addr, fcnt, msg_len);
		let tag = mic(&self.keys.nwk_skey, &[b0.as_slice(), &buf[..msg_len]]);
		buf[msg_len..].copy_from_slice(&tag);

		self.fcnt_up += 1;
		self.ack_pending = false;

		Ok(buf)
	}

	/// Checks and decrypts a downlink into `buf`.
	pub fn downlink<'a>(&mut self, frame: &[u8], buf: &'a mut [u8]) -> Result<Downlink<'a>> {
		let len = frame.len();
		if len < FrameHeader::SIZE + MIC_SIZE {
			return Err(Error::FrameLength(len));
		}

		let (header, _) = FrameHeader::ref_from_prefix(frame).map_err(|_| Error::ZeroCopy)?;
		let confirmed = match header.mhdr & mhdr::MTYPE_MASK {
			mhdr::UNCONFIRMED_DOWN => false,
			mhdr::CONFIRMED_DOWN => true,
			_ => return Err(Error::MessageType(header.mhdr)),
		};

		let dev_addr = DevAddr::new(header.dev_addr.get());
		if dev_addr != self.dev_addr {
			return Err(Error::DevAddrMismatch(dev_addr.addr()));
		}

		let fopts_end = FrameHeader::SIZE + header.fctrl.fopts_len();
		let msg_len = len - MIC_SIZE;
		if fopts_end > msg_len {
			return Err(Error::FrameLength(len));
		}

		let fcnt = self.expand_fcnt_down(header.fcnt.get())?;

		let b0 = b0_block(Direction::Down, dev_addr, fcnt, msg_len);
		if mic(&self.keys.nwk_skey, &[b0.as_slice(), &frame[..msg_len]]) != frame[msg_len..] {
			return Err(Error::InvalidMIC);
		}

		let buf = buf.get_mut(..msg_len).ok_or(Error::BufferTooSmall)?;
		buf.copy_from_slice(&frame[..msg_len]);

		let port = if msg_len > fopts_end {
			let port = buf[fopts_end];
			if port == 0 && fopts_end > FrameHeader::SIZE {
				// MAC commands may not be sent in both FOpts and FRMPayload
				return Err(Error::MacCommandPort);
			}
			crypt_frm_payload(
				self.payload_key(port),
				Direction::Down,
				dev_addr,
				fcnt,
				&mut buf[fopts_end + 1..],
			);
			Some(port)
		} else {
			None
		};

		self.fcnt_down = Some(fcnt);
		self.ack_pending = confirmed;

		let buf: &'a [u8] = buf;
		let payload = match port {
			Some(_) => &buf[fopts_end + 1..],
			None => &[],
		};

		Ok(Downlink {
			confirmed,
			ack: header.fctrl.get_ack(),
			fpending: header.fctrl.get_fpending(),
			fcnt,
			fopts: &buf[FrameHeader::SIZE..fopts_end],
			port,
			payload,
		})
	}

	fn payload_key(&self, port: u8) -> [u8; 16] {
		if port == 0 {
			self.keys.nwk_skey
		} else {
			self.keys.app_skey
		}
	}

	/// Rebuilds the 32-bit counter from the 16 bits on air. Repeats and jumps
	/// beyond `MAX_FCNT_GAP` are rejected.
	fn expand_fcnt_down(&self, fcnt16: u16) -> Result<u32> {
		let Some(last) = self.fcnt_down else {
			return Ok(fcnt16 as u32);
		};

		let gap = fcnt16.wrapping_sub(last as u16) as u32;
		if gap == 0 || gap > MAX_FCNT_GAP {
			return Err(Error::FrameCounter(last.wrapping_add(gap)));
		}
		Ok(last.wrapping_add(gap))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::lorawan::crypto::Key;
	use pretty_assertions::assert_eq;

	const DEV_ADDR: DevAddr = DevAddr::new(0x2601_1f2a);
	const KEYS: SessionKeys = SessionKeys {
		nwk_skey: [0x15; 16],
		app_skey: [0x2a; 16],
	};

	/// Network side downlink with the 16-bit counter on air.
	fn build_downlink(mhdr: u8, fctrl: u8, fopts: &[u8], fcnt: u32, port: Option<(u8, &[u8])>) -> Vec<u8> {
		let mut frame = vec![mhdr];
		frame.extend_from_slice(&DEV_ADDR.to_wire());
		frame.push(fctrl | fopts.len() as u8);
		frame.extend_from_slice(&(fcnt as u16).to_le_bytes());
		frame.extend_from_slice(fopts);
		if let Some((port, payload)) = port {
			frame.push(port);
			let start = frame.len();
			frame.extend_from_slice(payload);
			let key: Key = if port == 0 { KEYS.nwk_skey } else { KEYS.app_skey };
			crypt_frm_payload(key, Direction::Down, DEV_ADDR, fcnt, &mut frame[start..]);
		}
		let b0 = b0_block(Direction::Down, DEV_ADDR, fcnt, frame.len());
		let tag = mic(&KEYS.nwk_skey, &[b0.as_slice(), frame.as_slice()]);
		frame.extend_from_slice(&tag);
		frame
	}

	#[test]
	fn uplink_layout() {
		let mut session = Session::new(DEV_ADDR, KEYS);
		let mut buf = [0u8; 64];
		let payload = [0x00, 0x0c, 0x00, 0x00, 0x00, 0x0c, 0x01, 0x00, 0x80, 0x02];

		let frame = session.uplink(1, &payload, false, &mut buf).unwrap().to_vec();
		assert_eq!(frame.len(), 8 + 1 + 10 + 4);
		assert_eq!(frame[..9], [0x40, 0x2a, 0x1f, 0x01, 0x26, 0x00, 0x00, 0x00, 0x01]);

		let mut decrypted = frame[9..19].to_vec();
		crypt_frm_payload(KEYS.app_skey, Direction::Up, DEV_ADDR, 0, &mut decrypted);
		assert_eq!(decrypted, payload);

		let b0 = b0_block(Direction::Up, DEV_ADDR, 0, 19);
		assert_eq!(frame[19..], mic(&KEYS.nwk_skey, &[b0.as_slice(), &frame[..19]]));

		assert_eq!(session.fcnt_up(), 1);
		let next = session.uplink(1, &payload, true, &mut buf).unwrap();
		assert_eq!(next[0], 0x80);
		assert_eq!(next[6..8], [0x01, 0x00]);
	}

	#[test]
	fn uplink_rejects_bad_input() {
		let mut session = Session::new(DEV_ADDR, KEYS);
		let mut buf = [0u8; 300];

		assert!(matches!(
			session.uplink(0, &[1], false, &mut buf),
			Err(Error::MacCommandPort)
		));
		assert!(matches!(
			session.uplink(1, &[0; 243], false, &mut buf),
			Err(Error::PayloadTooLong(243))
		));
		assert!(matches!(
			session.uplink(1, &[0; 10], false, &mut buf[..20]),
			Err(Error::BufferTooSmall)
		));
		assert_eq!(session.fcnt_up(), 0);
	}

	#[test]
	fn uplink_counter_exhaustion_forces_rejoin() {
		let mut session = Session::new(DEV_ADDR, KEYS);
		session.fcnt_up = u32::MAX - 1;
		let mut buf = [0u8; 64];

		let frame = session.uplink(1, &[0x01], false, &mut buf).unwrap();
		assert_eq!(frame[6..8], [0xfe, 0xff]);
		assert_eq!(session.fcnt_up(), u32::MAX);

		assert!(matches!(
			session.uplink(1, &[0x01], false, &mut buf),
			Err(Error::FrameCounterExhausted)
		));
		assert_eq!(session.fcnt_up(), u32::MAX);
	}

	#[test]
	fn port_zero_downlink_uses_network_key() {
		let mut session = Session::new(DEV_ADDR, KEYS);
		let commands = [0x02, 0x03, 0x04];
		let frame = build_downlink(mhdr::UNCONFIRMED_DOWN, 0, &[], 5, Some((0, commands.as_slice())));

		let mut on_air = commands.to_vec();
		crypt_frm_payload(KEYS.nwk_skey, Direction::Down, DEV_ADDR, 5, &mut on_air);
		assert_eq!(frame[9..12], *on_air.as_slice());

		let mut buf = [0u8; 64];
		let downlink = session.downlink(&frame, &mut buf).unwrap();
		assert_eq!(downlink.port, Some(0));
		assert_eq!(downlink.payload, &commands);
	}

	#[test]
	fn mac_commands_in_fopts_and_port_zero_rejected() {
		let mut session = Session::new(DEV_ADDR, KEYS);
		let frame = build_downlink(mhdr::UNCONFIRMED_DOWN, 0, &[0x02], 5, Some((0, [0x03].as_slice())));

		let mut buf = [0u8; 64];
		assert!(matches!(
			session.downlink(&frame, &mut buf),
			Err(Error::MacCommandPort)
		));

		// The counter is not consumed by the rejected frame
		let frame = build_downlink(mhdr::UNCONFIRMED_DOWN, 0, &[0x02], 5, None);
		assert_eq!(session.downlink(&frame, &mut buf).unwrap().fcnt, 5);
	}

	#[test]
	fn downlink_with_payload() {
		let mut session = Session::new(DEV_ADDR, KEYS);
		let frame = build_downlink(mhdr::UNCONFIRMED_DOWN, FCtrl::ACK, &[], 3, Some((2, b"howl".as_slice())));

		let mut buf = [0u8; 64];
		let downlink = session.downlink(&frame, &mut buf).unwrap();
		assert_eq!(
			downlink,
			Downlink {
				confirmed: false,
				ack: true,
				fpending: false,
				fcnt: 3,
				fopts: &[],
				port: Some(2),
				payload: b"howl",
			}
		);
	}

	#[test]
	fn confirmed_downlink_is_acked_on_next_uplink() {
		let mut session = Session::new(DEV_ADDR, KEYS);
		let frame = build_downlink(mhdr::CONFIRMED_DOWN, 0, &[0x02], 0, None);

		let mut buf = [0u8; 64];
		let downlink = session.downlink(&frame, &mut buf).unwrap();
		assert!(downlink.confirmed);
		assert_eq!(downlink.fopts, &[0x02]);
		assert_eq!(downlink.port, None);

		let uplink = session.uplink(1, &[0xaa], false, &mut buf).unwrap();
		assert_eq!(uplink[5], FCtrl::ACK);
		let uplink = session.uplink(1, &[0xaa], false, &mut buf).unwrap();
		assert_eq!(uplink[5], 0);
	}

	#[test]
	fn downlink_counter_rolls_over_and_rejects_replays() {
		let mut session = Session::new(DEV_ADDR, KEYS);
		let mut buf = [0u8; 64];

		let frame = build_downlink(mhdr::UNCONFIRMED_DOWN, 0, &[], 0xfffe, Some((1, [1].as_slice())));
		session.downlink(&frame, &mut buf).unwrap();

		let replay = frame.clone();
		assert!(matches!(
			session.downlink(&replay, &mut buf),
			Err(Error::FrameCounter(0xfffe))
		));

		let frame = build_downlink(mhdr::UNCONFIRMED_DOWN, 0, &[], 0x1_0001, Some((1, [2].as_slice())));
		let downlink = session.downlink(&frame, &mut buf).unwrap();
		assert_eq!(downlink.fcnt, 0x1_0001);
		assert_eq!(downlink.payload, &[2]);

		let far = build_downlink(mhdr::UNCONFIRMED_DOWN, 0, &[], 0x1_0001 + MAX_FCNT_GAP + 1, None);
		assert!(matches!(
			session.downlink(&far, &mut buf),
			Err(Error::FrameCounter(_))
		));
	}

	#[test]
	fn downlink_rejects_foreign_and_tampered_frames() {
		let mut session = Session::new(DEV_ADDR, KEYS);
		let mut buf = [0u8; 64];
		let frame = build_downlink(mhdr::UNCONFIRMED_DOWN, 0, &[], 1, Some((1, [9, 9].as_slice())));

		let mut foreign = frame.clone();
		foreign[1] ^= 0xff;
		assert!(matches!(
			session.downlink(&foreign, &mut buf),
			Err(Error::DevAddrMismatch(_))
		));

		let mut tampered = frame.clone();
		tampered[9] ^= 0x01;
		assert!(matches!(
			session.downlink(&tampered, &mut buf),
			Err(Error::InvalidMIC)
		));

		let mut uplink_type = frame.clone();
		uplink_type[0] = mhdr::UNCONFIRMED_UP;
		assert!(matches!(
			session.downlink(&uplink_type, &mut buf),
			Err(Error::MessageType(0x40))
		));

		assert!(matches!(
			session.downlink(&frame[..10], &mut buf),
			Err(Error::FrameLength(10))
		));

		// Rejected frames leave the counter untouched
		assert_eq!(session.downlink(&frame, &mut buf).unwrap().payload, &[9, 9]);
	}

	#[test]
	fn session_from_join_accept() {
		use crate::lorawan::join::{JoinAcceptHeader, tests::{APP_KEY, build_join_accept}};

		let header = JoinAcceptHeader {
			app_nonce: [0x10, 0x20, 0x30],
			net_id: [0x13, 0, 0],
			dev_addr: DEV_ADDR.to_wire(),
			dl_settings: 0,
			rx_delay: 1,
		};
		let frame = build_join_accept(&APP_KEY, &header, None);
		let accept = JoinAccept::decode(&APP_KEY, &frame).unwrap();
		let session = Session::from_join_accept(&accept, &APP_KEY, DevNonce::new(7));

		assert_eq!(session.dev_addr(), DEV_ADDR);
		assert_eq!(session.fcnt_up(), 0);
		assert_eq!(session.keys, accept.session_keys(&APP_KEY, DevNonce::new(7)));
	}
}
