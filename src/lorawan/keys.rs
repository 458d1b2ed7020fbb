use crate::{
	credentials::AppKey,
	lorawan::crypto::{Key, aes128_encrypt},
};
use core::fmt;
use rand_core::RngCore;

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct DevAddr(u32);

impl DevAddr {
	pub const fn new(addr: u32) -> Self { Self(addr) }

	pub const fn addr(&self) -> u32 { self.0 }

	pub const fn to_wire(&self) -> [u8; 4] { self.0.to_le_bytes() }

	pub const fn from_wire(bytes: [u8; 4]) -> Self { Self(u32::from_le_bytes(bytes)) }
}

impl fmt::Debug for DevAddr {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "DevAddr({:08X})", self.0) }
}

#[cfg(feature = "defmt")]
impl defmt::Format for DevAddr {
	fn format(&self, f: defmt::Formatter) { defmt::write!(f, "{=u32:08X}", self.0) }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DevNonce(u16);

impl DevNonce {
	pub const fn new(nonce: u16) -> Self { Self(nonce) }

	pub fn random<R: RngCore>(rng: &mut R) -> Self { Self(rng.next_u32() as u16) }

	pub const fn to_wire(&self) -> [u8; 2] { self.0.to_le_bytes() }
}

/// AppNonce as carried in the join accept, lsb first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AppNonce(pub [u8; 3]);

/// NetID as carried in the join accept, lsb first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NetId(pub [u8; 3]);

#[derive(Clone, Copy, PartialEq, Eq)]
pub struct SessionKeys {
	pub nwk_skey: Key,
	pub app_skey: Key,
}

impl SessionKeys {
	/// `aes128_encrypt(AppKey, tag | AppNonce | NetID | DevNonce | pad16)`
	pub fn derive(app_key: &AppKey, app_nonce: AppNonce, net_id: NetId, dev_nonce: DevNonce) -> Self {
		let derive_one = |tag: u8| {
			let mut block = [0u8; 16];
			block[0] = tag;
			block[1..4].copy_from_slice(&app_nonce.0);
			block[4..7].copy_from_slice(&net_id.0);
			block[7..9].copy_from_slice(&dev_nonce.to_wire());
			aes128_encrypt(app_key.as_bytes(), &mut block);
			block
		};

		Self {
			nwk_skey: derive_one(0x01),
			app_skey: derive_one(0x02),
		}
	}
}

impl fmt::Debug for SessionKeys {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str("SessionKeys(..)") }
}
