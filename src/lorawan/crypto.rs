use crate::lorawan::{Direction, MIC_SIZE, keys::DevAddr};
use aes::{
	Aes128,
	cipher::{BlockDecrypt, BlockEncrypt, KeyInit, KeyIvInit, StreamCipher, generic_array::GenericArray},
};
use cmac::{Cmac, Mac};
use ctr::Ctr32BE;

pub type Key = [u8; 16];

pub fn aes128_encrypt(key: &Key, block: &mut [u8; 16]) {
	let aes = Aes128::new(GenericArray::from_slice(key));
	aes.encrypt_block(GenericArray::from_mut_slice(block));
}

/// Network servers encrypt join accepts with AES decrypt; the inverse lives
/// here for building test frames and server-side tooling.
pub fn aes128_decrypt(key: &Key, block: &mut [u8; 16]) {
	let aes = Aes128::new(GenericArray::from_slice(key));
	aes.decrypt_block(GenericArray::from_mut_slice(block));
}

/// First four bytes of AES-CMAC over the concatenated parts.
pub fn mic(key: &Key, parts: &[&[u8]]) -> [u8; MIC_SIZE] {
	let mut mac = <Cmac<Aes128> as KeyInit>::new(GenericArray::from_slice(key));
	for part in parts {
		mac.update(part);
	}
	let full = mac.finalize().into_bytes();
	[full[0], full[1], full[2], full[3]]
}

/// B0 block prefixed to data frames before computing their MIC.
pub fn b0_block(dir: Direction, dev_addr: DevAddr, fcnt: u32, msg_len: usize) -> [u8; 16] {
	let mut b0 = [0u8; 16];
	b0[0] = 0x49;
	b0[5] = dir as u8;
	b0[6..10].copy_from_slice(&dev_addr.to_wire());
	b0[10..14].copy_from_slice(&fcnt.to_le_bytes());
	b0[15] = msg_len as u8;
	b0
}

/// FRMPayload encryption. The keystream is AES over A_i blocks whose last
/// byte counts up from 1, which is AES-CTR starting at A_1; payloads never
/// reach 256 blocks so the count stays in that byte.
pub fn crypt_frm_payload(key: Key, dir: Direction, dev_addr: DevAddr, fcnt: u32, data: &mut [u8]) {
	let mut a1 = [0u8; 16];
	a1[0] = 0x01;
	a1[5] = dir as u8;
	a1[6..10].copy_from_slice(&dev_addr.to_wire());
	a1[10..14].copy_from_slice(&fcnt.to_le_bytes());
	a1[15] = 0x01;

	let mut aes = Ctr32BE::<Aes128>::new(&key.into(), &a1.into());
	aes.apply_keystream(data);
}
