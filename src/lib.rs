#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod beacon;
#[cfg(feature = "firmware")]
pub mod board;
pub mod config;
pub mod credentials;
pub mod error;
pub mod lorawan;
pub mod payload;
pub mod scan;
