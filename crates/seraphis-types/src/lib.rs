//! Core types and constants for the seraphis-rs workspace.
//!
//! This crate provides the foundations shared by every other crate:
//! network identifiers, the base32 alphabet used by encoded addresses,
//! the user-facing address string codec, and the varint wire codec.

pub mod address;
pub mod base32;
pub mod network;
pub mod varint;

pub use address::{parse_address, write_address, AddressError, DESTINATION_BYTES};
pub use network::Network;
