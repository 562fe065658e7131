//! Cryptographic utilities for Ethereum

pub mod eth;

pub use eth::{address_from_public_key, checksum_address, keccak256, Address};
