//! Ethereum cryptographic utilities
//!
//! Provides:
//! - Keccak-256 hashing
//! - Address derivation from secp256k1 public keys
//! - EIP-55 checksummed address encoding and parsing

use crate::errors::{Result, TreasuryError};
use k256::ecdsa::VerifyingKey;
use sha3::{Digest, Keccak256};
use std::fmt;
use std::str::FromStr;

/// A 20-byte Ethereum account address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; 20]);

impl Address {
    pub const LEN: usize = 20;

    /// Create from a slice that must be exactly 20 bytes long
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let raw: [u8; 20] = bytes.try_into().map_err(|_| {
            TreasuryError::Decode(format!(
                "address must be {} bytes, got {}",
                Self::LEN,
                bytes.len()
            ))
        })?;
        Ok(Self(raw))
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    /// EIP-55 checksummed hex string with `0x` prefix
    pub fn to_checksum(&self) -> String {
        checksum_address(&self.0)
    }
}

impl From<[u8; 20]> for Address {
    fn from(raw: [u8; 20]) -> Self {
        Self(raw)
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_checksum())
    }
}

impl FromStr for Address {
    type Err = TreasuryError;

    fn from_str(s: &str) -> Result<Self> {
        parse_address(s).map(Self)
    }
}

/// Compute keccak256 hash
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

/// Derive the Ethereum address of a SEC1-encoded secp256k1 public key.
///
/// Accepts both compressed (33 bytes) and uncompressed (65 bytes) encodings.
pub fn address_from_public_key(public_key: &[u8]) -> Result<Address> {
    let verifying_key = VerifyingKey::from_sec1_bytes(public_key)
        .map_err(|e| TreasuryError::InvalidPublicKey(e.to_string()))?;
    let uncompressed = verifying_key.to_encoded_point(false);

    // Skip the 0x04 prefix and hash the remaining 64 bytes
    let hash = keccak256(&uncompressed.as_bytes()[1..]);
    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    Ok(Address(address))
}

/// Convert an address to checksummed format (EIP-55)
pub fn checksum_address(address: &[u8; 20]) -> String {
    let addr_hex = hex::encode(address);
    let hash = hex::encode(keccak256(addr_hex.as_bytes()));
    let hash = hash.as_bytes();

    let mut result = String::with_capacity(42);
    result.push_str("0x");

    for (i, c) in addr_hex.chars().enumerate() {
        if c.is_ascii_alphabetic() && hash[i] >= b'8' {
            result.push(c.to_ascii_uppercase());
        } else {
            result.push(c);
        }
    }

    result
}

/// Parse a hex address string to bytes
pub fn parse_address(addr: &str) -> Result<[u8; 20]> {
    let addr = addr.strip_prefix("0x").unwrap_or(addr);

    if addr.len() != 40 {
        return Err(TreasuryError::Decode(
            "Address must be 40 hex chars".to_string(),
        ));
    }

    let mut result = [0u8; 20];
    hex::decode_to_slice(addr, &mut result)?;
    Ok(result)
}
