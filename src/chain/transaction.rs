//! Unsigned Ethereum transaction envelopes
//!
//! Decodes the two envelopes a wallet is asked to authorize:
//! - Legacy RLP transactions (6 fields, or 9 with `v, r, s` placeholders)
//! - EIP-1559 typed transactions (`0x02 || rlp(...)`)
//!
//! and recomputes the digest the signer has to sign for each of them.

use crate::crypto::{keccak256, Address};
use crate::errors::{Result, TreasuryError};
use num_bigint::BigUint;
use rlp::{Rlp, RlpStream};

/// Transaction type constants per EIP-2718.
pub mod tx_type {
    /// Legacy transaction (pre-EIP-2718).
    pub const LEGACY: u8 = 0x00;
    /// EIP-2930 access list transaction.
    pub const EIP2930: u8 = 0x01;
    /// EIP-1559 fee market transaction.
    pub const EIP1559: u8 = 0x02;
}

/// Largest integer width Ethereum allows in a transaction field
const MAX_UINT_BYTES: usize = 32;

/// A decoded, unsigned Ethereum transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EthereumTransaction {
    Legacy(LegacyTransaction),
    Eip1559(Eip1559Transaction),
}

impl EthereumTransaction {
    /// Decode raw transaction bytes.
    ///
    /// - Legacy: RLP list starting with 0xc0-0xff
    /// - Typed: type byte (0x00-0x7f) followed by the RLP payload
    ///
    /// The whole input must be consumed.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let Some(&first) = bytes.first() else {
            return Err(TreasuryError::Decode("empty transaction".to_string()));
        };

        match first {
            0xc0..=0xff => {
                let rlp = outer_list(bytes)?;
                Ok(Self::Legacy(LegacyTransaction::decode_rlp(&rlp)?))
            }
            tx_type::EIP1559 => {
                let rlp = outer_list(&bytes[1..])?;
                Ok(Self::Eip1559(Eip1559Transaction::decode_rlp(&rlp)?))
            }
            0x00..=0x7f => Err(TreasuryError::UnsupportedTxType(first)),
            _ => Err(TreasuryError::Decode(
                "expected an RLP list or a typed transaction".to_string(),
            )),
        }
    }

    pub fn tx_type(&self) -> u8 {
        match self {
            Self::Legacy(_) => tx_type::LEGACY,
            Self::Eip1559(_) => tx_type::EIP1559,
        }
    }

    /// Chain id embedded in the transaction itself (typed transactions only)
    pub fn chain_id(&self) -> Option<u64> {
        match self {
            Self::Legacy(_) => None,
            Self::Eip1559(tx) => Some(tx.chain_id),
        }
    }

    pub fn to(&self) -> Option<Address> {
        match self {
            Self::Legacy(tx) => tx.to,
            Self::Eip1559(tx) => tx.to,
        }
    }

    pub fn value(&self) -> &BigUint {
        match self {
            Self::Legacy(tx) => &tx.value,
            Self::Eip1559(tx) => &tx.value,
        }
    }

    pub fn data(&self) -> &[u8] {
        match self {
            Self::Legacy(tx) => &tx.data,
            Self::Eip1559(tx) => &tx.data,
        }
    }

    /// Digest the wallet key must sign for this transaction.
    ///
    /// Legacy transactions are hashed with EIP-155 replay protection for
    /// `chain_id`; typed transactions carry their own chain id.
    pub fn signing_hash(&self, chain_id: u64) -> [u8; 32] {
        match self {
            Self::Legacy(tx) => tx.signing_hash(chain_id),
            Self::Eip1559(tx) => tx.signing_hash(),
        }
    }
}

/// Legacy Ethereum transaction (pre-EIP-1559)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyTransaction {
    pub nonce: u64,
    pub gas_price: BigUint,
    pub gas_limit: u64,
    pub to: Option<Address>,
    pub value: BigUint,
    pub data: Vec<u8>,
}

impl LegacyTransaction {
    fn decode_rlp(rlp: &Rlp) -> Result<Self> {
        let count = rlp.item_count()?;
        if count != 6 && count != 9 {
            return Err(TreasuryError::Decode(format!(
                "legacy transaction has {} fields, expected 6 or 9",
                count
            )));
        }

        // v, r, s are placeholders on an unsigned transaction; only their
        // encoding is checked.
        for i in 6..count {
            uint_at(rlp, i)?;
        }

        Ok(Self {
            nonce: rlp.val_at(0)?,
            gas_price: uint_at(rlp, 1)?,
            gas_limit: rlp.val_at(2)?,
            to: address_at(rlp, 3)?,
            value: uint_at(rlp, 4)?,
            data: bytes_at(rlp, 5)?,
        })
    }

    /// RLP encode for signing (EIP-155)
    pub fn rlp_unsigned(&self, chain_id: u64) -> Vec<u8> {
        let mut stream = RlpStream::new_list(9);

        stream.append(&self.nonce);
        stream.append(&uint_to_be_bytes_trimmed(&self.gas_price).as_slice());
        stream.append(&self.gas_limit);

        match &self.to {
            Some(addr) => stream.append(&addr.as_bytes().as_slice()),
            None => stream.append_empty_data(),
        };

        stream.append(&uint_to_be_bytes_trimmed(&self.value).as_slice());
        stream.append(&self.data);
        stream.append(&chain_id);
        stream.append_empty_data();
        stream.append_empty_data();

        stream.out().to_vec()
    }

    pub fn signing_hash(&self, chain_id: u64) -> [u8; 32] {
        keccak256(&self.rlp_unsigned(chain_id))
    }
}

/// EIP-1559 transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Eip1559Transaction {
    pub chain_id: u64,
    pub nonce: u64,
    pub max_priority_fee_per_gas: BigUint,
    pub max_fee_per_gas: BigUint,
    pub gas_limit: u64,
    pub to: Option<Address>,
    pub value: BigUint,
    pub data: Vec<u8>,
    /// Access list exactly as it appeared on the wire (RLP list)
    pub access_list: Vec<u8>,
}

impl Eip1559Transaction {
    fn decode_rlp(rlp: &Rlp) -> Result<Self> {
        let count = rlp.item_count()?;
        if count != 9 && count != 12 {
            return Err(TreasuryError::Decode(format!(
                "EIP-1559 transaction has {} fields, expected 9 or 12",
                count
            )));
        }

        let access_list = rlp.at(8)?;
        if !access_list.is_list() {
            return Err(TreasuryError::Decode(
                "access list must be an RLP list".to_string(),
            ));
        }

        for i in 9..count {
            uint_at(rlp, i)?;
        }

        Ok(Self {
            chain_id: rlp.val_at(0)?,
            nonce: rlp.val_at(1)?,
            max_priority_fee_per_gas: uint_at(rlp, 2)?,
            max_fee_per_gas: uint_at(rlp, 3)?,
            gas_limit: rlp.val_at(4)?,
            to: address_at(rlp, 5)?,
            value: uint_at(rlp, 6)?,
            data: bytes_at(rlp, 7)?,
            access_list: access_list.as_raw().to_vec(),
        })
    }

    /// Typed payload for signing: `0x02 || rlp([chain_id, ..., access_list])`
    pub fn rlp_unsigned(&self) -> Vec<u8> {
        let mut stream = RlpStream::new_list(9);

        stream.append(&self.chain_id);
        stream.append(&self.nonce);
        stream.append(&uint_to_be_bytes_trimmed(&self.max_priority_fee_per_gas).as_slice());
        stream.append(&uint_to_be_bytes_trimmed(&self.max_fee_per_gas).as_slice());
        stream.append(&self.gas_limit);

        match &self.to {
            Some(addr) => stream.append(&addr.as_bytes().as_slice()),
            None => stream.append_empty_data(),
        };

        stream.append(&uint_to_be_bytes_trimmed(&self.value).as_slice());
        stream.append(&self.data);
        stream.append_raw(&self.access_list, 1);

        let mut result = vec![tx_type::EIP1559];
        result.extend(stream.out());
        result
    }

    pub fn signing_hash(&self) -> [u8; 32] {
        keccak256(&self.rlp_unsigned())
    }
}

/// Parse `bytes` as exactly one RLP list with nothing after it
fn outer_list(bytes: &[u8]) -> Result<Rlp<'_>> {
    let rlp = Rlp::new(bytes);
    if !rlp.is_list() {
        return Err(TreasuryError::Decode(
            "transaction payload is not an RLP list".to_string(),
        ));
    }
    let info = rlp.payload_info()?;
    if info.total() != bytes.len() {
        return Err(TreasuryError::Decode(format!(
            "{} trailing bytes after transaction",
            bytes.len().saturating_sub(info.total())
        )));
    }
    Ok(rlp)
}

fn bytes_at(rlp: &Rlp, index: usize) -> Result<Vec<u8>> {
    let item = rlp.at(index)?;
    if !item.is_data() {
        return Err(TreasuryError::Decode(format!(
            "field {} must be a byte string",
            index
        )));
    }
    Ok(item.data()?.to_vec())
}

fn uint_at(rlp: &Rlp, index: usize) -> Result<BigUint> {
    let bytes = bytes_at(rlp, index)?;
    if bytes.len() > MAX_UINT_BYTES {
        return Err(TreasuryError::Decode(format!(
            "field {} exceeds 256 bits",
            index
        )));
    }
    if bytes.first() == Some(&0) {
        return Err(TreasuryError::Decode(format!(
            "field {} has leading zero bytes",
            index
        )));
    }
    Ok(BigUint::from_bytes_be(&bytes))
}

fn address_at(rlp: &Rlp, index: usize) -> Result<Option<Address>> {
    let bytes = bytes_at(rlp, index)?;
    if bytes.is_empty() {
        return Ok(None);
    }
    Address::from_slice(&bytes).map(Some)
}

fn uint_to_be_bytes_trimmed(value: &BigUint) -> Vec<u8> {
    if value.bits() == 0 {
        return vec![];
    }
    value.to_bytes_be()
}
