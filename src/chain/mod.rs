//! Chain adapters
//!
//! A chain adapter turns the raw unsigned transaction a wallet is asked to
//! sign into a chain-agnostic [`TransferDescriptor`] that authorization and
//! audit logic can reason about.

pub mod ethereum;
pub mod transaction;

pub use ethereum::{EthereumAdapter, EthereumTransfer, ERC20_TRANSFER_SELECTOR};
pub use transaction::{tx_type, Eip1559Transaction, EthereumTransaction, LegacyTransaction};

use crate::errors::Result;
use num_bigint::BigUint;

/// Per-chain wallet capability
pub trait ChainAdapter: Send + Sync {
    /// The wallet's public address in the chain's native encoding
    fn address(&self) -> String;

    /// Parse a raw unsigned transaction into a canonical transfer.
    ///
    /// Pure function of `raw` and the adapter's fixed configuration.
    fn parse_tx(&self, raw: &[u8]) -> Result<TransferDescriptor>;
}

/// Asset-class tag of a transfer.
///
/// The chain-currency prefix alone denotes the native currency; the prefix
/// followed by a contract address denotes a token of that contract.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CoinIdentifier {
    bytes: Vec<u8>,
    prefix_len: usize,
}

impl CoinIdentifier {
    pub fn native(prefix: &[u8]) -> Self {
        Self {
            bytes: prefix.to_vec(),
            prefix_len: prefix.len(),
        }
    }

    pub fn token(prefix: &[u8], contract: &[u8]) -> Self {
        let mut bytes = Vec::with_capacity(prefix.len() + contract.len());
        bytes.extend_from_slice(prefix);
        bytes.extend_from_slice(contract);
        Self {
            bytes,
            prefix_len: prefix.len(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn prefix(&self) -> &[u8] {
        &self.bytes[..self.prefix_len]
    }

    /// Token contract, `None` for the native currency
    pub fn contract(&self) -> Option<&[u8]> {
        let contract = &self.bytes[self.prefix_len..];
        (!contract.is_empty()).then_some(contract)
    }

    pub fn is_native(&self) -> bool {
        self.contract().is_none()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl AsRef<[u8]> for CoinIdentifier {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

/// Canonical description of an outgoing transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferDescriptor {
    /// Destination address bytes
    pub to: Vec<u8>,
    /// Amount in the asset's smallest unit
    pub amount: BigUint,
    /// Which asset is moved
    pub coin_identifier: CoinIdentifier,
    /// Exact bytes whose signature authorizes the transfer
    pub data_for_signing: Vec<u8>,
}

impl TransferDescriptor {
    pub fn is_native(&self) -> bool {
        self.coin_identifier.is_native()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_coin_identifier() {
        let coin = CoinIdentifier::native(b"ETH/");
        assert!(coin.is_native());
        assert_eq!(coin.as_bytes(), b"ETH/");
        assert_eq!(coin.contract(), None);
    }

    #[test]
    fn test_token_coin_identifier() {
        let contract = [0xab; 20];
        let coin = CoinIdentifier::token(b"ETH/", &contract);

        assert!(!coin.is_native());
        assert_eq!(coin.prefix(), b"ETH/");
        assert_eq!(coin.contract(), Some(&contract[..]));
        assert_eq!(coin.as_bytes().len(), 24);
        assert_ne!(coin, CoinIdentifier::native(b"ETH/"));
    }
}
