//! Ethereum chain adapter
//!
//! Classifies an unsigned transaction as either a native ETH transfer or an
//! ERC-20 `transfer(address,uint256)` call and normalizes it into a
//! [`TransferDescriptor`].

use crate::chain::transaction::{tx_type, EthereumTransaction};
use crate::chain::{ChainAdapter, CoinIdentifier, TransferDescriptor};
use crate::config::EthereumConfig;
use crate::crypto::{address_from_public_key, Address};
use crate::errors::{Result, ShapeViolation, TreasuryError};
use num_bigint::BigUint;
use tracing::debug;

/// keccak256("transfer(address,uint256)")[0..4]
pub const ERC20_TRANSFER_SELECTOR: [u8; 4] = [0xa9, 0x05, 0x9c, 0xbb];

const WORD: usize = 32;

/// selector + recipient word + amount word
const ERC20_TRANSFER_MIN_LEN: usize = 4 + WORD + WORD;

/// An ETH transfer or an ERC-20 transfer on Ethereum
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EthereumTransfer {
    /// Destination of the transfer
    pub to: Address,

    /// Amount being transferred
    pub amount: BigUint,

    /// `None` for native ETH, the token contract for ERC-20 transfers
    pub contract: Option<Address>,

    pub data_for_signing: [u8; 32],
}

/// Ethereum wallet adapter
#[derive(Debug, Clone)]
pub struct EthereumAdapter {
    address: Address,
    chain_id: u64,
    coin_prefix: Vec<u8>,
    accept_typed_transactions: bool,
}

impl EthereumAdapter {
    /// Create an adapter for the wallet owning `public_key` (SEC1 encoded)
    pub fn new(public_key: &[u8], chain_id: u64) -> Result<Self> {
        Self::from_config(
            &EthereumConfig {
                chain_id,
                ..EthereumConfig::default()
            },
            public_key,
        )
    }

    pub fn from_config(config: &EthereumConfig, public_key: &[u8]) -> Result<Self> {
        Ok(Self {
            address: address_from_public_key(public_key)?,
            chain_id: config.chain_id,
            coin_prefix: config.coin_prefix.as_bytes().to_vec(),
            accept_typed_transactions: config.accept_typed_transactions,
        })
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn wallet_address(&self) -> Address {
        self.address
    }

    /// Coin identifier for native ETH or for the given token contract
    pub fn coin_identifier(&self, contract: Option<&Address>) -> CoinIdentifier {
        match contract {
            Some(contract) => CoinIdentifier::token(&self.coin_prefix, contract.as_bytes()),
            None => CoinIdentifier::native(&self.coin_prefix),
        }
    }

    /// Decode and classify a raw unsigned transaction
    pub fn parse_transfer(&self, raw: &[u8]) -> Result<EthereumTransfer> {
        let tx = EthereumTransaction::decode(raw)?;
        if tx.tx_type() != tx_type::LEGACY && !self.accept_typed_transactions {
            return Err(TreasuryError::UnsupportedTxType(tx.tx_type()));
        }
        classify_transfer(&tx, self.chain_id)
    }
}

impl ChainAdapter for EthereumAdapter {
    fn address(&self) -> String {
        self.address.to_checksum()
    }

    fn parse_tx(&self, raw: &[u8]) -> Result<TransferDescriptor> {
        let transfer = self.parse_transfer(raw)?;

        debug!(
            to = %transfer.to,
            amount = %transfer.amount,
            contract = ?transfer.contract.map(|c| c.to_checksum()),
            "Parsed Ethereum transfer"
        );

        Ok(TransferDescriptor {
            to: transfer.to.to_vec(),
            coin_identifier: self.coin_identifier(transfer.contract.as_ref()),
            amount: transfer.amount,
            data_for_signing: transfer.data_for_signing.to_vec(),
        })
    }
}

/// Parse an unsigned transaction that can be an ETH transfer or an ERC-20
/// transfer.
pub fn parse_ethereum_transaction(chain_id: u64, raw: &[u8]) -> Result<EthereumTransfer> {
    let tx = EthereumTransaction::decode(raw)?;
    classify_transfer(&tx, chain_id)
}

/// Classify a decoded transaction.
///
/// Exactly one of value and data must be set: value for ETH transfers, data
/// for contract calls.
pub fn classify_transfer(tx: &EthereumTransaction, chain_id: u64) -> Result<EthereumTransfer> {
    if let Some(found) = tx.chain_id() {
        if found != chain_id {
            return Err(TreasuryError::ChainIdMismatch {
                expected: chain_id,
                found,
            });
        }
    }

    let has_value = tx.value().bits() > 0;
    let has_data = !tx.data().is_empty();

    match (has_value, has_data) {
        (false, false) => Err(ShapeViolation::NothingSpecified.into()),
        (true, true) => Err(ShapeViolation::OverSpecified.into()),
        (true, false) => {
            let to = tx.to().ok_or(TreasuryError::MissingRecipient)?;
            Ok(EthereumTransfer {
                to,
                amount: tx.value().clone(),
                contract: None,
                data_for_signing: tx.signing_hash(chain_id),
            })
        }
        (false, true) => {
            let contract = tx.to().ok_or(TreasuryError::MissingRecipient)?;
            let (to, amount) = parse_erc20_transfer(tx.data())?;
            Ok(EthereumTransfer {
                to,
                amount,
                contract: Some(contract),
                data_for_signing: tx.signing_hash(chain_id),
            })
        }
    }
}

/// Decode `transfer(address,uint256)` calldata into (recipient, amount).
///
/// Layout:
/// - 4 bytes: method selector (0xa9059cbb)
/// - 32 bytes: recipient address, left-padded with zeros
/// - 32 bytes: amount, big-endian
pub fn parse_erc20_transfer(data: &[u8]) -> Result<(Address, BigUint)> {
    if data.len() < ERC20_TRANSFER_MIN_LEN {
        return Err(TreasuryError::ShortPayload { len: data.len() });
    }

    let (method, args) = data.split_at(4);
    let recipient = &args[..WORD];
    let amount = &args[WORD..2 * WORD];

    if method != ERC20_TRANSFER_SELECTOR {
        return Err(TreasuryError::SelectorMismatch {
            found: hex::encode(method),
        });
    }

    if recipient[..12].iter().any(|&b| b != 0) {
        return Err(TreasuryError::MalformedAddress);
    }

    let to = Address::from_slice(&recipient[12..])?;
    Ok((to, BigUint::from_bytes_be(amount)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use k256::ecdsa::SigningKey;
    use k256::elliptic_curve::sec1::ToEncodedPoint;
    use rlp::RlpStream;

    const CHAIN_ID: u64 = 1;
    const CONTRACT: [u8; 20] = [0xc0; 20];
    const RECIPIENT: [u8; 20] = [0x42; 20];

    fn wallet_public_key() -> Vec<u8> {
        let mut secret = [0u8; 32];
        secret[31] = 1;
        let key = SigningKey::from_slice(&secret).unwrap();
        key.verifying_key().to_encoded_point(true).as_bytes().to_vec()
    }

    fn adapter() -> EthereumAdapter {
        EthereumAdapter::new(&wallet_public_key(), CHAIN_ID).unwrap()
    }

    fn legacy_tx(to: Option<[u8; 20]>, value: &[u8], data: &[u8]) -> Vec<u8> {
        let mut stream = RlpStream::new_list(9);
        stream.append(&0u64);
        stream.append(&20_000_000_000u64);
        stream.append(&60_000u64);
        match to {
            Some(addr) => stream.append(&addr.as_slice()),
            None => stream.append_empty_data(),
        };
        stream.append(&value);
        stream.append(&data);
        stream.append_empty_data();
        stream.append_empty_data();
        stream.append_empty_data();
        stream.out().to_vec()
    }

    fn erc20_calldata(recipient: &[u8; 20], amount: u64) -> Vec<u8> {
        let mut data = ERC20_TRANSFER_SELECTOR.to_vec();
        data.extend_from_slice(&[0u8; 12]);
        data.extend_from_slice(recipient);
        data.extend_from_slice(&[0u8; 24]);
        data.extend_from_slice(&amount.to_be_bytes());
        data
    }

    #[test]
    fn test_wallet_address() {
        assert_eq!(
            adapter().address(),
            "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf"
        );
    }

    #[test]
    fn test_native_transfer() {
        let raw = legacy_tx(Some(RECIPIENT), &[0x03, 0xe8], &[]);
        let transfer = adapter().parse_tx(&raw).unwrap();

        assert_eq!(transfer.to, RECIPIENT.to_vec());
        assert_eq!(transfer.amount, BigUint::from(1000u32));
        assert_eq!(transfer.coin_identifier.as_bytes(), b"ETH/");
        assert!(transfer.is_native());

        let tx = EthereumTransaction::decode(&raw).unwrap();
        assert_eq!(transfer.data_for_signing, tx.signing_hash(CHAIN_ID).to_vec());
    }

    #[test]
    fn test_erc20_transfer() {
        let raw = legacy_tx(Some(CONTRACT), &[], &erc20_calldata(&RECIPIENT, 1000));
        let transfer = adapter().parse_tx(&raw).unwrap();

        let mut expected_coin = b"ETH/".to_vec();
        expected_coin.extend_from_slice(&CONTRACT);

        assert_eq!(transfer.to, RECIPIENT.to_vec());
        assert_eq!(transfer.amount, BigUint::from(1000u32));
        assert_eq!(transfer.coin_identifier.as_bytes(), expected_coin.as_slice());
        assert_eq!(transfer.coin_identifier.contract(), Some(&CONTRACT[..]));
        assert_eq!(transfer.data_for_signing.len(), 32);
    }

    #[test]
    fn test_erc20_full_width_amount() {
        let mut data = erc20_calldata(&RECIPIENT, 0);
        let len = data.len();
        data[len - WORD..].copy_from_slice(&[0xff; 32]);

        let (_, amount) = parse_erc20_transfer(&data).unwrap();
        assert_eq!(amount.bits(), 256);
    }

    #[test]
    fn test_erc20_trailing_data_is_ignored() {
        let mut data = erc20_calldata(&RECIPIENT, 7);
        data.extend_from_slice(&[0xee; 5]);

        let (to, amount) = parse_erc20_transfer(&data).unwrap();
        assert_eq!(to, Address::from(RECIPIENT));
        assert_eq!(amount, BigUint::from(7u32));
    }

    #[test]
    fn test_nothing_specified() {
        let raw = legacy_tx(Some(RECIPIENT), &[], &[]);
        assert_eq!(
            adapter().parse_tx(&raw).unwrap_err(),
            TreasuryError::ShapeViolation(ShapeViolation::NothingSpecified)
        );
    }

    #[test]
    fn test_over_specified() {
        let raw = legacy_tx(Some(CONTRACT), &[0x01], &erc20_calldata(&RECIPIENT, 1));
        assert_eq!(
            adapter().parse_tx(&raw).unwrap_err(),
            TreasuryError::ShapeViolation(ShapeViolation::OverSpecified)
        );
    }

    #[test]
    fn test_short_payload() {
        let data = erc20_calldata(&RECIPIENT, 1);
        let raw = legacy_tx(Some(CONTRACT), &[], &data[..67]);
        assert_eq!(
            adapter().parse_tx(&raw).unwrap_err(),
            TreasuryError::ShortPayload { len: 67 }
        );
    }

    #[test]
    fn test_wrong_selector() {
        let mut data = erc20_calldata(&RECIPIENT, 1);
        // approve(address,uint256)
        data[..4].copy_from_slice(&[0x09, 0x5e, 0xa7, 0xb3]);
        let raw = legacy_tx(Some(CONTRACT), &[], &data);
        assert_eq!(
            adapter().parse_tx(&raw).unwrap_err(),
            TreasuryError::SelectorMismatch {
                found: "095ea7b3".to_string()
            }
        );
    }

    #[test]
    fn test_malformed_recipient() {
        let mut data = erc20_calldata(&RECIPIENT, 1);
        data[4] = 0x01;
        let raw = legacy_tx(Some(CONTRACT), &[], &data);
        assert_eq!(
            adapter().parse_tx(&raw).unwrap_err(),
            TreasuryError::MalformedAddress
        );
    }

    #[test]
    fn test_contract_creation_is_rejected() {
        let raw = legacy_tx(None, &[0x01], &[]);
        assert_eq!(
            adapter().parse_tx(&raw).unwrap_err(),
            TreasuryError::MissingRecipient
        );
    }

    #[test]
    fn test_garbage_is_a_decode_error() {
        let err = adapter().parse_tx(&[0x01, 0x02, 0x03]).unwrap_err();
        assert!(matches!(err, TreasuryError::UnsupportedTxType(0x01)));

        let err = adapter().parse_tx(&[0xf8, 0xff]).unwrap_err();
        assert!(matches!(err, TreasuryError::Decode(_)));
    }

    #[test]
    fn test_parsing_is_deterministic() {
        let raw = legacy_tx(Some(CONTRACT), &[], &erc20_calldata(&RECIPIENT, 55));
        let adapter = adapter();
        assert_eq!(adapter.parse_tx(&raw).unwrap(), adapter.parse_tx(&raw).unwrap());
    }

    #[test]
    fn test_signing_hash_depends_on_chain_id() {
        let raw = legacy_tx(Some(RECIPIENT), &[0x01], &[]);
        let mainnet = parse_ethereum_transaction(1, &raw).unwrap();
        let sepolia = parse_ethereum_transaction(11_155_111, &raw).unwrap();
        assert_ne!(mainnet.data_for_signing, sepolia.data_for_signing);
    }

    fn eip1559_tx(chain_id: u64) -> Vec<u8> {
        crate::chain::Eip1559Transaction {
            chain_id,
            nonce: 0,
            max_priority_fee_per_gas: BigUint::from(1u32),
            max_fee_per_gas: BigUint::from(2u32),
            gas_limit: 21000,
            to: Some(Address::from(RECIPIENT)),
            value: BigUint::from(9u32),
            data: vec![],
            access_list: vec![0xc0],
        }
        .rlp_unsigned()
    }

    #[test]
    fn test_typed_transaction() {
        let transfer = adapter().parse_tx(&eip1559_tx(CHAIN_ID)).unwrap();
        assert_eq!(transfer.amount, BigUint::from(9u32));
        assert!(transfer.is_native());
    }

    #[test]
    fn test_typed_transaction_for_other_chain() {
        assert_eq!(
            adapter().parse_tx(&eip1559_tx(5)).unwrap_err(),
            TreasuryError::ChainIdMismatch {
                expected: 1,
                found: 5
            }
        );
    }

    #[test]
    fn test_typed_transactions_can_be_disabled() {
        let config = EthereumConfig {
            accept_typed_transactions: false,
            ..EthereumConfig::default()
        };
        let adapter = EthereumAdapter::from_config(&config, &wallet_public_key()).unwrap();
        assert_eq!(
            adapter.parse_tx(&eip1559_tx(CHAIN_ID)).unwrap_err(),
            TreasuryError::UnsupportedTxType(tx_type::EIP1559)
        );
    }

    #[test]
    fn test_custom_coin_prefix() {
        let config = EthereumConfig {
            chain_id: 11_155_111,
            coin_prefix: "SEP/".to_string(),
            accept_typed_transactions: true,
        };
        let adapter = EthereumAdapter::from_config(&config, &wallet_public_key()).unwrap();
        let raw = legacy_tx(Some(RECIPIENT), &[0x01], &[]);
        assert_eq!(
            adapter.parse_tx(&raw).unwrap().coin_identifier.as_bytes(),
            b"SEP/"
        );
    }
}
