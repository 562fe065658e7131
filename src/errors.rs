//! Error types for treasury-guard

use thiserror::Error;

/// Why a transaction does not describe exactly one kind of transfer
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeViolation {
    #[error(
        "both value and data are empty. For normal ETH transfers set only value, \
         for contract calls (e.g. ERC-20 transfers) set only data"
    )]
    NothingSpecified,

    #[error(
        "both value and data are set. For normal ETH transfers set only value, \
         for contract calls (e.g. ERC-20 transfers) set only data"
    )]
    OverSpecified,
}

/// Main error type for treasury-guard operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreasuryError {
    // Transaction decoding errors
    #[error("Failed to decode transaction: {0}")]
    Decode(String),

    #[error("Unsupported transaction type: 0x{0:02x}")]
    UnsupportedTxType(u8),

    #[error("Chain id mismatch: expected {expected}, transaction declares {found}")]
    ChainIdMismatch { expected: u64, found: u64 },

    #[error("Invalid Ethereum transaction: no recipient (contract creation is not a transfer)")]
    MissingRecipient,

    #[error("Invalid Ethereum transaction: {0}")]
    ShapeViolation(ShapeViolation),

    // ERC-20 detection errors
    #[error("Invalid ERC-20 transfer: data is too short ({len} bytes, need at least 68)")]
    ShortPayload { len: usize },

    #[error("Invalid ERC-20 transfer: method 0x{found} is not ERC-20 transfer")]
    SelectorMismatch { found: String },

    #[error("Invalid ERC-20 transfer: recipient address is not 20 bytes")]
    MalformedAddress,

    // Wallet errors
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    // Policy envelope errors
    #[error("Unknown policy type: {0}")]
    UnknownPolicyType(String),

    #[error("Malformed policy {type_url}: {reason}")]
    MalformedPolicy { type_url: String, reason: String },

    // Policy validation and verification errors
    #[error("Policy has no participants")]
    EmptyParticipants,

    #[error("Policy references unknown participants: {}", .0.join(", "))]
    MissingParticipant(Vec<String>),

    #[error("Invalid approval expression: {0}")]
    InvalidExpression(String),

    #[error("Policy not satisfied by the given approvers")]
    PolicyNotSatisfied,

    // Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<ShapeViolation> for TreasuryError {
    fn from(err: ShapeViolation) -> Self {
        TreasuryError::ShapeViolation(err)
    }
}

impl From<rlp::DecoderError> for TreasuryError {
    fn from(err: rlp::DecoderError) -> Self {
        TreasuryError::Decode(err.to_string())
    }
}

impl From<hex::FromHexError> for TreasuryError {
    fn from(err: hex::FromHexError) -> Self {
        TreasuryError::Decode(format!("Hex decode error: {}", err))
    }
}

impl From<prost::DecodeError> for TreasuryError {
    fn from(err: prost::DecodeError) -> Self {
        TreasuryError::InvalidExpression(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TreasuryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_violations_render_distinctly() {
        let empty = TreasuryError::from(ShapeViolation::NothingSpecified).to_string();
        let both = TreasuryError::from(ShapeViolation::OverSpecified).to_string();

        assert!(empty.contains("both value and data are empty"));
        assert!(both.contains("both value and data are set"));
    }

    #[test]
    fn test_missing_participant_lists_names() {
        let err = TreasuryError::MissingParticipant(vec!["bar".into(), "baz".into()]);
        assert_eq!(
            err.to_string(),
            "Policy references unknown participants: bar, baz"
        );
    }
}
