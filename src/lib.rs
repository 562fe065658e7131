//! treasury-guard - Transaction normalization and approval policies for custody wallets
//!
//! Before a custody wallet signs anything it needs two answers:
//! - What does this unsigned transaction actually move, to whom, and in which coin
//! - Have enough of the right people approved it
//!
//! The [`chain`] module answers the first by decoding raw Ethereum
//! transactions into a [`TransferDescriptor`]. The [`policy`] module answers
//! the second with Blackbird approval policies stored inside a
//! [`PolicyEnvelope`].
//!
//! # Usage
//!
//! ```no_run
//! use treasury_guard::{ApproverSet, ChainAdapter, EthereumAdapter, PolicyPayload, PolicyRegistry};
//! # fn run(public_key: &[u8], raw_tx: &[u8], envelope: &treasury_guard::PolicyEnvelope) -> treasury_guard::Result<()> {
//! use treasury_guard::PolicyVariant;
//!
//! let adapter = EthereumAdapter::new(public_key, 1)?;
//! let transfer = adapter.parse_tx(raw_tx)?;
//!
//! let policy = PolicyRegistry::default().unpack(envelope)?;
//! policy.validate()?;
//!
//! let approvers: ApproverSet = ["foo"].into_iter().collect();
//! policy.verify(&approvers, &PolicyPayload::new(transfer.data_for_signing))?;
//! # Ok(())
//! # }
//! ```

pub mod chain;
pub mod config;
pub mod crypto;
pub mod errors;
pub mod policy;

pub use chain::{ChainAdapter, CoinIdentifier, EthereumAdapter, TransferDescriptor};
pub use config::Config;
pub use errors::{Result, TreasuryError};
pub use policy::{
    AnyPolicy, ApprovalEvaluator, ApproverSet, BlackbirdPolicy, PolicyEnvelope, PolicyPayload,
    PolicyRegistry, PolicyVariant,
};
