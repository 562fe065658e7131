//! Policy envelope
//!
//! Wallets store their approval policy as a [`PolicyEnvelope`]: an id, a
//! name and a `google.protobuf.Any` holding one concrete policy. The
//! [`PolicyRegistry`] maps the `Any` type URL back to a decoder, so
//! heterogeneous policy kinds share one storage field while callers get a
//! typed [`AnyPolicy`] back.

use crate::errors::{Result, TreasuryError};
use crate::policy::blackbird::BlackbirdPolicy;
use crate::policy::variant::{AnyPolicy, PolicyVariant};
use prost::{Message, Name};
use std::collections::BTreeMap;
use tracing::debug;

/// Stored policy container. Immutable once packed.
#[derive(Clone, PartialEq, Message)]
pub struct PolicyEnvelope {
    #[prost(uint64, tag = "1")]
    id: u64,
    #[prost(string, tag = "2")]
    name: String,
    #[prost(message, optional, tag = "3")]
    policy: Option<prost_types::Any>,
}

impl PolicyEnvelope {
    /// Wrap an already-encoded policy
    pub fn new(id: u64, name: impl Into<String>, policy: prost_types::Any) -> Self {
        Self {
            id,
            name: name.into(),
            policy: Some(policy),
        }
    }

    /// Pack a concrete policy under its own type URL
    pub fn pack<P>(id: u64, name: impl Into<String>, policy: &P) -> Self
    where
        P: PolicyVariant + Name,
    {
        Self::new(
            id,
            name,
            prost_types::Any {
                type_url: P::type_url(),
                value: policy.encode_to_vec(),
            },
        )
    }

    pub fn pack_any(id: u64, name: impl Into<String>, policy: &AnyPolicy) -> Self {
        Self::new(id, name, policy.to_any())
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn policy(&self) -> Option<&prost_types::Any> {
        self.policy.as_ref()
    }

    pub fn type_url(&self) -> Option<&str> {
        self.policy.as_ref().map(|any| any.type_url.as_str())
    }
}

type PolicyDecoder = fn(&[u8]) -> std::result::Result<AnyPolicy, prost::DecodeError>;

fn decode_as<P>(bytes: &[u8]) -> std::result::Result<AnyPolicy, prost::DecodeError>
where
    P: Message + Default + Into<AnyPolicy>,
{
    P::decode(bytes).map(Into::into)
}

/// Type URL to decoder mapping for every known policy kind
#[derive(Debug, Clone)]
pub struct PolicyRegistry {
    decoders: BTreeMap<String, PolicyDecoder>,
}

impl Default for PolicyRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register::<BlackbirdPolicy>();
        registry
    }
}

impl PolicyRegistry {
    /// A registry that knows no policy kinds
    pub fn empty() -> Self {
        Self {
            decoders: BTreeMap::new(),
        }
    }

    pub fn register<P>(&mut self)
    where
        P: Message + Name + Default + Into<AnyPolicy>,
    {
        self.decoders.insert(P::type_url(), decode_as::<P>);
    }

    pub fn is_registered(&self, type_url: &str) -> bool {
        self.decoders.contains_key(type_url)
    }

    pub fn type_urls(&self) -> impl Iterator<Item = &str> {
        self.decoders.keys().map(String::as_str)
    }

    /// Decode the policy held by `envelope`
    pub fn unpack(&self, envelope: &PolicyEnvelope) -> Result<AnyPolicy> {
        let any = envelope.policy().ok_or_else(|| {
            TreasuryError::UnknownPolicyType(format!("policy {} has no payload", envelope.id()))
        })?;

        let decoder = self
            .decoders
            .get(&any.type_url)
            .ok_or_else(|| TreasuryError::UnknownPolicyType(any.type_url.clone()))?;

        let policy = decoder(&any.value).map_err(|e| TreasuryError::MalformedPolicy {
            type_url: any.type_url.clone(),
            reason: e.to_string(),
        })?;

        debug!(
            id = envelope.id(),
            type_url = %any.type_url,
            "Unpacked policy"
        );
        Ok(policy)
    }
}
