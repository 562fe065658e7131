//! Policy variants
//!
//! Every kind of approval policy implements [`PolicyVariant`]. The set of
//! kinds is closed: [`AnyPolicy`] lists them all, and the envelope registry
//! only ever decodes into it.

use crate::errors::Result;
use crate::policy::blackbird::BlackbirdPolicy;
use crate::policy::expression::{ApprovalEvaluator, ApproverSet, BlackbirdEvaluator, PolicyPayload};
use prost::{Message, Name};

/// Capability shared by all approval policies
pub trait PolicyVariant: Send + Sync {
    /// Structural check, run when the policy is configured
    fn validate_with(&self, evaluator: &dyn ApprovalEvaluator) -> Result<()>;

    /// Check that `approvers` satisfy the policy for `payload`.
    ///
    /// Only meaningful for policies that passed validation.
    fn verify_with(
        &self,
        evaluator: &dyn ApprovalEvaluator,
        approvers: &ApproverSet,
        payload: &PolicyPayload,
    ) -> Result<()>;

    /// [`validate_with`](Self::validate_with) over the built-in grammar at
    /// its default depth limit. Use `validate_with` with
    /// [`BlackbirdEvaluator::from_config`] to honor a loaded configuration.
    fn validate(&self) -> Result<()> {
        self.validate_with(&BlackbirdEvaluator::default())
    }

    /// [`verify_with`](Self::verify_with) over the built-in grammar at its
    /// default depth limit.
    fn verify(&self, approvers: &ApproverSet, payload: &PolicyPayload) -> Result<()> {
        self.verify_with(&BlackbirdEvaluator::default(), approvers, payload)
    }
}

/// One of the known policy kinds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnyPolicy {
    Blackbird(BlackbirdPolicy),
}

impl AnyPolicy {
    /// Type URL the policy is packed under
    pub fn type_url(&self) -> String {
        match self {
            AnyPolicy::Blackbird(_) => BlackbirdPolicy::type_url(),
        }
    }

    pub fn to_any(&self) -> prost_types::Any {
        let value = match self {
            AnyPolicy::Blackbird(p) => p.encode_to_vec(),
        };
        prost_types::Any {
            type_url: self.type_url(),
            value,
        }
    }

    pub fn as_blackbird(&self) -> Option<&BlackbirdPolicy> {
        match self {
            AnyPolicy::Blackbird(p) => Some(p),
        }
    }
}

impl From<BlackbirdPolicy> for AnyPolicy {
    fn from(policy: BlackbirdPolicy) -> Self {
        AnyPolicy::Blackbird(policy)
    }
}

impl PolicyVariant for AnyPolicy {
    fn validate_with(&self, evaluator: &dyn ApprovalEvaluator) -> Result<()> {
        match self {
            AnyPolicy::Blackbird(p) => p.validate_with(evaluator),
        }
    }

    fn verify_with(
        &self,
        evaluator: &dyn ApprovalEvaluator,
        approvers: &ApproverSet,
        payload: &PolicyPayload,
    ) -> Result<()> {
        match self {
            AnyPolicy::Blackbird(p) => p.verify_with(evaluator, approvers, payload),
        }
    }
}
