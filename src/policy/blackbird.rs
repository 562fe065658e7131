//! Blackbird approval policy
//!
//! A Blackbird policy pairs an approval expression with a directory of the
//! participants the expression may name.

use crate::errors::{Result, TreasuryError};
use crate::policy::expression::{ApprovalEvaluator, ApproverSet, PolicyPayload};
use crate::policy::variant::PolicyVariant;
use tracing::{debug, warn};

#[derive(Clone, PartialEq, Eq, prost::Message)]
pub struct BlackbirdPolicy {
    /// Encoded approval expression
    #[prost(bytes = "vec", tag = "1")]
    pub data: Vec<u8>,
    /// Participant directory, in configuration order
    #[prost(message, repeated, tag = "2")]
    pub participants: Vec<BlackbirdPolicyParticipant>,
}

#[derive(Clone, PartialEq, Eq, prost::Message)]
pub struct BlackbirdPolicyParticipant {
    #[prost(string, tag = "1")]
    pub abbreviation: String,
    #[prost(string, tag = "2")]
    pub address: String,
}

impl prost::Name for BlackbirdPolicy {
    const NAME: &'static str = "BlackbirdPolicy";
    const PACKAGE: &'static str = "treasury.policy.v1";
}

impl BlackbirdPolicyParticipant {
    pub fn new(abbreviation: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            abbreviation: abbreviation.into(),
            address: address.into(),
        }
    }
}

impl BlackbirdPolicy {
    pub fn new(data: Vec<u8>, participants: Vec<BlackbirdPolicyParticipant>) -> Self {
        Self { data, participants }
    }

    /// Address registered for `abbreviation`
    pub fn participant_address(&self, abbreviation: &str) -> Option<&str> {
        self.participants
            .iter()
            .find(|p| p.abbreviation == abbreviation)
            .map(|p| p.address.as_str())
    }
}

impl PolicyVariant for BlackbirdPolicy {
    /// Every participant the expression references must be in the
    /// directory. Directory entries the expression never mentions are
    /// allowed.
    fn validate_with(&self, evaluator: &dyn ApprovalEvaluator) -> Result<()> {
        if self.participants.is_empty() {
            warn!("Rejected Blackbird policy without participants");
            return Err(TreasuryError::EmptyParticipants);
        }

        let missing: Vec<String> = evaluator
            .participants(&self.data)?
            .into_iter()
            .filter(|abbreviation| self.participant_address(abbreviation).is_none())
            .collect();

        if !missing.is_empty() {
            warn!(?missing, "Blackbird policy references unknown participants");
            return Err(TreasuryError::MissingParticipant(missing));
        }

        Ok(())
    }

    fn verify_with(
        &self,
        evaluator: &dyn ApprovalEvaluator,
        approvers: &ApproverSet,
        payload: &PolicyPayload,
    ) -> Result<()> {
        if evaluator.evaluate(&self.data, approvers, payload)? {
            debug!(approvers = approvers.len(), "Blackbird policy satisfied");
            Ok(())
        } else {
            warn!(
                approvers = ?approvers.iter().collect::<Vec<_>>(),
                "Blackbird policy not satisfied"
            );
            Err(TreasuryError::PolicyNotSatisfied)
        }
    }
}
