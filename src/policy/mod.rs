//! Approval policies
//!
//! This module provides:
//! - The approval expression grammar and its evaluator
//! - The Blackbird policy
//! - Policy envelopes and the registry that unpacks them

pub mod blackbird;
pub mod envelope;
pub mod expression;
pub mod variant;

pub use blackbird::{BlackbirdPolicy, BlackbirdPolicyParticipant};
pub use envelope::{PolicyEnvelope, PolicyRegistry};
pub use expression::{
    ApprovalEvaluator, ApproverSet, BlackbirdEvaluator, ExpressionNode, NodeKind, PolicyPayload,
};
pub use variant::{AnyPolicy, PolicyVariant};
