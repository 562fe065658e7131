//! Approval expressions
//!
//! A policy stores its approval rule as an opaque expression blob. The
//! [`ApprovalEvaluator`] trait is the only place that understands the blob;
//! everything else in the crate treats it as bytes.
//!
//! [`BlackbirdEvaluator`] is the built-in evaluator. Its blobs are protobuf
//! encoded [`ExpressionNode`] trees:
//!
//! ```text
//! ExpressionNode {
//!     kind        = 1  (All | Threshold | Participant | Any)
//!     threshold   = 2  (Threshold nodes only)
//!     children    = 3  (composite nodes only)
//!     participant = 4  (Participant leaves only)
//! }
//! ```

use crate::config::PolicyConfig;
use crate::errors::{Result, TreasuryError};
use prost::Message;
use std::collections::BTreeSet;

/// Participants that asserted approval for a payload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApproverSet {
    approvers: BTreeSet<String>,
}

impl ApproverSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, abbreviation: impl Into<String>) -> bool {
        self.approvers.insert(abbreviation.into())
    }

    pub fn contains(&self, abbreviation: &str) -> bool {
        self.approvers.contains(abbreviation)
    }

    pub fn len(&self) -> usize {
        self.approvers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.approvers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.approvers.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for ApproverSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            approvers: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Opaque approval context (e.g. the digest of the transfer being approved)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyPayload(Vec<u8>);

impl PolicyPayload {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self(data.into())
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Understands one approval-expression encoding
pub trait ApprovalEvaluator: Send + Sync {
    /// Every participant abbreviation referenced by `expression`
    fn participants(&self, expression: &[u8]) -> Result<BTreeSet<String>>;

    /// Whether `approvers` satisfy `expression` for `payload`
    fn evaluate(
        &self,
        expression: &[u8],
        approvers: &ApproverSet,
        payload: &PolicyPayload,
    ) -> Result<bool>;
}

/// Node kinds of a Blackbird expression tree
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum NodeKind {
    Unspecified = 0,
    /// Every child must be satisfied
    All = 1,
    /// At least `threshold` children must be satisfied
    Threshold = 2,
    /// Satisfied when the named participant approved
    Participant = 3,
    /// At least one child must be satisfied
    Any = 4,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ExpressionNode {
    #[prost(enumeration = "NodeKind", tag = "1")]
    pub kind: i32,
    #[prost(uint32, tag = "2")]
    pub threshold: u32,
    #[prost(message, repeated, tag = "3")]
    pub children: Vec<ExpressionNode>,
    #[prost(string, tag = "4")]
    pub participant: String,
}

impl ExpressionNode {
    pub fn participant(abbreviation: impl Into<String>) -> Self {
        Self {
            kind: NodeKind::Participant as i32,
            participant: abbreviation.into(),
            ..Default::default()
        }
    }

    pub fn all(children: Vec<ExpressionNode>) -> Self {
        Self {
            kind: NodeKind::All as i32,
            children,
            ..Default::default()
        }
    }

    pub fn any(children: Vec<ExpressionNode>) -> Self {
        Self {
            kind: NodeKind::Any as i32,
            children,
            ..Default::default()
        }
    }

    pub fn threshold(threshold: u32, children: Vec<ExpressionNode>) -> Self {
        Self {
            kind: NodeKind::Threshold as i32,
            threshold,
            children,
            ..Default::default()
        }
    }

    fn collect_participants(&self, out: &mut BTreeSet<String>) {
        if self.kind() == NodeKind::Participant {
            out.insert(self.participant.clone());
        }
        for child in &self.children {
            child.collect_participants(out);
        }
    }

    fn is_satisfied(&self, approvers: &ApproverSet) -> bool {
        match self.kind() {
            NodeKind::Participant => approvers.contains(&self.participant),
            NodeKind::All => self.children.iter().all(|c| c.is_satisfied(approvers)),
            NodeKind::Any => self.children.iter().any(|c| c.is_satisfied(approvers)),
            NodeKind::Threshold => {
                let approved = self
                    .children
                    .iter()
                    .filter(|c| c.is_satisfied(approvers))
                    .count();
                approved >= self.threshold as usize
            }
            NodeKind::Unspecified => false,
        }
    }
}

/// Evaluator for protobuf encoded [`ExpressionNode`] trees
#[derive(Debug, Clone)]
pub struct BlackbirdEvaluator {
    max_depth: usize,
}

impl Default for BlackbirdEvaluator {
    fn default() -> Self {
        Self::from_config(&PolicyConfig::default())
    }
}

impl BlackbirdEvaluator {
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    pub fn from_config(config: &PolicyConfig) -> Self {
        Self::new(config.max_expression_depth)
    }

    /// Decode and structurally check an expression
    pub fn parse(&self, expression: &[u8]) -> Result<ExpressionNode> {
        let root = ExpressionNode::decode(expression)?;
        self.check(&root, 1)?;
        Ok(root)
    }

    fn check(&self, node: &ExpressionNode, depth: usize) -> Result<()> {
        if depth > self.max_depth {
            return Err(TreasuryError::InvalidExpression(format!(
                "expression nested deeper than {} levels",
                self.max_depth
            )));
        }

        let kind = NodeKind::try_from(node.kind).map_err(|_| {
            TreasuryError::InvalidExpression(format!("unknown node kind {}", node.kind))
        })?;

        match kind {
            NodeKind::Unspecified => {
                return Err(TreasuryError::InvalidExpression(
                    "node kind is not set".to_string(),
                ));
            }
            NodeKind::Participant => {
                if node.participant.is_empty() {
                    return Err(TreasuryError::InvalidExpression(
                        "participant node without abbreviation".to_string(),
                    ));
                }
                if !node.children.is_empty() {
                    return Err(TreasuryError::InvalidExpression(format!(
                        "participant node {} has children",
                        node.participant
                    )));
                }
            }
            NodeKind::All | NodeKind::Any => {
                if node.children.is_empty() {
                    return Err(TreasuryError::InvalidExpression(format!(
                        "{:?} node without children",
                        kind
                    )));
                }
            }
            NodeKind::Threshold => {
                let threshold = node.threshold as usize;
                if threshold == 0 || threshold > node.children.len() {
                    return Err(TreasuryError::InvalidExpression(format!(
                        "threshold {} out of range for {} children",
                        node.threshold,
                        node.children.len()
                    )));
                }
            }
        }

        for child in &node.children {
            self.check(child, depth + 1)?;
        }
        Ok(())
    }
}

impl ApprovalEvaluator for BlackbirdEvaluator {
    fn participants(&self, expression: &[u8]) -> Result<BTreeSet<String>> {
        let root = self.parse(expression)?;
        let mut participants = BTreeSet::new();
        root.collect_participants(&mut participants);
        Ok(participants)
    }

    fn evaluate(
        &self,
        expression: &[u8],
        approvers: &ApproverSet,
        _payload: &PolicyPayload,
    ) -> Result<bool> {
        Ok(self.parse(expression)?.is_satisfied(approvers))
    }
}
