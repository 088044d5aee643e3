//! Syntax trees for flag expressions.

use std::fmt::Write as _;

use crate::error::{ExprError, Result};
use crate::names::BitNames;

/// A node in a parsed flag expression.
///
/// `And` and `Or` are n-ary: a chain like `A && B && C` is one node with
/// three operands, and the constructors fold same-kind children in, so a
/// planner never sees `And(And(..))`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AstNode {
    /// A named flag, true when its bit is set in the input.
    Identifier(String),
    /// Conjunction over two or more operands.
    And(Vec<AstNode>),
    /// Disjunction over two or more operands.
    Or(Vec<AstNode>),
    /// Negation of a single operand.
    Not(Box<AstNode>),
}

impl AstNode {
    pub fn identifier(name: impl Into<String>) -> Self {
        AstNode::Identifier(name.into())
    }

    /// Conjunction node. Operands that are themselves `And` nodes are
    /// spliced in place, keeping the tree flat.
    pub fn and(operands: Vec<AstNode>) -> Self {
        let mut flat = Vec::with_capacity(operands.len());
        for op in operands {
            match op {
                AstNode::And(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        AstNode::And(flat)
    }

    /// Disjunction node. Same-kind operands are spliced like [`AstNode::and`].
    pub fn or(operands: Vec<AstNode>) -> Self {
        let mut flat = Vec::with_capacity(operands.len());
        for op in operands {
            match op {
                AstNode::Or(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        AstNode::Or(flat)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(operand: AstNode) -> Self {
        AstNode::Not(Box::new(operand))
    }

    /// Evaluate the tree directly against `input`, resolving identifiers
    /// through `names` on every visit.
    ///
    /// This is the reference semantics the planner and JIT backend must
    /// reproduce exactly. It is the slow path: use it for testing or
    /// one-shot evaluation, not hot loops.
    pub fn evaluate(&self, names: &dyn BitNames, input: u64) -> Result<bool> {
        match self {
            AstNode::Identifier(name) => {
                let bit = names
                    .bit_from_name(name)
                    .ok_or_else(|| ExprError::UnknownName(name.clone()))?;
                Ok(input & bit != 0)
            }
            AstNode::And(operands) => {
                for op in operands {
                    if !op.evaluate(names, input)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            AstNode::Or(operands) => {
                for op in operands {
                    if op.evaluate(names, input)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            AstNode::Not(operand) => Ok(!operand.evaluate(names, input)?),
        }
    }

    /// Multi-line indented rendering of the tree, for diagnostics.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.dump_into(&mut out, 1);
        out
    }

    fn dump_into(&self, out: &mut String, indent: usize) {
        let pad = "  ".repeat(indent);
        match self {
            AstNode::Identifier(name) => {
                let _ = writeln!(out, "{pad}Identifier '{name}'");
            }
            AstNode::And(operands) => {
                let _ = writeln!(out, "{pad}AND");
                for op in operands {
                    op.dump_into(out, indent + 1);
                }
            }
            AstNode::Or(operands) => {
                let _ = writeln!(out, "{pad}OR");
                for op in operands {
                    op.dump_into(out, indent + 1);
                }
            }
            AstNode::Not(operand) => {
                let _ = writeln!(out, "{pad}NOT");
                operand.dump_into(out, indent + 1);
            }
        }
    }
}
