//! Lowers a syntax tree to the smallest equivalent [`ExecPlan`].
//!
//! The planner performs the algebra that makes compiled predicates fast:
//! constant folding, contradiction and tautology detection, and merging of
//! sibling mask tests. `A && B` over single-bit flags 0x1 and 0x2 plans to
//! one `(input & 0x03) == 0x03` test, not two branches.

use tracing::trace;

use crate::ast::AstNode;
use crate::error::{ExprError, Result};
use crate::names::BitNames;
use crate::plan::ExecPlan;

/// Compute the execution plan for a syntax tree.
///
/// Identifiers are resolved through `names` exactly once, here. An unknown
/// name aborts the whole compilation; no partial plan is returned.
pub fn plan(node: &AstNode, names: &dyn BitNames) -> Result<ExecPlan> {
    let plan = plan_node(node, names)?;
    trace!(%plan, "planned expression");
    Ok(plan)
}

fn plan_node(node: &AstNode, names: &dyn BitNames) -> Result<ExecPlan> {
    match node {
        AstNode::Identifier(name) => {
            let bit = names
                .bit_from_name(name)
                .ok_or_else(|| ExprError::UnknownName(name.clone()))?;
            // A zero bit can never be set, matching the tree evaluator's
            // `input & 0 != 0`. Also keeps zero masks out of plan leaves.
            if bit == 0 {
                return Ok(ExecPlan::False);
            }
            Ok(ExecPlan::MaskEqual {
                mask: bit,
                value: bit,
            })
        }
        AstNode::And(operands) => plan_and(operands, names),
        AstNode::Or(operands) => plan_or(operands, names),
        AstNode::Not(operand) => plan_not(operand, names),
    }
}

fn plan_and(operands: &[AstNode], names: &dyn BitNames) -> Result<ExecPlan> {
    // Plan each operand, normalizing single-bit not-equal tests to equal
    // tests so they can take part in the merge below.
    let mut plans = Vec::with_capacity(operands.len());
    for op in operands {
        plans.push(plan_node(op, names)?.into_mask_equal());
    }

    // Conjunction with an impossible condition is impossible.
    if plans.iter().any(|p| matches!(p, ExecPlan::False)) {
        return Ok(ExecPlan::False);
    }
    if plans.iter().all(|p| matches!(p, ExecPlan::True)) {
        return Ok(ExecPlan::True);
    }

    // True operands add no constraint.
    plans.retain(|p| !matches!(p, ExecPlan::True));

    // Fold all MaskEqual operands into one combined (mask, value), checking
    // each new test against the full accumulated pair: if a bit both cover
    // is claimed with different values, the conjunction is unsatisfiable.
    let mut merged_mask = 0u64;
    let mut merged_value = 0u64;
    let mut rest = Vec::with_capacity(plans.len());
    for p in plans {
        match p {
            ExecPlan::MaskEqual { mask, value } => {
                if merged_value & mask & merged_mask != value & mask & merged_mask {
                    return Ok(ExecPlan::False);
                }
                merged_mask |= mask;
                merged_value |= value;
            }
            other => rest.push(other),
        }
    }
    if merged_mask != 0 {
        rest.insert(
            0,
            ExecPlan::MaskEqual {
                mask: merged_mask,
                value: merged_value,
            },
        );
    }

    // A single contributing plan needs no EvalAnd wrapper.
    if rest.len() == 1 {
        return Ok(rest.remove(0));
    }
    Ok(ExecPlan::EvalAnd(rest))
}

fn plan_or(operands: &[AstNode], names: &dyn BitNames) -> Result<ExecPlan> {
    // Dual of plan_and: normalize single-bit equal tests to not-equal.
    let mut plans = Vec::with_capacity(operands.len());
    for op in operands {
        plans.push(plan_node(op, names)?.into_mask_not_equal());
    }

    if plans.iter().any(|p| matches!(p, ExecPlan::True)) {
        return Ok(ExecPlan::True);
    }
    if plans.iter().all(|p| matches!(p, ExecPlan::False)) {
        return Ok(ExecPlan::False);
    }

    plans.retain(|p| !matches!(p, ExecPlan::False));

    // Fold MaskNotEqual operands. A conflict on a shared bit means the two
    // tests cannot fail simultaneously, so the disjunction is a tautology.
    let mut merged_mask = 0u64;
    let mut merged_value = 0u64;
    let mut rest = Vec::with_capacity(plans.len());
    for p in plans {
        match p {
            ExecPlan::MaskNotEqual { mask, value } => {
                if merged_value & mask & merged_mask != value & mask & merged_mask {
                    return Ok(ExecPlan::True);
                }
                merged_mask |= mask;
                merged_value |= value;
            }
            other => rest.push(other),
        }
    }
    if merged_mask != 0 {
        rest.insert(
            0,
            ExecPlan::MaskNotEqual {
                mask: merged_mask,
                value: merged_value,
            },
        );
    }

    if rest.len() == 1 {
        return Ok(rest.remove(0));
    }
    Ok(ExecPlan::EvalOr(rest))
}

fn plan_not(operand: &AstNode, names: &dyn BitNames) -> Result<ExecPlan> {
    let inner = plan_node(operand, names)?;
    Ok(match inner {
        ExecPlan::True => ExecPlan::False,
        ExecPlan::False => ExecPlan::True,
        // Flipping the comparison over the same mask/value pair is the full
        // complement of the test, for any mask.
        ExecPlan::MaskEqual { mask, value } => ExecPlan::MaskNotEqual { mask, value },
        ExecPlan::MaskNotEqual { mask, value } => ExecPlan::MaskEqual { mask, value },
        inner => ExecPlan::EvalNot(Box::new(inner)),
    })
}
