//! Execution plans: the minimal typed form a flag expression is lowered to.

use std::fmt;

/// The plan for executing an expression against an input bitmask.
///
/// A plan is built once by the planner, is immutable thereafter, and can be
/// evaluated directly (tree interpretation) or handed to the JIT backend.
///
/// Invariants upheld by the planner:
/// - `MaskEqual`/`MaskNotEqual` leaves never carry a zero mask;
/// - `value & !mask == 0` (test bits stay within the mask);
/// - `EvalAnd`/`EvalOr`/`EvalNot` inputs never contain `True` or `False`,
///   and the n-ary lists hold at least two entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecPlan {
    /// Always true.
    True,
    /// Always false.
    False,
    /// True iff `(input & mask) == value`.
    MaskEqual { mask: u64, value: u64 },
    /// True iff `(input & mask) != value`.
    MaskNotEqual { mask: u64, value: u64 },
    /// Short-circuit conjunction of sub-plans that could not be folded
    /// into a single mask test.
    EvalAnd(Vec<ExecPlan>),
    /// Short-circuit disjunction of sub-plans that could not be folded
    /// into a single mask test.
    EvalOr(Vec<ExecPlan>),
    /// Negation of a sub-plan that could not be simplified away.
    EvalNot(Box<ExecPlan>),
}

impl ExecPlan {
    /// Rewrite a single-bit `MaskNotEqual` as the equivalent `MaskEqual`.
    ///
    /// `(input & m) != v` over a one-bit mask is exactly
    /// `(input & m) == (v ^ m)`. Any other plan passes through unchanged.
    pub(crate) fn into_mask_equal(self) -> ExecPlan {
        match self {
            ExecPlan::MaskNotEqual { mask, value } if mask.is_power_of_two() => {
                ExecPlan::MaskEqual {
                    mask,
                    value: value ^ mask,
                }
            }
            other => other,
        }
    }

    /// Rewrite a single-bit `MaskEqual` as the equivalent `MaskNotEqual`.
    pub(crate) fn into_mask_not_equal(self) -> ExecPlan {
        match self {
            ExecPlan::MaskEqual { mask, value } if mask.is_power_of_two() => {
                ExecPlan::MaskNotEqual {
                    mask,
                    value: value ^ mask,
                }
            }
            other => other,
        }
    }

    /// Evaluate this plan by tree interpretation.
    ///
    /// Matches the JIT backend bit for bit; used for testing and as the
    /// non-JIT fallback path.
    pub fn evaluate(&self, input: u64) -> bool {
        match self {
            ExecPlan::True => true,
            ExecPlan::False => false,
            ExecPlan::MaskEqual { mask, value } => input & mask == *value,
            ExecPlan::MaskNotEqual { mask, value } => input & mask != *value,
            ExecPlan::EvalAnd(inputs) => inputs.iter().all(|p| p.evaluate(input)),
            ExecPlan::EvalOr(inputs) => inputs.iter().any(|p| p.evaluate(input)),
            ExecPlan::EvalNot(inner) => !inner.evaluate(input),
        }
    }
}

impl fmt::Display for ExecPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecPlan::True => f.write_str("True"),
            ExecPlan::False => f.write_str("False"),
            ExecPlan::MaskEqual { mask, value } => {
                write!(f, "(input & 0x{mask:02X}) == 0x{value:02X}")
            }
            ExecPlan::MaskNotEqual { mask, value } => {
                write!(f, "(input & 0x{mask:02X}) != 0x{value:02X}")
            }
            ExecPlan::EvalAnd(inputs) => {
                for (i, p) in inputs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" && ")?;
                    }
                    write!(f, "({p})")?;
                }
                Ok(())
            }
            ExecPlan::EvalOr(inputs) => {
                for (i, p) in inputs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" || ")?;
                    }
                    write!(f, "({p})")?;
                }
                Ok(())
            }
            ExecPlan::EvalNot(inner) => write!(f, "!({inner})"),
        }
    }
}
