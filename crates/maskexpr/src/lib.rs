//! Compiles boolean expressions over named bit flags into native predicates.
//!
//! An expression like `A && (B || C)` is parsed into a syntax tree, lowered
//! by the planner into a minimal set of mask tests, and JIT-compiled into a
//! directly callable function over an integer bitmask. The planner is where
//! the intelligence lives: constant folding, contradiction detection, and
//! merging of sibling bit tests into single wider mask comparisons. The
//! compiled predicate is truth-table equivalent to naive evaluation of the
//! original tree for every input.
//!
//! ```no_run
//! use maskexpr::{compile_with, LetterBits, Width};
//!
//! let pred = compile_with("A || (B && C)", &LetterBits, Width::W32).unwrap();
//! assert!(pred.eval(0b110)); // B and C set
//! assert!(!pred.eval(0b100)); // only C set
//! ```

mod ast;
mod error;
pub mod jit;
mod names;
mod parser;
mod plan;
mod planner;

#[cfg(test)]
mod tests;

pub use ast::AstNode;
pub use error::{ExprError, Result};
pub use jit::{compile_plan, JitPredicate, Width};
pub use names::{BitNames, Flags, LetterBits, NameTable};
pub use parser::parse;
pub use plan::ExecPlan;
pub use planner::plan;

use std::marker::PhantomData;

use names::FlagNames;

/// A compiled predicate strongly typed over a [`Flags`] type.
pub struct Predicate<T: Flags> {
    jit: JitPredicate,
    _marker: PhantomData<T>,
}

impl<T: Flags> Predicate<T> {
    /// Test a flag value against the compiled expression.
    #[inline]
    pub fn test(&self, flags: T) -> bool {
        self.jit.eval(flags.bits())
    }
}

/// Compile an expression into a typed predicate over `T`.
///
/// Identifiers resolve through `T`'s name table, and the predicate is
/// compiled at `T`'s storage width.
pub fn compile<T: Flags>(expression: &str) -> Result<Predicate<T>> {
    let jit = compile_with(expression, &FlagNames::<T>::new(), T::WIDTH)?;
    Ok(Predicate {
        jit,
        _marker: PhantomData,
    })
}

/// Compile an expression into a predicate over raw bitmasks.
///
/// Runs the whole pipeline: parse, plan against `names`, JIT at `width`.
pub fn compile_with(
    expression: &str,
    names: &dyn BitNames,
    width: Width,
) -> Result<JitPredicate> {
    let ast = parser::parse(expression)?;
    let plan = planner::plan(&ast, names)?;
    Ok(jit::compile_plan(&plan, width))
}
