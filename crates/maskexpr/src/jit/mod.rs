//! JIT compilation of execution plans to native machine code via Cranelift.
//!
//! This module compiles an [`ExecPlan`](crate::ExecPlan) into a native
//! function pointer, eliminating the plan-walking interpreter overhead for
//! predicates evaluated many times.
//!
//! # Function signature
//!
//! Compiled predicates take a single integer parameter of the configured
//! width and return an `i8` boolean (0 or 1):
//!
//! - [`Width::W32`]: `fn(input: u32) -> i8`
//! - [`Width::W64`]: `fn(input: u64) -> i8`
//!
//! Mask and test-value constants are emitted at the configured width; a
//! 64-bit plan's constants are never truncated.


mod compiler;

pub use compiler::{compile_plan, JitPredicate};

/// Input width a predicate is compiled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    /// 32-bit unsigned input.
    W32,
    /// 64-bit unsigned input.
    W64,
}
