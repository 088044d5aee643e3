//! Cranelift codegen for execution plans.
//!
//! Lowering is mechanical: each plan node emits straight-line bitwise code,
//! and `EvalAnd`/`EvalOr` emit short-circuit control flow through a shared
//! merge block, so later siblings are never evaluated once the outcome is
//! decided. The planner guarantees every plan shape reaching this module is
//! covered by a generation rule.
//!
//! # Zero-Fallback Policy
//!
//! If Cranelift codegen fails for any reason, the process panics. A failure
//! here is a planner or backend bug, never a user error, and must not be
//! silently swallowed.

use cranelift_codegen::ir::condcodes::IntCC;
use cranelift_codegen::ir::types::{I32, I64, I8};
use cranelift_codegen::ir::{
    AbiParam, Function, InstBuilder, Signature, Type, UserFuncName, Value,
};
use cranelift_codegen::isa::CallConv;
use cranelift_codegen::settings::{self, Configurable};
use cranelift_codegen::Context;
use cranelift_frontend::{FunctionBuilder, FunctionBuilderContext};
use cranelift_jit::{JITBuilder, JITModule};
use cranelift_module::{Linkage, Module};
use tracing::debug;

use super::Width;
use crate::plan::ExecPlan;

/// A JIT-compiled predicate. Owns the Cranelift module (code memory) and
/// holds the raw function pointer plus the width it was compiled for.
pub struct JitPredicate {
    _module: JITModule,
    ptr: *const u8,
    width: Width,
}

// SAFETY: JITModule owns the code memory. ptr is valid for the module's
// lifetime, and the generated code only reads its argument.
unsafe impl Send for JitPredicate {}
unsafe impl Sync for JitPredicate {}

impl JitPredicate {
    /// The input width this predicate was compiled for.
    pub fn width(&self) -> Width {
        self.width
    }

    /// Evaluate against a 64-bit input.
    #[inline]
    pub fn eval_u64(&self, input: u64) -> bool {
        debug_assert_eq!(self.width, Width::W64);
        let f: unsafe extern "C" fn(u64) -> i8 = unsafe { std::mem::transmute(self.ptr) };
        unsafe { f(input) != 0 }
    }

    /// Evaluate against a 32-bit input.
    #[inline]
    pub fn eval_u32(&self, input: u32) -> bool {
        debug_assert_eq!(self.width, Width::W32);
        let f: unsafe extern "C" fn(u32) -> i8 = unsafe { std::mem::transmute(self.ptr) };
        unsafe { f(input) != 0 }
    }

    /// Width-dispatching call. A `W32` predicate sees the low 32 bits.
    #[inline]
    pub fn eval(&self, input: u64) -> bool {
        match self.width {
            Width::W32 => self.eval_u32(input as u32),
            Width::W64 => self.eval_u64(input),
        }
    }
}

/// Compile an execution plan into a native predicate for the given width.
///
/// # Panics
///
/// Panics if Cranelift codegen fails. Zero fallback — a failure here is an
/// internal invariant violation, not a user-facing condition.
pub fn compile_plan(plan: &ExecPlan, width: Width) -> JitPredicate {
    let (module, ptr) = compile_function(plan, width)
        .unwrap_or_else(|e| panic!("JIT compile_plan({width:?}) failed: {e}"));
    debug!(%plan, ?width, "compiled predicate");
    JitPredicate {
        _module: module,
        ptr,
        width,
    }
}

// ---------------------------------------------------------------------------
// Internal codegen
// ---------------------------------------------------------------------------

fn make_jit_module() -> JITModule {
    let mut flag_builder = settings::builder();
    flag_builder
        .set("use_colocated_libcalls", "false")
        .expect("cranelift setting");
    flag_builder
        .set("is_pic", "false")
        .expect("cranelift setting");
    let isa_builder =
        cranelift_native::builder().unwrap_or_else(|e| panic!("cranelift ISA builder: {e}"));
    let isa = isa_builder
        .finish(settings::Flags::new(flag_builder))
        .unwrap_or_else(|e| panic!("cranelift ISA finish: {e}"));
    let builder = JITBuilder::with_isa(isa, cranelift_module::default_libcall_names());
    JITModule::new(builder)
}

/// Internal error type — only used within compile_function, then unwrapped
/// with panic.
#[derive(Debug)]
enum CodegenError {
    Module(cranelift_module::ModuleError),
    Codegen(String),
}

impl std::fmt::Display for CodegenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodegenError::Module(e) => write!(f, "module: {e}"),
            CodegenError::Codegen(s) => write!(f, "codegen: {s}"),
        }
    }
}

impl From<cranelift_module::ModuleError> for CodegenError {
    fn from(e: cranelift_module::ModuleError) -> Self {
        CodegenError::Module(e)
    }
}

fn input_type(width: Width) -> Type {
    match width {
        Width::W32 => I32,
        Width::W64 => I64,
    }
}

#[allow(clippy::result_large_err)]
fn compile_function(
    plan: &ExecPlan,
    width: Width,
) -> Result<(JITModule, *const u8), CodegenError> {
    let mut module = make_jit_module();
    let in_ty = input_type(width);

    let mut sig = Signature::new(CallConv::SystemV);
    sig.params.push(AbiParam::new(in_ty));
    sig.returns.push(AbiParam::new(I8));

    let func_id = module.declare_function("mask_predicate", Linkage::Local, &sig)?;
    let mut func = Function::with_name_signature(UserFuncName::user(0, 0), sig);
    let mut func_ctx = FunctionBuilderContext::new();

    {
        let mut builder = FunctionBuilder::new(&mut func, &mut func_ctx);
        let entry = builder.create_block();
        builder.append_block_params_for_function_params(entry);
        builder.switch_to_block(entry);
        builder.seal_block(entry);

        let input = builder.block_params(entry)[0];

        let result = emit_plan(&mut builder, plan, input, width);
        builder.ins().return_(&[result]);
        builder.finalize();
    }

    let mut ctx = Context::for_function(func);
    module
        .define_function(func_id, &mut ctx)
        .map_err(|e| CodegenError::Codegen(e.to_string()))?;
    module.clear_context(&mut ctx);
    module
        .finalize_definitions()
        .map_err(|e| CodegenError::Codegen(e.to_string()))?;

    let ptr = module.get_finalized_function(func_id);
    Ok((module, ptr))
}

/// Emit a width-typed integer constant. At `W32` the low 32 bits of `bits`
/// carry the constant; at `W64` nothing is truncated.
fn width_const(builder: &mut FunctionBuilder, width: Width, bits: u64) -> Value {
    match width {
        Width::W32 => builder.ins().iconst(I32, i64::from(bits as u32 as i32)),
        Width::W64 => builder.ins().iconst(I64, bits as i64),
    }
}

/// Emit Cranelift IR for a plan node. Booleans are I8 values, 0 or 1.
fn emit_plan(
    builder: &mut FunctionBuilder,
    plan: &ExecPlan,
    input: Value,
    width: Width,
) -> Value {
    match plan {
        ExecPlan::True => builder.ins().iconst(I8, 1),
        ExecPlan::False => builder.ins().iconst(I8, 0),

        ExecPlan::MaskEqual { mask, value } => {
            let m = width_const(builder, width, *mask);
            let masked = builder.ins().band(input, m);
            let v = width_const(builder, width, *value);
            builder.ins().icmp(IntCC::Equal, masked, v)
        }
        ExecPlan::MaskNotEqual { mask, value } => {
            let m = width_const(builder, width, *mask);
            let masked = builder.ins().band(input, m);
            let v = width_const(builder, width, *value);
            builder.ins().icmp(IntCC::NotEqual, masked, v)
        }

        // Sub-plans branch to a shared merge block carrying the result as a
        // block parameter. The first false operand skips the rest.
        ExecPlan::EvalAnd(inputs) => {
            let merge = builder.create_block();
            builder.append_block_param(merge, I8);
            for sub in inputs {
                let v = emit_plan(builder, sub, input, width);
                let next = builder.create_block();
                let zero = builder.ins().iconst(I8, 0);
                builder.ins().brif(v, next, &[], merge, &[zero]);
                builder.seal_block(next);
                builder.switch_to_block(next);
            }
            let one = builder.ins().iconst(I8, 1);
            builder.ins().jump(merge, &[one]);
            builder.seal_block(merge);
            builder.switch_to_block(merge);
            builder.block_params(merge)[0]
        }

        // Dual: the first true operand skips the rest.
        ExecPlan::EvalOr(inputs) => {
            let merge = builder.create_block();
            builder.append_block_param(merge, I8);
            for sub in inputs {
                let v = emit_plan(builder, sub, input, width);
                let next = builder.create_block();
                let one = builder.ins().iconst(I8, 1);
                builder.ins().brif(v, merge, &[one], next, &[]);
                builder.seal_block(next);
                builder.switch_to_block(next);
            }
            let zero = builder.ins().iconst(I8, 0);
            builder.ins().jump(merge, &[zero]);
            builder.seal_block(merge);
            builder.switch_to_block(merge);
            builder.block_params(merge)[0]
        }

        ExecPlan::EvalNot(inner) => {
            let v = emit_plan(builder, inner, input, width);
            let one = builder.ins().iconst(I8, 1);
            builder.ins().bxor(v, one)
        }
    }
}
