//! Native helpers callable from generated code
//!
//! Generated code reaches these through imported functions whose external
//! names use the helper's [`RuntimeHelper::index`]. User functions are
//! numbered after the helpers, starting at [`USER_FUNCTION_BASE`].

use std::cell::Cell;

use cranelift_codegen::ir::{types, AbiParam, Signature};
use cranelift_codegen::isa::CallConv;
use thiserror::Error;

use crate::types::round_to_half;

/// Faults raised while generated code runs
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeFault {
    #[error("division by zero")]
    DivisionByZero,
}

/// Helpers the JIT links into every loaded module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuntimeHelper {
    /// `fn(divisor: i64)`; records a fault when the divisor is zero
    CheckDivisor,
    /// `fn(f32) -> f32`; rounds to the nearest half-precision value
    RoundHalf,
}

impl RuntimeHelper {
    pub const ALL: [RuntimeHelper; 2] = [RuntimeHelper::CheckDivisor, RuntimeHelper::RoundHalf];

    /// Symbol the helper is registered under in the JIT
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            RuntimeHelper::CheckDivisor => "aki_check_divisor",
            RuntimeHelper::RoundHalf => "aki_round_half",
        }
    }

    /// Index used in the helper's external name
    #[must_use]
    pub const fn index(self) -> u32 {
        self as u32
    }

    #[must_use]
    pub fn signature(self, call_conv: CallConv) -> Signature {
        let mut sig = Signature::new(call_conv);
        match self {
            RuntimeHelper::CheckDivisor => sig.params.push(AbiParam::new(types::I64)),
            RuntimeHelper::RoundHalf => {
                sig.params.push(AbiParam::new(types::F32));
                sig.returns.push(AbiParam::new(types::F32));
            }
        }
        sig
    }

    /// Address of the native implementation
    #[must_use]
    pub fn address(self) -> *const u8 {
        match self {
            RuntimeHelper::CheckDivisor => aki_check_divisor as *const u8,
            RuntimeHelper::RoundHalf => aki_round_half as *const u8,
        }
    }
}

/// External-name index of the first user function
#[allow(clippy::cast_possible_truncation)]
pub const USER_FUNCTION_BASE: u32 = RuntimeHelper::ALL.len() as u32;

thread_local! {
    static DIVISION_BY_ZERO: Cell<bool> = const { Cell::new(false) };
}

extern "C" fn aki_check_divisor(divisor: i64) {
    if divisor == 0 {
        DIVISION_BY_ZERO.with(|flag| flag.set(true));
    }
}

extern "C" fn aki_round_half(value: f32) -> f32 {
    round_to_half(value)
}

/// Forget faults left over from an earlier call
pub fn clear_faults() {
    DIVISION_BY_ZERO.with(|flag| flag.set(false));
}

/// Take the fault raised on this thread since the last [`clear_faults`]
pub fn take_fault() -> Option<RuntimeFault> {
    DIVISION_BY_ZERO
        .with(|flag| flag.replace(false))
        .then_some(RuntimeFault::DivisionByZero)
}
