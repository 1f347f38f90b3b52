//! Values returned from native code

use std::fmt;

use crate::types::NativeRepr;

/// A result marshalled back from generated code
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NativeValue {
    Boolean(bool),
    Signed(i64),
    Unsigned(u64),
    /// Half-precision value widened to `f32`
    Float16(f32),
    Float32(f32),
    Float64(f64),
}

macro_rules! invoke {
    ($code:expr, $ret:ty) => {{
        let f = std::mem::transmute::<*const u8, extern "C" fn() -> $ret>($code);
        f()
    }};
}

impl NativeValue {
    /// Call zero-argument native code and read its result as `repr`
    ///
    /// # Safety
    ///
    /// `code` must point to a live function taking no arguments and
    /// returning a single value whose native representation is `repr`.
    pub(super) unsafe fn call(code: *const u8, repr: NativeRepr) -> Self {
        match repr {
            NativeRepr::Boolean => NativeValue::Boolean(invoke!(code, u8) != 0),
            NativeRepr::Signed(8) => NativeValue::Signed(i64::from(invoke!(code, i8))),
            NativeRepr::Signed(16) => NativeValue::Signed(i64::from(invoke!(code, i16))),
            NativeRepr::Signed(32) => NativeValue::Signed(i64::from(invoke!(code, i32))),
            NativeRepr::Signed(_) => NativeValue::Signed(invoke!(code, i64)),
            NativeRepr::Unsigned(8) => NativeValue::Unsigned(u64::from(invoke!(code, u8))),
            NativeRepr::Unsigned(16) => NativeValue::Unsigned(u64::from(invoke!(code, u16))),
            NativeRepr::Unsigned(32) => NativeValue::Unsigned(u64::from(invoke!(code, u32))),
            NativeRepr::Unsigned(_) => NativeValue::Unsigned(invoke!(code, u64)),
            NativeRepr::Half => NativeValue::Float16(invoke!(code, f32)),
            NativeRepr::Single => NativeValue::Float32(invoke!(code, f32)),
            NativeRepr::Double => NativeValue::Float64(invoke!(code, f64)),
        }
    }

    /// Name of the value's type, as used in diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            NativeValue::Boolean(_) => "bool",
            NativeValue::Signed(_) => "i64",
            NativeValue::Unsigned(_) => "u64",
            NativeValue::Float16(_) => "f16",
            NativeValue::Float32(_) => "f32",
            NativeValue::Float64(_) => "f64",
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            NativeValue::Signed(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            NativeValue::Unsigned(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            NativeValue::Boolean(v) => Some(v),
            _ => None,
        }
    }

    /// Any float widened to `f64`
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            NativeValue::Float16(v) | NativeValue::Float32(v) => Some(f64::from(v)),
            NativeValue::Float64(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for NativeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NativeValue::Boolean(true) => f.write_str("True"),
            NativeValue::Boolean(false) => f.write_str("False"),
            NativeValue::Signed(v) => write!(f, "{v}"),
            NativeValue::Unsigned(v) => write!(f, "{v}"),
            NativeValue::Float16(v) | NativeValue::Float32(v) => write!(f, "{v:?}"),
            NativeValue::Float64(v) => write!(f, "{v:?}"),
        }
    }
}
