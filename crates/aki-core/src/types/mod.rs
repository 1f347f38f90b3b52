//! Semantic types for Aki values
//!
//! The type set is closed: booleans, signed and unsigned integers, an
//! internal pointer type, and three float widths. Types are interned by
//! a [`TypeInterner`]; asking for the same `(class, width)` twice yields the
//! same [`Ty`] handle, so compatibility checks are plain handle comparisons.
//!
//! Each type owns an operator table (see [`ops`]). Lowering a binary
//! operator first checks that both operands carry the same handle and then
//! asks the operand type for the operator's implementation.

mod error;
pub mod ops;

pub use error::TypeError;
pub use ops::{BinaryImpl, FloatOp, IntOp, UnaryImpl, UnaryOperator};

use std::cell::RefCell;
use std::collections::HashMap;

use cranelift_codegen::ir::{types, Type, Value};

/// The family a semantic type belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeClass {
    Boolean,
    SignedInteger,
    UnsignedInteger,
    /// Unsigned machine address; never produced by a literal
    Pointer,
    Float16,
    Float32,
    Float64,
}

impl TypeClass {
    /// Widths this class may be instantiated with
    #[must_use]
    pub const fn valid_widths(self) -> &'static [u16] {
        match self {
            TypeClass::Boolean => &[1],
            TypeClass::SignedInteger | TypeClass::UnsignedInteger => &[8, 16, 32, 64],
            TypeClass::Pointer => &[32, 64],
            TypeClass::Float16 => &[16],
            TypeClass::Float32 => &[32],
            TypeClass::Float64 => &[64],
        }
    }
}

impl std::fmt::Display for TypeClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TypeClass::Boolean => "Boolean",
            TypeClass::SignedInteger => "SignedInteger",
            TypeClass::UnsignedInteger => "UnsignedInteger",
            TypeClass::Pointer => "Pointer",
            TypeClass::Float16 => "Float16",
            TypeClass::Float32 => "Float32",
            TypeClass::Float64 => "Float64",
        };
        f.write_str(name)
    }
}

/// How a value of a semantic type crosses the native call boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeRepr {
    /// `u8` holding 0 or 1
    Boolean,
    Signed(u16),
    Unsigned(u16),
    /// Half-precision value carried in an `f32`
    Half,
    Single,
    Double,
}

/// The descriptor behind a [`Ty`] handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SemType {
    class: TypeClass,
    width: u16,
}

impl SemType {
    #[must_use]
    pub const fn class(self) -> TypeClass {
        self.class
    }

    /// Width in bits (1 for booleans)
    #[must_use]
    pub const fn width(self) -> u16 {
        self.width
    }

    #[must_use]
    pub const fn is_boolean(self) -> bool {
        matches!(self.class, TypeClass::Boolean)
    }

    #[must_use]
    pub const fn is_float(self) -> bool {
        matches!(
            self.class,
            TypeClass::Float16 | TypeClass::Float32 | TypeClass::Float64
        )
    }

    /// The Cranelift value type this semantic type lowers to
    #[must_use]
    pub fn clif_type(self) -> Type {
        match self.class {
            // Cranelift has no 1-bit value type; booleans are bytes holding 0/1
            TypeClass::Boolean => types::I8,
            TypeClass::SignedInteger | TypeClass::UnsignedInteger | TypeClass::Pointer => {
                Type::int(self.width).unwrap_or(types::I64)
            }
            TypeClass::Float16 | TypeClass::Float32 => types::F32,
            TypeClass::Float64 => types::F64,
        }
    }

    #[must_use]
    pub const fn native_repr(self) -> NativeRepr {
        match self.class {
            TypeClass::Boolean => NativeRepr::Boolean,
            TypeClass::SignedInteger => NativeRepr::Signed(self.width),
            TypeClass::UnsignedInteger | TypeClass::Pointer => NativeRepr::Unsigned(self.width),
            TypeClass::Float16 => NativeRepr::Half,
            TypeClass::Float32 => NativeRepr::Single,
            TypeClass::Float64 => NativeRepr::Double,
        }
    }

    /// Bytes a storage slot needs to hold one value of this type
    #[must_use]
    pub fn byte_size(self) -> u32 {
        self.clif_type().bytes()
    }
}

impl std::fmt::Display for SemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.class {
            TypeClass::Boolean => f.write_str("bool"),
            TypeClass::SignedInteger => write!(f, "i{}", self.width),
            TypeClass::UnsignedInteger => write!(f, "u{}", self.width),
            TypeClass::Pointer => write!(f, "ptr{}", self.width),
            TypeClass::Float16 => f.write_str("f16"),
            TypeClass::Float32 => f.write_str("f32"),
            TypeClass::Float64 => f.write_str("f64"),
        }
    }
}

/// Handle to an interned semantic type
///
/// Handles are only meaningful for the interner that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ty(u32);

/// A lowered value together with its semantic type
///
/// The type is fixed when the value is created and decides which operator
/// table any later operation on the value consults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaggedValue {
    pub value: Value,
    pub ty: Ty,
}

impl TaggedValue {
    #[must_use]
    pub const fn new(value: Value, ty: Ty) -> Self {
        Self { value, ty }
    }
}

/// Append-only cache of semantic types
///
/// Owned by the driver and shared with every session, so it outlives
/// session resets. Single-threaded: interning goes through `RefCell`.
#[derive(Debug, Default)]
pub struct TypeInterner {
    types: RefCell<Vec<SemType>>,
    lookup: RefCell<HashMap<SemType, Ty>>,
}

impl TypeInterner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern `(class, width)`, rejecting widths the class does not support
    pub fn intern(&self, class: TypeClass, width: u16) -> Result<Ty, TypeError> {
        if !class.valid_widths().contains(&width) {
            return Err(TypeError::InvalidWidth { class, width });
        }
        Ok(self.intern_valid(SemType { class, width }))
    }

    fn intern_valid(&self, ty: SemType) -> Ty {
        if let Some(&handle) = self.lookup.borrow().get(&ty) {
            return handle;
        }
        let mut types = self.types.borrow_mut();
        #[allow(clippy::cast_possible_truncation)] // the type set is tiny
        let handle = Ty(types.len() as u32);
        types.push(ty);
        self.lookup.borrow_mut().insert(ty, handle);
        tracing::trace!(ty = %ty, handle = handle.0, "interned semantic type");
        handle
    }

    /// Descriptor for a handle issued by this interner
    #[must_use]
    pub fn get(&self, ty: Ty) -> SemType {
        self.types.borrow()[ty.0 as usize]
    }

    /// Display name of a handle, for diagnostics
    #[must_use]
    pub fn name(&self, ty: Ty) -> String {
        self.get(ty).to_string()
    }

    /// Number of distinct types interned so far
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn boolean(&self) -> Ty {
        self.intern_valid(SemType {
            class: TypeClass::Boolean,
            width: 1,
        })
    }

    pub fn signed(&self, width: u16) -> Result<Ty, TypeError> {
        self.intern(TypeClass::SignedInteger, width)
    }

    pub fn unsigned(&self, width: u16) -> Result<Ty, TypeError> {
        self.intern(TypeClass::UnsignedInteger, width)
    }

    pub fn pointer(&self, width: u16) -> Result<Ty, TypeError> {
        self.intern(TypeClass::Pointer, width)
    }

    /// The default integer type and the provisional function return type
    #[must_use]
    pub fn i64(&self) -> Ty {
        self.intern_valid(SemType {
            class: TypeClass::SignedInteger,
            width: 64,
        })
    }

    #[must_use]
    pub fn u64(&self) -> Ty {
        self.intern_valid(SemType {
            class: TypeClass::UnsignedInteger,
            width: 64,
        })
    }

    #[must_use]
    pub fn f16(&self) -> Ty {
        self.intern_valid(SemType {
            class: TypeClass::Float16,
            width: 16,
        })
    }

    #[must_use]
    pub fn f32(&self) -> Ty {
        self.intern_valid(SemType {
            class: TypeClass::Float32,
            width: 32,
        })
    }

    #[must_use]
    pub fn f64(&self) -> Ty {
        self.intern_valid(SemType {
            class: TypeClass::Float64,
            width: 64,
        })
    }
}

/// Round an `f32` to the nearest IEEE 754 half-precision value
///
/// Ties go to even. Magnitudes past the half range become infinities;
/// NaN and infinities pass through.
#[must_use]
pub fn round_to_half(value: f32) -> f32 {
    round_f64_to_half(f64::from(value))
}

/// Round an `f64` to the nearest half-precision value, carried as `f32`
///
/// Every half is exact in single precision, so the narrowing at the end
/// loses nothing.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn round_f64_to_half(value: f64) -> f32 {
    // Smallest normal half, 2^-14, and the spacing of subnormal halves, 2^-24
    const MIN_NORMAL: f64 = 6.103_515_625e-5;
    const SUBNORMAL_STEP: f64 = 5.960_464_477_539_062_5e-8;
    // Halfway between the largest half (65504) and the next step
    const OVERFLOW: f64 = 65520.0;

    if !value.is_finite() {
        return value as f32;
    }
    let sign = value.to_bits() & (1 << 63);
    let magnitude = value.abs();

    let rounded = if magnitude >= OVERFLOW {
        f64::INFINITY
    } else if magnitude < MIN_NORMAL {
        (magnitude / SUBNORMAL_STEP).round_ties_even() * SUBNORMAL_STEP
    } else {
        // Normal halves keep 10 of the 52 mantissa bits
        const DROPPED: u64 = 42;
        let bits = magnitude.to_bits();
        let remainder = bits & ((1 << DROPPED) - 1);
        let mut kept = bits & !((1 << DROPPED) - 1);
        let halfway = 1 << (DROPPED - 1);
        if remainder > halfway || (remainder == halfway && kept & (1 << DROPPED) != 0) {
            kept += 1 << DROPPED;
        }
        f64::from_bits(kept)
    };
    f64::from_bits(sign | rounded.to_bits()) as f32
}
