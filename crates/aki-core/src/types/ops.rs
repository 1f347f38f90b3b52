//! Per-type operator tables
//!
//! Lookup and emission are split: [`SemType::binary_op`] answers whether an
//! operator exists for a type and which implementation it uses, and the
//! returned [`BinaryImpl`] or [`UnaryImpl`] emits the instructions.

use cranelift_codegen::ir::condcodes::{FloatCC, IntCC};
use cranelift_codegen::ir::{types, InstBuilder, Value};

use crate::ast::BinaryOp;
use crate::emit::Emitter;
use crate::runtime::RuntimeHelper;

use super::{SemType, TaggedValue, TypeClass, TypeError};

/// Operators that exist only at the type level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    /// Arithmetic negation
    Negate,
    /// Conversion to a Boolean truth value, used by conditional tests
    Boolify,
}

impl UnaryOperator {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            UnaryOperator::Negate => "-",
            UnaryOperator::Boolify => "bool",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntOp {
    Add,
    Sub,
    Mul,
    And,
    Or,
    Xor,
    Shl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatOp {
    Add,
    Sub,
    Mul,
    Div,
}

/// How a binary operator is implemented for one operand type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryImpl {
    /// Single integer instruction; result has the operand type
    Int(IntOp),
    /// Checked integer division
    IntDiv { signed: bool },
    IntShr { signed: bool },
    /// Integer comparison producing a Boolean
    IntCompare(IntCC),
    Float(FloatOp),
    FloatCompare(FloatCC),
    /// Zero-extend Boolean operands to `i64` and apply integer semantics
    WidenBoolean(IntOp),
}

/// How a unary operator is implemented for one operand type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryImpl {
    IntNegate,
    FloatNegate,
    /// The value is already a Boolean
    Identity,
    /// `value != 0`
    IntTruthy,
    /// `value != 0.0`; NaN is false
    FloatTruthy,
}

impl SemType {
    /// Look up the implementation of `op` when both operands have this type
    pub fn binary_op(self, op: BinaryOp) -> Result<BinaryImpl, TypeError> {
        let found = match self.class {
            TypeClass::Boolean => boolean_binary(op),
            TypeClass::SignedInteger => integer_binary(op, true),
            TypeClass::UnsignedInteger | TypeClass::Pointer => integer_binary(op, false),
            TypeClass::Float16 | TypeClass::Float32 | TypeClass::Float64 => float_binary(op),
        };
        found.ok_or(TypeError::UnsupportedOperation {
            op: op.as_str(),
            ty: self,
        })
    }

    pub fn unary_op(self, op: UnaryOperator) -> Result<UnaryImpl, TypeError> {
        let found = match (self.class, op) {
            (TypeClass::Boolean, UnaryOperator::Boolify) => Some(UnaryImpl::Identity),
            (TypeClass::Boolean, UnaryOperator::Negate) => None,
            (TypeClass::SignedInteger, UnaryOperator::Negate) => Some(UnaryImpl::IntNegate),
            (TypeClass::UnsignedInteger | TypeClass::Pointer, UnaryOperator::Negate) => None,
            (
                TypeClass::SignedInteger | TypeClass::UnsignedInteger | TypeClass::Pointer,
                UnaryOperator::Boolify,
            ) => Some(UnaryImpl::IntTruthy),
            (_, UnaryOperator::Negate) => Some(UnaryImpl::FloatNegate),
            (_, UnaryOperator::Boolify) => Some(UnaryImpl::FloatTruthy),
        };
        found.ok_or(TypeError::UnsupportedOperation {
            op: op.as_str(),
            ty: self,
        })
    }
}

fn boolean_binary(op: BinaryOp) -> Option<BinaryImpl> {
    Some(match op {
        BinaryOp::Add => BinaryImpl::WidenBoolean(IntOp::Add),
        BinaryOp::Sub => BinaryImpl::WidenBoolean(IntOp::Sub),
        BinaryOp::BitAnd => BinaryImpl::Int(IntOp::And),
        BinaryOp::BitOr => BinaryImpl::Int(IntOp::Or),
        BinaryOp::BitXor => BinaryImpl::Int(IntOp::Xor),
        BinaryOp::Eq => BinaryImpl::IntCompare(IntCC::Equal),
        BinaryOp::Ne => BinaryImpl::IntCompare(IntCC::NotEqual),
        _ => return None,
    })
}

fn integer_binary(op: BinaryOp, signed: bool) -> Option<BinaryImpl> {
    let ordered = |signed_cc, unsigned_cc| {
        BinaryImpl::IntCompare(if signed { signed_cc } else { unsigned_cc })
    };
    Some(match op {
        BinaryOp::Add => BinaryImpl::Int(IntOp::Add),
        BinaryOp::Sub => BinaryImpl::Int(IntOp::Sub),
        BinaryOp::Mul => BinaryImpl::Int(IntOp::Mul),
        BinaryOp::Div => BinaryImpl::IntDiv { signed },
        BinaryOp::BitAnd => BinaryImpl::Int(IntOp::And),
        BinaryOp::BitOr => BinaryImpl::Int(IntOp::Or),
        BinaryOp::BitXor => BinaryImpl::Int(IntOp::Xor),
        BinaryOp::Shl => BinaryImpl::Int(IntOp::Shl),
        BinaryOp::Shr => BinaryImpl::IntShr { signed },
        BinaryOp::Eq => BinaryImpl::IntCompare(IntCC::Equal),
        BinaryOp::Ne => BinaryImpl::IntCompare(IntCC::NotEqual),
        BinaryOp::Gt => ordered(IntCC::SignedGreaterThan, IntCC::UnsignedGreaterThan),
        BinaryOp::Lt => ordered(IntCC::SignedLessThan, IntCC::UnsignedLessThan),
        BinaryOp::Ge => ordered(
            IntCC::SignedGreaterThanOrEqual,
            IntCC::UnsignedGreaterThanOrEqual,
        ),
        BinaryOp::Le => ordered(IntCC::SignedLessThanOrEqual, IntCC::UnsignedLessThanOrEqual),
    })
}

fn float_binary(op: BinaryOp) -> Option<BinaryImpl> {
    Some(match op {
        BinaryOp::Add => BinaryImpl::Float(FloatOp::Add),
        BinaryOp::Sub => BinaryImpl::Float(FloatOp::Sub),
        BinaryOp::Mul => BinaryImpl::Float(FloatOp::Mul),
        BinaryOp::Div => BinaryImpl::Float(FloatOp::Div),
        BinaryOp::Eq => BinaryImpl::FloatCompare(FloatCC::Equal),
        BinaryOp::Ne => BinaryImpl::FloatCompare(FloatCC::OrderedNotEqual),
        BinaryOp::Gt => BinaryImpl::FloatCompare(FloatCC::GreaterThan),
        BinaryOp::Lt => BinaryImpl::FloatCompare(FloatCC::LessThan),
        BinaryOp::Ge => BinaryImpl::FloatCompare(FloatCC::GreaterThanOrEqual),
        BinaryOp::Le => BinaryImpl::FloatCompare(FloatCC::LessThanOrEqual),
        BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor | BinaryOp::Shl | BinaryOp::Shr => {
            return None
        }
    })
}

impl BinaryImpl {
    /// Emit the operation at the emitter's current position
    ///
    /// Both operands must already have the same semantic type.
    pub fn apply(self, em: &mut Emitter<'_>, lhs: TaggedValue, rhs: TaggedValue) -> TaggedValue {
        let (a, b) = (lhs.value, rhs.value);
        match self {
            BinaryImpl::Int(op) => TaggedValue::new(int_op(em, op, a, b), lhs.ty),
            BinaryImpl::IntDiv { signed } => TaggedValue::new(checked_div(em, signed, a, b), lhs.ty),
            BinaryImpl::IntShr { signed } => {
                let mut pos = em.cursor();
                let value = if signed {
                    pos.ins().sshr(a, b)
                } else {
                    pos.ins().ushr(a, b)
                };
                TaggedValue::new(value, lhs.ty)
            }
            BinaryImpl::IntCompare(cc) => {
                let value = em.cursor().ins().icmp(cc, a, b);
                TaggedValue::new(value, em.types().boolean())
            }
            BinaryImpl::Float(op) => {
                let mut pos = em.cursor();
                let value = match op {
                    FloatOp::Add => pos.ins().fadd(a, b),
                    FloatOp::Sub => pos.ins().fsub(a, b),
                    FloatOp::Mul => pos.ins().fmul(a, b),
                    FloatOp::Div => pos.ins().fdiv(a, b),
                };
                let value = if em.types().get(lhs.ty).class() == TypeClass::Float16 {
                    round_half(em, value)
                } else {
                    value
                };
                TaggedValue::new(value, lhs.ty)
            }
            BinaryImpl::FloatCompare(cc) => {
                let value = em.cursor().ins().fcmp(cc, a, b);
                TaggedValue::new(value, em.types().boolean())
            }
            BinaryImpl::WidenBoolean(op) => {
                let wide = em.types().i64();
                let a = em.cursor().ins().uextend(types::I64, a);
                let b = em.cursor().ins().uextend(types::I64, b);
                TaggedValue::new(int_op(em, op, a, b), wide)
            }
        }
    }
}

fn int_op(em: &mut Emitter<'_>, op: IntOp, a: Value, b: Value) -> Value {
    let mut pos = em.cursor();
    let ins = pos.ins();
    match op {
        IntOp::Add => ins.iadd(a, b),
        IntOp::Sub => ins.isub(a, b),
        IntOp::Mul => ins.imul(a, b),
        IntOp::And => ins.band(a, b),
        IntOp::Or => ins.bor(a, b),
        IntOp::Xor => ins.bxor(a, b),
        IntOp::Shl => ins.ishl(a, b),
    }
}

/// Narrow a single-precision result back to the nearest half
///
/// Single precision carries more than twice a half's precision, so
/// rounding its result again gives the correctly rounded half, overflow to
/// infinity included.
fn round_half(em: &mut Emitter<'_>, value: Value) -> Value {
    em.call_runtime(RuntimeHelper::RoundHalf, &[value])
        .unwrap_or(value)
}

/// Integer division that never traps
///
/// The divisor is reported to the runtime, which records a fault when it is
/// zero; the hardware division then runs against a divisor of 1. Signed
/// `MIN / -1` also divides by 1, which yields the wrapped result.
#[allow(clippy::cast_possible_wrap)]
fn checked_div(em: &mut Emitter<'_>, signed: bool, lhs: Value, rhs: Value) -> Value {
    let ty = em.value_type(rhs);
    let bits = ty.bits();

    let reported = if ty == types::I64 {
        rhs
    } else if signed {
        em.cursor().ins().sextend(types::I64, rhs)
    } else {
        em.cursor().ins().uextend(types::I64, rhs)
    };
    em.call_runtime(RuntimeHelper::CheckDivisor, &[reported]);

    let mut pos = em.cursor();
    let is_zero = pos.ins().icmp_imm(IntCC::Equal, rhs, 0);
    let one = pos.ins().iconst(ty, 1);
    let divisor = pos.ins().select(is_zero, one, rhs);
    if !signed {
        return pos.ins().udiv(lhs, divisor);
    }

    // Immediates for narrow types are given zero-extended
    let all_ones = if bits >= 64 { u64::MAX } else { (1u64 << bits) - 1 };
    let min = pos.ins().iconst(ty, (1u64 << (bits - 1)) as i64);
    let neg_one = pos.ins().iconst(ty, all_ones as i64);
    let lhs_is_min = pos.ins().icmp(IntCC::Equal, lhs, min);
    let rhs_is_neg_one = pos.ins().icmp(IntCC::Equal, rhs, neg_one);
    let overflows = pos.ins().band(lhs_is_min, rhs_is_neg_one);
    let divisor = pos.ins().select(overflows, one, divisor);
    pos.ins().sdiv(lhs, divisor)
}

impl UnaryImpl {
    pub fn apply(self, em: &mut Emitter<'_>, operand: TaggedValue) -> TaggedValue {
        let v = operand.value;
        match self {
            UnaryImpl::IntNegate => TaggedValue::new(em.cursor().ins().ineg(v), operand.ty),
            // Flipping the sign of a half is exact
            UnaryImpl::FloatNegate => TaggedValue::new(em.cursor().ins().fneg(v), operand.ty),
            UnaryImpl::Identity => operand,
            UnaryImpl::IntTruthy => {
                let boolean = em.types().boolean();
                let mut pos = em.cursor();
                let nonzero = pos.ins().icmp_imm(IntCC::NotEqual, v, 0);
                TaggedValue::new(nonzero, boolean)
            }
            UnaryImpl::FloatTruthy => {
                let boolean = em.types().boolean();
                let ty = em.value_type(v);
                let mut pos = em.cursor();
                let zero = if ty == types::F64 {
                    pos.ins().f64const(0.0)
                } else {
                    pos.ins().f32const(0.0)
                };
                // NaN compares unordered, so it is not truthy
                let nonzero = pos.ins().fcmp(FloatCC::OrderedNotEqual, v, zero);
                TaggedValue::new(nonzero, boolean)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeInterner;

    #[test]
    fn boolean_table() {
        let types = TypeInterner::new();
        let boolean = types.get(types.boolean());
        assert_eq!(
            boolean.binary_op(BinaryOp::Add),
            Ok(BinaryImpl::WidenBoolean(IntOp::Add))
        );
        assert_eq!(
            boolean.binary_op(BinaryOp::Eq),
            Ok(BinaryImpl::IntCompare(IntCC::Equal))
        );
        assert!(boolean.binary_op(BinaryOp::Mul).is_err());
        assert!(boolean.binary_op(BinaryOp::Lt).is_err());
        assert_eq!(
            boolean.unary_op(UnaryOperator::Boolify),
            Ok(UnaryImpl::Identity)
        );
        assert!(boolean.unary_op(UnaryOperator::Negate).is_err());
    }

    #[test]
    fn integer_comparisons_follow_signedness() {
        let types = TypeInterner::new();
        let signed = types.get(types.i64());
        let unsigned = types.get(types.u64());
        assert_eq!(
            signed.binary_op(BinaryOp::Lt),
            Ok(BinaryImpl::IntCompare(IntCC::SignedLessThan))
        );
        assert_eq!(
            unsigned.binary_op(BinaryOp::Lt),
            Ok(BinaryImpl::IntCompare(IntCC::UnsignedLessThan))
        );
        assert_eq!(
            unsigned.binary_op(BinaryOp::Div),
            Ok(BinaryImpl::IntDiv { signed: false })
        );
        assert_eq!(
            signed.binary_op(BinaryOp::Shr),
            Ok(BinaryImpl::IntShr { signed: true })
        );
        assert!(unsigned.unary_op(UnaryOperator::Negate).is_err());
    }

    #[test]
    fn float_table_has_no_bitwise_ops() {
        let types = TypeInterner::new();
        let double = types.get(types.f64());
        assert_eq!(
            double.binary_op(BinaryOp::Div),
            Ok(BinaryImpl::Float(FloatOp::Div))
        );
        assert_eq!(
            double.binary_op(BinaryOp::Ne),
            Ok(BinaryImpl::FloatCompare(FloatCC::OrderedNotEqual))
        );
        assert!(double.binary_op(BinaryOp::BitAnd).is_err());
        assert!(double.binary_op(BinaryOp::Shl).is_err());
        assert_eq!(
            double.unary_op(UnaryOperator::Boolify),
            Ok(UnaryImpl::FloatTruthy)
        );
    }

    #[test]
    fn unsupported_operation_message() {
        let types = TypeInterner::new();
        let err = types
            .get(types.f32())
            .binary_op(BinaryOp::BitXor)
            .unwrap_err();
        assert_eq!(err.to_string(), "operator '^' is not supported for f32");
    }
}
