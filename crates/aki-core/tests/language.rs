//! End-to-end tests for expression semantics

use aki_core::testutil::{
    eval, eval_bool, eval_error, eval_error_category, eval_float, eval_int, eval_uint,
    eval_value,
};
use aki_core::{ErrorCategory, NativeValue};

#[test]
fn test_literal_round_trip() {
    assert_eq!(eval_int("2").unwrap(), 2);
    assert_eq!(eval_float("2.0").unwrap(), 2.0);
    assert!(eval_bool("True").unwrap());
    assert!(!eval_bool("False").unwrap());
    assert_eq!(eval_uint(&format!("{}_U", 1u64 << 63)).unwrap(), 1u64 << 63);
    assert_eq!(eval_int("-9223372036854775808").unwrap(), i64::MIN);
    assert_eq!(eval_int("- 9223372036854775808 + 1").unwrap(), i64::MIN + 1);
    assert_eq!(
        eval_error_category("9223372036854775808").unwrap(),
        ErrorCategory::Syntax
    );
    assert_eq!(eval_int("1_000_000").unwrap(), 1_000_000);
}

#[test]
fn test_float_widths() {
    assert_eq!(eval_value("1.5_F").unwrap(), NativeValue::Float32(1.5));
    assert_eq!(eval_value("0.1_H").unwrap(), NativeValue::Float16(0.099_975_586));
    assert_eq!(eval_value("2.5_D").unwrap(), NativeValue::Float64(2.5));
    assert_eq!(eval_value("2_F").unwrap(), NativeValue::Float32(2.0));
    assert!(eval_float("NaN").unwrap().is_nan());
    assert_eq!(eval_float("inf").unwrap(), f64::INFINITY);
    assert_eq!(eval_float("-Infinity").unwrap(), f64::NEG_INFINITY);
}

#[test]
fn test_half_precision_arithmetic_is_rounded() {
    // The exact sum lies halfway between two halves and rounds to even
    assert_eq!(eval_value("0.1_H + 0.2_H").unwrap(), NativeValue::Float16(0.299_804_7));
    // Comparisons see the rounded sum too
    assert!(eval_bool("0.1_H + 0.2_H == 0.2998046875_H").unwrap());
    // Each step overflows on its own rather than at the end
    assert_eq!(
        eval_value("(60000.0_H + 60000.0_H) - 60000.0_H").unwrap(),
        NativeValue::Float16(f32::INFINITY)
    );
    assert_eq!(
        eval_value("300.0_H * 300.0_H").unwrap(),
        NativeValue::Float16(f32::INFINITY)
    );
    assert_eq!(eval_value("1.0_H / 3.0_H").unwrap(), NativeValue::Float16(0.333_251_95));
}

#[test]
fn test_half_literals_round_once() {
    assert_eq!(
        eval_value("1.0004882822_H").unwrap(),
        NativeValue::Float16(1.000_976_6)
    );
}

#[test]
fn test_boolean_arithmetic_widening() {
    assert_eq!(eval_int("True+True").unwrap(), 2);
    assert_eq!(eval_int("True-True").unwrap(), 0);
    assert_eq!(eval_int("False+True").unwrap(), 1);
    assert_eq!(eval_int("False-True").unwrap(), -1);
}

#[test]
fn test_boolean_comparisons_and_bitwise() {
    assert!(eval_bool("True == True").unwrap());
    assert!(eval_bool("True != False").unwrap());
    assert!(!eval_bool("True & False").unwrap());
    assert!(eval_bool("True | False").unwrap());
    assert!(eval_bool("True ^ False").unwrap());
    assert_eq!(eval_error_category("True < False").unwrap(), ErrorCategory::Type);
    assert_eq!(eval_error_category("True * True").unwrap(), ErrorCategory::Type);
}

#[test]
fn test_operand_types_must_match() {
    for op in ["==", "!=", ">", "<", ">=", "<="] {
        let source = format!("2 {op} True");
        assert_eq!(
            eval_error_category(&source).unwrap(),
            ErrorCategory::Type,
            "{source}"
        );
    }
    assert_eq!(eval_error_category("1 + 1.0").unwrap(), ErrorCategory::Type);
    assert_eq!(eval_error_category("1 + 1_U").unwrap(), ErrorCategory::Type);
    assert_eq!(eval_error_category("1.0 + 1.0_F").unwrap(), ErrorCategory::Type);
}

#[test]
fn test_unsigned_negation_is_rejected() {
    let err = eval_error("-5_U").unwrap();
    assert_eq!(err.category(), ErrorCategory::Type);
    assert_eq!(err.message(), "operator '-' is not supported for u64");
}

#[test]
fn test_negation() {
    assert_eq!(eval_int("-5").unwrap(), -5);
    assert_eq!(eval_int("--5").unwrap(), 5);
    assert_eq!(eval_float("-2.5").unwrap(), -2.5);
    assert_eq!(eval_error_category("-True").unwrap(), ErrorCategory::Type);
}

#[test]
fn test_conditional_unification() {
    assert_eq!(eval_int("if 2==2 1 else 0").unwrap(), 1);
    assert_eq!(eval_int("if 32==2 0 else 1").unwrap(), 1);
    assert_eq!(
        eval_error_category("if 2==True 1 else 0").unwrap(),
        ErrorCategory::Type
    );
    assert_eq!(
        eval_error_category("if 2==2 1 else False").unwrap(),
        ErrorCategory::Type
    );
    assert_eq!(eval_int("when 32 1 else 0").unwrap(), 1);
    assert_eq!(eval_int("when 0 1 else 0").unwrap(), 0);
}

#[test]
fn test_conditional_truthiness() {
    assert_eq!(eval_int("when 0.5 1 else 2").unwrap(), 1);
    assert_eq!(eval_int("when 0.0 1 else 2").unwrap(), 2);
    assert_eq!(eval_int("when NaN 1 else 2").unwrap(), 2);
    assert_eq!(eval_int("if 7_U 1 else 2").unwrap(), 1);
    assert_eq!(eval_int("if False 1 else 2").unwrap(), 2);
}

#[test]
fn test_conditional_results_of_every_type() {
    assert!(eval_bool("when 1 True else False").unwrap());
    assert_eq!(eval_float("if 0 1.0 else 2.0").unwrap(), 2.0);
    assert_eq!(eval_uint("when 1 3_U else 4_U").unwrap(), 3);
    assert_eq!(eval_value("if 1 1.5_F else 2.5_F").unwrap(), NativeValue::Float32(1.5));
}

#[test]
fn test_nested_conditionals() {
    assert_eq!(eval_int("if 1 when 0 10 else 20 else 30").unwrap(), 20);
    assert_eq!(eval_int("when (if 0 1 else 0) 1 else if 1 2 else 3").unwrap(), 2);
    assert_eq!(eval_int("(when 1 2 else 3) + (if 0 4 else 5)").unwrap(), 7);
}

#[test]
fn test_arithmetic_precedence() {
    assert_eq!(eval_int("2+2+2").unwrap(), 6);
    assert_eq!(eval_int("4/2+2").unwrap(), 4);
    assert_eq!(eval_int("4/(2+2)").unwrap(), 1);
    assert_eq!(eval_int("10-4-3").unwrap(), 3);
    assert_eq!(eval_int("2+3*4").unwrap(), 14);
}

#[test]
fn test_bitwise_and_shifts() {
    assert_eq!(eval_int("2 & 3").unwrap(), 2);
    assert_eq!(eval_int("2 | 3").unwrap(), 3);
    assert_eq!(eval_int("2 ^ 3").unwrap(), 1);
    assert_eq!(eval_int("2 << 2").unwrap(), 8);
    assert_eq!(eval_int("8 >> 3").unwrap(), 1);
    assert_eq!(eval_int("-8 >> 1").unwrap(), -4);
    assert_eq!(eval_uint("18446744073709551615_U >> 60_U").unwrap(), 15);
    assert_eq!(eval_error_category("1.0 << 1.0").unwrap(), ErrorCategory::Type);
}

#[test]
fn test_comparisons() {
    assert!(eval_bool("2 < 3").unwrap());
    assert!(eval_bool("3 >= 3").unwrap());
    assert!(!eval_bool("-1 > 1").unwrap());
    // Unsigned comparison does not see a sign bit
    assert!(eval_bool("18446744073709551615_U > 1_U").unwrap());
    assert!(!eval_bool("NaN == NaN").unwrap());
    assert!(!eval_bool("NaN < 1.0").unwrap());
    // Every float comparison is ordered, so NaN is unequal to nothing
    assert!(!eval_bool("NaN != NaN").unwrap());
    assert!(!eval_bool("NaN != 1.0").unwrap());
    assert!(!eval_bool("(0.0_F / 0.0_F) != (0.0_F / 0.0_F)").unwrap());
    assert!(eval_bool("1.0 != 2.0").unwrap());
    assert!(eval_bool("1.5_F <= 1.5_F").unwrap());
}

#[test]
fn test_division() {
    assert_eq!(eval_int("-7 / 2").unwrap(), -3);
    assert_eq!(eval_uint("7_U / 2_U").unwrap(), 3);
    assert_eq!(eval_int("(-9223372036854775807 - 1) / -1").unwrap(), i64::MIN);
    assert_eq!(eval_int("-9223372036854775808 / -1").unwrap(), i64::MIN);
    assert_eq!(eval_float("1.0 / 0.0").unwrap(), f64::INFINITY);
    assert!(eval_float("0.0 / 0.0").unwrap().is_nan());
}

#[test]
fn test_division_by_zero_is_a_runtime_error() {
    let err = eval_error("1 / 0").unwrap();
    assert_eq!(err.category(), ErrorCategory::Runtime);
    assert_eq!(err.render("1 / 0"), "RuntimeError: runtime error: division by zero");
    assert_eq!(eval_error_category("5_U / 0_U").unwrap(), ErrorCategory::Runtime);
    assert_eq!(
        eval_error_category("when 1 / 0 1 else 2").unwrap(),
        ErrorCategory::Runtime
    );
}

#[test]
fn test_statement_sequence_returns_last() {
    assert_eq!(eval_int("1; 2; 3").unwrap(), 3);
    assert!(eval_bool("1\n2.0\nTrue").unwrap());
}

#[test]
fn test_syntax_errors() {
    assert_eq!(eval_error_category("2 +").unwrap(), ErrorCategory::Syntax);
    assert_eq!(eval_error_category("if 1 2").unwrap(), ErrorCategory::Syntax);
    assert_eq!(eval_error_category("2 $ 3").unwrap(), ErrorCategory::Syntax);
    assert_eq!(eval_error_category("def f(x) { x }").unwrap(), ErrorCategory::Syntax);
}

#[test]
fn test_error_rendering() {
    let source = "1 + (2 == True)";
    let err = eval_error(source).unwrap();
    assert_eq!(
        err.render(source),
        "TypeError: (line 1, col 6) incompatible types for op '==': i64 and bool\n\
         1 + (2 == True)\n\
         -----^"
    );
}

#[test]
fn test_empty_fragment_has_no_value() {
    assert_eq!(eval("").unwrap(), None);
    assert_eq!(eval("// nothing here").unwrap(), None);
}
