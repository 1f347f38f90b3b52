//! Session lifecycle tests: persistence, reset and rollback

use aki_core::testutil::TestSession;
use aki_core::{ErrorCategory, NativeValue};

#[test]
fn test_named_functions_persist() {
    let mut repl = TestSession::new().unwrap();
    assert_eq!(repl.run("def answer() { 42 }").unwrap(), None);
    assert_eq!(repl.run("answer()").unwrap(), Some(NativeValue::Signed(42)));
    assert_eq!(repl.run("answer() + 1").unwrap(), Some(NativeValue::Signed(43)));
}

#[test]
fn test_functions_call_earlier_functions() {
    let mut repl = TestSession::new().unwrap();
    repl.run("def two() { 2 }").unwrap();
    repl.run("def four() { two() + two() }").unwrap();
    repl.run("def big() { four() > 3 }").unwrap();
    assert_eq!(repl.run("four() * two()").unwrap(), Some(NativeValue::Signed(8)));
    assert_eq!(repl.run("big()").unwrap(), Some(NativeValue::Boolean(true)));
}

#[test]
fn test_return_type_follows_the_body() {
    let mut repl = TestSession::new().unwrap();
    repl.run("def half() { 0.5 }").unwrap();
    repl.run("def flag() { 1 == 1 }").unwrap();
    assert_eq!(repl.run("half() * 4.0").unwrap(), Some(NativeValue::Float64(2.0)));
    assert_eq!(repl.run("when flag() 1 else 2").unwrap(), Some(NativeValue::Signed(1)));
    let err = repl.try_run("half() + 1").unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Type);
}

#[test]
fn test_multi_statement_function_bodies() {
    let mut repl = TestSession::new().unwrap();
    repl.run("def f() {\n  1\n  2.0\n  3_U\n}").unwrap();
    assert_eq!(repl.run("f()").unwrap(), Some(NativeValue::Unsigned(3)));
}

#[test]
fn test_definitions_and_statements_in_one_fragment() {
    let mut repl = TestSession::new().unwrap();
    let value = repl.run("def f() { 10 }; f() / 2").unwrap();
    assert_eq!(value, Some(NativeValue::Signed(5)));
    assert_eq!(repl.run("f()").unwrap(), Some(NativeValue::Signed(10)));
}

#[test]
fn test_reset_forgets_functions() {
    let mut repl = TestSession::new().unwrap();
    repl.run("def f() { 1 }").unwrap();
    repl.session().reset();
    let err = repl.try_run("f()").unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Name);

    // The name is free again
    repl.run("def f() { True }").unwrap();
    assert_eq!(repl.run("f()").unwrap(), Some(NativeValue::Boolean(true)));
}

#[test]
fn test_redefinition_is_a_name_error() {
    let mut repl = TestSession::new().unwrap();
    repl.run("def f() { 1 }").unwrap();
    let err = repl.try_run("def f() { 2 }").unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Name);
    assert_eq!(repl.run("f()").unwrap(), Some(NativeValue::Signed(1)));
}

#[test]
fn test_arity_and_name_errors() {
    let mut repl = TestSession::new().unwrap();
    repl.run("def f() { 1 }").unwrap();
    assert_eq!(repl.try_run("f(1, 2)").unwrap_err().category(), ErrorCategory::Arity);
    assert_eq!(repl.try_run("g()").unwrap_err().category(), ErrorCategory::Name);

    let err = repl.try_run("f + 1").unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Name);
    assert_eq!(err.hint(), Some("'f' is a function; call it as f()"));
}

#[test]
fn test_failed_fragment_leaves_no_debris() {
    let mut repl = TestSession::new().unwrap();
    repl.run("def f() { 1 }").unwrap();
    let before = repl.session().module().len();

    assert!(repl.try_run("when 1 2 else False").is_err());
    assert!(repl.try_run("f() + 1.0").is_err());
    assert_eq!(repl.session().module().len(), before);

    assert_eq!(repl.run("2+2").unwrap(), Some(NativeValue::Signed(4)));
    assert_eq!(repl.session().module().len(), before);
    assert!(repl.session().module().functions().iter().all(|f| !f.is_anonymous()));
}

#[test]
fn test_runtime_error_does_not_end_the_session() {
    let mut repl = TestSession::new().unwrap();
    repl.run("def zero() { 0 }").unwrap();
    let err = repl.try_run("1 / zero()").unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Runtime);
    assert_eq!(repl.run("zero() + 1").unwrap(), Some(NativeValue::Signed(1)));
}

#[test]
fn test_dump_lists_defined_functions() {
    let mut repl = TestSession::new().unwrap();
    repl.run("def one() { 1 }").unwrap();
    repl.run("def two() { one() + one() }").unwrap();
    let dump = repl.session().dump();
    assert!(dump.contains("; one"));
    assert!(dump.contains("; two"));
    assert!(dump.contains("call"));
}
