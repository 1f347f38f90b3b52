//! Built-in conformance suite and demo
//!
//! The suite is shipped with the library so the REPL's `.test` command and
//! the CLI's `test` subcommand can check the host build end to end.

use std::fmt;
use std::rc::Rc;

use crate::error::ErrorCategory;
use crate::jit::NativeValue::{Boolean, Float16, Float32, Float64, Signed, Unsigned};
use crate::jit::{JitEngine, NativeValue};
use crate::session::Session;
use crate::types::TypeInterner;

/// Commands shown by `.demo`
pub const DEMO: &[&str] = &["True", "2", "2+2", "2==2", "2==4", "if 32==2 0 else 1"];

/// The outcome a case expects
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Expect {
    Value(NativeValue),
    Error(ErrorCategory),
}

/// One conformance case
#[derive(Debug, Clone, Copy)]
pub struct Case {
    pub name: &'static str,
    /// Commands run first in the same session; their results are ignored
    pub setup: &'static [&'static str],
    /// Reset the session after setup
    pub reset: bool,
    pub source: &'static str,
    pub expect: Expect,
}

const fn value(name: &'static str, source: &'static str, v: NativeValue) -> Case {
    Case {
        name,
        setup: &[],
        reset: false,
        source,
        expect: Expect::Value(v),
    }
}

const fn error(name: &'static str, source: &'static str, category: ErrorCategory) -> Case {
    Case {
        name,
        setup: &[],
        reset: false,
        source,
        expect: Expect::Error(category),
    }
}

pub const CASES: &[Case] = &[
    // Literals
    value("signed literal", "2", Signed(2)),
    value("float literal", "2.0", Float64(2.0)),
    value("boolean literal", "True", Boolean(true)),
    value("unsigned literal", "9223372036854775808_U", Unsigned(1 << 63)),
    value("float32 literal", "1.5_F", Float32(1.5)),
    value("float16 literal", "0.1_H", Float16(0.099_975_586)),
    value("infinity", "-inf", Float64(f64::NEG_INFINITY)),
    // Float comparisons are ordered
    value("NaN != NaN", "NaN != NaN", Boolean(false)),
    value("NaN != 1.0", "NaN != 1.0", Boolean(false)),
    // Boolean arithmetic widens to i64
    value("True+True", "True+True", Signed(2)),
    value("True-True", "True-True", Signed(0)),
    value("False+True", "False+True", Signed(1)),
    value("False-True", "False-True", Signed(-1)),
    // Operand types must match
    error("int == bool", "2==True", ErrorCategory::Type),
    error("int != bool", "2!=True", ErrorCategory::Type),
    error("int > bool", "2>True", ErrorCategory::Type),
    error("int < bool", "2<True", ErrorCategory::Type),
    error("int >= bool", "2>=True", ErrorCategory::Type),
    error("int <= bool", "2<=True", ErrorCategory::Type),
    error("unsigned negation", "-2_U", ErrorCategory::Type),
    // Conditionals
    value("if", "if 2==2 1 else 0", Signed(1)),
    error("if test mismatch", "if 2==True 1 else 0", ErrorCategory::Type),
    error("if branch mismatch", "if 2==2 1 else False", ErrorCategory::Type),
    value("when truthy", "when 32 1 else 0", Signed(1)),
    value("when falsy", "when 0 1 else 0", Signed(0)),
    value("float truthiness", "when 0.0 1 else 2", Signed(2)),
    // Precedence
    value("chained add", "2+2+2", Signed(6)),
    value("div then add", "4/2+2", Signed(4)),
    value("parenthesized", "4/(2+2)", Signed(1)),
    // Bitwise and shifts
    value("and", "2 & 3", Signed(2)),
    value("or", "2 | 3", Signed(3)),
    value("xor", "2 ^ 3", Signed(1)),
    value("shl", "2 << 2", Signed(8)),
    value("shr", "8 >> 3", Signed(1)),
    // Division
    error("division by zero", "1/0", ErrorCategory::Runtime),
    value("float division by zero", "1.0/0.0", Float64(f64::INFINITY)),
    value("wrapping division", "(-9223372036854775807 - 1) / -1", Signed(i64::MIN)),
    // Calls
    error("undefined function", "nope()", ErrorCategory::Name),
    Case {
        name: "persistent function",
        setup: &["def answer() { 42 }"],
        reset: false,
        source: "answer()",
        expect: Expect::Value(Signed(42)),
    },
    Case {
        name: "arity",
        setup: &["def answer() { 42 }"],
        reset: false,
        source: "answer(1)",
        expect: Expect::Error(ErrorCategory::Arity),
    },
    Case {
        name: "reset forgets functions",
        setup: &["def answer() { 42 }"],
        reset: true,
        source: "answer()",
        expect: Expect::Error(ErrorCategory::Name),
    },
    Case {
        name: "rollback leaves no debris",
        setup: &["when 1 2 else False"],
        reset: false,
        source: "2+2",
        expect: Expect::Value(Signed(4)),
    },
];

#[derive(Debug)]
pub struct CaseOutcome {
    pub case: &'static Case,
    /// `Err` carries what went wrong
    pub result: Result<(), String>,
}

#[derive(Debug, Default)]
pub struct SuiteReport {
    pub outcomes: Vec<CaseOutcome>,
}

impl SuiteReport {
    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> impl Iterator<Item = &CaseOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }

    pub fn is_success(&self) -> bool {
        self.failed().next().is_none()
    }
}

impl fmt::Display for SuiteReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for outcome in &self.outcomes {
            match &outcome.result {
                Ok(()) => writeln!(f, "ok    {}", outcome.case.name)?,
                Err(why) => writeln!(f, "FAIL  {}: {why}", outcome.case.name)?,
            }
        }
        write!(
            f,
            "{} passed, {} failed",
            self.passed(),
            self.outcomes.len() - self.passed()
        )
    }
}

/// Run every case in its own session
pub fn run_suite(engine: &mut JitEngine, types: &Rc<TypeInterner>) -> SuiteReport {
    let outcomes = CASES
        .iter()
        .map(|case| CaseOutcome {
            case,
            result: run_case(engine, types, case),
        })
        .collect();
    SuiteReport { outcomes }
}

fn run_case(engine: &mut JitEngine, types: &Rc<TypeInterner>, case: &Case) -> Result<(), String> {
    let mut session = Session::for_engine(Rc::clone(types), engine);
    for setup in case.setup {
        let _ = session.eval(engine, setup);
    }
    if case.reset {
        session.reset();
    }

    let outcome = session.eval(engine, case.source);
    match (case.expect, outcome) {
        (Expect::Value(expected), Ok(Some(actual))) if same_value(expected, actual) => Ok(()),
        (Expect::Value(expected), Ok(Some(actual))) => {
            Err(format!("expected {expected}, got {actual}"))
        }
        (Expect::Value(expected), Ok(None)) => Err(format!("expected {expected}, got no value")),
        (Expect::Value(expected), Err(err)) => Err(format!(
            "expected {expected}, got {}: {}",
            err.category(),
            err.message()
        )),
        (Expect::Error(expected), Err(err)) if err.category() == expected => Ok(()),
        (Expect::Error(expected), Err(err)) => Err(format!(
            "expected {expected}, got {}: {}",
            err.category(),
            err.message()
        )),
        (Expect::Error(expected), Ok(value)) => Err(format!(
            "expected {expected}, got {}",
            value.map_or_else(|| "no value".to_string(), |v| v.to_string())
        )),
    }
}

/// Equality that treats two NaNs of the same width as equal
fn same_value(expected: NativeValue, actual: NativeValue) -> bool {
    match (expected, actual) {
        (Float64(a), Float64(b)) => a == b || (a.is_nan() && b.is_nan()),
        (Float32(a), Float32(b)) | (Float16(a), Float16(b)) => {
            a == b || (a.is_nan() && b.is_nan())
        }
        _ => expected == actual,
    }
}

impl fmt::Display for Expect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expect::Value(v) => write!(f, "{v} ({})", v.type_name()),
            Expect::Error(category) => write!(f, "{category}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_names_are_unique() {
        let mut names: Vec<_> = CASES.iter().map(|c| c.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), CASES.len());
    }

    #[test]
    fn whole_suite_passes() {
        let mut engine = JitEngine::new().unwrap();
        let types = Rc::new(TypeInterner::new());
        let report = run_suite(&mut engine, &types);
        assert!(report.is_success(), "{report}");
        assert_eq!(report.passed(), CASES.len());
    }

    #[test]
    fn report_lists_failures() {
        static BAD: Case = Case {
            name: "bad",
            setup: &[],
            reset: false,
            source: "1",
            expect: Expect::Value(NativeValue::Signed(2)),
        };
        let report = SuiteReport {
            outcomes: vec![CaseOutcome {
                case: &BAD,
                result: Err("expected 2 (i64), got 1".into()),
            }],
        };
        assert!(!report.is_success());
        assert_eq!(
            report.to_string(),
            "FAIL  bad: expected 2 (i64), got 1\n0 passed, 1 failed"
        );
    }
}
