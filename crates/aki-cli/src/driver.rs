//! Evaluation helpers shared by the REPL and the one-shot commands

use std::rc::Rc;

use aki_core::error::AkiError;
use aki_core::suite::{self, DEMO};
use aki_core::{JitEngine, NativeValue, Session, TypeInterner};

/// Lower and run one fragment, optionally printing the entry function's IR first
pub fn evaluate(
    session: &mut Session,
    engine: &mut JitEngine,
    source: &str,
    show_ir: bool,
) -> Result<Option<NativeValue>, AkiError> {
    let Some(entry) = session.compile(source)? else {
        return Ok(None);
    };
    if show_ir {
        if let Some((_, function)) = session.module().lookup(&entry) {
            print!("{}", function.ir().display());
        }
    }
    Ok(Some(session.execute(engine, &entry)?))
}

/// Print a value on stdout or a diagnostic on stderr; returns whether it succeeded
pub fn report(result: &Result<Option<NativeValue>, AkiError>, source: &str) -> bool {
    match result {
        Ok(Some(value)) => {
            println!("{value}");
            true
        }
        Ok(None) => true,
        Err(err) => {
            eprintln!("{}", err.render(source));
            false
        }
    }
}

/// Run the demo commands in one session, printing each module and result
pub fn run_demo(engine: &mut JitEngine, types: &Rc<TypeInterner>) {
    let mut session = Session::for_engine(Rc::clone(types), engine);
    for source in DEMO {
        println!(">>> {source}");
        let result = evaluate(&mut session, engine, source, true);
        report(&result, source);
    }
}

/// Run the conformance suite; returns whether every case passed
pub fn run_tests(engine: &mut JitEngine, types: &Rc<TypeInterner>) -> bool {
    let report = suite::run_suite(engine, types);
    println!("{report}");
    report.is_success()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (JitEngine, Session) {
        let engine = JitEngine::new().unwrap();
        let session = Session::for_engine(Rc::new(TypeInterner::new()), &engine);
        (engine, session)
    }

    #[test]
    fn test_evaluate_value_and_definitions() {
        let (mut engine, mut session) = setup();
        let defined = evaluate(&mut session, &mut engine, "def f() { 3 }", false).unwrap();
        assert_eq!(defined, None);
        let value = evaluate(&mut session, &mut engine, "f() * 2", true).unwrap();
        assert_eq!(value, Some(NativeValue::Signed(6)));
    }

    #[test]
    fn test_report_outcome() {
        let (mut engine, mut session) = setup();
        let ok = evaluate(&mut session, &mut engine, "2+2", false);
        assert!(report(&ok, "2+2"));
        let failed = evaluate(&mut session, &mut engine, "2==True", false);
        assert!(!report(&failed, "2==True"));
    }

    #[test]
    fn test_suite_passes() {
        let mut engine = JitEngine::new().unwrap();
        assert!(run_tests(&mut engine, &Rc::new(TypeInterner::new())));
    }
}
