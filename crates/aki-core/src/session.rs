//! Interactive sessions
//!
//! A [`Session`] owns one translation module and borrows the driver's
//! shared [`TypeInterner`]. Resetting a session replaces it with a fresh
//! one; the interner survives.

use std::rc::Rc;

use cranelift_codegen::isa::CallConv;

use crate::ast::Fragment;
use crate::codegen::{CodeGenerator, CodegenResult};
use crate::error::AkiError;
use crate::jit::{JitEngine, JitResult, NativeValue};
use crate::module::TranslationModule;
use crate::parser::Parser;
use crate::types::TypeInterner;

#[derive(Debug)]
pub struct Session {
    types: Rc<TypeInterner>,
    module: TranslationModule,
}

impl Session {
    #[must_use]
    pub fn new(types: Rc<TypeInterner>, call_conv: CallConv) -> Self {
        Self {
            types,
            module: TranslationModule::new(call_conv),
        }
    }

    /// A session for `engine`'s calling convention
    #[must_use]
    pub fn for_engine(types: Rc<TypeInterner>, engine: &JitEngine) -> Self {
        Self::new(types, engine.call_conv())
    }

    pub fn types(&self) -> &TypeInterner {
        &self.types
    }

    pub fn module(&self) -> &TranslationModule {
        &self.module
    }

    /// Discard every function; the type interner is kept
    pub fn reset(&mut self) {
        let call_conv = self.module.call_conv();
        *self = Session::new(Rc::clone(&self.types), call_conv);
        tracing::debug!("session reset");
    }

    /// Lower a parsed fragment
    ///
    /// Function definitions are committed one by one as they are lowered.
    /// The remaining statements become a synthetic entry point whose name is
    /// returned; a fragment with no statements returns `None`. If the entry
    /// point fails to lower, the module is returned to its state before it.
    pub fn lower_fragment(&mut self, fragment: &Fragment) -> CodegenResult<Option<String>> {
        // An entry point that was lowered but never executed
        self.module.retire_anonymous();

        for def in fragment.functions() {
            let function = CodeGenerator::new(&self.module, &self.types).lower_named(def)?;
            self.module.commit(function);
        }

        let mut statements = fragment.statements().peekable();
        if statements.peek().is_none() {
            return Ok(None);
        }

        let checkpoint = self.module.checkpoint();
        let name = self.module.next_anonymous_name();
        let lowered = CodeGenerator::new(&self.module, &self.types).lower_function(
            &name,
            statements,
            true,
        );
        match lowered {
            Ok(function) => {
                self.module.commit(function);
                Ok(Some(name))
            }
            Err(err) => {
                self.module.rollback(checkpoint);
                Err(err)
            }
        }
    }

    /// Parse and lower `source` without running it
    pub fn compile(&mut self, source: &str) -> Result<Option<String>, AkiError> {
        let fragment = Parser::parse_fragment(source)?;
        Ok(self.lower_fragment(&fragment)?)
    }

    /// Run a lowered entry point, then retire it if it is anonymous
    pub fn execute(&mut self, engine: &mut JitEngine, entry: &str) -> JitResult<NativeValue> {
        let result = engine.execute(&self.module, entry);
        self.module.retire_anonymous();
        result
    }

    /// Parse, lower and run one fragment
    ///
    /// Returns `None` when the fragment only defined functions.
    pub fn eval(
        &mut self,
        engine: &mut JitEngine,
        source: &str,
    ) -> Result<Option<NativeValue>, AkiError> {
        let Some(entry) = self.compile(source)? else {
            return Ok(None);
        };
        Ok(Some(self.execute(engine, &entry)?))
    }

    /// Textual IR of every function in the module
    pub fn dump(&self) -> String {
        self.module.to_string()
    }

    /// Names of the functions defined so far
    pub fn defined_functions(&self) -> Vec<&str> {
        self.module.named_functions().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;

    fn session() -> Session {
        Session::new(Rc::new(TypeInterner::new()), CallConv::SystemV)
    }

    #[test]
    fn definitions_without_statements_have_no_entry() {
        let mut session = session();
        assert_eq!(session.compile("def f() { 1 }").unwrap(), None);
        assert_eq!(session.defined_functions(), ["f"]);
    }

    #[test]
    fn entry_points_are_numbered() {
        let mut session = session();
        assert_eq!(session.compile("1").unwrap().as_deref(), Some("anon$1"));
        // The unexecuted entry is retired before the next one is lowered
        assert_eq!(session.compile("2").unwrap().as_deref(), Some("anon$2"));
        assert_eq!(session.module().len(), 1);
    }

    #[test]
    fn failed_entry_leaves_no_residue() {
        let mut session = session();
        session.compile("def f() { 1 }").unwrap();
        let err = session.compile("f() + True").unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Type);
        assert_eq!(session.module().len(), 1);
        assert_eq!(session.compile("f()").unwrap().as_deref(), Some("anon$1"));
    }

    #[test]
    fn definitions_before_a_failure_are_kept() {
        let mut session = session();
        let err = session.compile("def g() { 2 }\ng() == False").unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Type);
        assert_eq!(session.defined_functions(), ["g"]);
    }

    #[test]
    fn reset_discards_functions_but_keeps_types() {
        let mut session = session();
        session.compile("def f() { 1.5 }; f()").unwrap();
        let interned = session.types().len();
        assert!(interned > 0);

        session.reset();
        assert!(session.module().is_empty());
        assert_eq!(session.types().len(), interned);
        let err = session.compile("f()").unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Name);
    }

    #[test]
    fn dump_shows_functions() {
        let mut session = session();
        session.compile("def answer() { 42 }").unwrap();
        assert!(session.dump().contains("; answer"));
    }
}
