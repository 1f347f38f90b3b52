//! The translation module: every function a session has produced
//!
//! Functions are stored in definition order. A function's position fixes
//! its external-name index (`USER_FUNCTION_BASE + position`), which is how
//! calls between functions are resolved when the module is loaded. Named
//! functions are never removed, so indices stay stable; only the most
//! recent anonymous entry point can be retired or rolled back.

use std::fmt;

use cranelift_codegen::ir;
use cranelift_codegen::isa::CallConv;

use crate::runtime::USER_FUNCTION_BASE;
use crate::types::{NativeRepr, Ty};

/// Position of a function in its module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FuncIndex(u32);

impl FuncIndex {
    /// Index used in the function's external name
    #[must_use]
    pub const fn external_index(self) -> u32 {
        USER_FUNCTION_BASE + self.0
    }
}

/// A fully lowered function
#[derive(Debug, Clone)]
pub struct FunctionDef {
    name: String,
    return_ty: Ty,
    return_repr: NativeRepr,
    anonymous: bool,
    ir: ir::Function,
}

impl FunctionDef {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        return_ty: Ty,
        return_repr: NativeRepr,
        anonymous: bool,
        ir: ir::Function,
    ) -> Self {
        Self {
            name: name.into(),
            return_ty,
            return_repr,
            anonymous,
            ir,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of declared parameters
    pub fn arity(&self) -> usize {
        self.ir.signature.params.len()
    }

    pub fn return_ty(&self) -> Ty {
        self.return_ty
    }

    pub fn return_repr(&self) -> NativeRepr {
        self.return_repr
    }

    /// True for the synthetic wrapper around an immediate fragment
    pub fn is_anonymous(&self) -> bool {
        self.anonymous
    }

    pub fn ir(&self) -> &ir::Function {
        &self.ir
    }

    pub fn signature(&self) -> &ir::Signature {
        &self.ir.signature
    }
}

/// Module state to return to if lowering a fragment fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    functions: usize,
    anonymous_counter: u32,
}

#[derive(Debug)]
pub struct TranslationModule {
    call_conv: CallConv,
    functions: Vec<FunctionDef>,
    anonymous_counter: u32,
}

impl TranslationModule {
    #[must_use]
    pub fn new(call_conv: CallConv) -> Self {
        Self {
            call_conv,
            functions: Vec::new(),
            anonymous_counter: 0,
        }
    }

    pub fn call_conv(&self) -> CallConv {
        self.call_conv
    }

    pub fn functions(&self) -> &[FunctionDef] {
        &self.functions
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub fn lookup(&self, name: &str) -> Option<(FuncIndex, &FunctionDef)> {
        self.functions
            .iter()
            .enumerate()
            .find(|(_, def)| def.name == name)
            .map(|(i, def)| (Self::index_at(i), def))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Names of the functions a user defined, in definition order
    pub fn named_functions(&self) -> impl Iterator<Item = &str> {
        self.functions
            .iter()
            .filter(|def| !def.anonymous)
            .map(|def| def.name.as_str())
    }

    /// Reserve the next synthetic entry-point name
    ///
    /// The sigil keeps these names out of reach of source identifiers.
    pub fn next_anonymous_name(&mut self) -> String {
        self.anonymous_counter += 1;
        format!("anon${}", self.anonymous_counter)
    }

    /// Index the next committed function will receive
    pub fn next_index(&self) -> FuncIndex {
        Self::index_at(self.functions.len())
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            functions: self.functions.len(),
            anonymous_counter: self.anonymous_counter,
        }
    }

    /// Discard everything added since `checkpoint`
    pub fn rollback(&mut self, checkpoint: Checkpoint) {
        let discarded = self.functions.len().saturating_sub(checkpoint.functions);
        self.functions.truncate(checkpoint.functions);
        self.anonymous_counter = checkpoint.anonymous_counter;
        tracing::debug!(discarded, "rolled back translation module");
    }

    /// Append a finished function
    pub fn commit(&mut self, function: FunctionDef) -> FuncIndex {
        let index = self.next_index();
        tracing::debug!(
            name = %function.name,
            index = index.external_index(),
            anonymous = function.anonymous,
            "committed function"
        );
        self.functions.push(function);
        index
    }

    /// Remove the trailing anonymous entry point, if there is one
    pub fn retire_anonymous(&mut self) -> Option<FunctionDef> {
        if self.functions.last().is_some_and(FunctionDef::is_anonymous) {
            let retired = self.functions.pop();
            if let Some(def) = &retired {
                tracing::trace!(name = %def.name, "retired entry point");
            }
            retired
        } else {
            None
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn index_at(position: usize) -> FuncIndex {
        FuncIndex(position as u32)
    }
}

impl fmt::Display for TranslationModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, def) in self.functions.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            writeln!(f, "; {}", def.name)?;
            write!(f, "{}", def.ir.display())?;
        }
        Ok(())
    }
}
