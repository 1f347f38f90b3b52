//! Lowering errors

use thiserror::Error;

use crate::ast::BinaryOp;
use crate::error::ErrorCategory;
use crate::lexer::Span;
use crate::types::{SemType, TypeError};

/// A lowering error pointing at the node that caused it
#[derive(Debug, Clone, PartialEq)]
pub struct CodegenError {
    pub kind: CodegenErrorKind,
    pub span: Span,
    pub hint: Option<String>,
}

impl CodegenError {
    #[must_use]
    pub fn new(kind: CodegenErrorKind, span: Span) -> Self {
        Self {
            kind,
            span,
            hint: None,
        }
    }

    #[must_use]
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn category(&self) -> ErrorCategory {
        self.kind.category()
    }
}

impl std::fmt::Display for CodegenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at {}", self.kind, self.span)
    }
}

impl std::error::Error for CodegenError {}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CodegenErrorKind {
    #[error("incompatible types for op '{op}': {lhs} and {rhs}")]
    IncompatibleOperands {
        op: BinaryOp,
        lhs: SemType,
        rhs: SemType,
    },

    #[error("then/else expressions must yield same type (found {then_ty} and {else_ty})")]
    BranchMismatch { then_ty: SemType, else_ty: SemType },

    #[error(transparent)]
    Type(#[from] TypeError),

    #[error("function '{0}' is not defined")]
    UndefinedFunction(String),

    #[error("name '{0}' is not defined")]
    UndefinedName(String),

    #[error("function '{0}' is already defined")]
    DuplicateFunction(String),

    #[error("function '{name}' takes {expected} argument(s) but {found} were given")]
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("function parameters are not supported")]
    ParametersUnsupported,

    #[error("function definitions are only allowed at the top level")]
    MisplacedFunction,
}

impl CodegenErrorKind {
    pub fn category(&self) -> ErrorCategory {
        match self {
            CodegenErrorKind::IncompatibleOperands { .. }
            | CodegenErrorKind::BranchMismatch { .. }
            | CodegenErrorKind::Type(_) => ErrorCategory::Type,
            CodegenErrorKind::UndefinedFunction(_)
            | CodegenErrorKind::UndefinedName(_)
            | CodegenErrorKind::DuplicateFunction(_) => ErrorCategory::Name,
            CodegenErrorKind::ArityMismatch { .. } => ErrorCategory::Arity,
            CodegenErrorKind::ParametersUnsupported | CodegenErrorKind::MisplacedFunction => {
                ErrorCategory::Syntax
            }
        }
    }
}

pub type CodegenResult<T> = Result<T, CodegenError>;
