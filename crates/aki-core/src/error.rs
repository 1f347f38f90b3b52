//! Top-level error type and diagnostic rendering

use std::fmt::Write as _;

use thiserror::Error;

use crate::codegen::CodegenError;
use crate::jit::JitError;
use crate::lexer::{LineIndex, Span};
use crate::parser::ParseError;

/// The error taxonomy shown to users
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Syntax,
    Type,
    Name,
    Arity,
    Verification,
    Runtime,
    /// A broken internal invariant
    Internal,
}

impl ErrorCategory {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            ErrorCategory::Syntax => "SyntaxError",
            ErrorCategory::Type => "TypeError",
            ErrorCategory::Name => "NameError",
            ErrorCategory::Arity => "ArityError",
            ErrorCategory::Verification => "VerificationError",
            ErrorCategory::Runtime => "RuntimeError",
            ErrorCategory::Internal => "InternalError",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Any error a command can end with
#[derive(Debug, Error)]
pub enum AkiError {
    #[error("{}", first_message(.0))]
    Syntax(Vec<ParseError>),

    #[error(transparent)]
    Codegen(#[from] CodegenError),

    #[error(transparent)]
    Jit(#[from] JitError),
}

fn first_message(errors: &[ParseError]) -> String {
    errors
        .first()
        .map_or_else(|| "invalid syntax".to_string(), ToString::to_string)
}

impl From<Vec<ParseError>> for AkiError {
    fn from(errors: Vec<ParseError>) -> Self {
        AkiError::Syntax(errors)
    }
}

impl AkiError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AkiError::Syntax(_) => ErrorCategory::Syntax,
            AkiError::Codegen(err) => err.category(),
            AkiError::Jit(JitError::Verification { .. }) => ErrorCategory::Verification,
            AkiError::Jit(JitError::Runtime(_)) => ErrorCategory::Runtime,
            AkiError::Jit(_) => ErrorCategory::Internal,
        }
    }

    /// Where in the fragment the error was detected, if anywhere
    pub fn span(&self) -> Option<Span> {
        match self {
            AkiError::Syntax(errors) => errors.first().map(|e| e.span),
            AkiError::Codegen(err) => Some(err.span),
            AkiError::Jit(_) => None,
        }
    }

    /// The message without position information
    pub fn message(&self) -> String {
        match self {
            AkiError::Syntax(errors) => errors
                .first()
                .map_or_else(|| "invalid syntax".to_string(), |e| e.kind.to_string()),
            AkiError::Codegen(err) => err.kind.to_string(),
            AkiError::Jit(err) => err.to_string(),
        }
    }

    pub fn hint(&self) -> Option<&str> {
        match self {
            AkiError::Syntax(errors) => errors.first().and_then(|e| e.hint.as_deref()),
            AkiError::Codegen(err) => err.hint.as_deref(),
            AkiError::Jit(_) => None,
        }
    }

    /// Format the error for display against the fragment it came from
    ///
    /// ```text
    /// TypeError: (line 1, col 1) incompatible types for op '==': i64 and bool
    /// 2==True
    /// ^
    /// ```
    pub fn render(&self, source: &str) -> String {
        let label = self.category().label();
        let mut out = String::new();

        match self.span() {
            Some(span) => {
                let index = LineIndex::new(source);
                let location = index.location(span.start);
                let _ = writeln!(out, "{label}: ({location}) {}", self.message());
                let _ = writeln!(out, "{}", index.line_text(location.line));
                let _ = write!(
                    out,
                    "{}^",
                    "-".repeat(location.column.saturating_sub(1) as usize)
                );
            }
            None => {
                let _ = write!(out, "{label}: {}", self.message());
            }
        }

        if let Some(hint) = self.hint() {
            let _ = write!(out, "\nhint: {hint}");
        }
        if let AkiError::Jit(JitError::Verification { report, module, .. }) = self {
            let _ = write!(out, "\n{}\n{}", report.trim_end(), module.trim_end());
        }
        out
    }
}
