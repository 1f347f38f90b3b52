//! Parser error types

use crate::lexer::{LexError, Span, TokenKind};
use thiserror::Error;

/// A parser error with location information
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Span,
    /// Optional hint for fixing the error
    pub hint: Option<String>,
}

impl ParseError {
    #[must_use]
    pub fn new(kind: ParseErrorKind, span: Span) -> Self {
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
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at {}", self.kind, self.span)?;
        if let Some(hint) = &self.hint {
            write!(f, " (hint: {hint})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

/// The kind of parse error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseErrorKind {
    #[error("{0}")]
    Lex(LexError),

    #[error("unexpected token: found {found}, expected {expected}")]
    UnexpectedToken {
        found: TokenKind,
        expected: ExpectedToken,
    },

    #[error("expected expression")]
    ExpectedExpression,

    #[error("expected identifier")]
    ExpectedIdentifier,

    #[error("invalid number literal: {0}")]
    InvalidNumber(String),

    #[error("function parameters are not supported")]
    ParametersUnsupported,

    #[error("function body is empty")]
    EmptyFunctionBody,

    #[error("function definitions are only allowed at the top level")]
    NestedFunction,
}

/// What token was expected
#[derive(Debug, Clone, PartialEq)]
pub enum ExpectedToken {
    /// A specific token kind
    Token(TokenKind),
    /// A description of what was expected
    Description(&'static str),
}

impl std::fmt::Display for ExpectedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExpectedToken::Token(kind) => write!(f, "'{kind}'"),
            ExpectedToken::Description(desc) => f.write_str(desc),
        }
    }
}
