//! Lexer for Aki fragments
//!
//! Turns source text into a flat token stream. Newlines are kept as tokens
//! because they separate statements; comments are marked as trivia.

#![allow(clippy::cast_possible_truncation)] // Fragments are REPL-sized; u32 offsets are plenty

mod span;
mod token;

pub use span::{LineIndex, Location, Span};
pub use token::TokenKind;

use logos::Logos;
use thiserror::Error;

/// A token with its kind, span, and source text
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub lexeme: String,
}

impl Token {
    #[must_use]
    pub fn new(kind: TokenKind, span: Span, lexeme: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            lexeme: lexeme.into(),
        }
    }
}

/// Lexer error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LexError {
    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),
}

/// A lexer error with location information
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedError {
    pub error: LexError,
    pub span: Span,
}

impl std::fmt::Display for SpannedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at {}", self.error, self.span)
    }
}

impl std::error::Error for SpannedError {}

/// The Aki lexer
pub struct Lexer;

impl Lexer {
    /// Tokenize a whole fragment. The returned stream always ends with `Eof`.
    #[must_use]
    pub fn tokenize(source: &str) -> (Vec<Token>, Vec<SpannedError>) {
        let mut tokens = Vec::new();
        let mut errors = Vec::new();
        let mut lexer = TokenKind::lexer(source);

        while let Some(result) = lexer.next() {
            let span = Span::from(lexer.span());
            match result {
                Ok(kind) => tokens.push(Token::new(kind, span, lexer.slice())),
                Err(()) => {
                    let bad = lexer.slice().chars().next().unwrap_or('\0');
                    errors.push(SpannedError {
                        error: LexError::UnexpectedChar(bad),
                        span,
                    });
                    tokens.push(Token::new(TokenKind::Error, span, lexer.slice()));
                }
            }
        }

        let end = source.len() as u32;
        tokens.push(Token::new(TokenKind::Eof, Span::new(end, end), ""));
        (tokens, errors)
    }
}
