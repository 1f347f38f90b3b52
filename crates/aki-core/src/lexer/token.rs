//! Token kinds for the Aki lexer

use logos::Logos;

/// The kind of token produced by the lexer
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r]+")]
pub enum TokenKind {
    // ========== Keywords ==========
    #[token("def")]
    Def,
    #[token("if")]
    If,
    #[token("when")]
    When,
    #[token("else")]
    Else,

    // ========== Literals ==========
    /// Signed 64-bit integer literal
    #[regex(r"[0-9][0-9_]*")]
    Int,

    /// Unsigned 64-bit integer literal, e.g. `2_U`
    #[regex(r"[0-9][0-9_]*[uU]")]
    UnsignedInt,

    /// Float literal; an optional suffix picks the width
    #[regex(r"[0-9][0-9_]*\.[0-9][0-9_]*([eE][+-]?[0-9][0-9_]*)?[fFhHdD]?")]
    #[regex(r"[0-9][0-9_]*[eE][+-]?[0-9][0-9_]*[fFhHdD]?")]
    #[regex(r"[0-9][0-9_]*[fFhHdD]")]
    Float,

    #[token("True")]
    True,
    #[token("False")]
    False,
    #[token("NaN")]
    NaN,
    #[token("inf")]
    #[token("Infinity")]
    Infinity,

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,

    // ========== Operators ==========
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,
    #[token("&")]
    Ampersand,
    #[token("|")]
    Pipe,
    #[token("^")]
    Caret,
    #[token("<<")]
    Shl,
    #[token(">>")]
    Shr,

    // ========== Delimiters ==========
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,

    /// Line comment: // ...
    #[regex(r"//[^\n]*")]
    LineComment,

    /// Statement separator
    #[token("\n")]
    Newline,

    /// End of input (added by the lexer, not matched by logos)
    Eof,

    /// Lexer error - invalid character
    Error,
}

impl TokenKind {
    /// Returns true if this token is a literal
    #[must_use]
    pub const fn is_literal(&self) -> bool {
        matches!(
            self,
            Self::Int
                | Self::UnsignedInt
                | Self::Float
                | Self::True
                | Self::False
                | Self::NaN
                | Self::Infinity
        )
    }

    /// Tokens that end a statement
    #[must_use]
    pub const fn is_separator(&self) -> bool {
        matches!(self, Self::Newline | Self::Semicolon)
    }

    /// Returns true if the parser should never see this token
    #[must_use]
    pub const fn is_trivia(&self) -> bool {
        matches!(self, Self::LineComment)
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::Def => "def",
            Self::If => "if",
            Self::When => "when",
            Self::Else => "else",
            Self::Int => "integer",
            Self::UnsignedInt => "unsigned integer",
            Self::Float => "float",
            Self::True => "True",
            Self::False => "False",
            Self::NaN => "NaN",
            Self::Infinity => "inf",
            Self::Ident => "identifier",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Star => "*",
            Self::Slash => "/",
            Self::EqEq => "==",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::LtEq => "<=",
            Self::GtEq => ">=",
            Self::Ampersand => "&",
            Self::Pipe => "|",
            Self::Caret => "^",
            Self::Shl => "<<",
            Self::Shr => ">>",
            Self::LParen => "(",
            Self::RParen => ")",
            Self::LBrace => "{",
            Self::RBrace => "}",
            Self::Comma => ",",
            Self::Semicolon => ";",
            Self::LineComment => "// comment",
            Self::Newline => "newline",
            Self::Eof => "end of input",
            Self::Error => "error",
        };
        f.write_str(text)
    }
}
