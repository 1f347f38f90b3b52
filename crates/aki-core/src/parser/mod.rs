//! Parser for Aki fragments
//!
//! A Pratt parser (top-down operator precedence) over the token stream from
//! [`crate::lexer`]. A fragment is a list of statements separated by `;` or
//! newlines; each statement is either a `def` or an expression.
//!
//! # Example
//!
//! ```
//! use aki_core::parser::Parser;
//!
//! let fragment = Parser::parse_fragment("def answer() { 42 }; answer() + 1");
//! assert!(fragment.is_ok());
//!
//! let expr = Parser::parse_expression("when 32 1 else 0");
//! assert!(expr.is_ok());
//! ```

mod error;

pub use error::{ExpectedToken, ParseError, ParseErrorKind};

use crate::ast::{
    BinaryOp, ConditionalForm, Fragment, FunctionDef, Ident, Literal, Node, NodeKind, UnaryOp,
};
use crate::lexer::{Lexer, Token, TokenKind};
use crate::types::round_f64_to_half;

/// Result type for parsing operations
pub type ParseResult<T> = Result<T, ParseError>;

/// The Aki parser
pub struct Parser {
    /// Tokens with trivia removed; always ends with `Eof`
    tokens: Vec<Token>,
    position: usize,
    errors: Vec<ParseError>,
}

impl Parser {
    /// Create a parser over `source`. Lexical errors are recorded up front.
    #[must_use]
    pub fn new(source: &str) -> Self {
        let (mut tokens, lex_errors) = Lexer::tokenize(source);
        tokens.retain(|token| !token.kind.is_trivia());
        let errors = lex_errors
            .into_iter()
            .map(|e| ParseError::new(ParseErrorKind::Lex(e.error), e.span))
            .collect();
        Self {
            tokens,
            position: 0,
            errors,
        }
    }

    /// Parse a REPL submission or a whole file
    pub fn parse_fragment(source: &str) -> Result<Fragment, Vec<ParseError>> {
        let mut parser = Parser::new(source);
        if !parser.errors.is_empty() {
            return Err(parser.errors);
        }
        let fragment = parser.fragment();
        if parser.errors.is_empty() {
            Ok(fragment)
        } else {
            Err(parser.errors)
        }
    }

    /// Parse a single expression, rejecting trailing input
    pub fn parse_expression(source: &str) -> Result<Node, Vec<ParseError>> {
        let mut parser = Parser::new(source);
        if !parser.errors.is_empty() {
            return Err(parser.errors);
        }
        let result = parser.expression().and_then(|node| {
            parser.skip_separators();
            parser.expect(TokenKind::Eof)?;
            Ok(node)
        });
        match result {
            Ok(node) => Ok(node),
            Err(e) => {
                parser.errors.push(e);
                Err(parser.errors)
            }
        }
    }

    // ==================== Token Management ====================

    fn current(&self) -> &Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[self.position.min(last)]
    }

    fn current_kind(&self) -> TokenKind {
        self.current().kind
    }

    fn is_eof(&self) -> bool {
        self.current_kind() == TokenKind::Eof
    }

    /// Advance to the next token; never moves past `Eof`
    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if !self.is_eof() {
            self.position += 1;
        }
        token
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current_kind() == kind
    }

    fn eat(&mut self, kind: TokenKind) -> Option<Token> {
        if self.check(kind) {
            Some(self.advance())
        } else {
            None
        }
    }

    fn expect(&mut self, kind: TokenKind) -> ParseResult<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(ExpectedToken::Token(kind)))
        }
    }

    fn expect_ident(&mut self) -> ParseResult<Ident> {
        if self.check(TokenKind::Ident) {
            let token = self.advance();
            Ok(Ident::new(token.lexeme, token.span))
        } else {
            Err(ParseError::new(
                ParseErrorKind::ExpectedIdentifier,
                self.current().span,
            ))
        }
    }

    fn unexpected(&self, expected: ExpectedToken) -> ParseError {
        ParseError::new(
            ParseErrorKind::UnexpectedToken {
                found: self.current_kind(),
                expected,
            },
            self.current().span,
        )
    }

    fn skip_separators(&mut self) {
        while self.current_kind().is_separator() {
            self.advance();
        }
    }

    /// Skip to the next statement boundary after an error
    fn synchronize(&mut self) {
        while !self.is_eof() && !self.current_kind().is_separator() {
            self.advance();
        }
    }

    /// A statement must be followed by a separator or by `closer`
    fn end_of_statement(&self, closer: TokenKind) -> ParseResult<()> {
        if self.current_kind().is_separator() || self.check(closer) {
            Ok(())
        } else {
            Err(self.unexpected(ExpectedToken::Description("';' or newline")))
        }
    }

    // ==================== Statements ====================

    fn fragment(&mut self) -> Fragment {
        let mut nodes = Vec::new();
        self.skip_separators();
        while !self.is_eof() {
            let statement = self
                .statement()
                .and_then(|node| self.end_of_statement(TokenKind::Eof).map(|()| node));
            match statement {
                Ok(node) => nodes.push(node),
                Err(e) => {
                    self.errors.push(e);
                    self.synchronize();
                }
            }
            self.skip_separators();
        }
        Fragment::new(nodes)
    }

    fn statement(&mut self) -> ParseResult<Node> {
        if self.check(TokenKind::Def) {
            self.function_def()
        } else {
            self.expression()
        }
    }

    /// `def name() { stmt; stmt }`
    fn function_def(&mut self) -> ParseResult<Node> {
        let start = self.expect(TokenKind::Def)?.span;
        let name = self.expect_ident()?;
        self.expect(TokenKind::LParen)?;
        if !self.check(TokenKind::RParen) {
            return Err(
                ParseError::new(ParseErrorKind::ParametersUnsupported, self.current().span)
                    .with_hint("functions take no arguments: def name() { ... }"),
            );
        }
        self.expect(TokenKind::RParen)?;
        self.expect(TokenKind::LBrace)?;

        let mut body = Vec::new();
        self.skip_separators();
        while !self.check(TokenKind::RBrace) && !self.is_eof() {
            if self.check(TokenKind::Def) {
                return Err(ParseError::new(
                    ParseErrorKind::NestedFunction,
                    self.current().span,
                ));
            }
            body.push(self.expression()?);
            self.end_of_statement(TokenKind::RBrace)?;
            self.skip_separators();
        }
        let close = self.expect(TokenKind::RBrace)?;
        let span = start.to(close.span);

        if body.is_empty() {
            return Err(ParseError::new(ParseErrorKind::EmptyFunctionBody, span)
                .with_hint("the last statement of a function is its return value"));
        }

        Ok(Node::new(
            NodeKind::Function(FunctionDef {
                name,
                params: Vec::new(),
                body,
            }),
            span,
        ))
    }

    // ==================== Expression Parsing (Pratt Parser) ====================

    /// Parse an expression
    pub fn expression(&mut self) -> ParseResult<Node> {
        self.parse_precedence(0)
    }

    fn parse_precedence(&mut self, min_prec: u8) -> ParseResult<Node> {
        let mut lhs = self.prefix_expr()?;

        while let Some((op, prec)) = self.infix_op() {
            if prec < min_prec {
                break;
            }
            self.advance();
            // Every operator is left-associative
            let rhs = self.parse_precedence(prec + 1)?;
            let span = lhs.span.to(rhs.span);
            lhs = Node::new(
                NodeKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span,
            );
        }

        Ok(lhs)
    }

    fn infix_op(&self) -> Option<(BinaryOp, u8)> {
        let op = match self.current_kind() {
            TokenKind::Plus => BinaryOp::Add,
            TokenKind::Minus => BinaryOp::Sub,
            TokenKind::Star => BinaryOp::Mul,
            TokenKind::Slash => BinaryOp::Div,
            TokenKind::Ampersand => BinaryOp::BitAnd,
            TokenKind::Pipe => BinaryOp::BitOr,
            TokenKind::Caret => BinaryOp::BitXor,
            TokenKind::Shl => BinaryOp::Shl,
            TokenKind::Shr => BinaryOp::Shr,
            TokenKind::EqEq => BinaryOp::Eq,
            TokenKind::NotEq => BinaryOp::Ne,
            TokenKind::Gt => BinaryOp::Gt,
            TokenKind::Lt => BinaryOp::Lt,
            TokenKind::GtEq => BinaryOp::Ge,
            TokenKind::LtEq => BinaryOp::Le,
            _ => return None,
        };
        Some((op, op.precedence()))
    }

    fn prefix_expr(&mut self) -> ParseResult<Node> {
        if self.check(TokenKind::Minus) {
            let op_token = self.advance();
            // 2^63 only fits once negated
            if self.check(TokenKind::Int) && is_min_magnitude(&self.current().lexeme) {
                let token = self.advance();
                return Ok(Node::new(
                    NodeKind::Literal(Literal::Signed(i64::MIN)),
                    op_token.span.to(token.span),
                ));
            }
            let operand = self.prefix_expr()?;
            let span = op_token.span.to(operand.span);
            return Ok(Node::new(
                NodeKind::Unary {
                    op: UnaryOp::Neg,
                    operand: Box::new(operand),
                },
                span,
            ));
        }
        self.primary_expr()
    }

    fn primary_expr(&mut self) -> ParseResult<Node> {
        match self.current_kind() {
            kind if kind.is_literal() => self.literal(),
            TokenKind::Ident => self.name_or_call(),
            TokenKind::LParen => {
                self.advance();
                let inner = self.expression()?;
                self.expect(TokenKind::RParen)?;
                Ok(inner)
            }
            TokenKind::If => self.conditional(ConditionalForm::If),
            TokenKind::When => self.conditional(ConditionalForm::When),
            TokenKind::Def => Err(ParseError::new(
                ParseErrorKind::NestedFunction,
                self.current().span,
            )),
            _ => Err(ParseError::new(
                ParseErrorKind::ExpectedExpression,
                self.current().span,
            )),
        }
    }

    fn literal(&mut self) -> ParseResult<Node> {
        let token = self.advance();
        let literal = match token.kind {
            TokenKind::True => Literal::Boolean(true),
            TokenKind::False => Literal::Boolean(false),
            TokenKind::NaN => Literal::Float64(f64::NAN),
            TokenKind::Infinity => Literal::Float64(f64::INFINITY),
            kind => parse_number(kind, &token.lexeme)
                .map_err(|e| ParseError::new(ParseErrorKind::InvalidNumber(e), token.span))?,
        };
        Ok(Node::new(NodeKind::Literal(literal), token.span))
    }

    fn name_or_call(&mut self) -> ParseResult<Node> {
        let callee = self.expect_ident()?;
        if self.check(TokenKind::LParen) {
            self.expect(TokenKind::LParen)?;
            let args = self.arg_list()?;
            let close = self.expect(TokenKind::RParen)?;
            let span = callee.span.to(close.span);
            return Ok(Node::new(NodeKind::Call { callee, args }, span));
        }
        let span = callee.span;
        Ok(Node::new(NodeKind::Name(callee), span))
    }

    fn arg_list(&mut self) -> ParseResult<Vec<Node>> {
        let mut args = Vec::new();
        while !self.check(TokenKind::RParen) && !self.is_eof() {
            args.push(self.expression()?);
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        Ok(args)
    }

    /// `if <test> <then> else <else>` and `when <test> <then> else <else>`
    fn conditional(&mut self, form: ConditionalForm) -> ParseResult<Node> {
        let start = self.advance().span;
        let test = self.expression()?;
        let then_branch = self.expression()?;
        if !self.check(TokenKind::Else) {
            return Err(self
                .unexpected(ExpectedToken::Token(TokenKind::Else))
                .with_hint(format!("{} <test> <then> else <else>", form.keyword())));
        }
        self.advance();
        let else_branch = self.expression()?;
        let span = start.to(else_branch.span);
        Ok(Node::new(
            NodeKind::Conditional {
                form,
                test: Box::new(test),
                then_branch: Box::new(then_branch),
                else_branch: Box::new(else_branch),
            },
            span,
        ))
    }
}

/// Whether an integer lexeme is the magnitude of `i64::MIN`
fn is_min_magnitude(lexeme: &str) -> bool {
    let digits: String = lexeme.chars().filter(|&c| c != '_').collect();
    digits.parse::<u64>() == Ok(i64::MIN.unsigned_abs())
}

/// Parse the lexeme of a numeric token into a typed literal
fn parse_number(kind: TokenKind, lexeme: &str) -> Result<Literal, String> {
    let digits: String = lexeme.chars().filter(|&c| c != '_').collect();
    match kind {
        TokenKind::Int => digits
            .parse::<i64>()
            .map(Literal::Signed)
            .map_err(|_| format!("{lexeme} does not fit in a signed 64-bit integer")),
        TokenKind::UnsignedInt => digits[..digits.len() - 1]
            .parse::<u64>()
            .map(Literal::Unsigned)
            .map_err(|_| format!("{lexeme} does not fit in an unsigned 64-bit integer")),
        TokenKind::Float => {
            let (body, suffix) = match digits.chars().last() {
                Some(c @ ('f' | 'F' | 'h' | 'H' | 'd' | 'D')) => {
                    (&digits[..digits.len() - 1], Some(c.to_ascii_lowercase()))
                }
                _ => (digits.as_str(), None),
            };
            let literal = match suffix {
                Some('f') => body.parse::<f32>().map(Literal::Float32),
                // Straight from the wide value, so the decimal is rounded once
                Some('h') => body
                    .parse::<f64>()
                    .map(|value| Literal::Float16(round_f64_to_half(value))),
                _ => body.parse::<f64>().map(Literal::Float64),
            };
            literal.map_err(|_| format!("{lexeme} is not a valid float"))
        }
        other => Err(format!("{other} is not a number")),
    }
}
