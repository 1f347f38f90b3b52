//! Expression nodes

use crate::lexer::Span;

use super::{Ident, Spanned};

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    // Arithmetic
    /// Addition (+)
    Add,
    /// Subtraction (-)
    Sub,
    /// Multiplication (*)
    Mul,
    /// Division (/)
    Div,

    // Bitwise
    /// Bitwise and (&)
    BitAnd,
    /// Bitwise or (|)
    BitOr,
    /// Bitwise exclusive or (^)
    BitXor,
    /// Shift left (<<)
    Shl,
    /// Shift right (>>); arithmetic for signed operands, logical otherwise
    Shr,

    // Comparison
    /// Equal (==)
    Eq,
    /// Not equal (!=)
    Ne,
    /// Greater than (>)
    Gt,
    /// Less than (<)
    Lt,
    /// Greater than or equal (>=)
    Ge,
    /// Less than or equal (<=)
    Le,
}

impl BinaryOp {
    /// Returns the precedence of the operator (higher = binds tighter)
    #[must_use]
    pub const fn precedence(self) -> u8 {
        match self {
            BinaryOp::Eq
            | BinaryOp::Ne
            | BinaryOp::Gt
            | BinaryOp::Lt
            | BinaryOp::Ge
            | BinaryOp::Le => 1,
            BinaryOp::BitOr => 2,
            BinaryOp::BitXor => 3,
            BinaryOp::BitAnd => 4,
            BinaryOp::Shl | BinaryOp::Shr => 5,
            BinaryOp::Add | BinaryOp::Sub => 6,
            BinaryOp::Mul | BinaryOp::Div => 7,
        }
    }

    /// Returns true for the six comparison operators
    #[must_use]
    pub const fn is_comparison(self) -> bool {
        self.precedence() == 1
    }

    /// Returns the symbol representation of the operator
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Gt => ">",
            BinaryOp::Lt => "<",
            BinaryOp::Ge => ">=",
            BinaryOp::Le => "<=",
        }
    }
}

impl std::fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unary operators written in source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// Negation (-)
    Neg,
}

impl UnaryOp {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
        }
    }
}

/// A literal value; the variant is fixed by the literal's lexical form
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Literal {
    Signed(i64),
    Unsigned(u64),
    Boolean(bool),
    /// Already rounded to half precision
    Float16(f32),
    Float32(f32),
    Float64(f64),
}

/// The two surface forms of a conditional expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionalForm {
    /// `if <test> <then> else <else>`
    If,
    /// `when <test> <then> else <else>`
    When,
}

impl ConditionalForm {
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            ConditionalForm::If => "if",
            ConditionalForm::When => "when",
        }
    }
}

/// A zero-argument function definition
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: Ident,
    /// Always empty for now; kept so arity checks have something to compare
    pub params: Vec<Ident>,
    /// Non-empty; the last statement's value is the return value
    pub body: Vec<Node>,
}

/// An AST node with its source location
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
}

impl Node {
    #[must_use]
    pub fn new(kind: NodeKind, span: Span) -> Self {
        Self { kind, span }
    }
}

impl Spanned for Node {
    fn span(&self) -> Span {
        self.span
    }
}

/// The different kinds of nodes
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Literal(Literal),

    /// A bare identifier outside of a call
    Name(Ident),

    Binary {
        op: BinaryOp,
        lhs: Box<Node>,
        rhs: Box<Node>,
    },

    Unary {
        op: UnaryOp,
        operand: Box<Node>,
    },

    Conditional {
        form: ConditionalForm,
        test: Box<Node>,
        then_branch: Box<Node>,
        else_branch: Box<Node>,
    },

    Function(FunctionDef),

    Call {
        callee: Ident,
        args: Vec<Node>,
    },
}
