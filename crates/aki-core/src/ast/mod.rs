//! Abstract syntax tree for Aki fragments
//!
//! Nodes are produced by the parser and consumed read-only by the code
//! generator. Every node carries the [`Span`] it was parsed from so that
//! lowering errors can point back at the source.

mod expr;

pub use expr::*;

pub use crate::lexer::Span;

/// A trait for AST nodes that have associated source location information
pub trait Spanned {
    /// Returns the source span of this node
    fn span(&self) -> Span;
}

/// An identifier with its source location
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    #[must_use]
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

impl Spanned for Ident {
    fn span(&self) -> Span {
        self.span
    }
}

/// The top-level nodes of one REPL submission or file
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Fragment {
    pub nodes: Vec<Node>,
}

impl Fragment {
    #[must_use]
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// Named function definitions, in source order
    pub fn functions(&self) -> impl Iterator<Item = &FunctionDef> {
        self.nodes.iter().filter_map(|node| match &node.kind {
            NodeKind::Function(def) => Some(def),
            _ => None,
        })
    }

    /// Everything that is not a function definition, in source order
    pub fn statements(&self) -> impl Iterator<Item = &Node> {
        self.nodes
            .iter()
            .filter(|node| !matches!(node.kind, NodeKind::Function(_)))
    }
}
