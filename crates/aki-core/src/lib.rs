//! Aki Core - language engine for the Aki interactive language
//!
//! This crate provides the core functionality:
//! - Lexer and parser: source text to AST
//! - Types: the semantic type set and per-type operator tables
//! - Codegen: single-pass lowering of the AST to Cranelift IR
//! - JIT: verification, loading and execution of translation modules
//! - Session: one interactive session's functions
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use aki_core::{JitEngine, NativeValue, Session, TypeInterner};
//!
//! let mut engine = JitEngine::new().unwrap();
//! let mut session = Session::for_engine(Rc::new(TypeInterner::new()), &engine);
//!
//! session.eval(&mut engine, "def four() { 2 + 2 }").unwrap();
//! let value = session.eval(&mut engine, "four() * 2").unwrap();
//! assert_eq!(value, Some(NativeValue::Signed(8)));
//! ```

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Lexer module - tokenization of Aki source
pub mod lexer;

/// Abstract Syntax Tree - parsed representation of Aki source
pub mod ast;

/// Parser module - converts tokens into AST
pub mod parser;

/// Semantic types and operator tables
pub mod types;

/// Cursor-based IR emission
pub mod emit;

/// Native helpers linked into generated code
pub mod runtime;

/// Translation modules and finished functions
pub mod module;

/// AST to IR lowering
pub mod codegen;

/// JIT execution module (Cranelift-based)
/// Calling generated code requires unsafe code for function pointers
#[allow(unsafe_code, clippy::missing_safety_doc)]
pub mod jit;

/// Top-level error type and diagnostics
pub mod error;

/// Interactive sessions
pub mod session;

/// Built-in conformance suite and demo commands
pub mod suite;

/// Test utilities - helpers for testing Aki code
pub mod testutil;

pub use codegen::{CodeGenerator, CodegenError, CodegenErrorKind};
pub use error::{AkiError, ErrorCategory};
pub use jit::{JitEngine, JitError, NativeValue};
pub use lexer::Lexer;
pub use module::TranslationModule;
pub use parser::Parser;
pub use session::Session;
pub use types::{Ty, TypeInterner};
