//! Lowering from AST to Cranelift IR
//!
//! Lowering is a single bottom-up walk. There is no separate type-checking
//! pass: every node produces a [`TaggedValue`] and each operator checks its
//! operands' types as it is lowered.
//!
//! # Example
//!
//! ```
//! use aki_core::codegen::CodeGenerator;
//! use aki_core::module::TranslationModule;
//! use aki_core::parser::Parser;
//! use aki_core::types::TypeInterner;
//! use cranelift_codegen::isa::CallConv;
//!
//! let types = TypeInterner::new();
//! let module = TranslationModule::new(CallConv::SystemV);
//! let fragment = Parser::parse_fragment("2 + 2").unwrap();
//!
//! let generator = CodeGenerator::new(&module, &types);
//! let def = generator
//!     .lower_function("entry", fragment.statements(), true)
//!     .unwrap();
//! assert_eq!(def.return_ty(), types.i64());
//! ```

mod conditional;
mod draft;
mod error;

pub use draft::FunctionDraft;
pub use error::{CodegenError, CodegenErrorKind, CodegenResult};

use cranelift_codegen::ir::{types, InstBuilder};

use crate::ast::{self, BinaryOp, Literal, Node, NodeKind, UnaryOp};
use crate::emit::Emitter;
use crate::lexer::Span;
use crate::module::{FunctionDef, TranslationModule};
use crate::types::{TaggedValue, TypeInterner, UnaryOperator};

/// Lowers nodes against a read-only view of the module
///
/// Callees are resolved in `module`; newly lowered functions are returned
/// to the caller, which decides whether to commit them.
pub struct CodeGenerator<'a> {
    module: &'a TranslationModule,
    types: &'a TypeInterner,
}

impl<'a> CodeGenerator<'a> {
    #[must_use]
    pub fn new(module: &'a TranslationModule, types: &'a TypeInterner) -> Self {
        Self { module, types }
    }

    /// Lower a named, top-level function definition
    pub fn lower_named(&self, def: &ast::FunctionDef) -> CodegenResult<FunctionDef> {
        if self.module.contains(&def.name.name) {
            return Err(CodegenError::new(
                CodegenErrorKind::DuplicateFunction(def.name.name.clone()),
                def.name.span,
            )
            .with_hint("reset the session with '.' to redefine it"));
        }
        if let Some(param) = def.params.first() {
            return Err(CodegenError::new(
                CodegenErrorKind::ParametersUnsupported,
                param.span,
            ));
        }
        self.lower_function(&def.name.name, &def.body, false)
    }

    /// Lower `body` as the body of a zero-argument function called `name`
    ///
    /// The value of the last statement is returned; earlier results are
    /// discarded. An empty body returns `0` of the provisional type.
    pub fn lower_function<'n>(
        &self,
        name: &str,
        body: impl IntoIterator<Item = &'n Node>,
        anonymous: bool,
    ) -> CodegenResult<FunctionDef> {
        let mut draft = FunctionDraft::begin(name, anonymous, self.module.call_conv(), self.types);
        let mut result = None;
        for statement in body {
            result = Some(self.lower(draft.emitter(), statement)?);
        }
        let result = match result {
            Some(result) => result,
            None => {
                let zero = draft.emitter().cursor().ins().iconst(types::I64, 0);
                TaggedValue::new(zero, draft.provisional())
            }
        };
        Ok(draft.finish(result))
    }

    /// Lower one expression node at the emitter's current position
    pub fn lower(&self, em: &mut Emitter<'_>, node: &Node) -> CodegenResult<TaggedValue> {
        match &node.kind {
            NodeKind::Literal(literal) => Ok(self.lower_literal(em, *literal)),
            NodeKind::Name(ident) => Err(self.bare_name(ident)),
            NodeKind::Binary { op, lhs, rhs } => self.lower_binary(em, *op, lhs, rhs, node.span),
            NodeKind::Unary { op, operand } => self.lower_unary(em, *op, operand, node.span),
            NodeKind::Conditional {
                form,
                test,
                then_branch,
                else_branch,
            } => self.lower_conditional(em, *form, test, then_branch, else_branch),
            NodeKind::Function(def) => Err(CodegenError::new(
                CodegenErrorKind::MisplacedFunction,
                def.name.span,
            )),
            NodeKind::Call { callee, args } => self.lower_call(em, callee, args, node.span),
        }
    }

    fn lower_literal(&self, em: &mut Emitter<'_>, literal: Literal) -> TaggedValue {
        let mut pos = em.cursor();
        let ins = pos.ins();
        match literal {
            Literal::Signed(v) => TaggedValue::new(ins.iconst(types::I64, v), self.types.i64()),
            #[allow(clippy::cast_possible_wrap)]
            Literal::Unsigned(v) => {
                TaggedValue::new(ins.iconst(types::I64, v as i64), self.types.u64())
            }
            Literal::Boolean(v) => {
                TaggedValue::new(ins.iconst(types::I8, i64::from(v)), self.types.boolean())
            }
            Literal::Float16(v) => TaggedValue::new(ins.f32const(v), self.types.f16()),
            Literal::Float32(v) => TaggedValue::new(ins.f32const(v), self.types.f32()),
            Literal::Float64(v) => TaggedValue::new(ins.f64const(v), self.types.f64()),
        }
    }

    fn lower_binary(
        &self,
        em: &mut Emitter<'_>,
        op: BinaryOp,
        lhs: &Node,
        rhs: &Node,
        span: Span,
    ) -> CodegenResult<TaggedValue> {
        let lhs = self.lower(em, lhs)?;
        let rhs = self.lower(em, rhs)?;
        if lhs.ty != rhs.ty {
            return Err(CodegenError::new(
                CodegenErrorKind::IncompatibleOperands {
                    op,
                    lhs: self.types.get(lhs.ty),
                    rhs: self.types.get(rhs.ty),
                },
                span,
            ));
        }
        let implementation = self
            .types
            .get(lhs.ty)
            .binary_op(op)
            .map_err(|e| CodegenError::new(e.into(), span))?;
        Ok(implementation.apply(em, lhs, rhs))
    }

    fn lower_unary(
        &self,
        em: &mut Emitter<'_>,
        op: UnaryOp,
        operand: &Node,
        span: Span,
    ) -> CodegenResult<TaggedValue> {
        let operand = self.lower(em, operand)?;
        let op = match op {
            UnaryOp::Neg => UnaryOperator::Negate,
        };
        let implementation = self
            .types
            .get(operand.ty)
            .unary_op(op)
            .map_err(|e| CodegenError::new(e.into(), span))?;
        Ok(implementation.apply(em, operand))
    }

    fn lower_call(
        &self,
        em: &mut Emitter<'_>,
        callee: &ast::Ident,
        args: &[Node],
        span: Span,
    ) -> CodegenResult<TaggedValue> {
        let Some((index, def)) = self.module.lookup(&callee.name) else {
            return Err(CodegenError::new(
                CodegenErrorKind::UndefinedFunction(callee.name.clone()),
                callee.span,
            ));
        };
        if args.len() != def.arity() {
            return Err(CodegenError::new(
                CodegenErrorKind::ArityMismatch {
                    name: callee.name.clone(),
                    expected: def.arity(),
                    found: args.len(),
                },
                span,
            ));
        }

        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.lower(em, arg)?.value);
        }
        let func_ref = em.import_function(index.external_index(), def.signature().clone());
        let Some(value) = em.call(func_ref, &values) else {
            unreachable!("every lowered function returns a value")
        };
        Ok(TaggedValue::new(value, def.return_ty()))
    }

    fn bare_name(&self, ident: &ast::Ident) -> CodegenError {
        let error = CodegenError::new(
            CodegenErrorKind::UndefinedName(ident.name.clone()),
            ident.span,
        );
        if self.module.contains(&ident.name) {
            error.with_hint(format!("'{0}' is a function; call it as {0}()", ident.name))
        } else {
            error
        }
    }

    /// Coerce a conditional test to a Boolean
    fn boolify(
        &self,
        em: &mut Emitter<'_>,
        value: TaggedValue,
        span: Span,
    ) -> CodegenResult<TaggedValue> {
        let implementation = self
            .types
            .get(value.ty)
            .unary_op(UnaryOperator::Boolify)
            .map_err(|e| CodegenError::new(e.into(), span))?;
        Ok(implementation.apply(em, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;
    use crate::parser::Parser;
    use cranelift_codegen::isa::CallConv;
    use cranelift_codegen::settings;

    fn lower_in(module: &TranslationModule, types: &TypeInterner, source: &str) -> CodegenResult<FunctionDef> {
        let fragment = Parser::parse_fragment(source).expect("source should parse");
        CodeGenerator::new(module, types).lower_function("entry", fragment.statements(), true)
    }

    fn lower(source: &str) -> (TypeInterner, CodegenResult<FunctionDef>) {
        let types = TypeInterner::new();
        let module = TranslationModule::new(CallConv::SystemV);
        let result = lower_in(&module, &types, source);
        (types, result)
    }

    fn assert_verifies(def: &FunctionDef) {
        let flags = settings::Flags::new(settings::builder());
        if let Err(errors) = cranelift_codegen::verify_function(def.ir(), &flags) {
            panic!("{}\n{}", errors, def.ir().display());
        }
    }

    #[test]
    fn literal_types_come_from_the_literal() {
        let cases = [
            ("2", "i64"),
            ("2_U", "u64"),
            ("True", "bool"),
            ("1.5_H", "f16"),
            ("1.5_F", "f32"),
            ("1.5", "f64"),
            ("NaN", "f64"),
        ];
        for (source, expected) in cases {
            let (types, result) = lower(source);
            let def = result.unwrap();
            assert_eq!(types.name(def.return_ty()), expected, "{source}");
            assert_verifies(&def);
        }
    }

    #[test]
    fn operators_produce_valid_ir() {
        for source in [
            "1 + 2 * 3 - 4 / 5",
            "7_U / 2_U",
            "True + True",
            "True & False",
            "2 << 2 >> 1",
            "-8 >> 1",
            "1.5_F * 2.0_F",
            "2 < 3",
            "1.0 >= NaN",
            "-(4)",
            "-1.5_H",
        ] {
            let (_, result) = lower(source);
            assert_verifies(&result.unwrap());
        }
    }

    #[test]
    fn conditionals_produce_valid_ir() {
        for source in [
            "if 2 == 2 1 else 0",
            "when 32 1 else 0",
            "when 1.5 True else False",
            "if when 1 0 else 1 2.0 else if 0 3.0 else 4.0",
            "if 1 2_U else 3_U",
        ] {
            let (_, result) = lower(source);
            assert_verifies(&result.unwrap());
        }
    }

    #[test]
    fn comparison_result_is_boolean() {
        let (types, result) = lower("2 == 2");
        assert_eq!(result.unwrap().return_ty(), types.boolean());
    }

    #[test]
    fn boolean_arithmetic_widens() {
        let (types, result) = lower("True + True");
        assert_eq!(result.unwrap().return_ty(), types.i64());
    }

    #[test]
    fn mismatched_operands_are_type_errors() {
        for op in ["==", "!=", ">", "<", ">=", "<="] {
            let source = format!("2 {op} True");
            let (_, result) = lower(&source);
            let err = result.unwrap_err();
            assert_eq!(err.category(), ErrorCategory::Type, "{source}");
            assert!(matches!(
                err.kind,
                CodegenErrorKind::IncompatibleOperands { .. }
            ));
            assert_eq!(err.span, Span::new(0, source.len() as u32));
        }
    }

    #[test]
    fn unsupported_operator_reports_type_and_position() {
        let (_, result) = lower("1 + -2_U");
        let err = result.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Type);
        assert_eq!(err.span, Span::new(4, 8));
        assert_eq!(err.kind.to_string(), "operator '-' is not supported for u64");
    }

    #[test]
    fn branch_types_must_match() {
        let (_, result) = lower("if 2==2 1 else False");
        let err = result.unwrap_err();
        assert!(matches!(err.kind, CodegenErrorKind::BranchMismatch { .. }));
        assert_eq!(err.span, Span::new(8, 9));
        assert!(err.kind.to_string().starts_with("then/else expressions must yield same type"));
    }

    #[test]
    fn undefined_function_is_a_name_error() {
        let (_, result) = lower("1 + nope()");
        let err = result.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Name);
        assert_eq!(err.span, Span::new(4, 8));
    }

    #[test]
    fn calls_resolve_against_the_module() {
        let types = TypeInterner::new();
        let mut module = TranslationModule::new(CallConv::SystemV);
        let fragment = Parser::parse_fragment("def half() { 0.5 }").unwrap();
        let def = fragment.functions().next().unwrap();
        let half = CodeGenerator::new(&module, &types).lower_named(def).unwrap();
        module.commit(half);

        let call = lower_in(&module, &types, "half() * 2.0").unwrap();
        assert_eq!(call.return_ty(), types.f64());
        assert_verifies(&call);

        let err = lower_in(&module, &types, "half(1)").unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Arity);

        let err = lower_in(&module, &types, "half").unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Name);
        assert_eq!(err.hint.as_deref(), Some("'half' is a function; call it as half()"));

        let err = CodeGenerator::new(&module, &types).lower_named(def).unwrap_err();
        assert_eq!(err.kind, CodegenErrorKind::DuplicateFunction("half".into()));
    }

    #[test]
    fn body_returns_last_statement() {
        let (types, result) = lower("1; 2.0; True");
        let def = result.unwrap();
        assert_eq!(def.return_ty(), types.boolean());
        assert_verifies(&def);
    }

    #[test]
    fn empty_body_returns_provisional_type() {
        let types = TypeInterner::new();
        let module = TranslationModule::new(CallConv::SystemV);
        let def = CodeGenerator::new(&module, &types)
            .lower_function("empty", std::iter::empty(), true)
            .unwrap();
        assert_eq!(def.return_ty(), types.i64());
        assert_verifies(&def);
    }
}
