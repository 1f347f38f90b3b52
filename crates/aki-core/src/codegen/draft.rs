//! Two-phase function construction
//!
//! A draft lowers the body first. Only when the body's result is known does
//! [`FunctionDraft::finish`] create the return slot, wire entry and exit,
//! and fix the signature, so a published [`FunctionDef`] is never patched.

use cranelift_codegen::ir::{Block, InstBuilder};
use cranelift_codegen::isa::CallConv;

use crate::emit::Emitter;
use crate::module::FunctionDef;
use crate::types::{TaggedValue, Ty, TypeInterner};

pub struct FunctionDraft<'t> {
    em: Emitter<'t>,
    name: String,
    anonymous: bool,
    entry: Block,
    body: Block,
    exit: Block,
    provisional: Ty,
}

impl<'t> FunctionDraft<'t> {
    /// Create entry, body and exit blocks and position at the body
    pub fn begin(
        name: &str,
        anonymous: bool,
        call_conv: CallConv,
        types: &'t TypeInterner,
    ) -> Self {
        let mut em = Emitter::new(name, call_conv, types);
        let entry = em.create_block();
        let body = em.create_block();
        let exit = em.create_block();
        em.switch_to_block(body);
        Self {
            em,
            name: name.to_string(),
            anonymous,
            entry,
            body,
            exit,
            provisional: types.i64(),
        }
    }

    pub fn emitter(&mut self) -> &mut Emitter<'t> {
        &mut self.em
    }

    /// Return type assumed until the body has been lowered
    pub fn provisional(&self) -> Ty {
        self.provisional
    }

    /// Close the body with `result` and produce the finished function
    pub fn finish(mut self, result: TaggedValue) -> FunctionDef {
        let types = self.em.types();
        let return_ty = result.ty;
        let sem = types.get(return_ty);
        let clif = sem.clif_type();
        let body_exit = self.em.position();

        self.em.switch_to_block(self.entry);
        let slot = self.em.create_slot(sem.byte_size());
        self.em.cursor().ins().jump(self.body, &[]);

        self.em.set_position(body_exit);
        self.em.store(result.value, slot);
        self.em.cursor().ins().jump(self.exit, &[]);

        self.em.switch_to_block(self.exit);
        let value = self.em.load(clif, slot);
        self.em.cursor().ins().return_(&[value]);
        self.em.set_return_type(clif);

        if return_ty != self.provisional {
            tracing::debug!(
                function = %self.name,
                provisional = %types.get(self.provisional),
                return_ty = %sem,
                "finalized return type"
            );
        } else {
            tracing::debug!(function = %self.name, return_ty = %sem, "lowered function");
        }

        FunctionDef::new(
            self.name,
            return_ty,
            sem.native_repr(),
            self.anonymous,
            self.em.finish(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cranelift_codegen::ir::types;
    use cranelift_codegen::settings;

    fn verify(def: &FunctionDef) {
        let flags = settings::Flags::new(settings::builder());
        if let Err(errors) = cranelift_codegen::verify_function(def.ir(), &flags) {
            panic!("{}", errors);
        }
    }

    #[test]
    fn return_type_follows_the_body() {
        let interner = TypeInterner::new();
        let mut draft = FunctionDraft::begin("f", false, CallConv::SystemV, &interner);
        assert_eq!(draft.provisional(), interner.i64());
        let value = draft.emitter().cursor().ins().f64const(2.5);
        let def = draft.finish(TaggedValue::new(value, interner.f64()));

        assert_eq!(def.return_ty(), interner.f64());
        assert_eq!(def.signature().returns.len(), 1);
        assert_eq!(def.signature().returns[0].value_type, types::F64);
        assert_eq!(def.arity(), 0);
        verify(&def);
    }

    #[test]
    fn entry_block_comes_first() {
        let interner = TypeInterner::new();
        let mut draft = FunctionDraft::begin("g", true, CallConv::SystemV, &interner);
        let value = draft.emitter().cursor().ins().iconst(types::I8, 1);
        let def = draft.finish(TaggedValue::new(value, interner.boolean()));

        assert!(def.is_anonymous());
        let entry = def.ir().layout.entry_block();
        assert!(entry.is_some());
        assert_eq!(def.ir().layout.blocks().count(), 3);
        verify(&def);
    }
}
