//! Conditional expressions
//!
//! Both forms lower to four blocks: test, then, else and join. Arm results
//! meet in a stack slot that each arm stores into and join loads from.
//!
//! `if` allocates the slot before branching, sized for any value, and
//! parks the raw test value in it. `when` knows nothing about the slot until
//! both arms are lowered; it then sizes the slot from the arms' type and
//! inserts the stores in front of each arm's closing jump.

use cranelift_codegen::ir::{InstBuilder, StackSlot};

use crate::ast::{ConditionalForm, Node};
use crate::emit::Emitter;
use crate::types::TaggedValue;

use super::{CodeGenerator, CodegenError, CodegenErrorKind, CodegenResult};

/// Size of the `if` form's slot: large enough for any native value
const EAGER_SLOT_BYTES: u32 = 8;

impl CodeGenerator<'_> {
    pub(super) fn lower_conditional(
        &self,
        em: &mut Emitter<'_>,
        form: ConditionalForm,
        test: &Node,
        then_branch: &Node,
        else_branch: &Node,
    ) -> CodegenResult<TaggedValue> {
        let test_block = em.create_block();
        let then_block = em.create_block();
        let else_block = em.create_block();
        let join_block = em.create_block();

        em.cursor().ins().jump(test_block, &[]);
        em.switch_to_block(test_block);
        let test_value = self.lower(em, test)?;

        let eager_slot = match form {
            ConditionalForm::If => {
                let slot = em.create_slot(EAGER_SLOT_BYTES);
                em.store(test_value.value, slot);
                Some(slot)
            }
            ConditionalForm::When => None,
        };

        let condition = self.boolify(em, test_value, test.span)?;
        em.cursor()
            .ins()
            .brif(condition.value, then_block, &[], else_block, &[]);

        em.switch_to_block(then_block);
        let then_value = self.lower_arm(em, then_branch, eager_slot)?;
        let then_exit = em.cursor().ins().jump(join_block, &[]);

        em.switch_to_block(else_block);
        let else_value = self.lower_arm(em, else_branch, eager_slot)?;
        let else_exit = em.cursor().ins().jump(join_block, &[]);

        if then_value.ty != else_value.ty {
            return Err(CodegenError::new(
                CodegenErrorKind::BranchMismatch {
                    then_ty: self.types.get(then_value.ty),
                    else_ty: self.types.get(else_value.ty),
                },
                then_branch.span,
            ));
        }
        let result_ty = self.types.get(then_value.ty);

        let slot = match eager_slot {
            Some(slot) => slot,
            None => {
                let slot = em.create_slot(result_ty.byte_size());
                em.insert_before(then_exit);
                em.store(then_value.value, slot);
                em.insert_before(else_exit);
                em.store(else_value.value, slot);
                slot
            }
        };

        em.switch_to_block(join_block);
        let merged = em.load(result_ty.clif_type(), slot);
        Ok(TaggedValue::new(merged, then_value.ty))
    }

    /// Lower one arm, storing its value right away when the slot exists
    fn lower_arm(
        &self,
        em: &mut Emitter<'_>,
        arm: &Node,
        slot: Option<StackSlot>,
    ) -> CodegenResult<TaggedValue> {
        let value = self.lower(em, arm)?;
        if let Some(slot) = slot {
            em.store(value.value, slot);
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use crate::codegen::CodeGenerator;
    use crate::module::TranslationModule;
    use crate::parser::Parser;
    use crate::types::TypeInterner;
    use cranelift_codegen::ir::{InstructionData, Opcode};
    use cranelift_codegen::isa::CallConv;

    fn opcode_count(source: &str, opcode: Opcode) -> usize {
        let types = TypeInterner::new();
        let module = TranslationModule::new(CallConv::SystemV);
        let fragment = Parser::parse_fragment(source).unwrap();
        let def = CodeGenerator::new(&module, &types)
            .lower_function("entry", fragment.statements(), true)
            .unwrap();
        let func = def.ir();
        func.layout
            .blocks()
            .flat_map(|block| func.layout.block_insts(block))
            .filter(|&inst| func.dfg.insts[inst].opcode() == opcode)
            .count()
    }

    #[test]
    fn if_form_also_stores_the_test_value() {
        // test value + two arms + the function's return slot
        assert_eq!(opcode_count("if 2 1 else 0", Opcode::StackStore), 4);
    }

    #[test]
    fn when_form_stores_only_arm_values() {
        assert_eq!(opcode_count("when 2 1 else 0", Opcode::StackStore), 3);
    }

    #[test]
    fn arms_jump_to_the_join_block() {
        // entry->body, body->test, two arms->join, join->exit
        assert_eq!(opcode_count("when 2 1 else 0", Opcode::Jump), 5);
        assert_eq!(opcode_count("when 2 1 else 0", Opcode::Brif), 1);
    }

    #[test]
    fn when_stores_precede_each_arm_jump() {
        let types = TypeInterner::new();
        let module = TranslationModule::new(CallConv::SystemV);
        let fragment = Parser::parse_fragment("when 0 1 else 2").unwrap();
        let def = CodeGenerator::new(&module, &types)
            .lower_function("entry", fragment.statements(), true)
            .unwrap();
        let func = def.ir();
        for block in func.layout.blocks() {
            let insts: Vec<_> = func.layout.block_insts(block).collect();
            let Some((&last, rest)) = insts.split_last() else {
                continue;
            };
            let is_arm = matches!(func.dfg.insts[last], InstructionData::Jump { .. })
                && rest.len() == 2;
            if is_arm {
                assert_eq!(func.dfg.insts[rest[1]].opcode(), Opcode::StackStore);
            }
        }
    }
}
