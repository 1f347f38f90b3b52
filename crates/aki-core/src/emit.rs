//! Instruction emission over a Cranelift function
//!
//! The emitter keeps an explicit insertion position instead of a "current
//! block that fills up". Code can be appended to any block at any time and
//! inserted before an existing instruction, which lets a conditional store
//! into a slot created after its branches were lowered, and lets a function
//! learn its return type only after the body is done.

use std::collections::HashMap;

use cranelift_codegen::cursor::{Cursor, CursorPosition, FuncCursor};
use cranelift_codegen::ir::{
    self, Block, ExtFuncData, ExternalName, FuncRef, Inst, InstBuilder, Signature, StackSlot,
    StackSlotData, StackSlotKind, Type, UserExternalName, UserFuncName, Value,
};
use cranelift_codegen::isa::CallConv;

use crate::runtime::RuntimeHelper;
use crate::types::TypeInterner;

/// Builds the body of one IR function
pub struct Emitter<'t> {
    func: ir::Function,
    position: CursorPosition,
    types: &'t TypeInterner,
    /// Imported callees keyed by external-name index
    imports: HashMap<u32, FuncRef>,
}

impl<'t> Emitter<'t> {
    /// Start an empty function with no parameters and no results yet
    pub fn new(name: &str, call_conv: CallConv, types: &'t TypeInterner) -> Self {
        Self {
            func: ir::Function::with_name_signature(
                UserFuncName::testcase(name),
                Signature::new(call_conv),
            ),
            position: CursorPosition::Nowhere,
            types,
            imports: HashMap::new(),
        }
    }

    pub fn types(&self) -> &'t TypeInterner {
        self.types
    }

    /// Create a block at the end of the layout
    pub fn create_block(&mut self) -> Block {
        let block = self.func.dfg.make_block();
        self.func.layout.append_block(block);
        block
    }

    /// Continue appending to the end of `block`
    pub fn switch_to_block(&mut self, block: Block) {
        self.position = CursorPosition::After(block);
    }

    /// Insert subsequent instructions immediately before `inst`
    pub fn insert_before(&mut self, inst: Inst) {
        self.position = CursorPosition::At(inst);
    }

    pub fn position(&self) -> CursorPosition {
        self.position
    }

    pub fn set_position(&mut self, position: CursorPosition) {
        self.position = position;
    }

    /// A cursor at the current position
    ///
    /// Instructions built through `cursor().ins()` are placed before the
    /// position's instruction or at the end of its block.
    pub fn cursor(&mut self) -> FuncCursor<'_> {
        FuncCursor::new(&mut self.func).at_position(self.position)
    }

    pub fn value_type(&self, value: Value) -> Type {
        self.func.dfg.value_type(value)
    }

    /// Allocate a stack slot of `size` bytes, aligned to its own size
    pub fn create_slot(&mut self, size: u32) -> StackSlot {
        let align_shift = size.max(1).next_power_of_two().trailing_zeros();
        #[allow(clippy::cast_possible_truncation)]
        let data = StackSlotData::new(StackSlotKind::ExplicitSlot, size, align_shift as u8);
        self.func.create_sized_stack_slot(data)
    }

    pub fn store(&mut self, value: Value, slot: StackSlot) -> Inst {
        self.cursor().ins().stack_store(value, slot, 0)
    }

    pub fn load(&mut self, ty: Type, slot: StackSlot) -> Value {
        self.cursor().ins().stack_load(ty, slot, 0)
    }

    /// Import the function with external index `index`, once per function
    pub fn import_function(&mut self, index: u32, signature: Signature) -> FuncRef {
        if let Some(&func_ref) = self.imports.get(&index) {
            return func_ref;
        }
        let signature = self.func.import_signature(signature);
        let name = self
            .func
            .declare_imported_user_function(UserExternalName::new(0, index));
        let func_ref = self.func.import_function(ExtFuncData {
            name: ExternalName::user(name),
            signature,
            colocated: false,
        });
        self.imports.insert(index, func_ref);
        func_ref
    }

    /// Emit a call and return its first result, if it has one
    pub fn call(&mut self, callee: FuncRef, args: &[Value]) -> Option<Value> {
        let inst = self.cursor().ins().call(callee, args);
        self.func.dfg.inst_results(inst).first().copied()
    }

    pub fn call_runtime(&mut self, helper: RuntimeHelper, args: &[Value]) -> Option<Value> {
        let signature = helper.signature(self.func.signature.call_conv);
        let callee = self.import_function(helper.index(), signature);
        self.call(callee, args)
    }

    pub fn set_return_type(&mut self, ty: Type) {
        self.func.signature.returns = vec![ir::AbiParam::new(ty)];
    }

    pub fn finish(self) -> ir::Function {
        self.func
    }
}
