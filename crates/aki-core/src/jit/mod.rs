//! JIT execution of translation modules
//!
//! Every execution cycle materializes the session's whole translation
//! module into a fresh [`JITModule`]:
//!
//! ```text
//! TranslationModule → verify → JITModule (helpers, then functions) → call entry → free
//! ```
//!
//! Runtime helpers are declared first, so a function's [`FuncId`] equals the
//! external-name index its callers were lowered against. Named functions
//! survive across cycles because they are part of every materialized module.

mod value;

pub use value::NativeValue;

use std::collections::HashMap;

use cranelift_codegen::ir::UserFuncName;
use cranelift_codegen::isa::{CallConv, OwnedTargetIsa};
use cranelift_codegen::print_errors::pretty_verifier_error;
use cranelift_codegen::settings::{self, Configurable};
use cranelift_jit::{JITBuilder, JITModule};
use cranelift_module::{FuncId, Linkage, Module};
use thiserror::Error;

use crate::module::TranslationModule;
use crate::runtime::{self, RuntimeFault, RuntimeHelper, USER_FUNCTION_BASE};
use crate::types::NativeRepr;

/// Errors that can occur while loading or running a module
#[derive(Debug, Error)]
pub enum JitError {
    /// The module failed IR verification
    #[error("verification of '{function}' failed")]
    Verification {
        function: String,
        report: String,
        module: String,
    },

    /// Cranelift rejected the module while compiling it
    #[error("Cranelift compilation error: {0}")]
    Cranelift(String),

    #[error("host machine is not supported: {0}")]
    UnsupportedHost(String),

    /// Native code raised a fault while running
    #[error("runtime error: {0}")]
    Runtime(#[from] RuntimeFault),

    #[error("entry point '{0}' is not loaded")]
    MissingEntryPoint(String),

    #[error("a module is already loaded")]
    ModuleResident,
}

/// Result type for JIT operations
pub type JitResult<T> = Result<T, JitError>;

fn cranelift_error(err: impl std::fmt::Display) -> JitError {
    JitError::Cranelift(err.to_string())
}

struct LoadedModule {
    module: JITModule,
    entries: HashMap<String, (FuncId, NativeRepr)>,
}

/// Compiles and runs translation modules on the host
///
/// Holds at most one loaded module at a time.
pub struct JitEngine {
    isa: OwnedTargetIsa,
    resident: Option<LoadedModule>,
}

impl JitEngine {
    /// Configure Cranelift for the host machine
    pub fn new() -> JitResult<Self> {
        let mut flag_builder = settings::builder();
        flag_builder
            .set("opt_level", "speed")
            .map_err(cranelift_error)?;
        flag_builder.set("is_pic", "false").map_err(cranelift_error)?;

        let isa_builder = cranelift_native::builder()
            .map_err(|msg| JitError::UnsupportedHost(msg.to_string()))?;
        let isa = isa_builder
            .finish(settings::Flags::new(flag_builder))
            .map_err(cranelift_error)?;

        tracing::debug!(triple = %isa.triple(), "initialized JIT engine");
        Ok(Self {
            isa,
            resident: None,
        })
    }

    /// Calling convention generated functions must use
    pub fn call_conv(&self) -> CallConv {
        self.isa.default_call_conv()
    }

    pub fn is_loaded(&self) -> bool {
        self.resident.is_some()
    }

    /// Check every function in `module` with the IR verifier
    pub fn verify(&self, module: &TranslationModule) -> JitResult<()> {
        for def in module.functions() {
            if let Err(errors) = cranelift_codegen::verify_function(def.ir(), &*self.isa) {
                return Err(JitError::Verification {
                    function: def.name().to_string(),
                    report: pretty_verifier_error(def.ir(), None, errors),
                    module: module.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Verify `module` and compile it into executable memory
    pub fn load(&mut self, module: &TranslationModule) -> JitResult<()> {
        if self.resident.is_some() {
            return Err(JitError::ModuleResident);
        }
        self.verify(module)?;
        tracing::trace!(module = %module, "loading module");

        let mut builder =
            JITBuilder::with_isa(self.isa.clone(), cranelift_module::default_libcall_names());
        for helper in RuntimeHelper::ALL {
            builder.symbol(helper.symbol(), helper.address());
        }
        let mut jit = JITModule::new(builder);

        match self.define_all(&mut jit, module) {
            Ok(entries) => {
                tracing::debug!(functions = module.len(), "loaded module");
                self.resident = Some(LoadedModule {
                    module: jit,
                    entries,
                });
                Ok(())
            }
            Err(err) => {
                // SAFETY: nothing from this module has been handed out
                unsafe { jit.free_memory() };
                Err(err)
            }
        }
    }

    fn define_all(
        &self,
        jit: &mut JITModule,
        module: &TranslationModule,
    ) -> JitResult<HashMap<String, (FuncId, NativeRepr)>> {
        let call_conv = self.call_conv();
        for helper in RuntimeHelper::ALL {
            let id = jit
                .declare_function(helper.symbol(), Linkage::Import, &helper.signature(call_conv))
                .map_err(cranelift_error)?;
            debug_assert_eq!(id.as_u32(), helper.index());
        }

        let mut ids = Vec::with_capacity(module.len());
        for def in module.functions() {
            let id = jit
                .declare_function(def.name(), Linkage::Local, def.signature())
                .map_err(cranelift_error)?;
            debug_assert_eq!(id.as_u32(), USER_FUNCTION_BASE + ids.len() as u32);
            ids.push(id);
        }

        let mut ctx = jit.make_context();
        let mut entries = HashMap::with_capacity(ids.len());
        for (def, &id) in module.functions().iter().zip(&ids) {
            ctx.func = def.ir().clone();
            ctx.func.name = UserFuncName::user(0, id.as_u32());
            jit.define_function(id, &mut ctx).map_err(cranelift_error)?;
            jit.clear_context(&mut ctx);
            entries.insert(def.name().to_string(), (id, def.return_repr()));
        }

        jit.finalize_definitions().map_err(cranelift_error)?;
        Ok(entries)
    }

    /// Run a zero-argument function of the loaded module
    pub fn call(&self, entry: &str) -> JitResult<NativeValue> {
        let loaded = self
            .resident
            .as_ref()
            .ok_or_else(|| JitError::MissingEntryPoint(entry.to_string()))?;
        let &(id, repr) = loaded
            .entries
            .get(entry)
            .ok_or_else(|| JitError::MissingEntryPoint(entry.to_string()))?;
        let code = loaded.module.get_finalized_function(id);

        runtime::clear_faults();
        // SAFETY: `code` was compiled from a zero-parameter function whose
        // single result has the native representation `repr`, and the module
        // owning it stays loaded for the duration of the call.
        let value = unsafe { NativeValue::call(code, repr) };
        if let Some(fault) = runtime::take_fault() {
            return Err(fault.into());
        }
        Ok(value)
    }

    /// Free the loaded module, if any
    pub fn unload(&mut self) {
        if let Some(loaded) = self.resident.take() {
            // SAFETY: function pointers from this module never outlive `call`
            unsafe { loaded.module.free_memory() };
            tracing::debug!(functions = loaded.entries.len(), "unloaded module");
        }
    }

    /// Load `module`, call `entry`, and unload again
    pub fn execute(&mut self, module: &TranslationModule, entry: &str) -> JitResult<NativeValue> {
        self.load(module)?;
        let result = self.call(entry);
        self.unload();
        result
    }
}

impl Drop for JitEngine {
    fn drop(&mut self) {
        self.unload();
    }
}

impl std::fmt::Debug for JitEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JitEngine")
            .field("triple", &self.isa.triple().to_string())
            .field("loaded", &self.is_loaded())
            .finish()
    }
}
