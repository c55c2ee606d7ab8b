//! # Basalt VM
//!
//! The engine's top-level operations: genesis initialization, module
//! publication, entry-function and script execution, and read-only
//! queries. Each operation runs against a caller-supplied storage
//! snapshot and returns a write set that the caller applies on success.
//!
//! The VM itself holds no chain state and is cheap to construct; every
//! call is independent, so concurrent callers simply use separate
//! capability objects.

use crate::backend::{BankApi, Querier, Storage};
use crate::errors::VmError;
use crate::gas::{costs, GasMeter};
use crate::interpreter::{CodeContext, Interpreter};
use crate::session::{ContractEvent, Session, SizeDelta, WriteSet};
use crate::validate::{validate_module, validate_script};
use basalt_types::{
    AccessPath, AccountAddress, CompiledModule, EntryFunction, ModuleBundle, ModuleId,
    ScriptMessage, TypeTag, Value,
};
use tracing::{debug, info, instrument, warn};

// =============================================================================
// CONFIG AND OUTPUT
// =============================================================================

/// Engine limits.
#[derive(Clone, Debug)]
pub struct VmConfig {
    /// Maximum encoded module size in bytes.
    pub max_module_size: usize,
    /// Maximum encoded script message size in bytes.
    pub max_script_size: usize,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            max_module_size: 64 * 1024,
            max_script_size: 16 * 1024,
        }
    }
}

/// The outcome of one successful engine operation.
#[derive(Debug)]
pub struct ExecutionOutput {
    /// The function's return value, when one was declared.
    pub return_value: Option<Value>,
    /// Events in emission order.
    pub events: Vec<ContractEvent>,
    /// Buffered mutations. The caller applies these; on error they are
    /// never produced, so failed calls leak no partial state.
    pub write_set: WriteSet,
    /// Per-account storage footprint changes.
    pub size_deltas: Vec<SizeDelta>,
    /// Gas consumed.
    pub gas_used: u64,
}

// =============================================================================
// VM
// =============================================================================

/// The Basalt contract execution engine.
#[derive(Debug, Default)]
pub struct BasaltVm {
    config: VmConfig,
}

impl BasaltVm {
    /// Creates a VM with default limits.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a VM with explicit limits.
    #[must_use]
    pub fn with_config(config: VmConfig) -> Self {
        Self { config }
    }

    /// Loads a genesis module bundle under the framework address.
    ///
    /// Runs unmetered: genesis is host-controlled and carries no gas
    /// budget.
    ///
    /// # Errors
    ///
    /// Validation failures, a module id collision, or a backend failure.
    #[instrument(skip_all, fields(modules = bundle.len()))]
    pub fn initialize<S: Storage>(
        &self,
        storage: &S,
        bundle: ModuleBundle,
    ) -> Result<ExecutionOutput, VmError> {
        let mut session = Session::new(storage, b"genesis", GasMeter::unmetered(), false);
        for module in bundle.iter() {
            self.stage_module(&mut session, AccountAddress::FRAMEWORK, module, None)?;
        }
        info!(modules = bundle.len(), "genesis bundle staged");
        Ok(finish(session, None))
    }

    /// Validates and stages one module under the sender's address.
    ///
    /// Gas is charged proportional to the encoded module size before any
    /// other work, so a zero budget always exhausts.
    ///
    /// # Errors
    ///
    /// Gas exhaustion, size/validation/decode failures, an id collision,
    /// or a backend failure.
    #[instrument(skip_all, fields(sender = %sender, bytes = module_bytes.len()))]
    pub fn publish_module<S: Storage>(
        &self,
        storage: &S,
        sender: AccountAddress,
        module_bytes: &[u8],
        gas_limit: u64,
    ) -> Result<ExecutionOutput, VmError> {
        let mut session = Session::new(storage, b"publish", GasMeter::new(gas_limit), false);
        session
            .meter_mut()
            .charge(costs::PUBLISH_BASE + module_bytes.len() as u64 * costs::PUBLISH_PER_BYTE)?;

        if module_bytes.len() > self.config.max_module_size {
            return Err(VmError::validation(format!(
                "module of {} bytes exceeds limit {}",
                module_bytes.len(),
                self.config.max_module_size
            )));
        }
        let module: CompiledModule = bincode::deserialize(module_bytes)
            .map_err(|e| VmError::decode(format!("module bytes: {e}")))?;

        self.stage_module(&mut session, sender, &module, Some(module_bytes))?;
        debug!(module = %module.name, "module staged");
        Ok(finish(session, None))
    }

    /// Executes an entry function of a published module.
    ///
    /// # Errors
    ///
    /// Any [`VmError`] raised during lookup, argument checking, or
    /// execution.
    #[instrument(skip_all, fields(module = %entry.module, function = %entry.function))]
    #[allow(clippy::too_many_arguments)]
    pub fn execute_entry<S: Storage>(
        &self,
        storage: &S,
        session_seed: &[u8],
        sender: AccountAddress,
        entry: &EntryFunction,
        bank: &dyn BankApi,
        querier: &dyn Querier,
        gas_limit: u64,
    ) -> Result<ExecutionOutput, VmError> {
        let mut session = Session::new(storage, session_seed, GasMeter::new(gas_limit), false);
        let return_value = run_entry(
            &mut session,
            entry,
            Some(sender),
            Some(bank),
            Some(querier),
        )?;
        Ok(finish(session, return_value))
    }

    /// Executes an unpublished script.
    ///
    /// # Errors
    ///
    /// Any [`VmError`] raised during validation or execution.
    #[instrument(skip_all, fields(sender = %sender))]
    #[allow(clippy::too_many_arguments)]
    pub fn execute_script<S: Storage>(
        &self,
        storage: &S,
        session_seed: &[u8],
        sender: AccountAddress,
        message: &ScriptMessage,
        bank: &dyn BankApi,
        querier: &dyn Querier,
        gas_limit: u64,
    ) -> Result<ExecutionOutput, VmError> {
        let mut session = Session::new(storage, session_seed, GasMeter::new(gas_limit), false);
        validate_script(&message.script)?;
        check_arguments("script", &message.script.params, &message.args)?;

        let interpreter = Interpreter::new(
            &mut session,
            CodeContext::Script,
            &message.script.code,
            &message.args,
            Some(sender),
            message.script.ret,
            Some(bank),
            Some(querier),
        );
        let return_value = interpreter.run()?;
        Ok(finish(session, return_value))
    }

    /// Runs an entry function read-only.
    ///
    /// The bank capability is deliberately not a parameter: a query
    /// session can never reach it, which makes the "queries do not
    /// transfer" rule a property of the API instead of a runtime check.
    /// Mutation opcodes fail with [`VmError::WriteInReadOnlyContext`] and
    /// no write set is produced.
    ///
    /// # Errors
    ///
    /// Any [`VmError`]; additionally the target must declare a return
    /// value.
    #[instrument(skip_all, fields(module = %entry.module, function = %entry.function))]
    pub fn query_entry<S: Storage>(
        &self,
        storage: &S,
        entry: &EntryFunction,
        querier: &dyn Querier,
        gas_limit: u64,
    ) -> Result<ExecutionOutput, VmError> {
        let mut session = Session::new(storage, b"query", GasMeter::new(gas_limit), true);
        let return_value = run_entry(&mut session, entry, None, None, Some(querier))?;
        if return_value.is_none() {
            return Err(VmError::validation(
                "query target must return exactly one value",
            ));
        }
        Ok(finish(session, return_value))
    }

    /// Validates a module and records its code write into the session.
    fn stage_module<S: Storage>(
        &self,
        session: &mut Session<'_, S>,
        owner: AccountAddress,
        module: &CompiledModule,
        encoded: Option<&[u8]>,
    ) -> Result<(), VmError> {
        validate_module(module).map_err(|e| {
            warn!(module = %module.name, error = %e, "module validation failed");
            e
        })?;

        let id = ModuleId::new(owner, module.name.clone());
        let path = AccessPath::code(owner, module.name.clone());
        if session.read(&path)?.is_some() {
            return Err(VmError::ModuleAlreadyExists(id));
        }
        let bytes = match encoded {
            Some(bytes) => bytes.to_vec(),
            None => bincode::serialize(module)
                .map_err(|e| VmError::Internal(format!("module encode: {e}")))?,
        };
        session.write(path, bytes)
    }
}

/// Resolves and runs an entry function inside an open session.
fn run_entry<S: Storage>(
    session: &mut Session<'_, S>,
    entry: &EntryFunction,
    sender: Option<AccountAddress>,
    bank: Option<&dyn BankApi>,
    querier: Option<&dyn Querier>,
) -> Result<Option<Value>, VmError> {
    let module = session.load_module(&entry.module)?;
    let function = module
        .function_def(&entry.function)
        .ok_or_else(|| VmError::FunctionNotFound {
            module: entry.module.clone(),
            function: entry.function.to_string(),
        })?;
    if !function.is_entry {
        return Err(VmError::NotAnEntryFunction {
            module: entry.module.clone(),
            function: entry.function.to_string(),
        });
    }
    check_arguments(function.name.as_str(), &function.params, &entry.args)?;

    let interpreter = Interpreter::new(
        session,
        CodeContext::Module {
            id: &entry.module,
            structs: &module.structs,
        },
        &function.code,
        &entry.args,
        sender,
        function.ret,
        bank,
        querier,
    );
    interpreter.run()
}

/// Checks argument count and types against a parameter list.
fn check_arguments(location: &str, params: &[TypeTag], args: &[Value]) -> Result<(), VmError> {
    if params.len() != args.len() {
        return Err(VmError::validation(format!(
            "{location}: expected {} arguments, got {}",
            params.len(),
            args.len()
        )));
    }
    for (param, arg) in params.iter().zip(args) {
        if !arg.matches(*param) {
            return Err(VmError::TypeMismatch {
                expected: *param,
                got: arg.type_tag(),
            });
        }
    }
    Ok(())
}

fn finish<S: Storage>(session: Session<'_, S>, return_value: Option<Value>) -> ExecutionOutput {
    let output = session.finish();
    ExecutionOutput {
        return_value,
        events: output.events,
        write_set: output.write_set,
        size_deltas: output.size_deltas,
        gas_used: output.gas_used,
    }
}

// =============================================================================
// TESTS
// =============================================================================
