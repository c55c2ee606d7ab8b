//! # Interpreter
//!
//! Bytecode dispatch for the Basalt stack machine. The interpreter runs
//! one function body per invocation: entry functions of published modules
//! or standalone scripts. Gas is charged per instruction before dispatch;
//! storage, event, and callback traffic charges on top through the
//! session.

use crate::backend::{BankApi, Querier, Storage};
use crate::errors::VmError;
use crate::gas::{self, costs};
use crate::session::Session;
use crate::stack::Stack;
use basalt_types::{
    AccessPath, AccountAddress, Bytecode, ModuleId, StructDef, StructTag, TypeTag, Value,
};

/// Where the running code came from. Scripts have no module namespace, so
/// storage and resource instructions are rejected for them at validation
/// time and defended against here.
pub enum CodeContext<'a> {
    /// An entry function of a published module.
    Module {
        /// The defining module.
        id: &'a ModuleId,
        /// The module's struct layouts, indexed by the resource opcodes.
        structs: &'a [StructDef],
    },
    /// A standalone script.
    Script,
}

impl CodeContext<'_> {
    fn location(&self) -> String {
        match self {
            CodeContext::Module { id, .. } => id.to_string(),
            CodeContext::Script => "script".to_string(),
        }
    }

    fn module_id(&self) -> Result<&ModuleId, VmError> {
        match self {
            CodeContext::Module { id, .. } => Ok(id),
            CodeContext::Script => Err(VmError::Internal(
                "storage instruction in script context".to_string(),
            )),
        }
    }

    fn struct_def(&self, index: u16) -> Result<(&ModuleId, &StructDef), VmError> {
        match self {
            CodeContext::Module { id, structs } => structs
                .get(index as usize)
                .map(|def| (*id, def))
                .ok_or_else(|| {
                    VmError::Internal(format!("struct index {index} out of range"))
                }),
            CodeContext::Script => Err(VmError::Internal(
                "resource instruction in script context".to_string(),
            )),
        }
    }
}

/// The interpreter for one function body.
pub struct Interpreter<'a, 's, S: Storage> {
    session: &'a mut Session<'s, S>,
    context: CodeContext<'a>,
    code: &'a [Bytecode],
    args: &'a [Value],
    sender: Option<AccountAddress>,
    ret: Option<TypeTag>,
    bank: Option<&'a dyn BankApi>,
    querier: Option<&'a dyn Querier>,
    stack: Stack,
    pc: usize,
}

impl<'a, 's, S: Storage> Interpreter<'a, 's, S> {
    /// Builds an interpreter over a session.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        session: &'a mut Session<'s, S>,
        context: CodeContext<'a>,
        code: &'a [Bytecode],
        args: &'a [Value],
        sender: Option<AccountAddress>,
        ret: Option<TypeTag>,
        bank: Option<&'a dyn BankApi>,
        querier: Option<&'a dyn Querier>,
    ) -> Self {
        Self {
            session,
            context,
            code,
            args,
            sender,
            ret,
            bank,
            querier,
            stack: Stack::new(),
            pc: 0,
        }
    }

    /// Runs the code to completion.
    ///
    /// Returns the function's return value when one is declared. Gas
    /// bounds termination: every instruction charges before it executes,
    /// so an unbounded loop exhausts the budget in a number of steps
    /// proportional to the gas limit.
    ///
    /// # Errors
    ///
    /// Any [`VmError`]: gas exhaustion, abort, type errors, backend
    /// failures.
    pub fn run(mut self) -> Result<Option<Value>, VmError> {
        while self.pc < self.code.len() {
            let instruction = &self.code[self.pc];
            self.session
                .meter_mut()
                .charge(gas::instruction_cost(instruction))?;

            match instruction {
                Bytecode::PushBool(v) => self.stack.push(Value::Bool(*v))?,
                Bytecode::PushU64(v) => self.stack.push(Value::U64(*v))?,
                Bytecode::PushU128(v) => self.stack.push(Value::U128(*v))?,
                Bytecode::PushAddress(v) => self.stack.push(Value::Address(*v))?,
                Bytecode::PushBytes(v) => self.stack.push(Value::Bytes(v.clone()))?,
                Bytecode::CopyArg(index) => {
                    let value = self.args.get(*index as usize).cloned().ok_or_else(|| {
                        VmError::Internal(format!("argument index {index} out of range"))
                    })?;
                    self.stack.push(value)?;
                }
                Bytecode::Pop => {
                    self.stack.pop()?;
                }
                Bytecode::Dup => self.stack.dup()?,
                Bytecode::Add | Bytecode::Sub | Bytecode::Mul | Bytecode::Div | Bytecode::Mod => {
                    self.binary_arithmetic(instruction)?;
                }
                Bytecode::Eq => {
                    let rhs = self.stack.pop()?;
                    let lhs = self.stack.pop()?;
                    if lhs.type_tag() != rhs.type_tag() {
                        return Err(VmError::TypeMismatch {
                            expected: lhs.type_tag(),
                            got: rhs.type_tag(),
                        });
                    }
                    self.stack.push(Value::Bool(lhs == rhs))?;
                }
                Bytecode::Lt => {
                    let (lhs, rhs) = self.pop_integer_pair()?;
                    self.stack.push(Value::Bool(lhs < rhs))?;
                }
                Bytecode::Not => {
                    let value = self.stack.pop_bool()?;
                    self.stack.push(Value::Bool(!value))?;
                }
                Bytecode::Branch(target) => {
                    self.pc = self.branch_target(*target)?;
                    continue;
                }
                Bytecode::BranchIfFalse(target) => {
                    let condition = self.stack.pop_bool()?;
                    if !condition {
                        self.pc = self.branch_target(*target)?;
                        continue;
                    }
                }
                Bytecode::Abort => {
                    let code = self.stack.pop_u64()?;
                    return Err(VmError::Aborted {
                        location: self.context.location(),
                        code,
                    });
                }
                Bytecode::Ret => {
                    return self.take_return_value();
                }
                Bytecode::StGet => {
                    let key = self.stack.pop_bytes()?;
                    let path = AccessPath::raw(self.context.module_id()?, key);
                    let value = self.session.read(&path)?;
                    let found = value.is_some();
                    self.stack.push(Value::Bytes(value.unwrap_or_default()))?;
                    self.stack.push(Value::Bool(found))?;
                }
                Bytecode::StSet => {
                    let value = self.stack.pop_bytes()?;
                    let key = self.stack.pop_bytes()?;
                    let path = AccessPath::raw(self.context.module_id()?, key);
                    self.session.write(path, value)?;
                }
                Bytecode::StRemove => {
                    let key = self.stack.pop_bytes()?;
                    let path = AccessPath::raw(self.context.module_id()?, key);
                    self.session.remove(path)?;
                }
                Bytecode::MoveTo(index) => self.op_move_to(*index)?,
                Bytecode::MoveFrom(index) => self.op_move_from(*index)?,
                Bytecode::Exists(index) => self.op_exists(*index)?,
                Bytecode::Emit => {
                    let data = self.stack.pop_bytes()?;
                    self.session.emit(self.context.location(), data)?;
                }
                Bytecode::Transfer => self.op_transfer()?,
                Bytecode::Query => self.op_query()?,
            }

            self.pc += 1;
        }

        // fell off the end without an explicit Ret
        self.take_return_value()
    }

    fn take_return_value(&mut self) -> Result<Option<Value>, VmError> {
        match self.ret {
            None => Ok(None),
            Some(expected) => {
                let value = self.stack.pop().map_err(|_| VmError::MissingReturnValue)?;
                if !value.matches(expected) {
                    return Err(VmError::TypeMismatch {
                        expected,
                        got: value.type_tag(),
                    });
                }
                Ok(Some(value))
            }
        }
    }

    fn branch_target(&self, target: u16) -> Result<usize, VmError> {
        let target = target as usize;
        if target >= self.code.len() {
            return Err(VmError::InvalidBranch {
                target,
                len: self.code.len(),
            });
        }
        Ok(target)
    }

    /// Pops two integers of the same width; returns them widened to u128
    /// as (lhs, rhs).
    fn pop_integer_pair(&mut self) -> Result<(u128, u128), VmError> {
        let rhs = self.stack.pop()?;
        let lhs = self.stack.pop()?;
        match (&lhs, &rhs) {
            (Value::U64(a), Value::U64(b)) => Ok((u128::from(*a), u128::from(*b))),
            (Value::U128(a), Value::U128(b)) => Ok((*a, *b)),
            _ => Err(VmError::TypeMismatch {
                expected: lhs.type_tag(),
                got: rhs.type_tag(),
            }),
        }
    }

    fn binary_arithmetic(&mut self, op: &Bytecode) -> Result<(), VmError> {
        let rhs = self.stack.pop()?;
        let lhs = self.stack.pop()?;
        let result = match (&lhs, &rhs) {
            (Value::U64(a), Value::U64(b)) => arithmetic_u64(op, *a, *b)?.into(),
            (Value::U128(a), Value::U128(b)) => arithmetic_u128(op, *a, *b)?.into(),
            _ => {
                return Err(VmError::TypeMismatch {
                    expected: lhs.type_tag(),
                    got: rhs.type_tag(),
                })
            }
        };
        self.stack.push(result)
    }

    fn op_move_to(&mut self, index: u16) -> Result<(), VmError> {
        if self.session.is_read_only() {
            return Err(VmError::WriteInReadOnlyContext);
        }
        let sender = self.sender.ok_or(VmError::SenderRequired)?;
        let (module, def) = self.context.struct_def(index)?;
        let tag = StructTag::new(module.address, module.name.clone(), def.name.clone());

        // pop one value per field, pushed in declaration order
        let mut fields = Vec::with_capacity(def.fields.len());
        for field in def.fields.iter().rev() {
            let value = self.stack.pop()?;
            if !value.matches(field.ty) {
                return Err(VmError::TypeMismatch {
                    expected: field.ty,
                    got: value.type_tag(),
                });
            }
            fields.push(value);
        }
        fields.reverse();

        let path = AccessPath::resource(sender, &tag);
        if self.session.read(&path)?.is_some() {
            return Err(VmError::ResourceAlreadyExists(tag));
        }
        let bytes = bincode::serialize(&fields)
            .map_err(|e| VmError::Internal(format!("resource encode: {e}")))?;
        self.session.write(path, bytes)
    }

    fn op_move_from(&mut self, index: u16) -> Result<(), VmError> {
        let holder = self.stack.pop_address()?;
        let (module, def) = self.context.struct_def(index)?;
        let tag = StructTag::new(module.address, module.name.clone(), def.name.clone());

        let path = AccessPath::resource(holder, &tag);
        let bytes = self
            .session
            .read(&path)?
            .ok_or_else(|| VmError::ResourceNotFound(tag.clone()))?;
        let fields: Vec<Value> = bincode::deserialize(&bytes)
            .map_err(|e| VmError::decode(format!("stored resource {tag}: {e}")))?;
        if fields.len() != def.fields.len() {
            return Err(VmError::decode(format!(
                "stored resource {tag}: expected {} fields, found {}",
                def.fields.len(),
                fields.len()
            )));
        }
        self.session.remove(path)?;
        for value in fields {
            self.stack.push(value)?;
        }
        Ok(())
    }

    fn op_exists(&mut self, index: u16) -> Result<(), VmError> {
        let holder = self.stack.pop_address()?;
        let (module, def) = self.context.struct_def(index)?;
        let tag = StructTag::new(module.address, module.name.clone(), def.name.clone());
        let exists = self.session.read(&AccessPath::resource(holder, &tag))?.is_some();
        self.stack.push(Value::Bool(exists))
    }

    fn op_transfer(&mut self) -> Result<(), VmError> {
        if self.session.is_read_only() {
            return Err(VmError::WriteInReadOnlyContext);
        }
        let sender = self.sender.ok_or(VmError::SenderRequired)?;
        let amount = self.stack.pop_u128()?;
        let recipient = self.stack.pop_address()?;
        let bank = self.bank.ok_or_else(|| {
            VmError::Internal("bank capability not wired into session".to_string())
        })?;
        self.session.meter_mut().charge(costs::TRANSFER)?;
        bank.transfer(sender, recipient, amount)?;
        Ok(())
    }

    fn op_query(&mut self) -> Result<(), VmError> {
        let request = self.stack.pop_bytes()?;
        let querier = self.querier.ok_or_else(|| {
            VmError::Internal("query capability not wired into session".to_string())
        })?;
        self.session
            .meter_mut()
            .charge(costs::QUERY_BASE + request.len() as u64 * costs::QUERY_PER_BYTE)?;
        let response = querier.query(&request)?;
        self.stack.push(Value::Bytes(response))
    }
}

fn arithmetic_u64(op: &Bytecode, a: u64, b: u64) -> Result<u64, VmError> {
    let result = match op {
        Bytecode::Add => a.checked_add(b),
        Bytecode::Sub => a.checked_sub(b),
        Bytecode::Mul => a.checked_mul(b),
        Bytecode::Div => a.checked_div(b),
        Bytecode::Mod => a.checked_rem(b),
        _ => return Err(VmError::Internal(format!("not arithmetic: {op:?}"))),
    };
    result.ok_or_else(|| arithmetic_failure(op))
}

fn arithmetic_u128(op: &Bytecode, a: u128, b: u128) -> Result<u128, VmError> {
    let result = match op {
        Bytecode::Add => a.checked_add(b),
        Bytecode::Sub => a.checked_sub(b),
        Bytecode::Mul => a.checked_mul(b),
        Bytecode::Div => a.checked_div(b),
        Bytecode::Mod => a.checked_rem(b),
        _ => return Err(VmError::Internal(format!("not arithmetic: {op:?}"))),
    };
    result.ok_or_else(|| arithmetic_failure(op))
}

fn arithmetic_failure(op: &Bytecode) -> VmError {
    match op {
        Bytecode::Div | Bytecode::Mod => VmError::arithmetic("division by zero"),
        _ => VmError::arithmetic("integer overflow"),
    }
}

// =============================================================================
// TESTS
// =============================================================================
