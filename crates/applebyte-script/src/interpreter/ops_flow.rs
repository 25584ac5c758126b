//! Flow control operations for the script interpreter.

use super::error::{InterpreterError, InterpreterErrorCode};
use super::flags::ScriptFlags;
use super::parsed_opcode::ParsedOpcode;
use super::stack::as_bool;
use super::thread::Thread;

impl<'a> Thread<'a> {
    pub(crate) fn pop_if_bool(&mut self) -> Result<bool, InterpreterError> {
        if self.has_flag(ScriptFlags::VERIFY_MINIMAL_IF) {
            let b = self.dstack.pop_byte_array()?;
            if b.len() > 1 {
                return Err(InterpreterError::new(
                    InterpreterErrorCode::PolicyViolation,
                    format!("conditional has data of length {}", b.len()),
                ));
            }
            if b.len() == 1 && b[0] != 1 {
                return Err(InterpreterError::new(
                    InterpreterErrorCode::PolicyViolation,
                    "conditional argument must be empty or 0x01".to_string(),
                ));
            }
            return Ok(as_bool(&b));
        }
        self.dstack.pop_bool()
    }

    /// An IF inside a branch that is not taken consumes nothing and opens
    /// a branch that stays untaken.
    pub(crate) fn op_if(&mut self) -> Result<(), InterpreterError> {
        let mut taken = false;
        if self.is_branch_executing() {
            taken = self.pop_if_bool()?;
        }
        self.cond_stack.push(taken);
        Ok(())
    }

    pub(crate) fn op_notif(&mut self) -> Result<(), InterpreterError> {
        let mut taken = false;
        if self.is_branch_executing() {
            taken = !self.pop_if_bool()?;
        }
        self.cond_stack.push(taken);
        Ok(())
    }

    /// Flips the innermost branch. Repeated ELSEs keep flipping it.
    pub(crate) fn op_else(&mut self, pop: &ParsedOpcode) -> Result<(), InterpreterError> {
        match self.cond_stack.last_mut() {
            Some(taken) => {
                *taken = !*taken;
                Ok(())
            }
            None => Err(InterpreterError::new(
                InterpreterErrorCode::UnbalancedControlFlow,
                format!("encountered opcode {} with no matching opcode to begin conditional execution", pop.name()),
            )),
        }
    }

    pub(crate) fn op_endif(&mut self, pop: &ParsedOpcode) -> Result<(), InterpreterError> {
        if self.cond_stack.pop().is_none() {
            return Err(InterpreterError::new(
                InterpreterErrorCode::UnbalancedControlFlow,
                format!("encountered opcode {} with no matching opcode to begin conditional execution", pop.name()),
            ));
        }
        Ok(())
    }

    /// Shared tail of the *VERIFY opcodes: pop the result, fail with `code` if false.
    pub(crate) fn abstract_verify(
        &mut self,
        pop: &ParsedOpcode,
        code: InterpreterErrorCode,
    ) -> Result<(), InterpreterError> {
        let verified = self.dstack.pop_bool()?;
        if !verified {
            return Err(InterpreterError::new(code, format!("{} failed", pop.name())));
        }
        Ok(())
    }

    pub(crate) fn op_verify(&mut self, pop: &ParsedOpcode) -> Result<(), InterpreterError> {
        self.abstract_verify(pop, InterpreterErrorCode::VerifyFailed)
    }

    pub(crate) fn op_return(&mut self) -> Result<(), InterpreterError> {
        Err(InterpreterError::new(
            InterpreterErrorCode::EarlyReturn,
            "script returned early".to_string(),
        ))
    }

    /// OP_NOP1..OP_NOP10 do nothing unless upgradable NOPs are discouraged.
    pub(crate) fn op_upgradable_nop(&mut self, pop: &ParsedOpcode) -> Result<(), InterpreterError> {
        if self.has_flag(ScriptFlags::DISCOURAGE_UPGRADABLE_NOPS) {
            return Err(InterpreterError::new(
                InterpreterErrorCode::PolicyViolation,
                format!("{} reserved for soft-fork upgrades", pop.name()),
            ));
        }
        Ok(())
    }
}
