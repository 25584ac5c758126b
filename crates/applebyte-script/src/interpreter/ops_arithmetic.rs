//! Arithmetic operations for the script interpreter.

use super::error::{InterpreterError, InterpreterErrorCode};
use super::parsed_opcode::ParsedOpcode;
use super::scriptnum::ScriptNumber;
use super::thread::Thread;

fn overflow() -> InterpreterError {
    InterpreterError::new(
        InterpreterErrorCode::NumericOverflow,
        "arithmetic result out of range".to_string(),
    )
}

impl<'a> Thread<'a> {
    pub(crate) fn op_unary_int(
        &mut self,
        f: impl FnOnce(ScriptNumber) -> Option<ScriptNumber>,
    ) -> Result<(), InterpreterError> {
        let m = self.dstack.pop_int()?;
        let n = f(m).ok_or_else(overflow)?;
        self.dstack.push_int(n);
        Ok(())
    }

    pub(crate) fn op_add(&mut self) -> Result<(), InterpreterError> {
        let v0 = self.dstack.pop_int()?;
        let v1 = self.dstack.pop_int()?;
        let sum = v1.checked_add(v0).ok_or_else(overflow)?;
        self.dstack.push_int(sum);
        Ok(())
    }

    pub(crate) fn op_sub(&mut self) -> Result<(), InterpreterError> {
        let v0 = self.dstack.pop_int()?;
        let v1 = self.dstack.pop_int()?;
        let diff = v1.checked_sub(v0).ok_or_else(overflow)?;
        self.dstack.push_int(diff);
        Ok(())
    }

    /// Pops b then a, pushes `f(a, b)` as a boolean.
    pub(crate) fn op_bool_binop(
        &mut self,
        f: impl FnOnce(ScriptNumber, ScriptNumber) -> bool,
    ) -> Result<(), InterpreterError> {
        let b = self.dstack.pop_int()?;
        let a = self.dstack.pop_int()?;
        self.dstack.push_bool(f(a, b));
        Ok(())
    }

    pub(crate) fn op_numequalverify(&mut self, pop: &ParsedOpcode) -> Result<(), InterpreterError> {
        self.op_bool_binop(|a, b| a == b)?;
        self.abstract_verify(pop, InterpreterErrorCode::VerifyFailed)
    }

    pub(crate) fn op_min(&mut self) -> Result<(), InterpreterError> {
        let v0 = self.dstack.pop_int()?;
        let v1 = self.dstack.pop_int()?;
        self.dstack.push_int(v0.min(v1));
        Ok(())
    }

    pub(crate) fn op_max(&mut self) -> Result<(), InterpreterError> {
        let v0 = self.dstack.pop_int()?;
        let v1 = self.dstack.pop_int()?;
        self.dstack.push_int(v0.max(v1));
        Ok(())
    }

    /// x min max -> (min <= x < max)
    pub(crate) fn op_within(&mut self) -> Result<(), InterpreterError> {
        let max_val = self.dstack.pop_int()?;
        let min_val = self.dstack.pop_int()?;
        let x = self.dstack.pop_int()?;
        self.dstack.push_bool(min_val <= x && x < max_val);
        Ok(())
    }
}
