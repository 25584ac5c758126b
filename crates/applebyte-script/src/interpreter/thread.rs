//! Script execution thread: the spending script, then the redeemed script
//! on the same stack, then for pay-to-script-hash outputs the redeem
//! script.

use tracing::trace;

use crate::opcodes::*;
use crate::Script;

use super::config::Config;
use super::error::{ErrorContext, InterpreterError, InterpreterErrorCode};
use super::flags::ScriptFlags;
use super::ops_crypto::HashType;
use super::parsed_opcode::*;
use super::scriptnum::ScriptNumber;
use super::stack::{as_bool, Stack};
use super::TxContext;

/// Position of the spending script in `Thread::scripts`.
pub const SCRIPT_SIG: usize = 0;
/// Position of the script being redeemed.
pub const SCRIPT_PUBKEY: usize = 1;
/// Position of a pay-to-script-hash redeem script, once expanded.
pub const REDEEM_SCRIPT: usize = 2;

/// The execution thread for the script interpreter.
pub struct Thread<'a> {
    /// The main data stack used during script execution.
    pub dstack: Stack,
    /// The alternate stack used by OP_TOALTSTACK and OP_FROMALTSTACK.
    pub astack: Stack,
    /// Resource limits for this run.
    pub cfg: &'a Config,
    /// The parsed scripts to execute (unlocking, locking, and optionally P2SH).
    pub scripts: Vec<ParsedScript>,
    /// Byte length of each entry in `scripts`.
    script_sizes: Vec<usize>,
    /// One entry per open IF; false inside a branch not taken.
    pub cond_stack: Vec<bool>,
    /// Saved copy of the data stack after the first (unlocking) script for BIP16.
    pub saved_first_stack: Vec<Vec<u8>>,
    /// Index of the currently executing script in the scripts array.
    pub script_idx: usize,
    /// Index of the next opcode within the current script.
    pub script_off: usize,
    /// Index of the first opcode after the most recent OP_CODESEPARATOR.
    pub last_code_sep: usize,
    /// Running count of non-push opcodes executed (checked against max_ops).
    pub num_ops: usize,
    /// Verification flags, already checked for consistency.
    pub flags: ScriptFlags,
    /// Whether the redeemed script is pay-to-script-hash and BIP16 is on.
    pub bip16: bool,
    /// Signature checker for the spending transaction, if any.
    pub tx_context: Option<&'a dyn TxContext>,
    /// The transaction input index being verified.
    pub input_idx: usize,
}

impl<'a> Thread<'a> {
    /// Create a new execution thread from unlocking and locking scripts.
    ///
    /// Checks the flag combination, parses both scripts and applies the
    /// push-only rules before anything executes.
    pub fn new(
        unlocking_script: &Script,
        locking_script: &Script,
        flags: ScriptFlags,
        tx_context: Option<&'a dyn TxContext>,
        input_idx: usize,
        cfg: &'a Config,
    ) -> Result<Self, InterpreterError> {
        if flags.has_flag(ScriptFlags::VERIFY_CLEAN_STACK) && !flags.has_flag(ScriptFlags::BIP16) {
            return Err(InterpreterError::new(
                InterpreterErrorCode::InvalidFlags,
                "clean stack verification requires BIP16".to_string(),
            ));
        }

        let at_start = |script_index| ErrorContext {
            script_index,
            ..ErrorContext::default()
        };
        let uscript = parse_script(unlocking_script, cfg.max_script_size())
            .map_err(|e| e.with_context(at_start(SCRIPT_SIG)))?;
        let lscript = parse_script(locking_script, cfg.max_script_size())
            .map_err(|e| e.with_context(at_start(SCRIPT_PUBKEY)))?;

        if flags.has_flag(ScriptFlags::VERIFY_SIG_PUSH_ONLY) && !is_push_only(&uscript) {
            return Err(InterpreterError::new(
                InterpreterErrorCode::PolicyViolation,
                "signature script is not push only".to_string(),
            )
            .with_context(at_start(SCRIPT_SIG)));
        }

        let bip16 = flags.has_flag(ScriptFlags::BIP16) && locking_script.is_p2sh();
        if bip16 && !is_push_only(&uscript) {
            return Err(InterpreterError::new(
                InterpreterErrorCode::P2shMismatch,
                "pay to script hash spending script is not push only".to_string(),
            )
            .with_context(at_start(SCRIPT_SIG)));
        }

        let verify_minimal_data = flags.has_flag(ScriptFlags::VERIFY_MINIMAL_DATA);
        let max_num_len = cfg.max_script_number_length();

        Ok(Thread {
            dstack: Stack::new(max_num_len, verify_minimal_data),
            astack: Stack::new(max_num_len, verify_minimal_data),
            cfg,
            scripts: vec![uscript, lscript],
            script_sizes: vec![unlocking_script.len(), locking_script.len()],
            cond_stack: Vec::new(),
            saved_first_stack: Vec::new(),
            script_idx: SCRIPT_SIG,
            script_off: 0,
            last_code_sep: 0,
            num_ops: 0,
            flags,
            bip16,
            tx_context,
            input_idx,
        })
    }

    /// Check if a specific script verification flag is set.
    pub fn has_flag(&self, flag: ScriptFlags) -> bool {
        self.flags.has_flag(flag)
    }

    /// Check if any of the given script verification flags are set.
    pub fn has_any(&self, flags: &[ScriptFlags]) -> bool {
        self.flags.has_any(flags)
    }

    /// Return true if the current conditional branch is executing.
    pub fn is_branch_executing(&self) -> bool {
        self.cond_stack.iter().all(|&taken| taken)
    }

    /// Execute all scripts and check the final stack.
    pub fn execute(&mut self) -> Result<(), InterpreterError> {
        self.run_scripts()
            .and_then(|_| self.check_error_condition())
            .map_err(|e| self.wrap_redeem_failure(e))?;
        self.check_clean_stack()
    }

    fn run_scripts(&mut self) -> Result<(), InterpreterError> {
        while self.script_idx < self.scripts.len() {
            if self.script_off < self.scripts[self.script_idx].len() {
                self.step()?;
            } else {
                self.finish_script()?;
            }
        }
        Ok(())
    }

    /// Execute the next opcode of the current script.
    pub fn step(&mut self) -> Result<(), InterpreterError> {
        let pop = self.scripts[self.script_idx][self.script_off].clone();

        self.execute_opcode(&pop)
            .map_err(|e| e.with_context(self.context_at(Some(&pop))))?;
        self.script_off += 1;

        let combined = self.dstack.depth() + self.astack.depth();
        if combined > self.cfg.max_stack_size() {
            return Err(InterpreterError::new(
                InterpreterErrorCode::ResourceLimitExceeded,
                format!(
                    "combined stack size {} > max allowed {}",
                    combined,
                    self.cfg.max_stack_size()
                ),
            )
            .with_context(self.context_at(Some(&pop))));
        }
        Ok(())
    }

    fn context_at(&self, pop: Option<&ParsedOpcode>) -> ErrorContext {
        let script_index = self.script_idx.min(self.scripts.len() - 1);
        ErrorContext {
            script_index,
            offset: pop.map_or(self.script_sizes[script_index], |p| p.offset),
            opcode: pop.map(|p| p.opcode),
            stack_depth: self.dstack.depth(),
        }
    }

    /// End-of-script bookkeeping and the move to the next script.
    fn finish_script(&mut self) -> Result<(), InterpreterError> {
        if !self.cond_stack.is_empty() {
            return Err(InterpreterError::new(
                InterpreterErrorCode::UnbalancedControlFlow,
                "end of script reached in conditional execution".to_string(),
            )
            .with_context(self.context_at(None)));
        }

        // Alt stack doesn't persist between scripts
        self.astack.clear();

        let finished = self.script_idx;
        if self.bip16 {
            match finished {
                SCRIPT_SIG => self.saved_first_stack = self.dstack.get_stack(),
                SCRIPT_PUBKEY => self.expand_p2sh()?,
                _ => {}
            }
        }

        self.script_idx += 1;
        self.script_off = 0;
        self.last_code_sep = 0;
        self.num_ops = 0;
        Ok(())
    }

    /// Queue the redeem script left on top of the spending script's stack.
    ///
    /// The locking script must have left true (the hash matched). The redeem
    /// script then runs against the spending script's stack minus its own
    /// bytes. Only the locking script is ever expanded, so expansion never
    /// nests.
    fn expand_p2sh(&mut self) -> Result<(), InterpreterError> {
        let context = self.context_at(None);
        let mismatch = |description: &str| {
            InterpreterError::new(InterpreterErrorCode::P2shMismatch, description.to_string())
                .with_context(context)
        };

        match self.dstack.pop_byte_array() {
            Ok(top) if as_bool(&top) => {}
            _ => return Err(mismatch("redeem script does not match the committed hash")),
        }

        let mut stack = std::mem::take(&mut self.saved_first_stack);
        let redeem_bytes = stack
            .pop()
            .ok_or_else(|| mismatch("no redeem script on the spending stack"))?;
        let redeem = Script::from(redeem_bytes);
        let parsed = parse_script(&redeem, self.cfg.max_script_size())
            .map_err(|e| mismatch("redeem script does not parse").with_cause(e))?;

        trace!(
            input = self.input_idx,
            redeem_len = redeem.len(),
            depth = stack.len(),
            "expanding pay-to-script-hash redeem script"
        );
        self.scripts.push(parsed);
        self.script_sizes.push(redeem.len());
        self.dstack.set_stack(stack);
        Ok(())
    }

    /// Failures after the redeem script was queued are reported as
    /// `P2shMismatch`, keeping the inner failure as the cause.
    fn wrap_redeem_failure(&self, err: InterpreterError) -> InterpreterError {
        if self.scripts.len() <= REDEEM_SCRIPT || err.code == InterpreterErrorCode::P2shMismatch {
            return err;
        }
        InterpreterError::new(
            InterpreterErrorCode::P2shMismatch,
            "redeem script failed".to_string(),
        )
        .with_context(err.context)
        .with_cause(err)
    }

    /// The last script must leave a true value on top of the stack.
    fn check_error_condition(&mut self) -> Result<(), InterpreterError> {
        let context = self.context_at(None);
        if self.dstack.depth() < 1 {
            return Err(InterpreterError::new(
                InterpreterErrorCode::FinalStackInvalid,
                "stack empty at end of script execution".to_string(),
            )
            .with_context(context));
        }
        if !self.dstack.pop_bool()? {
            return Err(InterpreterError::new(
                InterpreterErrorCode::FinalStackInvalid,
                "false stack entry at end of script execution".to_string(),
            )
            .with_context(context));
        }
        Ok(())
    }

    fn check_clean_stack(&self) -> Result<(), InterpreterError> {
        if self.has_flag(ScriptFlags::VERIFY_CLEAN_STACK) && self.dstack.depth() != 0 {
            return Err(InterpreterError::new(
                InterpreterErrorCode::FinalStackInvalid,
                format!("stack contains {} unexpected items", self.dstack.depth()),
            )
            .with_context(self.context_at(None)));
        }
        Ok(())
    }

    fn execute_opcode(&mut self, pop: &ParsedOpcode) -> Result<(), InterpreterError> {
        if pop.data.len() > self.cfg.max_script_element_size() {
            return Err(InterpreterError::new(
                InterpreterErrorCode::ResourceLimitExceeded,
                format!(
                    "element size {} exceeds max allowed size {}",
                    pop.data.len(),
                    self.cfg.max_script_element_size()
                ),
            ));
        }

        if pop.is_disabled() {
            return Err(InterpreterError::new(
                InterpreterErrorCode::UnknownOrDisabledOpcode,
                format!("attempt to execute disabled opcode {}", pop.name()),
            ));
        }
        if pop.always_illegal() {
            return Err(InterpreterError::new(
                InterpreterErrorCode::UnknownOrDisabledOpcode,
                format!("attempt to execute reserved opcode {}", pop.name()),
            ));
        }

        // Count non-push operations, executed or not
        if pop.opcode > OP_16 {
            self.num_ops += 1;
            if self.num_ops > self.cfg.max_ops() {
                return Err(InterpreterError::new(
                    InterpreterErrorCode::ResourceLimitExceeded,
                    format!("exceeded max operation limit of {}", self.cfg.max_ops()),
                ));
            }
        }

        if !self.is_branch_executing() && !pop.is_conditional() {
            return Ok(());
        }

        if self.has_flag(ScriptFlags::VERIFY_MINIMAL_DATA) && self.is_branch_executing() {
            pop.enforce_minimum_data_push()?;
        }

        self.dispatch_opcode(pop)
    }

    fn dispatch_opcode(&mut self, pop: &ParsedOpcode) -> Result<(), InterpreterError> {
        match pop.opcode {
            OP_0 => {
                self.dstack.push_byte_array(vec![]);
                Ok(())
            }
            OP_DATA_1..=OP_PUSHDATA4 => {
                self.dstack.push_byte_array(pop.data.clone());
                Ok(())
            }
            OP_1NEGATE => {
                self.dstack.push_int(ScriptNumber::new(-1));
                Ok(())
            }
            OP_1..=OP_16 => {
                self.dstack.push_byte_array(vec![pop.opcode - (OP_1 - 1)]);
                Ok(())
            }
            OP_NOP => Ok(()),
            OP_IF => self.op_if(),
            OP_NOTIF => self.op_notif(),
            OP_ELSE => self.op_else(pop),
            OP_ENDIF => self.op_endif(pop),
            OP_VERIFY => self.op_verify(pop),
            OP_RETURN => self.op_return(),

            // Stack ops
            OP_TOALTSTACK => self.op_to_alt_stack(),
            OP_FROMALTSTACK => self.op_from_alt_stack(),
            OP_2DROP => self.dstack.drop_n(2),
            OP_2DUP => self.dstack.dup_n(2),
            OP_3DUP => self.dstack.dup_n(3),
            OP_2OVER => self.dstack.over_n(2),
            OP_2ROT => self.dstack.rot_n(2),
            OP_2SWAP => self.dstack.swap_n(2),
            OP_IFDUP => self.op_ifdup(),
            OP_DEPTH => self.op_depth(),
            OP_DROP => self.dstack.drop_n(1),
            OP_DUP => self.dstack.dup_n(1),
            OP_NIP => self.dstack.nip_n(1).map(|_| ()),
            OP_OVER => self.dstack.over_n(1),
            OP_PICK => self.op_pick(),
            OP_ROLL => self.op_roll(),
            OP_ROT => self.dstack.rot_n(1),
            OP_SWAP => self.dstack.swap_n(1),
            OP_TUCK => self.dstack.tuck(),

            // Splice and bitwise logic
            OP_SIZE => self.op_size(),
            OP_EQUAL => self.op_equal(),
            OP_EQUALVERIFY => self.op_equalverify(pop),

            // Arithmetic
            OP_1ADD => self.op_unary_int(|m| m.checked_add(ScriptNumber::new(1))),
            OP_1SUB => self.op_unary_int(|m| m.checked_sub(ScriptNumber::new(1))),
            OP_NEGATE => self.op_unary_int(ScriptNumber::checked_neg),
            OP_ABS => self.op_unary_int(ScriptNumber::checked_abs),
            OP_NOT => self.op_unary_int(|m| Some(ScriptNumber::new(m.is_zero() as i64))),
            OP_0NOTEQUAL => self.op_unary_int(|m| Some(ScriptNumber::new(!m.is_zero() as i64))),
            OP_ADD => self.op_add(),
            OP_SUB => self.op_sub(),
            OP_BOOLAND => self.op_bool_binop(|a, b| !a.is_zero() && !b.is_zero()),
            OP_BOOLOR => self.op_bool_binop(|a, b| !a.is_zero() || !b.is_zero()),
            OP_NUMEQUAL => self.op_bool_binop(|a, b| a == b),
            OP_NUMEQUALVERIFY => self.op_numequalverify(pop),
            OP_NUMNOTEQUAL => self.op_bool_binop(|a, b| a != b),
            OP_LESSTHAN => self.op_bool_binop(|a, b| a < b),
            OP_GREATERTHAN => self.op_bool_binop(|a, b| a > b),
            OP_LESSTHANOREQUAL => self.op_bool_binop(|a, b| a <= b),
            OP_GREATERTHANOREQUAL => self.op_bool_binop(|a, b| a >= b),
            OP_MIN => self.op_min(),
            OP_MAX => self.op_max(),
            OP_WITHIN => self.op_within(),

            // Crypto
            OP_RIPEMD160 => self.op_hash(HashType::Ripemd160),
            OP_SHA1 => self.op_hash(HashType::Sha1),
            OP_SHA256 => self.op_hash(HashType::Sha256),
            OP_HASH160 => self.op_hash(HashType::Hash160),
            OP_HASH256 => self.op_hash(HashType::Hash256),
            OP_CODESEPARATOR => {
                self.last_code_sep = self.script_off + 1;
                Ok(())
            }
            OP_CHECKSIG => self.op_checksig(),
            OP_CHECKSIGVERIFY => self.op_checksigverify(pop),
            OP_CHECKMULTISIG => self.op_checkmultisig(),
            OP_CHECKMULTISIGVERIFY => self.op_checkmultisigverify(pop),

            OP_NOP1..=OP_NOP10 => self.op_upgradable_nop(pop),

            // OP_RESERVED, OP_VER, OP_RESERVED1/2 and unassigned bytes
            _ => Err(InterpreterError::new(
                InterpreterErrorCode::UnknownOrDisabledOpcode,
                format!("attempt to execute invalid opcode {}", pop.name()),
            )),
        }
    }
}
