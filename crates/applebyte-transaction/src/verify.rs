//! Input verification: connects the script interpreter to a transaction.

use std::collections::HashSet;

use applebyte_primitives::ec::verify_der;
use applebyte_script::interpreter::{
    Config, Engine, InterpreterError, InterpreterErrorCode, ScriptFlags, TxContext,
};
use applebyte_script::network::MAX_MONEY;
use applebyte_script::{NetworkParams, Script};
use tracing::debug;

use crate::sighash;
use crate::transaction::Transaction;
use crate::TransactionError;

/// Largest serialized transaction accepted by [`Transaction::verify`].
pub const MAX_TRANSACTION_SIZE: usize = 1_000_000;

/// Answers the interpreter's signature checks against one transaction.
pub struct TransactionSignatureChecker<'a> {
    tx: &'a Transaction,
}

impl<'a> TransactionSignatureChecker<'a> {
    pub fn new(tx: &'a Transaction) -> Self {
        TransactionSignatureChecker { tx }
    }
}

impl TxContext for TransactionSignatureChecker<'_> {
    fn verify_signature(
        &self,
        full_sig: &[u8],
        pub_key: &[u8],
        sub_script: &Script,
        input_idx: usize,
        sighash_flag: u32,
    ) -> Result<bool, InterpreterError> {
        let Some((_, der)) = full_sig.split_last() else {
            return Ok(false);
        };
        let digest = sighash::signature_hash(self.tx, input_idx, sub_script.to_bytes(), sighash_flag);
        Ok(verify_der(&digest, der, pub_key))
    }
}

/// Run `script_sig` then `script_pubkey` for input `input_index` of `tx`.
pub fn verify_input(
    tx: &Transaction,
    input_index: usize,
    script_sig: &Script,
    script_pubkey: &Script,
    flags: ScriptFlags,
    config: &Config,
) -> Result<(), InterpreterError> {
    let checker = TransactionSignatureChecker::new(tx);
    let engine = Engine::new(config.clone());
    engine
        .execute(script_sig, script_pubkey, flags, Some(&checker), input_index)
        .map_err(|e| {
            debug!(
                input = input_index,
                code = %e.code,
                script_index = e.context.script_index,
                offset = e.context.offset,
                "input failed script verification"
            );
            e
        })
}

impl Transaction {
    /// Verify that input `input_index` satisfies `script_pubkey`, the
    /// script of the output it spends.
    ///
    /// Flags come from `params.verify_flags`, with BIP16 switched on or off
    /// by `enforce_p2sh`; limits come from `params.config`.
    pub fn correctly_spends(
        &self,
        input_index: usize,
        script_pubkey: &Script,
        params: &NetworkParams,
        enforce_p2sh: bool,
    ) -> Result<(), InterpreterError> {
        let input = self.inputs.get(input_index).ok_or_else(|| {
            InterpreterError::new(
                InterpreterErrorCode::ScriptParse,
                format!(
                    "input index {} out of range (tx has {} inputs)",
                    input_index,
                    self.inputs.len()
                ),
            )
        })?;

        let mut flags = params.verify_flags;
        if enforce_p2sh {
            flags.add_flag(ScriptFlags::BIP16);
        } else {
            flags.remove_flag(ScriptFlags::BIP16);
            // Clean stack is only defined together with BIP16.
            flags.remove_flag(ScriptFlags::VERIFY_CLEAN_STACK);
        }

        verify_input(self, input_index, &input.script_sig, script_pubkey, flags, &params.config)
    }

    /// True if two inputs spend the same outpoint.
    pub fn has_duplicate_inputs(&self) -> bool {
        let mut seen = HashSet::with_capacity(self.inputs.len());
        !self.inputs.iter().all(|input| seen.insert(input.outpoint))
    }

    /// Context-free structural checks.
    ///
    /// Scripts are not executed; use [`Transaction::correctly_spends`] per
    /// input for that.
    pub fn verify(&self) -> Result<(), TransactionError> {
        if self.inputs.is_empty() {
            return Err(TransactionError::InvalidTransaction("transaction has no inputs".to_string()));
        }
        if self.outputs.is_empty() {
            return Err(TransactionError::InvalidTransaction("transaction has no outputs".to_string()));
        }
        let size = self.size();
        if size > MAX_TRANSACTION_SIZE {
            return Err(TransactionError::InvalidTransaction(format!(
                "transaction size {} exceeds {}",
                size, MAX_TRANSACTION_SIZE
            )));
        }

        let mut total: u64 = 0;
        for (i, output) in self.outputs.iter().enumerate() {
            if output.value > MAX_MONEY {
                return Err(TransactionError::InvalidTransaction(format!(
                    "output {} value {} exceeds the money supply",
                    i, output.value
                )));
            }
            total = total
                .checked_add(output.value)
                .filter(|t| *t <= MAX_MONEY)
                .ok_or_else(|| {
                    TransactionError::InvalidTransaction("total output value exceeds the money supply".to_string())
                })?;
        }

        let mut seen = HashSet::with_capacity(self.inputs.len());
        for input in &self.inputs {
            if !seen.insert(input.outpoint) {
                return Err(TransactionError::DuplicateInput {
                    txid: input.outpoint.txid_hex(),
                    index: input.outpoint.index,
                });
            }
        }

        if self.is_coinbase() {
            let len = self.inputs[0].script_sig.len();
            if !(2..=100).contains(&len) {
                return Err(TransactionError::InvalidTransaction(format!(
                    "coinbase script length {} outside 2..=100",
                    len
                )));
            }
        } else if let Some(i) = self.inputs.iter().position(|input| input.outpoint.is_null()) {
            return Err(TransactionError::InvalidTransaction(format!(
                "input {} spends the null outpoint",
                i
            )));
        }

        Ok(())
    }
}
