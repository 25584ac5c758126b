//! Script templates for producing spending scripts.

pub mod p2pkh;

use applebyte_script::Script;

use crate::transaction::Transaction;
use crate::TransactionError;

/// A signing strategy that produces the spending script for one input.
pub trait UnlockingScriptTemplate {
    /// Produce the spending script for `input_index`, which spends an
    /// output locked by `script_pubkey`.
    fn sign(
        &self,
        tx: &Transaction,
        input_index: usize,
        script_pubkey: &Script,
    ) -> Result<Script, TransactionError>;

    /// Upper bound on the byte length of the produced script.
    fn estimate_length(&self) -> usize;
}
