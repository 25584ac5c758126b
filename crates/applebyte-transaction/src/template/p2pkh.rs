//! Pay-to-Public-Key-Hash (P2PKH) script template.
//!
//! Locking scripts are `OP_DUP OP_HASH160 <hash> OP_EQUALVERIFY
//! OP_CHECKSIG`; spending scripts are `<sig> <pubkey>`.

use applebyte_primitives::ec::PrivateKey;
use applebyte_script::{Address, Script};

use crate::sighash::SIGHASH_ALL;
use crate::template::UnlockingScriptTemplate;
use crate::transaction::Transaction;
use crate::TransactionError;

/// P2PKH locking script paying to `address`.
pub fn lock(address: &Address) -> Script {
    Script::p2pkh_lock(&address.hash)
}

/// P2PKH signer. `sighash_flag` defaults to `SIGHASH_ALL`.
pub fn unlock(private_key: PrivateKey, sighash_flag: Option<u32>) -> P2PKH {
    P2PKH {
        private_key,
        sighash_flag: sighash_flag.unwrap_or(SIGHASH_ALL),
    }
}

/// P2PKH signing template holding a private key and sighash flag.
pub struct P2PKH {
    private_key: PrivateKey,
    sighash_flag: u32,
}

impl UnlockingScriptTemplate for P2PKH {
    /// Signs the legacy signature hash with RFC6979 ECDSA and returns
    /// `<DER_sig || sighash_byte> <compressed_pubkey>`.
    fn sign(
        &self,
        tx: &Transaction,
        input_index: usize,
        script_pubkey: &Script,
    ) -> Result<Script, TransactionError> {
        if input_index >= tx.inputs.len() {
            return Err(TransactionError::SigningError(format!(
                "input index {} out of range (tx has {} inputs)",
                input_index,
                tx.inputs.len()
            )));
        }

        let sig_hash = tx.signature_hash(input_index, script_pubkey.to_bytes(), self.sighash_flag);
        let signature = self.private_key.sign(&sig_hash)?;

        let mut sig_buf = signature.to_der();
        sig_buf.push(self.sighash_flag as u8);

        let mut script = Script::new();
        script.append_push_data(&sig_buf)?;
        script.append_push_data(&self.private_key.pub_key().to_compressed())?;
        Ok(script)
    }

    /// 1 + 72 (DER signature and hash type) + 1 + 33 (compressed key).
    fn estimate_length(&self) -> usize {
        107
    }
}
