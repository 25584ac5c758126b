//! Crypto operations for the script interpreter.

use applebyte_primitives::hash;
use num_bigint::{BigInt, Sign};
use tracing::trace;

use crate::chunk::ScriptChunk;
use crate::opcodes::OP_CODESEPARATOR;
use crate::Script;
use super::error::{InterpreterError, InterpreterErrorCode};
use super::flags::ScriptFlags;
use super::parsed_opcode::*;
use super::thread::Thread;

/// Half the order of the secp256k1 group, big-endian.
const HALF_ORDER: [u8; 32] = [
    0x7f, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0x5d, 0x57, 0x6e, 0x73, 0x57, 0xa4, 0x50, 0x1d, 0xdf, 0xe9, 0x2f, 0x46, 0x68, 0x1b, 0x20, 0xa0,
];

const SIGHASH_ANYONECANPAY: u32 = 0x80;

pub(crate) enum HashType {
    Ripemd160,
    Sha1,
    Sha256,
    Hash160,
    Hash256,
}

fn encoding_error(description: impl Into<String>) -> InterpreterError {
    InterpreterError::new(
        InterpreterErrorCode::SignatureVerificationFailed,
        description.into(),
    )
}

/// The bytes a signature occupies when pushed with the shortest push opcode.
fn canonical_push(data: &[u8]) -> Vec<u8> {
    ScriptChunk::push(data).to_bytes()
}

impl<'a> Thread<'a> {
    pub(crate) fn op_hash(&mut self, hash_type: HashType) -> Result<(), InterpreterError> {
        let buf = self.dstack.pop_byte_array()?;
        let result = match hash_type {
            HashType::Ripemd160 => hash::ripemd160(&buf).to_vec(),
            HashType::Sha1 => hash::sha1(&buf).to_vec(),
            HashType::Sha256 => hash::sha256(&buf).to_vec(),
            HashType::Hash160 => hash::hash160(&buf).to_vec(),
            HashType::Hash256 => hash::sha256d(&buf).to_vec(),
        };
        self.dstack.push_byte_array(result);
        Ok(())
    }

    /// The current script from just after the last OP_CODESEPARATOR.
    pub(crate) fn sub_script(&self) -> ParsedScript {
        self.scripts[self.script_idx][self.last_code_sep..].to_vec()
    }

    /// Ask the transaction context whether `full_sig` signs this input.
    /// Without a context, or when the context cannot answer, the signature
    /// counts as invalid.
    fn verify_with_context(&self, full_sig: &[u8], pub_key: &[u8], sub_script: &Script, shf: u32) -> bool {
        let Some(ctx) = self.tx_context else {
            return false;
        };
        match ctx.verify_signature(full_sig, pub_key, sub_script, self.input_idx, shf) {
            Ok(valid) => valid,
            Err(e) => {
                trace!(input = self.input_idx, error = %e, "signature check could not complete");
                false
            }
        }
    }

    fn check_sig(&mut self) -> Result<bool, InterpreterError> {
        let pk_bytes = self.dstack.pop_byte_array()?;
        let full_sig_bytes = self.dstack.pop_byte_array()?;

        // An empty signature passes the signature checks but not the key check.
        let Some((&shf, sig_bytes)) = full_sig_bytes.split_last() else {
            self.check_pub_key_encoding(&pk_bytes)?;
            return Ok(false);
        };
        let shf = shf as u32;

        self.check_hash_type_encoding(shf)?;
        self.check_signature_encoding(sig_bytes)?;
        self.check_pub_key_encoding(&pk_bytes)?;

        let mut sub_script = self.sub_script();
        sub_script = remove_encoded(&sub_script, &canonical_push(&full_sig_bytes));
        sub_script = remove_opcode(&sub_script, OP_CODESEPARATOR);

        let valid = self.verify_with_context(&full_sig_bytes, &pk_bytes, &unparse(&sub_script), shf);
        if !valid && self.has_flag(ScriptFlags::VERIFY_NULL_FAIL) && !sig_bytes.is_empty() {
            return Err(encoding_error("signature not empty on failed checksig"));
        }
        Ok(valid)
    }

    pub(crate) fn op_checksig(&mut self) -> Result<(), InterpreterError> {
        let valid = self.check_sig()?;
        self.dstack.push_bool(valid);
        Ok(())
    }

    pub(crate) fn op_checksigverify(&mut self, pop: &ParsedOpcode) -> Result<(), InterpreterError> {
        self.op_checksig()?;
        self.abstract_verify(pop, InterpreterErrorCode::SignatureVerificationFailed)
    }

    /// Stack layout, top first: key count, keys, signature count,
    /// signatures, then one extra dummy element.
    fn check_multisig(&mut self) -> Result<bool, InterpreterError> {
        let num_keys = self.dstack.pop_int()?.value();
        let max_keys = self.cfg.max_pub_keys_per_multisig();
        let num_keys = match usize::try_from(num_keys) {
            Ok(n) if n <= max_keys => n,
            _ => {
                return Err(InterpreterError::new(
                    InterpreterErrorCode::MultisigStructureInvalid,
                    format!("public key count {} outside 0..={}", num_keys, max_keys),
                ))
            }
        };

        self.num_ops += num_keys;
        if self.num_ops > self.cfg.max_ops() {
            return Err(InterpreterError::new(
                InterpreterErrorCode::ResourceLimitExceeded,
                format!("exceeded max operation limit of {}", self.cfg.max_ops()),
            ));
        }

        let mut pub_keys = Vec::with_capacity(num_keys);
        for _ in 0..num_keys {
            pub_keys.push(self.dstack.pop_byte_array()?);
        }

        let num_sigs = self.dstack.pop_int()?.value();
        let num_sigs = match usize::try_from(num_sigs) {
            Ok(n) if n <= num_keys => n,
            _ => {
                return Err(InterpreterError::new(
                    InterpreterErrorCode::MultisigStructureInvalid,
                    format!("signature count {} outside 0..={}", num_sigs, num_keys),
                ))
            }
        };

        let mut signatures = Vec::with_capacity(num_sigs);
        for _ in 0..num_sigs {
            signatures.push(self.dstack.pop_byte_array()?);
        }

        // Off-by-one dummy below the signatures; always consumed.
        let dummy = self.dstack.pop_byte_array()?;
        if self.has_flag(ScriptFlags::STRICT_MULTI_SIG) && !dummy.is_empty() {
            return Err(InterpreterError::new(
                InterpreterErrorCode::MultisigStructureInvalid,
                format!("multisig dummy argument has length {} instead of 0", dummy.len()),
            ));
        }

        let mut scr = self.sub_script();
        for sig in &signatures {
            scr = remove_encoded(&scr, &canonical_push(sig));
        }
        scr = remove_opcode(&scr, OP_CODESEPARATOR);
        let script = unparse(&scr);

        // Signatures must match keys in order; a key is consumed per attempt.
        let mut success = true;
        let mut key_idx = 0;
        let mut sig_idx = 0;
        while sig_idx < signatures.len() {
            if signatures.len() - sig_idx > pub_keys.len() - key_idx {
                success = false;
                break;
            }
            let sig = &signatures[sig_idx];
            let pub_key = &pub_keys[key_idx];
            key_idx += 1;

            let Some((&shf, sig_only)) = sig.split_last() else {
                self.check_pub_key_encoding(pub_key)?;
                continue;
            };
            let shf = shf as u32;

            self.check_hash_type_encoding(shf)?;
            self.check_signature_encoding(sig_only)?;
            self.check_pub_key_encoding(pub_key)?;

            if self.verify_with_context(sig, pub_key, &script, shf) {
                sig_idx += 1;
            }
        }

        if !success
            && self.has_flag(ScriptFlags::VERIFY_NULL_FAIL)
            && signatures.iter().any(|sig| !sig.is_empty())
        {
            return Err(encoding_error("not all signatures empty on failed checkmultisig"));
        }
        Ok(success)
    }

    pub(crate) fn op_checkmultisig(&mut self) -> Result<(), InterpreterError> {
        let valid = self.check_multisig()?;
        self.dstack.push_bool(valid);
        Ok(())
    }

    pub(crate) fn op_checkmultisigverify(&mut self, pop: &ParsedOpcode) -> Result<(), InterpreterError> {
        self.op_checkmultisig()?;
        self.abstract_verify(pop, InterpreterErrorCode::SignatureVerificationFailed)
    }

    pub(crate) fn check_hash_type_encoding(&self, shf: u32) -> Result<(), InterpreterError> {
        if !self.has_flag(ScriptFlags::VERIFY_STRICT_ENCODING) {
            return Ok(());
        }
        let base = shf & !SIGHASH_ANYONECANPAY;
        if !(1..=3).contains(&base) {
            return Err(encoding_error(format!("invalid hash type 0x{:x}", shf)));
        }
        Ok(())
    }

    pub(crate) fn check_pub_key_encoding(&self, pub_key: &[u8]) -> Result<(), InterpreterError> {
        if !self.has_flag(ScriptFlags::VERIFY_STRICT_ENCODING) {
            return Ok(());
        }
        match (pub_key.len(), pub_key.first()) {
            (33, Some(0x02 | 0x03)) | (65, Some(0x04)) => Ok(()),
            _ => Err(encoding_error("unsupported public key type")),
        }
    }

    pub(crate) fn check_signature_encoding(&self, sig: &[u8]) -> Result<(), InterpreterError> {
        if !self.has_any(&[
            ScriptFlags::VERIFY_DER_SIGNATURES,
            ScriptFlags::VERIFY_LOW_S,
            ScriptFlags::VERIFY_STRICT_ENCODING,
        ]) {
            return Ok(());
        }

        if sig.is_empty() {
            return Ok(());
        }

        let sig_len = sig.len();
        if sig_len < 8 {
            return Err(encoding_error(format!("malformed signature: too short: {} < 8", sig_len)));
        }
        if sig_len > 72 {
            return Err(encoding_error(format!("malformed signature: too long: {} > 72", sig_len)));
        }
        if sig[0] != 0x30 {
            return Err(encoding_error(format!(
                "malformed signature: format has wrong type: {:#x}",
                sig[0]
            )));
        }
        if sig[1] as usize != sig_len - 2 {
            return Err(encoding_error(format!(
                "malformed signature: bad length: {} != {}",
                sig[1],
                sig_len - 2
            )));
        }

        let r_len = sig[3] as usize;
        let s_type_offset = 4 + r_len;
        let s_len_offset = s_type_offset + 1;
        if s_type_offset >= sig_len {
            return Err(encoding_error("malformed signature: S type indicator missing"));
        }
        if s_len_offset >= sig_len {
            return Err(encoding_error("malformed signature: S length missing"));
        }

        let s_offset = s_len_offset + 1;
        let s_len = sig[s_len_offset] as usize;
        if s_offset + s_len != sig_len {
            return Err(encoding_error("malformed signature: invalid S length"));
        }

        if sig[2] != 0x02 {
            return Err(encoding_error(format!(
                "malformed signature: R integer marker: {:#x} != 0x02",
                sig[2]
            )));
        }
        if r_len == 0 {
            return Err(encoding_error("malformed signature: R length is zero"));
        }
        if sig[4] & 0x80 != 0 {
            return Err(encoding_error("malformed signature: R is negative"));
        }
        if r_len > 1 && sig[4] == 0x00 && sig[5] & 0x80 == 0 {
            return Err(encoding_error("malformed signature: R value has too much padding"));
        }

        if sig[s_type_offset] != 0x02 {
            return Err(encoding_error(format!(
                "malformed signature: S integer marker: {:#x} != 0x02",
                sig[s_type_offset]
            )));
        }
        if s_len == 0 {
            return Err(encoding_error("malformed signature: S length is zero"));
        }
        if sig[s_offset] & 0x80 != 0 {
            return Err(encoding_error("malformed signature: S is negative"));
        }
        if s_len > 1 && sig[s_offset] == 0x00 && sig[s_offset + 1] & 0x80 == 0 {
            return Err(encoding_error("malformed signature: S value has too much padding"));
        }

        if self.has_flag(ScriptFlags::VERIFY_LOW_S) {
            let half_order = BigInt::from_bytes_be(Sign::Plus, &HALF_ORDER);
            let s_value = BigInt::from_bytes_be(Sign::Plus, &sig[s_offset..s_offset + s_len]);
            if s_value > half_order {
                return Err(encoding_error(
                    "signature is not canonical due to unnecessarily high S value",
                ));
            }
        }

        Ok(())
    }
}
