//! Legacy signature hash computation.
//!
//! Computes the digest an input's ECDSA signature commits to: a modified
//! copy of the transaction, serialized with the hash type appended, then
//! double-SHA-256'd.

use applebyte_primitives::hash::sha256d;
use applebyte_primitives::wire::{VarInt, WireWriter};
use applebyte_script::opcodes::OP_CODESEPARATOR;
use applebyte_script::{Script, ScriptChunk};
use tracing::debug;

use crate::transaction::Transaction;
use crate::TransactionError;

// -----------------------------------------------------------------------
// Sighash flag constants
// -----------------------------------------------------------------------

/// Sign all inputs and all outputs (the default).
pub const SIGHASH_ALL: u32 = 0x01;

/// Sign all inputs but no outputs, allowing outputs to be modified.
pub const SIGHASH_NONE: u32 = 0x02;

/// Sign all inputs and only the output with the same index as the signed input.
pub const SIGHASH_SINGLE: u32 = 0x03;

/// Combined with another flag: only sign the current input, allowing other
/// inputs to be added later.
pub const SIGHASH_ANYONECANPAY: u32 = 0x80;

/// Mask applied to extract the base sighash type (ALL, NONE, SINGLE).
pub const SIGHASH_MASK: u32 = 0x1f;

/// Digest returned when there is nothing to sign: the value 1 as a
/// little-endian 256-bit integer.
pub const SIGHASH_ONE: [u8; 32] = {
    let mut one = [0u8; 32];
    one[0] = 1;
    one
};

/// Compute the legacy signature hash for input `input_index`.
///
/// `script_code` is the script being satisfied (from the last executed
/// OP_CODESEPARATOR on); any separators still in it are removed.
///
/// If `input_index` is past the last input, or the hash type is SINGLE and
/// there is no output at `input_index`, the result is [`SIGHASH_ONE`].
/// Signatures over that value are accepted by consensus.
pub fn signature_hash(
    tx: &Transaction,
    input_index: usize,
    script_code: &[u8],
    hash_type: u32,
) -> [u8; 32] {
    match calc_preimage(tx, input_index, script_code, hash_type) {
        Ok(preimage) => sha256d(&preimage),
        Err(e) => {
            debug!(input = input_index, hash_type, reason = %e, "signature hash has no preimage, using one");
            SIGHASH_ONE
        }
    }
}

/// The bytes hashed by [`signature_hash`].
///
/// Fails in exactly the cases where the digest is [`SIGHASH_ONE`].
pub fn calc_preimage(
    tx: &Transaction,
    input_index: usize,
    script_code: &[u8],
    hash_type: u32,
) -> Result<Vec<u8>, TransactionError> {
    if input_index >= tx.inputs.len() {
        return Err(TransactionError::InvalidTransaction(format!(
            "input index {} out of range (tx has {} inputs)",
            input_index,
            tx.inputs.len()
        )));
    }

    let base_type = hash_type & SIGHASH_MASK;
    let anyone_can_pay = hash_type & SIGHASH_ANYONECANPAY != 0;

    if base_type == SIGHASH_SINGLE && input_index >= tx.outputs.len() {
        return Err(TransactionError::InvalidTransaction(format!(
            "SIGHASH_SINGLE input {} has no matching output (tx has {} outputs)",
            input_index,
            tx.outputs.len()
        )));
    }

    let script_code = strip_code_separators(script_code);
    // Other inputs keep their sequence only when every output is signed.
    let zero_other_sequences = base_type == SIGHASH_NONE || base_type == SIGHASH_SINGLE;

    let mut writer = WireWriter::with_capacity(256);
    writer.write_u32_le(tx.version);

    // Inputs
    if anyone_can_pay {
        writer.write_varint(VarInt::from(1usize));
        let input = &tx.inputs[input_index];
        input.write_with(&mut writer, &script_code, input.sequence);
    } else {
        writer.write_varint(VarInt::from(tx.inputs.len()));
        for (i, input) in tx.inputs.iter().enumerate() {
            if i == input_index {
                input.write_with(&mut writer, &script_code, input.sequence);
            } else {
                let sequence = if zero_other_sequences { 0 } else { input.sequence };
                input.write_with(&mut writer, &[], sequence);
            }
        }
    }

    // Outputs
    match base_type {
        SIGHASH_NONE => writer.write_varint(VarInt::from(0usize)),
        SIGHASH_SINGLE => {
            writer.write_varint(VarInt::from(input_index + 1));
            for _ in 0..input_index {
                writer.write_u64_le(u64::MAX);
                writer.write_var_bytes(&[]);
            }
            tx.outputs[input_index].write_to(&mut writer);
        }
        _ => {
            writer.write_varint(VarInt::from(tx.outputs.len()));
            for output in &tx.outputs {
                output.write_to(&mut writer);
            }
        }
    }

    writer.write_u32_le(tx.lock_time);
    writer.write_u32_le(hash_type);
    Ok(writer.into_bytes())
}

/// Drop every OP_CODESEPARATOR. Scripts that do not parse are used as-is.
fn strip_code_separators(script_code: &[u8]) -> Vec<u8> {
    match Script::from_bytes(script_code).chunks() {
        Ok(chunks) => chunks
            .iter()
            .filter(|c| !c.is_opcode(OP_CODESEPARATOR))
            .flat_map(ScriptChunk::to_bytes)
            .collect(),
        Err(_) => script_code.to_vec(),
    }
}
