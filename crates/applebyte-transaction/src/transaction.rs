//! The transaction container and its wire codec.
//!
//! Consensus checks on a parsed transaction are in [`crate::verify`]; the
//! legacy signature hash is in [`crate::sighash`].

use std::fmt;

use applebyte_primitives::hash::sha256d;
use applebyte_primitives::wire::{VarInt, WireReader, WireWriter};
use applebyte_primitives::PrimitivesError;

use crate::input::TransactionInput;
use crate::output::TransactionOutput;
use crate::sighash;
use crate::TransactionError;

/// A transaction: a version, inputs, outputs and a lock time.
///
/// Serialized as `version:u32le | varint n | inputs | varint m | outputs |
/// lock_time:u32le`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub version: u32,
    pub inputs: Vec<TransactionInput>,
    pub outputs: Vec<TransactionOutput>,
    pub lock_time: u32,
}

/// Tag a low-level read failure with the field being read.
fn reading<T>(field: &str, result: Result<T, PrimitivesError>) -> Result<T, TransactionError> {
    result.map_err(|e| TransactionError::SerializationError(format!("reading {}: {}", field, e)))
}

impl Transaction {
    /// Version 1, no inputs or outputs, lock time 0.
    pub fn new() -> Self {
        Transaction {
            version: 1,
            inputs: Vec::new(),
            outputs: Vec::new(),
            lock_time: 0,
        }
    }

    pub fn from_hex(hex_str: &str) -> Result<Self, TransactionError> {
        let bytes = hex::decode(hex_str)
            .map_err(|e| TransactionError::SerializationError(format!("invalid hex: {}", e)))?;
        Self::from_bytes(&bytes)
    }

    /// Parse exactly one transaction; leftover bytes are an error.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TransactionError> {
        let mut reader = WireReader::new(bytes);
        let tx = Self::read_from(&mut reader)?;
        match reader.remaining() {
            0 => Ok(tx),
            extra => Err(TransactionError::SerializationError(format!(
                "trailing {} bytes after transaction",
                extra
            ))),
        }
    }

    pub fn read_from(reader: &mut WireReader) -> Result<Self, TransactionError> {
        let version = reading("version", reader.read_u32_le())?;

        let n_inputs = reading("input count", reader.read_length())?;
        let inputs = (0..n_inputs)
            .map(|_| TransactionInput::read_from(reader))
            .collect::<Result<Vec<_>, _>>()?;

        let n_outputs = reading("output count", reader.read_length())?;
        let outputs = (0..n_outputs)
            .map(|_| TransactionOutput::read_from(reader))
            .collect::<Result<Vec<_>, _>>()?;

        let lock_time = reading("lock time", reader.read_u32_le())?;
        Ok(Transaction {
            version,
            inputs,
            outputs,
            lock_time,
        })
    }

    pub fn write_to(&self, writer: &mut WireWriter) {
        writer.write_u32_le(self.version);
        writer.write_varint(VarInt::from(self.inputs.len()));
        self.inputs.iter().for_each(|input| input.write_to(writer));
        writer.write_varint(VarInt::from(self.outputs.len()));
        self.outputs.iter().for_each(|output| output.write_to(writer));
        writer.write_u32_le(self.lock_time);
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = WireWriter::with_capacity(256);
        self.write_to(&mut writer);
        writer.into_bytes()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    pub fn size(&self) -> usize {
        self.to_bytes().len()
    }

    /// Double SHA-256 of the encoding, in internal byte order.
    pub fn tx_id(&self) -> [u8; 32] {
        sha256d(&self.to_bytes())
    }

    /// The id as block explorers print it, byte-reversed.
    pub fn tx_id_hex(&self) -> String {
        let mut id = self.tx_id();
        id.reverse();
        hex::encode(id)
    }

    pub fn add_input(&mut self, input: TransactionInput) {
        self.inputs.push(input);
    }

    pub fn add_output(&mut self, output: TransactionOutput) {
        self.outputs.push(output);
    }

    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }

    /// Sum of output values; `None` on u64 overflow.
    pub fn total_output_value(&self) -> Option<u64> {
        self.outputs
            .iter()
            .try_fold(0u64, |sum, output| sum.checked_add(output.value))
    }

    /// One input, and it spends the null outpoint.
    pub fn is_coinbase(&self) -> bool {
        matches!(self.inputs.as_slice(), [only] if only.outpoint.is_null())
    }

    /// Shorthand for [`sighash::signature_hash`] on this transaction.
    pub fn signature_hash(&self, input_index: usize, script_code: &[u8], hash_type: u32) -> [u8; 32] {
        sighash::signature_hash(self, input_index, script_code, hash_type)
    }
}

impl Default for Transaction {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
