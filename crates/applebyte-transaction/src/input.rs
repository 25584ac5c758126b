//! Transaction input: the outpoint it spends, its spending script and its
//! sequence number.

use std::fmt;

use applebyte_primitives::wire::{WireReader, WireWriter};
use applebyte_script::Script;

use crate::TransactionError;

/// Sequence number of an input that opts out of replacement.
pub const DEFAULT_SEQUENCE_NUMBER: u32 = 0xFFFF_FFFF;

/// Output index used by the null outpoint of a coinbase input.
pub const NULL_INDEX: u32 = 0xFFFF_FFFF;

/// Reference to an output of an earlier transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct OutPoint {
    /// Transaction id in internal (little-endian) byte order.
    pub hash: [u8; 32],
    pub index: u32,
}

impl OutPoint {
    pub fn new(hash: [u8; 32], index: u32) -> Self {
        OutPoint { hash, index }
    }

    /// The outpoint carried by a coinbase input.
    pub fn null() -> Self {
        OutPoint { hash: [0u8; 32], index: NULL_INDEX }
    }

    pub fn is_null(&self) -> bool {
        self.hash == [0u8; 32] && self.index == NULL_INDEX
    }

    /// The transaction id in display (big-endian) order.
    pub fn txid_hex(&self) -> String {
        let mut id = self.hash;
        id.reverse();
        hex::encode(id)
    }
}

impl fmt::Display for OutPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.txid_hex(), self.index)
    }
}

/// A single input in a transaction.
///
/// # Wire format
///
/// | Field          | Size           |
/// |----------------|----------------|
/// | outpoint hash  | 32 bytes       |
/// | outpoint index | 4 bytes (LE)   |
/// | script length  | VarInt         |
/// | script_sig     | variable       |
/// | sequence       | 4 bytes (LE)   |
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionInput {
    pub outpoint: OutPoint,
    /// The spending script. Empty until the input is signed.
    pub script_sig: Script,
    pub sequence: u32,
}

impl TransactionInput {
    /// An unsigned input spending `outpoint`.
    pub fn new(outpoint: OutPoint) -> Self {
        TransactionInput {
            outpoint,
            script_sig: Script::new(),
            sequence: DEFAULT_SEQUENCE_NUMBER,
        }
    }

    pub fn with_script_sig(outpoint: OutPoint, script_sig: Script) -> Self {
        TransactionInput {
            outpoint,
            script_sig,
            sequence: DEFAULT_SEQUENCE_NUMBER,
        }
    }

    /// Deserialize an input from a `WireReader`.
    pub fn read_from(reader: &mut WireReader) -> Result<Self, TransactionError> {
        let hash = reader.read_array::<32>().map_err(|e| {
            TransactionError::SerializationError(format!("reading outpoint hash: {}", e))
        })?;

        let index = reader.read_u32_le().map_err(|e| {
            TransactionError::SerializationError(format!("reading outpoint index: {}", e))
        })?;

        let script_bytes = reader.read_var_bytes().map_err(|e| {
            TransactionError::SerializationError(format!("reading script sig: {}", e))
        })?;

        let sequence = reader.read_u32_le().map_err(|e| {
            TransactionError::SerializationError(format!("reading sequence number: {}", e))
        })?;

        Ok(TransactionInput {
            outpoint: OutPoint { hash, index },
            script_sig: Script::from_bytes(script_bytes),
            sequence,
        })
    }

    /// Serialize this input into a `WireWriter`.
    pub fn write_to(&self, writer: &mut WireWriter) {
        self.write_with(writer, self.script_sig.to_bytes(), self.sequence);
    }

    /// Serialize with a substituted script and sequence, as signature
    /// hashing does.
    pub(crate) fn write_with(&self, writer: &mut WireWriter, script: &[u8], sequence: u32) {
        writer.write_bytes(&self.outpoint.hash);
        writer.write_u32_le(self.outpoint.index);
        writer.write_var_bytes(script);
        writer.write_u32_le(sequence);
    }
}
