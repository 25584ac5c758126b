//! Script number codec.
//!
//! Numbers on the stack are little-endian byte strings with the sign in
//! the high bit of the last byte. The empty string is zero. Operands are
//! limited to a few bytes, so every value an opcode can produce fits an
//! `i64`; results may be longer than an operand and stay valid as long as
//! they are not read back as numbers.

use super::error::{InterpreterError, InterpreterErrorCode};

/// A decoded script number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ScriptNumber(i64);

impl ScriptNumber {
    pub fn new(val: i64) -> Self {
        ScriptNumber(val)
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    /// Decode a stack item as a number.
    ///
    /// Fails with `NumericOverflow` when `bb` is longer than `max_len`
    /// bytes, and with `PolicyViolation` when `require_minimal` is set and
    /// the encoding has redundant trailing bytes.
    pub fn from_bytes(
        bb: &[u8],
        max_len: usize,
        require_minimal: bool,
    ) -> Result<Self, InterpreterError> {
        if bb.len() > max_len || bb.len() > 8 {
            return Err(InterpreterError::new(
                InterpreterErrorCode::NumericOverflow,
                format!(
                    "numeric value encoded as {} is {} bytes which exceeds the max allowed of {}",
                    hex::encode(bb),
                    bb.len(),
                    max_len.min(8)
                ),
            ));
        }

        if require_minimal {
            check_minimal_data_encoding(bb)?;
        }

        let last = match bb.last() {
            Some(&b) => b,
            None => return Ok(ScriptNumber(0)),
        };

        let mut magnitude: u64 = 0;
        for (i, &b) in bb.iter().enumerate() {
            magnitude |= (b as u64) << (8 * i);
        }
        let sign_bit = 0x80u64 << (8 * (bb.len() - 1));
        if last & 0x80 != 0 {
            Ok(ScriptNumber(-((magnitude & !sign_bit) as i64)))
        } else {
            Ok(ScriptNumber(magnitude as i64))
        }
    }

    /// Minimal encoding: zero is empty, otherwise little-endian magnitude
    /// with a sign bit, adding a byte when the top bit is taken.
    pub fn to_bytes(&self) -> Vec<u8> {
        if self.0 == 0 {
            return Vec::new();
        }
        let negative = self.0 < 0;
        let mut abs = self.0.unsigned_abs();
        let mut result = Vec::with_capacity(9);
        while abs > 0 {
            result.push((abs & 0xff) as u8);
            abs >>= 8;
        }

        let last = result.len() - 1;
        if result[last] & 0x80 != 0 {
            result.push(if negative { 0x80 } else { 0x00 });
        } else if negative {
            result[last] |= 0x80;
        }
        result
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: ScriptNumber) -> Option<ScriptNumber> {
        self.0.checked_add(other.0).map(ScriptNumber)
    }

    pub fn checked_sub(self, other: ScriptNumber) -> Option<ScriptNumber> {
        self.0.checked_sub(other.0).map(ScriptNumber)
    }

    pub fn checked_neg(self) -> Option<ScriptNumber> {
        self.0.checked_neg().map(ScriptNumber)
    }

    pub fn checked_abs(self) -> Option<ScriptNumber> {
        self.0.checked_abs().map(ScriptNumber)
    }
}

impl From<i64> for ScriptNumber {
    fn from(val: i64) -> Self {
        ScriptNumber(val)
    }
}

/// Check that a byte array uses minimal number encoding.
pub fn check_minimal_data_encoding(v: &[u8]) -> Result<(), InterpreterError> {
    if v.is_empty() {
        return Ok(());
    }

    if v[v.len() - 1] & 0x7f == 0 && (v.len() == 1 || v[v.len() - 2] & 0x80 == 0) {
        return Err(InterpreterError::new(
            InterpreterErrorCode::PolicyViolation,
            format!("numeric value encoded as {} is not minimally encoded", hex::encode(v)),
        ));
    }

    Ok(())
}
