//! The human-readable script notation used by the data-driven test corpora.
//!
//! Tokens are separated by whitespace:
//!
//! * a decimal number: `-1` and `1`..`16` become OP_1NEGATE/OP_N, anything
//!   else is pushed as a minimally encoded script number (`0` pushes the
//!   empty vector, which is OP_0)
//! * `0x` followed by hex: the bytes are inserted verbatim, not pushed
//! * `'text'`: the UTF-8 bytes are pushed
//! * an opcode name, with or without the `OP_` prefix

use crate::opcodes::string_to_opcode;
use crate::{Script, ScriptError};

/// Parse notation into a script.
///
/// The result is not validated; a `0x` token may well produce a truncated
/// push, which is what some invalid-script fixtures rely on.
pub fn parse_script_notation(notation: &str) -> Result<Script, ScriptError> {
    let mut script = Script::new();
    for word in notation.split_whitespace() {
        if is_decimal(word) {
            let value: i64 = word
                .parse()
                .map_err(|_| ScriptError::InvalidNotation(word.to_string()))?;
            script.append_number(value)?;
        } else if let Some(hex_str) = word.strip_prefix("0x") {
            let bytes = hex::decode(hex_str)
                .map_err(|_| ScriptError::InvalidNotation(word.to_string()))?;
            script.append_raw(&bytes);
        } else if word.len() >= 2 && word.starts_with('\'') && word.ends_with('\'') {
            script.append_push_data(word[1..word.len() - 1].as_bytes())?;
        } else if let Some(opcode) = string_to_opcode(word) {
            script.append_raw(&[opcode]);
        } else {
            return Err(ScriptError::InvalidNotation(word.to_string()));
        }
    }
    Ok(script)
}

fn is_decimal(word: &str) -> bool {
    let digits = word.strip_prefix('-').unwrap_or(word);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}
