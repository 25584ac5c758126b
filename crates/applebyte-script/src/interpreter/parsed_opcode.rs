//! Parsed opcode representation and script parser.

use crate::chunk::decode_with_offsets;
use crate::opcodes::*;
use crate::Script;
use super::error::{InterpreterError, InterpreterErrorCode};

/// A parsed opcode with its data payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedOpcode {
    /// The opcode byte value. For direct pushes this is the push length.
    pub opcode: u8,
    /// The data payload associated with push opcodes (empty for non-push opcodes).
    pub data: Vec<u8>,
    /// Byte offset of the opcode within its script.
    pub offset: usize,
}

impl ParsedOpcode {
    /// Return the human-readable name of this opcode.
    pub fn name(&self) -> String {
        opcode_to_string(self.opcode)
    }

    /// Opcodes that fail a script merely by appearing in it, executed or not.
    pub fn is_disabled(&self) -> bool {
        matches!(
            self.opcode,
            OP_CAT
                | OP_SUBSTR
                | OP_LEFT
                | OP_RIGHT
                | OP_INVERT
                | OP_AND
                | OP_OR
                | OP_XOR
                | OP_2MUL
                | OP_2DIV
                | OP_MUL
                | OP_DIV
                | OP_MOD
                | OP_LSHIFT
                | OP_RSHIFT
        )
    }

    /// OP_VERIF and OP_VERNOTIF fail even inside an unexecuted branch.
    pub fn always_illegal(&self) -> bool {
        matches!(self.opcode, OP_VERIF | OP_VERNOTIF)
    }

    /// Return true if this opcode is a conditional flow control opcode.
    pub fn is_conditional(&self) -> bool {
        matches!(self.opcode, OP_IF | OP_NOTIF | OP_ELSE | OP_ENDIF)
    }

    pub fn is_push(&self) -> bool {
        self.opcode <= OP_16
    }

    /// Check that a data push uses the shortest form for its payload.
    /// Opcodes above OP_PUSHDATA4 always pass.
    pub fn enforce_minimum_data_push(&self) -> Result<(), InterpreterError> {
        if self.opcode > OP_PUSHDATA4 {
            return Ok(());
        }
        let data_len = self.data.len();
        let expected = if data_len == 0 {
            OP_0
        } else if data_len == 1 && (1..=16).contains(&self.data[0]) {
            OP_1 + self.data[0] - 1
        } else if data_len == 1 && self.data[0] == 0x81 {
            OP_1NEGATE
        } else if data_len <= 75 {
            data_len as u8
        } else if data_len <= 255 {
            OP_PUSHDATA1
        } else if data_len <= 65535 {
            OP_PUSHDATA2
        } else {
            OP_PUSHDATA4
        };
        if self.opcode != expected {
            return Err(InterpreterError::new(
                InterpreterErrorCode::PolicyViolation,
                format!(
                    "data push of {} bytes encoded with opcode {} instead of {}",
                    data_len,
                    self.name(),
                    opcode_to_string(expected)
                ),
            ));
        }
        Ok(())
    }

    /// Serialize back to script bytes, in the push form it was parsed with.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = vec![self.opcode];
        match self.opcode {
            OP_DATA_1..=OP_DATA_75 => {}
            OP_PUSHDATA1 => out.push(self.data.len() as u8),
            OP_PUSHDATA2 => out.extend_from_slice(&(self.data.len() as u16).to_le_bytes()),
            OP_PUSHDATA4 => out.extend_from_slice(&(self.data.len() as u32).to_le_bytes()),
            _ => return out,
        }
        out.extend_from_slice(&self.data);
        out
    }
}

/// A parsed script is a sequence of parsed opcodes.
pub type ParsedScript = Vec<ParsedOpcode>;

/// Check if a parsed script is push-only.
pub fn is_push_only(script: &ParsedScript) -> bool {
    script.iter().all(ParsedOpcode::is_push)
}

/// Remove every opcode whose serialized form equals `encoded`.
pub fn remove_encoded(script: &ParsedScript, encoded: &[u8]) -> ParsedScript {
    script
        .iter()
        .filter(|pop| pop.to_bytes() != encoded)
        .cloned()
        .collect()
}

/// Remove all occurrences of a specific opcode.
pub fn remove_opcode(script: &ParsedScript, opcode: u8) -> ParsedScript {
    script
        .iter()
        .filter(|pop| pop.opcode != opcode)
        .cloned()
        .collect()
}

/// Unparse a ParsedScript back to a Script.
pub fn unparse(pscript: &ParsedScript) -> Script {
    let bytes: Vec<u8> = pscript.iter().flat_map(ParsedOpcode::to_bytes).collect();
    Script::from(bytes)
}

/// Parse a Script into a ParsedScript.
///
/// Fails with `ScriptParse` when the script exceeds `max_script_size` or a
/// push runs past the end of the script.
pub fn parse_script(
    script: &Script,
    max_script_size: usize,
) -> Result<ParsedScript, InterpreterError> {
    let scr = script.to_bytes();
    if scr.len() > max_script_size {
        return Err(InterpreterError::new(
            InterpreterErrorCode::ScriptParse,
            format!(
                "script size {} is larger than the max allowed size {}",
                scr.len(),
                max_script_size
            ),
        ));
    }
    let chunks = decode_with_offsets(scr).map_err(|e| {
        InterpreterError::new(InterpreterErrorCode::ScriptParse, format!("malformed script: {}", e))
    })?;
    Ok(chunks
        .into_iter()
        .map(|(offset, chunk)| ParsedOpcode {
            opcode: chunk.op,
            data: chunk.data.unwrap_or_default(),
            offset,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_hex(s: &str) -> ParsedScript {
        parse_script(&Script::from_hex(s).unwrap(), 10_000).unwrap()
    }

    #[test]
    fn test_parse_offsets() {
        let parsed = parse_hex("76a91433e81a941e64cda12c6a299ed322ddbdd03f8d0e88ac");
        let offsets: Vec<usize> = parsed.iter().map(|p| p.offset).collect();
        assert_eq!(offsets, vec![0, 1, 2, 23, 24]);
        assert_eq!(parsed[2].data.len(), 20);
    }

    /// OP_RETURN does not swallow what follows it.
    #[test]
    fn test_op_return_is_single_opcode() {
        let parsed = parse_hex("6a0102");
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].opcode, OP_RETURN);
        assert!(parsed[0].data.is_empty());
    }

    #[test]
    fn test_parse_errors() {
        let err = parse_script(&Script::from_hex("4c05ff").unwrap(), 10_000).unwrap_err();
        assert_eq!(err.code, InterpreterErrorCode::ScriptParse);
        let err = parse_script(&Script::from_bytes(&[OP_NOP; 11]), 10).unwrap_err();
        assert_eq!(err.code, InterpreterErrorCode::ScriptParse);
    }

    #[test]
    fn test_unparse_keeps_push_form() {
        for hex_str in ["4c0107", "4d0100ff", "4e01000000ff", "0002aabb51ac"] {
            assert_eq!(unparse(&parse_hex(hex_str)).to_hex(), hex_str);
        }
    }

    #[test]
    fn test_enforce_minimum_data_push() {
        let cases = [
            ("0101", false),
            ("51", true),
            ("0181", false),
            ("4f", true),
            ("4c0107", false),
            ("4c00", false),
            ("00", true),
            ("0111", true),
            ("03aabbcc", true),
        ];
        for (hex_str, minimal) in cases {
            let pop = &parse_hex(hex_str)[0];
            assert_eq!(pop.enforce_minimum_data_push().is_ok(), minimal, "{}", hex_str);
        }
    }

    #[test]
    fn test_remove_encoded() {
        let parsed = parse_hex("02aabb4c02aabb02aabbac");
        let stripped = remove_encoded(&parsed, &[0x02, 0xaa, 0xbb]);
        assert_eq!(unparse(&stripped).to_hex(), "4c02aabbac");
        assert_eq!(unparse(&remove_opcode(&parsed, OP_CHECKSIG)).to_hex(), "02aabb4c02aabb02aabb");
    }
}
