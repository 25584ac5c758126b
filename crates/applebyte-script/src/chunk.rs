//! Script chunk parsing and encoding.
//!
//! A chunk is either a bare opcode or a data push together with the push
//! form that encoded it. Keeping the form (direct length byte,
//! OP_PUSHDATA1/2/4) means concatenating `to_bytes()` over the decoded
//! chunks reproduces the original script byte for byte.

use crate::opcodes::*;
use crate::ScriptError;

/// One parsed element of a script.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptChunk {
    /// The opcode byte. For direct pushes (1-75 bytes) this is the length.
    pub op: u8,
    /// The pushed bytes, present only for push forms 0x01..=OP_PUSHDATA4.
    pub data: Option<Vec<u8>>,
}

impl ScriptChunk {
    /// A bare opcode chunk.
    pub fn opcode(op: u8) -> Self {
        ScriptChunk { op, data: None }
    }

    /// A push of `data` using the smallest push form.
    pub fn push(data: &[u8]) -> Self {
        let op = match data.len() {
            0 => return ScriptChunk::opcode(OP_0),
            n @ 1..=75 => n as u8,
            76..=0xff => OP_PUSHDATA1,
            0x100..=0xffff => OP_PUSHDATA2,
            _ => OP_PUSHDATA4,
        };
        ScriptChunk { op, data: Some(data.to_vec()) }
    }

    /// True for OP_0, the push forms, OP_1NEGATE, OP_RESERVED and OP_1..OP_16.
    pub fn is_push_data(&self) -> bool {
        is_push_opcode(self.op)
    }

    /// True when this is the bare opcode `op`.
    pub fn is_opcode(&self, op: u8) -> bool {
        self.data.is_none() && self.op == op
    }

    /// The pushed bytes, or an empty slice for bare opcodes.
    pub fn data_bytes(&self) -> &[u8] {
        self.data.as_deref().unwrap_or(&[])
    }

    /// Serialize this chunk using the push form it was decoded with.
    pub fn to_bytes(&self) -> Vec<u8> {
        let data = match &self.data {
            Some(d) => d,
            None => return vec![self.op],
        };
        let mut out = Vec::with_capacity(data.len() + 5);
        out.push(self.op);
        match self.op {
            OP_PUSHDATA1 => out.push(data.len() as u8),
            OP_PUSHDATA2 => out.extend_from_slice(&(data.len() as u16).to_le_bytes()),
            OP_PUSHDATA4 => out.extend_from_slice(&(data.len() as u32).to_le_bytes()),
            _ => {}
        }
        out.extend_from_slice(data);
        out
    }

    /// Render for ASM output: pushes as hex, opcodes by name.
    pub fn to_asm_string(&self) -> String {
        match &self.data {
            Some(data) => hex::encode(data),
            None if self.op == OP_0 => "0".to_string(),
            None => opcode_to_string(self.op),
        }
    }
}

/// Decode raw script bytes into chunks.
///
/// # Returns
/// The chunks in order, or `DataTooSmall` when a push runs past the end.
pub fn decode_script(bytes: &[u8]) -> Result<Vec<ScriptChunk>, ScriptError> {
    Ok(decode_with_offsets(bytes)?.into_iter().map(|(_, c)| c).collect())
}

/// Decode raw script bytes, pairing every chunk with its byte offset.
pub fn decode_with_offsets(bytes: &[u8]) -> Result<Vec<(usize, ScriptChunk)>, ScriptError> {
    let mut chunks = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let start = pos;
        let op = bytes[pos];
        pos += 1;

        let length = match op {
            0x01..=0x4b => op as usize,
            OP_PUSHDATA1 => read_len(bytes, &mut pos, 1)?,
            OP_PUSHDATA2 => read_len(bytes, &mut pos, 2)?,
            OP_PUSHDATA4 => read_len(bytes, &mut pos, 4)?,
            _ => {
                chunks.push((start, ScriptChunk::opcode(op)));
                continue;
            }
        };

        if bytes.len() - pos < length {
            return Err(ScriptError::DataTooSmall);
        }
        let data = bytes[pos..pos + length].to_vec();
        pos += length;
        chunks.push((start, ScriptChunk { op, data: Some(data) }));
    }

    Ok(chunks)
}

/// Read a little-endian length of `width` bytes.
fn read_len(bytes: &[u8], pos: &mut usize, width: usize) -> Result<usize, ScriptError> {
    if bytes.len() - *pos < width {
        return Err(ScriptError::DataTooSmall);
    }
    let mut buf = [0u8; 4];
    buf[..width].copy_from_slice(&bytes[*pos..*pos + width]);
    *pos += width;
    Ok(u32::from_le_bytes(buf) as usize)
}

/// Parse `length` bytes of `buf` starting at `offset`.
///
/// # Returns
/// `IndexOutOfRange` if the range is outside `buf`, `ScriptTooLarge` if
/// `length` exceeds `max_script_size`, otherwise the decoded chunks.
pub fn parse_chunks(
    buf: &[u8],
    offset: usize,
    length: usize,
    max_script_size: usize,
) -> Result<Vec<ScriptChunk>, ScriptError> {
    let end = offset.checked_add(length).ok_or(ScriptError::IndexOutOfRange)?;
    if end > buf.len() {
        return Err(ScriptError::IndexOutOfRange);
    }
    if length > max_script_size {
        return Err(ScriptError::ScriptTooLarge(length));
    }
    decode_script(&buf[offset..end])
}

/// Concatenate the serialized form of every chunk.
pub fn encode_chunks(chunks: &[ScriptChunk]) -> Vec<u8> {
    chunks.iter().flat_map(|c| c.to_bytes()).collect()
}

/// The smallest push prefix for a payload of `data_len` bytes.
///
/// A zero-length payload gets the direct push byte `0x00`, which is OP_0.
pub fn push_data_prefix(data_len: usize) -> Result<Vec<u8>, ScriptError> {
    if data_len <= 75 {
        Ok(vec![data_len as u8])
    } else if data_len <= 0xFF {
        Ok(vec![OP_PUSHDATA1, data_len as u8])
    } else if data_len <= 0xFFFF {
        let mut buf = vec![OP_PUSHDATA2];
        buf.extend_from_slice(&(data_len as u16).to_le_bytes());
        Ok(buf)
    } else if data_len <= 0xFFFF_FFFF {
        let mut buf = vec![OP_PUSHDATA4];
        buf.extend_from_slice(&(data_len as u32).to_le_bytes());
        Ok(buf)
    } else {
        Err(ScriptError::DataTooBig)
    }
}

/// Encode several payloads as consecutive pushes.
pub fn encode_push_datas(parts: &[&[u8]]) -> Result<Vec<u8>, ScriptError> {
    let mut result = Vec::new();
    for (i, part) in parts.iter().enumerate() {
        let prefix = push_data_prefix(part.len()).map_err(|_| ScriptError::PartTooBig(i))?;
        result.extend_from_slice(&prefix);
        result.extend_from_slice(part);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    // -----------------------------------------------------------------------
    // decode_script
    // -----------------------------------------------------------------------

    #[test]
    fn test_decode_script_simple() {
        let bytes = hex::decode("05000102030401FF02ABCD").unwrap();
        let parts = decode_script(&bytes).unwrap();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[1].data.as_deref(), Some(&[0xff][..]));
    }

    #[test]
    fn test_decode_script_empty() {
        assert!(decode_script(&[]).unwrap().is_empty());
    }

    /// Two OP_PUSHDATA1 pushes inside a 2-of-2 multisig template.
    #[test]
    fn test_decode_script_complex() {
        let script_hex = "524c53ff0488b21e000000000000000000362f7a9030543db8751401c387d6a71e870f1895b3a62569d455e8ee5f5f5e5f03036624c6df96984db6b4e625b6707c017eb0e0d137cd13a0c989bfa77a4473fd000000004c53ff0488b21e0000000000000000008b20425398995f3c866ea6ce5c1828a516b007379cf97b136bffbdc86f75df14036454bad23b019eae34f10aff8b8d6d8deb18cb31354e5a169ee09d8a4560e8250000000052ae";
        let bytes = hex::decode(script_hex).unwrap();
        let parts = decode_script(&bytes).unwrap();
        assert_eq!(parts.len(), 5);
        assert_eq!(parts[1].op, OP_PUSHDATA1);
        assert_eq!(encode_chunks(&parts), bytes);
    }

    /// OP_RETURN is an ordinary opcode; what follows is parsed normally.
    #[test]
    fn test_op_return_does_not_swallow_rest() {
        let bytes = vec![OP_RETURN, 0x02, 0xaa, 0xbb, OP_DUP];
        let parts = decode_script(&bytes).unwrap();
        assert_eq!(parts.len(), 3);
        assert!(parts[0].is_opcode(OP_RETURN));
        assert_eq!(parts[1].data_bytes(), &[0xaa, 0xbb]);
        assert!(parts[2].is_opcode(OP_DUP));
    }

    /// Non-minimal push forms survive a decode/encode round trip.
    #[test]
    fn test_non_minimal_forms_round_trip() {
        let bytes = vec![
            OP_PUSHDATA1, 0x01, 0x07,
            OP_PUSHDATA2, 0x02, 0x00, 0xaa, 0xbb,
            OP_PUSHDATA4, 0x00, 0x00, 0x00, 0x00,
        ];
        let parts = decode_script(&bytes).unwrap();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].op, OP_PUSHDATA1);
        assert_eq!(parts[1].op, OP_PUSHDATA2);
        assert_eq!(parts[2].op, OP_PUSHDATA4);
        assert_eq!(encode_chunks(&parts), bytes);
    }

    #[test]
    fn test_decode_offsets() {
        let bytes = vec![OP_DUP, 0x02, 0x01, 0x02, OP_PUSHDATA1, 0x00, OP_CHECKSIG];
        let offsets: Vec<usize> = decode_with_offsets(&bytes)
            .unwrap()
            .into_iter()
            .map(|(o, _)| o)
            .collect();
        assert_eq!(offsets, vec![0, 1, 4, 6]);
    }

    // -----------------------------------------------------------------------
    // Truncation
    // -----------------------------------------------------------------------

    #[test]
    fn test_decode_script_truncated_pushes() {
        for hex_str in ["05000000", "4c05000000", "4c", "4d", "4d01", "4e", "4e050000"] {
            let bytes = hex::decode(hex_str).unwrap();
            assert!(
                matches!(decode_script(&bytes), Err(ScriptError::DataTooSmall)),
                "{} should be truncated",
                hex_str
            );
        }
    }

    // -----------------------------------------------------------------------
    // parse_chunks
    // -----------------------------------------------------------------------

    #[test]
    fn test_parse_chunks_sub_range() {
        let bytes = vec![0xff, OP_1, OP_DUP, 0xff];
        let parts = parse_chunks(&bytes, 1, 2, 10_000).unwrap();
        assert_eq!(parts, vec![ScriptChunk::opcode(OP_1), ScriptChunk::opcode(OP_DUP)]);
        assert!(matches!(parse_chunks(&bytes, 3, 2, 10_000), Err(ScriptError::IndexOutOfRange)));
    }

    #[test]
    fn test_parse_chunks_size_limit() {
        let bytes = vec![OP_NOP; 10_001];
        assert!(parse_chunks(&bytes, 0, 10_000, 10_000).is_ok());
        assert!(matches!(
            parse_chunks(&bytes, 0, 10_001, 10_000),
            Err(ScriptError::ScriptTooLarge(10_001))
        ));
    }

    // -----------------------------------------------------------------------
    // Push encoding
    // -----------------------------------------------------------------------

    #[test]
    fn test_push_data_prefix_boundaries() {
        assert_eq!(push_data_prefix(0).unwrap(), vec![0]);
        assert_eq!(push_data_prefix(75).unwrap(), vec![75]);
        assert_eq!(push_data_prefix(76).unwrap(), vec![OP_PUSHDATA1, 76]);
        assert_eq!(push_data_prefix(255).unwrap(), vec![OP_PUSHDATA1, 255]);
        assert_eq!(push_data_prefix(256).unwrap(), vec![OP_PUSHDATA2, 0x00, 0x01]);
        assert_eq!(push_data_prefix(65535).unwrap(), vec![OP_PUSHDATA2, 0xff, 0xff]);
        assert_eq!(push_data_prefix(65536).unwrap(), vec![OP_PUSHDATA4, 0x00, 0x00, 0x01, 0x00]);
    }

    #[test]
    fn test_encode_push_datas_multiple() {
        let parts: Vec<&[u8]> = vec![b"hello", b"world"];
        let encoded = encode_push_datas(&parts).unwrap();
        assert_eq!(hex::encode(encoded), "0568656c6c6f05776f726c64");
    }

    #[test]
    fn test_push_chunk_matches_prefix() {
        for len in [1usize, 75, 76, 255, 256, 520] {
            let data = vec![0x42; len];
            let chunk = ScriptChunk::push(&data);
            let mut expected = push_data_prefix(len).unwrap();
            expected.extend_from_slice(&data);
            assert_eq!(chunk.to_bytes(), expected, "len {}", len);
        }
        assert_eq!(ScriptChunk::push(&[]), ScriptChunk::opcode(OP_0));
    }

    // -----------------------------------------------------------------------
    // ASM
    // -----------------------------------------------------------------------

    #[test]
    fn test_chunk_to_asm_string() {
        let data = ScriptChunk { op: OP_DATA_20, data: Some(vec![0xAB; 20]) };
        assert_eq!(data.to_asm_string(), "ab".repeat(20));
        assert_eq!(ScriptChunk::opcode(OP_DUP).to_asm_string(), "OP_DUP");
        assert_eq!(ScriptChunk::opcode(OP_0).to_asm_string(), "0");
    }
}
