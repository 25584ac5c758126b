//! The `Script` type: raw script bytes with builders, classifiers and
//! extraction helpers.
//!
//! Scripts are immutable once handed to the interpreter; the builder
//! methods exist for callers composing locking or spending scripts.

use std::fmt;

use crate::chunk::{decode_script, parse_chunks, push_data_prefix, ScriptChunk};
use crate::interpreter::scriptnum::ScriptNumber;
use crate::opcodes::*;
use crate::ScriptError;

/// Template a locking script follows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScriptType {
    /// `<pubkey> OP_CHECKSIG`
    PubKey,
    /// `OP_DUP OP_HASH160 <20 bytes> OP_EQUALVERIFY OP_CHECKSIG`
    PubKeyHash,
    /// `OP_HASH160 <20 bytes> OP_EQUAL`
    ScriptHash,
    /// `OP_m <pubkey>... OP_n OP_CHECKMULTISIG`
    MultiSig,
    NonStandard,
}

/// A script as its raw byte sequence.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Script(Vec<u8>);

impl Script {
    // -----------------------------------------------------------------------
    // Constructors
    // -----------------------------------------------------------------------

    pub fn new() -> Self {
        Script(Vec::new())
    }

    /// Decode a hex string into a script. No structural parsing happens here.
    pub fn from_hex(hex_str: &str) -> Result<Self, ScriptError> {
        let bytes = hex::decode(hex_str).map_err(|e| ScriptError::InvalidHex(e.to_string()))?;
        Ok(Script(bytes))
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        Script(bytes.to_vec())
    }

    /// Take `length` bytes of `buf` starting at `offset`, checking that they
    /// parse and fit within `max_script_size`.
    pub fn from_buffer(
        buf: &[u8],
        offset: usize,
        length: usize,
        max_script_size: usize,
    ) -> Result<Self, ScriptError> {
        parse_chunks(buf, offset, length, max_script_size)?;
        Ok(Script(buf[offset..offset + length].to_vec()))
    }

    /// Build a script from chunks, serializing each with its own push form.
    pub fn from_chunks(chunks: &[ScriptChunk]) -> Self {
        Script(crate::chunk::encode_chunks(chunks))
    }

    /// Parse a space-separated ASM string. `OP_`-prefixed names are emitted
    /// as opcodes, `0` is OP_0 and every other token is pushed as hex data.
    pub fn from_asm(asm: &str) -> Result<Self, ScriptError> {
        let mut script = Script::new();
        for token in asm.split_whitespace() {
            if token == "0" {
                script.0.push(OP_0);
            } else if token.starts_with("OP_") {
                let opcode = string_to_opcode(token)
                    .ok_or_else(|| ScriptError::InvalidNotation(token.to_string()))?;
                script.append_opcodes(&[opcode])?;
            } else {
                script.append_push_data_hex(token)?;
            }
        }
        Ok(script)
    }

    /// `OP_DUP OP_HASH160 <hash> OP_EQUALVERIFY OP_CHECKSIG`
    pub fn p2pkh_lock(pub_key_hash: &[u8; 20]) -> Self {
        let mut b = Vec::with_capacity(25);
        b.extend_from_slice(&[OP_DUP, OP_HASH160, OP_DATA_20]);
        b.extend_from_slice(pub_key_hash);
        b.extend_from_slice(&[OP_EQUALVERIFY, OP_CHECKSIG]);
        Script(b)
    }

    /// `OP_HASH160 <hash> OP_EQUAL`
    pub fn p2sh_lock(script_hash: &[u8; 20]) -> Self {
        let mut b = Vec::with_capacity(23);
        b.extend_from_slice(&[OP_HASH160, OP_DATA_20]);
        b.extend_from_slice(script_hash);
        b.push(OP_EQUAL);
        Script(b)
    }

    /// `<pubkey> OP_CHECKSIG`
    pub fn p2pk_lock(pub_key: &[u8]) -> Result<Self, ScriptError> {
        let mut script = Script::new();
        script.append_push_data(pub_key)?;
        script.0.push(OP_CHECKSIG);
        Ok(script)
    }

    /// `OP_m <pubkey>... OP_n OP_CHECKMULTISIG`, for 1 <= m <= n <= 16.
    pub fn multisig_lock(required: usize, pub_keys: &[Vec<u8>]) -> Result<Self, ScriptError> {
        let n = pub_keys.len();
        if required == 0 || required > n || n > 16 {
            return Err(ScriptError::InvalidNotation(format!(
                "bad multisig shape {} of {}",
                required, n
            )));
        }
        let mut script = Script::new();
        script.0.push(OP_1 + required as u8 - 1);
        for key in pub_keys {
            script.append_push_data(key)?;
        }
        script.0.push(OP_1 + n as u8 - 1);
        script.0.push(OP_CHECKMULTISIG);
        Ok(script)
    }

    // -----------------------------------------------------------------------
    // Serialization
    // -----------------------------------------------------------------------

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Render as ASM. An unparseable script renders as an empty string.
    pub fn to_asm(&self) -> String {
        match self.chunks() {
            Ok(chunks) => chunks
                .iter()
                .map(ScriptChunk::to_asm_string)
                .collect::<Vec<_>>()
                .join(" "),
            Err(_) => String::new(),
        }
    }

    pub fn to_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Decode into chunks.
    pub fn chunks(&self) -> Result<Vec<ScriptChunk>, ScriptError> {
        decode_script(&self.0)
    }

    // -----------------------------------------------------------------------
    // Classification
    // -----------------------------------------------------------------------

    /// Five chunks: DUP, HASH160, a 20-byte push, EQUALVERIFY, CHECKSIG.
    pub fn is_p2pkh(&self) -> bool {
        match self.chunks() {
            Ok(c) => {
                c.len() == 5
                    && c[0].is_opcode(OP_DUP)
                    && c[1].is_opcode(OP_HASH160)
                    && c[2].data.as_ref().map_or(false, |d| d.len() == 20)
                    && c[3].is_opcode(OP_EQUALVERIFY)
                    && c[4].is_opcode(OP_CHECKSIG)
            }
            Err(_) => false,
        }
    }

    /// A single push of a 33-byte (02/03) or 65-byte (04/06/07) key
    /// followed by OP_CHECKSIG.
    pub fn is_p2pk(&self) -> bool {
        let c = match self.chunks() {
            Ok(c) => c,
            Err(_) => return false,
        };
        if c.len() != 2 || !c[1].is_opcode(OP_CHECKSIG) {
            return false;
        }
        match c[0].data.as_deref() {
            Some(key) if key.len() == 65 => matches!(key[0], 0x04 | 0x06 | 0x07),
            Some(key) if key.len() == 33 => matches!(key[0], 0x02 | 0x03),
            _ => false,
        }
    }

    /// Exactly `a9 14 <20 bytes> 87`; any other encoding of the same
    /// chunks is not pay-to-script-hash.
    pub fn is_p2sh(&self) -> bool {
        let b = &self.0;
        b.len() == 23 && b[0] == OP_HASH160 && b[1] == OP_DATA_20 && b[22] == OP_EQUAL
    }

    /// `OP_m <key>... OP_n OP_CHECKMULTISIG` with m <= n matching the key count.
    pub fn is_multisig_out(&self) -> bool {
        let c = match self.chunks() {
            Ok(c) => c,
            Err(_) => return false,
        };
        if c.len() < 4 || !c[c.len() - 1].is_opcode(OP_CHECKMULTISIG) {
            return false;
        }
        let m = small_int_value(c[0].op).filter(|_| c[0].data.is_none());
        let n = small_int_value(c[c.len() - 2].op).filter(|_| c[c.len() - 2].data.is_none());
        let keys = &c[1..c.len() - 2];
        match (m, n) {
            (Some(m), Some(n)) => {
                m >= 1
                    && m <= n
                    && n as usize == keys.len()
                    && keys.iter().all(|k| k.data.as_ref().map_or(false, |d| !d.is_empty()))
            }
            _ => false,
        }
    }

    /// Whether every chunk is a push (opcodes up to OP_16).
    pub fn is_push_only(&self) -> bool {
        self.chunks()
            .map(|c| c.iter().all(ScriptChunk::is_push_data))
            .unwrap_or(false)
    }

    pub fn classify(&self) -> ScriptType {
        if self.is_p2pkh() {
            ScriptType::PubKeyHash
        } else if self.is_p2sh() {
            ScriptType::ScriptHash
        } else if self.is_p2pk() {
            ScriptType::PubKey
        } else if self.is_multisig_out() {
            ScriptType::MultiSig
        } else {
            ScriptType::NonStandard
        }
    }

    // -----------------------------------------------------------------------
    // Extraction
    // -----------------------------------------------------------------------

    /// The 20-byte hash of a pay-to-pubkey-hash script.
    pub fn public_key_hash(&self) -> Result<[u8; 20], ScriptError> {
        if self.0.is_empty() {
            return Err(ScriptError::EmptyScript);
        }
        if !self.is_p2pkh() {
            return Err(ScriptError::NotP2PKH);
        }
        let chunks = self.chunks()?;
        to_hash20(chunks[2].data_bytes()).ok_or(ScriptError::NotP2PKH)
    }

    /// The 20-byte hash of a pay-to-script-hash script.
    pub fn script_hash(&self) -> Result<[u8; 20], ScriptError> {
        if !self.is_p2sh() {
            return Err(ScriptError::NotP2SH);
        }
        to_hash20(&self.0[2..22]).ok_or(ScriptError::NotP2SH)
    }

    /// The key of a pay-to-pubkey script.
    pub fn raw_public_key(&self) -> Result<Vec<u8>, ScriptError> {
        if !self.is_p2pk() {
            return Err(ScriptError::NotP2PK);
        }
        let chunks = self.chunks()?;
        Ok(chunks[0].data_bytes().to_vec())
    }

    /// The public key carried by a two-chunk script.
    ///
    /// For a spending script `<sig> <pubkey>` this is the second push; for
    /// a locking script `<pubkey> OP_CHECKSIG` it is the first.
    pub fn spending_public_key(&self) -> Result<Vec<u8>, ScriptError> {
        let c = self.chunks()?;
        if c.len() != 2 {
            return Err(ScriptError::NoPublicKey);
        }
        let first = c[0].data.as_deref().filter(|d| d.len() > 2);
        let second = c[1].data.as_deref().filter(|d| d.len() > 2);
        match (first, second) {
            (Some(_), Some(key)) => Ok(key.to_vec()),
            (Some(key), None) if c[1].is_opcode(OP_CHECKSIG) => Ok(key.to_vec()),
            _ => Err(ScriptError::NoPublicKey),
        }
    }

    // -----------------------------------------------------------------------
    // Building
    // -----------------------------------------------------------------------

    /// Append `data` using the smallest push prefix.
    pub fn append_push_data(&mut self, data: &[u8]) -> Result<(), ScriptError> {
        let prefix = push_data_prefix(data.len())?;
        self.0.extend_from_slice(&prefix);
        self.0.extend_from_slice(data);
        Ok(())
    }

    pub fn append_push_data_hex(&mut self, hex_str: &str) -> Result<(), ScriptError> {
        let data = hex::decode(hex_str)
            .map_err(|_| ScriptError::InvalidNotation(hex_str.to_string()))?;
        self.append_push_data(&data)
    }

    /// Append a number: OP_1NEGATE/OP_0..OP_16 when possible, otherwise a
    /// minimal script-number push.
    pub fn append_number(&mut self, n: i64) -> Result<(), ScriptError> {
        match small_int_opcode(n) {
            Some(op) => {
                self.0.push(op);
                Ok(())
            }
            None => self.append_push_data(&ScriptNumber::new(n).to_bytes()),
        }
    }

    /// Append bare opcodes. Push forms need a payload and are rejected.
    pub fn append_opcodes(&mut self, opcodes: &[u8]) -> Result<(), ScriptError> {
        if let Some(&op) = opcodes.iter().find(|&&op| (OP_DATA_1..=OP_PUSHDATA4).contains(&op)) {
            return Err(ScriptError::InvalidOpcodeType(opcode_to_string(op)));
        }
        self.0.extend_from_slice(opcodes);
        Ok(())
    }

    /// Append bytes verbatim.
    pub fn append_raw(&mut self, bytes: &[u8]) {
        self.0.extend_from_slice(bytes);
    }
}

fn to_hash20(data: &[u8]) -> Option<[u8; 20]> {
    <[u8; 20]>::try_from(data).ok()
}

impl Default for Script {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Script({})", self.to_hex())
    }
}

impl From<Vec<u8>> for Script {
    fn from(bytes: Vec<u8>) -> Self {
        Script(bytes)
    }
}

impl serde::Serialize for Script {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> serde::Deserialize<'de> for Script {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Script::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const P2PKH_HEX: &str = "76a91433e81a941e64cda12c6a299ed322ddbdd03f8d0e88ac";
    const P2SH_HEX: &str = "a9149de5aeaff9c48431ba4dd6e8af73d51f38e451cb87";
    const RAW_PUBKEY_HEX: &str = "41043e96222332ea7848323c08116dddafbfa917b8e37f0bdf63841628267148588a09a43540942d58d49717ad3fabfe14978cf4f0a8b84d2435dad16e9aa4d7f935ac";
    const SPENDING_HEX: &str = "47304402202b4da291cc39faf8433911988f9f49fc5c995812ca2f94db61468839c228c3e90220628bff3ff32ec95825092fa051cba28558a981fcf59ce184b14f2e215e69106701410414b38f4be3bb9fa0f4f32b74af07152b2f2f630bc02122a491137b6c523e46f18a0d5034418966f93dfc37cc3739ef7b2007213a302b7fba161557f4ad644a1c";

    // -----------------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------------

    #[test]
    fn test_from_hex_roundtrip() {
        let script = Script::from_hex(P2PKH_HEX).unwrap();
        assert_eq!(script.to_hex(), P2PKH_HEX);
        assert!(Script::from_hex("").unwrap().is_empty());
        assert!(Script::from_hex("ZZZZ").is_err());
    }

    #[test]
    fn test_asm_roundtrip() {
        let script = Script::from_hex(P2PKH_HEX).unwrap();
        let asm = script.to_asm();
        assert_eq!(
            asm,
            "OP_DUP OP_HASH160 33e81a941e64cda12c6a299ed322ddbdd03f8d0e OP_EQUALVERIFY OP_CHECKSIG"
        );
        assert_eq!(Script::from_asm(&asm).unwrap(), script);
        assert!(Script::from_asm("").unwrap().is_empty());
    }

    /// A truncated push renders as empty ASM instead of a partial listing.
    #[test]
    fn test_to_asm_truncated() {
        assert_eq!(Script::from_bytes(&[OP_DUP, 0x05, 0x01]).to_asm(), "");
    }

    #[test]
    fn test_from_buffer() {
        let buf = hex::decode(format!("ffff{}ff", P2PKH_HEX)).unwrap();
        let script = Script::from_buffer(&buf, 2, 25, 10_000).unwrap();
        assert_eq!(script.to_hex(), P2PKH_HEX);
        assert!(matches!(
            Script::from_buffer(&buf, 2, 25, 24),
            Err(ScriptError::ScriptTooLarge(25))
        ));
        assert!(Script::from_buffer(&buf, 20, 25, 10_000).is_err());
    }

    // -----------------------------------------------------------------------
    // Classification
    // -----------------------------------------------------------------------

    #[test]
    fn test_classify_templates() {
        assert_eq!(Script::from_hex(P2PKH_HEX).unwrap().classify(), ScriptType::PubKeyHash);
        assert_eq!(Script::from_hex(P2SH_HEX).unwrap().classify(), ScriptType::ScriptHash);
        assert_eq!(Script::from_hex(RAW_PUBKEY_HEX).unwrap().classify(), ScriptType::PubKey);
        assert_eq!(Script::from_hex(SPENDING_HEX).unwrap().classify(), ScriptType::NonStandard);
        assert_eq!(Script::new().classify(), ScriptType::NonStandard);
    }

    /// A 65-byte key push followed by OP_CHECKSIG pays to a raw public key.
    #[test]
    fn test_is_sent_to_raw_pubkey() {
        let script = Script::from_hex(RAW_PUBKEY_HEX).unwrap();
        assert!(script.is_p2pk());
        assert!(!script.is_p2pkh());
        assert_eq!(script.raw_public_key().unwrap().len(), 65);
    }

    #[test]
    fn test_is_p2pk_rejects_bad_prefix() {
        let mut key = vec![0x05];
        key.extend_from_slice(&[0x11; 32]);
        let script = Script::p2pk_lock(&key).unwrap();
        assert!(!script.is_p2pk());
    }

    /// The P2PKH template may use a PUSHDATA1 push; P2SH may not.
    #[test]
    fn test_template_push_forms() {
        let mut p2pkh = vec![OP_DUP, OP_HASH160, OP_PUSHDATA1, 20];
        p2pkh.extend_from_slice(&[0x11; 20]);
        p2pkh.extend_from_slice(&[OP_EQUALVERIFY, OP_CHECKSIG]);
        assert!(Script::from_bytes(&p2pkh).is_p2pkh());

        let mut p2sh = vec![OP_HASH160, OP_PUSHDATA1, 20];
        p2sh.extend_from_slice(&[0x11; 20]);
        p2sh.push(OP_EQUAL);
        assert!(!Script::from_bytes(&p2sh).is_p2sh());
    }

    #[test]
    fn test_is_multisig_out() {
        let keys = vec![vec![0x02; 33], vec![0x03; 33], vec![0x02; 33]];
        let script = Script::multisig_lock(2, &keys).unwrap();
        assert!(script.is_multisig_out());
        assert_eq!(script.classify(), ScriptType::MultiSig);
        assert!(Script::multisig_lock(4, &keys).is_err());

        let mut bytes = script.to_bytes().to_vec();
        let n = bytes.len() - 2;
        bytes[n] = OP_2;
        assert!(!Script::from_bytes(&bytes).is_multisig_out());
    }

    #[test]
    fn test_is_push_only() {
        assert!(Script::from_hex(SPENDING_HEX).unwrap().is_push_only());
        assert!(Script::from_bytes(&[OP_0, OP_1NEGATE, OP_16]).is_push_only());
        assert!(!Script::from_hex(P2PKH_HEX).unwrap().is_push_only());
        assert!(!Script::from_bytes(&[0x05, 0x01]).is_push_only());
    }

    // -----------------------------------------------------------------------
    // Extraction
    // -----------------------------------------------------------------------

    #[test]
    fn test_public_key_hash() {
        let script = Script::from_hex(P2PKH_HEX).unwrap();
        assert_eq!(
            hex::encode(script.public_key_hash().unwrap()),
            "33e81a941e64cda12c6a299ed322ddbdd03f8d0e"
        );
    }

    /// Extraction never guesses on a near-miss template.
    #[test]
    fn test_public_key_hash_rejects_non_p2pkh() {
        assert!(matches!(Script::new().public_key_hash(), Err(ScriptError::EmptyScript)));
        let truncated = Script::from_hex("76a91433e81a941e64cda12c6a299ed322ddbdd03f8d0e88").unwrap();
        assert!(matches!(truncated.public_key_hash(), Err(ScriptError::NotP2PKH)));
        assert!(matches!(
            Script::from_hex(P2SH_HEX).unwrap().public_key_hash(),
            Err(ScriptError::NotP2PKH)
        ));
    }

    #[test]
    fn test_script_hash() {
        let script = Script::from_hex(P2SH_HEX).unwrap();
        assert_eq!(
            hex::encode(script.script_hash().unwrap()),
            "9de5aeaff9c48431ba4dd6e8af73d51f38e451cb"
        );
        assert!(Script::from_hex(P2PKH_HEX).unwrap().script_hash().is_err());
    }

    #[test]
    fn test_spending_public_key_from_spending_script() {
        let script = Script::from_hex(SPENDING_HEX).unwrap();
        let key = script.spending_public_key().unwrap();
        assert_eq!(key.len(), 65);
        assert_eq!(key[0], 0x04);
    }

    #[test]
    fn test_spending_public_key_from_raw_pubkey_script() {
        let script = Script::from_hex(RAW_PUBKEY_HEX).unwrap();
        assert_eq!(script.spending_public_key().unwrap(), script.raw_public_key().unwrap());
        assert!(Script::from_hex(P2PKH_HEX).unwrap().spending_public_key().is_err());
    }

    // -----------------------------------------------------------------------
    // Building
    // -----------------------------------------------------------------------

    #[test]
    fn test_append_number() {
        let mut script = Script::new();
        for n in [-1, 0, 1, 16, 17, -2, 1000] {
            script.append_number(n).unwrap();
        }
        assert_eq!(script.to_hex(), "4f0051600111018202e803");
    }

    #[test]
    fn test_append_opcodes_rejects_push_forms() {
        let mut script = Script::new();
        assert!(script.append_opcodes(&[OP_DUP, OP_PUSHDATA1]).is_err());
        assert!(script.is_empty());
        script.append_opcodes(&[OP_DUP, OP_HASH160]).unwrap();
        assert_eq!(script.to_hex(), "76a9");
    }

    #[test]
    fn test_template_builders() {
        let hash = [0x33u8; 20];
        assert_eq!(Script::p2pkh_lock(&hash).public_key_hash().unwrap(), hash);
        assert_eq!(Script::p2sh_lock(&hash).script_hash().unwrap(), hash);
    }
}
