/// Base58Check addresses.
///
/// An address is a version byte (the network's address header) followed by
/// a 20-byte hash and a four byte sha256d checksum.

use std::fmt;

use applebyte_primitives::hash::{hash160, sha256d};

use crate::network::NetworkParams;
use crate::ScriptError;

/// A version byte plus a 20-byte hash.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Address {
    pub version: u8,
    pub hash: [u8; 20],
}

impl Address {
    /// Address for a 20-byte hash on the given network.
    pub fn from_hash160(params: &NetworkParams, hash: &[u8; 20]) -> Self {
        Address {
            version: params.address_header,
            hash: *hash,
        }
    }

    /// Address paying to the hash160 of `pub_key`.
    pub fn from_public_key(params: &NetworkParams, pub_key: &[u8]) -> Self {
        Self::from_hash160(params, &hash160(pub_key))
    }

    /// Parse a Base58Check string, checking the checksum and that the
    /// version byte is one the network accepts.
    pub fn from_string(params: &NetworkParams, addr: &str) -> Result<Self, ScriptError> {
        let decoded = bs58::decode(addr)
            .into_vec()
            .map_err(|_| ScriptError::InvalidAddress(format!("bad char for '{}'", addr)))?;
        if decoded.len() != 25 {
            return Err(ScriptError::InvalidAddress(format!(
                "'{}' decodes to {} bytes",
                addr,
                decoded.len()
            )));
        }

        let checksum = sha256d(&decoded[..21]);
        if decoded[21..] != checksum[..4] {
            return Err(ScriptError::ChecksumFailed);
        }
        if !params.accepts_address_code(decoded[0]) {
            return Err(ScriptError::WrongNetwork(decoded[0]));
        }

        let mut hash = [0u8; 20];
        hash.copy_from_slice(&decoded[1..21]);
        Ok(Address {
            version: decoded[0],
            hash,
        })
    }

    pub fn to_base58(&self) -> String {
        let mut payload = Vec::with_capacity(25);
        payload.push(self.version);
        payload.extend_from_slice(&self.hash);
        let checksum = sha256d(&payload);
        payload.extend_from_slice(&checksum[..4]);
        bs58::encode(payload).into_string()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_base58())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Script;

    const SIG_PROG: &str = "47304402202b4da291cc39faf8433911988f9f49fc5c995812ca2f94db61468839c228c3e90220628bff3ff32ec95825092fa051cba28558a981fcf59ce184b14f2e215e69106701410414b38f4be3bb9fa0f4f32b74af07152b2f2f630bc02122a491137b6c523e46f18a0d5034418966f93dfc37cc3739ef7b2007213a302b7fba161557f4ad644a1c";
    const PUBKEY_PROG: &str = "76a91433e81a941e64cda12c6a299ed322ddbdd03f8d0e88ac";
    const TEST_ADDRESS: &str = "mkFQohBpy2HDXrCwyMrYL5RtfrmeiuuPY2";

    // -----------------------------------------------------------------------
    // Known vectors
    // -----------------------------------------------------------------------

    /// The key pushed by a `<sig> <pubkey>` spending script hashes to the
    /// expected testnet address.
    #[test]
    fn test_spending_script_address() {
        let params = NetworkParams::testnet();
        let script = Script::from_hex(SIG_PROG).unwrap();
        let key = script.spending_public_key().unwrap();
        assert_eq!(Address::from_public_key(&params, &key).to_string(), TEST_ADDRESS);
    }

    #[test]
    fn test_p2pkh_script_address() {
        let params = NetworkParams::testnet();
        let script = Script::from_hex(PUBKEY_PROG).unwrap();
        let hash = script.public_key_hash().unwrap();
        assert_eq!(Address::from_hash160(&params, &hash).to_string(), TEST_ADDRESS);
    }

    // -----------------------------------------------------------------------
    // Parsing
    // -----------------------------------------------------------------------

    #[test]
    fn test_from_string_roundtrip() {
        let params = NetworkParams::testnet();
        let addr = Address::from_string(&params, TEST_ADDRESS).unwrap();
        assert_eq!(addr.version, 111);
        assert_eq!(hex::encode(addr.hash), "33e81a941e64cda12c6a299ed322ddbdd03f8d0e");
        assert_eq!(addr.to_base58(), TEST_ADDRESS);
    }

    #[test]
    fn test_from_string_wrong_network() {
        let result = Address::from_string(&NetworkParams::mainnet(), TEST_ADDRESS);
        assert!(matches!(result, Err(ScriptError::WrongNetwork(111))));
    }

    #[test]
    fn test_from_string_bad_checksum() {
        let mut chars: Vec<char> = TEST_ADDRESS.chars().collect();
        let last = chars.len() - 1;
        chars[last] = if chars[last] == '2' { '3' } else { '2' };
        let corrupted: String = chars.into_iter().collect();
        let result = Address::from_string(&NetworkParams::testnet(), &corrupted);
        assert!(matches!(result, Err(ScriptError::ChecksumFailed)));
    }

    #[test]
    fn test_from_string_bad_input() {
        let params = NetworkParams::testnet();
        assert!(Address::from_string(&params, "0OIl").is_err());
        assert!(Address::from_string(&params, "mkFQoh").is_err());
    }

    /// Mainnet addresses carry header 23 and start with 'A'.
    #[test]
    fn test_mainnet_prefix() {
        let params = NetworkParams::mainnet();
        let addr = Address::from_hash160(&params, &[0x33; 20]);
        assert!(addr.to_string().starts_with('A'));
        assert_eq!(Address::from_string(&params, &addr.to_string()).unwrap(), addr);
    }
}
