//! secp256k1 keys and ECDSA signatures.

pub mod private_key;
pub mod public_key;
pub mod signature;

pub use private_key::PrivateKey;
pub use public_key::PublicKey;
pub use signature::Signature;

/// Check a DER-encoded signature over `digest` against a SEC1 public key.
///
/// Malformed signatures or keys are reported as a failed check rather than
/// an error, matching how script signature opcodes treat them.
pub fn verify_der(digest: &[u8], der_sig: &[u8], pub_key: &[u8]) -> bool {
    let sig = match Signature::from_der(der_sig) {
        Ok(sig) => sig,
        Err(_) => return false,
    };
    let key = match PublicKey::from_bytes(pub_key) {
        Ok(key) => key,
        Err(_) => return false,
    };
    sig.verify(digest, &key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::sha256d;

    #[test]
    fn test_verify_der_round_trip() {
        let key = PrivateKey::from_hex(
            "cca9fbcc1b41e5a95d369eaa6ddcff73b61a4efaa279cfc6567e8daa39cbaf50",
        )
        .unwrap();
        let digest = sha256d(b"spend");
        let sig = key.sign(&digest).unwrap().to_der();

        assert!(verify_der(&digest, &sig, &key.pub_key().to_compressed()));
        assert!(verify_der(&digest, &sig, &key.pub_key().to_uncompressed()));
        assert!(!verify_der(&sha256d(b"other"), &sig, &key.pub_key().to_compressed()));
    }

    #[test]
    fn test_verify_der_garbage_is_false() {
        let digest = [7u8; 32];
        assert!(!verify_der(&digest, &[], &[]));
        assert!(!verify_der(&digest, &[0x30, 0x00], &[0x02; 33]));
    }
}
