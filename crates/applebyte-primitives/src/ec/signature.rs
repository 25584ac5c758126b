//! ECDSA signature with DER serialization and RFC6979 deterministic nonces.
//!
//! Parsing is lenient about leading zero padding so that historical
//! signatures still decode; whether a signature is strictly encoded is a
//! separate question answered by the script interpreter's policy checks.

use k256::ecdsa;
use k256::ecdsa::signature::hazmat::PrehashVerifier;
use k256::FieldBytes;

use crate::ec::private_key::PrivateKey;
use crate::ec::public_key::PublicKey;
use crate::PrimitivesError;

/// An ECDSA signature over secp256k1.
///
/// R and S are always non-zero and below the curve order. S may be in
/// either half of the order; serialization and verification fold it into
/// the lower half.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature {
    inner: ecdsa::Signature,
}

impl Signature {
    /// Build a signature from big-endian R and S.
    pub fn new(r: [u8; 32], s: [u8; 32]) -> Result<Self, PrimitivesError> {
        let inner = ecdsa::Signature::from_scalars(FieldBytes::from(r), FieldBytes::from(s))
            .map_err(|_| malformed("scalar out of range"))?;
        Ok(Signature { inner })
    }

    pub fn r(&self) -> [u8; 32] {
        self.inner.split_bytes().0.into()
    }

    pub fn s(&self) -> [u8; 32] {
        self.inner.split_bytes().1.into()
    }

    /// Whether S lies in the lower half of the curve order.
    pub fn is_low_s(&self) -> bool {
        self.inner.normalize_s().is_none()
    }

    fn low_s(&self) -> ecdsa::Signature {
        self.inner.normalize_s().unwrap_or_else(|| self.inner.clone())
    }

    /// Parse `0x30 <len> 0x02 <rlen> <r> 0x02 <slen> <s>`.
    ///
    /// Redundant leading zeros in R and S are accepted and bytes beyond the
    /// declared sequence length (such as a hash type) are ignored.
    pub fn from_der(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        let (&header, rest) = bytes.split_first().ok_or_else(|| malformed("empty"))?;
        if header != 0x30 {
            return Err(malformed("no sequence header"));
        }
        let (&seq_len, rest) = rest.split_first().ok_or_else(|| malformed("no sequence length"))?;
        let body = rest
            .get(..seq_len as usize)
            .ok_or_else(|| malformed("sequence longer than input"))?;

        let (r, body) = read_der_int(body, "R")?;
        let (s, _) = read_der_int(body, "S")?;
        Self::new(r, s)
    }

    /// DER encoding with minimal integers and S in the lower half.
    pub fn to_der(&self) -> Vec<u8> {
        let (r, s) = self.low_s().split_bytes();
        let (r, s): ([u8; 32], [u8; 32]) = (r.into(), s.into());
        let r = der_int_body(&r);
        let s = der_int_body(&s);

        let mut out = Vec::with_capacity(6 + r.len() + s.len());
        out.push(0x30);
        out.push((4 + r.len() + s.len()) as u8);
        for int in [r, s] {
            out.push(0x02);
            out.push(int.len() as u8);
            out.extend_from_slice(&int);
        }
        out
    }

    /// Sign a digest with an RFC6979 nonce.
    pub fn sign(hash: &[u8], priv_key: &PrivateKey) -> Result<Self, PrimitivesError> {
        let (sig, _recovery_id) = priv_key
            .signing_key()
            .sign_prehash_recoverable(&digest_bytes(hash))
            .map_err(|e| PrimitivesError::InvalidSignature(e.to_string()))?;
        Ok(Signature {
            inner: sig.normalize_s().unwrap_or(sig),
        })
    }

    /// Verify against a digest and public key, accepting either S.
    pub fn verify(&self, hash: &[u8], pub_key: &PublicKey) -> bool {
        pub_key
            .verifying_key()
            .verify_prehash(&digest_bytes(hash), &self.low_s())
            .is_ok()
    }
}

fn malformed(what: &str) -> PrimitivesError {
    PrimitivesError::InvalidSignature(format!("malformed signature: {}", what))
}

/// Read one `0x02 <len> <bytes>` integer, returning it left-padded to 32
/// bytes along with the unread remainder.
fn read_der_int<'a>(data: &'a [u8], name: &str) -> Result<([u8; 32], &'a [u8]), PrimitivesError> {
    let (marker, len, rest) = match data {
        [marker, len, rest @ ..] => (*marker, *len as usize, rest),
        _ => return Err(malformed(&format!("{} truncated", name))),
    };
    if marker != 0x02 {
        return Err(malformed(&format!("no {} integer marker", name)));
    }
    if len == 0 || len > rest.len() {
        return Err(malformed(&format!("bogus {} length", name)));
    }
    let (int, rest) = rest.split_at(len);

    let significant = &int[int.iter().take_while(|&&b| b == 0).count()..];
    if significant.len() > 32 {
        return Err(malformed(&format!("{} wider than 32 bytes", name)));
    }
    let mut out = [0u8; 32];
    out[32 - significant.len()..].copy_from_slice(significant);
    Ok((out, rest))
}

/// Integer body without redundant zeros, with a 0x00 prefix when the high
/// bit is set.
fn der_int_body(val: &[u8; 32]) -> Vec<u8> {
    let first = val.iter().position(|&b| b != 0).unwrap_or(31);
    let mut out = Vec::with_capacity(33);
    if val[first] & 0x80 != 0 {
        out.push(0x00);
    }
    out.extend_from_slice(&val[first..]);
    out
}

/// Digests are signed as 32 bytes: longer input is truncated, shorter
/// input is left-padded with zeros.
fn digest_bytes(hash: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    let n = hash.len().min(32);
    out[32 - n..].copy_from_slice(&hash[..n]);
    out
}
