//! Applebyte primitives: hashing, secp256k1 keys and signatures, and the
//! little-endian wire helpers shared by the script and transaction crates.
//!
//! - Hash functions (SHA-1, SHA-256, SHA-256d, RIPEMD-160, Hash160)
//! - secp256k1 public/private keys and DER-encoded ECDSA signatures
//! - VarInt plus cursor reader and buffer writer for the wire format

pub mod hash;
pub mod wire;
pub mod ec;

mod error;
pub use error::PrimitivesError;
