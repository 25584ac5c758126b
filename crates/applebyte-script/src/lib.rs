//! Applebyte script: parsing, pattern recognition, addresses and the
//! stack-machine interpreter.
//!
//! The interpreter reaches the spending transaction only through the
//! [`interpreter::TxContext`] trait, so this crate has no dependency on
//! the transaction model.

pub mod address;
pub mod chunk;
pub mod interpreter;
pub mod network;
pub mod notation;
pub mod opcodes;
pub mod script;

mod error;
pub use address::Address;
pub use chunk::ScriptChunk;
pub use error::ScriptError;
pub use network::{Network, NetworkParams};
pub use script::{Script, ScriptType};
