//! Script interpreter.
//!
//! Runs a spending script and the script it redeems on a shared stack and
//! reports either success or a single [`InterpreterError`].
//!
//! # Architecture
//!
//! The interpreter does not depend on the transaction crate. Callers that
//! need OP_CHECKSIG provide a [`TxContext`] implementation that computes the
//! signature hash and verifies the signature.
//!
//! # Example
//!
//! ```
//! use applebyte_script::interpreter::{Engine, ScriptFlags};
//! use applebyte_script::Script;
//!
//! let unlocking = Script::from_asm("OP_2 OP_3").unwrap();
//! let locking = Script::from_asm("OP_ADD OP_5 OP_EQUAL").unwrap();
//! Engine::default()
//!     .execute(&unlocking, &locking, ScriptFlags::NONE, None, 0)
//!     .unwrap();
//! ```

pub mod config;
pub mod error;
pub mod flags;
mod ops_arithmetic;
mod ops_crypto;
mod ops_data;
mod ops_flow;
mod ops_stack;
pub mod parsed_opcode;
pub mod scriptnum;
pub mod stack;
pub mod thread;

pub use config::Config;
pub use error::{ErrorContext, InterpreterError, InterpreterErrorCode};
pub use flags::ScriptFlags;
pub use parsed_opcode::{ParsedOpcode, ParsedScript};
pub use scriptnum::ScriptNumber;
pub use stack::Stack;

use crate::Script;
use thread::Thread;

/// Signature verification supplied by the transaction being spent.
pub trait TxContext {
    /// Verify a signature against a public key for the given input.
    ///
    /// `full_sig` includes the sighash flag byte at the end. `sub_script` is
    /// the part of the executing script after the last OP_CODESEPARATOR,
    /// with the signature pushes and separators already removed.
    ///
    /// Returns Ok(true) if valid, Ok(false) if invalid. An Err is treated
    /// as an invalid signature.
    fn verify_signature(
        &self,
        full_sig: &[u8],
        pub_key: &[u8],
        sub_script: &Script,
        input_idx: usize,
        sighash_flag: u32,
    ) -> Result<bool, InterpreterError>;
}

/// The script execution engine.
///
/// An engine holds only limits; it can be shared across threads and used
/// for any number of concurrent verifications.
#[derive(Clone, Debug, Default)]
pub struct Engine {
    config: Config,
}

impl Engine {
    pub fn new(config: Config) -> Self {
        Engine { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Execute unlocking + locking scripts.
    ///
    /// # Arguments
    /// * `unlocking_script` - The input's unlocking (signature) script.
    /// * `locking_script` - The output's locking (pubkey) script.
    /// * `flags` - Verification flags.
    /// * `tx_context` - Optional transaction context for checksig operations.
    /// * `input_idx` - The input index being verified.
    pub fn execute(
        &self,
        unlocking_script: &Script,
        locking_script: &Script,
        flags: ScriptFlags,
        tx_context: Option<&dyn TxContext>,
        input_idx: usize,
    ) -> Result<(), InterpreterError> {
        let mut thread = Thread::new(
            unlocking_script,
            locking_script,
            flags,
            tx_context,
            input_idx,
            &self.config,
        )?;
        thread.execute()
    }
}
