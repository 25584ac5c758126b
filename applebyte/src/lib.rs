#![deny(missing_docs)]

//! Applebyte script verification engine.
//!
//! Re-exports the primitives, script and transaction crates, plus the
//! handful of types most callers need to check a spend:
//!
//! ```
//! use applebyte::{NetworkParams, OutPoint, Script, Transaction, TransactionInput, TransactionOutput};
//!
//! let script_pubkey = Script::from_asm("OP_2 OP_ADD OP_5 OP_EQUAL").unwrap();
//! let mut tx = Transaction::new();
//! tx.add_input(TransactionInput::with_script_sig(
//!     OutPoint::new([1u8; 32], 0),
//!     Script::from_asm("OP_3").unwrap(),
//! ));
//! tx.add_output(TransactionOutput::new(1_000, Script::new()));
//!
//! assert!(tx.correctly_spends(0, &script_pubkey, &NetworkParams::testnet(), true).is_ok());
//! ```

pub use applebyte_primitives as primitives;
pub use applebyte_script as script;
pub use applebyte_transaction as transaction;

pub use applebyte_script::interpreter::{InterpreterError, InterpreterErrorCode, ScriptFlags};
pub use applebyte_script::{Address, Network, NetworkParams, Script};
pub use applebyte_transaction::{OutPoint, Transaction, TransactionInput, TransactionOutput};
