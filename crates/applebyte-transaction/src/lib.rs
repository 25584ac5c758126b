//! Transaction model, legacy signature hashing and input verification.
//!
//! [`Transaction::correctly_spends`] is the entry point that decides
//! whether an input is allowed to spend the output it references.

pub mod input;
pub mod output;
pub mod sighash;
pub mod template;
pub mod transaction;
pub mod verify;

mod error;
pub use error::TransactionError;
pub use input::{OutPoint, TransactionInput};
pub use output::TransactionOutput;
pub use transaction::Transaction;
pub use verify::{verify_input, TransactionSignatureChecker};
