/// Error types for transaction operations.
#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    /// The transaction breaks a structural rule (no inputs, value out of range, ...).
    #[error("invalid transaction: {0}")]
    InvalidTransaction(String),
    /// The same previous output is spent by more than one input.
    #[error("outpoint {txid}:{index} spent more than once")]
    DuplicateInput { txid: String, index: u32 },
    /// An error occurred during input signing.
    #[error("signing error: {0}")]
    SigningError(String),
    /// An error occurred during binary/hex serialization or deserialization.
    #[error("serialization error: {0}")]
    SerializationError(String),
    /// An underlying script error (forwarded from `applebyte-script`).
    #[error("script error: {0}")]
    Script(#[from] applebyte_script::ScriptError),
    /// An underlying primitives error (forwarded from `applebyte-primitives`).
    #[error("primitives error: {0}")]
    Primitives(#[from] applebyte_primitives::PrimitivesError),
}
