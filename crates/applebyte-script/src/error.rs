/// Errors from building, parsing and classifying scripts outside the
/// interpreter.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    /// A token in script notation could not be understood.
    #[error("invalid script notation: {0}")]
    InvalidNotation(String),

    /// Attempted to append a push-form opcode without its payload.
    #[error("use append_push_data for push opcodes: {0}")]
    InvalidOpcodeType(String),

    /// Invalid address string.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Address checksum did not match.
    #[error("address checksum failed")]
    ChecksumFailed,

    /// Address version byte is not accepted by the network.
    #[error("address version {0} not accepted by this network")]
    WrongNetwork(u8),

    /// Script exceeds the configured maximum size.
    #[error("script too large: {0} bytes")]
    ScriptTooLarge(usize),

    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("hex decode error: {0}")]
    HexDecode(#[from] hex::FromHexError),

    #[error("script is empty")]
    EmptyScript,

    /// Script does not match the pay-to-pubkey-hash template.
    #[error("not a P2PKH script")]
    NotP2PKH,

    /// Script does not match the pay-to-script-hash template.
    #[error("not a P2SH script")]
    NotP2SH,

    /// Script does not pay to a raw public key.
    #[error("not a pay-to-pubkey script")]
    NotP2PK,

    /// Script is neither `<sig> <pubkey>` nor `<pubkey> OP_CHECKSIG`.
    #[error("script does not carry a public key")]
    NoPublicKey,

    /// A push runs past the end of the script.
    #[error("not enough data")]
    DataTooSmall,

    /// Push payload exceeds the maximum push length.
    #[error("data too big")]
    DataTooBig,

    /// A part passed to a multi-push encoder is too large.
    #[error("part too big '{0}'")]
    PartTooBig(usize),

    /// Requested byte range lies outside the buffer.
    #[error("script index out of range")]
    IndexOutOfRange,

    #[error("primitives error: {0}")]
    Primitives(#[from] applebyte_primitives::PrimitivesError),
}
