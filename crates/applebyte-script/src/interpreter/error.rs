//! Interpreter errors: a closed set of failure kinds plus where they
//! happened.

use std::fmt;

use crate::opcodes::opcode_to_string;

/// Why a script failed to verify.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpreterErrorCode {
    /// The script bytes do not decode, or exceed the size limit.
    ScriptParse,
    /// An opcode needed more stack items than were present.
    StackUnderflow,
    /// A disabled, reserved or unassigned opcode.
    UnknownOrDisabledOpcode,
    /// OP_RETURN executed.
    EarlyReturn,
    /// IF/NOTIF/ELSE/ENDIF do not nest properly.
    UnbalancedControlFlow,
    /// A numeric operand is longer than the allowed encoding.
    NumericOverflow,
    /// A signature is malformed, or a *VERIFY signature check failed.
    SignatureVerificationFailed,
    /// CHECKMULTISIG key or signature counts, or its extra item, are bad.
    MultisigStructureInvalid,
    /// The redeem script does not hash to the committed value, or fails.
    P2shMismatch,
    /// Op count, stack depth or element size exceeded.
    ResourceLimitExceeded,
    /// The final stack is empty, false, or not clean.
    FinalStackInvalid,
    /// OP_VERIFY, OP_EQUALVERIFY or OP_NUMEQUALVERIFY saw false.
    VerifyFailed,
    /// An optional policy flag rejected the script.
    PolicyViolation,
    /// The flag combination is inconsistent.
    InvalidFlags,
}

impl fmt::Display for InterpreterErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Where in execution a failure happened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ErrorContext {
    /// 0 for the spending script, 1 for the redeemed script, 2 for a P2SH
    /// redeem script.
    pub script_index: usize,
    /// Byte offset of the failing opcode within its script.
    pub offset: usize,
    pub opcode: Option<u8>,
    /// Main stack depth when the failure was raised.
    pub stack_depth: usize,
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "script {} offset {}", self.script_index, self.offset)?;
        if let Some(op) = self.opcode {
            write!(f, " {}", opcode_to_string(op))?;
        }
        write!(f, " depth {}", self.stack_depth)
    }
}

/// A verification failure.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{code}: {description} ({context})")]
pub struct InterpreterError {
    pub code: InterpreterErrorCode,
    pub context: ErrorContext,
    pub description: String,
    /// The underlying failure when a redeem script fails.
    #[source]
    pub cause: Option<Box<InterpreterError>>,
}

impl InterpreterError {
    pub fn new(code: InterpreterErrorCode, description: String) -> Self {
        InterpreterError {
            code,
            context: ErrorContext::default(),
            description,
            cause: None,
        }
    }

    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = context;
        self
    }

    pub fn with_cause(mut self, cause: InterpreterError) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }
}

/// Check if an error has a specific error code.
pub fn is_error_code(err: &InterpreterError, code: InterpreterErrorCode) -> bool {
    err.code == code
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opcodes::OP_CHECKSIG;
    use std::error::Error;

    #[test]
    fn test_display_includes_context() {
        let err = InterpreterError::new(
            InterpreterErrorCode::StackUnderflow,
            "need 2 items".to_string(),
        )
        .with_context(ErrorContext {
            script_index: 1,
            offset: 25,
            opcode: Some(OP_CHECKSIG),
            stack_depth: 1,
        });
        assert_eq!(
            err.to_string(),
            "StackUnderflow: need 2 items (script 1 offset 25 OP_CHECKSIG depth 1)"
        );
    }

    #[test]
    fn test_cause_is_source() {
        let inner = InterpreterError::new(InterpreterErrorCode::VerifyFailed, "false".into());
        let outer = InterpreterError::new(InterpreterErrorCode::P2shMismatch, "redeem".into())
            .with_cause(inner);
        assert!(is_error_code(&outer, InterpreterErrorCode::P2shMismatch));
        let source = outer.source().unwrap();
        assert!(source.to_string().starts_with("VerifyFailed"));
    }
}
