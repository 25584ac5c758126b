//! Script verification flags (bitmask).

use std::ops::{BitAnd, BitOr, BitOrAssign};

/// Script verification flags controlling interpreter behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScriptFlags(pub u32);

impl ScriptFlags {
    pub const NONE: ScriptFlags = ScriptFlags(0);
    /// Evaluate pay-to-script-hash redeem scripts.
    pub const BIP16: ScriptFlags = ScriptFlags(1 << 0);
    /// The extra item CHECKMULTISIG consumes must be empty.
    pub const STRICT_MULTI_SIG: ScriptFlags = ScriptFlags(1 << 1);
    /// Executing OP_NOP1..OP_NOP10 fails.
    pub const DISCOURAGE_UPGRADABLE_NOPS: ScriptFlags = ScriptFlags(1 << 2);
    /// Exactly one item must remain once evaluation completes.
    pub const VERIFY_CLEAN_STACK: ScriptFlags = ScriptFlags(1 << 3);
    pub const VERIFY_DER_SIGNATURES: ScriptFlags = ScriptFlags(1 << 4);
    pub const VERIFY_LOW_S: ScriptFlags = ScriptFlags(1 << 5);
    /// Pushes and numeric operands must use their shortest encoding.
    pub const VERIFY_MINIMAL_DATA: ScriptFlags = ScriptFlags(1 << 6);
    /// A failed signature check must have consumed only empty signatures.
    pub const VERIFY_NULL_FAIL: ScriptFlags = ScriptFlags(1 << 7);
    /// The spending script may contain only pushes.
    pub const VERIFY_SIG_PUSH_ONLY: ScriptFlags = ScriptFlags(1 << 8);
    /// Strict DER, a defined hash type and a well-formed public key.
    pub const VERIFY_STRICT_ENCODING: ScriptFlags = ScriptFlags(1 << 9);
    /// The operand of OP_IF/OP_NOTIF must be empty or exactly `01`.
    pub const VERIFY_MINIMAL_IF: ScriptFlags = ScriptFlags(1 << 10);

    pub fn has_flag(self, flag: ScriptFlags) -> bool {
        self.0 & flag.0 == flag.0
    }

    pub fn has_any(self, flags: &[ScriptFlags]) -> bool {
        flags.iter().any(|f| self.has_flag(*f))
    }

    pub fn add_flag(&mut self, flag: ScriptFlags) {
        self.0 |= flag.0;
    }

    pub fn remove_flag(&mut self, flag: ScriptFlags) {
        self.0 &= !flag.0;
    }
}

impl BitOr for ScriptFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        ScriptFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for ScriptFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for ScriptFlags {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        ScriptFlags(self.0 & rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_remove() {
        let mut flags = ScriptFlags::BIP16 | ScriptFlags::VERIFY_LOW_S;
        assert!(flags.has_flag(ScriptFlags::BIP16));
        flags.remove_flag(ScriptFlags::BIP16);
        assert!(!flags.has_flag(ScriptFlags::BIP16));
        assert!(flags.has_any(&[ScriptFlags::BIP16, ScriptFlags::VERIFY_LOW_S]));
        flags.add_flag(ScriptFlags::STRICT_MULTI_SIG);
        assert_eq!(flags & ScriptFlags::STRICT_MULTI_SIG, ScriptFlags::STRICT_MULTI_SIG);
    }

    /// NONE is contained in every flag set.
    #[test]
    fn test_none() {
        assert!(ScriptFlags::BIP16.has_flag(ScriptFlags::NONE));
        assert_eq!(ScriptFlags::default(), ScriptFlags::NONE);
    }
}
