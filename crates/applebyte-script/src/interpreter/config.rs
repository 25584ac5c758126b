//! Consensus limits the interpreter enforces.

use serde::{Deserialize, Serialize};

pub const MAX_SCRIPT_SIZE: usize = 10_000;
pub const MAX_OPS_PER_SCRIPT: usize = 201;
pub const MAX_SCRIPT_ELEMENT_SIZE: usize = 520;
pub const MAX_STACK_SIZE: usize = 1000;
pub const MAX_SCRIPT_NUMBER_LENGTH: usize = 4;
pub const MAX_PUB_KEYS_PER_MULTISIG: usize = 20;

/// Script limits for one network.
///
/// Deserializing a partial document keeps the consensus value for every
/// field it leaves out.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub max_script_size: usize,
    /// Non-push opcodes per script, multisig key counts included.
    pub max_ops: usize,
    pub max_script_element_size: usize,
    /// Main and alt stack combined.
    pub max_stack_size: usize,
    pub max_script_number_length: usize,
    pub max_pub_keys_per_multisig: usize,
}

impl Config {
    pub fn max_script_size(&self) -> usize {
        self.max_script_size
    }

    pub fn max_ops(&self) -> usize {
        self.max_ops
    }

    pub fn max_script_element_size(&self) -> usize {
        self.max_script_element_size
    }

    pub fn max_stack_size(&self) -> usize {
        self.max_stack_size
    }

    pub fn max_script_number_length(&self) -> usize {
        self.max_script_number_length
    }

    pub fn max_pub_keys_per_multisig(&self) -> usize {
        self.max_pub_keys_per_multisig
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_script_size: MAX_SCRIPT_SIZE,
            max_ops: MAX_OPS_PER_SCRIPT,
            max_script_element_size: MAX_SCRIPT_ELEMENT_SIZE,
            max_stack_size: MAX_STACK_SIZE,
            max_script_number_length: MAX_SCRIPT_NUMBER_LENGTH,
            max_pub_keys_per_multisig: MAX_PUB_KEYS_PER_MULTISIG,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.max_script_size(), 10_000);
        assert_eq!(config.max_ops(), 201);
        assert_eq!(config.max_script_element_size(), 520);
        assert_eq!(config.max_stack_size(), 1000);
        assert_eq!(config.max_script_number_length(), 4);
        assert_eq!(config.max_pub_keys_per_multisig(), 20);
    }

    /// Fields missing from the document keep their consensus values.
    #[test]
    fn test_partial_override() {
        let config: Config = serde_json::from_str(r#"{"max_ops": 50}"#).unwrap();
        assert_eq!(config.max_ops(), 50);
        assert_eq!(config.max_stack_size(), MAX_STACK_SIZE);
    }
}
