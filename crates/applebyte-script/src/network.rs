//! Per-network parameters.
//!
//! Everything the engine needs to know about a chain travels in a
//! `NetworkParams` value passed by the caller.

use crate::interpreter::{Config, ScriptFlags};

/// Number of base units in one coin.
pub const COIN: u64 = 100_000_000;

/// The largest amount any output, or the sum of a transaction's outputs,
/// may carry.
pub const MAX_MONEY: u64 = 250_000_000 * COIN;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Network {
    Mainnet,
    Testnet,
    /// Testnet headers with no chain behind them, for tests.
    UnitTest,
}

/// Address headers, consensus limits and default verification flags for
/// one network.
#[derive(Clone, Debug)]
pub struct NetworkParams {
    pub network: Network,
    /// First byte of a Base58Check address.
    pub address_header: u8,
    /// Version bytes accepted when parsing an address.
    pub acceptable_address_codes: Vec<u8>,
    pub config: Config,
    /// Flags `correctly_spends` starts from.
    pub verify_flags: ScriptFlags,
}

impl NetworkParams {
    pub fn mainnet() -> Self {
        Self::with_header(Network::Mainnet, 23)
    }

    pub fn testnet() -> Self {
        Self::with_header(Network::Testnet, 111)
    }

    pub fn unit_tests() -> Self {
        Self::with_header(Network::UnitTest, 111)
    }

    fn with_header(network: Network, address_header: u8) -> Self {
        NetworkParams {
            network,
            address_header,
            acceptable_address_codes: vec![address_header],
            config: Config::default(),
            verify_flags: ScriptFlags::BIP16,
        }
    }

    /// Replace the consensus limits.
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Replace the default verification flags.
    pub fn with_verify_flags(mut self, flags: ScriptFlags) -> Self {
        self.verify_flags = flags;
        self
    }

    pub fn accepts_address_code(&self, code: u8) -> bool {
        self.acceptable_address_codes.contains(&code)
    }
}

impl Default for NetworkParams {
    fn default() -> Self {
        Self::mainnet()
    }
}
