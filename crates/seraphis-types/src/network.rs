//! Network identifiers and their address-string codes.

use serde::{Deserialize, Serialize};

/// Network type identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Network {
    Mainnet,
    Testnet,
    Stagenet,
    /// Regtest-style network used by local test chains.
    Fakechain,
}

impl Network {
    /// One-character network code embedded in encoded addresses.
    pub fn code(&self) -> char {
        match self {
            Network::Mainnet => 'm',
            Network::Testnet => 't',
            Network::Stagenet => 's',
            Network::Fakechain => 'f',
        }
    }

    /// Inverse of [`Network::code`].
    pub fn from_code(c: char) -> Option<Network> {
        match c {
            'm' => Some(Network::Mainnet),
            't' => Some(Network::Testnet),
            's' => Some(Network::Stagenet),
            'f' => Some(Network::Fakechain),
            _ => None,
        }
    }
}
