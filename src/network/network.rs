use crate::messages::{NODE_BITCOIN_CASH, NODE_NETWORK, PROTOCOL_VERSION};
use crate::util::{Error, Result};

/// Network type
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum Network {
    Mainnet = 0,
    Testnet = 1,
    STN = 2,
}

impl Network {
    /// Converts an integer to a network type
    pub fn from_u8(x: u8) -> Result<Network> {
        match x {
            x if x == Network::Mainnet as u8 => Ok(Network::Mainnet),
            x if x == Network::Testnet as u8 => Ok(Network::Testnet),
            x if x == Network::STN as u8 => Ok(Network::STN),
            _ => {
                let msg = format!("Unknown network type: {}", x);
                Err(Error::BadArgument(msg))
            }
        }
    }

    /// Returns the default TCP port
    pub fn port(&self) -> u16 {
        match self {
            Network::Mainnet => 8333,
            Network::Testnet => 18333,
            Network::STN => 9333,
        }
    }

    /// Returns the magic bytes for the message headers
    pub fn magic(&self) -> [u8; 4] {
        match self {
            Network::Mainnet => [0xe3, 0xe1, 0xf3, 0xe8],
            Network::Testnet => [0xf4, 0xe5, 0xf3, 0xf4],
            Network::STN => [0xfb, 0xce, 0xc4, 0xf9],
        }
    }

    /// Returns the protocol version we speak on this network
    pub fn protocol_version(&self) -> u32 {
        PROTOCOL_VERSION
    }

    /// Returns the service bits, any one of which marks a remote as serving the full chain
    ///
    /// Test networks have many unpruned nodes that only advertise the cash bit.
    pub fn full_node_services(&self) -> u64 {
        match self {
            Network::Mainnet => NODE_NETWORK,
            Network::Testnet | Network::STN => NODE_NETWORK | NODE_BITCOIN_CASH,
        }
    }

    /// Returns whether the services advertise a full, unpruned block chain
    pub fn is_full_node(&self, services: u64) -> bool {
        services & self.full_node_services() != 0
    }
}
