use crate::messages::message::Payload;
use crate::messages::node_addr::NodeAddr;
use crate::util::{secs_since, var_int, Error, Result, Serializable};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io;
use std::io::{Read, Write};
use std::time::UNIX_EPOCH;

/// Protocol version supported by this library
pub const PROTOCOL_VERSION: u32 = 70015;

/// Minimum protocol version supported by this library
pub const MIN_SUPPORTED_PROTOCOL_VERSION: u32 = 70001;

/// Unknown IP address to use as a default
pub const UNKNOWN_IP: [u8; 16] = [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 255, 255, 127, 0, 0, 1];

/// Longest user agent accepted from a remote
pub const MAX_USER_AGENT_SIZE: usize = 256;

/// Service flag that node is not a full node. Used for SPV wallets.
pub const NODE_NONE: u64 = 0;

/// Service flag that node is a full node and implements all protocol features
pub const NODE_NETWORK: u64 = 1;

/// Service flag that node supports bloom filtered connections (BIP-111)
pub const NODE_BLOOM: u64 = 1 << 2;

/// Service flag that node is a full node on the Bitcoin Cash lineage
pub const NODE_BITCOIN_CASH: u64 = 1 << 5;

/// Largest difference in seconds accepted between a remote's clock and ours
const MAX_TIMESTAMP_SKEW: i64 = 2 * 60 * 60;

/// Version payload defining a node's capabilities
#[derive(Debug, Default, PartialEq, Eq, Hash, Clone)]
pub struct Version {
    /// The protocol version being used by the node
    pub version: u32,
    /// Bitfield of features to be enabled for this connection
    pub services: u64,
    /// Time since the Unix epoch in seconds
    pub timestamp: i64,
    /// Network address of the node receiving this message
    pub recv_addr: NodeAddr,
    /// Network address of the node emitting this message
    pub tx_addr: NodeAddr,
    /// A random nonce which can help a node detect a connection to itself
    pub nonce: u64,
    /// User agent string
    pub user_agent: String,
    /// Height of the transmiting node's best block chain, or in the case of SPV wallets, block header chain
    pub start_height: i32,
    /// Whether the client wants to receive broadcast transactions before a filter is set
    pub relay: bool,
}

impl Version {
    /// Checks that the version message is well-formed enough to negotiate with
    pub fn validate(&self) -> Result<()> {
        if self.version < MIN_SUPPORTED_PROTOCOL_VERSION {
            let msg = format!("Unsupported protocol version: {}", self.version);
            return Err(Error::BadData(msg));
        }
        let now = secs_since(UNIX_EPOCH) as i64;
        // Remote-chosen timestamps may be anywhere in the i64 range
        let skew = self.timestamp.checked_sub(now).and_then(i64::checked_abs);
        match skew {
            Some(skew) if skew <= MAX_TIMESTAMP_SKEW => Ok(()),
            _ => {
                let msg = format!("Timestamp out of range: {}", self.timestamp);
                Err(Error::BadData(msg))
            }
        }
    }
}

impl Serializable<Version> for Version {
    fn read(reader: &mut dyn Read) -> Result<Version> {
        let version = reader.read_u32::<LittleEndian>()?;
        let services = reader.read_u64::<LittleEndian>()?;
        let timestamp = reader.read_i64::<LittleEndian>()?;
        let recv_addr = NodeAddr::read(reader)?;
        let tx_addr = NodeAddr::read(reader)?;
        let nonce = reader.read_u64::<LittleEndian>()?;
        let user_agent = var_int::read_bytes(reader, MAX_USER_AGENT_SIZE)?;
        let user_agent = String::from_utf8(user_agent)?;
        let start_height = reader.read_i32::<LittleEndian>()?;
        // Nodes predating BIP-37 omit the relay flag, which then defaults to true
        let relay = match reader.read_u8() {
            Ok(flag) => flag == 0x01,
            Err(_) => true,
        };
        Ok(Version {
            version,
            services,
            timestamp,
            recv_addr,
            tx_addr,
            nonce,
            user_agent,
            start_height,
            relay,
        })
    }

    fn write(&self, writer: &mut dyn Write) -> io::Result<()> {
        writer.write_u32::<LittleEndian>(self.version)?;
        writer.write_u64::<LittleEndian>(self.services)?;
        writer.write_i64::<LittleEndian>(self.timestamp)?;
        self.recv_addr.write(writer)?;
        self.tx_addr.write(writer)?;
        writer.write_u64::<LittleEndian>(self.nonce)?;
        var_int::write_bytes(self.user_agent.as_bytes(), writer)?;
        writer.write_i32::<LittleEndian>(self.start_height)?;
        writer.write_u8(if self.relay { 0x01 } else { 0x00 })?;
        Ok(())
    }
}

impl Payload<Version> for Version {
    fn size(&self) -> usize {
        33 + self.recv_addr.size()
            + self.tx_addr.size()
            + var_int::size(self.user_agent.as_bytes().len() as u64)
            + self.user_agent.as_bytes().len()
    }
}
