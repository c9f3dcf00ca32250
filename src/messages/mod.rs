//! Peer-to-peer network protocol messages
//!
//! # Examples
//!
//! Decode a network message
//!
//! ```rust
//! use sv_spv::messages::Message;
//! use sv_spv::network::Network;
//! use std::io::Cursor;
//!
//! let bytes = [
//!     227, 225, 243, 232, 118, 101, 114, 97, 99, 107,
//!     0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 93, 246, 224, 226,
//! ];
//! let magic = Network::Mainnet.magic();
//! let message = Message::read(&mut Cursor::new(&bytes), magic).unwrap();
//!
//! match message {
//!     Message::Verack => { /* Handshake acknowledged */ },
//!     _ => { /* All other messages */ }
//! }
//! ```
//!
//! Wrap a message the library doesn't decode:
//!
//! ```rust
//! use sv_spv::messages::{Message, Opaque};
//!
//! let getaddr = Message::Other(Opaque::new("getaddr", vec![]).unwrap());
//! ```

mod filter_load;
mod message;
mod message_header;
mod node_addr;
mod opaque;
mod ping;
mod version;

pub use self::filter_load::{
    FilterLoad, BLOOM_UPDATE_ALL, BLOOM_UPDATE_NONE, BLOOM_UPDATE_P2PUBKEY_ONLY,
};
pub(crate) use self::message::is_timeout;
pub use self::message::{commands, Message, Payload, MAX_PAYLOAD_SIZE, NO_CHECKSUM};
pub use self::message_header::MessageHeader;
pub use self::node_addr::NodeAddr;
pub use self::opaque::Opaque;
pub use self::ping::Ping;
pub use self::version::{
    Version, MAX_USER_AGENT_SIZE, MIN_SUPPORTED_PROTOCOL_VERSION, NODE_BITCOIN_CASH, NODE_BLOOM,
    NODE_NETWORK, NODE_NONE, PROTOCOL_VERSION, UNKNOWN_IP,
};
