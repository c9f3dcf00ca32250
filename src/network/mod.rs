//! Configuration for mainnet, testnet and the scaling test network
//!
//! # Examples
//!
//! Check whether a remote's services make it a usable full node:
//!
//! ```rust
//! use sv_spv::messages::{NODE_BLOOM, NODE_NETWORK};
//! use sv_spv::network::Network;
//!
//! let services = NODE_NETWORK | NODE_BLOOM;
//! assert!(Network::Mainnet.is_full_node(services));
//! ```

mod network;

pub use self::network::Network;
