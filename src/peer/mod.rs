//! SPV peer protocol engine
//!
//! A `Peer` drives one connection to a full node: it completes the version
//! handshake, rejects nodes that cannot serve a light client, answers pings and
//! offers every other message to its queued `Task`s in order. Lifecycle events
//! and unclaimed messages are reported to a `PeerDelegate`.
//!
//! # Examples
//!
//! Connect to a node over TCP and request its mempool:
//!
//! ```no_run, rust
//! use sv_spv::messages::{FilterLoad, Message};
//! use sv_spv::network::Network;
//! use sv_spv::peer::{Peer, PeerConfig, PeerDelegate, PeerId, TcpConfig};
//! use sv_spv::util::BloomFilter;
//! use std::sync::{Arc, Weak};
//!
//! struct Wallet;
//!
//! impl PeerDelegate for Wallet {
//!     fn peer_connected(&self, peer: PeerId) {
//!         // Peer is ready for tasks
//!     }
//!
//!     fn peer_received_unsolicited_message(&self, peer: PeerId, message: &Message) {
//!         // Handle announcements no task asked for
//!     }
//! }
//!
//! let wallet = Arc::new(Wallet);
//! let delegate = Arc::downgrade(&wallet) as Weak<dyn PeerDelegate>;
//! let config = PeerConfig::new(Network::Mainnet, 600000);
//! let addr = "127.0.0.1:8333".parse().unwrap();
//! let peer = Peer::connect_tcp(addr, config, TcpConfig::default(), delegate).unwrap();
//!
//! let mut bloom_filter = BloomFilter::new(10., 0.0001).unwrap();
//! bloom_filter.add(&[0; 20]);
//! peer.send_filter_load(FilterLoad::new(bloom_filter)).unwrap();
//! peer.send_mempool_request().unwrap();
//! ```

pub(crate) mod atomic_reader;
mod config;
mod connection;
mod delegate;
#[cfg(test)]
mod mock;
mod peer;
mod session;
mod task;
mod task_queue;
mod tcp_connection;
mod timeout_manager;

use snowflake::ProcessUniqueId;

/// Unique id for a peer
pub type PeerId = ProcessUniqueId;

pub use self::config::{PeerConfig, TcpConfig, USER_AGENT};
pub use self::connection::{Connection, ConnectionEvent, ConnectionEvents};
pub use self::delegate::PeerDelegate;
pub use self::peer::Peer;
pub use self::session::{validate_remote_version, HandshakeState};
pub use self::task::{Task, TaskContext, TaskId, TaskTimer};
pub use self::tcp_connection::TcpConnection;
pub use self::timeout_manager::{Liveness, TimeoutManager};
