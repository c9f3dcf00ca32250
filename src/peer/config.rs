use crate::messages::NODE_NONE;
use crate::network::Network;
use std::time::Duration;

/// User agent sent in our version message
pub const USER_AGENT: &str = concat!("/sv-spv:", env!("CARGO_PKG_VERSION"), "/");

/// Settings for the protocol engine of one peer
#[derive(Clone, Debug)]
pub struct PeerConfig {
    /// Network whose protocol version and service rules apply
    pub network: Network,
    /// Height of our best header chain. Remotes behind it are rejected.
    pub local_height: i32,
    /// User agent advertised in our version message
    pub user_agent: String,
    /// Services we advertise. SPV clients serve nothing.
    pub services: u64,
    /// Whether the remote may relay transactions before a filter is loaded
    pub relay: bool,
}

impl PeerConfig {
    /// Creates a config for an SPV client at `local_height`
    pub fn new(network: Network, local_height: i32) -> PeerConfig {
        PeerConfig {
            network,
            local_height,
            ..Default::default()
        }
    }
}

impl Default for PeerConfig {
    fn default() -> PeerConfig {
        PeerConfig {
            network: Network::Mainnet,
            local_height: 0,
            user_agent: USER_AGENT.to_string(),
            services: NODE_NONE,
            relay: false,
        }
    }
}

/// Socket and liveness settings for a TCP connection
#[derive(Clone, Debug)]
pub struct TcpConfig {
    /// Time to wait for the initial TCP connection
    pub connect_timeout: Duration,
    /// How long a blocking read waits before checking whether we disconnected
    pub read_poll: Duration,
    /// Interval between time-period ticks delivered to the peer
    pub tick_interval: Duration,
    /// Silence after which we ping the remote
    pub keepalive_after: Duration,
    /// Silence after which the connection is dropped
    pub idle_timeout: Duration,
}

impl Default for TcpConfig {
    fn default() -> TcpConfig {
        TcpConfig {
            connect_timeout: Duration::from_secs(5),
            read_poll: Duration::from_secs(1),
            tick_interval: Duration::from_secs(1),
            keepalive_after: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(90),
        }
    }
}
