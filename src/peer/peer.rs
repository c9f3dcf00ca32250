use crate::messages::FilterLoad;
use crate::network::Network;
use crate::peer::config::{PeerConfig, TcpConfig};
use crate::peer::connection::Connection;
use crate::peer::delegate::PeerDelegate;
use crate::peer::session::{Command, HandshakeState, Session, Status};
use crate::peer::task::Task;
use crate::peer::tcp_connection::TcpConnection;
use crate::peer::PeerId;
use crate::util::{Error, Result};
use snowflake::ProcessUniqueId;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::net::SocketAddr;
use std::sync::mpsc::{channel, Sender};
use std::sync::{Arc, Mutex, Weak};
use std::thread;

/// Node on the network speaking the SPV side of the protocol
///
/// It performs the version handshake, rejects remotes that cannot serve an SPV
/// client, answers pings and routes messages to its queued tasks. Messages no task
/// claims go to the delegate. All work happens on the peer's own serial thread,
/// so its operations may be called from any thread and return right away. Once
/// disconnected, the Peer may no longer be used.
pub struct Peer {
    /// Unique id for this peer
    pub id: PeerId,
    host: SocketAddr,
    network: Network,
    commands: Mutex<Sender<Command>>,
    status: Arc<Status>,
}

impl Peer {
    /// Creates a peer over an existing connection. Call connect() to start the handshake.
    pub fn new(
        connection: Arc<dyn Connection>,
        config: PeerConfig,
        delegate: Weak<dyn PeerDelegate>,
    ) -> Arc<Peer> {
        let id = ProcessUniqueId::new();
        let (tx, rx) = channel();
        let status = Arc::new(Status::new());
        let peer = Arc::new(Peer {
            id,
            host: connection.host(),
            network: config.network,
            commands: Mutex::new(tx.clone()),
            status: status.clone(),
        });

        let session = Session::new(id, config, connection, delegate, tx, status);
        thread::spawn(move || session.run(rx));

        peer
    }

    /// Creates a peer for a node at `addr` and begins connecting over TCP
    pub fn connect_tcp(
        addr: SocketAddr,
        config: PeerConfig,
        tcp_config: TcpConfig,
        delegate: Weak<dyn PeerDelegate>,
    ) -> Result<Arc<Peer>> {
        let connection = Arc::new(TcpConnection::new(addr, config.network, tcp_config));
        let peer = Peer::new(connection, config, delegate);
        peer.connect()?;
        Ok(peer)
    }

    /// Opens the connection and starts the handshake
    pub fn connect(&self) -> Result<()> {
        self.post(Command::Connect)
    }

    /// Disconnects and disables the peer. Queued tasks are abandoned.
    pub fn disconnect(&self, reason: Option<Error>) {
        if self.post(Command::Disconnect(reason)).is_err() {
            trace!("{:?} Already disconnected", self);
        }
    }

    /// Queues a task and starts it immediately
    pub fn add_task(&self, task: Box<dyn Task>) -> Result<()> {
        self.post(Command::AddTask(task))
    }

    /// Sends a bloom filter so the remote only relays matching transactions
    pub fn send_filter_load(&self, filter_load: FilterLoad) -> Result<()> {
        self.post(Command::SendFilterLoad(filter_load))
    }

    /// Asks the remote for its mempool. Only the first request is sent.
    pub fn send_mempool_request(&self) -> Result<()> {
        self.post(Command::SendMempool)
    }

    /// Sends a ping with a specific nonce
    pub fn send_ping(&self, nonce: u64) -> Result<()> {
        self.post(Command::SendPing(nonce))
    }

    /// Returns whether both peers connect to the same remote
    pub fn identity_equals(&self, other: &Peer) -> bool {
        self.host == other.host
    }

    /// Address of the remote node
    pub fn host(&self) -> SocketAddr {
        self.host
    }

    pub fn network(&self) -> Network {
        self.network
    }

    /// Returns whether the handshake completed and the peer is still up
    pub fn connected(&self) -> bool {
        self.state() == HandshakeState::Connected
    }

    /// Returns whether the peer is connected with no outstanding tasks
    pub fn ready(&self) -> bool {
        self.connected() && self.status.queued_tasks() == 0
    }

    /// Best height the remote declared in its version, or 0 before the handshake
    pub fn announced_height(&self) -> i32 {
        self.status.announced_height()
    }

    pub fn queued_tasks(&self) -> usize {
        self.status.queued_tasks()
    }

    pub fn state(&self) -> HandshakeState {
        self.status.state()
    }

    fn post(&self, command: Command) -> Result<()> {
        match self.commands.lock().unwrap().send(command) {
            Ok(()) => Ok(()),
            Err(_) => Err(Error::IllegalState("Peer disconnected".to_string())),
        }
    }
}

impl PartialEq for Peer {
    fn eq(&self, other: &Peer) -> bool {
        self.id == other.id
    }
}

impl Eq for Peer {}

impl Hash for Peer {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state)
    }
}

impl fmt::Debug for Peer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&format!("[Peer {}]", self.id))
    }
}

impl Drop for Peer {
    fn drop(&mut self) {
        self.disconnect(None);
    }
}
