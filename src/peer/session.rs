use crate::messages::{FilterLoad, Message, NodeAddr, Ping, Version, NODE_BLOOM, UNKNOWN_IP};
use crate::network::Network;
use crate::peer::config::PeerConfig;
use crate::peer::connection::{Connection, ConnectionEvent, ConnectionEvents};
use crate::peer::delegate::PeerDelegate;
use crate::peer::task::{Task, TaskContext, TaskId};
use crate::peer::task_queue::TaskQueue;
use crate::peer::PeerId;
use crate::util::{secs_since, Error, Result};
use rand::random;
use snowflake::ProcessUniqueId;
use std::fmt;
use std::net::Ipv6Addr;
use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::{Arc, Weak};
use std::time::UNIX_EPOCH;

/// Input to a peer's serial context
#[derive(Debug)]
pub(crate) enum Command {
    Connect,
    Disconnect(Option<Error>),
    Connection(ConnectionEvent),
    AddTask(Box<dyn Task>),
    TaskCompleted(TaskId),
    TaskFailed(TaskId, Error),
    SendFilterLoad(FilterLoad),
    SendMempool,
    SendPing(u64),
}

/// Where a peer is in its lifetime
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum HandshakeState {
    /// Created but connect() not called yet
    Idle = 0,
    /// Waiting for the socket to become writable
    Connecting = 1,
    /// Our version is sent and the remote's has not been accepted yet
    AwaitingRemoteVersion = 2,
    /// Handshake complete
    Connected = 3,
    /// Shut down for good. A new connection is required.
    Disconnected = 4,
}

impl HandshakeState {
    fn from_usize(x: usize) -> HandshakeState {
        match x {
            1 => HandshakeState::Connecting,
            2 => HandshakeState::AwaitingRemoteVersion,
            3 => HandshakeState::Connected,
            4 => HandshakeState::Disconnected,
            _ => HandshakeState::Idle,
        }
    }
}

/// Session state mirrored for readers outside the serial context
pub(crate) struct Status {
    state: AtomicUsize,
    announced_height: AtomicI32,
    queued_tasks: AtomicUsize,
}

impl Status {
    pub fn new() -> Status {
        Status {
            state: AtomicUsize::new(HandshakeState::Idle as usize),
            announced_height: AtomicI32::new(0),
            queued_tasks: AtomicUsize::new(0),
        }
    }

    pub fn state(&self) -> HandshakeState {
        HandshakeState::from_usize(self.state.load(Ordering::Relaxed))
    }

    pub fn announced_height(&self) -> i32 {
        self.announced_height.load(Ordering::Relaxed)
    }

    pub fn queued_tasks(&self) -> usize {
        self.queued_tasks.load(Ordering::Relaxed)
    }
}

/// Checks that a remote can serve an SPV client at `local_height`
pub fn validate_remote_version(
    version: &Version,
    network: Network,
    local_height: i32,
) -> Result<()> {
    if version.start_height <= 0 {
        return Err(Error::NonPositiveHeight(version.start_height));
    }
    if version.start_height < local_height {
        return Err(Error::ExpiredChain {
            local_height,
            peer_height: version.start_height,
        });
    }
    if !network.is_full_node(version.services) {
        return Err(Error::NotFullNode(version.services));
    }
    if version.services & NODE_BLOOM == 0 {
        return Err(Error::NoBloomService(version.services));
    }
    Ok(())
}

/// Protocol state for one connection, owned by the peer's serial context
///
/// Every mutation happens through `handle`, one command at a time.
pub(crate) struct Session {
    id: PeerId,
    config: PeerConfig,
    connection: Arc<dyn Connection>,
    delegate: Weak<dyn PeerDelegate>,
    commands: Sender<Command>,
    status: Arc<Status>,
    tasks: TaskQueue,
    connecting: bool,
    version_sent: bool,
    remote_validated: bool,
    connected: bool,
    mempool_requested: bool,
    terminated: bool,
    announced_height: i32,
}

impl Session {
    pub fn new(
        id: PeerId,
        config: PeerConfig,
        connection: Arc<dyn Connection>,
        delegate: Weak<dyn PeerDelegate>,
        commands: Sender<Command>,
        status: Arc<Status>,
    ) -> Session {
        Session {
            id,
            config,
            connection,
            delegate,
            commands,
            status,
            tasks: TaskQueue::new(),
            connecting: false,
            version_sent: false,
            remote_validated: false,
            connected: false,
            mempool_requested: false,
            terminated: false,
            announced_height: 0,
        }
    }

    /// Processes commands until the session shuts down
    pub fn run(mut self, commands: Receiver<Command>) {
        for command in commands.iter() {
            self.handle(command);
            if self.terminated {
                break;
            }
        }
        debug!("{:?} Serial context exiting", self);
    }

    pub fn handle(&mut self, command: Command) {
        if self.terminated {
            match command {
                Command::AddTask(task) => warn!("{:?} Dropping {:?} after disconnect", self, task),
                Command::Connect => warn!("{:?} Cannot reconnect. Create a new peer.", self),
                command => trace!("{:?} Ignoring {:?} after disconnect", self, command),
            }
            return;
        }
        match command {
            Command::Connect => self.connect(),
            Command::Disconnect(reason) => self.disconnect(reason),
            Command::Connection(event) => self.on_connection_event(event),
            Command::AddTask(task) => self.add_task(task),
            Command::TaskCompleted(id) => self.on_task_completed(id),
            Command::TaskFailed(id, error) => self.on_task_failed(id, error),
            Command::SendFilterLoad(filter_load) => self.send(&Message::FilterLoad(filter_load)),
            Command::SendMempool => {
                if !self.mempool_requested {
                    self.mempool_requested = true;
                    self.send(&Message::Mempool);
                }
            }
            Command::SendPing(nonce) => self.send(&Message::Ping(Ping { nonce })),
        }
        self.publish_status();
    }

    fn state(&self) -> HandshakeState {
        if self.terminated {
            HandshakeState::Disconnected
        } else if self.connected {
            HandshakeState::Connected
        } else if self.version_sent {
            HandshakeState::AwaitingRemoteVersion
        } else if self.connecting {
            HandshakeState::Connecting
        } else {
            HandshakeState::Idle
        }
    }

    fn connect(&mut self) {
        if self.connecting {
            debug!("{:?} Already connecting", self);
            return;
        }
        self.connecting = true;
        info!("{:?} Connecting to {}", self, self.connection.host());
        let events = ConnectionEvents::new(self.commands.clone());
        if let Err(e) = self.connection.connect(events) {
            error!("{:?} Failed to connect: {}", self, e);
            self.disconnect(Some(e));
        }
    }

    /// The single exit path. Tells the connection and the delegate exactly once.
    fn disconnect(&mut self, reason: Option<Error>) {
        match &reason {
            Some(e) => info!("{:?} Disconnecting: {}", self, e),
            None => info!("{:?} Disconnecting", self),
        }
        self.terminated = true;
        self.connected = false;
        self.tasks.clear();
        self.connection.disconnect(reason.as_ref());
        self.publish_status();
        let id = self.id;
        self.notify(|delegate| delegate.peer_disconnected(id, reason.as_ref()));
    }

    fn on_connection_event(&mut self, event: ConnectionEvent) {
        match event {
            ConnectionEvent::ConnectedForWrite => {
                if !self.version_sent {
                    self.version_sent = true;
                    let version = self.local_version();
                    self.send(&Message::Version(version));
                }
            }
            ConnectionEvent::MessageReceived(message) => self.on_message(message),
            ConnectionEvent::TimePeriodPassed => {
                if let Some(head) = self.tasks.head_mut() {
                    head.check_timeout();
                }
            }
            ConnectionEvent::Disconnected(reason) => self.disconnect(reason),
        }
    }

    fn on_message(&mut self, message: Message) {
        match message {
            Message::Version(version) => self.on_version(version),
            Message::Verack => {
                if self.remote_validated && !self.connected {
                    self.mark_connected();
                }
            }
            message if !self.connected => {
                debug!("{:?} Dropping {:?} before handshake", self, message);
            }
            Message::Ping(ping) => self.send(&Message::Pong(ping)),
            Message::Pong(_) => {}
            message => {
                if !self.tasks.offer(&message) {
                    let id = self.id;
                    self.notify(|delegate| delegate.peer_received_unsolicited_message(id, &message));
                }
            }
        }
    }

    fn on_version(&mut self, version: Version) {
        if self.remote_validated {
            debug!("{:?} Ignoring repeated version", self);
            return;
        }
        let network = self.config.network;
        if let Err(e) = validate_remote_version(&version, network, self.config.local_height) {
            error!("{:?} Rejected version {:?}: {}", self, version, e);
            self.disconnect(Some(e));
            return;
        }
        self.announced_height = version.start_height;
        self.remote_validated = true;
        self.send(&Message::Verack);
        self.mark_connected();
    }

    fn mark_connected(&mut self) {
        self.connected = true;
        info!(
            "{:?} Connected to {} at height {}",
            self,
            self.connection.host(),
            self.announced_height
        );
        self.publish_status();
        let id = self.id;
        self.notify(|delegate| delegate.peer_connected(id));
    }

    fn add_task(&mut self, task: Box<dyn Task>) {
        let id: TaskId = ProcessUniqueId::new();
        debug!("{:?} Queueing {:?} as {}", self, task, id);
        let was_empty = self.tasks.is_empty();
        self.tasks.push(id, task);

        // Status must reflect the queue before the delegate looks at it
        self.publish_status();
        if was_empty {
            let peer = self.id;
            self.notify(|delegate| delegate.peer_busy(peer));
        }

        let ctx = TaskContext::new(id, self.id, self.connection.clone(), self.commands.clone());
        if let Some(task) = self.tasks.last_mut() {
            task.start(ctx);
        }
    }

    fn on_task_completed(&mut self, id: TaskId) {
        let removed = match self.tasks.remove(id) {
            Some(removed) => removed,
            None => {
                warn!("{:?} Completion for unknown task {}", self, id);
                return;
            }
        };
        if removed.was_head {
            if let Some(head) = self.tasks.head_mut() {
                head.reset_timer();
            }
        }
        debug!("{:?} Completed {:?}", self, removed.task);
        self.publish_status();
        let peer = self.id;
        self.notify(move |delegate| delegate.peer_completed_task(peer, removed.task));
        if self.tasks.is_empty() {
            self.notify(|delegate| delegate.peer_ready(peer));
        }
    }

    fn on_task_failed(&mut self, id: TaskId, error: Error) {
        if !self.tasks.contains(id) {
            warn!("{:?} Failure for unknown task {}: {}", self, id, error);
            return;
        }
        error!("{:?} Task {} failed: {}", self, id, error);
        self.disconnect(Some(error));
    }

    fn local_version(&self) -> Version {
        let network = self.config.network;
        Version {
            version: network.protocol_version(),
            services: self.config.services,
            timestamp: secs_since(UNIX_EPOCH) as i64,
            recv_addr: NodeAddr::from(self.connection.host()),
            tx_addr: NodeAddr {
                services: self.config.services,
                ip: Ipv6Addr::from(UNKNOWN_IP),
                port: network.port(),
            },
            nonce: random(),
            user_agent: self.config.user_agent.clone(),
            start_height: self.config.local_height,
            relay: self.config.relay,
        }
    }

    fn send(&self, message: &Message) {
        if let Err(e) = self.connection.send(message) {
            warn!("{:?} Failed to send {:?}: {}", self, message, e);
        }
    }

    fn notify<F: FnOnce(&dyn PeerDelegate)>(&self, f: F) {
        match self.delegate.upgrade() {
            Some(delegate) => f(&*delegate),
            None => trace!("{:?} No delegate to notify", self),
        }
    }

    fn publish_status(&self) {
        self.status
            .state
            .store(self.state() as usize, Ordering::Relaxed);
        self.status
            .announced_height
            .store(self.announced_height, Ordering::Relaxed);
        self.status
            .queued_tasks
            .store(self.tasks.len(), Ordering::Relaxed);
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&format!("[Peer {}]", self.id))
    }
}
