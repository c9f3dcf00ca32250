use crate::messages::Message;
use crate::peer::session::Command;
use crate::util::{Error, Result};
use std::net::SocketAddr;
use std::sync::mpsc::Sender;

/// Something that happened on a connection, delivered to the peer's serial context
#[derive(Debug)]
pub enum ConnectionEvent {
    /// The socket is open and messages may be written
    ConnectedForWrite,
    /// A complete message was decoded
    MessageReceived(Message),
    /// A timer period elapsed
    TimePeriodPassed,
    /// The connection closed. Emitted at most once.
    Disconnected(Option<Error>),
}

/// Handle a connection uses to deliver events to its peer
///
/// Events may be emitted from any thread. They are queued and processed in order.
#[derive(Clone)]
pub struct ConnectionEvents {
    commands: Sender<Command>,
}

impl ConnectionEvents {
    pub(crate) fn new(commands: Sender<Command>) -> ConnectionEvents {
        ConnectionEvents { commands }
    }

    /// Queues an event for the peer. Events after the peer shut down are discarded.
    pub fn emit(&self, event: ConnectionEvent) {
        if let Err(e) = self.commands.send(Command::Connection(event)) {
            trace!("Peer gone, discarding {:?}", e.0);
        }
    }
}

/// Transport to one remote node
///
/// Implementations own the socket, the byte-level codec and connection liveness.
/// `send` and `disconnect` may be called from any thread.
pub trait Connection: Send + Sync {
    /// Address of the remote node
    fn host(&self) -> SocketAddr;

    /// Starts connecting. Progress is reported through `events`.
    fn connect(&self, events: ConnectionEvents) -> Result<()>;

    /// Closes the connection. Must be safe to call more than once.
    fn disconnect(&self, reason: Option<&Error>);

    /// Writes a message to the remote
    fn send(&self, message: &Message) -> Result<()>;
}
