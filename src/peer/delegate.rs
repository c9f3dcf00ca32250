use crate::messages::Message;
use crate::peer::task::Task;
use crate::peer::PeerId;
use crate::util::Error;

/// Receives lifecycle and message events from peers, usually a peer pool
///
/// Peers hold their delegate weakly and call it from their serial context, so
/// implementations should return quickly. Calling back into the peer from a
/// notification is fine since peer operations are queued.
pub trait PeerDelegate: Send + Sync {
    /// The handshake completed and the peer is usable
    fn peer_connected(&self, _peer: PeerId) {}

    /// The peer shut down, with the reason if it was a failure
    fn peer_disconnected(&self, _peer: PeerId, _reason: Option<&Error>) {}

    /// The task queue went from empty to non-empty
    fn peer_busy(&self, _peer: PeerId) {}

    /// The task queue drained
    fn peer_ready(&self, _peer: PeerId) {}

    /// A task finished and left the queue. Ownership is handed back.
    fn peer_completed_task(&self, _peer: PeerId, _task: Box<dyn Task>) {}

    /// A message arrived that no queued task claimed
    fn peer_received_unsolicited_message(&self, _peer: PeerId, _message: &Message) {}
}
