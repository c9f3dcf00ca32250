use crate::messages::Message;
use crate::peer::connection::Connection;
use crate::peer::session::Command;
use crate::peer::PeerId;
use crate::util::{Error, Result};
use snowflake::ProcessUniqueId;
use std::fmt;
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Identifies a task within its peer's queue
pub type TaskId = ProcessUniqueId;

/// Outstanding protocol work queued on a peer, such as fetching blocks
///
/// All methods are called on the peer's serial context. A task reports its
/// outcome through the `TaskContext` it received in `start`, either from those
/// methods or from another thread.
pub trait Task: Send + fmt::Debug {
    /// Called once as soon as the task is queued, regardless of its position
    fn start(&mut self, ctx: TaskContext);

    /// Offered each message no earlier task claimed. Returns whether this task consumed it.
    fn handle(&mut self, message: &Message) -> bool;

    /// Called on each timer tick while this task is at the head of the queue
    fn check_timeout(&mut self);

    /// Called when this task becomes the head of the queue after an earlier one completed
    fn reset_timer(&mut self);
}

/// A task's binding to the peer that owns it
#[derive(Clone)]
pub struct TaskContext {
    id: TaskId,
    peer: PeerId,
    connection: Arc<dyn Connection>,
    commands: Sender<Command>,
}

impl TaskContext {
    pub(crate) fn new(
        id: TaskId,
        peer: PeerId,
        connection: Arc<dyn Connection>,
        commands: Sender<Command>,
    ) -> TaskContext {
        TaskContext {
            id,
            peer,
            connection,
            commands,
        }
    }

    /// Returns the id of the task this context is bound to
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the id of the owning peer
    pub fn peer(&self) -> PeerId {
        self.peer
    }

    /// Sends a message to the remote directly
    pub fn send(&self, message: &Message) -> Result<()> {
        self.connection.send(message)
    }

    /// Signals the task finished successfully. It is removed from the queue.
    pub fn complete(&self) {
        if self.commands.send(Command::TaskCompleted(self.id)).is_err() {
            warn!("{:?} Completed after peer shut down", self);
        }
    }

    /// Signals the task failed. The whole peer disconnects with `error`.
    pub fn fail(&self, error: Error) {
        if self.commands.send(Command::TaskFailed(self.id, error)).is_err() {
            warn!("{:?} Failed after peer shut down", self);
        }
    }
}

impl fmt::Debug for TaskContext {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&format!("[Task {} on Peer {}]", self.id, self.peer))
    }
}

/// Deadline tracking for task implementations
///
/// Peers never measure time for their tasks. A task typically resets its timer in
/// `reset_timer` and checks `expired` in `check_timeout`.
#[derive(Debug, Clone)]
pub struct TaskTimer {
    timeout: Duration,
    started: Instant,
}

impl TaskTimer {
    /// Creates a timer that starts now
    pub fn new(timeout: Duration) -> TaskTimer {
        TaskTimer {
            timeout,
            started: Instant::now(),
        }
    }

    /// Restarts the timeout window from now
    pub fn reset(&mut self) {
        self.started = Instant::now();
    }

    /// Time since the timer started or was last reset
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Returns whether the timeout has passed
    pub fn expired(&self) -> bool {
        self.elapsed() >= self.timeout
    }
}
