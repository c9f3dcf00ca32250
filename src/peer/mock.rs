//! Recording collaborators for peer tests

use crate::messages::Message;
use crate::peer::connection::{Connection, ConnectionEvent, ConnectionEvents};
use crate::peer::delegate::PeerDelegate;
use crate::peer::task::{Task, TaskContext};
use crate::peer::PeerId;
use crate::util::{Error, Result};
use std::collections::HashMap;
use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};

pub struct MockConnection {
    host: SocketAddr,
    sent: Mutex<Vec<Message>>,
    connects: AtomicUsize,
    disconnects: AtomicUsize,
    events: Mutex<Option<ConnectionEvents>>,
}

impl MockConnection {
    pub fn new() -> Arc<MockConnection> {
        MockConnection::with_host("127.0.0.1:8333".parse().unwrap())
    }

    pub fn with_host(host: SocketAddr) -> Arc<MockConnection> {
        Arc::new(MockConnection {
            host,
            sent: Mutex::new(Vec::new()),
            connects: AtomicUsize::new(0),
            disconnects: AtomicUsize::new(0),
            events: Mutex::new(None),
        })
    }

    pub fn sent(&self) -> Vec<Message> {
        self.sent.lock().unwrap().clone()
    }

    pub fn take_sent(&self) -> Vec<Message> {
        self.sent.lock().unwrap().drain(..).collect()
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn disconnects(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }

    /// Emits an event as if the socket produced it. Requires connect() first.
    pub fn emit(&self, event: ConnectionEvent) {
        match &*self.events.lock().unwrap() {
            Some(events) => events.emit(event),
            None => panic!("Not connected"),
        }
    }
}

impl Connection for MockConnection {
    fn host(&self) -> SocketAddr {
        self.host
    }

    fn connect(&self, events: ConnectionEvents) -> Result<()> {
        *self.events.lock().unwrap() = Some(events);
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn disconnect(&self, _reason: Option<&Error>) {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
    }

    fn send(&self, message: &Message) -> Result<()> {
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    Connected,
    Disconnected(Option<String>),
    Busy,
    Ready,
    Completed(String),
    Unsolicited(Message),
}

pub struct RecordingDelegate {
    notifications: Mutex<Vec<Notification>>,
    sink: Mutex<Option<Sender<Notification>>>,
}

impl RecordingDelegate {
    pub fn new() -> Arc<RecordingDelegate> {
        Arc::new(RecordingDelegate {
            notifications: Mutex::new(Vec::new()),
            sink: Mutex::new(None),
        })
    }

    /// Also forwards each notification to a channel, for tests that run the serial thread
    pub fn with_sink() -> (Arc<RecordingDelegate>, Receiver<Notification>) {
        let (tx, rx) = channel();
        let delegate = RecordingDelegate::new();
        *delegate.sink.lock().unwrap() = Some(tx);
        (delegate, rx)
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().unwrap().clone()
    }

    pub fn count(&self, notification: &Notification) -> usize {
        self.notifications()
            .iter()
            .filter(|n| *n == notification)
            .count()
    }

    fn record(&self, notification: Notification) {
        if let Some(sink) = &*self.sink.lock().unwrap() {
            let _ = sink.send(notification.clone());
        }
        self.notifications.lock().unwrap().push(notification);
    }
}

impl PeerDelegate for RecordingDelegate {
    fn peer_connected(&self, _peer: PeerId) {
        self.record(Notification::Connected);
    }

    fn peer_disconnected(&self, _peer: PeerId, reason: Option<&Error>) {
        self.record(Notification::Disconnected(reason.map(|e| e.to_string())));
    }

    fn peer_busy(&self, _peer: PeerId) {
        self.record(Notification::Busy);
    }

    fn peer_ready(&self, _peer: PeerId) {
        self.record(Notification::Ready);
    }

    fn peer_completed_task(&self, _peer: PeerId, task: Box<dyn Task>) {
        self.record(Notification::Completed(format!("{:?}", task)));
    }

    fn peer_received_unsolicited_message(&self, _peer: PeerId, message: &Message) {
        self.record(Notification::Unsolicited(message.clone()));
    }
}

/// Shared view into the tasks it creates: a call log and each task's context
#[derive(Clone)]
pub struct TaskProbe {
    log: Arc<Mutex<Vec<String>>>,
    contexts: Arc<Mutex<HashMap<String, TaskContext>>>,
}

impl TaskProbe {
    pub fn new() -> TaskProbe {
        TaskProbe {
            log: Arc::new(Mutex::new(Vec::new())),
            contexts: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// A task that never claims messages
    pub fn task(&self, name: &str) -> Box<dyn Task> {
        Box::new(RecordingTask {
            name: name.to_string(),
            claims: None,
            probe: self.clone(),
        })
    }

    /// A task that claims opaque messages with `command`
    pub fn claiming(&self, name: &str, command: &str) -> Box<dyn Task> {
        let mut padded = [0; 12];
        padded[..command.len()].clone_from_slice(command.as_bytes());
        Box::new(RecordingTask {
            name: name.to_string(),
            claims: Some(padded),
            probe: self.clone(),
        })
    }

    pub fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    pub fn clear_log(&self) {
        self.log.lock().unwrap().clear();
    }

    pub fn calls(&self, entry: &str) -> usize {
        self.log().iter().filter(|e| *e == entry).count()
    }

    pub fn complete(&self, name: &str) {
        self.context(name).complete();
    }

    pub fn fail(&self, name: &str, error: Error) {
        self.context(name).fail(error);
    }

    fn context(&self, name: &str) -> TaskContext {
        match self.contexts.lock().unwrap().get(name) {
            Some(ctx) => ctx.clone(),
            None => panic!("{} never started", name),
        }
    }

    fn record(&self, name: &str, call: &str) {
        self.log.lock().unwrap().push(format!("{}.{}", name, call));
    }
}

struct RecordingTask {
    name: String,
    claims: Option<[u8; 12]>,
    probe: TaskProbe,
}

impl Task for RecordingTask {
    fn start(&mut self, ctx: TaskContext) {
        self.probe.record(&self.name, "start");
        self.probe
            .contexts
            .lock()
            .unwrap()
            .insert(self.name.clone(), ctx);
    }

    fn handle(&mut self, message: &Message) -> bool {
        self.probe.record(&self.name, "handle");
        match (message, self.claims) {
            (Message::Other(opaque), Some(command)) => opaque.command == command,
            _ => false,
        }
    }

    fn check_timeout(&mut self) {
        self.probe.record(&self.name, "check_timeout");
    }

    fn reset_timer(&mut self) {
        self.probe.record(&self.name, "reset_timer");
    }
}

impl fmt::Debug for RecordingTask {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.name)
    }
}
