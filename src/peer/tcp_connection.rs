use crate::messages::{is_timeout, Message, MessageHeader, Ping};
use crate::network::Network;
use crate::peer::atomic_reader::AtomicReader;
use crate::peer::config::TcpConfig;
use crate::peer::connection::{Connection, ConnectionEvent, ConnectionEvents};
use crate::peer::timeout_manager::{Liveness, TimeoutManager};
use crate::util::{Error, Result};
use std::fmt;
use std::io;
use std::io::Write;
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

/// Connection to a node over TCP
///
/// A reader thread decodes messages as they arrive and a ticker thread drives
/// keep-alives, idle expiry and the peer's timer ticks. Messages may be sent from
/// any thread. Once closed, a TcpConnection may not be reused.
pub struct TcpConnection {
    inner: Arc<Inner>,
}

struct Inner {
    addr: SocketAddr,
    network: Network,
    config: TcpConfig,
    tcp_writer: Mutex<Option<TcpStream>>,
    started: AtomicBool,
    connected: AtomicBool,
    closed: AtomicBool,
    events: Mutex<Option<ConnectionEvents>>,
    timeouts: TimeoutManager,
}

impl TcpConnection {
    pub fn new(addr: SocketAddr, network: Network, config: TcpConfig) -> TcpConnection {
        let timeouts = TimeoutManager::new(config.keepalive_after, config.idle_timeout);
        TcpConnection {
            inner: Arc::new(Inner {
                addr,
                network,
                config,
                tcp_writer: Mutex::new(None),
                started: AtomicBool::new(false),
                connected: AtomicBool::new(false),
                closed: AtomicBool::new(false),
                events: Mutex::new(None),
                timeouts,
            }),
        }
    }

    /// Returns whether the socket is open
    pub fn connected(&self) -> bool {
        self.inner.connected.load(Ordering::Relaxed)
    }
}

impl Connection for TcpConnection {
    fn host(&self) -> SocketAddr {
        self.inner.addr
    }

    fn connect(&self, events: ConnectionEvents) -> Result<()> {
        if self.inner.started.swap(true, Ordering::Relaxed) {
            return Err(Error::IllegalState("Already connected".to_string()));
        }
        *self.inner.events.lock().unwrap() = Some(events);
        let inner = self.inner.clone();
        thread::spawn(move || Inner::run(inner));
        Ok(())
    }

    fn disconnect(&self, _reason: Option<&Error>) {
        self.inner.close(None);
    }

    fn send(&self, message: &Message) -> Result<()> {
        self.inner.send(message)
    }
}

impl fmt::Debug for TcpConnection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(&*self.inner, f)
    }
}

impl Drop for TcpConnection {
    fn drop(&mut self) {
        self.inner.close(None);
    }
}

impl Inner {
    fn run(inner: Arc<Inner>) {
        info!("{:?} Connecting", inner);
        let mut tcp_stream = match inner.open() {
            Ok(tcp_stream) => tcp_stream,
            Err(e) => {
                error!("{:?} Failed to connect: {}", inner, e);
                inner.close(Some(e));
                return;
            }
        };

        // Closed while the socket was opening
        if inner.closed.load(Ordering::Relaxed) {
            let _ = tcp_stream.shutdown(Shutdown::Both);
            return;
        }

        inner.connected.store(true, Ordering::Relaxed);
        inner.timeouts.touch();
        info!("{:?} Socket open", inner);
        inner.emit(ConnectionEvent::ConnectedForWrite);

        let ticker = inner.clone();
        thread::spawn(move || Inner::tick(ticker));

        let magic = inner.network.magic();
        let mut partial: Option<MessageHeader> = None;

        // Message reads over TCP must be all-or-nothing
        let mut tcp_reader = AtomicReader::new(&mut tcp_stream);

        loop {
            let message = match &partial {
                Some(header) => Message::read_partial(&mut tcp_reader, header),
                None => Message::read(&mut tcp_reader, magic),
            };

            // Check right after the blocking read so errors from our own shutdown are not reported
            if inner.closed.load(Ordering::Relaxed) {
                return;
            }

            match message {
                Ok(Message::Partial(header)) => partial = Some(header),
                Ok(message) => {
                    debug!("{:?} Read {:#?}", inner, message);
                    partial = None;
                    inner.timeouts.touch();
                    inner.emit(ConnectionEvent::MessageReceived(message));
                }
                Err(Error::IOError(ref e)) if is_timeout(e) => continue,
                Err(e) => {
                    error!("{:?} Error reading message: {}", inner, e);
                    inner.close(Some(e));
                    return;
                }
            }
        }
    }

    fn open(&self) -> Result<TcpStream> {
        let tcp_stream = TcpStream::connect_timeout(&self.addr, self.config.connect_timeout)?;
        tcp_stream.set_nodelay(true)?;
        tcp_stream.set_read_timeout(Some(self.config.read_poll))?;
        *self.tcp_writer.lock().unwrap() = Some(tcp_stream.try_clone()?);
        Ok(tcp_stream)
    }

    fn tick(inner: Arc<Inner>) {
        loop {
            thread::sleep(inner.config.tick_interval);
            if inner.closed.load(Ordering::Relaxed) {
                return;
            }
            match inner.timeouts.check() {
                Liveness::Expired => {
                    warn!("{:?} Idle for {:?}", inner, inner.timeouts.idle());
                    inner.close(Some(Error::Timeout));
                    return;
                }
                Liveness::KeepAlive => {
                    if let Err(e) = inner.send(&Message::Ping(Ping::random())) {
                        warn!("{:?} Failed to send keep-alive: {}", inner, e);
                        return;
                    }
                }
                Liveness::Active => {}
            }
            inner.emit(ConnectionEvent::TimePeriodPassed);
        }
    }

    fn send(&self, message: &Message) -> Result<()> {
        if !self.connected.load(Ordering::Relaxed) {
            return Err(Error::IllegalState("Not connected".to_string()));
        }

        let mut io_error: Option<io::Error> = None;
        {
            let mut tcp_writer = self.tcp_writer.lock().unwrap();
            let mut tcp_writer = match tcp_writer.as_mut() {
                Some(tcp_writer) => tcp_writer,
                None => return Err(Error::IllegalState("No tcp stream".to_string())),
            };

            debug!("{:?} Write {:#?}", self, message);

            let result = message
                .write(&mut tcp_writer, self.network.magic())
                .and_then(|_| tcp_writer.flush());
            if let Err(e) = result {
                io_error = Some(e);
            }
        }

        match io_error {
            Some(e) => {
                let reason = io::Error::new(e.kind(), e.to_string());
                self.close(Some(Error::IOError(reason)));
                Err(Error::IOError(e))
            }
            None => Ok(()),
        }
    }

    /// Shuts the socket and reports Disconnected, once
    fn close(&self, reason: Option<Error>) {
        if self.closed.swap(true, Ordering::Relaxed) {
            return;
        }
        self.connected.store(false, Ordering::Relaxed);
        info!("{:?} Closing", self);

        if let Some(tcp_stream) = self.tcp_writer.lock().unwrap().as_mut() {
            if let Err(e) = tcp_stream.shutdown(Shutdown::Both) {
                warn!("{:?} Problem shutting down tcp stream: {:?}", self, e);
            }
        }

        if let Some(events) = self.events.lock().unwrap().take() {
            events.emit(ConnectionEvent::Disconnected(reason));
        }
    }

    fn emit(&self, event: ConnectionEvent) {
        if let Some(events) = &*self.events.lock().unwrap() {
            events.emit(event);
        }
    }
}

impl fmt::Debug for Inner {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&format!("[Connection {}]", self.addr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::peer::session::Command;
    use std::net::TcpListener;
    use std::sync::mpsc::{channel, Receiver};
    use std::time::Duration;

    fn test_config() -> TcpConfig {
        TcpConfig {
            connect_timeout: Duration::from_secs(2),
            read_poll: Duration::from_millis(50),
            tick_interval: Duration::from_millis(20),
            keepalive_after: Duration::from_secs(60),
            idle_timeout: Duration::from_secs(120),
        }
    }

    /// Next event other than a tick
    fn next_event(rx: &Receiver<Command>) -> ConnectionEvent {
        loop {
            match rx.recv_timeout(Duration::from_secs(5)).unwrap() {
                Command::Connection(ConnectionEvent::TimePeriodPassed) => continue,
                Command::Connection(event) => return event,
                c => panic!("Unexpected {:?}", c),
            }
        }
    }

    #[test]
    fn loopback() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let magic = Network::Mainnet.magic();
        let conn = TcpConnection::new(addr, Network::Mainnet, test_config());
        assert!(conn.send(&Message::Verack).is_err());

        let (tx, rx) = channel();
        conn.connect(ConnectionEvents::new(tx.clone())).unwrap();
        assert!(conn.connect(ConnectionEvents::new(tx)).is_err());
        let (mut server, _) = listener.accept().unwrap();

        match next_event(&rx) {
            ConnectionEvent::ConnectedForWrite => {}
            e => panic!("Unexpected {:?}", e),
        }
        assert!(conn.connected());
        assert!(conn.host() == addr);

        conn.send(&Message::Ping(Ping { nonce: 5 })).unwrap();
        let received = Message::read(&mut server, magic).unwrap();
        assert!(received == Message::Ping(Ping { nonce: 5 }));

        Message::Verack.write(&mut server, magic).unwrap();
        server.flush().unwrap();
        match next_event(&rx) {
            ConnectionEvent::MessageReceived(Message::Verack) => {}
            e => panic!("Unexpected {:?}", e),
        }

        drop(server);
        match next_event(&rx) {
            ConnectionEvent::Disconnected(Some(Error::IOError(_))) => {}
            e => panic!("Unexpected {:?}", e),
        }
        assert!(!conn.connected());
        assert!(conn.send(&Message::Verack).is_err());
    }

    #[test]
    fn disconnect_reports_once() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let conn = TcpConnection::new(addr, Network::Mainnet, test_config());
        let (tx, rx) = channel();
        conn.connect(ConnectionEvents::new(tx)).unwrap();
        let (_server, _) = listener.accept().unwrap();
        match next_event(&rx) {
            ConnectionEvent::ConnectedForWrite => {}
            e => panic!("Unexpected {:?}", e),
        }

        conn.disconnect(None);
        conn.disconnect(Some(&Error::Timeout));
        match next_event(&rx) {
            ConnectionEvent::Disconnected(None) => {}
            e => panic!("Unexpected {:?}", e),
        }
        thread::sleep(Duration::from_millis(100));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn idle_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let config = TcpConfig {
            keepalive_after: Duration::from_millis(50),
            idle_timeout: Duration::from_millis(300),
            ..test_config()
        };
        let conn = TcpConnection::new(addr, Network::Mainnet, config);
        let (tx, rx) = channel();
        conn.connect(ConnectionEvents::new(tx)).unwrap();
        let (mut server, _) = listener.accept().unwrap();
        match next_event(&rx) {
            ConnectionEvent::ConnectedForWrite => {}
            e => panic!("Unexpected {:?}", e),
        }

        // A silent remote is pinged, then dropped
        match Message::read(&mut server, Network::Mainnet.magic()).unwrap() {
            Message::Ping(_) => {}
            m => panic!("Unexpected {:?}", m),
        }
        match next_event(&rx) {
            ConnectionEvent::Disconnected(Some(Error::Timeout)) => {}
            e => panic!("Unexpected {:?}", e),
        }
    }

    #[test]
    fn refused() {
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap()
        };
        let conn = TcpConnection::new(addr, Network::Mainnet, test_config());
        let (tx, rx) = channel();
        conn.connect(ConnectionEvents::new(tx)).unwrap();
        match next_event(&rx) {
            ConnectionEvent::Disconnected(Some(_)) => {}
            e => panic!("Unexpected {:?}", e),
        }
        assert!(!conn.connected());
    }
}
