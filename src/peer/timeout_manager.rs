use std::sync::Mutex;
use std::time::{Duration, Instant};

/// What a connection should do about a period of silence
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Liveness {
    /// Traffic arrived recently enough
    Active,
    /// Quiet for a while. Ping the remote to provoke traffic.
    KeepAlive,
    /// Quiet for too long. Drop the connection.
    Expired,
}

struct Activity {
    last_recv: Instant,
    pinged: bool,
}

/// Tracks inbound traffic on a connection to decide on keep-alives and idle expiry
///
/// Only the connection's ticker consults it. Peers never see wall-clock time; they
/// are driven by the ticks the connection forwards.
pub struct TimeoutManager {
    keepalive_after: Duration,
    idle_timeout: Duration,
    activity: Mutex<Activity>,
}

impl TimeoutManager {
    pub fn new(keepalive_after: Duration, idle_timeout: Duration) -> TimeoutManager {
        TimeoutManager {
            keepalive_after,
            idle_timeout,
            activity: Mutex::new(Activity {
                last_recv: Instant::now(),
                pinged: false,
            }),
        }
    }

    /// Records that traffic arrived
    pub fn touch(&self) {
        let mut activity = self.activity.lock().unwrap();
        activity.last_recv = Instant::now();
        activity.pinged = false;
    }

    /// Time since traffic last arrived
    pub fn idle(&self) -> Duration {
        self.activity.lock().unwrap().last_recv.elapsed()
    }

    /// Classifies the current silence. Asks for at most one keep-alive per silence.
    pub fn check(&self) -> Liveness {
        let mut activity = self.activity.lock().unwrap();
        let idle = activity.last_recv.elapsed();
        if idle >= self.idle_timeout {
            Liveness::Expired
        } else if idle >= self.keepalive_after && !activity.pinged {
            activity.pinged = true;
            Liveness::KeepAlive
        } else {
            Liveness::Active
        }
    }
}
