//! Periodic `/hello` on the multicast channel so clients can find the server passively.

use crate::protocol::Message;

/// Default time between announcements.
pub const DEFAULT_HELLO_INTERVAL_MS: u64 = 3_000;

#[derive(Debug, Clone)]
pub struct HeartbeatTimer {
    last_sent_at: Option<u64>,
    interval: u64,
}

impl HeartbeatTimer {
    pub fn new(interval: u64) -> Self {
        Self {
            last_sent_at: None,
            interval,
        }
    }

    /// True when nothing was sent yet or more than `interval` ms have passed.
    pub fn is_due(&self, now: u64) -> bool {
        match self.last_sent_at {
            None => true,
            Some(last) => now.saturating_sub(last) > self.interval,
        }
    }

    /// If due, record `now` as the send time and return the hello to send.
    pub fn poll(&mut self, now: u64, receive_port: u16) -> Option<Message> {
        if !self.is_due(now) {
            return None;
        }
        self.last_sent_at = Some(now);
        Some(Message::hello(receive_port))
    }

    pub fn set_interval(&mut self, interval: u64) {
        self.interval = interval;
    }

    pub fn last_sent_at(&self) -> Option<u64> {
        self.last_sent_at
    }
}

impl Default for HeartbeatTimer {
    fn default() -> Self {
        Self::new(DEFAULT_HELLO_INTERVAL_MS)
    }
}
