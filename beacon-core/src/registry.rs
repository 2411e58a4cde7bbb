//! Client registry: one session per remote host, keyed by host address only.
//!
//! Two clients behind the same address (NAT, several processes on one machine) share a session.

use std::collections::HashMap;
use std::fmt;

/// Unicast destination for one client.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SendTarget {
    pub host: String,
    pub port: u16,
}

impl SendTarget {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for SendTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Per-client state.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientSession {
    pub host: String,
    pub target: SendTarget,
    /// Clock sample of the last ping (or explicit registration) from this host.
    pub last_seen_millis: u64,
}

/// Outcome of [`ClientRegistry::register_or_update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    New,
    Updated,
}

#[derive(Debug, Default)]
pub struct ClientRegistry {
    sessions: HashMap<String, ClientSession>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session for `host`, if registered. Never inserts.
    pub fn lookup(&self, host: &str) -> Option<&ClientSession> {
        self.sessions.get(host)
    }

    /// Insert or refresh the session for `host`, (re)binding its target to `(host, send_port)`.
    pub fn register_or_update(&mut self, host: &str, send_port: u16, now: u64) -> Registration {
        match self.sessions.get_mut(host) {
            Some(session) => {
                session.target = SendTarget::new(host, send_port);
                session.last_seen_millis = now;
                Registration::Updated
            }
            None => {
                self.sessions.insert(
                    host.to_owned(),
                    ClientSession {
                        host: host.to_owned(),
                        target: SendTarget::new(host, send_port),
                        last_seen_millis: now,
                    },
                );
                Registration::New
            }
        }
    }

    pub fn remove(&mut self, host: &str) -> Option<ClientSession> {
        self.sessions.remove(host)
    }

    /// Remove sessions not seen for longer than `max_idle` ms. Returns the evicted hosts.
    pub fn evict_idle(&mut self, now: u64, max_idle: u64) -> Vec<String> {
        let stale: Vec<String> = self
            .sessions
            .values()
            .filter(|s| now.saturating_sub(s.last_seen_millis) > max_idle)
            .map(|s| s.host.clone())
            .collect();
        for host in &stale {
            self.sessions.remove(host);
        }
        stale
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn sessions(&self) -> impl Iterator<Item = &ClientSession> {
        self.sessions.values()
    }
}
