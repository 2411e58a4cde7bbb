//! Resolved server endpoint: where the server sends and the port it listens on.

use std::fmt;

use serde::{Deserialize, Serialize};

pub const DEFAULT_SEND_HOST: &str = "127.0.0.1";
pub const DEFAULT_SEND_PORT: u16 = 7776;
pub const DEFAULT_RECEIVE_PORT: u16 = 7777;

/// `host` doubles as the multicast destination; clients are answered on `send_port`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerEndpoint {
    /// Multicast/send host (default 127.0.0.1).
    #[serde(default = "default_send_host")]
    pub host: String,
    /// Port clients listen on (default 7776).
    #[serde(default = "default_send_port")]
    pub send_port: u16,
    /// Port the server listens on, announced in `/hello` (default 7777).
    #[serde(default = "default_receive_port")]
    pub receive_port: u16,
}

fn default_send_host() -> String {
    DEFAULT_SEND_HOST.to_owned()
}
fn default_send_port() -> u16 {
    DEFAULT_SEND_PORT
}
fn default_receive_port() -> u16 {
    DEFAULT_RECEIVE_PORT
}

impl ServerEndpoint {
    pub fn new(host: impl Into<String>, send_port: u16, receive_port: u16) -> Self {
        Self {
            host: host.into(),
            send_port,
            receive_port,
        }
    }
}

impl Default for ServerEndpoint {
    fn default() -> Self {
        Self {
            host: default_send_host(),
            send_port: default_send_port(),
            receive_port: default_receive_port(),
        }
    }
}

impl fmt::Display for ServerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "sending to {}:{}, listening on port {}",
            self.host, self.send_port, self.receive_port
        )
    }
}
