//! Transport seam. The host owns the sockets; the server only pushes messages through this trait
//! and pulls whatever has already arrived. Implementations must never block.

use crate::protocol::{Message, Received};
use crate::registry::SendTarget;
use crate::wire::EncodeError;

pub trait Transport {
    /// Whether a received message is ready to pop.
    fn has_waiting_message(&mut self) -> bool;

    /// Pop the next received message, if any.
    fn next_message(&mut self) -> Option<Received>;

    /// Fire-and-forget unicast to one client.
    fn send_to(&mut self, target: &SendTarget, msg: &Message) -> Result<(), TransportError>;

    /// Fire-and-forget send on the multicast channel.
    fn send_multicast(&mut self, msg: &Message) -> Result<(), TransportError>;
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),
    #[error("cannot resolve {0}")]
    Resolve(String),
}
