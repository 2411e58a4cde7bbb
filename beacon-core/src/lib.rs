//! Beacon protocol engine: LAN discovery and small-data exchange over OSC.
//! Host-driven: no sockets and no clock; the host supplies a transport and calls `advance(now)`.

pub mod announcer;
pub mod data;
pub mod endpoint;
pub mod handshake;
pub mod protocol;
pub mod recent;
pub mod registry;
pub mod server;
pub mod transport;
pub mod wire;

pub use data::{data_message, DataPacket};
pub use endpoint::ServerEndpoint;
pub use protocol::{Arg, Message, Received};
pub use recent::TrimPolicy;
pub use registry::{ClientRegistry, ClientSession, Registration, SendTarget};
pub use server::{BeaconServer, InitError, PacketSink, SendError, TickReport};
pub use transport::{Transport, TransportError};
pub use wire::{decode_packet, encode_message, DecodeError, EncodeError};
