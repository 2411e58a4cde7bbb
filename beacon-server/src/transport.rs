//! UDP transport: non-blocking receiver on the receive port, one sender socket for client
//! unicast and the multicast destination `(host, send_port)`.

use std::collections::VecDeque;
use std::io::ErrorKind;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, ToSocketAddrs, UdpSocket};

use beacon_core::wire::{decode_packet, encode_message, MAX_DATAGRAM_LEN};
use beacon_core::{Message, Received, SendTarget, ServerEndpoint, Transport, TransportError};
use tracing::{debug, info};

pub struct UdpTransport {
    receiver: UdpSocket,
    sender: UdpSocket,
    multicast_dest: SocketAddr,
    pending: VecDeque<Received>,
    buf: Vec<u8>,
}

impl UdpTransport {
    /// Bind the receive port and resolve the multicast destination. Joins the group when
    /// `host` is an IPv4 multicast address so the server also hears clients pinging the group.
    pub fn bind(endpoint: &ServerEndpoint) -> Result<Self, TransportError> {
        let multicast_dest = resolve(&endpoint.host, endpoint.send_port)?;

        let receiver = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, endpoint.receive_port))?;
        if let IpAddr::V4(group) = multicast_dest.ip() {
            if group.is_multicast() {
                receiver.join_multicast_v4(&group, &Ipv4Addr::UNSPECIFIED)?;
                info!(group = %group, "joined multicast group");
            }
        }
        receiver.set_nonblocking(true)?;

        let sender = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
        sender.set_multicast_ttl_v4(1)?;
        sender.set_multicast_loop_v4(true)?;
        sender.set_broadcast(true)?;
        sender.set_nonblocking(true)?;

        Ok(Self {
            receiver,
            sender,
            multicast_dest,
            pending: VecDeque::new(),
            buf: vec![0u8; MAX_DATAGRAM_LEN],
        })
    }

    pub fn local_receive_addr(&self) -> std::io::Result<SocketAddr> {
        self.receiver.local_addr()
    }

    /// Read datagrams until one decodes into at least one message or the socket is drained.
    fn fill(&mut self) {
        while self.pending.is_empty() {
            let (n, from) = match self.receiver.recv_from(&mut self.buf) {
                Ok(r) => r,
                Err(e) if e.kind() == ErrorKind::WouldBlock => return,
                Err(e) => {
                    debug!(error = %e, "receive failed");
                    return;
                }
            };
            match decode_packet(&self.buf[..n]) {
                Ok(messages) => {
                    let host = from.ip().to_string();
                    self.pending.extend(
                        messages
                            .into_iter()
                            .map(|m| Received::new(m, host.clone())),
                    );
                }
                Err(e) => debug!(from = %from, error = %e, "dropping undecodable datagram"),
            }
        }
    }

    fn send_bytes(&self, msg: &Message, dest: SocketAddr) -> Result<(), TransportError> {
        let bytes = encode_message(msg)?;
        self.sender.send_to(&bytes, dest)?;
        Ok(())
    }
}

impl Transport for UdpTransport {
    fn has_waiting_message(&mut self) -> bool {
        self.fill();
        !self.pending.is_empty()
    }

    fn next_message(&mut self) -> Option<Received> {
        self.fill();
        self.pending.pop_front()
    }

    fn send_to(&mut self, target: &SendTarget, msg: &Message) -> Result<(), TransportError> {
        let dest = resolve(&target.host, target.port)?;
        self.send_bytes(msg, dest)
    }

    fn send_multicast(&mut self, msg: &Message) -> Result<(), TransportError> {
        self.send_bytes(msg, self.multicast_dest)
    }
}

/// Literal addresses resolve without a lookup; hostnames go through the system resolver.
fn resolve(host: &str, port: u16) -> Result<SocketAddr, TransportError> {
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, port));
    }
    (host, port)
        .to_socket_addrs()?
        .find(SocketAddr::is_ipv4)
        .ok_or_else(|| TransportError::Resolve(host.to_owned()))
}
