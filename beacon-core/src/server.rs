//! Host-driven API: the host calls `advance(now)` at its own cadence; the server announces,
//! drains and routes whatever the transport has received, and answers through the transport.

use tracing::{debug, info, trace};

use crate::announcer::HeartbeatTimer;
use crate::data::{data_message, DataPacket};
use crate::endpoint::ServerEndpoint;
use crate::handshake::{wire_timestamp, Ping};
use crate::protocol::{Message, Received, ADDR_DATA, ADDR_PING};
use crate::recent::{RecentSubjects, TrimPolicy};
use crate::registry::{ClientRegistry, Registration, SendTarget};
use crate::transport::Transport;

/// Receives every decoded `/data` packet, synchronously inside `advance`.
pub trait PacketSink {
    fn on_packet(&mut self, from: &str, packet: DataPacket);
}

impl<F> PacketSink for F
where
    F: FnMut(&str, DataPacket),
{
    fn on_packet(&mut self, from: &str, packet: DataPacket) {
        self(from, packet)
    }
}

/// What one `advance` call did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub hellos_sent: usize,
    pub pings_handled: usize,
    pub packets_delivered: usize,
    pub messages_discarded: usize,
    pub clients_evicted: usize,
}

impl TickReport {
    pub fn messages_handled(&self) -> usize {
        self.pings_handled + self.packets_delivered + self.messages_discarded
    }
}

/// Discovery and data server. Exists only once initialized, so every operation is live.
pub struct BeaconServer<T, S> {
    endpoint: ServerEndpoint,
    transport: T,
    sink: S,
    clients: ClientRegistry,
    recent: RecentSubjects,
    heartbeat: HeartbeatTimer,
    /// `None`: drain everything the transport holds each tick.
    max_messages_per_tick: Option<usize>,
    /// `None`: sessions live until removed.
    client_idle_timeout: Option<u64>,
}

impl<T: Transport, S: PacketSink> BeaconServer<T, S> {
    pub fn init(endpoint: ServerEndpoint, transport: T, sink: S) -> Result<Self, InitError> {
        if endpoint.host.trim().is_empty() {
            return Err(InitError::EmptyHost);
        }
        if endpoint.send_port == 0 {
            return Err(InitError::ZeroPort("send"));
        }
        if endpoint.receive_port == 0 {
            return Err(InitError::ZeroPort("receive"));
        }
        info!(endpoint = %endpoint, "beacon server initialised");
        Ok(Self {
            endpoint,
            transport,
            sink,
            clients: ClientRegistry::new(),
            recent: RecentSubjects::default(),
            heartbeat: HeartbeatTimer::default(),
            max_messages_per_tick: None,
            client_idle_timeout: None,
        })
    }

    /// Set the time between `/hello` announcements in ms.
    pub fn set_hello_interval(&mut self, interval: u64) {
        self.heartbeat.set_interval(interval);
    }

    /// Cap inbound messages routed per tick; the rest wait in the transport.
    /// `Some(0)` would starve the inbound path and is treated as no cap.
    pub fn set_max_messages_per_tick(&mut self, max: Option<usize>) {
        self.max_messages_per_tick = max.filter(|&m| m > 0);
    }

    /// Evict clients that have not pinged for longer than `timeout` ms.
    pub fn set_client_idle_timeout(&mut self, timeout: Option<u64>) {
        self.client_idle_timeout = timeout;
    }

    pub fn set_trim_policy(&mut self, policy: TrimPolicy) {
        self.recent.set_policy(policy);
    }

    /// One cooperative step: announce if due, drain and route inbound, trim the recent log.
    pub fn advance(&mut self, now: u64) -> TickReport {
        let mut report = TickReport::default();

        if let Some(hello) = self.heartbeat.poll(now, self.endpoint.receive_port) {
            send_multicast_logged(&mut self.transport, &hello);
            report.hellos_sent += 1;
        }

        while self
            .max_messages_per_tick
            .map_or(true, |max| report.messages_handled() < max)
            && self.transport.has_waiting_message()
        {
            let Some(received) = self.transport.next_message() else {
                break;
            };
            self.route(received, now, &mut report);
        }

        self.recent.trim();

        if let Some(timeout) = self.client_idle_timeout {
            for host in self.clients.evict_idle(now, timeout) {
                info!(host = %host, "client evicted after idle timeout");
                report.clients_evicted += 1;
            }
        }
        report
    }

    fn route(&mut self, received: Received, now: u64, report: &mut TickReport) {
        let Received {
            message,
            remote_host,
        } = received;
        match message.address.as_str() {
            ADDR_PING => {
                if self.handle_ping(&message, &remote_host, now) {
                    report.pings_handled += 1;
                } else {
                    report.messages_discarded += 1;
                }
            }
            ADDR_DATA => {
                let packet = DataPacket::from_message(&message);
                debug!(
                    host = %remote_host,
                    ints = packet.ints.len(),
                    floats = packet.floats.len(),
                    strings = packet.strings.len(),
                    "data packet received"
                );
                self.sink.on_packet(&remote_host, packet);
                report.packets_delivered += 1;
            }
            other => {
                trace!(address = other, host = %remote_host, "discarding message");
                report.messages_discarded += 1;
            }
        }
    }

    fn handle_ping(&mut self, msg: &Message, host: &str, now: u64) -> bool {
        let Some(ping) = Ping::parse(msg) else {
            debug!(host = %host, args = msg.args.len(), "malformed ping dropped");
            return false;
        };
        if self.clients.register_or_update(host, self.endpoint.send_port, now) == Registration::New
        {
            info!(host = %host, id = ping.remote_id, "client registered");
        }
        self.recent.push(host);

        let pong = ping.pong(wire_timestamp(now));
        let target = SendTarget::new(host, self.endpoint.send_port);
        send_logged(&mut self.transport, &target, &pong);
        // Also multicast: the unicast path may have just been created and can lose the race.
        send_multicast_logged(&mut self.transport, &pong);
        debug!(host = %host, id = ping.remote_id, "pong sent");
        true
    }

    /// Register `host` without a ping, so it can be addressed by `send_to`.
    pub fn register_client(&mut self, host: &str, now: u64) -> Registration {
        self.clients.register_or_update(host, self.endpoint.send_port, now)
    }

    /// Send `/data [strings.., ints.., floats..]` to every registered client. Returns the count.
    pub fn broadcast<Str: AsRef<str>>(
        &mut self,
        strings: &[Str],
        ints: &[i32],
        floats: &[f32],
    ) -> usize {
        let msg = data_message(strings, ints, floats);
        self.broadcast_message(&msg)
    }

    /// Send `/data [strings.., ints.., floats..]` to one registered client.
    pub fn send_to<Str: AsRef<str>>(
        &mut self,
        strings: &[Str],
        ints: &[i32],
        floats: &[f32],
        host: &str,
    ) -> Result<(), SendError> {
        let msg = data_message(strings, ints, floats);
        self.send_message_to(&msg, host)
    }

    pub fn broadcast_packet(&mut self, packet: &DataPacket) -> usize {
        self.broadcast_message(&packet.to_message())
    }

    pub fn send_packet_to(&mut self, packet: &DataPacket, host: &str) -> Result<(), SendError> {
        self.send_message_to(&packet.to_message(), host)
    }

    fn broadcast_message(&mut self, msg: &Message) -> usize {
        let mut sent = 0;
        for session in self.clients.sessions() {
            send_logged(&mut self.transport, &session.target, msg);
            sent += 1;
        }
        sent
    }

    fn send_message_to(&mut self, msg: &Message, host: &str) -> Result<(), SendError> {
        let session = self
            .clients
            .lookup(host)
            .ok_or_else(|| SendError::UnknownClient(host.to_owned()))?;
        send_logged(&mut self.transport, &session.target, msg);
        Ok(())
    }

    pub fn endpoint(&self) -> &ServerEndpoint {
        &self.endpoint
    }

    pub fn clients(&self) -> &ClientRegistry {
        &self.clients
    }

    pub fn recent_subjects(&self) -> &RecentSubjects {
        &self.recent
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}

fn send_logged<T: Transport>(transport: &mut T, target: &SendTarget, msg: &Message) {
    if let Err(e) = transport.send_to(target, msg) {
        debug!(dest = %target, address = %msg.address, error = %e, "send failed");
    }
}

fn send_multicast_logged<T: Transport>(transport: &mut T, msg: &Message) {
    if let Err(e) = transport.send_multicast(msg) {
        debug!(address = %msg.address, error = %e, "multicast send failed");
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum InitError {
    #[error("send host is empty")]
    EmptyHost,
    #[error("{0} port must be non-zero")]
    ZeroPort(&'static str),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SendError {
    #[error("unknown client: {0}")]
    UnknownClient(String),
}
