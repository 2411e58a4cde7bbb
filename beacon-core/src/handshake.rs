//! Ping/pong handshake: a client's `/ping [id, t]` is answered with `/pong [id, server_now, t]`,
//! which gives the client what it needs to estimate round-trip time and clock offset.

use crate::protocol::{Message, ADDR_PING};

/// Parsed `/ping`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ping {
    pub remote_id: i32,
    pub remote_timestamp: i32,
}

impl Ping {
    /// Read a `/ping`. `None` if the address differs or either argument is missing or non-numeric.
    pub fn parse(msg: &Message) -> Option<Self> {
        if msg.address != ADDR_PING {
            return None;
        }
        Some(Ping {
            remote_id: msg.arg_as_i32(0)?,
            remote_timestamp: msg.arg_as_i32(1)?,
        })
    }

    /// The reply carrying `server_now` between the echoed id and timestamp.
    pub fn pong(&self, server_now: i32) -> Message {
        Message::pong(self.remote_id, server_now, self.remote_timestamp)
    }
}

/// Fold a millisecond clock into the non-negative `i32` range used on the wire.
pub fn wire_timestamp(now: u64) -> i32 {
    (now % (1u64 << 31)) as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Arg;

    #[test]
    fn parse_and_reply() {
        let msg = Message::new(ADDR_PING).with_arg(12).with_arg(345);
        let ping = Ping::parse(&msg).unwrap();
        assert_eq!(
            ping,
            Ping {
                remote_id: 12,
                remote_timestamp: 345
            }
        );
        assert_eq!(
            ping.pong(900).args,
            vec![Arg::Int(12), Arg::Int(900), Arg::Int(345)]
        );
    }

    #[test]
    fn short_ping_is_rejected() {
        let msg = Message::new(ADDR_PING).with_arg(12);
        assert!(Ping::parse(&msg).is_none());
        let msg = Message::new(ADDR_PING).with_arg("id").with_arg(1);
        assert!(Ping::parse(&msg).is_none());
    }

    #[test]
    fn wrong_address_is_rejected() {
        let msg = Message::new("/pong").with_arg(1).with_arg(2);
        assert!(Ping::parse(&msg).is_none());
    }

    #[test]
    fn wire_timestamp_stays_non_negative() {
        assert_eq!(wire_timestamp(0), 0);
        assert_eq!(wire_timestamp(1_234), 1_234);
        assert_eq!(wire_timestamp(i32::MAX as u64), i32::MAX);
        assert_eq!(wire_timestamp(i32::MAX as u64 + 1), 0);
        assert!(wire_timestamp(u64::MAX) >= 0);
    }
}
