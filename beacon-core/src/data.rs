//! Data channel: `/data` messages to and from type-segregated packets.

use crate::protocol::{Arg, Message, ADDR_DATA};

/// Decoded `/data` payload. Each list keeps the relative order of its own type;
/// the interleaving between types is not recorded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataPacket {
    pub ints: Vec<i32>,
    pub floats: Vec<f32>,
    pub strings: Vec<String>,
}

impl DataPacket {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.ints.is_empty() && self.floats.is_empty() && self.strings.is_empty()
    }

    /// Decode a message's arguments. Ints (32 or 64 bit) go to `ints`, 32-bit floats to `floats`,
    /// strings to `strings`; every other type (doubles included) is skipped.
    pub fn from_message(msg: &Message) -> Self {
        let mut packet = DataPacket::new();
        for arg in &msg.args {
            match arg {
                Arg::Int(v) => packet.ints.push(*v),
                Arg::Long(v) => packet.ints.push(*v as i32),
                Arg::Float(v) => packet.floats.push(*v),
                Arg::String(s) => packet.strings.push(s.clone()),
                _ => {}
            }
        }
        packet
    }

    /// Encode as `/data`: strings, then ints, then floats.
    pub fn to_message(&self) -> Message {
        data_message(&self.strings, &self.ints, &self.floats)
    }
}

/// Build a `/data` message with arguments in wire order: all strings, all ints, all floats.
pub fn data_message<S: AsRef<str>>(strings: &[S], ints: &[i32], floats: &[f32]) -> Message {
    let mut args = Vec::with_capacity(strings.len() + ints.len() + floats.len());
    args.extend(strings.iter().map(|s| Arg::String(s.as_ref().to_owned())));
    args.extend(ints.iter().map(|&v| Arg::Int(v)));
    args.extend(floats.iter().map(|&v| Arg::Float(v)));
    Message {
        address: ADDR_DATA.to_owned(),
        args,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_segregates_by_type() {
        let msg = Message::new(ADDR_DATA)
            .with_arg(1)
            .with_arg("x")
            .with_arg(2.5f32);
        let packet = DataPacket::from_message(&msg);
        assert_eq!(packet.ints, vec![1]);
        assert_eq!(packet.strings, vec!["x".to_string()]);
        assert_eq!(packet.floats, vec![2.5]);
    }

    #[test]
    fn decode_keeps_per_type_order_and_skips_others() {
        let msg = Message::new(ADDR_DATA)
            .with_arg(Arg::Long(7))
            .with_arg(Arg::Blob(vec![1]))
            .with_arg("b")
            .with_arg(3)
            .with_arg(Arg::Nil)
            .with_arg(1.5f32)
            .with_arg("c")
            .with_arg(Arg::True);
        let packet = DataPacket::from_message(&msg);
        assert_eq!(packet.ints, vec![7, 3]);
        assert_eq!(packet.floats, vec![1.5]);
        assert_eq!(packet.strings, vec!["b".to_string(), "c".to_string()]);
    }

    #[test]
    fn doubles_and_chars_are_not_data() {
        let msg = Message::new(ADDR_DATA)
            .with_arg(Arg::Double(0.5))
            .with_arg(Arg::Char('q'))
            .with_arg(Arg::TimeTag(1))
            .with_arg(2);
        let packet = DataPacket::from_message(&msg);
        assert!(packet.floats.is_empty());
        assert!(packet.strings.is_empty());
        assert_eq!(packet.ints, vec![2]);
    }

    #[test]
    fn encode_orders_strings_ints_floats() {
        let msg = data_message(&["a"], &[1, 2], &[3.5]);
        assert_eq!(msg.address, ADDR_DATA);
        assert_eq!(
            msg.args,
            vec![
                Arg::String("a".into()),
                Arg::Int(1),
                Arg::Int(2),
                Arg::Float(3.5)
            ]
        );
    }

    #[test]
    fn packet_encoding_loses_interleaving() {
        let msg = Message::new(ADDR_DATA)
            .with_arg(2.0f32)
            .with_arg(9)
            .with_arg("z");
        let reencoded = DataPacket::from_message(&msg).to_message();
        assert_eq!(
            reencoded.args,
            vec![Arg::String("z".into()), Arg::Int(9), Arg::Float(2.0)]
        );
    }

    #[test]
    fn empty_packet() {
        assert!(DataPacket::new().is_empty());
        assert!(DataPacket::new().to_message().args.is_empty());
    }
}
