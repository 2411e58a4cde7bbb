//! Wire format: OSC 1.0 via `rosc`. This module only converts between `rosc` packets and the
//! protocol types, and flattens bundles into their messages.

use rosc::{OscBundle, OscColor, OscMessage, OscMidiMessage, OscPacket, OscTime, OscType};

use crate::protocol::{Arg, Message};

/// Largest payload a single UDP datagram can carry over IPv4.
pub const MAX_DATAGRAM_LEN: usize = 65_507;
/// Time tag meaning "immediately".
pub const IMMEDIATE: u64 = 1;

/// Encode one message into an OSC packet.
pub fn encode_message(msg: &Message) -> Result<Vec<u8>, EncodeError> {
    encode(&OscPacket::Message(to_osc(msg)?))
}

/// Encode messages into a single bundle with the given time tag.
pub fn encode_bundle(time_tag: u64, messages: &[Message]) -> Result<Vec<u8>, EncodeError> {
    let content = messages
        .iter()
        .map(|m| to_osc(m).map(OscPacket::Message))
        .collect::<Result<Vec<_>, _>>()?;
    encode(&OscPacket::Bundle(OscBundle {
        timetag: time_from_u64(time_tag),
        content,
    }))
}

fn encode(packet: &OscPacket) -> Result<Vec<u8>, EncodeError> {
    let bytes = rosc::encoder::encode(packet).map_err(EncodeError::Osc)?;
    if bytes.len() > MAX_DATAGRAM_LEN {
        return Err(EncodeError::TooLarge(bytes.len()));
    }
    Ok(bytes)
}

fn to_osc(msg: &Message) -> Result<OscMessage, EncodeError> {
    if !msg.address.starts_with('/') {
        return Err(EncodeError::InvalidAddress(msg.address.clone()));
    }
    Ok(OscMessage {
        addr: msg.address.clone(),
        args: msg.args.iter().map(arg_to_osc).collect(),
    })
}

fn arg_to_osc(arg: &Arg) -> OscType {
    match arg {
        Arg::Int(v) => OscType::Int(*v),
        Arg::Long(v) => OscType::Long(*v),
        Arg::Float(v) => OscType::Float(*v),
        Arg::Double(v) => OscType::Double(*v),
        Arg::String(s) => OscType::String(s.clone()),
        Arg::Blob(b) => OscType::Blob(b.clone()),
        Arg::TimeTag(t) => OscType::Time(time_from_u64(*t)),
        Arg::Char(c) => OscType::Char(*c),
        Arg::Color(rgba) => {
            let [red, green, blue, alpha] = rgba.to_be_bytes();
            OscType::Color(OscColor {
                red,
                green,
                blue,
                alpha,
            })
        }
        Arg::Midi([port, status, data1, data2]) => OscType::Midi(OscMidiMessage {
            port: *port,
            status: *status,
            data1: *data1,
            data2: *data2,
        }),
        Arg::True => OscType::Bool(true),
        Arg::False => OscType::Bool(false),
        Arg::Nil => OscType::Nil,
        Arg::Impulse => OscType::Inf,
    }
}

/// Error encoding a message (bad address, rosc failure, size limit).
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("address must start with '/': {0:?}")]
    InvalidAddress(String),
    #[error("osc encode error: {0:?}")]
    Osc(rosc::OscError),
    #[error("packet too large ({0} bytes)")]
    TooLarge(usize),
}

/// Decode a datagram into the messages it carries. Bundles (nested included) are flattened in order.
pub fn decode_packet(bytes: &[u8]) -> Result<Vec<Message>, DecodeError> {
    let (_, packet) = rosc::decoder::decode_udp(bytes).map_err(DecodeError::Osc)?;
    let mut out = Vec::new();
    flatten(packet, &mut out)?;
    Ok(out)
}

fn flatten(packet: OscPacket, out: &mut Vec<Message>) -> Result<(), DecodeError> {
    match packet {
        OscPacket::Message(m) => out.push(from_osc(m)?),
        OscPacket::Bundle(b) => {
            for p in b.content {
                flatten(p, out)?;
            }
        }
    }
    Ok(())
}

fn from_osc(m: OscMessage) -> Result<Message, DecodeError> {
    if !m.addr.starts_with('/') {
        return Err(DecodeError::InvalidAddress(m.addr));
    }
    let mut args = Vec::with_capacity(m.args.len());
    for a in m.args {
        push_arg(a, &mut args);
    }
    Ok(Message {
        address: m.addr,
        args,
    })
}

// Arrays carry no meaning for this protocol; their contents are read as plain arguments.
fn push_arg(a: OscType, out: &mut Vec<Arg>) {
    let arg = match a {
        OscType::Int(v) => Arg::Int(v),
        OscType::Long(v) => Arg::Long(v),
        OscType::Float(v) => Arg::Float(v),
        OscType::Double(v) => Arg::Double(v),
        OscType::String(s) => Arg::String(s),
        OscType::Blob(b) => Arg::Blob(b),
        OscType::Time(t) => Arg::TimeTag(time_to_u64(t)),
        OscType::Char(c) => Arg::Char(c),
        OscType::Color(c) => Arg::Color(u32::from_be_bytes([c.red, c.green, c.blue, c.alpha])),
        OscType::Midi(m) => Arg::Midi([m.port, m.status, m.data1, m.data2]),
        OscType::Bool(true) => Arg::True,
        OscType::Bool(false) => Arg::False,
        OscType::Nil => Arg::Nil,
        OscType::Inf => Arg::Impulse,
        OscType::Array(array) => {
            for inner in array.content {
                push_arg(inner, out);
            }
            return;
        }
    };
    out.push(arg);
}

fn time_from_u64(t: u64) -> OscTime {
    OscTime {
        seconds: (t >> 32) as u32,
        fractional: t as u32,
    }
}

fn time_to_u64(t: OscTime) -> u64 {
    (u64::from(t.seconds) << 32) | u64::from(t.fractional)
}

/// Error decoding a datagram (rosc failure or an address without a leading '/').
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("osc decode error: {0:?}")]
    Osc(rosc::OscError),
    #[error("address must start with '/': {0:?}")]
    InvalidAddress(String),
}

#[cfg(test)]
mod tests {
    use rosc::OscArray;

    use super::*;
    use crate::protocol::{ADDR_DATA, ADDR_PING};

    #[test]
    fn ping_bytes_match_osc_layout() {
        let msg = Message::new(ADDR_PING).with_arg(3).with_arg(1000);
        let bytes = encode_message(&msg).unwrap();
        let mut expected = Vec::new();
        expected.extend_from_slice(b"/ping\0\0\0");
        expected.extend_from_slice(b",ii\0");
        expected.extend_from_slice(&3i32.to_be_bytes());
        expected.extend_from_slice(&1000i32.to_be_bytes());
        assert_eq!(bytes, expected);
    }

    #[test]
    fn mixed_data_roundtrip() {
        let msg = Message::new(ADDR_DATA)
            .with_arg("abc")
            .with_arg(Arg::Long(-9))
            .with_arg(Arg::Double(0.25))
            .with_arg(Arg::Blob(vec![1, 2, 3, 4, 5]))
            .with_arg(Arg::True)
            .with_arg(Arg::Midi([0, 0x90, 60, 127]))
            .with_arg(Arg::Color(0x11223344))
            .with_arg(2.5f32);
        let bytes = encode_message(&msg).unwrap();
        assert_eq!(bytes.len() % 4, 0);
        assert_eq!(decode_packet(&bytes).unwrap(), vec![msg]);
    }

    #[test]
    fn bundle_flattens_in_order() {
        let a = Message::new(ADDR_PING).with_arg(1).with_arg(2);
        let b = Message::new(ADDR_DATA).with_arg("x");
        let c = Message::new(ADDR_DATA).with_arg(3);
        let nested = OscPacket::Bundle(OscBundle {
            timetag: time_from_u64(IMMEDIATE),
            content: vec![
                OscPacket::Message(to_osc(&a).unwrap()),
                OscPacket::Bundle(OscBundle {
                    timetag: time_from_u64(IMMEDIATE),
                    content: vec![OscPacket::Message(to_osc(&b).unwrap())],
                }),
                OscPacket::Message(to_osc(&c).unwrap()),
            ],
        });
        let bytes = rosc::encoder::encode(&nested).unwrap();
        assert_eq!(decode_packet(&bytes).unwrap(), vec![a, b, c]);
    }

    #[test]
    fn encode_bundle_decodes_back() {
        let a = Message::new(ADDR_DATA).with_arg(1);
        let b = Message::new(ADDR_DATA).with_arg("two");
        let bytes = encode_bundle(IMMEDIATE, &[a.clone(), b.clone()]).unwrap();
        assert!(bytes.starts_with(b"#bundle\0"));
        assert_eq!(decode_packet(&bytes).unwrap(), vec![a, b]);
    }

    #[test]
    fn array_contents_are_flattened() {
        let packet = OscPacket::Message(OscMessage {
            addr: ADDR_DATA.to_owned(),
            args: vec![
                OscType::Array(OscArray {
                    content: vec![OscType::Int(7), OscType::Int(8)],
                }),
                OscType::String("s".into()),
            ],
        });
        let bytes = rosc::encoder::encode(&packet).unwrap();
        let msgs = decode_packet(&bytes).unwrap();
        assert_eq!(
            msgs[0].args,
            vec![Arg::Int(7), Arg::Int(8), Arg::String("s".into())]
        );
    }

    #[test]
    fn truncated_packet_is_error() {
        let msg = Message::new(ADDR_PING).with_arg(3).with_arg(1000);
        let bytes = encode_message(&msg).unwrap();
        assert!(matches!(
            decode_packet(&bytes[..bytes.len() - 2]),
            Err(DecodeError::Osc(_))
        ));
    }

    #[test]
    fn garbage_is_error() {
        assert!(decode_packet(b"not osc").is_err());
    }

    #[test]
    fn encode_rejects_bad_address() {
        assert!(matches!(
            encode_message(&Message::new("data")),
            Err(EncodeError::InvalidAddress(_))
        ));
    }

    #[test]
    fn time_tag_conversion() {
        let t = 0x0102_0304_0506_0708u64;
        assert_eq!(time_to_u64(time_from_u64(t)), t);
        assert_eq!(time_from_u64(IMMEDIATE).fractional, 1);
    }
}
