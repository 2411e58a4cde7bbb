//! Beacon wire protocol: OSC message/argument types and the four addresses the server speaks.

/// Multicast announcement: `[receive_port: i32]`.
pub const ADDR_HELLO: &str = "/hello";
/// Client handshake request: `[remote_id: i32, remote_timestamp: i32]`.
pub const ADDR_PING: &str = "/ping";
/// Handshake reply: `[remote_id: i32, server_timestamp: i32, remote_timestamp: i32]`.
pub const ADDR_PONG: &str = "/pong";
/// Typed data values, mixed int/float/string, either direction.
pub const ADDR_DATA: &str = "/data";

/// One typed OSC argument. Encoding is OSC 1.0 (see wire module).
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    /// `i`
    Int(i32),
    /// `h`
    Long(i64),
    /// `f`
    Float(f32),
    /// `d`
    Double(f64),
    /// `s`
    String(String),
    /// `b`
    Blob(Vec<u8>),
    /// `t`: NTP-format time tag.
    TimeTag(u64),
    /// `c`: ASCII character sent as 32 bits.
    Char(char),
    /// `r`: RGBA color.
    Color(u32),
    /// `m`: port id, status byte, data1, data2.
    Midi([u8; 4]),
    /// `T`
    True,
    /// `F`
    False,
    /// `N`
    Nil,
    /// `I`
    Impulse,
}

impl Arg {
    /// Read a numeric argument as `i32`: longs and floats are truncated, anything else is `None`.
    pub fn as_i32(&self) -> Option<i32> {
        match *self {
            Arg::Int(v) => Some(v),
            Arg::Long(v) => Some(v as i32),
            Arg::Float(v) => Some(v as i32),
            Arg::Double(v) => Some(v as i32),
            _ => None,
        }
    }
}

impl From<i32> for Arg {
    fn from(v: i32) -> Self {
        Arg::Int(v)
    }
}

impl From<f32> for Arg {
    fn from(v: f32) -> Self {
        Arg::Float(v)
    }
}

impl From<&str> for Arg {
    fn from(v: &str) -> Self {
        Arg::String(v.to_owned())
    }
}

impl From<String> for Arg {
    fn from(v: String) -> Self {
        Arg::String(v)
    }
}

/// An OSC message: address pattern plus ordered, typed arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub address: String,
    pub args: Vec<Arg>,
}

impl Message {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            args: Vec::new(),
        }
    }

    /// Append an argument (builder style).
    pub fn with_arg(mut self, arg: impl Into<Arg>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// `/hello [receive_port]`.
    pub fn hello(receive_port: u16) -> Self {
        Message::new(ADDR_HELLO).with_arg(i32::from(receive_port))
    }

    /// `/pong [remote_id, server_timestamp, remote_timestamp]`.
    pub fn pong(remote_id: i32, server_timestamp: i32, remote_timestamp: i32) -> Self {
        Message::new(ADDR_PONG)
            .with_arg(remote_id)
            .with_arg(server_timestamp)
            .with_arg(remote_timestamp)
    }

    /// Argument `index` read as `i32` (see [`Arg::as_i32`]).
    pub fn arg_as_i32(&self, index: usize) -> Option<i32> {
        self.args.get(index).and_then(Arg::as_i32)
    }
}

/// An inbound message tagged with the host it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Received {
    pub message: Message,
    pub remote_host: String,
}

impl Received {
    pub fn new(message: Message, remote_host: impl Into<String>) -> Self {
        Self {
            message,
            remote_host: remote_host.into(),
        }
    }
}
