//! Trace record classification.
//!
//! One simulator log line maps to at most one [`Observation`]. Patterns are
//! tried in a fixed priority order, most specific first; a line matching no
//! pattern (or carrying an unparseable numeric field) is dropped without an
//! error, since unrelated diagnostic output freely interleaves with the
//! protocol lines we care about.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::fmt;

static START_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<time>\d+\.\d+)\s+(?P<host>\S+)\s+START$").unwrap()
});
static STOP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<time>\d+\.\d+)\s+(?P<host>\S+)\s+STOP$").unwrap()
});
static ARP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<time>\d+\.\d+)\s+(?P<host>\S+)\s+Received ARP (?P<op>REQUEST|REPLY) from (?P<sender_ip>\d+\.\d+\.\d+\.\d+)/(?P<sender_mac>[0-9a-f]{2}(?::[0-9a-f]{2}){5}) for (?P<target_ip>\d+\.\d+\.\d+\.\d+)",
    )
    .unwrap()
});
static ICMP_ERROR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<time>\d+\.\d+)\s+(?P<host>\S+)\s+Host received ICMP \(type=(?P<type>\d+), code=(?P<code>\d+)\), UDP msg \((?P<src_addr>\d+\.\d+\.\d+\.\d+):(?P<src_port>\d+) -> (?P<dst_addr>\d+\.\d+\.\d+\.\d+):(?P<dst_port>\d+)\): (?P<text>.+)$",
    )
    .unwrap()
});
static ICMP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<time>\d+\.\d+)\s+(?P<host>\S+)\s+Received ICMP packet from (?P<src_ip>\d+\.\d+\.\d+\.\d+)",
    )
    .unwrap()
});
static TCP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<time>\d+\.\d+)\s+(?P<host>\S+)\s+(?:Host received|Received) TCP packet \((?P<src_addr>\d+\.\d+\.\d+\.\d+):(?P<src_port>\d+) -> (?P<dst_addr>\d+\.\d+\.\d+\.\d+):(?P<dst_port>\d+)\)\s+Flags: (?P<flags>[A-Z]*), Seq=(?P<seq>\d+), Ack=(?P<ack>\d+)(?:, Data=(?P<data>.*))?$",
    )
    .unwrap()
});
static UDP_DELIVERY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<time>\d+\.\d+)\s+(?P<host>\S+)\s+Host received UDP msg \((?P<src_addr>\d+\.\d+\.\d+\.\d+):(?P<src_port>\d+) -> (?P<dst_addr>\d+\.\d+\.\d+\.\d+):(?P<dst_port>\d+)\): (?P<text>.+)$",
    )
    .unwrap()
});
static NETCAT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<time>\d+\.\d+)\s+(?P<host>\S+)\s+Netcat (?P<dir>sending|received) UDP msg (?:to|from) (?P<addr>\d+\.\d+\.\d+\.\d+):(?P<port>\d+): (?P<text>.+)$",
    )
    .unwrap()
});
static ECHO_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<time>\d+\.\d+)\s+(?P<host>\S+)\s+Echo server received UDP msg from (?P<addr>\d+\.\d+\.\d+\.\d+):(?P<port>\d+): (?P<text>.+)$",
    )
    .unwrap()
});
static PROGRESS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<time>\d+\.\d+)\s+(?P<host>\S+)\s+(?P<pct>\d+)% has been (?P<action>sent|recvd|acked)$",
    )
    .unwrap()
});
static OTHER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<time>\d+\.\d+)\s+(?P<host>\S+)\s+(?P<rest>.*)$").unwrap()
});

/// One side of a UDP or TCP exchange.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub addr: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(addr: impl Into<String>, port: u16) -> Self {
        Self { addr: addr.into(), port }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.addr, self.port)
    }
}

/// A UDP message as logged by a receiving host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UdpMessage {
    pub src: Endpoint,
    pub dst: Endpoint,
    pub text: String,
}

/// A TCP segment as logged by a receiving host. Addresses and flags stay
/// strings for exact comparison; ports and counters parse as integers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TcpSegment {
    pub src: Endpoint,
    pub dst: Endpoint,
    pub flags: String,
    pub seq: u64,
    pub ack: u64,
    pub data: Option<String>,
}

impl TcpSegment {
    /// Payload length in bytes; segments logged without a Data field count
    /// as empty.
    pub fn payload_len(&self) -> u64 {
        self.data.as_ref().map_or(0, |d| d.len() as u64)
    }
}

/// Direction of a transfer progress report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferAction {
    Sent,
    Recvd,
    Acked,
}

impl fmt::Display for TransferAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sent => write!(f, "sent"),
            Self::Recvd => write!(f, "recvd"),
            Self::Acked => write!(f, "acked"),
        }
    }
}

/// Classified content of one trace line.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Start,
    Stop,
    ArpRequest {
        sender_ip: String,
        sender_mac: String,
        target_ip: String,
    },
    ArpReply {
        sender_ip: String,
        sender_mac: String,
        target_ip: String,
    },
    Icmp {
        src_ip: String,
    },
    /// ICMP error carrying the UDP message that triggered it.
    IcmpError {
        icmp_type: u8,
        code: u8,
        context: UdpMessage,
    },
    Tcp(TcpSegment),
    NetcatSend {
        peer: Endpoint,
        text: String,
    },
    NetcatRecv {
        peer: Endpoint,
        text: String,
    },
    EchoServer {
        src: Endpoint,
        text: String,
    },
    UdpDelivery(UdpMessage),
    Progress {
        percent: u8,
        action: TransferAction,
    },
    Other(String),
}

/// Coarse event category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Start,
    Stop,
    ArpRequest,
    ArpReply,
    Icmp,
    Tcp,
    Udp,
    Other,
}

impl Payload {
    pub fn category(&self) -> Category {
        match self {
            Self::Start => Category::Start,
            Self::Stop => Category::Stop,
            Self::ArpRequest { .. } => Category::ArpRequest,
            Self::ArpReply { .. } => Category::ArpReply,
            Self::Icmp { .. } | Self::IcmpError { .. } => Category::Icmp,
            Self::Tcp(_) => Category::Tcp,
            Self::NetcatSend { .. }
            | Self::NetcatRecv { .. }
            | Self::EchoServer { .. }
            | Self::UdpDelivery(_) => Category::Udp,
            Self::Progress { .. } | Self::Other(_) => Category::Other,
        }
    }
}

/// One classified trace event. Never mutated after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    /// Seconds since simulation start, as printed by the emitting host.
    pub timestamp: f64,
    /// Emitting host; never empty for lines that reach a checker.
    pub host: String,
    pub payload: Payload,
}

impl Observation {
    pub fn category(&self) -> Category {
        self.payload.category()
    }
}

fn meta(caps: &Captures<'_>) -> Option<(f64, String)> {
    let time = caps.name("time")?.as_str().parse::<f64>().ok()?;
    let host = caps.name("host")?.as_str().to_string();
    Some((time, host))
}

fn endpoint(caps: &Captures<'_>, addr: &str, port: &str) -> Option<Endpoint> {
    Some(Endpoint {
        addr: caps.name(addr)?.as_str().to_string(),
        port: caps.name(port)?.as_str().parse().ok()?,
    })
}

fn udp_message(caps: &Captures<'_>) -> Option<UdpMessage> {
    Some(UdpMessage {
        src: endpoint(caps, "src_addr", "src_port")?,
        dst: endpoint(caps, "dst_addr", "dst_port")?,
        text: caps.name("text")?.as_str().to_string(),
    })
}

/// Classify one raw trace line.
///
/// Returns `None` for anything that does not carry the
/// `<seconds> <hostname> ` prefix or whose numeric captures do not fit
/// their types. Parsing is line-local and stateless.
pub fn parse_line(line: &str) -> Option<Observation> {
    if let Some(caps) = START_RE.captures(line) {
        let (timestamp, host) = meta(&caps)?;
        return Some(Observation { timestamp, host, payload: Payload::Start });
    }
    if let Some(caps) = STOP_RE.captures(line) {
        let (timestamp, host) = meta(&caps)?;
        return Some(Observation { timestamp, host, payload: Payload::Stop });
    }
    if let Some(caps) = ARP_RE.captures(line) {
        let (timestamp, host) = meta(&caps)?;
        let sender_ip = caps["sender_ip"].to_string();
        let sender_mac = caps["sender_mac"].to_string();
        let target_ip = caps["target_ip"].to_string();
        let payload = if &caps["op"] == "REQUEST" {
            Payload::ArpRequest { sender_ip, sender_mac, target_ip }
        } else {
            Payload::ArpReply { sender_ip, sender_mac, target_ip }
        };
        return Some(Observation { timestamp, host, payload });
    }
    if let Some(caps) = ICMP_ERROR_RE.captures(line) {
        let (timestamp, host) = meta(&caps)?;
        let payload = Payload::IcmpError {
            icmp_type: caps["type"].parse().ok()?,
            code: caps["code"].parse().ok()?,
            context: udp_message(&caps)?,
        };
        return Some(Observation { timestamp, host, payload });
    }
    if let Some(caps) = ICMP_RE.captures(line) {
        let (timestamp, host) = meta(&caps)?;
        let payload = Payload::Icmp { src_ip: caps["src_ip"].to_string() };
        return Some(Observation { timestamp, host, payload });
    }
    if let Some(caps) = TCP_RE.captures(line) {
        let (timestamp, host) = meta(&caps)?;
        let payload = Payload::Tcp(TcpSegment {
            src: endpoint(&caps, "src_addr", "src_port")?,
            dst: endpoint(&caps, "dst_addr", "dst_port")?,
            flags: caps["flags"].to_string(),
            seq: caps["seq"].parse().ok()?,
            ack: caps["ack"].parse().ok()?,
            data: caps.name("data").map(|m| m.as_str().to_string()),
        });
        return Some(Observation { timestamp, host, payload });
    }
    if let Some(caps) = UDP_DELIVERY_RE.captures(line) {
        let (timestamp, host) = meta(&caps)?;
        let payload = Payload::UdpDelivery(udp_message(&caps)?);
        return Some(Observation { timestamp, host, payload });
    }
    if let Some(caps) = NETCAT_RE.captures(line) {
        let (timestamp, host) = meta(&caps)?;
        let peer = endpoint(&caps, "addr", "port")?;
        let text = caps["text"].to_string();
        let payload = if &caps["dir"] == "sending" {
            Payload::NetcatSend { peer, text }
        } else {
            Payload::NetcatRecv { peer, text }
        };
        return Some(Observation { timestamp, host, payload });
    }
    if let Some(caps) = ECHO_RE.captures(line) {
        let (timestamp, host) = meta(&caps)?;
        let payload = Payload::EchoServer {
            src: endpoint(&caps, "addr", "port")?,
            text: caps["text"].to_string(),
        };
        return Some(Observation { timestamp, host, payload });
    }
    if let Some(caps) = PROGRESS_RE.captures(line) {
        let (timestamp, host) = meta(&caps)?;
        let action = match &caps["action"] {
            "sent" => TransferAction::Sent,
            "recvd" => TransferAction::Recvd,
            _ => TransferAction::Acked,
        };
        let payload = Payload::Progress { percent: caps["pct"].parse().ok()?, action };
        return Some(Observation { timestamp, host, payload });
    }
    if let Some(caps) = OTHER_RE.captures(line) {
        let (timestamp, host) = meta(&caps)?;
        let payload = Payload::Other(caps["rest"].to_string());
        return Some(Observation { timestamp, host, payload });
    }
    None
}
