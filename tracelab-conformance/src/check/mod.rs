//! Per-round scenario checkers.
//!
//! Each round of expected activity is validated by one [`RoundCheck`]
//! variant. Checkers pop observations from the front of the batch in the
//! exact arrival order they document; anything missing, misplaced or left
//! over is a failure with a diagnostic, never a panic. Matching is exact
//! structural equality on the relevant fields.

mod tcp;
mod udp;

pub use tcp::{EchoData, Handshake, NotListening};
pub use udp::{UdpDirect, UdpEcho};

use crate::verdict::{Diag, Verdict};
use tracelab_core::conn::ConnectionStore;
use tracelab_core::record::{Observation, Payload, TcpSegment};
use tracelab_core::window::Round;

/// One expected round shape, selected by position in the scenario's list.
#[derive(Debug, Clone)]
pub enum RoundCheck {
    /// Deliberately quiet round; contributes to neither total.
    Blank,
    /// One-way UDP send with an optional ICMP port-unreachable reply.
    UdpDirect(UdpDirect),
    /// UDP request reflected by an echo service back to the client.
    UdpEcho(UdpEcho),
    /// SYN against a closed port with an optional RST reply.
    NotListening(NotListening),
    /// Strict TCP three-way handshake.
    Handshake(Handshake),
    /// Full-duplex data echo over an established connection.
    EchoData(EchoData),
}

impl RoundCheck {
    /// Validate one round, consuming its observations.
    pub fn evaluate(
        &self,
        round: &mut Round,
        store: &mut ConnectionStore,
        diag: &mut Diag,
    ) -> Verdict {
        match self {
            Self::Blank => Verdict::NotApplicable,
            Self::UdpDirect(c) => c.evaluate(round, diag),
            Self::UdpEcho(c) => c.evaluate(round, diag),
            Self::NotListening(c) => c.evaluate(round, diag),
            Self::Handshake(c) => c.evaluate(round, store, diag),
            Self::EchoData(c) => c.evaluate(round, store, diag),
        }
    }
}

/// Pop the next observation, requiring a TCP segment. The observation is
/// consumed either way; a miss records `expectation` and yields `None`.
fn pop_tcp(round: &mut Round, diag: &mut Diag, expectation: &str) -> Option<(String, TcpSegment)> {
    match round.observations.pop_front() {
        Some(Observation { host, payload: Payload::Tcp(seg), .. }) => Some((host, seg)),
        _ => {
            diag.note(expectation);
            None
        }
    }
}

/// A checker that finished its expected sequence must leave nothing behind.
fn reject_trailing(round: &Round, diag: &mut Diag) -> bool {
    if round.observations.is_empty() {
        true
    } else {
        diag.note("Expected no further packets");
        false
    }
}

/// Render a host alternative set for diagnostics ("a or c").
fn any_of(hosts: &[String]) -> String {
    hosts.join(" or ")
}
