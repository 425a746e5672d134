//! TCP scenario checkers: closed-port probes, handshakes, duplex echo.

use super::{any_of, pop_tcp, reject_trailing};
use crate::verdict::{Diag, Verdict};
use serde_json::json;
use tracelab_core::conn::{ConnectionKey, ConnectionStore, PairLabel, SeqState};
use tracelab_core::window::Round;

/// A connection attempt against a port nobody listens on: the SYN arrives
/// at the listener host, and a RST may (but need not) travel back.
#[derive(Debug, Clone)]
pub struct NotListening {
    pub listener: String,
    /// Hosts at which the optional RST may arrive.
    pub return_hosts: Vec<String>,
}

impl NotListening {
    pub fn evaluate(&self, round: &mut Round, diag: &mut Diag) -> Verdict {
        let Some((host, probe)) = pop_tcp(
            round,
            diag,
            &format!("Expected SYN packet arriving at {}", self.listener),
        ) else {
            return Verdict::Fail;
        };
        if host != self.listener {
            diag.note(format!(
                "SYN packet was expected at {}, not {}",
                self.listener, host
            ));
            return Verdict::Fail;
        }
        // A bare ACK also probes a closed port; both deserve a RST.
        if probe.flags != "S" && probe.flags != "A" {
            diag.note(format!(
                "SYN flags incorrect:\nExpected: S or A\nReceived: {}",
                probe.flags
            ));
            return Verdict::Fail;
        }

        // The RST is optional; its absence is a plain pass.
        if round.observations.is_empty() {
            return Verdict::Pass;
        }
        let Some((host, rst)) = pop_tcp(
            round,
            diag,
            &format!(
                "Expected a RST packet at {}, if anything.",
                any_of(&self.return_hosts)
            ),
        ) else {
            return Verdict::Fail;
        };
        let expected = json!({
            "srcaddr": probe.dst.addr,
            "srcport": probe.dst.port,
            "dstaddr": probe.src.addr,
            "dstport": probe.src.port,
            "flags": "R",
        });
        let observed = json!({
            "srcaddr": rst.src.addr,
            "srcport": rst.src.port,
            "dstaddr": rst.dst.addr,
            "dstport": rst.dst.port,
            "flags": rst.flags,
        });
        if !self.return_hosts.contains(&host) {
            diag.note(format!(
                "RST was expected at host {}, not {}",
                any_of(&self.return_hosts),
                host
            ));
        } else if observed != expected {
            diag.note(format!(
                "RST malformed:\nExpected: {expected}\nReceived: {observed}"
            ));
        } else {
            diag.note("Extra credit for TCP RST");
        }

        if !reject_trailing(round, diag) {
            return Verdict::Fail;
        }
        Verdict::Pass
    }
}

/// Strict three-way handshake between one initiator and a listener.
///
/// With `record` set, a successful handshake initializes the connection
/// store entry for the observed 4-tuple so later data rounds can account
/// sequence numbers against it.
#[derive(Debug, Clone)]
pub struct Handshake {
    /// Hosts at which the SYN-ACK may arrive (the initiator, plus any host
    /// sharing its segment).
    pub client_hosts: Vec<String>,
    pub server: String,
    /// Participant pair label scoping recorded connections.
    pub pair: PairLabel,
    pub record: bool,
}

impl Handshake {
    pub fn evaluate(
        &self,
        round: &mut Round,
        store: &mut ConnectionStore,
        diag: &mut Diag,
    ) -> Verdict {
        // SYN at the listener.
        let Some((host, syn)) = pop_tcp(
            round,
            diag,
            &format!("Expected SYN packet arriving at {}", self.server),
        ) else {
            return Verdict::Fail;
        };
        if host != self.server {
            diag.note(format!(
                "SYN packet was expected at {}, not {}",
                self.server, host
            ));
            return Verdict::Fail;
        }
        if syn.flags != "S" {
            diag.note(format!(
                "SYN flags incorrect:\nExpected: S\nReceived: {}",
                syn.flags
            ));
            return Verdict::Fail;
        }

        // SYN-ACK back at the initiator: addresses and ports swapped,
        // acknowledging one past the initiator's sequence number.
        let Some((host, synack)) = pop_tcp(
            round,
            diag,
            &format!(
                "Expected SYNACK packet arriving at {}",
                any_of(&self.client_hosts)
            ),
        ) else {
            return Verdict::Fail;
        };
        let expected = json!({
            "srcaddr": syn.dst.addr,
            "srcport": syn.dst.port,
            "dstaddr": syn.src.addr,
            "dstport": syn.src.port,
            "ack": syn.seq + 1,
            "flags": "SA",
        });
        let observed = json!({
            "srcaddr": synack.src.addr,
            "srcport": synack.src.port,
            "dstaddr": synack.dst.addr,
            "dstport": synack.dst.port,
            "ack": synack.ack,
            "flags": synack.flags,
        });
        if !self.client_hosts.contains(&host) {
            diag.note(format!(
                "SYNACK packet was expected at {}, not {}",
                any_of(&self.client_hosts),
                host
            ));
            return Verdict::Fail;
        }
        if observed != expected {
            diag.note(format!(
                "SYNACK packet malformed:\nExpected: {expected}\nReceived: {observed}"
            ));
            return Verdict::Fail;
        }

        // Final ACK at the listener completes the exchange.
        let Some((host, ack)) = pop_tcp(
            round,
            diag,
            &format!("Expected ACK packet arriving at {}", self.server),
        ) else {
            return Verdict::Fail;
        };
        let expected = json!({
            "srcaddr": syn.src.addr,
            "srcport": syn.src.port,
            "dstaddr": syn.dst.addr,
            "dstport": syn.dst.port,
            "seq": syn.seq + 1,
            "ack": synack.seq + 1,
            "flags": "A",
        });
        let observed = json!({
            "srcaddr": ack.src.addr,
            "srcport": ack.src.port,
            "dstaddr": ack.dst.addr,
            "dstport": ack.dst.port,
            "seq": ack.seq,
            "ack": ack.ack,
            "flags": ack.flags,
        });
        if host != self.server {
            diag.note(format!(
                "ACK packet was expected at {}, not {}",
                self.server, host
            ));
            return Verdict::Fail;
        }
        if observed != expected {
            diag.note(format!(
                "ACK packet malformed:\nExpected: {expected}\nReceived: {observed}"
            ));
            return Verdict::Fail;
        }

        if self.record {
            let key = ConnectionKey::new(
                syn.src.port,
                syn.dst.port,
                syn.src.addr.clone(),
                syn.dst.addr.clone(),
            );
            store.record(
                &self.pair,
                key,
                SeqState { initiator: syn.seq + 1, responder: synack.seq + 1 },
            );
        }

        if !reject_trailing(round, diag) {
            return Verdict::Fail;
        }
        Verdict::Pass
    }
}

/// Which way a data segment travels relative to the recorded connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Forward,
    Reverse,
}

/// Full-duplex echo over an established connection: the initiator sends a
/// data segment, the listener acknowledges and sends the same bytes back,
/// and the initiator acknowledges in turn. Both directions are validated
/// as explicit sequential steps against the shared counters.
#[derive(Debug, Clone)]
pub struct EchoData {
    pub pair: PairLabel,
}

impl EchoData {
    pub fn evaluate(
        &self,
        round: &mut Round,
        store: &mut ConnectionStore,
        diag: &mut Diag,
    ) -> Verdict {
        let Some(text) = self.step(Direction::Forward, None, round, store, diag) else {
            return Verdict::Fail;
        };
        if self
            .step(Direction::Reverse, Some(&text), round, store, diag)
            .is_none()
        {
            return Verdict::Fail;
        }
        if !reject_trailing(round, diag) {
            return Verdict::Fail;
        }
        Verdict::Pass
    }

    /// Validate one direction: data segment at the destination, counter
    /// advance by the payload length, then the matching ACK back at the
    /// origin. Returns the observed payload so the reverse direction can
    /// require the identical bytes.
    fn step(
        &self,
        dir: Direction,
        expected_text: Option<&str>,
        round: &mut Round,
        store: &mut ConnectionStore,
        diag: &mut Diag,
    ) -> Option<String> {
        let (origin, destination) = match dir {
            Direction::Forward => (&self.pair.0, &self.pair.1),
            Direction::Reverse => (&self.pair.1, &self.pair.0),
        };

        let (host, seg) = pop_tcp(
            round,
            diag,
            &format!("Expected data packet arriving at {destination}"),
        )?;
        if host != *destination {
            diag.note(format!(
                "Data packet was expected at {destination}, not {host}"
            ));
            return None;
        }

        // Connections are stored in initiator-to-listener orientation.
        let key = match dir {
            Direction::Forward => ConnectionKey::new(
                seg.src.port,
                seg.dst.port,
                seg.src.addr.clone(),
                seg.dst.addr.clone(),
            ),
            Direction::Reverse => ConnectionKey::new(
                seg.dst.port,
                seg.src.port,
                seg.dst.addr.clone(),
                seg.src.addr.clone(),
            ),
        };
        let Some(state) = store.get_mut(&self.pair, &key) else {
            diag.note("TCP packet does not match any existing connections!");
            diag.note(format!("  {key}"));
            return None;
        };

        let (exp_src_addr, exp_src_port, exp_dst_addr, exp_dst_port) = match dir {
            Direction::Forward => (&key.src_addr, key.src_port, &key.dst_addr, key.dst_port),
            Direction::Reverse => (&key.dst_addr, key.dst_port, &key.src_addr, key.src_port),
        };
        let origin_seq = match dir {
            Direction::Forward => state.initiator,
            Direction::Reverse => state.responder,
        };
        let mut expected = json!({
            "srcaddr": exp_src_addr,
            "srcport": exp_src_port,
            "dstaddr": exp_dst_addr,
            "dstport": exp_dst_port,
            "seq": origin_seq,
        });
        let mut observed = json!({
            "srcaddr": seg.src.addr,
            "srcport": seg.src.port,
            "dstaddr": seg.dst.addr,
            "dstport": seg.dst.port,
            "seq": seg.seq,
        });
        if let Some(text) = expected_text {
            expected["data"] = json!(text);
            observed["data"] = json!(seg.data.clone().unwrap_or_default());
        }
        if observed != expected {
            diag.note(format!(
                "Data packet malformed:\nExpected: {expected}\nReceived: {observed}"
            ));
            return None;
        }

        // Confirmed bytes advance the sending side, exactly once.
        let data = seg.data.clone().unwrap_or_default();
        match dir {
            Direction::Forward => state.initiator += data.len() as u64,
            Direction::Reverse => state.responder += data.len() as u64,
        }
        let (ack_seq, ack_ack) = match dir {
            Direction::Forward => (state.responder, state.initiator),
            Direction::Reverse => (state.initiator, state.responder),
        };

        let (host, ack) = pop_tcp(
            round,
            diag,
            &format!("Expected ACK packet arriving at {origin}"),
        )?;
        if host != *origin {
            diag.note(format!("ACK packet was expected at {origin}, not {host}"));
            return None;
        }
        let expected = json!({
            "srcaddr": exp_dst_addr,
            "srcport": exp_dst_port,
            "dstaddr": exp_src_addr,
            "dstport": exp_src_port,
            "seq": ack_seq,
            "ack": ack_ack,
            "data": "",
        });
        let observed = json!({
            "srcaddr": ack.src.addr,
            "srcport": ack.src.port,
            "dstaddr": ack.dst.addr,
            "dstport": ack.dst.port,
            "seq": ack.seq,
            "ack": ack.ack,
            "data": ack.data.clone().unwrap_or_default(),
        });
        if observed != expected {
            diag.note(format!(
                "ACK packet malformed:\nExpected: {expected}\nReceived: {observed}"
            ));
            return None;
        }

        Some(data)
    }
}
