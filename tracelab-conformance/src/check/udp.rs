//! UDP exchange checkers.

use super::{any_of, reject_trailing};
use crate::verdict::{Diag, Verdict};
use serde_json::json;
use tracelab_core::record::{Observation, Payload};
use tracelab_core::window::Round;

/// One-way UDP message from `sender` to `receiver`, optionally answered by
/// an ICMP port-unreachable at the sender when nothing listens on the
/// destination port.
#[derive(Debug, Clone)]
pub struct UdpDirect {
    pub sender: String,
    pub receiver: String,
}

impl UdpDirect {
    pub fn evaluate(&self, round: &mut Round, diag: &mut Diag) -> Verdict {
        // The client's own send notice.
        let sent = matches!(
            round.observations.pop_front(),
            Some(Observation {
                payload: Payload::NetcatSend { .. } | Payload::NetcatRecv { .. },
                ..
            })
        );
        if !sent {
            diag.note(format!("Expected netcat UDP message leaving {}", self.sender));
            return Verdict::Fail;
        }

        // Delivery on the far side.
        let delivery = match round.observations.pop_front() {
            Some(Observation { payload: Payload::UdpDelivery(msg), .. }) => msg,
            _ => {
                diag.note(format!("Expected UDP message arriving at {}", self.receiver));
                return Verdict::Fail;
            }
        };

        // The ICMP error is optional; silence is a plain pass.
        let Some(next) = round.observations.pop_front() else {
            return Verdict::Pass;
        };
        let (host, icmp_type, code, context) = match next {
            Observation { host, payload: Payload::IcmpError { icmp_type, code, context }, .. } => {
                (host, icmp_type, code, context)
            }
            _ => {
                diag.note(format!(
                    "Expected an ICMP error message at {}, if anything.",
                    self.sender
                ));
                return Verdict::Fail;
            }
        };

        let expected = json!({
            "type": 3,
            "code": 3,
            "srcaddr": delivery.src.addr,
            "srcport": delivery.src.port,
            "dstaddr": delivery.dst.addr,
            "dstport": delivery.dst.port,
            "msg": delivery.text,
        });
        let observed = json!({
            "type": icmp_type,
            "code": code,
            "srcaddr": context.src.addr,
            "srcport": context.src.port,
            "dstaddr": context.dst.addr,
            "dstport": context.dst.port,
            "msg": context.text,
        });
        if host != self.sender {
            diag.note(format!(
                "ICMP error message was expected at {}, not {}",
                self.sender, host
            ));
        } else if observed != expected {
            diag.note(format!(
                "ICMP message malformed:\nExpected: {expected}\nReceived: {observed}"
            ));
        } else {
            diag.note("Extra credit for ICMP message");
        }

        if !reject_trailing(round, diag) {
            return Verdict::Fail;
        }
        Verdict::Pass
    }
}

/// UDP message bounced off an echo service: client send, delivery at the
/// echo host, the service's receipt, the reflected delivery back at the
/// client, and the client's final receipt.
#[derive(Debug, Clone)]
pub struct UdpEcho {
    pub client: String,
    pub echo_host: String,
    /// Hosts at which the reflected traffic may legitimately arrive.
    pub return_hosts: Vec<String>,
}

impl UdpEcho {
    pub fn evaluate(&self, round: &mut Round, diag: &mut Diag) -> Verdict {
        let sent = matches!(
            round.observations.pop_front(),
            Some(Observation {
                payload: Payload::NetcatSend { .. } | Payload::NetcatRecv { .. },
                ..
            })
        );
        if !sent {
            diag.note(format!("Expected netcat UDP message leaving {}", self.client));
            return Verdict::Fail;
        }

        let delivery = match round.observations.pop_front() {
            Some(Observation { payload: Payload::UdpDelivery(msg), .. }) => msg,
            _ => {
                diag.note(format!("Expected UDP message arriving at {}", self.echo_host));
                return Verdict::Fail;
            }
        };

        // The echo service logs what it saw; source and text must agree
        // with the delivered message.
        let (host, src, text) = match round.observations.pop_front() {
            Some(Observation { host, payload: Payload::EchoServer { src, text }, .. }) => {
                (host, src, text)
            }
            _ => {
                diag.note(format!(
                    "Expected echo UDP message arriving at {}",
                    self.echo_host
                ));
                return Verdict::Fail;
            }
        };
        if host != self.echo_host {
            diag.note(format!(
                "Echo message was expected at {}, not {}",
                self.echo_host, host
            ));
            return Verdict::Fail;
        }
        let expected = json!({
            "srcaddr": delivery.src.addr,
            "srcport": delivery.src.port,
            "msg": delivery.text,
        });
        let observed = json!({
            "srcaddr": src.addr,
            "srcport": src.port,
            "msg": text,
        });
        if observed != expected {
            diag.note(format!(
                "Echo message malformed:\nExpected: {expected}\nReceived: {observed}"
            ));
            return Verdict::Fail;
        }

        // The reflection travels back with source and destination swapped.
        let (host, reflected) = match round.observations.pop_front() {
            Some(Observation { host, payload: Payload::UdpDelivery(msg), .. }) => (host, msg),
            _ => {
                diag.note(format!(
                    "Expected UDP message arriving at {}",
                    any_of(&self.return_hosts)
                ));
                return Verdict::Fail;
            }
        };
        if !self.return_hosts.contains(&host) {
            diag.note(format!(
                "UDP message was expected at {}, not {}",
                any_of(&self.return_hosts),
                host
            ));
            return Verdict::Fail;
        }
        let expected = json!({
            "srcaddr": delivery.dst.addr,
            "srcport": delivery.dst.port,
            "dstaddr": delivery.src.addr,
            "dstport": delivery.src.port,
            "msg": delivery.text,
        });
        let observed = json!({
            "srcaddr": reflected.src.addr,
            "srcport": reflected.src.port,
            "dstaddr": reflected.dst.addr,
            "dstport": reflected.dst.port,
            "msg": reflected.text,
        });
        if observed != expected {
            diag.note(format!(
                "UDP message malformed:\nExpected: {expected}\nReceived: {observed}"
            ));
            return Verdict::Fail;
        }

        // And the client application reports it.
        let (host, peer, text) = match round.observations.pop_front() {
            Some(Observation {
                host,
                payload: Payload::NetcatRecv { peer, text } | Payload::NetcatSend { peer, text },
                ..
            }) => (host, peer, text),
            _ => {
                diag.note(format!(
                    "Expected netcat UDP message arriving at {}",
                    any_of(&self.return_hosts)
                ));
                return Verdict::Fail;
            }
        };
        if !self.return_hosts.contains(&host) {
            diag.note(format!(
                "Netcat UDP message was expected at {}, not {}",
                any_of(&self.return_hosts),
                host
            ));
            return Verdict::Fail;
        }
        let expected = json!({
            "addr": reflected.src.addr,
            "port": reflected.src.port,
            "msg": reflected.text,
        });
        let observed = json!({
            "addr": peer.addr,
            "port": peer.port,
            "msg": text,
        });
        if observed != expected {
            diag.note(format!(
                "Netcat UDP message malformed:\nExpected: {expected}\nReceived: {observed}"
            ));
            return Verdict::Fail;
        }

        if !reject_trailing(round, diag) {
            return Verdict::Fail;
        }
        Verdict::Pass
    }
}
