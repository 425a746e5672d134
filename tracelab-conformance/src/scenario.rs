//! Built-in scenario suites.
//!
//! A scenario couples the command that launches the simulator with the
//! expectations applied to its trace: either an ordered list of per-round
//! checks or one whole-trace transfer check.

use crate::check::{EchoData, Handshake, NotListening, RoundCheck, UdpDirect, UdpEcho};
use crate::transfer::TransferCheck;
use tracelab_core::RunnerConfig;

/// What a scenario expects of its trace.
#[derive(Debug, Clone)]
pub enum ScenarioKind {
    /// Windowed evaluation: one check per round, in order.
    Rounds(Vec<RoundCheck>),
    /// One aggregate check over the whole trace.
    Aggregate(TransferCheck),
}

/// One runnable scenario: a name, the simulator command, expectations.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: String,
    pub command: Vec<String>,
    pub kind: ScenarioKind,
}

fn command(
    cfg: &RunnerConfig,
    stop: u32,
    disable_ipv6: bool,
    vars: Option<String>,
    topology: &str,
) -> Vec<String> {
    let mut cmd = vec![cfg.simulator.clone(), format!("--stop={stop}")];
    if disable_ipv6 {
        cmd.push("--disable-ipv6".into());
    }
    cmd.push("--terminal=none".into());
    if let Some(vars) = vars {
        cmd.push("--vars".into());
        cmd.push(vars);
    }
    cmd.push(cfg.scenario_dir.join(topology).to_string_lossy().into_owned());
    cmd
}

fn hosts(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn pair(a: &str, b: &str) -> (String, String) {
    (a.to_string(), b.to_string())
}

/// UDP exchange and TCP handshake scenarios over a three-host segment.
pub fn transport_suite(cfg: &RunnerConfig) -> Vec<Scenario> {
    let udp_echo = || {
        RoundCheck::UdpEcho(UdpEcho {
            client: "a".into(),
            echo_host: "b".into(),
            return_hosts: hosts(&["a", "c"]),
        })
    };
    let not_listening = || {
        RoundCheck::NotListening(NotListening {
            listener: "b".into(),
            return_hosts: hosts(&["a", "c"]),
        })
    };
    let handshake = || {
        RoundCheck::Handshake(Handshake {
            client_hosts: hosts(&["a", "c"]),
            server: "b".into(),
            pair: pair("a", "b"),
            record: false,
        })
    };
    vec![
        Scenario {
            name: "udp-exchange".into(),
            command: command(cfg, 14, true, None, "scenario1.cfg"),
            kind: ScenarioKind::Rounds(vec![
                RoundCheck::UdpDirect(UdpDirect { sender: "a".into(), receiver: "b".into() }),
                RoundCheck::Blank,
                udp_echo(),
                udp_echo(),
            ]),
        },
        Scenario {
            name: "tcp-handshake".into(),
            command: command(cfg, 25, true, None, "scenario2.cfg"),
            kind: ScenarioKind::Rounds(vec![
                not_listening(),
                RoundCheck::Blank,
                handshake(),
                not_listening(),
                handshake(),
            ]),
        },
    ]
}

/// Multi-connection handshake plus duplex echo across two initiators and
/// one server.
pub fn full_stack_suite(cfg: &RunnerConfig) -> Vec<Scenario> {
    let handshake = |client: &str| {
        RoundCheck::Handshake(Handshake {
            client_hosts: hosts(&[client]),
            server: "d".into(),
            pair: pair(client, "d"),
            record: true,
        })
    };
    let echo = |client: &str| RoundCheck::EchoData(EchoData { pair: pair(client, "d") });
    vec![Scenario {
        name: "tcp-echo".into(),
        command: command(cfg, 20, true, None, "scenario5.cfg"),
        kind: ScenarioKind::Rounds(vec![
            RoundCheck::Blank,
            handshake("a"),
            echo("a"),
            handshake("b"),
            echo("b"),
            echo("a"),
            echo("b"),
        ]),
    }]
}

/// File transfers under varying loss, window and retransmit settings, each
/// graded by one aggregate progress/integrity/deadline check.
pub fn reliable_transfer_suite(cfg: &RunnerConfig) -> Vec<Scenario> {
    struct Params {
        name: &'static str,
        stop: u32,
        loss: u8,
        window: u32,
        file: &'static str,
        fast_retransmit: bool,
        sha256: &'static str,
        max_duration: f64,
    }

    const HELLO_SHA256: &str =
        "a948904f2f0f479b8f8197694b30184b0d2ed1c1cd2a1ec0fb85d299a192a447";
    const TEST_SHA256: &str =
        "7f7a3bd1c1f2bd0a5d2f8a9c6e41d3b7a6a0b1a4a52c0de8b6a7c8de91f2a35b";
    const IMAGE_SHA256: &str =
        "3e4c9f8b21d6a07e5b1c4d8f0a92e63b7c15a8d4f6e2b90c31d7a5e8f40b612d";

    let params = [
        Params {
            name: "transfer-hello-noloss",
            stop: 10,
            loss: 0,
            window: 10000,
            file: "hello.txt",
            fast_retransmit: false,
            sha256: HELLO_SHA256,
            max_duration: 5.0,
        },
        Params {
            name: "transfer-text-noloss",
            stop: 10,
            loss: 0,
            window: 10000,
            file: "test.txt",
            fast_retransmit: false,
            sha256: TEST_SHA256,
            max_duration: 5.0,
        },
        Params {
            name: "transfer-image-noloss",
            stop: 35,
            loss: 0,
            window: 10000,
            file: "image.jpg",
            fast_retransmit: false,
            sha256: IMAGE_SHA256,
            max_duration: 30.0,
        },
        Params {
            name: "transfer-image-widewindow",
            stop: 35,
            loss: 0,
            window: 50000,
            file: "image.jpg",
            fast_retransmit: false,
            sha256: IMAGE_SHA256,
            max_duration: 30.0,
        },
        Params {
            name: "transfer-text-loss",
            stop: 20,
            loss: 5,
            window: 10000,
            file: "test.txt",
            fast_retransmit: false,
            sha256: TEST_SHA256,
            max_duration: 10.0,
        },
        Params {
            name: "transfer-image-loss",
            stop: 80,
            loss: 1,
            window: 50000,
            file: "image.jpg",
            fast_retransmit: false,
            sha256: IMAGE_SHA256,
            max_duration: 60.0,
        },
        Params {
            name: "transfer-text-fastretransmit",
            stop: 10,
            loss: 5,
            window: 10000,
            file: "test.txt",
            fast_retransmit: true,
            sha256: TEST_SHA256,
            max_duration: 5.0,
        },
        Params {
            name: "transfer-image-fastretransmit",
            stop: 35,
            loss: 1,
            window: 50000,
            file: "image.jpg",
            fast_retransmit: true,
            sha256: IMAGE_SHA256,
            max_duration: 30.0,
        },
    ];

    params
        .into_iter()
        .map(|p| {
            let vars = format!(
                "loss={},window={},file={},fast_retransmit={}",
                p.loss,
                p.window,
                p.file,
                if p.fast_retransmit { "on" } else { "off" }
            );
            Scenario {
                name: p.name.into(),
                command: command(cfg, p.stop, false, Some(vars), "scenario1.cfg"),
                kind: ScenarioKind::Aggregate(TransferCheck {
                    sender: "a".into(),
                    receiver: "b".into(),
                    file: p.file.into(),
                    expected_sha256: Some(p.sha256.into()),
                    max_duration: Some(p.max_duration),
                }),
            }
        })
        .collect()
}

/// Names of the built-in suites, in run order.
pub const SUITE_NAMES: &[&str] = &["transport", "reliable-transfer", "full-stack"];

/// Look up one built-in suite by name.
pub fn suite_by_name(cfg: &RunnerConfig, name: &str) -> Option<Vec<Scenario>> {
    match name {
        "transport" => Some(transport_suite(cfg)),
        "reliable-transfer" => Some(reliable_transfer_suite(cfg)),
        "full-stack" => Some(full_stack_suite(cfg)),
        _ => None,
    }
}
