//! Closed-port probe rounds with optional RST replies.

use std::path::Path;
use tracelab_conformance::run::evaluate_trace;
use tracelab_conformance::scenario::transport_suite;
use tracelab_core::RunnerConfig;

fn tcp_scenario() -> tracelab_conformance::Scenario {
    transport_suite(&RunnerConfig::default())
        .into_iter()
        .find(|s| s.name == "tcp-handshake")
        .unwrap()
}

const SYN_PROBE: &str =
    "4.000 b Host received TCP packet (10.0.0.1:40000 -> 10.0.0.2:1234)  Flags: S, Seq=100, Ack=0";

#[test]
fn absent_rst_is_a_plain_pass() {
    let trace = format!("3.000000 a START\n{SYN_PROBE}\n");
    let report = evaluate_trace(&tcp_scenario(), &trace, Path::new("."));
    assert_eq!((report.success, report.evaluated), (1, 1), "{:?}", report.diagnostics);
    assert!(report.diagnostics.is_empty());
}

#[test]
fn correct_rst_earns_extra_credit_note() {
    let trace = format!(
        "3.000000 a START\n{SYN_PROBE}\n\
4.010 a Host received TCP packet (10.0.0.2:1234 -> 10.0.0.1:40000)  Flags: R, Seq=0, Ack=101
"
    );
    let report = evaluate_trace(&tcp_scenario(), &trace, Path::new("."));
    assert_eq!((report.success, report.evaluated), (1, 1), "{:?}", report.diagnostics);
    assert_eq!(report.diagnostics, ["Extra credit for TCP RST"]);
}

#[test]
fn malformed_rst_notes_but_does_not_fail() {
    // RST keeps the probe's orientation instead of swapping it.
    let trace = format!(
        "3.000000 a START\n{SYN_PROBE}\n\
4.010 a Host received TCP packet (10.0.0.1:40000 -> 10.0.0.2:1234)  Flags: R, Seq=0, Ack=101
"
    );
    let report = evaluate_trace(&tcp_scenario(), &trace, Path::new("."));
    assert_eq!((report.success, report.evaluated), (1, 1));
    assert!(report
        .diagnostics
        .iter()
        .any(|d| d.starts_with("RST malformed")));
}

#[test]
fn probe_with_data_flags_fails() {
    let trace = "\
3.000000 a START
4.000 b Host received TCP packet (10.0.0.1:40000 -> 10.0.0.2:1234)  Flags: SA, Seq=100, Ack=0
";
    let report = evaluate_trace(&tcp_scenario(), trace, Path::new("."));
    assert_eq!((report.success, report.evaluated), (0, 1));
    assert!(report
        .diagnostics
        .iter()
        .any(|d| d.starts_with("SYN flags incorrect")));
}

#[test]
fn full_tcp_scenario_sequence() {
    // Round 0: closed-port probe. Round 1: blank. Round 2: handshake.
    // Round 3: probe again. Round 4: handshake on a fresh port.
    let handshake = |t: u32, port: u16, seq: u64, srv_seq: u64| {
        format!(
            "\
{t}.000 b Host received TCP packet (10.0.0.1:40000 -> 10.0.0.2:{port})  Flags: S, Seq={seq}, Ack=0
{t}.010 a Host received TCP packet (10.0.0.2:{port} -> 10.0.0.1:40000)  Flags: SA, Seq={srv_seq}, Ack={}
{t}.020 b Host received TCP packet (10.0.0.1:40000 -> 10.0.0.2:{port})  Flags: A, Seq={}, Ack={}
",
            seq + 1,
            seq + 1,
            srv_seq + 1,
        )
    };
    let trace = format!(
        "3.000000 a START\n{SYN_PROBE}\n{}{}{}",
        handshake(6, 8000, 200, 900),
        "7.000 b Host received TCP packet (10.0.0.1:40001 -> 10.0.0.2:1234)  Flags: S, Seq=300, Ack=0\n",
        handshake(8, 8000, 400, 1700),
    );
    let report = evaluate_trace(&tcp_scenario(), &trace, Path::new("."));
    assert_eq!((report.success, report.evaluated), (4, 4), "{:?}", report.diagnostics);
}
