//! Three-way handshake validation against replayed traces.

use std::path::Path;
use tracelab_conformance::check::{Handshake, RoundCheck};
use tracelab_conformance::run::evaluate_trace;
use tracelab_conformance::scenario::{Scenario, ScenarioKind};

fn handshake_scenario(record: bool) -> Scenario {
    Scenario {
        name: "handshake-under-test".into(),
        command: vec![],
        kind: ScenarioKind::Rounds(vec![RoundCheck::Handshake(Handshake {
            client_hosts: vec!["a".into()],
            server: "b".into(),
            pair: ("a".into(), "b".into()),
            record,
        })]),
    }
}

#[test]
fn valid_handshake_passes() {
    let trace = "\
3.000000 a START
4.000 b Received TCP packet (10.0.0.1:40000 -> 10.0.0.2:1234)  Flags: S, Seq=100, Ack=0, Data=
4.010 a Received TCP packet (10.0.0.2:1234 -> 10.0.0.1:40000)  Flags: SA, Seq=500, Ack=101, Data=
4.020 b Received TCP packet (10.0.0.1:40000 -> 10.0.0.2:1234)  Flags: A, Seq=101, Ack=501, Data=
";
    let report = evaluate_trace(&handshake_scenario(false), trace, Path::new("."));
    assert_eq!((report.success, report.evaluated), (1, 1), "{:?}", report.diagnostics);
}

#[test]
fn synack_must_acknowledge_seq_plus_one() {
    // Ack=100 echoes the client's sequence number instead of advancing it.
    let trace = "\
3.000000 a START
4.000 b Received TCP packet (10.0.0.1:40000 -> 10.0.0.2:1234)  Flags: S, Seq=100, Ack=0, Data=
4.010 a Received TCP packet (10.0.0.2:1234 -> 10.0.0.1:40000)  Flags: SA, Seq=500, Ack=100, Data=
4.020 b Received TCP packet (10.0.0.1:40000 -> 10.0.0.2:1234)  Flags: A, Seq=101, Ack=501, Data=
";
    let report = evaluate_trace(&handshake_scenario(false), trace, Path::new("."));
    assert_eq!((report.success, report.evaluated), (0, 1));
    assert!(
        report
            .diagnostics
            .iter()
            .any(|d| d.starts_with("SYNACK packet malformed")),
        "{:?}",
        report.diagnostics
    );
}

#[test]
fn final_ack_arithmetic_is_checked() {
    // seq must be client_seq + 1 and ack must be server_seq + 1.
    let trace = "\
3.000000 a START
4.000 b Received TCP packet (10.0.0.1:40000 -> 10.0.0.2:1234)  Flags: S, Seq=100, Ack=0, Data=
4.010 a Received TCP packet (10.0.0.2:1234 -> 10.0.0.1:40000)  Flags: SA, Seq=500, Ack=101, Data=
4.020 b Received TCP packet (10.0.0.1:40000 -> 10.0.0.2:1234)  Flags: A, Seq=100, Ack=501, Data=
";
    let report = evaluate_trace(&handshake_scenario(false), trace, Path::new("."));
    assert_eq!((report.success, report.evaluated), (0, 1));
    assert!(report
        .diagnostics
        .iter()
        .any(|d| d.starts_with("ACK packet malformed")));
}

#[test]
fn syn_at_wrong_host_fails() {
    let trace = "\
3.000000 a START
4.000 c Received TCP packet (10.0.0.1:40000 -> 10.0.0.2:1234)  Flags: S, Seq=100, Ack=0, Data=
4.010 a Received TCP packet (10.0.0.2:1234 -> 10.0.0.1:40000)  Flags: SA, Seq=500, Ack=101, Data=
4.020 b Received TCP packet (10.0.0.1:40000 -> 10.0.0.2:1234)  Flags: A, Seq=101, Ack=501, Data=
";
    let report = evaluate_trace(&handshake_scenario(false), trace, Path::new("."));
    assert_eq!((report.success, report.evaluated), (0, 1));
    assert!(report
        .diagnostics
        .iter()
        .any(|d| d.contains("SYN packet was expected at b, not c")));
}

#[test]
fn trailing_packet_fails_the_round() {
    let trace = "\
3.000000 a START
4.000 b Received TCP packet (10.0.0.1:40000 -> 10.0.0.2:1234)  Flags: S, Seq=100, Ack=0, Data=
4.010 a Received TCP packet (10.0.0.2:1234 -> 10.0.0.1:40000)  Flags: SA, Seq=500, Ack=101, Data=
4.020 b Received TCP packet (10.0.0.1:40000 -> 10.0.0.2:1234)  Flags: A, Seq=101, Ack=501, Data=
4.030 b Received TCP packet (10.0.0.1:40000 -> 10.0.0.2:1234)  Flags: A, Seq=101, Ack=501, Data=
";
    let report = evaluate_trace(&handshake_scenario(false), trace, Path::new("."));
    assert_eq!((report.success, report.evaluated), (0, 1));
    assert!(report
        .diagnostics
        .iter()
        .any(|d| d == "Expected no further packets"));
}

#[test]
fn missing_syn_reports_expectation() {
    let trace = "3.000000 a START\n";
    let report = evaluate_trace(&handshake_scenario(false), trace, Path::new("."));
    assert_eq!((report.success, report.evaluated), (0, 1));
    assert_eq!(
        report.diagnostics,
        vec!["Expected SYN packet arriving at b".to_string()]
    );
}
