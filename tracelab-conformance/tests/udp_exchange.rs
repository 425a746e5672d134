//! UDP exchange rounds: direct sends, optional ICMP errors, echo service.

use std::path::Path;
use tracelab_conformance::run::evaluate_trace;
use tracelab_conformance::scenario::transport_suite;
use tracelab_core::RunnerConfig;

fn udp_scenario() -> tracelab_conformance::Scenario {
    transport_suite(&RunnerConfig::default())
        .into_iter()
        .find(|s| s.name == "udp-exchange")
        .unwrap()
}

#[test]
fn direct_send_without_icmp_passes() {
    let trace = "\
3.000000 a START
4.002 a Netcat sending UDP msg to 10.0.0.2:5900: hello
4.010 b Host received UDP msg (10.0.0.1:40000 -> 10.0.0.2:5900): hello
";
    let report = evaluate_trace(&udp_scenario(), trace, Path::new("."));
    assert_eq!((report.success, report.evaluated), (1, 1), "{:?}", report.diagnostics);
    assert!(report.diagnostics.is_empty());
}

#[test]
fn correct_icmp_error_earns_extra_credit_note() {
    let trace = "\
3.000000 a START
4.002 a Netcat sending UDP msg to 10.0.0.2:5900: hello
4.010 b Host received UDP msg (10.0.0.1:40000 -> 10.0.0.2:5900): hello
4.020 a Host received ICMP (type=3, code=3), UDP msg (10.0.0.1:40000 -> 10.0.0.2:5900): hello
";
    let report = evaluate_trace(&udp_scenario(), trace, Path::new("."));
    assert_eq!((report.success, report.evaluated), (1, 1), "{:?}", report.diagnostics);
    assert_eq!(report.diagnostics, ["Extra credit for ICMP message"]);
}

#[test]
fn malformed_icmp_error_notes_but_does_not_fail() {
    // Wrong code: the diagnostic is produced, the round still passes.
    let trace = "\
3.000000 a START
4.002 a Netcat sending UDP msg to 10.0.0.2:5900: hello
4.010 b Host received UDP msg (10.0.0.1:40000 -> 10.0.0.2:5900): hello
4.020 a Host received ICMP (type=3, code=1), UDP msg (10.0.0.1:40000 -> 10.0.0.2:5900): hello
";
    let report = evaluate_trace(&udp_scenario(), trace, Path::new("."));
    assert_eq!((report.success, report.evaluated), (1, 1));
    assert!(report
        .diagnostics
        .iter()
        .any(|d| d.starts_with("ICMP message malformed")));
}

#[test]
fn missing_delivery_fails() {
    let trace = "\
3.000000 a START
4.002 a Netcat sending UDP msg to 10.0.0.2:5900: hello
";
    let report = evaluate_trace(&udp_scenario(), trace, Path::new("."));
    assert_eq!((report.success, report.evaluated), (0, 1));
    assert_eq!(report.diagnostics, ["Expected UDP message arriving at b"]);
}

#[test]
fn echo_round_trip_passes() {
    // Round 0: direct send. Round 1 is deliberately blank. Rounds 2 and 3
    // bounce a message off the echo service on b.
    let echo_round = |t: u32, msg: &str| {
        format!(
            "\
{t}.002 a Netcat sending UDP msg to 10.0.0.2:7777: {msg}
{t}.010 b Host received UDP msg (10.0.0.1:40000 -> 10.0.0.2:7777): {msg}
{t}.012 b Echo server received UDP msg from 10.0.0.1:40000: {msg}
{t}.020 a Host received UDP msg (10.0.0.2:7777 -> 10.0.0.1:40000): {msg}
{t}.022 a Netcat received UDP msg from 10.0.0.2:7777: {msg}
"
        )
    };
    let trace = format!(
        "\
3.000000 a START
4.002 a Netcat sending UDP msg to 10.0.0.2:5900: hello
4.010 b Host received UDP msg (10.0.0.1:40000 -> 10.0.0.2:5900): hello
{}{}",
        echo_round(6, "ping"),
        echo_round(7, "pong"),
    );
    let report = evaluate_trace(&udp_scenario(), &trace, Path::new("."));
    assert_eq!((report.success, report.evaluated), (3, 3), "{:?}", report.diagnostics);
}

#[test]
fn echo_reflection_must_swap_endpoints() {
    // The reflected delivery keeps the request's orientation instead of
    // swapping src and dst.
    let trace = "\
3.000000 a START
4.002 a Netcat sending UDP msg to 10.0.0.2:5900: hello
4.010 b Host received UDP msg (10.0.0.1:40000 -> 10.0.0.2:5900): hello
6.002 a Netcat sending UDP msg to 10.0.0.2:7777: ping
6.010 b Host received UDP msg (10.0.0.1:40000 -> 10.0.0.2:7777): ping
6.012 b Echo server received UDP msg from 10.0.0.1:40000: ping
6.020 a Host received UDP msg (10.0.0.1:40000 -> 10.0.0.2:7777): ping
6.022 a Netcat received UDP msg from 10.0.0.2:7777: ping
";
    let report = evaluate_trace(&udp_scenario(), trace, Path::new("."));
    assert_eq!((report.success, report.evaluated), (1, 2));
    assert!(report
        .diagnostics
        .iter()
        .any(|d| d.starts_with("UDP message malformed")));
}
