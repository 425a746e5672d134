//! End-to-end replay of the multi-connection echo scenario.

use std::path::Path;
use tracelab_conformance::run::evaluate_trace;
use tracelab_conformance::scenario::full_stack_suite;
use tracelab_core::RunnerConfig;

fn handshake(t: u32, client_ip: &str, port: u16, seq: u64, srv_seq: u64, client: &str) -> String {
    format!(
        "\
{t}.000 d Received TCP packet ({client_ip}:{port} -> 10.0.0.4:8000)  Flags: S, Seq={seq}, Ack=0, Data=
{t}.010 {client} Received TCP packet (10.0.0.4:8000 -> {client_ip}:{port})  Flags: SA, Seq={srv_seq}, Ack={}, Data=
{t}.020 d Received TCP packet ({client_ip}:{port} -> 10.0.0.4:8000)  Flags: A, Seq={}, Ack={}, Data=
",
        seq + 1,
        seq + 1,
        srv_seq + 1,
    )
}

fn echo(
    t: u32,
    client_ip: &str,
    port: u16,
    seq: u64,
    srv_seq: u64,
    client: &str,
    data: &str,
) -> String {
    let len = data.len() as u64;
    format!(
        "\
{t}.000 d Received TCP packet ({client_ip}:{port} -> 10.0.0.4:8000)  Flags: , Seq={seq}, Ack={srv_seq}, Data={data}
{t}.010 {client} Received TCP packet (10.0.0.4:8000 -> {client_ip}:{port})  Flags: A, Seq={srv_seq}, Ack={}, Data=
{t}.020 {client} Received TCP packet (10.0.0.4:8000 -> {client_ip}:{port})  Flags: , Seq={srv_seq}, Ack={}, Data={data}
{t}.030 d Received TCP packet ({client_ip}:{port} -> 10.0.0.4:8000)  Flags: A, Seq={}, Ack={}, Data=
",
        seq + len,
        seq + len,
        seq + len,
        srv_seq + len,
    )
}

#[test]
fn two_connections_interleave_cleanly() {
    // Round 0 is blank; connections from a and b to the server d then
    // alternate handshake and echo rounds, each advancing its own counters.
    let trace = format!(
        "3.000000 a START\n{}{}{}{}{}",
        handshake(5, "10.0.0.1", 40000, 1000, 5000, "a"),
        echo(6, "10.0.0.1", 40000, 1001, 5001, "a", "helloworld"),
        handshake(7, "10.0.0.2", 41000, 2000, 6000, "b"),
        echo(8, "10.0.0.2", 41000, 2001, 6001, "b", "abc"),
        echo(9, "10.0.0.1", 40000, 1011, 5011, "a", "xy"),
    );
    let scenario = &full_stack_suite(&RunnerConfig::default())[0];
    let report = evaluate_trace(scenario, &trace, Path::new("."));
    assert_eq!((report.success, report.evaluated), (5, 5), "{:?}", report.diagnostics);
}

#[test]
fn echo_on_a_foreign_tuple_fails() {
    // The echo round scoped to the (a, d) pair receives traffic on b's
    // 4-tuple, which no handshake under that pair ever recorded.
    let trace = format!(
        "3.000000 a START\n{}{}",
        handshake(5, "10.0.0.1", 40000, 1000, 5000, "a"),
        echo(6, "10.0.0.2", 41000, 2001, 6001, "b", "zz"),
    );
    let scenario = &full_stack_suite(&RunnerConfig::default())[0];
    let report = evaluate_trace(scenario, &trace, Path::new("."));
    // Rounds: blank, handshake(a) passes, echo fails on the unknown key.
    assert_eq!((report.success, report.evaluated), (1, 2), "{:?}", report.diagnostics);
    assert!(report
        .diagnostics
        .iter()
        .any(|d| d.contains("does not match any existing connections")));
}
