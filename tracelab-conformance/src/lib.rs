#![forbid(unsafe_code)]
//! Scenario conformance checking for simulated network traces.
//!
//! Builds on `tracelab-core`: scenarios pair a simulator launch command
//! with either an ordered list of per-round protocol checks (UDP exchange,
//! TCP handshake, duplex echo) or one aggregate transfer check, and
//! [`run::evaluate_trace`] replays a captured trace against them, yielding
//! a success/evaluated tally plus diagnostics.
//!
//! # Quick Start
//!
//! ```
//! use tracelab_conformance::{run::evaluate_trace, scenario::transport_suite};
//! use tracelab_core::RunnerConfig;
//!
//! let cfg = RunnerConfig::default();
//! let scenario = &transport_suite(&cfg)[0];
//! let trace = "\
//! 3.000000 a START
//! 4.002 a Netcat sending UDP msg to 10.0.0.2:5900: hello
//! 4.010 b Host received UDP msg (10.0.0.1:40000 -> 10.0.0.2:5900): hello
//! ";
//! let report = evaluate_trace(scenario, trace, std::path::Path::new("."));
//! assert_eq!((report.success, report.evaluated), (1, 1));
//! ```

pub mod check;
pub mod run;
pub mod scenario;
pub mod transfer;
pub mod verdict;

pub use check::RoundCheck;
pub use run::{evaluate_trace, RoundScorer, ScenarioReport};
pub use scenario::{suite_by_name, Scenario, ScenarioKind, SUITE_NAMES};
pub use transfer::TransferCheck;
pub use verdict::{Diag, Verdict};
