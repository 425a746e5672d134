#![forbid(unsafe_code)]
//! Core building blocks for trace-driven protocol conformance checking.
//!
//! A simulated network writes a timestamped, line-oriented log; this crate
//! turns that text into typed observations ([`record`]), groups them into
//! per-round batches with a slack-tolerant rolling window ([`window`]), and
//! tracks live TCP sequence state across rounds ([`conn`]). Scenario
//! checking itself lives in the conformance crate.
//!
//! # Quick Start
//!
//! ```
//! use tracelab_core::record::parse_line;
//! use tracelab_core::window::{Round, Windower};
//!
//! let mut rounds: Vec<Round> = Vec::new();
//! let mut sink = |r: Round| rounds.push(r);
//! let mut windower = Windower::new();
//! for line in ["3.000000 a START", "4.002 a Netcat sending UDP msg to 10.0.0.2:5900: hello"] {
//!     if let Some(obs) = parse_line(line) {
//!         windower.feed(obs, &mut sink);
//!     }
//! }
//! windower.finish(&mut sink);
//! assert_eq!(rounds.len(), 1);
//! ```

pub mod config;
pub mod conn;
pub mod error;
pub mod record;
pub mod window;

pub use config::RunnerConfig;
pub use conn::{ConnectionKey, ConnectionStore, PairLabel, SeqState};
pub use error::{Error, Result};
pub use record::{
    Category, Endpoint, Observation, Payload, TcpSegment, TransferAction, UdpMessage, parse_line,
};
pub use window::{Round, RoundSink, Windower, MAX_INTERVAL, PERIOD, SLACK};
