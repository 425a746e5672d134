//! Iteration windowing.
//!
//! Observations arrive as one ordered stream; scenario checkers expect them
//! in discrete rounds, one per nominal period of scheduled activity. The
//! windower segments the stream with a rolling cutoff: a round closes when
//! an observation lands past the current window, and the next window anchor
//! is pulled forward by the nominal period minus a slack tolerance so that a
//! slightly-early round is not split in two. A round that produced nothing
//! shifts the anchor by the slack amount before it is reported, which keeps
//! repeated empty rounds from drifting the schedule.
//!
//! The slack shift is keyed off the batch being empty at close time, not off
//! the window as a whole; after the close loop has run once the batch is
//! always empty, so consecutive empty rounds advance by exactly one period
//! each. Scenario timings depend on this exact behavior.

use crate::record::{Observation, Payload};
use std::collections::VecDeque;

/// Nominal seconds between scheduled rounds of scenario activity.
pub const PERIOD: f64 = 1.0;
/// Width of the acceptance window that follows a round's anchor.
pub const MAX_INTERVAL: f64 = 0.5;
/// Tolerance subtracted from the period when predicting the next anchor.
pub const SLACK: f64 = 0.15;

/// An ordered batch of observations belonging to one round.
#[derive(Debug, Clone, PartialEq)]
pub struct Round {
    /// 0-based round number since the last start marker.
    pub index: u64,
    /// Effective anchor time of the window that produced this batch.
    pub anchor: f64,
    /// Observations in arrival order; checkers pop from the front.
    pub observations: VecDeque<Observation>,
}

impl Round {
    /// Convenience constructor used by tests and the final flush.
    pub fn new(index: u64, anchor: f64, observations: VecDeque<Observation>) -> Self {
        Self { index, anchor, observations }
    }
}

/// Receiver for closed rounds.
pub trait RoundSink {
    fn on_round(&mut self, round: Round);
}

impl<F: FnMut(Round)> RoundSink for F {
    fn on_round(&mut self, round: Round) {
        self(round)
    }
}

#[derive(Debug)]
struct WindowState {
    anchor: f64,
    cutoff: f64,
    next_anchor: f64,
    index: u64,
    batch: VecDeque<Observation>,
}

impl WindowState {
    fn anchored_at(anchor: f64, index: u64) -> Self {
        Self {
            anchor,
            cutoff: anchor + MAX_INTERVAL,
            next_anchor: anchor + (PERIOD - SLACK),
            index,
            batch: VecDeque::new(),
        }
    }
}

/// Segments an ordered observation stream into rounds.
///
/// Input timestamps are assumed non-decreasing; the windower performs no
/// sorting and no lookahead.
#[derive(Debug, Default)]
pub struct Windower {
    state: Option<WindowState>,
}

impl Windower {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one observation, delivering any rounds it closes.
    ///
    /// A start marker resynchronizes the schedule to one period past its own
    /// timestamp and is itself consumed; everything else is appended to the
    /// current batch, after closing whatever windows its timestamp has
    /// already passed.
    pub fn feed(&mut self, obs: Observation, sink: &mut impl RoundSink) {
        if obs.payload == Payload::Start {
            tracing::trace!(at = obs.timestamp, "start marker, windowing resynchronized");
            self.state = Some(WindowState::anchored_at(obs.timestamp + PERIOD, 0));
            return;
        }

        let time = obs.timestamp;
        let state = self
            .state
            .get_or_insert_with(|| WindowState::anchored_at(time, 0));

        while time > state.cutoff {
            if state.batch.is_empty() {
                // A round that produced nothing gives its slack back so the
                // schedule does not creep earlier across quiet periods.
                state.anchor += SLACK;
                state.next_anchor += SLACK;
            }
            let batch = std::mem::take(&mut state.batch);
            tracing::trace!(index = state.index, anchor = state.anchor, len = batch.len(), "round closed");
            sink.on_round(Round {
                index: state.index,
                anchor: state.anchor,
                observations: batch,
            });
            state.index += 1;
            state.anchor = state.next_anchor;
            state.cutoff = state.anchor + MAX_INTERVAL;
            state.next_anchor = state.anchor + (PERIOD - SLACK);
        }

        if state.batch.is_empty() {
            // First observation of a round defines the round: re-anchor to
            // the time actually seen rather than the predicted slot.
            state.anchor = time;
            state.cutoff = time + MAX_INTERVAL;
            state.next_anchor = time + (PERIOD - SLACK);
        }
        state.batch.push_back(obs);
    }

    /// Flush whatever remains at end of input.
    ///
    /// Always delivers exactly one final round, even when the batch is empty
    /// or no observation was ever fed.
    pub fn finish(self, sink: &mut impl RoundSink) {
        match self.state {
            Some(state) => sink.on_round(Round {
                index: state.index,
                anchor: state.anchor,
                observations: state.batch,
            }),
            None => sink.on_round(Round::new(0, 0.0, VecDeque::new())),
        }
    }
}
