//! Trace evaluation: wiring the windower to a scenario's checks.

use crate::check::RoundCheck;
use crate::scenario::{Scenario, ScenarioKind};
use crate::verdict::Diag;
use std::path::Path;
use tracelab_core::conn::ConnectionStore;
use tracelab_core::record::parse_line;
use tracelab_core::window::{Round, RoundSink, Windower};

/// Per-scenario outcome: how many rounds were graded, how many passed, and
/// every diagnostic produced along the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioReport {
    pub name: String,
    pub success: u32,
    pub evaluated: u32,
    pub diagnostics: Vec<String>,
}

impl ScenarioReport {
    pub fn summary(&self) -> String {
        format!("{}/{}", self.success, self.evaluated)
    }
}

/// Round sink that grades each closed round against the scenario's check
/// list and tallies verdicts.
///
/// Checks are selected by the number of rounds seen so far in this run;
/// rounds past the end of the list are not applicable and leave both tallies
/// untouched. The connection store lives and dies with the scorer.
pub struct RoundScorer<'a> {
    checks: &'a [RoundCheck],
    store: ConnectionStore,
    rounds_seen: usize,
    success: u32,
    evaluated: u32,
    diagnostics: Vec<String>,
}

impl<'a> RoundScorer<'a> {
    pub fn new(checks: &'a [RoundCheck]) -> Self {
        Self {
            checks,
            store: ConnectionStore::new(),
            rounds_seen: 0,
            success: 0,
            evaluated: 0,
            diagnostics: Vec::new(),
        }
    }

    pub fn into_report(self, name: impl Into<String>) -> ScenarioReport {
        ScenarioReport {
            name: name.into(),
            success: self.success,
            evaluated: self.evaluated,
            diagnostics: self.diagnostics,
        }
    }
}

impl RoundSink for RoundScorer<'_> {
    fn on_round(&mut self, mut round: Round) {
        let slot = self.rounds_seen;
        self.rounds_seen += 1;
        let Some(check) = self.checks.get(slot) else {
            return;
        };

        let mut diag = Diag::new();
        let verdict = check.evaluate(&mut round, &mut self.store, &mut diag);
        tracing::debug!(round = round.index, slot, ?verdict, "round graded");
        self.diagnostics.extend(diag.into_notes());
        if verdict.is_pass() {
            self.success += 1;
            self.evaluated += 1;
        } else if verdict == crate::verdict::Verdict::Fail {
            self.evaluated += 1;
        }
    }
}

/// Replay one scenario's captured output and grade it.
///
/// `downloads_dir` is consulted only by aggregate transfer checks.
pub fn evaluate_trace(scenario: &Scenario, output: &str, downloads_dir: &Path) -> ScenarioReport {
    match &scenario.kind {
        ScenarioKind::Rounds(checks) => {
            let mut scorer = RoundScorer::new(checks);
            let mut windower = Windower::new();
            for line in output.lines() {
                if let Some(obs) = parse_line(line) {
                    windower.feed(obs, &mut scorer);
                }
            }
            windower.finish(&mut scorer);
            scorer.into_report(scenario.name.clone())
        }
        ScenarioKind::Aggregate(check) => {
            let observations: Vec<_> = output.lines().filter_map(parse_line).collect();
            let mut diag = Diag::new();
            let passed = check.evaluate(&observations, downloads_dir, &mut diag);
            ScenarioReport {
                name: scenario.name.clone(),
                success: u32::from(passed),
                evaluated: 1,
                diagnostics: diag.into_notes(),
            }
        }
    }
}
