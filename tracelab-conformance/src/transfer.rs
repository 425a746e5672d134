//! Whole-trace transfer checks for the throughput/integrity scenarios.
//!
//! These scenarios do not exchange discrete rounds; the entire trace is one
//! check: did the sender send and get acknowledgment for everything, did
//! the receiver receive everything, does the received file hash to the
//! expected digest, and did it all finish inside the deadline.

use crate::verdict::Diag;
use sha2::{Digest, Sha256};
use std::path::Path;
use tracelab_core::record::{Observation, Payload, TransferAction};

/// Aggregate expectations for one file-transfer scenario.
#[derive(Debug, Clone)]
pub struct TransferCheck {
    pub sender: String,
    pub receiver: String,
    /// File expected to appear in the downloads directory.
    pub file: String,
    /// Expected SHA-256 of the received file, lowercase hex. `None` skips
    /// the integrity check.
    pub expected_sha256: Option<String>,
    /// Maximum seconds between the start marker and the last progress
    /// report. `None` skips the deadline check.
    pub max_duration: Option<f64>,
}

impl TransferCheck {
    /// Evaluate the whole trace; one aggregate verdict.
    pub fn evaluate<'a>(
        &self,
        observations: impl IntoIterator<Item = &'a Observation>,
        downloads_dir: &Path,
        diag: &mut Diag,
    ) -> bool {
        let mut start_time = None;
        let mut end_time = None;
        let mut progress = std::collections::HashMap::new();

        for obs in observations {
            match &obs.payload {
                Payload::Start => start_time = Some(obs.timestamp),
                Payload::Progress { percent, action } => {
                    end_time = Some(obs.timestamp);
                    progress.insert((obs.host.clone(), *action), *percent);
                }
                _ => {}
            }
        }

        let pct = |host: &str, action: TransferAction| {
            progress
                .get(&(host.to_string(), action))
                .copied()
                .unwrap_or(0)
        };
        let sent = pct(&self.sender, TransferAction::Sent);
        if sent != 100 {
            diag.note(format!("{} sent only {sent}%", self.sender));
            return false;
        }
        let acked = pct(&self.sender, TransferAction::Acked);
        if acked != 100 {
            diag.note(format!("{} received acks for only {acked}%", self.sender));
            return false;
        }
        let recvd = pct(&self.receiver, TransferAction::Recvd);
        if recvd != 100 {
            diag.note(format!("{} received only {recvd}%", self.receiver));
            return false;
        }

        if let Some(expected) = &self.expected_sha256 {
            let path = downloads_dir.join(&self.file);
            let bytes = match std::fs::read(&path) {
                Ok(bytes) => bytes,
                Err(_) => {
                    diag.note(format!("Problem reading {} for checksum", path.display()));
                    return false;
                }
            };
            let digest = hex::encode(Sha256::digest(&bytes));
            if &digest != expected {
                diag.note(format!(
                    "SHA-256 digest of {} does not match",
                    path.display()
                ));
                return false;
            }
        }

        let (Some(start), Some(end)) = (start_time, end_time) else {
            diag.note("Missing start marker or transfer progress lines");
            return false;
        };
        let duration = end - start;
        if let Some(max) = self.max_duration {
            if duration > max {
                diag.note(format!("Expected duration exceeded ({duration:.6} > {max:.6})"));
                return false;
            }
        }

        diag.note(format!(
            "Finished in {duration:.6} seconds (end time: {end:.6})"
        ));
        true
    }
}
