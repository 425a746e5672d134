//! Live TCP connection bookkeeping.
//!
//! A conversation is identified by its 4-tuple in the orientation first
//! observed (initiator to listener). Counters are created only by a
//! completed handshake and advanced only by the byte length of confirmed
//! data; a lookup miss is reported to the checker as a failure, never a
//! panic.

use std::collections::HashMap;
use std::fmt;

/// Identity of one bidirectional TCP conversation, in initiator-to-listener
/// orientation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionKey {
    pub src_port: u16,
    pub dst_port: u16,
    pub src_addr: String,
    pub dst_addr: String,
}

impl ConnectionKey {
    pub fn new(
        src_port: u16,
        dst_port: u16,
        src_addr: impl Into<String>,
        dst_addr: impl Into<String>,
    ) -> Self {
        Self {
            src_port,
            dst_port,
            src_addr: src_addr.into(),
            dst_addr: dst_addr.into(),
        }
    }
}

impl fmt::Display for ConnectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}:{} -> {}:{})",
            self.src_addr, self.src_port, self.dst_addr, self.dst_port
        )
    }
}

/// Next expected sequence number per direction of one conversation.
///
/// `initiator` is the next byte the connection initiator will send;
/// `responder` the next byte the listener side will send. Both start one
/// past the handshake ISNs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeqState {
    pub initiator: u64,
    pub responder: u64,
}

/// Label for the pair of hosts a connection belongs to, letting several
/// host pairs share one scenario without key collisions.
pub type PairLabel = (String, String);

/// Per-scenario map from connection identity to live counters. Owned by one
/// scenario run and discarded with it.
#[derive(Debug, Default)]
pub struct ConnectionStore {
    conns: HashMap<PairLabel, HashMap<ConnectionKey, SeqState>>,
}

impl ConnectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a freshly established connection. A key already present keeps
    /// its counters; a repeated handshake must not rewind them.
    pub fn record(&mut self, pair: &PairLabel, key: ConnectionKey, state: SeqState) {
        self.conns
            .entry(pair.clone())
            .or_default()
            .entry(key)
            .or_insert(state);
    }

    /// Mutable access to a connection's counters, if the handshake was seen.
    pub fn get_mut(&mut self, pair: &PairLabel, key: &ConnectionKey) -> Option<&mut SeqState> {
        self.conns.get_mut(pair)?.get_mut(key)
    }

    pub fn get(&self, pair: &PairLabel, key: &ConnectionKey) -> Option<&SeqState> {
        self.conns.get(pair)?.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.conns.values().all(|m| m.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> PairLabel {
        ("a".to_string(), "d".to_string())
    }

    fn key() -> ConnectionKey {
        ConnectionKey::new(33234, 8000, "10.0.0.2", "10.0.0.4")
    }

    #[test]
    fn record_then_advance() {
        let mut store = ConnectionStore::new();
        store.record(&pair(), key(), SeqState { initiator: 4322, responder: 771 });

        let state = store.get_mut(&pair(), &key()).unwrap();
        state.initiator += 10;
        assert_eq!(
            store.get(&pair(), &key()),
            Some(&SeqState { initiator: 4332, responder: 771 })
        );
    }

    #[test]
    fn repeated_handshake_keeps_counters() {
        let mut store = ConnectionStore::new();
        store.record(&pair(), key(), SeqState { initiator: 100, responder: 200 });
        store.get_mut(&pair(), &key()).unwrap().initiator = 150;
        // A second record for the same key must not rewind anything.
        store.record(&pair(), key(), SeqState { initiator: 100, responder: 200 });
        assert_eq!(store.get(&pair(), &key()).unwrap().initiator, 150);
    }

    #[test]
    fn unknown_pair_or_key_is_none() {
        let mut store = ConnectionStore::new();
        store.record(&pair(), key(), SeqState { initiator: 1, responder: 1 });
        let other_pair = ("b".to_string(), "d".to_string());
        assert!(store.get_mut(&other_pair, &key()).is_none());
        let other_key = ConnectionKey::new(1, 2, "10.0.0.9", "10.0.0.4");
        assert!(store.get_mut(&pair(), &other_key).is_none());
    }
}
