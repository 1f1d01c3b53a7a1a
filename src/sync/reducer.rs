//! Move-log reducer: reorder, deduplicate and fold log records.
//!
//! Records are buffered by timestamp and folded one at a time, smallest
//! first. A record the session has already folded (re-delivery, snapshot
//! replay after resubscribe) is dropped without effect. Folding one record
//! at a time lets the caller wait for the presentation layer between
//! moves.
//!
//! A record can also arrive after a later one was folded. The reducer
//! keeps every record folded since the session's base position, so it
//! rewinds the session and refolds the lot in timestamp order.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::core::SyncConfig;
use crate::session::{AppliedMove, Session};

use super::error::ProtocolViolation;
use super::record::{LogicalTimestamp, MoveRecord};

/// What happened to an ingested record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IngestDecision {
    /// Waiting in the reorder buffer.
    Buffered,
    /// Already folded or already buffered.
    DuplicateNoop,
    /// The reorder buffer is full; the record was dropped.
    Overflow,
}

/// Result of folding one buffered record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Fold {
    /// The move was applied.
    Applied(AppliedMove),
    /// The record was dropped; the session is unchanged apart from the
    /// watermark.
    Violation(ProtocolViolation),
    /// A late record arrived. The session is back at its base position
    /// and the following steps refold every known record.
    Rewound,
}

/// Reorder buffer plus the fold step.
#[derive(Clone, Debug)]
pub struct MoveLogReducer {
    pending: BTreeMap<LogicalTimestamp, MoveRecord>,
    folded: BTreeMap<LogicalTimestamp, MoveRecord>,
    max_pending: usize,
}

impl MoveLogReducer {
    /// Create an empty reducer.
    pub fn new(config: &SyncConfig) -> Self {
        Self {
            pending: BTreeMap::new(),
            folded: BTreeMap::new(),
            max_pending: config.max_pending_records,
        }
    }

    /// Records waiting to be folded.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Buffer one record for folding.
    pub fn ingest(&mut self, session: &Session, record: MoveRecord) -> IngestDecision {
        let timestamp = record.timestamp;
        if session.has_seen(timestamp) {
            debug!(game = %session.game_id(), %timestamp, "Dropping already-folded record");
            return IngestDecision::DuplicateNoop;
        }

        if let Some(existing) = self.pending.get(&timestamp) {
            if existing != &record {
                warn!(
                    game = %session.game_id(),
                    %timestamp,
                    "Two different records share a timestamp; keeping the first"
                );
            }
            return IngestDecision::DuplicateNoop;
        }

        if self.pending.len() >= self.max_pending {
            warn!(
                game = %session.game_id(),
                %timestamp,
                max_pending = self.max_pending,
                "Reorder buffer full, dropping record"
            );
            return IngestDecision::Overflow;
        }

        self.pending.insert(timestamp, record);
        IngestDecision::Buffered
    }

    /// Buffer a delivered batch. Returns how many records were newly
    /// buffered.
    pub fn ingest_batch(
        &mut self,
        session: &Session,
        records: impl IntoIterator<Item = MoveRecord>,
    ) -> usize {
        records
            .into_iter()
            .map(|record| self.ingest(session, record))
            .filter(|decision| *decision == IngestDecision::Buffered)
            .count()
    }

    /// Fold the oldest buffered record into `session`.
    ///
    /// Returns `None` when nothing is buffered.
    pub fn step(&mut self, session: &mut Session) -> Option<Fold> {
        loop {
            let (&timestamp, _) = self.pending.first_key_value()?;
            // The session may have moved past buffered records, e.g. after
            // restoring a snapshot.
            if session.has_seen(timestamp) {
                self.pending.pop_first();
                continue;
            }
            if session.is_late(timestamp) {
                return Some(self.rewind(session, timestamp));
            }
            let (_, record) = self.pending.pop_first()?;
            return Some(self.fold(session, record));
        }
    }

    /// Fold every buffered record, oldest first.
    pub fn drain(&mut self, session: &mut Session) -> Vec<Fold> {
        std::iter::from_fn(|| self.step(session)).collect()
    }

    fn rewind(&mut self, session: &mut Session, late: LogicalTimestamp) -> Fold {
        info!(
            game = %session.game_id(),
            %late,
            last_applied = ?session.last_applied(),
            refold = self.folded.len(),
            "Late record, refolding from base"
        );
        session.rewind();
        self.pending.append(&mut self.folded);
        Fold::Rewound
    }

    fn fold(&mut self, session: &mut Session, record: MoveRecord) -> Fold {
        let timestamp = record.timestamp;
        let result = match record.to_move(session.local_uid()) {
            Some(mv) => session.apply_record(timestamp, mv),
            None => {
                session.mark_seen(timestamp);
                Err(ProtocolViolation::HouseOutOfRange {
                    timestamp,
                    house: record.house,
                })
            }
        };

        let fold = match result {
            Ok(applied) => Fold::Applied(applied),
            Err(violation) => {
                warn!(
                    game = %session.game_id(),
                    uid = %record.uid,
                    %violation,
                    "Dropping move record"
                );
                Fold::Violation(violation)
            }
        };
        self.folded.insert(timestamp, record);
        fold
    }
}
