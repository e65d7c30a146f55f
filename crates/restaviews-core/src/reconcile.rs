//! Merge policy between a freshly fetched entity and its mirror copy.
//!
//! Last write wins, gated by `updatedAt` and the `awaitingSync` flag. A
//! pending local mutation always beats a fresh network snapshot until the
//! replay engine confirms it. This is only sound under the single-writer
//! assumption: one user device mutates a given entity at a time. It is not a
//! substitute for vector clocks and must not be reused for multi-writer data.

use crate::models::MirrorRecord;

/// What to do with one fetched record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeDecision {
    /// Upsert the fetched record and hand it to the caller
    Store,
    /// Keep the mirror untouched and hand the local record to the caller
    KeepLocal,
    /// Mirror already matches; hand the fetched record to the caller
    Unchanged,
}

/// Decide how a fetched record merges into the mirror.
pub fn decide<R: MirrorRecord>(local: Option<&R>, fetched: &R) -> MergeDecision {
    match local {
        None => MergeDecision::Store,
        Some(local) if local.awaiting_sync() => MergeDecision::KeepLocal,
        Some(local) if local.updated_at() != fetched.updated_at() => MergeDecision::Store,
        Some(_) => MergeDecision::Unchanged,
    }
}
