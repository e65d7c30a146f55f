//! Sync status shared with whatever displays it.

use std::fmt;

use serde::Serialize;

use crate::sync::ReplayReport;

/// Outcome of the most recent replay, as published by the replay worker.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    /// Last replay could not reach the server; work stays queued
    Offline,
    Syncing,
    /// Outbox drained (or nothing has needed sending yet)
    #[default]
    Synced,
    /// Last replay left entries queued for reasons other than connectivity
    Error,
}

impl SyncState {
    /// State after a replay round covering `reports`.
    pub fn after_replay<'a>(reports: impl IntoIterator<Item = &'a ReplayReport>) -> Self {
        let mut failures = reports
            .into_iter()
            .flat_map(|report| report.failures.iter())
            .peekable();

        if failures.peek().is_none() {
            Self::Synced
        } else if failures.all(|failure| failure.offline) {
            Self::Offline
        } else {
            Self::Error
        }
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Offline => "offline, changes queued",
            Self::Syncing => "syncing",
            Self::Synced => "synced",
            Self::Error => "sync error, will retry",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SyncTag;
    use crate::sync::ReplayFailure;

    fn report(failures: &[bool]) -> ReplayReport {
        ReplayReport {
            kind: SyncTag::Favorites,
            attempted: failures.len() + 1,
            delivered: 1,
            failures: failures
                .iter()
                .enumerate()
                .map(|(key, offline)| ReplayFailure {
                    key: i64::try_from(key).unwrap(),
                    error: "boom".into(),
                    offline: *offline,
                })
                .collect(),
        }
    }

    #[test]
    fn state_follows_replay_failures() {
        assert_eq!(SyncState::after_replay(&[report(&[])]), SyncState::Synced);
        assert_eq!(
            SyncState::after_replay(&[report(&[]), report(&[true, true])]),
            SyncState::Offline
        );
        assert_eq!(
            SyncState::after_replay(&[report(&[true, false])]),
            SyncState::Error
        );
        assert_eq!(
            SyncState::after_replay(Vec::<ReplayReport>::new().iter()),
            SyncState::Synced
        );
    }
}
