//! Background replay worker.
//!
//! Receives [`ReplayTrigger`]s from a [`crate::scheduler::ChannelScheduler`],
//! coalesces whatever has piled up, and replays the requested outbox kinds.
//! A replay that leaves entries queued is retried with linear backoff up to
//! the configured attempt limit; after that the entries simply wait for the
//! next trigger. Progress is published as a [`SyncState`] on a watch channel.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use crate::api::RestaurantApi;
use crate::config::ClientConfig;
use crate::models::SyncTag;
use crate::scheduler::{ReplayScheduler, ReplayTrigger};
use crate::state::SyncState;
use crate::sync::{ReplayReport, SyncEngine};

pub struct ReplayWorker<A, S> {
    engine: Arc<SyncEngine<A, S>>,
    triggers: mpsc::UnboundedReceiver<ReplayTrigger>,
    state: watch::Sender<SyncState>,
    config: ClientConfig,
}

impl<A: RestaurantApi, S: ReplayScheduler> ReplayWorker<A, S> {
    pub fn new(
        engine: Arc<SyncEngine<A, S>>,
        triggers: mpsc::UnboundedReceiver<ReplayTrigger>,
        config: &ClientConfig,
    ) -> Self {
        let (state, _) = watch::channel(SyncState::default());
        Self {
            engine,
            triggers,
            state,
            config: config.clone(),
        }
    }

    /// Follow state changes.
    pub fn subscribe(&self) -> watch::Receiver<SyncState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> SyncState {
        *self.state.borrow()
    }

    /// Process triggers until every scheduler handle is dropped.
    pub async fn run(mut self) {
        while self.run_once().await.is_some() {}
        tracing::debug!("Replay worker stopped: scheduler closed");
    }

    /// Wait for the next trigger, fold in any others already queued, and
    /// replay. Returns `None` once the channel is closed.
    pub async fn run_once(&mut self) -> Option<SyncState> {
        let first = self.triggers.recv().await?;
        let mut kinds = Vec::new();
        add_kinds(&mut kinds, first);
        while let Ok(next) = self.triggers.try_recv() {
            add_kinds(&mut kinds, next);
        }
        Some(self.replay_with_retry(&kinds).await)
    }

    async fn replay_with_retry(&self, kinds: &[SyncTag]) -> SyncState {
        self.state.send_replace(SyncState::Syncing);

        let max_attempts = self.config.replay_max_attempts.max(1);
        let mut state = SyncState::Synced;
        for attempt in 1..=max_attempts {
            let mut reports = Vec::with_capacity(kinds.len());
            for &kind in kinds {
                let report = self
                    .engine
                    .replay(kind)
                    .await
                    .unwrap_or_else(|error| ReplayReport::outbox_unreadable(kind, &error));
                reports.push(report);
            }

            state = SyncState::after_replay(&reports);
            if state == SyncState::Synced {
                break;
            }
            if attempt < max_attempts {
                let delay = self.config.replay_backoff(attempt);
                tracing::info!(
                    "Replay attempt {attempt}/{max_attempts} incomplete, retrying in {}ms",
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            } else {
                tracing::warn!(
                    "Replay still incomplete after {max_attempts} attempts; waiting for next trigger"
                );
            }
        }

        self.state.send_replace(state);
        state
    }
}

fn add_kinds(kinds: &mut Vec<SyncTag>, trigger: ReplayTrigger) {
    for &kind in trigger.kinds() {
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
}
