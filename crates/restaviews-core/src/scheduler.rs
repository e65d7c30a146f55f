//! Deferred replay scheduling.
//!
//! The intent API asks a [`ReplayScheduler`] to arrange a future replay
//! instead of delivering mutations itself. [`ChannelScheduler`] forwards those
//! requests to a [`crate::worker::ReplayWorker`]; the host's connectivity
//! signal goes through the same channel.

use tokio::sync::mpsc;

use crate::error::{Error, Result};
use crate::models::SyncTag;

/// Something that can arrange for a replay to run later.
pub trait ReplayScheduler {
    /// Register interest in replaying `kind`. Requests may be coalesced or
    /// arrive while a replay is already running.
    fn request_replay(&self, kind: SyncTag) -> Result<()>;
}

/// Placeholder scheduler type for engines without deferred delivery.
///
/// Uninhabited: an engine typed with it can never hold a scheduler, so every
/// mutation is delivered directly.
#[derive(Debug, Clone, Copy)]
pub enum NoScheduler {}

impl ReplayScheduler for NoScheduler {
    fn request_replay(&self, _kind: SyncTag) -> Result<()> {
        match *self {}
    }
}

/// Why the worker should replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayTrigger {
    /// A mutation of this kind was queued
    Requested(SyncTag),
    /// The host reports the network is back; replay every kind
    ConnectivityRestored,
}

impl ReplayTrigger {
    /// Outbox kinds this trigger covers.
    pub fn kinds(self) -> &'static [SyncTag] {
        match self {
            Self::Requested(SyncTag::Favorites) => &[SyncTag::Favorites],
            Self::Requested(SyncTag::Reviews) => &[SyncTag::Reviews],
            Self::ConnectivityRestored => &SyncTag::ALL,
        }
    }
}

/// Scheduler backed by an unbounded tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelScheduler {
    tx: mpsc::UnboundedSender<ReplayTrigger>,
}

impl ChannelScheduler {
    /// Create a scheduler and the receiving end for a worker.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ReplayTrigger>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Deliver the host's connectivity-restored signal.
    pub fn connectivity_restored(&self) -> Result<()> {
        self.send(ReplayTrigger::ConnectivityRestored)
    }

    fn send(&self, trigger: ReplayTrigger) -> Result<()> {
        self.tx
            .send(trigger)
            .map_err(|_| Error::Scheduler("replay worker is not running".to_string()))
    }
}

impl ReplayScheduler for ChannelScheduler {
    fn request_replay(&self, kind: SyncTag) -> Result<()> {
        tracing::debug!("Requesting replay of {kind}");
        self.send(ReplayTrigger::Requested(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_reach_the_receiver_in_order() {
        let (scheduler, mut rx) = ChannelScheduler::new();
        scheduler.request_replay(SyncTag::Reviews).unwrap();
        scheduler.connectivity_restored().unwrap();

        assert_eq!(
            rx.try_recv().unwrap(),
            ReplayTrigger::Requested(SyncTag::Reviews)
        );
        assert_eq!(rx.try_recv().unwrap(), ReplayTrigger::ConnectivityRestored);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn closed_worker_is_a_scheduler_error() {
        let (scheduler, rx) = ChannelScheduler::new();
        drop(rx);

        let error = scheduler.request_replay(SyncTag::Favorites).unwrap_err();
        assert!(matches!(error, Error::Scheduler(_)));
    }

    #[test]
    fn connectivity_restored_covers_every_kind() {
        assert_eq!(ReplayTrigger::ConnectivityRestored.kinds(), &SyncTag::ALL);
        assert_eq!(
            ReplayTrigger::Requested(SyncTag::Favorites).kinds(),
            &[SyncTag::Favorites]
        );
    }
}
