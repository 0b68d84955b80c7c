//! Sync lifecycle tracking.
//!
//! The sync pipeline pushes progress events; this module folds them into an
//! `Idle -> Syncing -> {Idle, Failed}` state machine and fires a refresh every
//! time a sync completes.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Phase name the pipeline reports when a sync has finished
pub const COMPLETE_PHASE: &str = "complete";

/// A progress event pushed by the sync pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncProgress {
    pub phase: String,
    pub current: usize,
    pub total: usize,
    pub message: String,
}

impl SyncProgress {
    pub fn new(phase: &str, current: usize, total: usize, message: &str) -> Self {
        SyncProgress {
            phase: phase.to_string(),
            current,
            total,
            message: message.to_string(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.phase == COMPLETE_PHASE
    }
}

/// Input to the sync state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    Progress(SyncProgress),
    Failed(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SyncState {
    #[default]
    Idle,
    Syncing(SyncProgress),
    Failed(String),
}

/// Something that can start a fresh fetch cycle
pub trait RefreshTrigger {
    fn request_refresh(&self);
}

/// Sync state machine that refreshes through `T` whenever a sync completes
pub struct SyncLifecycle<T> {
    state: SyncState,
    trigger: T,
}

impl<T: RefreshTrigger> SyncLifecycle<T> {
    pub fn new(trigger: T) -> Self {
        SyncLifecycle {
            state: SyncState::Idle,
            trigger,
        }
    }

    pub fn state(&self) -> &SyncState {
        &self.state
    }

    pub fn is_syncing(&self) -> bool {
        matches!(self.state, SyncState::Syncing(_))
    }

    /// Apply one event and return the resulting state
    pub fn apply(&mut self, event: SyncEvent) -> &SyncState {
        let next = match (&self.state, event) {
            (SyncState::Syncing(_), SyncEvent::Progress(progress)) if progress.is_complete() => {
                info!(message = %progress.message, "Sync complete");
                self.trigger.request_refresh();
                SyncState::Idle
            }
            (_, SyncEvent::Progress(progress)) if progress.is_complete() => {
                // A completion with no sync in flight leaves the state as it was
                self.state.clone()
            }
            (_, SyncEvent::Progress(progress)) => SyncState::Syncing(progress),
            (SyncState::Syncing(_), SyncEvent::Failed(message)) => {
                warn!(%message, "Sync failed");
                SyncState::Failed(message)
            }
            (_, SyncEvent::Failed(_)) => self.state.clone(),
        };
        self.state = next;
        &self.state
    }

    /// Consume events until the sender side closes
    pub async fn run(mut self, mut events: mpsc::Receiver<SyncEvent>) -> SyncState {
        while let Some(event) = events.recv().await {
            self.apply(event);
        }
        self.state
    }
}
