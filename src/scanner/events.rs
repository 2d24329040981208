use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tracing::warn;

use super::{ScanError, SessionId, SessionSnapshot};

/// What a scan run covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanKind {
    /// Whole-root traversal that replaces the session.
    Full,
    /// Re-walk of one folder merged into the current session.
    Refresh { folder: String },
}

/// How a scan run that did not fail ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    Completed,
    /// Stopped by [`super::ScanCoordinator::cancel_scan`].
    Cancelled,
    /// Replaced by a newer scan before it finished.
    Superseded,
}

/// Counters for one scan run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanSummary {
    pub session_id: SessionId,
    pub kind: ScanKind,
    pub outcome: ScanOutcome,
    /// Accepted files published by this run.
    pub files_published: usize,
    /// Folders published by this run (before de-duplication).
    pub folders_published: usize,
    /// Every entry visited by this run, published or not.
    pub entries_visited: u64,
    pub batches: usize,
    pub elapsed: Duration,
}

/// Notifications emitted while scans progress.
#[derive(Debug, Clone)]
pub enum ScanEvent {
    /// A run began; the snapshot reflects the reset (or pruned) session.
    Started {
        kind: ScanKind,
        snapshot: SessionSnapshot,
    },
    /// New entries were merged into the session.
    Batch(SessionSnapshot),
    /// The run ended without error.
    Finished(ScanSummary),
    /// The run aborted; already published state is left in place.
    Failed {
        kind: ScanKind,
        error: Arc<ScanError>,
    },
}

type Callback = Arc<dyn Fn(&ScanEvent) + Send + Sync>;

/// Registered callbacks and channel subscribers.
#[derive(Default)]
pub(crate) struct Observers {
    callbacks: Mutex<Vec<Callback>>,
    channels: Mutex<Vec<Sender<ScanEvent>>>,
}

impl Observers {
    pub(crate) fn add_callback(&self, callback: Callback) {
        lock_or_recover(&self.callbacks).push(callback);
    }

    pub(crate) fn subscribe(&self) -> Receiver<ScanEvent> {
        let (tx, rx) = mpsc::channel();
        lock_or_recover(&self.channels).push(tx);
        rx
    }

    /// Deliver an event. Must be called without holding the session lock:
    /// callbacks are allowed to call back into the coordinator.
    pub(crate) fn dispatch(&self, event: &ScanEvent) {
        lock_or_recover(&self.channels).retain(|tx| tx.send(event.clone()).is_ok());
        let callbacks: Vec<Callback> = lock_or_recover(&self.callbacks).clone();
        for callback in callbacks {
            callback(event);
        }
    }
}

fn lock_or_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| {
        warn!("Scan observer lock poisoned; recovering.");
        poisoned.into_inner()
    })
}
