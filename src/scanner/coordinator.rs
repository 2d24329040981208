use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::assets::ScanRules;
use crate::provider::{DirectoryProvider, EntryHandle};

use super::batch::{BatchPolicy, PendingBatch};
use super::events::{Observers, ScanEvent, ScanKind, ScanOutcome, ScanSummary};
use super::session::{ScanSession, SessionSnapshot};
use super::walk::TreeWalker;
use super::ScanError;

/// Drives tree walks and owns the single mutable [`ScanSession`].
///
/// Every session mutation happens under one lock. Each run is tagged with a
/// generation; batches from a run whose generation is no longer active are
/// dropped, so an abandoned scan can never write into a newer session.
/// Events are queued under the same lock, so their order matches the order of
/// generation changes, and handed to observers after it is released. A run
/// that has been superseded posts nothing but its `Finished`.
#[derive(Clone)]
pub struct ScanCoordinator {
    inner: Arc<Inner>,
}

struct Inner {
    provider: Arc<dyn DirectoryProvider>,
    rules: ScanRules,
    policy: BatchPolicy,
    state: Mutex<CoordinatorState>,
    delivering: AtomicBool,
    observers: Observers,
}

#[derive(Default)]
struct CoordinatorState {
    session: ScanSession,
    generation: u64,
    active: Option<ActiveScan>,
    outbox: VecDeque<ScanEvent>,
}

struct ActiveScan {
    generation: u64,
    cancel: Arc<AtomicBool>,
}

impl CoordinatorState {
    fn is_current(&self, generation: u64) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| active.generation == generation)
    }
}

/// A run registered with the coordinator but not yet walked.
struct ScanTicket {
    generation: u64,
    cancel: Arc<AtomicBool>,
    root: EntryHandle,
    base_path: String,
    kind: ScanKind,
    started: Instant,
}

#[derive(Default)]
struct RunCounters {
    files_published: usize,
    folders_published: usize,
    entries_visited: u64,
    batches: usize,
}

impl ScanCoordinator {
    pub fn new(provider: Arc<dyn DirectoryProvider>, rules: ScanRules, policy: BatchPolicy) -> Self {
        Self {
            inner: Arc::new(Inner {
                provider,
                rules,
                policy,
                state: Mutex::new(CoordinatorState::default()),
                delivering: AtomicBool::new(false),
                observers: Observers::default(),
            }),
        }
    }

    pub fn provider(&self) -> &Arc<dyn DirectoryProvider> {
        &self.inner.provider
    }

    pub fn policy(&self) -> BatchPolicy {
        self.inner.policy
    }

    /// Register a callback invoked on a scanning thread for every event.
    ///
    /// Callbacks may start, refresh or cancel scans; events posted meanwhile
    /// are delivered once the callback returns.
    pub fn observe(&self, callback: impl Fn(&ScanEvent) + Send + Sync + 'static) {
        self.inner.observers.add_callback(Arc::new(callback));
    }

    /// Receive every future event over a channel.
    pub fn subscribe(&self) -> Receiver<ScanEvent> {
        self.inner.observers.subscribe()
    }

    /// Current session state.
    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.lock_state();
        state.session.snapshot(state.active.is_some())
    }

    pub fn is_scanning(&self) -> bool {
        self.lock_state().active.is_some()
    }

    /// Handle of the current session's root, if a root was opened.
    pub fn root(&self) -> Option<EntryHandle> {
        self.lock_state().session.root().cloned()
    }

    /// Reset the session to `root` and walk it to completion on this thread.
    ///
    /// Any in-flight run is cancelled and superseded. Cancellation settles with
    /// [`ScanOutcome::Cancelled`]; a directory that cannot be enumerated aborts
    /// the scan and leaves already published entries in place.
    pub fn start_scan(
        &self,
        root: EntryHandle,
        root_name: impl Into<String>,
    ) -> Result<ScanSummary, ScanError> {
        let ticket = self.begin_full(root, root_name.into())?;
        self.run(ticket)
    }

    /// Like [`ScanCoordinator::start_scan`], but walks on a spawned thread.
    ///
    /// The session is reset before this returns, so `is_scanning` is already
    /// true for the caller.
    pub fn scan_in_background(
        &self,
        root: EntryHandle,
        root_name: impl Into<String>,
    ) -> thread::JoinHandle<Result<ScanSummary, ScanError>> {
        let ticket = self.begin_full(root, root_name.into());
        let coordinator = self.clone();
        thread::spawn(move || coordinator.run(ticket?))
    }

    /// Request cooperative cancellation of the active run.
    ///
    /// Returns false when nothing was running.
    pub fn cancel_scan(&self) -> bool {
        let active = self.lock_state().active.take();
        match active {
            Some(active) => {
                active.cancel.store(true, Ordering::Relaxed);
                info!("Scan cancellation requested");
                true
            }
            None => false,
        }
    }

    /// Re-walk one folder of the current session in place.
    ///
    /// Files and folders beneath `folder_path` are removed, then the folder is
    /// walked again and its contents merged back. If the walk fails the pruned
    /// state stays as is.
    pub fn refresh_folder(&self, folder_path: &str) -> Result<ScanSummary, ScanError> {
        let ticket = self.begin_refresh(folder_path)?;
        self.run(ticket)
    }

    fn begin_full(&self, root: EntryHandle, root_name: String) -> Result<ScanTicket, ScanError> {
        if !self.inner.provider.is_dir(&root) {
            return Err(ScanError::InvalidRoot(root.location().to_path_buf()));
        }
        let (ticket, session_id) = {
            let mut state = self.lock_state();
            if let Some(previous) = state.active.take() {
                previous.cancel.store(true, Ordering::Relaxed);
                info!(generation = previous.generation, "Superseding in-flight scan");
            }
            state.generation += 1;
            let cancel = Arc::new(AtomicBool::new(false));
            state.session = ScanSession::new(root.clone(), root_name);
            state.active = Some(ActiveScan {
                generation: state.generation,
                cancel: Arc::clone(&cancel),
            });
            let ticket = ScanTicket {
                generation: state.generation,
                cancel,
                root,
                base_path: String::new(),
                kind: ScanKind::Full,
                started: Instant::now(),
            };
            let snapshot = state.session.snapshot(true);
            let session_id = snapshot.session_id.clone();
            state.outbox.push_back(ScanEvent::Started {
                kind: ScanKind::Full,
                snapshot,
            });
            (ticket, session_id)
        };
        info!(
            root = %ticket.root.location().display(),
            session = %session_id,
            "Starting scan"
        );
        self.deliver();
        Ok(ticket)
    }

    fn begin_refresh(&self, folder_path: &str) -> Result<ScanTicket, ScanError> {
        let (ticket, removed) = {
            let mut state = self.lock_state();
            if state.active.is_some() {
                return Err(ScanError::ScanInProgress);
            }
            let handle = state
                .session
                .find_folder(folder_path)
                .and_then(|folder| folder.handle.clone())
                .filter(|handle| self.inner.provider.is_dir(handle))
                .ok_or_else(|| ScanError::FolderNotFound(folder_path.to_string()))?;
            let removed = state.session.remove_subtree(folder_path);
            state.generation += 1;
            let cancel = Arc::new(AtomicBool::new(false));
            state.active = Some(ActiveScan {
                generation: state.generation,
                cancel: Arc::clone(&cancel),
            });
            let kind = ScanKind::Refresh {
                folder: folder_path.to_string(),
            };
            let ticket = ScanTicket {
                generation: state.generation,
                cancel,
                root: handle,
                base_path: folder_path.to_string(),
                kind: kind.clone(),
                started: Instant::now(),
            };
            let snapshot = state.session.snapshot(true);
            state.outbox.push_back(ScanEvent::Started { kind, snapshot });
            (ticket, removed)
        };
        info!(folder = %folder_path, removed, "Refreshing folder");
        self.deliver();
        Ok(ticket)
    }

    fn run(&self, ticket: ScanTicket) -> Result<ScanSummary, ScanError> {
        let counts_toward_total = ticket.kind == ScanKind::Full;
        let mut pending = PendingBatch::new(self.inner.policy);
        let mut counters = RunCounters::default();
        let walker = TreeWalker::new(
            self.inner.provider.as_ref(),
            &self.inner.rules,
            ticket.root.clone(),
            ticket.base_path.clone(),
            Some(ticket.cancel.as_ref()),
        );
        for item in walker {
            let walked = match item {
                Ok(walked) => walked,
                Err(err) => return self.fail(&ticket, counters, err),
            };
            counters.entries_visited += 1;
            if counts_toward_total {
                pending.seen += 1;
            }
            if walked.entry.is_dir() {
                pending.folders.push(walked.entry);
            } else if walked.is_accepted() {
                pending.files.push(walked.entry);
            }
            if pending.is_due() {
                if !self.publish(&ticket, &mut pending, &mut counters) {
                    return Ok(self.settle_stale(&ticket, counters));
                }
                thread::yield_now();
            }
        }
        if ticket.cancel.load(Ordering::Relaxed) {
            return Ok(self.settle_stale(&ticket, counters));
        }
        self.complete(&ticket, pending, counters)
    }

    /// Merge pending entries into the session. Returns false when the run is no
    /// longer the active one; nothing is merged in that case.
    fn publish(&self, ticket: &ScanTicket, pending: &mut PendingBatch, counters: &mut RunCounters) -> bool {
        {
            let mut state = self.lock_state();
            if !state.is_current(ticket.generation) {
                debug!(generation = ticket.generation, "Dropping batch from inactive scan");
                return false;
            }
            let (files, folders, seen) = pending.take();
            counters.files_published += files.len();
            counters.folders_published += folders.len();
            counters.batches += 1;
            state.session.apply_batch(files, folders, seen);
            let snapshot = state.session.snapshot(true);
            debug!(
                files = snapshot.accepted_files.len(),
                folders = snapshot.folders.len(),
                seen = snapshot.total_entries_seen,
                "Published scan batch"
            );
            state.outbox.push_back(ScanEvent::Batch(snapshot));
        }
        self.deliver();
        true
    }

    fn complete(
        &self,
        ticket: &ScanTicket,
        mut pending: PendingBatch,
        mut counters: RunCounters,
    ) -> Result<ScanSummary, ScanError> {
        let summary = {
            let mut state = self.lock_state();
            if !state.is_current(ticket.generation) {
                drop(state);
                return Ok(self.settle_stale(ticket, counters));
            }
            let (files, folders, seen) = pending.take();
            counters.files_published += files.len();
            counters.folders_published += folders.len();
            counters.batches += 1;
            state.session.apply_batch(files, folders, seen);
            state.active = None;
            let snapshot = state.session.snapshot(false);
            let summary = self.summary(ticket, &snapshot, ScanOutcome::Completed, counters);
            info!(
                files = snapshot.accepted_files.len(),
                folders = snapshot.folders.len(),
                seen = snapshot.total_entries_seen,
                elapsed_ms = summary.elapsed.as_millis() as u64,
                "Scan finished"
            );
            state.outbox.push_back(ScanEvent::Batch(snapshot));
            state.outbox.push_back(ScanEvent::Finished(summary.clone()));
            summary
        };
        self.deliver();
        Ok(summary)
    }

    /// Settle a run that observed cancellation or lost its active slot.
    fn settle_stale(&self, ticket: &ScanTicket, counters: RunCounters) -> ScanSummary {
        let summary = {
            let mut state = self.lock_state();
            if state.is_current(ticket.generation) {
                state.active = None;
            }
            let outcome = if state.generation != ticket.generation {
                ScanOutcome::Superseded
            } else {
                ScanOutcome::Cancelled
            };
            let snapshot = state.session.snapshot(state.active.is_some());
            let summary = self.summary(ticket, &snapshot, outcome, counters);
            state.outbox.push_back(ScanEvent::Finished(summary.clone()));
            summary
        };
        info!(
            outcome = ?summary.outcome,
            files_published = summary.files_published,
            "Scan stopped early"
        );
        self.deliver();
        summary
    }

    fn fail(
        &self,
        ticket: &ScanTicket,
        counters: RunCounters,
        err: ScanError,
    ) -> Result<ScanSummary, ScanError> {
        let err = Arc::new(err);
        {
            let mut state = self.lock_state();
            if !state.is_current(ticket.generation) {
                drop(state);
                debug!(error = %err, "Ignoring failure from inactive scan");
                return Ok(self.settle_stale(ticket, counters));
            }
            state.active = None;
            state.outbox.push_back(ScanEvent::Failed {
                kind: ticket.kind.clone(),
                error: Arc::clone(&err),
            });
        }
        warn!(
            error = %err,
            kind = ?ticket.kind,
            files_published = counters.files_published,
            "Scan failed"
        );
        self.deliver();
        Err(Arc::try_unwrap(err).unwrap_or_else(|shared| clone_error(&shared)))
    }

    /// Hand queued events to observers in the order they were posted.
    ///
    /// One thread delivers at a time. A call made while another delivery is
    /// running, including one from inside an observer, leaves its events to
    /// that delivery.
    fn deliver(&self) {
        loop {
            if self.inner.delivering.swap(true, Ordering::AcqRel) {
                return;
            }
            {
                let _flag = DeliveryFlag(&self.inner.delivering);
                while let Some(event) = self.next_event() {
                    self.inner.observers.dispatch(&event);
                }
            }
            // An event posted between the last pop and the flag reset would be stranded.
            if self.lock_state().outbox.is_empty() {
                return;
            }
        }
    }

    fn next_event(&self) -> Option<ScanEvent> {
        self.lock_state().outbox.pop_front()
    }

    fn summary(
        &self,
        ticket: &ScanTicket,
        snapshot: &SessionSnapshot,
        outcome: ScanOutcome,
        counters: RunCounters,
    ) -> ScanSummary {
        ScanSummary {
            session_id: snapshot.session_id.clone(),
            kind: ticket.kind.clone(),
            outcome,
            files_published: counters.files_published,
            folders_published: counters.folders_published,
            entries_visited: counters.entries_visited,
            batches: counters.batches,
            elapsed: ticket.started.elapsed(),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, CoordinatorState> {
        self.inner.state.lock().unwrap_or_else(|poisoned| {
            warn!("Scan state lock poisoned; recovering.");
            poisoned.into_inner()
        })
    }
}

/// Clears the delivering flag even if an observer panics.
struct DeliveryFlag<'a>(&'a AtomicBool);

impl Drop for DeliveryFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Rebuild an error a subscriber still holds a reference to.
fn clone_error(err: &ScanError) -> ScanError {
    match err {
        ScanError::InvalidRoot(path) => ScanError::InvalidRoot(path.clone()),
        ScanError::AccessDenied { path } => ScanError::AccessDenied { path: path.clone() },
        ScanError::DirectoryRead { path, source } => ScanError::DirectoryRead {
            path: path.clone(),
            source: std::io::Error::new(source.kind(), source.to_string()),
        },
        ScanError::FolderNotFound(path) => ScanError::FolderNotFound(path.clone()),
        ScanError::ScanInProgress => ScanError::ScanInProgress,
    }
}
