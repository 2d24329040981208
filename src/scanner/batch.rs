use std::time::{Duration, Instant};

use crate::assets::Entry;

/// When the coordinator publishes accumulated entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPolicy {
    /// Publish once this many accepted files are pending.
    pub batch_size: usize,
    /// Publish once this much time passed since the previous publish.
    pub flush_interval: Duration,
}

impl Default for BatchPolicy {
    fn default() -> Self {
        Self {
            batch_size: 250,
            flush_interval: Duration::from_millis(150),
        }
    }
}

impl BatchPolicy {
    pub fn new(batch_size: usize, flush_interval: Duration) -> Self {
        Self {
            batch_size: batch_size.max(1),
            flush_interval,
        }
    }
}

/// Entries collected since the last publish.
#[derive(Debug)]
pub(crate) struct PendingBatch {
    policy: BatchPolicy,
    pub(crate) files: Vec<Entry>,
    pub(crate) folders: Vec<Entry>,
    pub(crate) seen: u64,
    last_flush: Instant,
}

impl PendingBatch {
    pub(crate) fn new(policy: BatchPolicy) -> Self {
        Self {
            policy,
            files: Vec::new(),
            folders: Vec::new(),
            seen: 0,
            last_flush: Instant::now(),
        }
    }

    pub(crate) fn is_due(&self) -> bool {
        self.files.len() >= self.policy.batch_size
            || self.last_flush.elapsed() >= self.policy.flush_interval
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.files.is_empty() && self.folders.is_empty() && self.seen == 0
    }

    /// Hand over the pending entries and restart the interval clock.
    pub(crate) fn take(&mut self) -> (Vec<Entry>, Vec<Entry>, u64) {
        self.last_flush = Instant::now();
        (
            std::mem::take(&mut self.files),
            std::mem::take(&mut self.folders),
            std::mem::replace(&mut self.seen, 0),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::ExtensionClassifier;

    fn file(path: &str) -> Entry {
        let classifier = ExtensionClassifier::default();
        Entry::file(path.into(), path.into(), classifier.classify(path), None)
    }

    #[test]
    fn due_when_size_reached() {
        let mut batch = PendingBatch::new(BatchPolicy::new(2, Duration::from_secs(60)));
        batch.files.push(file("a.png"));
        assert!(!batch.is_due());
        batch.files.push(file("b.png"));
        assert!(batch.is_due());
        let (files, folders, seen) = batch.take();
        assert_eq!(files.len(), 2);
        assert!(folders.is_empty());
        assert_eq!(seen, 0);
        assert!(batch.is_empty());
    }

    #[test]
    fn due_when_interval_elapsed() {
        let batch = PendingBatch::new(BatchPolicy::new(1000, Duration::ZERO));
        assert!(batch.is_due());
    }

    #[test]
    fn zero_batch_size_is_clamped() {
        assert_eq!(BatchPolicy::new(0, Duration::ZERO).batch_size, 1);
    }
}
