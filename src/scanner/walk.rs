use std::iter::FusedIterator;
use std::sync::atomic::{AtomicBool, Ordering};
use std::vec;

use tracing::{debug, trace};

use crate::assets::{Entry, EntryKind, ScanRules, join_path};
use crate::provider::{ChildEntry, DirectoryProvider, EntryHandle};

use super::ScanError;

/// Whether a walked file made it into the accepted set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    Accepted,
    Skipped,
}

/// One item produced by [`TreeWalker`]. Directories are always `Accepted`.
#[derive(Debug, Clone)]
pub struct WalkedEntry {
    pub entry: Entry,
    pub status: EntryStatus,
}

impl WalkedEntry {
    pub fn is_accepted(&self) -> bool {
        self.status == EntryStatus::Accepted
    }
}

struct Frame {
    base: String,
    children: vec::IntoIter<ChildEntry>,
}

/// Lazy pre-order traversal over a [`DirectoryProvider`].
///
/// Directories are enumerated only when the walker advances past their own
/// entry, so dropping the iterator (or setting the cancel flag) stops all
/// further provider reads. The root itself is not yielded; paths of yielded
/// entries start at `base_path`.
///
/// After an error or a cancellation the walker yields nothing more.
pub struct TreeWalker<'a> {
    provider: &'a dyn DirectoryProvider,
    rules: &'a ScanRules,
    cancel: Option<&'a AtomicBool>,
    stack: Vec<Frame>,
    pending: Option<(EntryHandle, String)>,
    done: bool,
}

impl<'a> TreeWalker<'a> {
    pub fn new(
        provider: &'a dyn DirectoryProvider,
        rules: &'a ScanRules,
        root: EntryHandle,
        base_path: impl Into<String>,
        cancel: Option<&'a AtomicBool>,
    ) -> Self {
        Self {
            provider,
            rules,
            cancel,
            stack: Vec::new(),
            pending: Some((root, base_path.into())),
            done: false,
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .is_some_and(|cancel| cancel.load(Ordering::Relaxed))
    }

    fn finish_with(&mut self, err: ScanError) -> Option<Result<WalkedEntry, ScanError>> {
        self.done = true;
        self.stack.clear();
        Some(Err(err))
    }
}

impl Iterator for TreeWalker<'_> {
    type Item = Result<WalkedEntry, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.done {
                return None;
            }
            if self.is_cancelled() {
                debug!("Walk stopped by cancellation");
                self.done = true;
                self.stack.clear();
                self.pending = None;
                return None;
            }
            if let Some((handle, base)) = self.pending.take() {
                match self.provider.read_dir(&handle) {
                    Ok(children) => self.stack.push(Frame {
                        base,
                        children: children.into_iter(),
                    }),
                    Err(source) => {
                        let path = if base.is_empty() {
                            handle.to_location_string()
                        } else {
                            base
                        };
                        return self.finish_with(ScanError::from_read_failure(path, source));
                    }
                }
                continue;
            }
            let Some(frame) = self.stack.last_mut() else {
                self.done = true;
                return None;
            };
            let Some(child) = frame.children.next() else {
                self.stack.pop();
                continue;
            };
            let path = join_path(&frame.base, &child.name);
            match child.kind {
                EntryKind::Directory => {
                    if self.rules.ignore.is_ignored_directory_name(&child.name) {
                        trace!(path = %path, "Ignoring folder");
                        continue;
                    }
                    self.pending = Some((child.handle.clone(), path.clone()));
                    return Some(Ok(WalkedEntry {
                        entry: Entry::directory(path, child.name, Some(child.handle)),
                        status: EntryStatus::Accepted,
                    }));
                }
                EntryKind::File => {
                    let classification = self.rules.classifier.classify(&child.name);
                    let status = if self.rules.classifier.is_accepted(&classification.file_type)
                    {
                        EntryStatus::Accepted
                    } else {
                        EntryStatus::Skipped
                    };
                    return Some(Ok(WalkedEntry {
                        entry: Entry::file(path, child.name, classification, Some(child.handle)),
                        status,
                    }));
                }
            }
        }
    }
}

impl FusedIterator for TreeWalker<'_> {}
