//! Incremental, cancelable scanning of a directory tree into a live session.

mod batch;
mod coordinator;
mod errors;
mod events;
mod session;
mod walk;

pub use batch::BatchPolicy;
pub use coordinator::ScanCoordinator;
pub use errors::ScanError;
pub use events::{ScanEvent, ScanKind, ScanOutcome, ScanSummary};
pub use session::{ScanSession, SessionId, SessionSnapshot};
pub use walk::{EntryStatus, TreeWalker, WalkedEntry};
