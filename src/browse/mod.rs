//! Pure derivation of the visible file list from scan state and view state.

mod filter;
mod sort;
mod state;
mod tags;

pub use filter::{
    child_folders, compute_visible_files, is_direct_child, search_folders, visible_folders,
};
pub use sort::compare_names;
pub use state::{CategoryFilter, FilterState, SearchScope, SortKey, ViewMode};
pub use tags::{TagIndex, TagRecord};
