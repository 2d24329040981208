use std::collections::BTreeSet;

/// User-chosen set of file paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    paths: BTreeSet<String>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip membership of `path`. Returns true when it is now selected.
    pub fn toggle(&mut self, path: &str) -> bool {
        if self.paths.remove(path) {
            false
        } else {
            self.paths.insert(path.to_string());
            true
        }
    }

    pub fn insert(&mut self, path: impl Into<String>) -> bool {
        self.paths.insert(path.into())
    }

    pub fn remove(&mut self, path: &str) -> bool {
        self.paths.remove(path)
    }

    pub fn clear(&mut self) {
        self.paths.clear();
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for Selection {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            paths: iter.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_is_symmetric() {
        let mut selection = Selection::new();
        assert!(selection.toggle("a.fbx"));
        assert!(selection.contains("a.fbx"));
        assert!(!selection.toggle("a.fbx"));
        assert!(selection.is_empty());
    }

    #[test]
    fn insert_is_idempotent_and_clear_empties() {
        let mut selection: Selection = ["a.fbx", "sub/b.png"].into_iter().collect();
        assert!(!selection.insert("a.fbx"));
        assert_eq!(selection.len(), 2);
        assert_eq!(selection.iter().collect::<Vec<_>>(), vec!["a.fbx", "sub/b.png"]);
        selection.clear();
        assert_eq!(selection.len(), 0);
    }
}
