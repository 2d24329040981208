use std::collections::HashSet;

/// Directory names that are never traversed: VCS metadata, build output,
/// dependency trees, caches, IDE and engine folders.
pub const DEFAULT_IGNORED_FOLDERS: [&str; 33] = [
    "node_modules",
    ".git",
    ".vscode",
    ".idea",
    ".vs",
    "dist",
    "build",
    "out",
    "target",
    "bin",
    "coverage",
    "__pycache__",
    "vendor",
    "lib",
    "libs",
    "include",
    "tmp",
    "temp",
    "logs",
    ".next",
    ".nuxt",
    ".cache",
    "venv",
    "env",
    ".env",
    "Library",
    "ProjectSettings",
    "UserSettings",
    "DerivedData",
    "Pods",
    ".gradle",
    ".android",
    ".svn",
];

/// Exact-match set of directory names excluded from traversal.
#[derive(Debug, Clone)]
pub struct IgnoreRules {
    names: HashSet<String>,
}

impl Default for IgnoreRules {
    fn default() -> Self {
        Self {
            names: DEFAULT_IGNORED_FOLDERS
                .iter()
                .map(|name| name.to_string())
                .collect(),
        }
    }
}

impl IgnoreRules {
    /// Default rules plus additional folder names.
    pub fn with_extra<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut rules = Self::default();
        rules.names.extend(
            extra
                .into_iter()
                .map(Into::into)
                .filter(|name: &String| !name.trim().is_empty()),
        );
        rules
    }

    /// Case-sensitive exact match against the configured names.
    pub fn is_ignored_directory_name(&self, name: &str) -> bool {
        self.names.contains(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_exact_names_only() {
        let rules = IgnoreRules::default();
        assert!(rules.is_ignored_directory_name("node_modules"));
        assert!(rules.is_ignored_directory_name(".git"));
        assert!(rules.is_ignored_directory_name("Library"));
        assert!(!rules.is_ignored_directory_name("library_assets"));
        assert!(!rules.is_ignored_directory_name("models"));
    }

    #[test]
    fn extra_names_extend_defaults() {
        let rules = IgnoreRules::with_extra(["Renders", "  "]);
        assert!(rules.is_ignored_directory_name("Renders"));
        assert!(rules.is_ignored_directory_name("dist"));
        assert!(!rules.is_ignored_directory_name("  "));
    }
}
