//! Domain models for blocks and extension filters.

/// One file's path and content as carried by a flat file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileBlock {
    pub path: String,
    pub content: String,
}

impl FileBlock {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// Suffix-based inclusion rule applied while flattening.
///
/// Matching is a plain string suffix test on the whole path, so `.go` also
/// matches a file literally named `foo.go` inside any directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtensionFilter {
    suffixes: Vec<String>,
    dropped: usize,
}

impl ExtensionFilter {
    /// Build a filter, trimming each entry and dropping empty ones.
    ///
    /// Dropped entries are counted so callers can point out a stray comma.
    pub fn new<I, S>(suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut cleaned: Vec<String> = Vec::new();
        let mut dropped = 0;
        for suffix in suffixes {
            let trimmed = suffix.as_ref().trim();
            if trimmed.is_empty() {
                dropped += 1;
                continue;
            }
            if cleaned.iter().any(|existing| existing == trimmed) {
                continue;
            }
            cleaned.push(trimmed.to_owned());
        }
        Self {
            suffixes: cleaned,
            dropped,
        }
    }

    /// Parse a comma-separated list such as `.go,.txt`.
    pub fn parse_list(raw: &str) -> Self {
        Self::new(raw.split(','))
    }

    pub fn suffixes(&self) -> &[String] {
        &self.suffixes
    }

    /// Number of empty or whitespace-only entries that were discarded.
    pub fn dropped_entries(&self) -> usize {
        self.dropped
    }

    pub fn is_empty(&self) -> bool {
        self.suffixes.is_empty()
    }

    pub fn matches(&self, path: &str) -> bool {
        self.suffixes.iter().any(|suffix| path.ends_with(suffix.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_by_plain_suffix() {
        let filter = ExtensionFilter::parse_list(".go,.txt");
        assert!(filter.matches("src/main.go"));
        assert!(filter.matches("notes.txt"));
        assert!(!filter.matches("main.rs"));
        assert!(filter.matches("weird/archive.tar.go"));
    }

    #[test]
    fn suffix_without_dot_is_accepted() {
        let filter = ExtensionFilter::parse_list("file");
        assert!(filter.matches("Makefile"));
        assert!(filter.matches("Dockerfile"));
        assert!(!filter.matches("Makefile.am"));
    }

    #[test]
    fn empty_entries_are_dropped() {
        let filter = ExtensionFilter::parse_list(" .rs , ,,.toml");
        assert_eq!(filter.suffixes(), [".rs".to_string(), ".toml".to_string()]);

        let empty = ExtensionFilter::parse_list("");
        assert!(empty.is_empty());
        assert!(!empty.matches("anything.txt"));
    }

    #[test]
    fn counts_dropped_entries() {
        assert_eq!(ExtensionFilter::parse_list(".go,.txt").dropped_entries(), 0);
        assert_eq!(ExtensionFilter::parse_list(".go,").dropped_entries(), 1);
        assert_eq!(ExtensionFilter::parse_list(" .rs , ,,.toml").dropped_entries(), 2);
        assert_eq!(ExtensionFilter::parse_list(".md,.md").dropped_entries(), 0);
    }

    #[test]
    fn duplicates_collapse() {
        let filter = ExtensionFilter::new([".md", ".md", ".txt"]);
        assert_eq!(filter.suffixes().len(), 2);
    }
}
