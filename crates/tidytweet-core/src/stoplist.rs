//! Immutable stopword sets.
//!
//! A [`StopList`] is built once and only read afterwards, so a single list can
//! be shared between any number of normalizers and threads. The bundled
//! English/Twitter list is available process-wide through
//! [`StopList::bundled`].

use std::collections::{BTreeSet, HashSet};
use std::path::Path;
use std::sync::LazyLock;

use crate::error::Result;
use crate::text::{fold, strip_html_tags, AccentMethod};

const BUNDLED_EN: &str = include_str!("../resources/stoplist_en.txt");

static BUNDLED: LazyLock<StopList> = LazyLock::new(|| StopList::parse(BUNDLED_EN));

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StopList {
    /// Case-folded entries as written, used for listing.
    entries: BTreeSet<String>,
    /// Every folding of every entry, used for membership.
    lookup: HashSet<String>,
}

impl StopList {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// The stoplist packaged with the crate.
    pub fn bundled() -> &'static Self {
        &BUNDLED
    }

    /// Builds a list from words. Entries containing whitespace contribute
    /// each of their words.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list = Self::default();
        for word in words {
            for part in word.as_ref().split_whitespace() {
                list.insert(part);
            }
        }
        list
    }

    /// Parses stoplist file contents: one entry per line, blank lines and
    /// `#` comments ignored.
    pub fn parse(contents: &str) -> Self {
        Self::from_words(
            contents
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#')),
        )
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let list = Self::parse(&contents);
        tracing::debug!(path = %path.display(), entries = list.len(), "loaded stoplist");
        Ok(list)
    }

    /// Returns a new list holding the entries of both lists.
    #[must_use]
    pub fn extended_with(&self, other: &Self) -> Self {
        let mut merged = self.clone();
        merged.entries.extend(other.entries.iter().cloned());
        merged.lookup.extend(other.lookup.iter().cloned());
        merged
    }

    /// Adds `word` the way text reaches the stoplist check: markup stripped,
    /// folded, then split on any whitespace the folding produced.
    fn insert(&mut self, word: &str) {
        let word = strip_html_tags(word);
        for method in [AccentMethod::Unicode, AccentMethod::Ascii] {
            self.lookup
                .extend(fold(&word, method).split_whitespace().map(str::to_string));
        }
        for canonical in fold(&word, AccentMethod::None).split_whitespace() {
            self.lookup.insert(canonical.to_string());
            self.entries.insert(canonical.to_string());
        }
    }

    /// Membership test for an already case-folded token.
    pub fn contains(&self, token: &str) -> bool {
        self.lookup.contains(token)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }
}

impl<S: AsRef<str>> FromIterator<S> for StopList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::from_words(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_is_loaded_once() {
        let a = StopList::bundled();
        let b = StopList::bundled();
        assert!(std::ptr::eq(a, b));
        assert!(a.contains("the"));
        assert!(a.contains("rt"));
        assert!(a.contains("don't"));
        assert!(!a.contains("humanities"));
    }

    #[test]
    fn test_parse_skips_comments_and_blanks() {
        let list = StopList::parse("# header\n\nfoo\n  Bar  \n#baz\n");
        assert_eq!(list.len(), 2);
        assert!(list.contains("foo"));
        assert!(list.contains("bar"));
        assert!(!list.contains("#baz"));
    }

    #[test]
    fn test_whitespace_entries_are_split() {
        let list = StopList::from_words(["new york"]);
        assert!(list.contains("new"));
        assert!(list.contains("york"));
        assert!(!list.contains("new york"));
    }

    #[test]
    fn test_accented_entries_match_every_folding() {
        let list = StopList::from_words(["Café"]);
        assert!(list.contains("café"));
        assert!(list.contains("cafe"));
        assert_eq!(list.iter().collect::<Vec<_>>(), vec!["café"]);
    }

    #[test]
    fn test_entries_are_stripped_and_resplit() {
        let list = StopList::from_words(["foo<i>bar", "at&amp;t", "ab\u{a8}cd"]);
        assert!(list.contains("foo"));
        assert!(list.contains("bar"));
        assert!(list.contains("at&t"));
        assert!(list.contains("ab"));
        assert!(list.contains("cd"));
        assert!(!list.contains("foo<i>bar"));
    }

    #[test]
    fn test_extended_with() {
        let base = StopList::from_words(["a", "b"]);
        let extra = StopList::from_words(["b", "c"]);
        let merged = base.extended_with(&extra);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged.iter().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(base.len(), 2);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stop.txt");
        std::fs::write(&path, "dh\nhumanities\n").unwrap();

        let list = StopList::load(&path).unwrap();
        assert!(list.contains("dh"));
        assert!(list.contains("humanities"));
    }

    #[test]
    fn test_load_missing_file_errors() {
        let err = StopList::load(Path::new("/definitely/not/here.txt")).unwrap_err();
        assert!(matches!(err, crate::Error::Io(_)));
    }
}
