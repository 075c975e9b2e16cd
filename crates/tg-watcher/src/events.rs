//! Coalesced change notifications.
//!
//! Every debounce window that saw at least one accepted change yields one
//! [`ChangeBatch`], so a burst of keystroke saves turns into one
//! re-extraction.

use std::time::Instant;

use camino::{Utf8Path, Utf8PathBuf};
use smallvec::SmallVec;

/// The files that changed within one debounce window.
///
/// # Examples
///
/// ```
/// use tg_watcher::ChangeBatch;
/// use camino::Utf8PathBuf;
///
/// let batch: ChangeBatch = ["a.ts", "b.ts", "a.ts"].into_iter().map(Utf8PathBuf::from).collect();
/// assert_eq!(batch.len(), 2);
/// assert!(batch.contains(camino::Utf8Path::new("a.ts")));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeBatch {
    paths: SmallVec<[Utf8PathBuf; 4]>,
    received_at: Instant,
}

impl ChangeBatch {
    /// An empty batch stamped now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            paths: SmallVec::new(),
            received_at: Instant::now(),
        }
    }

    /// Adds a path unless the batch already holds it.
    pub fn push(&mut self, path: Utf8PathBuf) {
        if !self.paths.contains(&path) {
            self.paths.push(path);
        }
    }

    /// Distinct changed paths, in arrival order.
    #[must_use]
    pub fn paths(&self) -> &[Utf8PathBuf] {
        &self.paths
    }

    /// Returns `true` if `path` changed in this window.
    #[must_use]
    pub fn contains(&self, path: &Utf8Path) -> bool {
        self.paths.iter().any(|p| p == path)
    }

    /// Number of distinct paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Returns `true` if no path changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// When the debouncer delivered the batch.
    #[must_use]
    pub const fn received_at(&self) -> Instant {
        self.received_at
    }
}

impl Default for ChangeBatch {
    fn default() -> Self {
        Self::new()
    }
}

impl FromIterator<Utf8PathBuf> for ChangeBatch {
    fn from_iter<T: IntoIterator<Item = Utf8PathBuf>>(iter: T) -> Self {
        let mut batch = Self::new();
        for path in iter {
            batch.push(path);
        }
        batch
    }
}

impl<'a> IntoIterator for &'a ChangeBatch {
    type Item = &'a Utf8PathBuf;
    type IntoIter = std::slice::Iter<'a, Utf8PathBuf>;

    fn into_iter(self) -> Self::IntoIter {
        self.paths.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_dedupes() {
        let mut batch = ChangeBatch::new();
        assert!(batch.is_empty());

        batch.push(Utf8PathBuf::from("src/models.ts"));
        batch.push(Utf8PathBuf::from("src/other.ts"));
        batch.push(Utf8PathBuf::from("src/models.ts"));

        assert_eq!(batch.len(), 2);
        let paths: Vec<&str> = batch.paths().iter().map(|p| p.as_str()).collect();
        assert_eq!(paths, ["src/models.ts", "src/other.ts"]);
    }

    #[test]
    fn test_contains() {
        let batch: ChangeBatch = std::iter::once(Utf8PathBuf::from("a.ts")).collect();
        assert!(batch.contains(Utf8Path::new("a.ts")));
        assert!(!batch.contains(Utf8Path::new("b.ts")));
        assert!(batch.received_at() <= Instant::now());
    }
}
