//! Which paths a watcher reports.
//!
//! Filters run on the watcher thread, before anything reaches the channel.
//!
//! ```
//! use tg_watcher::{FileFilter, SourceFilter};
//! use camino::Utf8Path;
//!
//! let filter = SourceFilter;
//! assert!(filter.should_process(Utf8Path::new("schema/api.ts")));
//! assert!(filter.should_process(Utf8Path::new("types/global.d.ts")));
//! assert!(!filter.should_process(Utf8Path::new("schema/api.ts~")));
//! ```

use camino::{Utf8Path, Utf8PathBuf};

/// A predicate over changed paths.
///
/// Filters are moved into the blocking watcher task, hence the bounds.
pub trait FileFilter: Send + Sync + 'static {
    /// Returns `true` if a change to `path` should be reported.
    fn should_process(&self, path: &Utf8Path) -> bool;
}

/// Reports changes to TypeScript sources, declaration files included.
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceFilter;

impl SourceFilter {
    /// Extensions treated as TypeScript.
    pub const EXTENSIONS: [&'static str; 4] = ["ts", "tsx", "mts", "cts"];
}

impl FileFilter for SourceFilter {
    fn should_process(&self, path: &Utf8Path) -> bool {
        path.extension()
            .is_some_and(|ext| Self::EXTENSIONS.contains(&ext))
    }
}

/// Reports changes to one file only.
///
/// Editors often save by writing a sibling and renaming it over the
/// original, so the watcher registers the parent directory and this filter
/// narrows the events back down to the target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetFilter {
    target: Utf8PathBuf,
}

impl TargetFilter {
    /// Matches events for `target`. Pass a canonical path; event paths are
    /// built from the canonical watched directory.
    #[must_use]
    pub fn new(target: impl Into<Utf8PathBuf>) -> Self {
        Self {
            target: target.into(),
        }
    }

    /// The file this filter matches.
    #[must_use]
    pub fn target(&self) -> &Utf8Path {
        &self.target
    }
}

impl FileFilter for TargetFilter {
    fn should_process(&self, path: &Utf8Path) -> bool {
        path == self.target.as_path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_filter() {
        for path in ["a.ts", "b/c.tsx", "d.mts", "e.cts", "f.d.ts"] {
            assert!(SourceFilter.should_process(Utf8Path::new(path)), "{path}");
        }
        for path in ["a.js", "notes.md", "a.ts.swp", "Makefile"] {
            assert!(!SourceFilter.should_process(Utf8Path::new(path)), "{path}");
        }
    }

    #[test]
    fn test_target_filter() {
        let filter = TargetFilter::new("/work/schema/api.ts");
        assert_eq!(filter.target().as_str(), "/work/schema/api.ts");
        assert!(filter.should_process(Utf8Path::new("/work/schema/api.ts")));
        assert!(!filter.should_process(Utf8Path::new("/work/schema/api.ts.tmp")));
        assert!(!filter.should_process(Utf8Path::new("/work/schema/other.ts")));
    }
}
