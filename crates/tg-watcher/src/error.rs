//! Error types for the tg-watcher crate.

use camino::Utf8PathBuf;

/// Errors that can occur while watching a source file.
///
/// Only [`WatchError::NonUtf8Path`] is recoverable: the offending event is
/// skipped and watching continues. Everything else stops the watcher.
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    /// The notify backend failed to start or to register a path.
    #[error("notify watcher error: {0}")]
    Notify(#[from] notify::Error),

    /// The watched path does not exist.
    #[error("path does not exist: {0}")]
    PathNotFound(Utf8PathBuf),

    /// The watched file has no parent directory to register.
    #[error("path has no parent directory: {0}")]
    NoParent(Utf8PathBuf),

    /// The watcher task ended without reporting back.
    #[error("event channel closed unexpectedly")]
    ChannelClosed,

    /// A path is not valid UTF-8.
    #[error("path is not valid UTF-8: {}", _0.display())]
    NonUtf8Path(std::path::PathBuf),

    /// Path validation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl WatchError {
    /// Creates a new [`WatchError::PathNotFound`] error.
    #[inline]
    pub fn path_not_found(path: impl Into<Utf8PathBuf>) -> Self {
        Self::PathNotFound(path.into())
    }

    /// Returns `true` if watching can continue after this error.
    #[inline]
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::NonUtf8Path(_))
    }

    /// Returns the path associated with this error, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Utf8PathBuf> {
        match self {
            Self::PathNotFound(path) | Self::NoParent(path) => Some(path),
            Self::Notify(_) | Self::ChannelClosed | Self::NonUtf8Path(_) | Self::Io(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_path_not_found() {
        let err = WatchError::path_not_found("models/missing.ts");
        assert!(!err.is_recoverable());
        assert_eq!(err.path().map(|p| p.as_str()), Some("models/missing.ts"));
        assert_eq!(err.to_string(), "path does not exist: models/missing.ts");
    }

    #[test]
    fn test_non_utf8_is_recoverable() {
        let err = WatchError::NonUtf8Path(PathBuf::from("bad"));
        assert!(err.is_recoverable());
        assert!(err.path().is_none());
        assert!(err.to_string().contains("not valid UTF-8"));
    }

    #[test]
    fn test_channel_closed() {
        let err = WatchError::ChannelClosed;
        assert!(!err.is_recoverable());
        assert!(err.path().is_none());
    }
}
