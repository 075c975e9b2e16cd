//! Debounced watcher bridged into tokio.
//!
//! `notify` and its debouncer are synchronous, so they live on a blocking
//! task. The debouncer callback filters each window's events and forwards
//! one [`ChangeBatch`] per window over a bounded channel.
//!
//! ```text
//! spawn_blocking:  notify ─► debouncer (debounce_ms) ─► filter ─► blocking_send
//!                                                                     │
//! async:           FileWatcher::recv() ◄─────── mpsc::Receiver ◄──────┘
//! ```

use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use notify::RecursiveMode;
use notify_debouncer_mini::{DebounceEventResult, Debouncer, new_debouncer};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use tg_core::WatchConfig;

use crate::error::WatchError;
use crate::events::ChangeBatch;
use crate::filter::{FileFilter, TargetFilter};

/// Batches buffered before the watcher thread blocks.
const CHANNEL_CAPACITY: usize = 16;

/// Streams debounced change batches for a file or directory.
///
/// Dropping the watcher signals the blocking task to stop; [`shutdown`]
/// also waits for it.
///
/// # Examples
///
/// ```no_run
/// use tg_core::WatchConfig;
/// use tg_watcher::FileWatcher;
/// use camino::Utf8Path;
///
/// # async fn example() -> Result<(), tg_watcher::WatchError> {
/// let mut watcher = FileWatcher::watch_file(Utf8Path::new("schema.ts"), &WatchConfig::default())?;
/// while let Some(batch) = watcher.recv().await {
///     println!("{} changed", batch.paths()[0]);
/// }
/// # Ok(())
/// # }
/// ```
///
/// [`shutdown`]: FileWatcher::shutdown
pub struct FileWatcher {
    shutdown_tx: Option<oneshot::Sender<()>>,
    task_handle: Option<JoinHandle<Result<(), WatchError>>>,
    batch_rx: mpsc::Receiver<ChangeBatch>,
    watch_path: Utf8PathBuf,
}

impl std::fmt::Debug for FileWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileWatcher")
            .field("watch_path", &self.watch_path)
            .field("is_running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl FileWatcher {
    /// Watches `path`, a directory or file, reporting changes `filter`
    /// accepts. Must be called within a tokio runtime.
    ///
    /// # Errors
    ///
    /// [`WatchError::PathNotFound`] if `path` does not exist,
    /// [`WatchError::Io`] if it cannot be canonicalized.
    pub fn new<F: FileFilter>(
        path: &Utf8Path,
        config: &WatchConfig,
        filter: F,
    ) -> Result<Self, WatchError> {
        if !path.exists() {
            return Err(WatchError::path_not_found(path));
        }
        let watch_path = path.canonicalize_utf8()?;

        let (batch_tx, batch_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let task_path = watch_path.clone();
        let config = *config;
        let task_handle = tokio::task::spawn_blocking(move || {
            run_watcher_loop(&task_path, config, batch_tx, shutdown_rx, filter)
        });

        Ok(Self {
            shutdown_tx: Some(shutdown_tx),
            task_handle: Some(task_handle),
            batch_rx,
            watch_path,
        })
    }

    /// Watches a single file through its parent directory, so that saves
    /// that replace the file are still seen.
    ///
    /// # Errors
    ///
    /// As [`FileWatcher::new`], plus [`WatchError::NoParent`].
    pub fn watch_file(file: &Utf8Path, config: &WatchConfig) -> Result<Self, WatchError> {
        if !file.exists() {
            return Err(WatchError::path_not_found(file));
        }
        let file = file.canonicalize_utf8()?;
        let parent = file
            .parent()
            .ok_or_else(|| WatchError::NoParent(file.clone()))?
            .to_owned();
        let config = WatchConfig {
            recursive: false,
            ..*config
        };
        Self::new(&parent, &config, TargetFilter::new(file))
    }

    /// Waits for the next batch. `None` once the watcher has stopped.
    pub async fn recv(&mut self) -> Option<ChangeBatch> {
        self.batch_rx.recv().await
    }

    /// Takes a batch if one is ready.
    pub fn try_recv(&mut self) -> Result<ChangeBatch, mpsc::error::TryRecvError> {
        self.batch_rx.try_recv()
    }

    /// The canonical path being watched.
    #[must_use]
    pub fn watch_path(&self) -> &Utf8Path {
        &self.watch_path
    }

    /// Returns `true` until shutdown or a watcher failure.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.shutdown_tx.is_some() && self.task_handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stops the watcher and reports any error from its task.
    pub async fn shutdown(mut self) -> Result<(), WatchError> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.task_handle.take() {
            match handle.await {
                Ok(result) => result?,
                Err(_join_error) => return Err(WatchError::ChannelClosed),
            }
        }
        Ok(())
    }
}

impl Drop for FileWatcher {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Collects the accepted UTF-8 paths of one debounce window.
fn collect_batch<F: FileFilter>(
    events: Vec<notify_debouncer_mini::DebouncedEvent>,
    filter: &F,
) -> ChangeBatch {
    let mut batch = ChangeBatch::new();
    for event in events {
        let path = match Utf8PathBuf::try_from(event.path) {
            Ok(path) => path,
            Err(e) => {
                let err = WatchError::NonUtf8Path(e.into_path_buf());
                tracing::warn!(error = %err, "Skipping file event");
                continue;
            }
        };
        if filter.should_process(&path) {
            batch.push(path);
        } else {
            tracing::trace!(path = %path, "Filtered out file event");
        }
    }
    batch
}

#[allow(clippy::needless_pass_by_value)]
fn run_watcher_loop<F: FileFilter>(
    path: &Utf8Path,
    config: WatchConfig,
    batch_tx: mpsc::Sender<ChangeBatch>,
    shutdown_rx: oneshot::Receiver<()>,
    filter: F,
) -> Result<(), WatchError> {
    let timeout = Duration::from_millis(config.debounce_ms);

    let mut debouncer: Debouncer<notify::RecommendedWatcher> =
        new_debouncer(timeout, move |res: DebounceEventResult| match res {
            Ok(events) => {
                let batch = collect_batch(events, &filter);
                if batch.is_empty() {
                    return;
                }
                tracing::debug!(paths = batch.len(), "Change batch");
                if batch_tx.blocking_send(batch).is_err() {
                    tracing::debug!("Batch channel closed");
                }
            }
            Err(error) => tracing::warn!(error = %error, "Debouncer error"),
        })?;

    let mode = if config.recursive {
        RecursiveMode::Recursive
    } else {
        RecursiveMode::NonRecursive
    };
    debouncer.watcher().watch(path.as_std_path(), mode)?;

    tracing::info!(
        path = %path,
        recursive = config.recursive,
        debounce_ms = config.debounce_ms,
        "File watcher started"
    );

    let _ = shutdown_rx.blocking_recv();

    tracing::info!(path = %path, "File watcher stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::SourceFilter;
    use std::fs;
    use tempfile::TempDir;

    fn temp_dir() -> TempDir {
        TempDir::new().expect("Failed to create temp directory")
    }

    fn utf8(dir: &TempDir) -> &Utf8Path {
        Utf8Path::from_path(dir.path()).expect("Invalid path")
    }

    fn fast() -> WatchConfig {
        WatchConfig {
            debounce_ms: 50,
            recursive: false,
        }
    }

    #[tokio::test]
    async fn test_watcher_starts_and_stops() {
        let dir = temp_dir();
        let watcher = FileWatcher::new(utf8(&dir), &WatchConfig::default(), SourceFilter)
            .expect("Failed to create watcher");

        assert!(watcher.is_running());
        assert!(!watcher.watch_path().as_str().is_empty());
        watcher.shutdown().await.expect("Shutdown failed");
    }

    #[tokio::test]
    async fn test_missing_path() {
        let result = FileWatcher::new(
            Utf8Path::new("/nonexistent/tsgraph/watch"),
            &WatchConfig::default(),
            SourceFilter,
        );
        match result {
            Err(WatchError::PathNotFound(path)) => assert!(path.as_str().ends_with("watch")),
            other => panic!("Expected PathNotFound, got {other:?}"),
        }

        let result = FileWatcher::watch_file(Utf8Path::new("/nonexistent/a.ts"), &fast());
        assert!(matches!(result, Err(WatchError::PathNotFound(_))));
    }

    #[tokio::test]
    async fn test_watch_file_registers_parent() {
        let dir = temp_dir();
        let file = dir.path().join("models.ts");
        fs::write(&file, "interface A {}").expect("Failed to write file");
        let file = Utf8Path::from_path(&file).expect("Invalid path");

        let watcher = FileWatcher::watch_file(file, &fast()).expect("Failed to create watcher");
        let parent = utf8(&dir).canonicalize_utf8().expect("canonicalize");
        assert_eq!(watcher.watch_path(), parent.as_path());
        watcher.shutdown().await.expect("Shutdown failed");
    }

    #[tokio::test]
    async fn test_watcher_delivers_batches() {
        let dir = temp_dir();
        let mut watcher =
            FileWatcher::new(utf8(&dir), &fast(), SourceFilter).expect("Failed to create watcher");

        fs::write(dir.path().join("ignored.md"), "x").expect("Failed to write file");
        fs::write(dir.path().join("models.ts"), "interface A {}").expect("Failed to write file");

        let batch = tokio::time::timeout(Duration::from_secs(2), watcher.recv()).await;
        watcher.shutdown().await.expect("Shutdown failed");

        // Event delivery depends on the platform backend; only check what arrived.
        if let Ok(Some(batch)) = batch {
            assert!(!batch.is_empty());
            assert!(batch.paths().iter().all(|p| p.extension() == Some("ts")));
        }
    }
}
