//! Debounced file watching for live model extraction.
//!
//! [`FileWatcher`] runs a `notify` watcher with `notify-debouncer-mini` on
//! a blocking task and hands one [`ChangeBatch`] per debounce window to
//! async code. A consumer re-extracts once per batch, which coalesces
//! bursts of edits into a single rebuild.
//!
//! ```no_run
//! use camino::Utf8Path;
//! use tg_core::WatchConfig;
//! use tg_watcher::{FileWatcher, SourceFilter};
//!
//! # async fn example() -> Result<(), tg_watcher::WatchError> {
//! let mut watcher = FileWatcher::new(Utf8Path::new("./schema"), &WatchConfig::default(), SourceFilter)?;
//! let mut tick = tokio::time::interval(std::time::Duration::from_secs(1));
//! loop {
//!     tokio::select! {
//!         Some(batch) = watcher.recv() => println!("{} file(s) changed", batch.len()),
//!         _ = tick.tick() => {}
//!     }
//! }
//! # }
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod error;
pub mod events;
pub mod filter;
pub mod watcher;

pub use error::WatchError;
pub use events::ChangeBatch;
pub use filter::{FileFilter, SourceFilter, TargetFilter};
pub use watcher::FileWatcher;
