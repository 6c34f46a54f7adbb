//! Recompiling stylesheets when their sources change.
//!
//! This module is only available with the `hot-reload` feature.

mod watcher;

pub use watcher::{ChangeKind, SourceChangeEvent, SourceWatcher};
