//! File watching for an entry stylesheet and the files it imports.

use notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_mini::{DebouncedEvent, DebouncedEventKind, Debouncer, new_debouncer};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::time::Duration;

use crate::Compiler;
use crate::{Error, Result};

/// Quiet period before a burst of writes is reported as one change.
const DEBOUNCE: Duration = Duration::from_millis(100);

type DebounceResult = std::result::Result<Vec<DebouncedEvent>, notify::Error>;

/// Event indicating a watched source file changed.
#[derive(Debug, Clone)]
pub struct SourceChangeEvent {
    /// Path to the changed file.
    pub path: PathBuf,
    /// Type of change.
    pub kind: ChangeKind,
}

/// Type of file change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// File was written or replaced.
    Modified,
    /// File no longer exists.
    Removed,
}

/// Watches the import graph of an entry stylesheet.
///
/// Every [`rebuild`](Self::rebuild) replaces the watched set with the entry
/// plus the files the compiler resolved through `@import`, so a file that
/// stops being imported stops triggering rebuilds.
///
/// # Example
///
/// ```ignore
/// let mut compiler = Compiler::default().with_loader(FileLoader::new("styles"));
/// let mut watcher = SourceWatcher::new()?;
/// let css = watcher.rebuild(&mut compiler, "styles/app.scss")?;
///
/// // In your event loop:
/// if !watcher.poll().is_empty() {
///     let css = watcher.rebuild(&mut compiler, "styles/app.scss")?;
/// }
/// ```
pub struct SourceWatcher {
    debouncer: Debouncer<RecommendedWatcher>,
    events: Receiver<DebounceResult>,
    graph: BTreeSet<PathBuf>,
}

impl SourceWatcher {
    /// Create a watcher with an empty import graph.
    pub fn new() -> Result<Self> {
        let (tx, events) = mpsc::channel();
        let debouncer =
            new_debouncer(DEBOUNCE, tx).map_err(|e| Error::HotReload(e.to_string()))?;

        Ok(Self {
            debouncer,
            events,
            graph: BTreeSet::new(),
        })
    }

    /// Add one file to the watched set.
    pub fn watch(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = canonical(path.as_ref())?;
        if self.graph.contains(&path) {
            return Ok(());
        }

        self.debouncer
            .watcher()
            .watch(&path, RecursiveMode::NonRecursive)
            .map_err(|e| Error::HotReload(e.to_string()))?;
        tracing::debug!(target: "horizon_scss::hot_reload", "watching {}", path.display());
        self.graph.insert(path);
        Ok(())
    }

    /// Remove one file from the watched set. Unknown paths are ignored.
    pub fn unwatch(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let path = canonical(path).unwrap_or_else(|_| path.to_path_buf());
        if self.graph.remove(&path) {
            self.release(&path);
        }
    }

    fn release(&mut self, path: &Path) {
        match self.debouncer.watcher().unwatch(path) {
            Ok(()) => {
                tracing::debug!(target: "horizon_scss::hot_reload", "stopped watching {}", path.display());
            }
            Err(e) => {
                tracing::warn!("Cannot stop watching {}: {}", path.display(), e);
            }
        }
    }

    /// Make the watched set exactly `sources`.
    ///
    /// Sources that cannot be watched (usually because they no longer exist)
    /// are logged and skipped.
    fn sync(&mut self, sources: &[PathBuf]) {
        let wanted: BTreeSet<PathBuf> = sources
            .iter()
            .filter_map(|source| match canonical(source) {
                Ok(path) => Some(path),
                Err(e) => {
                    tracing::warn!("Cannot watch {}: {}", source.display(), e);
                    None
                }
            })
            .collect();

        let stale: Vec<PathBuf> = self.graph.difference(&wanted).cloned().collect();
        for path in stale {
            self.graph.remove(&path);
            self.release(&path);
        }
        for path in wanted {
            if let Err(e) = self.watch(&path) {
                tracing::warn!("Cannot watch {}: {}", path.display(), e);
            }
        }
    }

    /// Drain pending file events.
    ///
    /// Returns each changed file of the import graph once, in path order.
    pub fn poll(&mut self) -> Vec<SourceChangeEvent> {
        let mut changed = BTreeSet::new();

        loop {
            match self.events.try_recv() {
                Ok(Ok(events)) => changed.extend(
                    events
                        .into_iter()
                        .filter(|event| event.kind == DebouncedEventKind::Any)
                        .map(|event| event.path)
                        .filter(|path| self.graph.contains(path)),
                ),
                Ok(Err(e)) => tracing::warn!("File watcher error: {}", e),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    tracing::error!("File watcher disconnected");
                    break;
                }
            }
        }

        changed
            .into_iter()
            .map(|path| {
                let kind = if path.exists() {
                    ChangeKind::Modified
                } else {
                    ChangeKind::Removed
                };
                SourceChangeEvent { path, kind }
            })
            .collect()
    }

    /// Compile `entry` from scratch and watch its import graph.
    ///
    /// The compiler is reset first, so variables and mixins from the
    /// previous build do not leak into this one. The graph is updated even
    /// when the compile fails, so fixing a broken import triggers a rebuild.
    pub fn rebuild(&mut self, compiler: &mut Compiler, entry: impl AsRef<Path>) -> Result<String> {
        let entry = entry.as_ref();
        compiler.reset();

        let result = compiler.process_file(entry);
        let mut sources = vec![entry.to_path_buf()];
        sources.extend_from_slice(compiler.dependencies());
        self.sync(&sources);
        result?;

        let css = compiler.render();
        tracing::info!("Rebuilt {} ({} imports)", entry.display(), sources.len() - 1);
        Ok(css)
    }

    /// Number of watched files.
    pub fn watched_count(&self) -> usize {
        self.graph.len()
    }

    /// Watched files, in path order.
    pub fn watched_paths(&self) -> impl Iterator<Item = &Path> {
        self.graph.iter().map(PathBuf::as_path)
    }
}

fn canonical(path: &Path) -> Result<PathBuf> {
    path.canonicalize().map_err(|e| Error::io(path, e))
}
