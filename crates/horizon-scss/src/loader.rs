//! Loaders that provide the content of `@import`ed stylesheets.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

/// Source of imported stylesheets.
pub trait Loader: Send + Sync {
    /// Content of the stylesheet `path` refers to, or `None` if there is none.
    fn fetch(&self, path: &str) -> Option<String>;

    /// File system location of `path`, when the loader reads from disk.
    fn locate(&self, _path: &str) -> Option<PathBuf> {
        None
    }
}

/// Names to try for an import, in order.
///
/// A path without an extension gets `.scss` appended. If the file name does
/// not already start with `_`, the partial form `dir/_name.scss` is tried
/// second.
pub fn candidate_paths(path: &str) -> Vec<String> {
    let mut path = path.to_string();
    if Path::new(&path).extension().is_none() {
        path.push_str(".scss");
    }

    let (dir, name) = match path.rfind('/') {
        Some(slash) => path.split_at(slash + 1),
        None => ("", path.as_str()),
    };
    if name.starts_with('_') {
        return vec![path];
    }
    let partial = format!("{}_{}", dir, name);
    vec![path, partial]
}

/// Reads imports from the file system, relative to a root directory.
#[derive(Debug, Clone)]
pub struct FileLoader {
    root: PathBuf,
}

impl FileLoader {
    /// Create a loader resolving paths against `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory imports are resolved against.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Loader for FileLoader {
    fn fetch(&self, path: &str) -> Option<String> {
        for candidate in candidate_paths(path) {
            let full = self.root.join(&candidate);
            match std::fs::read_to_string(&full) {
                Ok(content) => return Some(content),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(
                        target: "horizon_scss::loader",
                        "Failed to read {}: {}",
                        full.display(),
                        e
                    );
                }
            }
        }
        None
    }

    fn locate(&self, path: &str) -> Option<PathBuf> {
        candidate_paths(path)
            .into_iter()
            .map(|candidate| self.root.join(candidate))
            .find(|full| full.is_file())
    }
}

/// Serves imports from an in-memory map, applying the same name policy as
/// [`FileLoader`].
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    files: HashMap<String, String>,
}

impl MemoryLoader {
    /// Create an empty loader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file.
    pub fn insert(&mut self, path: impl Into<String>, content: impl Into<String>) {
        self.files.insert(path.into(), content.into());
    }

    /// Add a file, builder style.
    pub fn with_file(mut self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.insert(path, content);
        self
    }
}

impl Loader for MemoryLoader {
    fn fetch(&self, path: &str) -> Option<String> {
        candidate_paths(path)
            .into_iter()
            .find_map(|candidate| self.files.get(&candidate).cloned())
    }
}

/// Finds nothing. Every `@import` fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLoader;

impl Loader for NullLoader {
    fn fetch(&self, _path: &str) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidates() {
        assert_eq!(candidate_paths("colors"), vec!["colors.scss", "_colors.scss"]);
        assert_eq!(
            candidate_paths("lib/mixins.scss"),
            vec!["lib/mixins.scss", "lib/_mixins.scss"]
        );
        assert_eq!(candidate_paths("_partial"), vec!["_partial.scss"]);
        assert_eq!(candidate_paths("theme.css"), vec!["theme.css", "_theme.css"]);
    }

    #[test]
    fn memory_loader_falls_back_to_partials() {
        let loader = MemoryLoader::new()
            .with_file("base.scss", "a")
            .with_file("lib/_util.scss", "b");
        assert_eq!(loader.fetch("base").as_deref(), Some("a"));
        assert_eq!(loader.fetch("lib/util").as_deref(), Some("b"));
        assert_eq!(loader.fetch("missing"), None);
    }

    #[test]
    fn file_loader_reads_from_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("_vars.scss"), "$a: 1;").unwrap();

        let loader = FileLoader::new(dir.path());
        assert_eq!(loader.fetch("vars").as_deref(), Some("$a: 1;"));
        assert_eq!(loader.locate("vars"), Some(dir.path().join("_vars.scss")));
        assert_eq!(loader.fetch("nope"), None);
        assert_eq!(loader.locate("nope"), None);
    }

    #[test]
    fn null_loader_finds_nothing() {
        assert_eq!(NullLoader.fetch("anything"), None);
        assert_eq!(NullLoader.locate("anything"), None);
    }
}
