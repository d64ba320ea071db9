//! Part file resolution
//!
//! Geometry composition asks a [`PartResolver`] for the backing file of every
//! part that was referenced but never defined. Two implementations ship with
//! the crate: [`LibraryResolver`] for an LDraw library on disk and
//! [`MemoryResolver`] for sources held in memory.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Library sub-directories searched, in priority order
///
/// The empty entry stands for the library root itself and is only searched
/// one level deep.
const SEARCH_DIRS: &[&str] = &[
    "parts",
    "p",
    "models",
    "unofficial/parts",
    "unofficial/p",
    "",
];

/// Normalize a referenced name into a lookup key
///
/// LDraw names are case-insensitive and may use either path separator.
pub fn normalize_name(name: &str) -> String {
    name.trim().replace('\\', "/").to_ascii_lowercase()
}

/// Trait for locating and loading part definitions by name
///
/// # Example
///
/// ```
/// use ldraw_plan::{PartResolver, Result};
/// use std::path::PathBuf;
///
/// struct FixedResolver;
///
/// impl PartResolver for FixedResolver {
///     fn resolve(&self, name: &str) -> Option<PathBuf> {
///         (name == "stud.dat").then(|| PathBuf::from("/library/p/stud.dat"))
///     }
/// }
///
/// assert!(FixedResolver.resolve("stud.dat").is_some());
/// assert!(FixedResolver.resolve("3001.dat").is_none());
/// ```
pub trait PartResolver: Send + Sync {
    /// Locate the backing file of `name`
    fn resolve(&self, name: &str) -> Option<PathBuf>;

    /// Load the source text of `name`
    ///
    /// Returns `Ok(None)` when the name cannot be resolved. The default
    /// implementation reads the resolved path, replacing invalid UTF-8.
    fn load(&self, name: &str) -> Result<Option<String>> {
        let Some(path) = self.resolve(name) else {
            return Ok(None);
        };
        let bytes = fs::read(&path)?;
        Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
    }
}

/// Resolver over one or more LDraw library roots on disk
///
/// The library is indexed once on construction; lookups are case-insensitive
/// and served from the index.
#[derive(Debug, Clone, Default)]
pub struct LibraryResolver {
    roots: Vec<PathBuf>,
    index: HashMap<String, PathBuf>,
}

impl LibraryResolver {
    /// Index a single library root
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        Self::with_roots([root.into()])
    }

    /// Index several library roots; earlier roots take priority
    pub fn with_roots<I, P>(roots: I) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut resolver = Self::default();
        for root in roots {
            resolver.add_root(root.into())?;
        }
        Ok(resolver)
    }

    /// Index another root with lower priority than the existing ones
    ///
    /// Fails with an I/O error when `root` is not a directory.
    pub fn add_root(&mut self, root: PathBuf) -> Result<()> {
        if !root.is_dir() {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("library root {} is not a directory", root.display()),
            )));
        }
        let before = self.index.len();
        for dir in SEARCH_DIRS {
            let base = if dir.is_empty() {
                root.clone()
            } else {
                root.join(dir)
            };
            if !base.is_dir() {
                continue;
            }
            let walker = if dir.is_empty() {
                WalkDir::new(&base).max_depth(1)
            } else {
                WalkDir::new(&base)
            };
            for entry in walker {
                let entry = entry.map_err(|e| Error::Io(e.into()))?;
                if !entry.file_type().is_file() {
                    continue;
                }
                if let Some(key) = index_key(&base, entry.path()) {
                    self.index
                        .entry(key)
                        .or_insert_with(|| entry.path().to_path_buf());
                }
            }
        }
        tracing::debug!(
            root = %root.display(),
            files = self.index.len() - before,
            "Indexed part library root"
        );
        self.roots.push(root);
        Ok(())
    }

    /// Library roots in priority order
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Number of indexed files
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether no files were indexed
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

fn index_key(base: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(base).ok()?;
    let parts: Vec<_> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect();
    Some(normalize_name(&parts.join("/")))
}

impl PartResolver for LibraryResolver {
    fn resolve(&self, name: &str) -> Option<PathBuf> {
        self.index.get(&normalize_name(name)).cloned()
    }
}

/// Resolver serving sources from memory
#[derive(Debug, Clone, Default)]
pub struct MemoryResolver {
    sources: HashMap<String, String>,
}

impl MemoryResolver {
    /// Create an empty resolver
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a source, builder style
    pub fn with_source(mut self, name: &str, source: impl Into<String>) -> Self {
        self.insert(name, source);
        self
    }

    /// Add or replace a source
    pub fn insert(&mut self, name: &str, source: impl Into<String>) {
        self.sources.insert(normalize_name(name), source.into());
    }
}

impl PartResolver for MemoryResolver {
    fn resolve(&self, name: &str) -> Option<PathBuf> {
        let key = normalize_name(name);
        self.sources.contains_key(&key).then(|| PathBuf::from(key))
    }

    fn load(&self, name: &str) -> Result<Option<String>> {
        Ok(self.sources.get(&normalize_name(name)).cloned())
    }
}
