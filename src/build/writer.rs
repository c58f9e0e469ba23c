//! Artifact writer with an in-memory write cache.
//!
//! Outside production, the last text written to each path is remembered.
//! Writing identical text to an existing file again is skipped and reported as
//! cached, which keeps file watchers downstream of the output quiet. Binary
//! content is never compared.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Payload handed to the writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Text(String),
    Binary(Vec<u8>),
}

impl Content {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Content::Text(s) => s.as_bytes(),
            Content::Binary(b) => b,
        }
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, Content::Binary(_))
    }
}

impl From<String> for Content {
    fn from(value: String) -> Self {
        Content::Text(value)
    }
}

impl From<&str> for Content {
    fn from(value: &str) -> Self {
        Content::Text(value.to_string())
    }
}

impl From<Vec<u8>> for Content {
    fn from(value: Vec<u8>) -> Self {
        Content::Binary(value)
    }
}

/// One written (or skipped) output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledArtifact {
    /// Absolute output path
    pub filename: PathBuf,
    /// On-disk size in bytes after the write
    pub size: u64,
    /// The write was skipped because the content was unchanged
    pub cached: bool,
}

/// Last text written per output path.
#[derive(Debug, Default, Clone)]
pub struct WriteCache {
    entries: HashMap<PathBuf, String>,
}

impl WriteCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &Path) -> Option<&str> {
        self.entries.get(path).map(String::as_str)
    }

    pub fn insert(&mut self, path: PathBuf, content: String) {
        self.entries.insert(path, content);
    }

    pub fn remove(&mut self, path: &Path) -> Option<String> {
        self.entries.remove(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Writes artifacts, consulting the cache outside production.
#[derive(Debug, Default)]
pub struct Writer {
    cache: WriteCache,
    production: bool,
}

impl Writer {
    pub fn new(production: bool) -> Self {
        Self { cache: WriteCache::new(), production }
    }

    /// Reuse an existing cache.
    pub fn with_cache(cache: WriteCache, production: bool) -> Self {
        Self { cache, production }
    }

    pub fn cache(&self) -> &WriteCache {
        &self.cache
    }

    pub fn is_production(&self) -> bool {
        self.production
    }

    /// Whether writing `content` to `filename` can be skipped.
    fn is_unchanged(&self, filename: &Path, content: &Content) -> bool {
        if self.production || !filename.exists() {
            return false;
        }
        match (self.cache.get(filename), content) {
            (Some(previous), Content::Text(text)) => previous == text,
            _ => false,
        }
    }

    /// Write `content` to `filename`, creating parent directories.
    ///
    /// Returns the post-write size and whether the write was skipped.
    pub fn write(
        &mut self,
        filename: impl AsRef<Path>,
        content: impl Into<Content>,
    ) -> io::Result<CompiledArtifact> {
        let filename = filename.as_ref();
        let content = content.into();

        if let Some(parent) = filename.parent() {
            fs::create_dir_all(parent)?;
        }

        let cached = self.is_unchanged(filename, &content);
        if !cached {
            fs::write(filename, content.as_bytes())?;
            match (&content, self.production) {
                (Content::Text(text), false) => self.cache.insert(filename.to_path_buf(), text.clone()),
                // the file no longer holds the cached text
                (Content::Binary(_), _) => {
                    self.cache.remove(filename);
                }
                (Content::Text(_), true) => {}
            }
        }

        let size = fs::metadata(filename)?.len();
        Ok(CompiledArtifact { filename: filename.to_path_buf(), size, cached })
    }
}
