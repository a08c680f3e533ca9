use crate::error::LoadError;
use ahash::AHashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Reads the documents referenced by a network's `source`.
pub trait SourceResolver: Send + Sync {
    fn read(&self, path: &str) -> Result<String, LoadError>;
}

/// Reads sources from the filesystem, resolving relative paths against an optional root.
#[derive(Debug, Clone, Default)]
pub struct FsResolver {
    root: Option<PathBuf>,
}

impl FsResolver {
    pub fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }

    fn full_path(&self, path: &str) -> PathBuf {
        match &self.root {
            Some(root) if Path::new(path).is_relative() => root.join(path),
            _ => PathBuf::from(path),
        }
    }
}

impl SourceResolver for FsResolver {
    fn read(&self, path: &str) -> Result<String, LoadError> {
        let full = self.full_path(path);
        fs::read_to_string(&full).map_err(|source| LoadError::Io {
            path: full.display().to_string(),
            source,
        })
    }
}

/// Serves sources from memory; for embedding hosts and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryResolver {
    documents: AHashMap<String, String>,
}

impl MemoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, path: &str, content: &str) -> Self {
        self.insert(path, content);
        self
    }

    pub fn insert(&mut self, path: &str, content: &str) {
        self.documents
            .insert(path.to_string(), content.to_string());
    }
}

impl SourceResolver for MemoryResolver {
    fn read(&self, path: &str) -> Result<String, LoadError> {
        self.documents
            .get(path)
            .cloned()
            .ok_or_else(|| LoadError::Source {
                path: path.to_string(),
                message: "no such document".to_string(),
            })
    }
}
