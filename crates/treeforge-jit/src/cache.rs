//! Persistent cache of emitted evaluators.
//!
//! Entries are keyed by tree geometry and feature count. Two entries exist
//! per key: the serialized tree last built under that depth and feature
//! count, and the evaluator module itself. The tree entry is shared by every
//! chunking of the same depth, so each module also carries the tree its
//! evaluators were emitted for. A hit requires both entries, and both trees
//! must equal the tree being resolved.
//!
//! Evaluators are stored as Cranelift IR text rather than machine code. The
//! JIT module cannot link relocatable objects, but reparsing IR skips path
//! enumeration, variant expansion and verification, which dominate build time.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use treeforge_core::{DecisionTree, Geometry, Result, TreeForgeError};

/// Byte store behind the resolver cache.
pub trait ObjectCache: Send + Sync {
    /// Returns the entry stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Stores `bytes` under `key`, replacing any previous entry.
    fn put(&self, key: &str, bytes: &[u8]) -> Result<()>;
}

/// One file per entry inside a directory.
#[derive(Debug, Clone)]
pub struct FileObjectCache {
    dir: PathBuf,
}

impl FileObjectCache {
    /// Uses `dir`, creating it on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

impl ObjectCache for FileObjectCache {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match fs::read(self.path(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        // write-then-rename so readers never see a partial entry; the temp
        // name is unique per process and per call
        static NEXT_TMP: AtomicU64 = AtomicU64::new(0);
        let tmp = self.path(&format!(
            "{key}.{}.{}.tmp",
            std::process::id(),
            NEXT_TMP.fetch_add(1, Ordering::Relaxed)
        ));
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, self.path(key))?;
        Ok(())
    }
}

/// In-process cache, mostly for tests.
#[derive(Debug, Default)]
pub struct MemoryObjectCache {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryObjectCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>> {
        // a poisoned map is still a valid map
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl ObjectCache for MemoryObjectCache {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.lock().get(key).cloned())
    }

    fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        self.lock().insert(key.to_string(), bytes.to_vec());
        Ok(())
    }
}

/// Identifies the cache entries of one resolver shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub geometry: Geometry,
    pub feature_count: usize,
}

impl CacheKey {
    pub fn new(geometry: Geometry, feature_count: usize) -> Self {
        Self {
            geometry,
            feature_count,
        }
    }

    /// `tree_<D>_<features>.json`
    pub fn tree_entry(&self) -> String {
        format!(
            "tree_{}_{}.json",
            self.geometry.tree_depth, self.feature_count
        )
    }

    /// `evaluators_<D>_<features>_<F>_<S>.json`
    pub fn module_entry(&self) -> String {
        format!(
            "evaluators_{}_{}_{}_{}.json",
            self.geometry.tree_depth,
            self.feature_count,
            self.geometry.function_depth,
            self.geometry.switch_depth
        )
    }
}

/// Serialized IR of one evaluator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedFunction {
    pub symbol: String,
    pub clif: String,
}

/// Cache entry holding every evaluator of a resolver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedModule {
    pub tree_depth: u32,
    pub feature_count: usize,
    pub function_depth: u32,
    pub switch_depth: u32,
    /// Tree the evaluators were emitted for.
    pub tree: DecisionTree,
    pub functions: Vec<CachedFunction>,
}

impl CachedModule {
    pub fn new(key: CacheKey, tree: DecisionTree, functions: Vec<CachedFunction>) -> Self {
        Self {
            tree_depth: key.geometry.tree_depth,
            feature_count: key.feature_count,
            function_depth: key.geometry.function_depth,
            switch_depth: key.geometry.switch_depth,
            tree,
            functions,
        }
    }

    /// Whether the header describes `key`.
    pub fn matches(&self, key: &CacheKey) -> bool {
        self.tree_depth == key.geometry.tree_depth
            && self.feature_count == key.feature_count
            && self.function_depth == key.geometry.function_depth
            && self.switch_depth == key.geometry.switch_depth
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| TreeForgeError::Serialization(e.to_string()))
    }

    pub fn from_bytes(entry: &str, bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| TreeForgeError::cache_corruption(entry, e))
    }
}
