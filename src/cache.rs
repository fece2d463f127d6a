//! Content-addressed artifact cache.
//!
//! The street raster for a given (place, layers) pair is expensive to
//! produce, so it is cached under a stable content key. The cache is a
//! trait so the pipeline can run against a real directory on disk or an
//! in-memory map in tests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use sha2::{Digest, Sha256};

use crate::error::{Error, Result};
use crate::mapper::Layer;

/// Stable cache key for a (place, layers) configuration.
///
/// The key is the hex SHA-256 of the canonical JSON encoding; `Layer` keeps
/// its width map in a `BTreeMap` so the encoding is order-stable.
pub fn cache_key(place: &str, layers: &[Layer]) -> String {
    let payload = serde_json::json!({ "place": place, "layers": layers });
    let mut hasher = Sha256::new();
    hasher.update(payload.to_string().as_bytes());
    hex::encode(hasher.finalize())
}

/// Keyed storage for intermediate artifacts
pub trait ArtifactCache {
    /// Fetch a cached artifact, `None` on a miss
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store an artifact under `key`
    fn store(&self, key: &str, bytes: &[u8]) -> Result<()>;
}

/// Directory-backed cache: one `<key>.png` file per artifact
#[derive(Debug, Clone)]
pub struct DiskCache {
    root: PathBuf,
}

impl DiskCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        // Keys are hex digests; refuse anything that could escape the root
        if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(Error::Cache(format!("invalid cache key {key:?}")));
        }
        Ok(self.root.join(format!("{key}.png")))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ArtifactCache for DiskCache {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(key)?;
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Io(e)),
        }
    }

    fn store(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.root)?;
        std::fs::write(&path, bytes)?;
        Ok(())
    }
}

/// In-memory cache for tests and one-shot builds
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ArtifactCache for MemoryCache {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| Error::Cache("cache lock poisoned".into()))?;
        Ok(entries.get(key).cloned())
    }

    fn store(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| Error::Cache("cache lock poisoned".into()))?;
        entries.insert(key.to_string(), bytes.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_stable_and_input_sensitive() {
        let layers = vec![Layer::streets()];
        let a = cache_key("Lyon, France", &layers);
        let b = cache_key("Lyon, France", &layers);
        let c = cache_key("Paris, France", &layers);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn key_tracks_layer_changes() {
        let mut layer = Layer::streets();
        let base = cache_key("Lyon", std::slice::from_ref(&layer));
        layer.widths.insert("motorway".to_string(), 2.0);
        assert_ne!(base, cache_key("Lyon", std::slice::from_ref(&layer)));
    }

    #[test]
    fn memory_cache_round_trip() {
        let cache = MemoryCache::new();
        assert!(cache.load("abc123").unwrap().is_none());
        cache.store("abc123", b"artifact").unwrap();
        assert_eq!(cache.load("abc123").unwrap().as_deref(), Some(&b"artifact"[..]));
    }

    #[test]
    fn disk_cache_rejects_path_escapes() {
        let cache = DiskCache::new("/tmp/mapposter-test");
        assert!(cache.load("../../etc/passwd").is_err());
        assert!(cache.load("").is_err());
    }
}
