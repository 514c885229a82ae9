//! Disk-backed response cache.
//!
//! One JSON file per (URL path, region). Query parameters never take part in
//! the key, so the same resource requested with different namespaces or
//! locales shares an entry. Entries never expire.

use std::fs;
use std::path::{Path, PathBuf};

use common::{Error, Region};
use serde_json::Value;
use tracing::trace;

#[derive(Debug, Clone)]
pub struct DiskCache {
    root: PathBuf,
    region: Region,
}

impl DiskCache {
    /// Open (and create if needed) a cache directory for one region.
    pub fn new(root: impl AsRef<Path>, region: Region) -> Result<Self, Error> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root, region })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File name an URL is stored under.
    pub fn key(&self, url: &str) -> String {
        let path = match url::Url::parse(url) {
            Ok(parsed) => parsed.path().to_string(),
            Err(_) => url.split('?').next().unwrap_or(url).to_string(),
        };
        format!("{}.{}.json", path.replace('/', "-"), self.region)
    }

    fn path_for(&self, url: &str) -> PathBuf {
        self.root.join(self.key(url))
    }

    /// Previously stored payload for `url`, if any.
    pub fn get(&self, url: &str) -> Result<Option<Value>, Error> {
        let path = self.path_for(url);
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read(&path)?;
        let value = serde_json::from_slice(&raw)?;
        trace!("Cache hit: {}", path.display());
        Ok(Some(value))
    }

    /// Store a payload for `url`. Concurrent writers race; last write wins.
    pub fn put(&self, url: &str, value: &Value) -> Result<(), Error> {
        let path = self.path_for(url);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, serde_json::to_vec(value)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_key_ignores_host_and_query() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::new(dir.path(), Region::Us).unwrap();
        let a = cache.key("https://us.api.blizzard.com/data/wow/talent/123?namespace=static-us");
        let b = cache.key("https://eu.api.blizzard.com/data/wow/talent/123");
        assert_eq!(a, "-data-wow-talent-123.us.json");
        assert_eq!(a, b);
    }

    #[test]
    fn test_key_includes_region() {
        let dir = tempfile::tempdir().unwrap();
        let us = DiskCache::new(dir.path(), Region::Us).unwrap();
        let eu = DiskCache::new(dir.path(), Region::Eu).unwrap();
        let url = "https://us.api.blizzard.com/data/wow/pvp-talent/index";
        assert_ne!(us.key(url), eu.key(url));
    }

    #[test]
    fn test_get_after_put() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::new(dir.path().join("nested/cache"), Region::Us).unwrap();
        let url = "https://us.api.blizzard.com/data/wow/talent-tree/index";
        assert!(cache.get(url).unwrap().is_none());

        let payload = json!({"class_talent_trees": [{"name": "Druid", "id": 793}], "ok": true});
        cache.put(url, &payload).unwrap();
        assert_eq!(cache.get(url).unwrap(), Some(payload));
    }

    #[test]
    fn test_corrupt_entry_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::new(dir.path(), Region::Us).unwrap();
        let url = "https://us.api.blizzard.com/data/wow/talent/1";
        fs::write(dir.path().join(cache.key(url)), b"{not json").unwrap();
        assert!(matches!(cache.get(url), Err(Error::Json(_))));
    }
}
