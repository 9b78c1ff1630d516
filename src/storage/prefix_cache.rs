//! Prefix cache: key prefix → type name, partitioned by org user.
//!
//! Read optimistically without locking; a single session is the only
//! writer.

use std::collections::BTreeMap;
use std::path::PathBuf;

use super::{Result, Storage, read_json, write_json};

type PrefixCache = BTreeMap<String, BTreeMap<String, String>>;

impl Storage {
    /// Looks up a cached type name for `prefix` in `org`'s partition.
    pub fn cached_type(&self, org: &str, prefix: &str) -> Result<Option<String>> {
        let cache: PrefixCache = read_json(&self.prefix_cache_path())?;
        Ok(cache.get(org).and_then(|m| m.get(prefix)).cloned())
    }

    /// Records a single prefix → type answer.
    pub fn cache_type(&self, org: &str, prefix: &str, object_name: &str) -> Result<()> {
        let path = self.prefix_cache_path();
        let mut cache: PrefixCache = read_json(&path)?;
        cache
            .entry(org.to_string())
            .or_default()
            .insert(prefix.to_string(), object_name.to_string());
        write_json(&path, &cache)
    }

    /// Replaces `org`'s whole partition; other orgs are untouched.
    pub fn replace_prefixes(&self, org: &str, prefixes: BTreeMap<String, String>) -> Result<()> {
        let path = self.prefix_cache_path();
        let mut cache: PrefixCache = read_json(&path)?;
        cache.insert(org.to_string(), prefixes);
        write_json(&path, &cache)
    }

    fn prefix_cache_path(&self) -> PathBuf {
        self.root.join("prefix-cache.json")
    }
}
