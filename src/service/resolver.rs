//! Type resolution: identifier prefix → record type name.
//!
//! The first three characters of an identifier name its type. Answers are
//! cached per org user; a cache miss falls back to a single-prefix query
//! whose answer is written back for next time.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::identifier;
use crate::storage::Storage;

use super::{ServiceError, TypeResolver};

/// Remote source of prefix → type mappings.
#[async_trait]
pub trait PrefixDirectory: Send + Sync {
    /// The org user the cache is partitioned by, or `None` if no org is set.
    async fn org_user(&self) -> Result<Option<String>, ServiceError>;

    async fn lookup_prefix(&self, prefix: &str) -> Result<Option<String>, ServiceError>;

    async fn all_prefixes(&self) -> Result<BTreeMap<String, String>, ServiceError>;
}

/// Cache-first resolver backed by a [`PrefixDirectory`].
pub struct PrefixResolver<'a, D> {
    directory: &'a D,
    storage: &'a Storage,
    /// Program name used in the "no org" hint.
    program: String,
}

impl<'a, D: PrefixDirectory> PrefixResolver<'a, D> {
    pub fn new(directory: &'a D, storage: &'a Storage, program: impl Into<String>) -> Self {
        Self {
            directory,
            storage,
            program: program.into(),
        }
    }

    /// Refresh the whole prefix map for the current org.
    ///
    /// Returns how many prefixes were stored; `0` when no org is set.
    pub async fn warm(&self) -> Result<usize, ServiceError> {
        let Some(org) = self.directory.org_user().await? else {
            return Ok(0);
        };

        let prefixes = self.directory.all_prefixes().await?;
        let count = prefixes.len();
        if count > 0 {
            self.storage
                .replace_prefixes(&org, prefixes)
                .map_err(|e| ServiceError::Command {
                    name: None,
                    message: format!("failed to write prefix cache: {e}"),
                })?;
        }

        tracing::info!(org = %org, count, "warmed prefix cache");
        Ok(count)
    }
}

#[async_trait]
impl<'a, D: PrefixDirectory> TypeResolver for PrefixResolver<'a, D> {
    async fn resolve_type(&self, id: &str) -> Result<Option<String>, ServiceError> {
        let prefix = identifier::key_prefix(id);
        let Some(org) = self.directory.org_user().await? else {
            return Err(ServiceError::NotConfigured(self.program.clone()));
        };

        match self.storage.cached_type(&org, prefix) {
            Ok(Some(object_name)) => {
                tracing::debug!(prefix, object_name = %object_name, "prefix cache hit");
                return Ok(Some(object_name));
            }
            Ok(None) => tracing::debug!(prefix, "prefix cache miss"),
            Err(e) => tracing::warn!(error = %e, "prefix cache unreadable; querying"),
        }

        let Some(object_name) = self.directory.lookup_prefix(prefix).await? else {
            return Ok(None);
        };

        if let Err(e) = self.storage.cache_type(&org, prefix, &object_name) {
            tracing::warn!(error = %e, "failed to update prefix cache");
        }
        Ok(Some(object_name))
    }
}
