//! In-memory secret store for development and tests.
//!
//! Mirrors KV v2 semantics closely enough for the certificate store logic:
//! listing an empty or absent folder is "not found", reading or deleting an
//! absent secret is "not found", and folders exist only implicitly through
//! the secrets beneath them.

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::client::{SecretEntry, SecretStore};
use super::paths::FOLDER_SEPARATOR;
use crate::errors::{CertStoreError, Result};

/// Secret store backed by a sorted map of normalised paths.
///
/// Clones share the same underlying data.
#[derive(Debug, Clone, Default)]
pub struct InMemorySecretStore {
    secrets: Arc<RwLock<BTreeMap<String, SecretEntry>>>,
    failing_paths: Arc<RwLock<HashSet<String>>>,
}

fn key_for(path: &str) -> String {
    path.trim_matches(FOLDER_SEPARATOR).to_string()
}

impl InMemorySecretStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a secret, replacing any existing value.
    pub async fn insert<I, K, V>(&self, path: &str, fields: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let entry = fields.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        self.secrets.write().await.insert(key_for(path), entry);
    }

    /// Make every read and listing of `path` fail with a transport error.
    pub async fn fail_path(&self, path: &str) {
        self.failing_paths.write().await.insert(key_for(path));
    }

    /// Snapshot of the secret at `path`, if present.
    pub async fn get(&self, path: &str) -> Option<SecretEntry> {
        self.secrets.read().await.get(&key_for(path)).cloned()
    }

    /// Number of stored secrets.
    pub async fn len(&self) -> usize {
        self.secrets.read().await.len()
    }

    /// True when no secrets are stored.
    pub async fn is_empty(&self) -> bool {
        self.secrets.read().await.is_empty()
    }

    async fn check_failure(&self, path: &str) -> Result<()> {
        if self.failing_paths.read().await.contains(&key_for(path)) {
            return Err(CertStoreError::transport(format!(
                "simulated failure accessing '{}'",
                path
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl SecretStore for InMemorySecretStore {
    async fn read_secret(&self, path: &str) -> Result<SecretEntry> {
        self.check_failure(path).await?;
        self.secrets
            .read()
            .await
            .get(&key_for(path))
            .cloned()
            .ok_or_else(|| CertStoreError::not_found(format!("secret '{}'", path)))
    }

    async fn list_paths(&self, path: &str) -> Result<Vec<String>> {
        self.check_failure(path).await?;

        let folder = key_for(path);
        let prefix = if folder.is_empty() { String::new() } else { format!("{}/", folder) };

        let secrets = self.secrets.read().await;
        let children: BTreeSet<String> = secrets
            .keys()
            .filter_map(|key| key.strip_prefix(prefix.as_str()))
            .filter(|rest| !rest.is_empty())
            .map(|rest| match rest.split_once(FOLDER_SEPARATOR) {
                Some((folder, _)) => format!("{}/", folder),
                None => rest.to_string(),
            })
            .collect();

        if children.is_empty() {
            return Err(CertStoreError::not_found(format!("folder '{}'", path)));
        }
        Ok(children.into_iter().collect())
    }

    async fn write_secret(&self, path: &str, entry: &SecretEntry) -> Result<()> {
        self.secrets.write().await.insert(key_for(path), entry.clone());
        Ok(())
    }

    async fn delete_secret(&self, path: &str) -> Result<()> {
        self.secrets
            .write()
            .await
            .remove(&key_for(path))
            .map(|_| ())
            .ok_or_else(|| CertStoreError::not_found(format!("secret '{}'", path)))
    }
}
