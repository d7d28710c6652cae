//! Core secret store trait.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::errors::{CertStoreError, Result};

/// Raw key-value unit stored at one secret path.
///
/// Depending on the configured store type this is either a bare PEM pair
/// (`certificate`, `private_key`) or a base64 container blob plus its
/// `passphrase`.
pub type SecretEntry = HashMap<String, String>;

/// Hierarchical key-value secret store addressed by slash-delimited paths.
///
/// Listing returns child names relative to the listed folder; names ending
/// in `/` are subfolders. Paths may be given with or without a leading `/`.
///
/// # Example Implementation
///
/// ```rust,ignore
/// use vault_certstore::secrets::{SecretEntry, SecretStore};
/// use vault_certstore::Result;
/// use async_trait::async_trait;
///
/// struct ReadOnlyStore;
///
/// #[async_trait]
/// impl SecretStore for ReadOnlyStore {
///     async fn read_secret(&self, path: &str) -> Result<SecretEntry> { todo!() }
///     async fn list_paths(&self, path: &str) -> Result<Vec<String>> { todo!() }
///     async fn write_secret(&self, path: &str, entry: &SecretEntry) -> Result<()> { todo!() }
///     async fn delete_secret(&self, path: &str) -> Result<()> { todo!() }
/// }
/// ```
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Read every field of the secret at `path`.
    ///
    /// # Errors
    ///
    /// - [`CertStoreError::NotFound`] if no secret exists at `path`
    /// - [`CertStoreError::Transport`] for any other store failure
    async fn read_secret(&self, path: &str) -> Result<SecretEntry>;

    /// List the immediate children of the folder at `path`.
    ///
    /// # Errors
    ///
    /// - [`CertStoreError::NotFound`] if the folder is empty or absent
    /// - [`CertStoreError::Transport`] for any other store failure
    async fn list_paths(&self, path: &str) -> Result<Vec<String>>;

    /// Replace the secret at `path` with `entry` (full overwrite).
    async fn write_secret(&self, path: &str, entry: &SecretEntry) -> Result<()>;

    /// Update only the given fields of an existing secret, preserving the rest.
    ///
    /// The default implementation reads, merges and writes back. It is not
    /// atomic: a concurrent writer between the read and the write loses.
    ///
    /// # Errors
    ///
    /// - [`CertStoreError::NotFound`] if no secret exists at `path`
    async fn patch_secret(&self, path: &str, fields: &SecretEntry) -> Result<()> {
        let mut current = self.read_secret(path).await?;
        current.extend(fields.iter().map(|(k, v)| (k.clone(), v.clone())));
        self.write_secret(path, &current).await
    }

    /// Delete the secret at `path`.
    ///
    /// # Errors
    ///
    /// - [`CertStoreError::NotFound`] if the store reports the secret absent
    async fn delete_secret(&self, path: &str) -> Result<()>;

    /// Read a secret, mapping "not found" to `None`.
    async fn try_read_secret(&self, path: &str) -> Result<Option<SecretEntry>> {
        match self.read_secret(path).await {
            Ok(entry) => Ok(Some(entry)),
            Err(CertStoreError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
