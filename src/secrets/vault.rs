//! HashiCorp Vault KV v2 secret store.
//!
//! Implements [`SecretStore`] over Vault's KV v2 engine using `vaultrs`.
//! The client is assumed to be pre-authenticated with a token; namespace and
//! mount point come from the store configuration.
//!
//! # Example
//!
//! ```rust,ignore
//! use vault_certstore::secrets::{VaultKvConfig, VaultKvStore};
//!
//! let store = VaultKvStore::new(VaultKvConfig {
//!     address: "https://vault.example.com:8200".to_string(),
//!     token: Some("hvs.example".into()),
//!     namespace: None,
//!     mount_point: "kv".to_string(),
//! })?;
//! let entry = store.read_secret("certs/web1").await?;
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error};
use vaultrs::client::{VaultClient, VaultClientSettingsBuilder};
use vaultrs::error::ClientError;
use vaultrs::kv2;

use super::client::{SecretEntry, SecretStore};
use super::paths::FOLDER_SEPARATOR;
use super::types::SecretString;
use crate::errors::{CertStoreError, Result};

/// Connection settings for a Vault KV v2 mount.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultKvConfig {
    /// Vault server address (e.g., "https://vault.example.com:8200")
    pub address: String,

    /// Vault authentication token
    pub token: Option<SecretString>,

    /// Vault namespace (for Enterprise multi-tenancy)
    pub namespace: Option<String>,

    /// KV v2 mount point (default: "secret")
    #[serde(default = "default_mount_point")]
    pub mount_point: String,
}

pub(crate) fn default_mount_point() -> String {
    "secret".to_string()
}

impl Default for VaultKvConfig {
    fn default() -> Self {
        Self {
            address: "http://127.0.0.1:8200".to_string(),
            token: None,
            namespace: None,
            mount_point: default_mount_point(),
        }
    }
}

/// Secret store backed by a Vault KV v2 mount.
pub struct VaultKvStore {
    client: Arc<VaultClient>,
    mount_point: String,
}

impl std::fmt::Debug for VaultKvStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultKvStore")
            .field("mount_point", &self.mount_point)
            .field("client", &"[VaultClient]")
            .finish()
    }
}

impl VaultKvStore {
    /// Build a client for the given mount.
    ///
    /// # Errors
    ///
    /// - [`CertStoreError::Configuration`] if the address is empty or the
    ///   client settings are invalid
    pub fn new(config: VaultKvConfig) -> Result<Self> {
        if config.address.is_empty() {
            return Err(CertStoreError::configuration("Vault address cannot be empty"));
        }

        let mut settings_builder = VaultClientSettingsBuilder::default();
        settings_builder.address(&config.address);

        if let Some(ref token) = config.token {
            settings_builder.token(token.expose_secret());
        }

        if let Some(namespace) = config.namespace.clone() {
            settings_builder.namespace(Some(namespace));
        }

        let settings = settings_builder.build().map_err(|e| {
            CertStoreError::configuration(format!("Invalid Vault configuration: {}", e))
        })?;

        let client = VaultClient::new(settings).map_err(|e| {
            CertStoreError::configuration(format!("Failed to create Vault client: {}", e))
        })?;

        debug!(
            address = %config.address,
            mount_point = %config.mount_point,
            namespace = ?config.namespace,
            "Initialized Vault KV store"
        );

        Ok(Self { client: Arc::new(client), mount_point: config.mount_point })
    }

    /// Shared handle to the underlying Vault client.
    pub fn client(&self) -> Arc<VaultClient> {
        Arc::clone(&self.client)
    }

    /// KV v2 mount point this store reads from.
    pub fn mount_point(&self) -> &str {
        &self.mount_point
    }
}

/// Vault paths are relative to the mount; strip any leading separator.
fn vault_path(path: &str) -> &str {
    path.trim_start_matches(FOLDER_SEPARATOR)
}

/// Map a vaultrs error to the store taxonomy: HTTP 404 is "not found",
/// anything else is a transport failure.
pub(crate) fn map_client_error(err: ClientError, what: &str) -> CertStoreError {
    match err {
        ClientError::APIError { code: 404, .. } => CertStoreError::not_found(what.to_string()),
        other => CertStoreError::transport(format!("{}: {}", what, other)),
    }
}

/// KV values may be any JSON type; certificate fields are always strings,
/// other scalars are kept in their JSON text form.
fn stringify_fields(data: HashMap<String, serde_json::Value>) -> SecretEntry {
    data.into_iter()
        .map(|(k, v)| {
            let value = match v {
                serde_json::Value::String(s) => s,
                serde_json::Value::Null => String::new(),
                other => other.to_string(),
            };
            (k, value)
        })
        .collect()
}

#[async_trait]
impl SecretStore for VaultKvStore {
    async fn read_secret(&self, path: &str) -> Result<SecretEntry> {
        let data: HashMap<String, serde_json::Value> =
            kv2::read(self.client.as_ref(), &self.mount_point, vault_path(path)).await.map_err(|e| {
                debug!(path = %path, error = %e, "Failed to read secret from Vault");
                map_client_error(e, &format!("secret '{}'", path))
            })?;
        Ok(stringify_fields(data))
    }

    async fn list_paths(&self, path: &str) -> Result<Vec<String>> {
        kv2::list(self.client.as_ref(), &self.mount_point, vault_path(path)).await.map_err(|e| {
            debug!(path = %path, error = %e, "Failed to list Vault path");
            map_client_error(e, &format!("folder '{}'", path))
        })
    }

    async fn write_secret(&self, path: &str, entry: &SecretEntry) -> Result<()> {
        kv2::set(self.client.as_ref(), &self.mount_point, vault_path(path), entry).await.map_err(|e| {
            error!(path = %path, error = %e, "Failed to write secret to Vault");
            map_client_error(e, &format!("secret '{}'", path))
        })?;
        debug!(path = %path, fields = entry.len(), "Wrote secret to Vault");
        Ok(())
    }

    /// Soft-deletes the latest version. Vault answers a delete of an absent
    /// path with 204, so existence is checked with a read first.
    async fn delete_secret(&self, path: &str) -> Result<()> {
        if self.try_read_secret(path).await?.is_none() {
            return Err(CertStoreError::not_found(format!("secret '{}'", path)));
        }

        kv2::delete_latest(self.client.as_ref(), &self.mount_point, vault_path(path)).await.map_err(|e| {
            error!(path = %path, error = %e, "Failed to delete secret from Vault");
            map_client_error(e, &format!("secret '{}'", path))
        })?;
        debug!(path = %path, "Deleted latest secret version from Vault");
        Ok(())
    }
}
