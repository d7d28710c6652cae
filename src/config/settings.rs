//! # Store Configuration
//!
//! Job configuration for one certificate store, as supplied by the host's
//! property map or by environment variables.

use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

use super::StoreType;
use crate::errors::{CertStoreError, Result};
use crate::secrets::paths::normalize_store_path;
use crate::secrets::vault::default_mount_point;
use crate::secrets::{SecretString, VaultKvConfig};

/// Configuration for a single certificate store job.
///
/// Field names follow the host property names (`StorePath`, `MountPoint`,
/// `SubfolderInventory`, ...). Booleans are accepted as JSON booleans or as
/// the strings `"true"` / `"false"`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "PascalCase")]
pub struct StoreConfig {
    /// Folder (BarePem) or container secret path; normalised to one trailing slash
    #[serde(default)]
    pub store_path: String,

    /// KV v2 mount point (or PKI mount for the PKI engine)
    #[serde(default = "default_mount_point")]
    #[validate(length(min = 1, message = "Mount point cannot be empty"))]
    pub mount_point: String,

    /// Vault Enterprise namespace
    #[serde(default)]
    pub namespace: Option<String>,

    /// Walk subfolders of the store path during inventory
    #[serde(default, deserialize_with = "flexible_bool")]
    pub subfolder_inventory: bool,

    /// Store the full chain on add instead of the leaf only
    #[serde(default, deserialize_with = "flexible_bool")]
    pub include_cert_chain: bool,

    /// Which container encoding the store uses
    pub store_type: StoreType,

    /// Vault server address
    #[serde(default = "default_vault_server_url")]
    #[validate(length(min = 1, message = "Vault server URL cannot be empty"))]
    pub vault_server_url: String,

    /// Vault token (redacted when serialized)
    #[serde(default)]
    pub vault_token: Option<SecretString>,
}

fn default_vault_server_url() -> String {
    "http://127.0.0.1:8200".to_string()
}

fn flexible_bool<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolOrString {
        Bool(bool),
        Text(String),
        Null(()),
    }

    match BoolOrString::deserialize(deserializer)? {
        BoolOrString::Bool(b) => Ok(b),
        BoolOrString::Null(()) => Ok(false),
        BoolOrString::Text(s) => parse_bool(&s).map_err(serde::de::Error::custom),
    }
}

fn parse_bool(value: &str) -> std::result::Result<bool, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" | "" => Ok(false),
        other => Err(format!("invalid boolean value '{}'", other)),
    }
}

impl StoreConfig {
    /// Minimal configuration for a store type and path, other fields defaulted.
    pub fn new(store_type: StoreType, store_path: &str) -> Self {
        Self {
            store_path: normalize_store_path(store_path),
            mount_point: default_mount_point(),
            namespace: None,
            subfolder_inventory: false,
            include_cert_chain: false,
            store_type,
            vault_server_url: default_vault_server_url(),
            vault_token: None,
        }
    }

    /// Parse the host's JSON property map.
    ///
    /// # Errors
    ///
    /// - [`CertStoreError::Configuration`] for unknown store types or failed validation
    pub fn from_properties(json: &str) -> Result<Self> {
        let mut config: StoreConfig = serde_json::from_str(json).map_err(|e| {
            CertStoreError::configuration(format!("Invalid store properties: {}", e))
        })?;
        config.store_path = normalize_store_path(&config.store_path);
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables.
    ///
    /// Reads:
    /// - `VAULT_ADDR`: Vault server address
    /// - `VAULT_TOKEN`: Authentication token
    /// - `VAULT_NAMESPACE`: Optional namespace
    /// - `VAULT_MOUNT_PATH`: Optional mount point (default: "secret")
    /// - `CERTSTORE_STORE_TYPE`: Store type tag (required)
    /// - `CERTSTORE_STORE_PATH`: Store path (default: root)
    /// - `CERTSTORE_SUBFOLDER_INVENTORY`: Walk subfolders (default: false)
    /// - `CERTSTORE_INCLUDE_CERT_CHAIN`: Store full chains on add (default: false)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`StoreConfig::from_env`], reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let store_type: StoreType = lookup("CERTSTORE_STORE_TYPE")
            .ok_or_else(|| {
                CertStoreError::configuration("CERTSTORE_STORE_TYPE environment variable not set")
            })?
            .parse()?;

        let mut config = Self::new(store_type, &lookup("CERTSTORE_STORE_PATH").unwrap_or_default());

        if let Some(address) = lookup("VAULT_ADDR") {
            config.vault_server_url = address;
        }
        config.vault_token = lookup("VAULT_TOKEN").map(SecretString::new);
        config.namespace = lookup("VAULT_NAMESPACE").filter(|ns| !ns.is_empty());
        if let Some(mount) = lookup("VAULT_MOUNT_PATH") {
            config.mount_point = mount;
        }
        config.subfolder_inventory = lookup_bool(&lookup, "CERTSTORE_SUBFOLDER_INVENTORY")?;
        config.include_cert_chain = lookup_bool(&lookup, "CERTSTORE_INCLUDE_CERT_CHAIN")?;

        config.validate()?;
        Ok(config)
    }

    /// Validate field constraints.
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self)?;
        Ok(())
    }

    /// Connection settings for the configured KV mount.
    pub fn vault_kv_config(&self) -> VaultKvConfig {
        VaultKvConfig {
            address: self.vault_server_url.clone(),
            token: self.vault_token.clone(),
            namespace: self.namespace.clone(),
            mount_point: self.mount_point.clone(),
        }
    }
}

fn lookup_bool<F>(lookup: &F, name: &str) -> Result<bool>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(value) => parse_bool(&value)
            .map_err(|e| CertStoreError::configuration(format!("{}: {}", name, e))),
        None => Ok(false),
    }
}
