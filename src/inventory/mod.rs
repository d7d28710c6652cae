//! # Inventory
//!
//! Canonical certificate records for a configured store path.
//!
//! Bare PEM stores are scanned entry by entry (optionally through every
//! subfolder); binary stores are read once and every key-holding alias of
//! the container is reported. Per-entry problems are returned as warnings
//! next to whatever records could be built.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::StoreType;
use crate::containers::{pem, BarePemEntry, BarePemFields, ContainerEntry, ContainerSecret};
use crate::discovery::{SecretPathResolver, TreeWalk};
use crate::secrets::{paths, SecretStore};

/// Inventory status reported back to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InventoryStatus {
    #[default]
    Unknown,
}

/// One certificate entry as the host sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryRecord {
    pub alias: String,
    pub has_private_key: bool,
    /// PEM certificates, leaf first, in stored order
    pub certificates: Vec<String>,
    pub uses_chain: bool,
    pub status: InventoryStatus,
}

impl InventoryRecord {
    pub fn new(alias: impl Into<String>, has_private_key: bool, certificates: Vec<String>) -> Self {
        let uses_chain = certificates.len() > 1;
        Self {
            alias: alias.into(),
            has_private_key,
            certificates,
            uses_chain,
            status: InventoryStatus::Unknown,
        }
    }

    pub fn from_container_entry(alias: impl Into<String>, entry: &ContainerEntry) -> Self {
        let certificates = entry.certificate_chain.iter().map(|der| pem::encode(der)).collect();
        Self::new(alias, entry.has_key, certificates)
    }
}

/// Records (or `None` when the root itself was unreadable) plus warnings.
pub type InventoryResult = (Option<Vec<InventoryRecord>>, Vec<String>);

/// Builds inventory records from a secret store.
#[derive(Clone)]
pub struct InventoryAssembler {
    store: Arc<dyn SecretStore>,
    resolver: SecretPathResolver,
}

impl InventoryAssembler {
    pub fn new(store: Arc<dyn SecretStore>) -> Self {
        let resolver = SecretPathResolver::new(store.clone());
        Self { store, resolver }
    }

    /// Inventory the store at `root`.
    ///
    /// `include_subfolders` only affects bare PEM stores; binary stores are
    /// a single container secret.
    pub async fn assemble(
        &self,
        root: &str,
        store_type: StoreType,
        include_subfolders: bool,
    ) -> InventoryResult {
        let (records, warnings) = match store_type {
            StoreType::BarePem => self.assemble_bare_pem(root, include_subfolders).await,
            StoreType::JavaKeystore | StoreType::Pkcs12 | StoreType::Pfx => {
                self.assemble_container(root, store_type).await
            }
            StoreType::PkiEngine => {
                let message = format!(
                    "store type '{}' is inventoried through the PKI engine, not the KV store",
                    store_type
                );
                (None, vec![message])
            }
        };

        info!(
            root = %root,
            store_type = %store_type,
            records = records.as_ref().map(Vec::len),
            warnings = warnings.len(),
            "Inventory assembled"
        );
        (records, warnings)
    }

    async fn assemble_bare_pem(&self, root: &str, include_subfolders: bool) -> InventoryResult {
        let walk = if include_subfolders {
            self.resolver.walk(root).await
        } else {
            match self.resolver.list_children(root).await {
                Ok(listing) => TreeWalk { folders: vec![listing], warnings: Vec::new() },
                Err(e) => {
                    warn!(path = %root, error = %e, "Unable to list store path");
                    return (None, vec![format!("Unable to list '{}': {}", root, e)]);
                }
            }
        };

        let mut warnings = walk.warnings.clone();
        if walk.folder(root).is_none() {
            return (None, warnings);
        }

        let entries: Vec<String> = walk.entries().map(|(_, entry)| entry.clone()).collect();
        let mut records = Vec::new();

        for (path, result) in self.resolver.read_all(&entries).await {
            let fields = match result {
                Ok(fields) => fields,
                Err(e) => {
                    warn!(path = %path, error = %e, "Unable to read certificate secret");
                    warnings.push(format!("Unable to read '{}': {}", path, e));
                    continue;
                }
            };

            match BarePemEntry::from_fields(&fields) {
                BarePemFields::Complete(entry) => {
                    let certificates = pem::split_chain(&entry.certificate);
                    let alias = paths::relative_to(root, &path).to_string();
                    debug!(alias = %alias, certificates = certificates.len(), "Read PEM entry");
                    records.push(InventoryRecord::new(alias, true, certificates));
                }
                BarePemFields::Partial { missing } => {
                    warn!(path = %path, missing = %missing, "Skipping incomplete PEM entry");
                    warnings.push(format!("Secret '{}' is missing the '{}' field", path, missing));
                }
                BarePemFields::Empty => {
                    debug!(path = %path, "Skipping secret without certificate fields");
                }
            }
        }

        records.sort_by(|a, b| a.alias.cmp(&b.alias));
        (Some(records), warnings)
    }

    async fn assemble_container(&self, root: &str, store_type: StoreType) -> InventoryResult {
        let container = match ContainerSecret::read(self.store.as_ref(), root, store_type).await {
            Ok(container) => container,
            Err(e) => {
                warn!(path = %root, error = %e, "Unable to read certificate container");
                return (None, vec![format!("Unable to read container '{}': {}", root, e)]);
            }
        };

        let mut records = Vec::new();
        let mut warnings = Vec::new();
        for alias in container.handle.list_aliases() {
            match container.handle.get_entry(&alias) {
                Ok(entry) if entry.has_key => {
                    records.push(InventoryRecord::from_container_entry(alias, &entry));
                }
                Ok(_) => debug!(alias = %alias, "Skipping certificate-only alias"),
                Err(e) => {
                    warn!(alias = %alias, error = %e, "Unable to read container entry");
                    warnings.push(format!("Unable to read alias '{}': {}", alias, e));
                }
            }
        }
        (Some(records), warnings)
    }
}
