//! Binary containers as stored in a secret: a base64 blob field plus its
//! `passphrase` sibling.

use base64::Engine as _;

use super::{ContainerFormat, ContainerHandle};
use crate::config::{StoreType, PASSPHRASE_FIELD};
use crate::errors::{CertStoreError, Result};
use crate::secrets::{paths, SecretEntry, SecretStore, SecretString};

/// Name of the container field for a new container at `store_path`.
///
/// `None` for store types without a binary container.
pub fn container_field_name(store_path: &str, store_type: StoreType) -> Option<String> {
    match store_type {
        StoreType::BarePem | StoreType::PkiEngine => None,
        _ => store_type
            .discovery_suffix()
            .map(|suffix| format!("{}_{}", paths::last_segment(store_path), suffix)),
    }
}

/// Field of `entry` holding the container blob.
///
/// Prefers the name a created container would use, then any field carrying
/// the store type's suffix.
pub fn find_container_field<'a>(
    entry: &'a SecretEntry,
    store_path: &str,
    store_type: StoreType,
) -> Option<&'a str> {
    let suffix = store_type.discovery_suffix()?;
    if let Some(expected) = container_field_name(store_path, store_type) {
        if let Some((name, _)) = entry.get_key_value(expected.as_str()) {
            return Some(name.as_str());
        }
    }
    let mut candidates: Vec<&String> = entry.keys().filter(|name| name.ends_with(suffix)).collect();
    candidates.sort();
    candidates.first().map(|name| name.as_str())
}

/// A binary container read from the store.
#[derive(Debug)]
pub struct ContainerSecret {
    pub path: String,
    pub field: String,
    pub passphrase: SecretString,
    pub handle: ContainerHandle,
}

impl ContainerSecret {
    /// Read and load the container secret at `store_path`.
    ///
    /// # Errors
    ///
    /// - [`CertStoreError::NotFound`] or [`CertStoreError::Transport`] from the store
    /// - [`CertStoreError::MissingField`] when the container field or passphrase is absent
    /// - [`CertStoreError::Decode`] / [`CertStoreError::Format`] for unreadable blobs
    pub async fn read(
        store: &dyn SecretStore,
        store_path: &str,
        store_type: StoreType,
    ) -> Result<Self> {
        let format = ContainerFormat::for_store_type(store_type)?;
        let path = paths::secret_path(store_path).to_string();
        let entry = store.read_secret(&path).await?;

        let field = find_container_field(&entry, &path, store_type)
            .map(str::to_string)
            .ok_or_else(|| {
                let expected = container_field_name(&path, store_type).unwrap_or_default();
                CertStoreError::missing_field(expected, path.clone())
            })?;
        let passphrase = entry
            .get(PASSPHRASE_FIELD)
            .map(|p| SecretString::new(p.as_str()))
            .ok_or_else(|| CertStoreError::missing_field(PASSPHRASE_FIELD, path.clone()))?;

        let blob = entry.get(&field).map(String::as_str).unwrap_or_default();
        let bytes = base64::engine::general_purpose::STANDARD.decode(blob.trim())?;
        let handle = format.load(&bytes, &passphrase)?;

        Ok(Self { path, field, passphrase, handle })
    }

    /// Serialize the handle into the single field update to patch back.
    pub fn field_update(&self) -> Result<SecretEntry> {
        let bytes = self.handle.serialize(&self.passphrase)?;
        let mut update = SecretEntry::new();
        update.insert(self.field.clone(), base64::engine::general_purpose::STANDARD.encode(bytes));
        Ok(update)
    }
}

/// Fields of a freshly created binary container secret.
pub fn new_container_fields(
    store_path: &str,
    store_type: StoreType,
    passphrase: &SecretString,
) -> Result<SecretEntry> {
    let format = ContainerFormat::for_store_type(store_type)?;
    let field = container_field_name(store_path, store_type).ok_or_else(|| {
        CertStoreError::configuration(format!("store type '{}' has no container blob", store_type))
    })?;
    let bytes = format.create_empty(passphrase)?;

    let mut fields = SecretEntry::new();
    fields.insert(field, base64::engine::general_purpose::STANDARD.encode(bytes));
    fields.insert(PASSPHRASE_FIELD.to_string(), passphrase.expose_secret().to_string());
    Ok(fields)
}
