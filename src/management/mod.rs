//! # Certificate Management
//!
//! Alias-scoped mutations against one store path. Each call loads its own
//! copy of the container, mutates it, serializes it and writes back only the
//! container field, so sibling fields (and the passphrase) are untouched.
//!
//! Writes are read-modify-write without locking: two concurrent mutations
//! of the same container race and the last write wins.

use std::sync::Arc;
use tracing::{info, Instrument};

use crate::config::StoreType;
use crate::containers::secret::new_container_fields;
use crate::containers::{BarePemEntry, CertificateMaterial, ContainerFormat, ContainerSecret};
use crate::errors::{CertStoreError, Result};
use crate::secrets::{paths, SecretStore, SecretString};

/// Applies add/remove/create to containers of one store type.
#[derive(Clone)]
pub struct MutationCoordinator {
    store: Arc<dyn SecretStore>,
    store_type: StoreType,
}

impl MutationCoordinator {
    pub fn new(store: Arc<dyn SecretStore>, store_type: StoreType) -> Self {
        Self { store, store_type }
    }

    pub fn store_type(&self) -> StoreType {
        self.store_type
    }

    fn container_format(&self) -> Result<ContainerFormat> {
        ContainerFormat::for_store_type(self.store_type)
    }

    /// Add (or replace) `alias` with the certificate material in `pfx_bytes`.
    ///
    /// # Errors
    ///
    /// - [`CertStoreError::Configuration`] for the PKI engine
    /// - [`CertStoreError::AuthContent`] when the upload is neither a PKCS#12
    ///   key container nor a certificate
    /// - [`CertStoreError::MissingField`] when a bare PEM store receives a
    ///   certificate without a key
    /// - store errors for the container secret
    pub async fn add(
        &self,
        store_path: &str,
        alias: &str,
        pfx_bytes: &[u8],
        pfx_password: &SecretString,
        include_chain: bool,
    ) -> Result<()> {
        let format = self.container_format()?;
        let span = crate::container_span!("add", store_path, alias = %alias, format = %format);

        async move {
            let material = CertificateMaterial::parse(pfx_bytes, pfx_password)?.with_chain(include_chain);

            if format == ContainerFormat::BarePem {
                let path = paths::join_path(store_path, alias);
                let fields = BarePemEntry::from_material(&material, &path)?.to_fields();
                self.store.write_secret(&path, &fields).await?;
                info!(path = %path, key = material.has_private_key(), "Wrote PEM certificate");
                return Ok(());
            }

            let mut container = ContainerSecret::read(self.store.as_ref(), store_path, self.store_type).await?;
            container.handle.put_entry(alias, &material)?;
            let update = container.field_update()?;
            self.store.patch_secret(&container.path, &update).await?;

            info!(
                path = %container.path,
                field = %container.field,
                key = material.has_private_key(),
                "Added certificate to container"
            );
            Ok(())
        }
        .instrument(span)
        .await
    }

    /// Remove `alias`. Removing an absent alias from a binary container
    /// succeeds without changing it.
    pub async fn remove(&self, store_path: &str, alias: &str) -> Result<()> {
        let format = self.container_format()?;
        let span = crate::container_span!("remove", store_path, alias = %alias, format = %format);

        async move {
            if format == ContainerFormat::BarePem {
                let path = paths::join_path(store_path, alias);
                self.store.delete_secret(&path).await?;
                info!(path = %path, "Deleted PEM certificate");
                return Ok(());
            }

            let mut container = ContainerSecret::read(self.store.as_ref(), store_path, self.store_type).await?;
            let removed = container.handle.delete_entry(alias);
            let update = container.field_update()?;
            self.store.patch_secret(&container.path, &update).await?;

            info!(path = %container.path, removed = removed, "Removed certificate from container");
            Ok(())
        }
        .instrument(span)
        .await
    }

    /// Create an empty container at `store_path`.
    ///
    /// Binary formats get a fresh random passphrase stored next to the blob.
    pub async fn create_container(&self, store_path: &str) -> Result<()> {
        let format = self.container_format()?;
        let span = crate::container_span!("create", store_path, format = %format);

        async move {
            let path = paths::secret_path(store_path).to_string();
            if path.is_empty() {
                return Err(CertStoreError::validation("a store path is required to create a container"));
            }

            let fields = match format {
                ContainerFormat::BarePem => BarePemEntry::blank_fields(),
                _ => new_container_fields(&path, self.store_type, &SecretString::generate_passphrase())?,
            };

            self.store.write_secret(&path, &fields).await?;
            info!(path = %path, "Created certificate store");
            Ok(())
        }
        .instrument(span)
        .await
    }
}
