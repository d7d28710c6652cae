//! # Certificate Containers
//!
//! Uniform operations over the physical container encodings a store may
//! use. Every binary format supports the same cycle: load (or create
//! empty), list aliases, read/put/delete an entry, serialize.
//!
//! Java keystores are manipulated through the PKCS#12 model. A blob tagged
//! as a Java keystore that turns out to be PKCS#12 is still accepted; the
//! handle remembers this and keeps writing PKCS#12.
//!
//! Bare PEM stores have no blob: each alias is its own secret, read and
//! written through [`BarePemEntry`].

pub mod bare_pem;
pub mod bridge;
pub mod ingest;
pub mod jks;
pub mod pem;
pub mod secret;

use p12_keystore::{KeyStore, KeyStoreEntry};
use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fmt;
use tracing::{debug, warn};

use crate::config::StoreType;
use crate::errors::{CertStoreError, Result};
use crate::secrets::SecretString;

pub use bare_pem::{BarePemEntry, BarePemFields};
pub use ingest::CertificateMaterial;
pub use jks::{JksEntry, JksKeystore};
pub use secret::ContainerSecret;

/// Physical container encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerFormat {
    BarePem,
    JavaKeystore,
    Pkcs12,
    Pfx,
}

/// Key flag and certificates of one alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerEntry {
    pub has_key: bool,
    /// DER certificates, leaf first
    pub certificate_chain: Vec<Vec<u8>>,
}

/// Loaded state of one binary container.
pub struct ContainerHandle {
    format: ContainerFormat,
    alternate_format: bool,
    keystore: KeyStore,
}

impl fmt::Debug for ContainerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerHandle")
            .field("format", &self.format)
            .field("alternate_format", &self.alternate_format)
            .field("aliases", &self.list_aliases())
            .finish()
    }
}

impl ContainerFormat {
    /// Container format behind a store type.
    ///
    /// # Errors
    ///
    /// - [`CertStoreError::Configuration`] for the PKI engine, which has no
    ///   containers
    pub fn for_store_type(store_type: StoreType) -> Result<Self> {
        match store_type {
            StoreType::BarePem => Ok(Self::BarePem),
            StoreType::JavaKeystore => Ok(Self::JavaKeystore),
            StoreType::Pkcs12 => Ok(Self::Pkcs12),
            StoreType::Pfx => Ok(Self::Pfx),
            StoreType::PkiEngine => Err(CertStoreError::configuration(format!(
                "store type '{}' has no certificate container",
                store_type
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::BarePem => "PEM",
            Self::JavaKeystore => "JKS",
            Self::Pkcs12 => "PKCS12",
            Self::Pfx => "PFX",
        }
    }

    /// True for formats stored as one encoded blob in a container field.
    pub fn is_binary(&self) -> bool {
        !matches!(self, Self::BarePem)
    }

    fn no_blob(&self, operation: &str) -> CertStoreError {
        CertStoreError::not_supported(operation, StoreType::BarePem.as_str())
    }

    /// Bytes of an empty container protected with `passphrase`.
    ///
    /// # Errors
    ///
    /// - [`CertStoreError::NotSupported`] for bare PEM, which has no blob
    pub fn create_empty(&self, passphrase: &SecretString) -> Result<Vec<u8>> {
        match self {
            Self::BarePem => Err(self.no_blob("create an empty container blob")),
            Self::JavaKeystore => JksKeystore::new().to_bytes(passphrase),
            Self::Pkcs12 | Self::Pfx => Ok(KeyStore::new().writer(passphrase.expose_secret()).write()?),
        }
    }

    /// Parse container bytes.
    ///
    /// # Errors
    ///
    /// - [`CertStoreError::Format`] when the bytes are not a valid container
    ///   of this format (for Java keystores, nor a PKCS#12 archive)
    /// - [`CertStoreError::NotSupported`] for bare PEM
    pub fn load(&self, bytes: &[u8], passphrase: &SecretString) -> Result<ContainerHandle> {
        let (keystore, alternate_format) = match self {
            Self::BarePem => return Err(self.no_blob("load a container blob")),
            Self::Pkcs12 | Self::Pfx => (self.load_pkcs12(bytes, passphrase)?, false),
            Self::JavaKeystore => match JksKeystore::parse(bytes, passphrase) {
                Ok(jks) => (bridge::to_pkcs12(&jks, passphrase)?, false),
                Err(jks_error) => {
                    debug!(error = %jks_error, "Not a native Java keystore, retrying as PKCS#12");
                    let keystore = KeyStore::from_pkcs12(bytes, passphrase.expose_secret())
                        .map_err(|_| jks_error)?;
                    warn!("Java keystore container holds PKCS#12 data, keeping PKCS#12 encoding");
                    (keystore, true)
                }
            },
        };

        Ok(ContainerHandle { format: *self, alternate_format, keystore })
    }

    fn load_pkcs12(&self, bytes: &[u8], passphrase: &SecretString) -> Result<KeyStore> {
        KeyStore::from_pkcs12(bytes, passphrase.expose_secret())
            .map_err(|e| CertStoreError::format(self.name(), e.to_string()))
    }
}

impl fmt::Display for ContainerFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl ContainerHandle {
    pub fn format(&self) -> ContainerFormat {
        self.format
    }

    /// True when a Java keystore container was read as PKCS#12.
    pub fn is_alternate_format(&self) -> bool {
        self.alternate_format
    }

    /// Native Java keystores fold aliases to lowercase.
    fn alias_key<'a>(&self, alias: &'a str) -> Cow<'a, str> {
        if self.format == ContainerFormat::JavaKeystore && !self.alternate_format {
            Cow::Owned(jks::normalize_alias(alias))
        } else {
            Cow::Borrowed(alias)
        }
    }

    pub fn list_aliases(&self) -> BTreeSet<String> {
        self.keystore.entries().map(|(alias, _)| alias.clone()).collect()
    }

    /// # Errors
    ///
    /// - [`CertStoreError::NotFound`] if `alias` is absent
    pub fn get_entry(&self, alias: &str) -> Result<ContainerEntry> {
        let entry = self
            .keystore
            .entry(&self.alias_key(alias))
            .ok_or_else(|| CertStoreError::not_found(format!("alias '{}'", alias)))?;

        Ok(match entry {
            KeyStoreEntry::PrivateKeyChain(chain) => ContainerEntry {
                has_key: true,
                certificate_chain: chain.chain().iter().map(|c| c.as_der().to_vec()).collect(),
            },
            KeyStoreEntry::Certificate(cert) => {
                ContainerEntry { has_key: false, certificate_chain: vec![cert.as_der().to_vec()] }
            }
        })
    }

    /// Store `material` under `alias`, replacing any existing entry.
    pub fn put_entry(&mut self, alias: &str, material: &CertificateMaterial) -> Result<()> {
        let entry = match material {
            CertificateMaterial::KeyPair { key, chain } => bridge::key_chain_entry(key.expose_secret(), chain)?,
            CertificateMaterial::CertificateOnly { certificate } => {
                KeyStoreEntry::Certificate(bridge::parse_certificate(certificate)?)
            }
        };

        self.delete_entry(alias);
        let key = self.alias_key(alias).into_owned();
        self.keystore.add_entry(&key, entry);
        debug!(alias = %key, format = %self.format, key = material.has_private_key(), "Put container entry");
        Ok(())
    }

    /// Remove `alias`; returns whether it was present.
    pub fn delete_entry(&mut self, alias: &str) -> bool {
        let key = self.alias_key(alias).into_owned();
        self.keystore.delete_entry(&key).is_some()
    }

    /// Encode the container with `passphrase`.
    pub fn serialize(&self, passphrase: &SecretString) -> Result<Vec<u8>> {
        if self.format == ContainerFormat::JavaKeystore && !self.alternate_format {
            return bridge::from_pkcs12(&self.keystore).to_bytes(passphrase);
        }
        Ok(self.keystore.writer(passphrase.expose_secret()).write()?)
    }
}
