//! Conversion between Java keystores and PKCS#12 keystores.
//!
//! Java keystores are manipulated through the PKCS#12 model: loading converts
//! the native entries into a [`KeyStore`], and serializing converts back.

use p12_keystore::{Certificate, KeyStore, KeyStoreEntry, PrivateKeyChain};
use sha1::{Digest, Sha1};
use tracing::debug;

use super::jks::{JksEntry, JksKeystore};
use crate::errors::{CertStoreError, Result};
use crate::secrets::{SecretBytes, SecretString};

/// PKCS#12 `localKeyId` pairing a key bag with its leaf certificate bag.
pub(crate) fn local_key_id(leaf_der: &[u8]) -> Vec<u8> {
    Sha1::digest(leaf_der).to_vec()
}

pub(crate) fn parse_certificate(der: &[u8]) -> Result<Certificate> {
    Certificate::from_der(der)
        .map_err(|e| CertStoreError::format("X.509", format!("invalid certificate: {}", e)))
}

/// Build a key entry; an empty chain cannot survive a PKCS#12 round trip.
pub(crate) fn key_chain_entry(key: &[u8], chain: &[Vec<u8>]) -> Result<KeyStoreEntry> {
    let leaf = chain
        .first()
        .ok_or_else(|| CertStoreError::validation("a private key entry needs at least one certificate"))?;
    let certs = chain.iter().map(|der| parse_certificate(der)).collect::<Result<Vec<_>>>()?;
    Ok(KeyStoreEntry::PrivateKeyChain(PrivateKeyChain::new(key, local_key_id(leaf), certs)))
}

/// Convert a Java keystore into a PKCS#12 keystore.
///
/// The converted store is written with `passphrase` and parsed again before
/// it is returned, so callers see exactly what a later serialize will keep.
pub fn to_pkcs12(jks: &JksKeystore, passphrase: &SecretString) -> Result<KeyStore> {
    let mut keystore = KeyStore::new();

    for (alias, entry) in jks.entries() {
        let converted = match entry {
            JksEntry::PrivateKey { key, chain, .. } => key_chain_entry(key.expose_secret(), chain)?,
            JksEntry::TrustedCertificate { certificate, .. } => {
                KeyStoreEntry::Certificate(parse_certificate(certificate)?)
            }
        };
        keystore.add_entry(alias, converted);
    }

    let bytes = keystore.writer(passphrase.expose_secret()).write()?;
    let reloaded = KeyStore::from_pkcs12(&bytes, passphrase.expose_secret())?;

    debug!(entries = jks.len(), "Converted Java keystore to PKCS#12");
    Ok(reloaded)
}

/// Convert a PKCS#12 keystore into a Java keystore.
pub fn from_pkcs12(keystore: &KeyStore) -> JksKeystore {
    let created_ms = chrono::Utc::now().timestamp_millis().max(0) as u64;
    let mut jks = JksKeystore::new();

    for (alias, entry) in keystore.entries() {
        let converted = match entry {
            KeyStoreEntry::PrivateKeyChain(chain) => JksEntry::PrivateKey {
                created_ms,
                key: SecretBytes::new(chain.key().to_vec()),
                chain: chain.chain().iter().map(|c| c.as_der().to_vec()).collect(),
            },
            KeyStoreEntry::Certificate(cert) => {
                JksEntry::TrustedCertificate { created_ms, certificate: cert.as_der().to_vec() }
            }
        };
        jks.insert(alias, converted);
    }
    jks
}
