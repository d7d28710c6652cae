//! Interpretation of incoming certificate material.
//!
//! Uploads arrive as PFX bytes plus a password. A PFX carrying a private key
//! becomes a key pair; anything else is retried as a bare certificate (DER or
//! PEM text) and stored without a key.

use p12_keystore::{KeyStore, KeyStoreEntry};
use tracing::debug;

use super::bridge::parse_certificate;
use super::pem;
use crate::errors::{CertStoreError, Result};
use crate::secrets::{SecretBytes, SecretString};

/// Certificate material ready to be placed into a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CertificateMaterial {
    /// PKCS#8 key with its chain, leaf first
    KeyPair { key: SecretBytes, chain: Vec<Vec<u8>> },
    /// Single DER certificate without a key
    CertificateOnly { certificate: Vec<u8> },
}

impl CertificateMaterial {
    /// Parse uploaded bytes.
    ///
    /// # Errors
    ///
    /// - [`CertStoreError::AuthContent`] when the bytes are neither a
    ///   PKCS#12 container readable with `password` nor a certificate
    pub fn parse(bytes: &[u8], password: &SecretString) -> Result<Self> {
        match KeyStore::from_pkcs12(bytes, password.expose_secret()) {
            Ok(keystore) => {
                if let Some((alias, chain)) = keystore.private_key_chain() {
                    debug!(source_alias = %alias, chain_len = chain.chain().len(), "Read key pair from PKCS#12 upload");
                    return Ok(Self::KeyPair {
                        key: SecretBytes::new(chain.key().to_vec()),
                        chain: chain.chain().iter().map(|c| c.as_der().to_vec()).collect(),
                    });
                }
                let certificate = keystore.entries().find_map(|(_, entry)| match entry {
                    KeyStoreEntry::Certificate(cert) => Some(cert.as_der().to_vec()),
                    KeyStoreEntry::PrivateKeyChain(_) => None,
                });
                if let Some(certificate) = certificate {
                    debug!("PKCS#12 upload holds no private key, storing certificate only");
                    return Ok(Self::CertificateOnly { certificate });
                }
            }
            Err(e) => debug!(error = %e, "Upload is not a readable PKCS#12 container"),
        }

        Self::parse_bare_certificate(bytes).map(|certificate| Self::CertificateOnly { certificate })
    }

    fn parse_bare_certificate(bytes: &[u8]) -> Result<Vec<u8>> {
        let der = match std::str::from_utf8(bytes) {
            Ok(text) if text.contains(pem::CERTIFICATE_HEADER) => {
                let first = pem::split_chain(text).into_iter().next().ok_or_else(|| {
                    CertStoreError::auth_content("PEM text holds no certificate block")
                })?;
                pem::decode(&first).map_err(|e| CertStoreError::auth_content(e.to_string()))?
            }
            _ => bytes.to_vec(),
        };

        parse_certificate(&der).map_err(|_| {
            CertStoreError::auth_content(
                "content is neither a PKCS#12 key container nor an X.509 certificate",
            )
        })?;
        Ok(der)
    }

    /// Drop everything past the leaf unless `include_chain` is set.
    pub fn with_chain(self, include_chain: bool) -> Self {
        match self {
            Self::KeyPair { key, mut chain } if !include_chain => {
                chain.truncate(1);
                Self::KeyPair { key, chain }
            }
            other => other,
        }
    }

    pub fn has_private_key(&self) -> bool {
        matches!(self, Self::KeyPair { .. })
    }

    /// Certificates, leaf first.
    pub fn certificates(&self) -> Vec<&[u8]> {
        match self {
            Self::KeyPair { chain, .. } => chain.iter().map(Vec::as_slice).collect(),
            Self::CertificateOnly { certificate } => vec![certificate.as_slice()],
        }
    }
}
