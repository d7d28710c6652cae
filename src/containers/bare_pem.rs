//! Bare PEM stores: one secret per alias holding `certificate` and
//! `private_key` as PEM text.

use super::ingest::CertificateMaterial;
use super::pem;
use crate::config::{CERTIFICATE_FIELD, PRIVATE_KEY_FIELD};
use crate::errors::{CertStoreError, Result};
use crate::secrets::SecretEntry;

/// PEM fields for one alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarePemEntry {
    /// Newline-joined PEM certificates, leaf first
    pub certificate: String,
    /// PKCS#8 `PRIVATE KEY` PEM
    pub private_key: Option<String>,
}

/// How a bare PEM secret's fields line up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BarePemFields {
    /// Both fields present and non-blank
    Complete(BarePemEntry),
    /// Only one of the two fields present; names the missing one
    Partial { missing: &'static str },
    /// Neither field present
    Empty,
}

impl BarePemEntry {
    /// Build the PEM fields for `material`.
    ///
    /// # Errors
    ///
    /// - [`CertStoreError::MissingField`] for certificate-only material;
    ///   bare PEM secrets always carry a key
    pub fn from_material(material: &CertificateMaterial, path: &str) -> Result<Self> {
        match material {
            CertificateMaterial::KeyPair { key, chain } => Ok(Self {
                certificate: pem::join_chain(&chain.iter().map(|der| pem::encode(der)).collect::<Vec<_>>()),
                private_key: Some(pem::encode_private_key(key.expose_secret())),
            }),
            CertificateMaterial::CertificateOnly { .. } => {
                Err(CertStoreError::missing_field(PRIVATE_KEY_FIELD, path))
            }
        }
    }

    /// Classify the fields of a secret. Blank values count as absent.
    pub fn from_fields(fields: &SecretEntry) -> BarePemFields {
        let present = |name: &str| {
            fields.get(name).map(|v| v.trim()).filter(|v| !v.is_empty()).map(str::to_string)
        };

        match (present(CERTIFICATE_FIELD), present(PRIVATE_KEY_FIELD)) {
            (Some(certificate), Some(private_key)) => {
                BarePemFields::Complete(Self { certificate, private_key: Some(private_key) })
            }
            (Some(_), None) => BarePemFields::Partial { missing: PRIVATE_KEY_FIELD },
            (None, Some(_)) => BarePemFields::Partial { missing: CERTIFICATE_FIELD },
            (None, None) => BarePemFields::Empty,
        }
    }

    /// Fields of a store created before any certificate is added.
    pub fn blank_fields() -> SecretEntry {
        [CERTIFICATE_FIELD, PRIVATE_KEY_FIELD].into_iter().map(|f| (f.to_string(), String::new())).collect()
    }

    /// Secret fields for this entry.
    pub fn to_fields(&self) -> SecretEntry {
        let mut fields = SecretEntry::new();
        fields.insert(CERTIFICATE_FIELD.to_string(), self.certificate.clone());
        fields.insert(PRIVATE_KEY_FIELD.to_string(), self.private_key.clone().unwrap_or_default());
        fields
    }

    /// DER certificates in stored order.
    pub fn certificate_chain(&self) -> Result<Vec<Vec<u8>>> {
        pem::split_chain(&self.certificate).iter().map(|block| pem::decode(block)).collect()
    }
}
