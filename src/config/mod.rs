//! # Configuration Management
//!
//! Store type tags and the job configuration the host passes for each
//! certificate store.

pub mod settings;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::CertStoreError;

pub use settings::StoreConfig;

/// Field holding a container's decryption passphrase, next to the container field.
pub const PASSPHRASE_FIELD: &str = "passphrase";

/// Certificate field of a bare PEM secret (also its discovery suffix).
pub const CERTIFICATE_FIELD: &str = "certificate";

/// Private key field of a bare PEM secret.
pub const PRIVATE_KEY_FIELD: &str = "private_key";

/// Kind of certificate store at a configured path.
///
/// Selects both the physical encoding and the field-name suffix used to find
/// containers during discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum StoreType {
    /// One secret per alias with `certificate` and `private_key` PEM fields
    BarePem,
    /// Java keystore blob (base64) plus passphrase
    JavaKeystore,
    /// PKCS#12 blob (base64) plus passphrase
    Pkcs12,
    /// PFX blob (base64) plus passphrase
    Pfx,
    /// Vault PKI secrets engine, no containers
    PkiEngine,
}

impl StoreType {
    /// Canonical name used in configuration and CLI flags.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BarePem => "pem",
            Self::JavaKeystore => "jks",
            Self::Pkcs12 => "pkcs12",
            Self::Pfx => "pfx",
            Self::PkiEngine => "pki",
        }
    }

    /// Host capability tag for this store type.
    pub fn capability(&self) -> &'static str {
        match self {
            Self::BarePem => "HCVKVPEM",
            Self::JavaKeystore => "HCVKVJKS",
            Self::Pkcs12 => "HCVKVP12",
            Self::Pfx => "HCVKVPFX",
            Self::PkiEngine => "HCVPKI",
        }
    }

    /// Field-name suffix that marks a container of this type.
    ///
    /// `None` for the PKI engine, which has no containers.
    pub fn discovery_suffix(&self) -> Option<&'static str> {
        match self {
            Self::BarePem => Some(CERTIFICATE_FIELD),
            Self::JavaKeystore => Some("jks-contents"),
            Self::Pkcs12 => Some("p12-contents"),
            Self::Pfx => Some("pfx-contents"),
            Self::PkiEngine => None,
        }
    }

    /// All store types, in declaration order.
    pub fn all() -> [StoreType; 5] {
        [Self::BarePem, Self::JavaKeystore, Self::Pkcs12, Self::Pfx, Self::PkiEngine]
    }
}

impl FromStr for StoreType {
    type Err = CertStoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_ascii_lowercase();
        match tag.as_str() {
            "pem" | "bare_pem" | "hcvkvpem" => Ok(Self::BarePem),
            "jks" | "java_keystore" | "hcvkvjks" => Ok(Self::JavaKeystore),
            "pkcs12" | "p12" | "hcvkvp12" => Ok(Self::Pkcs12),
            "pfx" | "hcvkvpfx" => Ok(Self::Pfx),
            "pki" | "pki_engine" | "hcvpki" => Ok(Self::PkiEngine),
            _ => Err(CertStoreError::configuration(format!("Unknown store type: {}", s))),
        }
    }
}

impl TryFrom<String> for StoreType {
    type Error = CertStoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<StoreType> for String {
    fn from(value: StoreType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for StoreType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
