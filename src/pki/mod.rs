//! # PKI Secrets Engine
//!
//! Inventory for stores backed by Vault's PKI engine instead of KV
//! containers. Certificates are listed by serial; the engine never hands out
//! private keys, so every record is certificate-only.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};
use vaultrs::client::VaultClient;
use vaultrs::error::ClientError;

use crate::containers::pem;
use crate::errors::Result;
use crate::inventory::{InventoryRecord, InventoryResult};
use crate::secrets::VaultKvStore;

/// One issued certificate as the engine reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedCertificate {
    pub serial: String,
    pub certificate_pem: String,
    pub revoked: bool,
}

/// Read access to issued certificates.
#[async_trait]
pub trait IssuedCertificateSource: Send + Sync {
    async fn list_serials(&self) -> Result<Vec<String>>;
    async fn read_certificate(&self, serial: &str) -> Result<IssuedCertificate>;
}

/// Vault PKI engine client.
pub struct PkiEngineClient {
    client: Arc<VaultClient>,
    mount: String,
}

impl PkiEngineClient {
    pub fn new(client: Arc<VaultClient>, mount: impl Into<String>) -> Self {
        Self { client, mount: mount.into() }
    }

    /// Share the connection settings of a KV store.
    pub fn from_kv_store(store: &VaultKvStore, mount: impl Into<String>) -> Self {
        Self::new(store.client(), mount)
    }

    pub fn mount(&self) -> &str {
        &self.mount
    }
}

impl std::fmt::Debug for PkiEngineClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PkiEngineClient").field("mount", &self.mount).finish()
    }
}

#[async_trait]
impl IssuedCertificateSource for PkiEngineClient {
    async fn list_serials(&self) -> Result<Vec<String>> {
        match vaultrs::pki::cert::list(self.client.as_ref(), &self.mount).await {
            Ok(serials) => Ok(serials),
            // the engine answers 404 when nothing has been issued yet
            Err(ClientError::APIError { code: 404, .. }) => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn read_certificate(&self, serial: &str) -> Result<IssuedCertificate> {
        let response = vaultrs::pki::cert::read(self.client.as_ref(), &self.mount, serial).await?;
        Ok(IssuedCertificate {
            serial: serial.to_string(),
            certificate_pem: response.certificate,
            revoked: response.revocation_time > 0,
        })
    }
}

/// Inventory every unrevoked certificate, keyed by serial.
///
/// A failed listing yields `None`; a failed read of one serial is a warning.
pub async fn inventory(source: &dyn IssuedCertificateSource) -> InventoryResult {
    let serials = match source.list_serials().await {
        Ok(serials) => serials,
        Err(e) => {
            warn!(error = %e, "Unable to list PKI certificates");
            return (None, vec![format!("Unable to list PKI certificates: {}", e)]);
        }
    };

    let mut records = Vec::new();
    let mut warnings = Vec::new();
    for serial in serials {
        match source.read_certificate(&serial).await {
            Ok(cert) if cert.revoked => debug!(serial = %serial, "Skipping revoked certificate"),
            Ok(cert) => {
                let certificates = pem::split_chain(&cert.certificate_pem);
                records.push(InventoryRecord::new(cert.serial, false, certificates));
            }
            Err(e) => {
                warn!(serial = %serial, error = %e, "Unable to read PKI certificate");
                warnings.push(format!("Unable to read certificate '{}': {}", serial, e));
            }
        }
    }

    info!(records = records.len(), warnings = warnings.len(), "PKI inventory assembled");
    (Some(records), warnings)
}
