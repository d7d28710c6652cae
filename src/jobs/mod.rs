//! # Host Jobs
//!
//! The operations a lifecycle host invokes against one configured store:
//! inventory, discovery, and management (add, remove, create).
//!
//! Bulk jobs report partial results as [`JobOutcome::Warning`]; a job that
//! produced nothing usable is a [`JobOutcome::Failure`]. Management jobs are
//! all-or-nothing.

use base64::Engine as _;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn, Instrument};

use crate::config::{StoreConfig, StoreType};
use crate::discovery::SecretPathResolver;
use crate::errors::{CertStoreError, Result};
use crate::inventory::{InventoryAssembler, InventoryRecord};
use crate::management::MutationCoordinator;
use crate::pki::{self, IssuedCertificateSource, PkiEngineClient};
use crate::secrets::{SecretStore, SecretString, VaultKvStore};

/// Overall result of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum JobOutcome {
    Success,
    /// Some data was produced, but parts of the store could not be read
    Warning,
    Failure,
}

/// Job outcome with its data and any warning or failure messages.
#[derive(Debug, Clone, Serialize)]
pub struct JobResult<T> {
    pub outcome: JobOutcome,
    pub data: Option<T>,
    pub messages: Vec<String>,
}

impl<T> JobResult<T> {
    pub fn success(data: T) -> Self {
        Self { outcome: JobOutcome::Success, data: Some(data), messages: Vec::new() }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self { outcome: JobOutcome::Failure, data: None, messages: vec![message.into()] }
    }

    /// Outcome of a bulk job: `None` is a failure, warnings downgrade success.
    pub fn from_bulk(data: Option<T>, warnings: Vec<String>) -> Self {
        let outcome = match (&data, warnings.is_empty()) {
            (None, _) => JobOutcome::Failure,
            (Some(_), true) => JobOutcome::Success,
            (Some(_), false) => JobOutcome::Warning,
        };
        Self { outcome, data, messages: warnings }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == JobOutcome::Success
    }
}

impl JobResult<()> {
    fn from_management(result: Result<()>) -> Self {
        match result {
            Ok(()) => Self::success(()),
            Err(e) => {
                error!(error = %e, "Management job failed");
                Self::failure(e.to_string())
            }
        }
    }
}

/// Jobs bound to one store configuration.
#[derive(Clone)]
pub struct CertStoreJobs {
    config: StoreConfig,
    store: Arc<dyn SecretStore>,
    pki: Option<Arc<dyn IssuedCertificateSource>>,
}

impl CertStoreJobs {
    /// Connect to the Vault server named in `config`.
    pub fn from_config(config: StoreConfig) -> Result<Self> {
        config.validate()?;
        let store = VaultKvStore::new(config.vault_kv_config())?;
        let pki: Arc<dyn IssuedCertificateSource> =
            Arc::new(PkiEngineClient::from_kv_store(&store, config.mount_point.clone()));
        Ok(Self { config, store: Arc::new(store), pki: Some(pki) })
    }

    /// Jobs over an existing store, without a PKI engine.
    pub fn with_store(config: StoreConfig, store: Arc<dyn SecretStore>) -> Self {
        Self { config, store, pki: None }
    }

    pub fn with_pki_source(mut self, source: Arc<dyn IssuedCertificateSource>) -> Self {
        self.pki = Some(source);
        self
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn store_type(&self) -> StoreType {
        self.config.store_type
    }

    fn store_path(&self) -> &str {
        &self.config.store_path
    }

    /// Inventory the configured store.
    pub async fn get_certificates(&self) -> JobResult<Vec<InventoryRecord>> {
        let span = crate::job_span!("inventory", self.store_type(), self.store_path());

        async move {
            let (records, warnings) = match (self.store_type(), &self.pki) {
                (StoreType::PkiEngine, Some(source)) => pki::inventory(source.as_ref()).await,
                (StoreType::PkiEngine, None) => {
                    (None, vec!["no PKI engine is configured for this store".to_string()])
                }
                (store_type, _) => {
                    InventoryAssembler::new(self.store.clone())
                        .assemble(self.store_path(), store_type, self.config.subfolder_inventory)
                        .await
                }
            };

            let result = JobResult::from_bulk(records, warnings);
            info!(
                outcome = ?result.outcome,
                records = result.data.as_ref().map(Vec::len).unwrap_or(0),
                "Inventory job finished"
            );
            result
        }
        .instrument(span)
        .await
    }

    /// Discover containers of the configured type under `root`.
    pub async fn get_vaults(&self, root: &str) -> JobResult<Vec<String>> {
        let span = crate::job_span!("discovery", self.store_type(), root);

        async move {
            let resolver = SecretPathResolver::new(self.store.clone());
            match resolver.find_container_paths(root, self.store_type()).await {
                Ok((paths, warnings)) => {
                    // an unreadable root with nothing found is a failure, not an empty store
                    if paths.is_empty() && !warnings.is_empty() {
                        return JobResult::from_bulk(None, warnings);
                    }
                    JobResult::from_bulk(Some(paths), warnings)
                }
                Err(e) => {
                    warn!(error = %e, "Discovery rejected");
                    JobResult::failure(e.to_string())
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Add `alias` from a base64 PFX upload.
    pub async fn put_certificate(
        &self,
        alias: &str,
        pfx_base64: &str,
        pfx_password: &SecretString,
        include_chain: bool,
    ) -> JobResult<()> {
        let span = crate::job_span!("add", self.store_type(), self.store_path(), alias = %alias);

        async move {
            let result: Result<()> = async {
                self.reject_pki("Management-Add")?;
                validate_add(alias, pfx_password)?;
                let pfx_bytes = base64::engine::general_purpose::STANDARD.decode(pfx_base64.trim())?;
                MutationCoordinator::new(self.store.clone(), self.store_type())
                    .add(self.store_path(), alias, &pfx_bytes, pfx_password, include_chain)
                    .await
            }
            .await;
            JobResult::from_management(result)
        }
        .instrument(span)
        .await
    }

    /// Remove `alias` from the configured store.
    pub async fn remove_certificate(&self, alias: &str) -> JobResult<()> {
        let span = crate::job_span!("remove", self.store_type(), self.store_path(), alias = %alias);

        async move {
            let result: Result<()> = async {
                self.reject_pki("Management-Remove")?;
                validate_alias(alias)?;
                MutationCoordinator::new(self.store.clone(), self.store_type())
                    .remove(self.store_path(), alias)
                    .await
            }
            .await;
            JobResult::from_management(result)
        }
        .instrument(span)
        .await
    }

    /// Create an empty store at the configured path.
    pub async fn create_cert_store(&self) -> JobResult<()> {
        let span = crate::job_span!("create", self.store_type(), self.store_path());

        async move {
            let result: Result<()> = async {
                self.reject_pki("Management-Create")?;
                MutationCoordinator::new(self.store.clone(), self.store_type())
                    .create_container(self.store_path())
                    .await
            }
            .await;
            JobResult::from_management(result)
        }
        .instrument(span)
        .await
    }

    fn reject_pki(&self, operation: &str) -> Result<()> {
        match self.store_type() {
            StoreType::PkiEngine => Err(CertStoreError::not_supported(operation, self.store_type().as_str())),
            _ => Ok(()),
        }
    }
}

fn validate_alias(alias: &str) -> Result<()> {
    if alias.trim().is_empty() {
        return Err(CertStoreError::validation("an alias is required"));
    }
    Ok(())
}

fn validate_add(alias: &str, pfx_password: &SecretString) -> Result<()> {
    validate_alias(alias)?;
    if pfx_password.is_blank() {
        return Err(CertStoreError::validation(
            "a PFX password is required; certificates must be in PFX format",
        ));
    }
    Ok(())
}
