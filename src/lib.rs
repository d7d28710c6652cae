//! # vault-certstore
//!
//! Synchronises X.509 certificates and private keys between HashiCorp Vault
//! and a certificate lifecycle host.
//!
//! Certificates live in Vault KV v2 under one of four encodings: bare PEM
//! fields (one secret per alias), or a base64 Java keystore, PKCS#12 or PFX
//! container next to its passphrase. A Vault PKI engine mount can be
//! inventoried as well.
//!
//! ## Architecture
//!
//! ```text
//! CertStoreJobs → InventoryAssembler / MutationCoordinator / SecretPathResolver
//!       ↓                          ↓
//!  StoreConfig          ContainerFormat (PEM, JKS, PKCS#12, PFX)
//!                                  ↓
//!                       SecretStore (Vault KV v2, in-memory)
//! ```
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use vault_certstore::{CertStoreJobs, StoreConfig, StoreType};
//!
//! #[tokio::main]
//! async fn main() -> vault_certstore::Result<()> {
//!     let config = StoreConfig::new(StoreType::Pkcs12, "stores/web");
//!     let jobs = CertStoreJobs::from_config(config)?;
//!     let inventory = jobs.get_certificates().await;
//!     println!("{:?}", inventory.outcome);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod containers;
pub mod discovery;
pub mod errors;
pub mod inventory;
pub mod jobs;
pub mod management;
pub mod observability;
pub mod pki;
pub mod secrets;

// Re-export commonly used types and traits
pub use config::{StoreConfig, StoreType};
pub use containers::{CertificateMaterial, ContainerFormat, ContainerHandle};
pub use errors::{CertStoreError, Result};
pub use inventory::{InventoryRecord, InventoryStatus};
pub use jobs::{CertStoreJobs, JobOutcome, JobResult};
pub use secrets::{InMemorySecretStore, SecretStore, VaultKvStore};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
