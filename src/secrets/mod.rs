//! Secret store abstraction.
//!
//! Certificate containers live in a hierarchical key-value store. The
//! [`SecretStore`] trait exposes the five operations the certificate logic
//! needs (read, list, write, patch, delete) over slash-delimited paths:
//!
//! - [`VaultKvStore`]: HashiCorp Vault KV v2 via `vaultrs`
//! - [`InMemorySecretStore`]: in-process store for development and tests
//!
//! Sensitive values travel as [`SecretString`] / [`SecretBytes`].

pub mod client;
pub mod memory;
pub mod paths;
pub mod types;
pub mod vault;

pub use client::{SecretEntry, SecretStore};
pub use memory::InMemorySecretStore;
pub use types::{SecretBytes, SecretString};
pub use vault::{VaultKvConfig, VaultKvStore};
