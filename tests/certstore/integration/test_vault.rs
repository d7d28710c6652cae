//! Round trip against a live Vault dev server.
//!
//! Requires `VAULT_ADDR` and `VAULT_TOKEN`; run with
//! `cargo test --features vault_tests`.
#![cfg(feature = "vault_tests")]

use vault_certstore::secrets::{SecretStore, VaultKvStore};
use vault_certstore::{CertStoreJobs, JobOutcome, StoreConfig, StoreType};

use crate::support::{issue_chain, pfx_password, to_base64, PFX_PASSWORD};

fn live_config(store_type: StoreType, path: &str) -> StoreConfig {
    let mut config = StoreConfig::new(store_type, path);
    config.vault_server_url = std::env::var("VAULT_ADDR").expect("VAULT_ADDR");
    config.vault_token = std::env::var("VAULT_TOKEN").ok().map(Into::into);
    config
}

#[tokio::test]
async fn test_pkcs12_lifecycle_against_vault() {
    let path = format!("certstore-tests/{}", uuid::Uuid::new_v4());
    let config = live_config(StoreType::Pkcs12, &path);
    let jobs = CertStoreJobs::from_config(config.clone()).unwrap();

    assert!(jobs.create_cert_store().await.is_success());

    let chain = issue_chain("vault");
    let result = jobs.put_certificate("web", &to_base64(&chain.pfx(PFX_PASSWORD)), &pfx_password(), true).await;
    assert!(result.is_success(), "{:?}", result.messages);

    let inventory = jobs.get_certificates().await;
    assert_eq!(inventory.outcome, JobOutcome::Success);
    assert_eq!(inventory.data.unwrap()[0].alias, "web");

    let store = VaultKvStore::new(config.vault_kv_config()).unwrap();
    store.delete_secret(&path).await.unwrap();
}

#[tokio::test]
async fn test_bare_pem_remove_against_vault() {
    let path = format!("certstore-tests/{}/", uuid::Uuid::new_v4());
    let config = live_config(StoreType::BarePem, &path);
    let jobs = CertStoreJobs::from_config(config.clone()).unwrap();
    let store = VaultKvStore::new(config.vault_kv_config()).unwrap();

    let chain = issue_chain("pem-vault");
    let result = jobs.put_certificate("web1", &to_base64(&chain.pfx(PFX_PASSWORD)), &pfx_password(), true).await;
    assert!(result.is_success(), "{:?}", result.messages);

    assert!(jobs.remove_certificate("web1").await.is_success());
    let secret_path = format!("{}web1", path);
    assert!(store.try_read_secret(&secret_path).await.unwrap().is_none());

    // latest version is soft-deleted
    let again = jobs.remove_certificate("web1").await;
    assert_eq!(again.outcome, JobOutcome::Failure);
    assert!(store.delete_secret(&secret_path).await.unwrap_err().is_not_found());
}
