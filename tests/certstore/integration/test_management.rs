use base64::Engine as _;
use vault_certstore::containers::pem;
use vault_certstore::containers::{ContainerFormat, ContainerSecret};
use vault_certstore::secrets::SecretString;
use vault_certstore::{JobOutcome, StoreType};

use crate::support::{issue_chain, jobs_for, pfx_password, to_base64, PFX_PASSWORD};

const BINARY_TYPES: [StoreType; 3] = [StoreType::JavaKeystore, StoreType::Pkcs12, StoreType::Pfx];

#[tokio::test]
async fn test_certificate_only_upload_next_to_existing_alias() {
    let (jobs, store) = jobs_for(StoreType::Pkcs12, "stores/p12");
    assert!(jobs.create_cert_store().await.is_success());

    let old = issue_chain("old");
    assert!(jobs.put_certificate("old", &to_base64(&old.pfx(PFX_PASSWORD)), &pfx_password(), true).await.is_success());

    let new = issue_chain("new");
    let result = jobs
        .put_certificate("new", &to_base64(&new.certificate_only_pfx(PFX_PASSWORD)), &pfx_password(), true)
        .await;
    assert!(result.is_success(), "{:?}", result.messages);

    let container = ContainerSecret::read(&store, "stores/p12", StoreType::Pkcs12).await.unwrap();
    assert_eq!(
        container.handle.list_aliases().into_iter().collect::<Vec<_>>(),
        vec!["new".to_string(), "old".to_string()]
    );
    assert!(!container.handle.get_entry("new").unwrap().has_key);
    assert!(container.handle.get_entry("old").unwrap().has_key);
}

#[tokio::test]
async fn test_add_and_remove_across_binary_formats() {
    for store_type in BINARY_TYPES {
        let (jobs, store) = jobs_for(store_type, "stores/web");
        assert!(jobs.create_cert_store().await.is_success());

        let first = issue_chain("first");
        let second = issue_chain("second");
        for (alias, chain) in [("first", &first), ("second", &second)] {
            let result = jobs.put_certificate(alias, &to_base64(&chain.pfx(PFX_PASSWORD)), &pfx_password(), true).await;
            assert!(result.is_success(), "{}: {:?}", store_type, result.messages);
        }

        let result = jobs.remove_certificate("first").await;
        assert!(result.is_success(), "{}: {:?}", store_type, result.messages);

        let container = ContainerSecret::read(&store, "stores/web", store_type).await.unwrap();
        assert_eq!(container.handle.list_aliases().into_iter().collect::<Vec<_>>(), vec!["second".to_string()]);
        assert_eq!(container.handle.get_entry("second").unwrap().certificate_chain, second.chain());
    }
}

#[tokio::test]
async fn test_remove_absent_alias_succeeds() {
    let (jobs, store) = jobs_for(StoreType::JavaKeystore, "stores/jks");
    assert!(jobs.create_cert_store().await.is_success());

    assert!(jobs.remove_certificate("ghost").await.is_success());
    let container = ContainerSecret::read(&store, "stores/jks", StoreType::JavaKeystore).await.unwrap();
    assert!(container.handle.list_aliases().is_empty());
    assert!(!container.handle.is_alternate_format());
}

#[tokio::test]
async fn test_mutation_patches_only_the_container_field() {
    let (jobs, store) = jobs_for(StoreType::Pfx, "stores/web");
    assert!(jobs.create_cert_store().await.is_success());

    let mut seeded = store.get("stores/web").await.unwrap();
    seeded.insert("owner".to_string(), "platform-team".to_string());
    store.insert("stores/web", seeded.clone()).await;

    let chain = issue_chain("patched");
    assert!(jobs.put_certificate("web", &to_base64(&chain.pfx(PFX_PASSWORD)), &pfx_password(), true).await.is_success());

    let after = store.get("stores/web").await.unwrap();
    assert_eq!(after["owner"], "platform-team");
    assert_eq!(after["passphrase"], seeded["passphrase"]);
    assert_ne!(after["web_pfx-contents"], seeded["web_pfx-contents"]);
}

#[tokio::test]
async fn test_add_without_chain_keeps_leaf() {
    let (jobs, store) = jobs_for(StoreType::Pkcs12, "stores/leaf");
    assert!(jobs.create_cert_store().await.is_success());

    let chain = issue_chain("leaf");
    let result = jobs.put_certificate("leaf", &to_base64(&chain.pfx(PFX_PASSWORD)), &pfx_password(), false).await;
    assert!(result.is_success(), "{:?}", result.messages);

    let container = ContainerSecret::read(&store, "stores/leaf", StoreType::Pkcs12).await.unwrap();
    assert_eq!(container.handle.get_entry("leaf").unwrap().certificate_chain, vec![chain.leaf_der.clone()]);
}

#[tokio::test]
async fn test_java_keystore_holding_pkcs12_stays_pkcs12() {
    let (jobs, store) = jobs_for(StoreType::JavaKeystore, "stores/legacy");
    let passphrase = SecretString::new("legacy-pass");
    let pkcs12 = ContainerFormat::Pkcs12.create_empty(&passphrase).unwrap();
    store
        .insert(
            "stores/legacy",
            [
                ("legacy_jks-contents", base64::engine::general_purpose::STANDARD.encode(pkcs12)),
                ("passphrase", passphrase.expose_secret().to_string()),
            ],
        )
        .await;

    let chain = issue_chain("legacy");
    let result = jobs.put_certificate("web", &to_base64(&chain.pfx(PFX_PASSWORD)), &pfx_password(), true).await;
    assert!(result.is_success(), "{:?}", result.messages);

    let container = ContainerSecret::read(&store, "stores/legacy", StoreType::JavaKeystore).await.unwrap();
    assert!(container.handle.is_alternate_format());
    assert!(container.handle.get_entry("web").unwrap().has_key);
}

#[tokio::test]
async fn test_bare_pem_add_and_remove() {
    let (jobs, store) = jobs_for(StoreType::BarePem, "certs/");
    let chain = issue_chain("pem-add");

    let result = jobs.put_certificate("web1", &to_base64(&chain.pfx(PFX_PASSWORD)), &pfx_password(), true).await;
    assert!(result.is_success(), "{:?}", result.messages);

    let secret = store.get("certs/web1").await.unwrap();
    let blocks = pem::split_chain(&secret["certificate"]);
    assert_eq!(blocks.len(), 2);
    assert_eq!(pem::decode_private_key(&secret["private_key"]).unwrap(), chain.key_der);

    let inventory = jobs.get_certificates().await;
    assert_eq!(inventory.data.unwrap()[0].alias, "web1");

    assert!(jobs.remove_certificate("web1").await.is_success());
    assert!(store.get("certs/web1").await.is_none());
    assert_eq!(jobs.remove_certificate("web1").await.outcome, JobOutcome::Failure);
}

#[tokio::test]
async fn test_bare_pem_rejects_certificate_without_key() {
    let (jobs, store) = jobs_for(StoreType::BarePem, "certs/");
    let chain = issue_chain("no-key");

    let result = jobs
        .put_certificate("web1", &to_base64(&chain.certificate_only_pfx(PFX_PASSWORD)), &pfx_password(), true)
        .await;
    assert_eq!(result.outcome, JobOutcome::Failure);
    assert!(result.messages[0].contains("private_key"));
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_add_to_missing_container_fails() {
    let (jobs, _) = jobs_for(StoreType::Pkcs12, "stores/none");
    let chain = issue_chain("orphan");
    let result = jobs.put_certificate("web", &to_base64(&chain.pfx(PFX_PASSWORD)), &pfx_password(), true).await;
    assert_eq!(result.outcome, JobOutcome::Failure);
    assert!(result.messages[0].starts_with("Not found"));
}
