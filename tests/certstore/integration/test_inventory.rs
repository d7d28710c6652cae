use vault_certstore::containers::pem;
use vault_certstore::{JobOutcome, StoreType};

use crate::support::{issue_chain, jobs_for, jobs_with_subfolders, pfx_password, to_base64, PFX_PASSWORD};

#[tokio::test]
async fn test_bare_pem_entry_with_chain() {
    let (jobs, store) = jobs_for(StoreType::BarePem, "/certs/");
    let chain = issue_chain("web1");
    store
        .insert(
            "certs/web1",
            [("certificate", chain.chain_pem()), ("private_key", chain.key_pem())],
        )
        .await;

    let result = jobs.get_certificates().await;
    assert_eq!(result.outcome, JobOutcome::Success);

    let records = result.data.unwrap();
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.alias, "web1");
    assert!(record.has_private_key);
    assert_eq!(record.certificates.len(), 2);
    assert!(record.uses_chain);
    assert_eq!(pem::decode(&record.certificates[0]).unwrap(), chain.leaf_der);
}

#[tokio::test]
async fn test_bare_pem_partial_entries_are_warnings() {
    let (jobs, store) = jobs_for(StoreType::BarePem, "certs");
    let chain = issue_chain("partial");
    store
        .insert("certs/complete", [("certificate", chain.chain_pem()), ("private_key", chain.key_pem())])
        .await;
    store.insert("certs/cert-only", [("certificate", chain.chain_pem())]).await;
    store.insert("certs/key-only", [("private_key", chain.key_pem())]).await;
    store.insert("certs/metadata", [("owner", "team-a")]).await;

    let result = jobs.get_certificates().await;
    assert_eq!(result.outcome, JobOutcome::Warning);
    assert_eq!(result.data.unwrap().len(), 1);
    assert_eq!(result.messages.len(), 2);
    assert!(result.messages.iter().any(|m| m.contains("certs/cert-only") && m.contains("private_key")));
    assert!(result.messages.iter().any(|m| m.contains("certs/key-only") && m.contains("certificate")));
}

#[tokio::test]
async fn test_bare_pem_subfolders_and_unreadable_entries() {
    let (jobs, store) = jobs_with_subfolders(StoreType::BarePem, "certs/");
    let chain = issue_chain("nested");
    let fields = [("certificate", chain.chain_pem()), ("private_key", chain.key_pem())];
    store.insert("certs/top", fields.clone()).await;
    store.insert("certs/eu/west/api", fields.clone()).await;
    store.insert("certs/us/broken", fields).await;
    store.fail_path("certs/us/broken").await;

    let result = jobs.get_certificates().await;
    assert_eq!(result.outcome, JobOutcome::Warning);

    let aliases: Vec<String> = result.data.unwrap().into_iter().map(|r| r.alias).collect();
    assert_eq!(aliases, vec!["eu/west/api", "top"]);
    assert_eq!(result.messages.len(), 1);
}

#[tokio::test]
async fn test_missing_store_path_fails_inventory() {
    let (jobs, _) = jobs_for(StoreType::BarePem, "nowhere");
    let result = jobs.get_certificates().await;
    assert_eq!(result.outcome, JobOutcome::Failure);
    assert!(result.data.is_none());

    let (jobs, _) = jobs_for(StoreType::JavaKeystore, "stores/absent");
    let result = jobs.get_certificates().await;
    assert_eq!(result.outcome, JobOutcome::Failure);
}

#[tokio::test]
async fn test_binary_inventory_reports_key_entries_only() {
    let (jobs, _) = jobs_for(StoreType::Pkcs12, "stores/p12");
    assert!(jobs.create_cert_store().await.is_success());

    let keyed = issue_chain("keyed");
    let public = issue_chain("public");
    let result = jobs.put_certificate("keyed", &to_base64(&keyed.pfx(PFX_PASSWORD)), &pfx_password(), true).await;
    assert!(result.is_success(), "{:?}", result.messages);
    let result = jobs
        .put_certificate("public", &to_base64(&public.certificate_only_pfx(PFX_PASSWORD)), &pfx_password(), true)
        .await;
    assert!(result.is_success(), "{:?}", result.messages);

    let result = jobs.get_certificates().await;
    assert_eq!(result.outcome, JobOutcome::Success);
    let records = result.data.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].alias, "keyed");
    assert!(records[0].uses_chain);
}

#[tokio::test]
async fn test_corrupt_container_fails_inventory() {
    let (jobs, store) = jobs_for(StoreType::Pfx, "stores/web");
    store.insert("stores/web", [("web_pfx-contents", "bm90IGEgcGZ4"), ("passphrase", "pw")]).await;

    let result = jobs.get_certificates().await;
    assert_eq!(result.outcome, JobOutcome::Failure);
    assert_eq!(result.messages.len(), 1);
}
