use vault_certstore::{JobOutcome, StoreType};

use crate::support::jobs_for;

#[tokio::test]
async fn test_discovery_finds_nested_container() {
    let (jobs, store) = jobs_for(StoreType::JavaKeystore, "");
    store.insert("/a/readme", [("description", "plain secret")]).await;
    store.insert("/a/b/x", [("x_jks-contents", "AAAA"), ("passphrase", "pw")]).await;

    let result = jobs.get_vaults("/a/").await;
    assert_eq!(result.outcome, JobOutcome::Success);
    assert_eq!(result.data, Some(vec!["/a/b/x".to_string()]));
    assert!(result.messages.is_empty());
}

#[tokio::test]
async fn test_discovery_matches_only_the_configured_type() {
    let (jobs, store) = jobs_for(StoreType::Pfx, "");
    store.insert("stores/one", [("one_pfx-contents", "AAAA")]).await;
    store.insert("stores/two", [("two_p12-contents", "AAAA")]).await;
    store.insert("stores/deep/three", [("renamed_pfx-contents", "AAAA")]).await;

    let result = jobs.get_vaults("stores/").await;
    assert_eq!(result.data, Some(vec!["stores/deep/three".to_string(), "stores/one".to_string()]));
}

#[tokio::test]
async fn test_bare_pem_discovery_reports_folders() {
    let (jobs, store) = jobs_for(StoreType::BarePem, "");
    store.insert("pem/web/a", [("certificate", "c"), ("private_key", "k")]).await;
    store.insert("pem/web/b", [("certificate", "c"), ("private_key", "k")]).await;
    store.insert("pem/other/notes", [("text", "nothing here")]).await;

    let result = jobs.get_vaults("pem/").await;
    assert_eq!(result.data, Some(vec!["pem/web/".to_string()]));
}

#[tokio::test]
async fn test_discovery_keeps_going_past_failures() {
    let (jobs, store) = jobs_for(StoreType::Pkcs12, "");
    store.insert("root/locked/x", [("x_p12-contents", "AAAA")]).await;
    store.insert("root/open/y", [("y_p12-contents", "AAAA")]).await;
    store.fail_path("root/locked/").await;

    let result = jobs.get_vaults("root/").await;
    assert_eq!(result.outcome, JobOutcome::Warning);
    assert_eq!(result.data, Some(vec!["root/open/y".to_string()]));
    assert_eq!(result.messages.len(), 1);
}

#[tokio::test]
async fn test_discovery_of_missing_root_fails() {
    let (jobs, _) = jobs_for(StoreType::Pkcs12, "");
    let result = jobs.get_vaults("missing/").await;
    assert_eq!(result.outcome, JobOutcome::Failure);
}
