use vault_certstore::containers::pem;

use crate::support::issue_chain;

#[test]
fn test_real_chain_splits_in_stored_order() {
    let chain = issue_chain("split");
    let blob = chain.chain_pem();

    let blocks = pem::split_chain(&blob);
    assert_eq!(blocks.len(), 2);
    assert_eq!(pem::decode(&blocks[0]).unwrap(), chain.leaf_der);
    assert_eq!(pem::decode(&blocks[1]).unwrap(), chain.ca_der);
}

#[test]
fn test_crlf_chain_from_windows_hosts() {
    let chain = issue_chain("crlf");
    let blob = chain.chain_pem().replace('\n', "\r\n");

    let blocks = pem::split_chain(&blob);
    assert_eq!(blocks.len(), 2);
    assert_eq!(pem::decode(&blocks[1]).unwrap(), chain.ca_der);
}

#[test]
fn test_encoded_certificate_matches_rcgen_pem() {
    let key = rcgen::KeyPair::generate().unwrap();
    let params = rcgen::CertificateParams::new(vec!["pem.example.com".to_string()]).unwrap();
    let cert = params.self_signed(&key).unwrap();

    let ours = pem::encode(cert.der());
    assert_eq!(ours.trim(), cert.pem().trim().replace("\r\n", "\n"));
}
