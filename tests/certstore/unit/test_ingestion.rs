use vault_certstore::containers::pem;
use vault_certstore::secrets::SecretString;
use vault_certstore::{CertStoreError, CertificateMaterial};

use crate::support::{issue_chain, pfx_password, PFX_PASSWORD};

#[test]
fn test_pfx_upload_yields_key_and_chain() {
    let chain = issue_chain("ingest");
    let material = CertificateMaterial::parse(&chain.pfx(PFX_PASSWORD), &pfx_password()).unwrap();

    match material {
        CertificateMaterial::KeyPair { key, chain: certs } => {
            assert_eq!(key.expose_secret(), chain.key_der.as_slice());
            assert_eq!(certs, chain.chain());
        }
        other => panic!("expected key pair, got {:?}", other),
    }
}

#[test]
fn test_leaf_only_when_chain_excluded() {
    let chain = issue_chain("leaf-only");
    let material = CertificateMaterial::parse(&chain.pfx(PFX_PASSWORD), &pfx_password())
        .unwrap()
        .with_chain(false);
    assert_eq!(material.certificates(), vec![chain.leaf_der.as_slice()]);
}

#[test]
fn test_wrong_pfx_password_falls_back_to_certificate_parse() {
    let chain = issue_chain("wrong-password");
    let err = CertificateMaterial::parse(&chain.pfx(PFX_PASSWORD), &SecretString::new("nope")).unwrap_err();
    assert!(matches!(err, CertStoreError::AuthContent { .. }));
}

#[test]
fn test_pem_bundle_upload_uses_first_certificate() {
    let chain = issue_chain("bundle");
    let material = CertificateMaterial::parse(chain.chain_pem().as_bytes(), &pfx_password()).unwrap();
    assert_eq!(material, CertificateMaterial::CertificateOnly { certificate: chain.leaf_der.clone() });
    assert!(!material.has_private_key());

    // stray key blocks are not certificates
    let err = CertificateMaterial::parse(pem::encode_private_key(&chain.key_der).as_bytes(), &pfx_password())
        .unwrap_err();
    assert!(matches!(err, CertStoreError::AuthContent { .. }));
}
