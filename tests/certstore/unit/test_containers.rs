use vault_certstore::containers::{CertificateMaterial, ContainerFormat, JksKeystore};
use vault_certstore::secrets::SecretString;

use crate::support::issue_chain;

const BINARY_FORMATS: [ContainerFormat; 3] =
    [ContainerFormat::JavaKeystore, ContainerFormat::Pkcs12, ContainerFormat::Pfx];

#[test]
fn test_full_chain_survives_serialize_and_reload() {
    let passphrase = SecretString::generate_passphrase();
    let chain = issue_chain("web1");

    for format in BINARY_FORMATS {
        let mut handle = format.load(&format.create_empty(&passphrase).unwrap(), &passphrase).unwrap();
        handle.put_entry("web1", &chain.material()).unwrap();

        let bytes = handle.serialize(&passphrase).unwrap();
        let reloaded = format.load(&bytes, &passphrase).unwrap();
        let entry = reloaded.get_entry("web1").unwrap();

        assert!(entry.has_key, "{}", format);
        assert_eq!(entry.certificate_chain, chain.chain(), "{} reordered the chain", format);
    }
}

#[test]
fn test_certificate_only_entry_alongside_key_entry() {
    let passphrase = SecretString::new("changeit");
    let keyed = issue_chain("keyed");
    let public = issue_chain("public");

    for format in BINARY_FORMATS {
        let mut handle = format.load(&format.create_empty(&passphrase).unwrap(), &passphrase).unwrap();
        handle.put_entry("keyed", &keyed.material()).unwrap();
        handle
            .put_entry("public", &CertificateMaterial::CertificateOnly { certificate: public.leaf_der.clone() })
            .unwrap();

        let reloaded = format.load(&handle.serialize(&passphrase).unwrap(), &passphrase).unwrap();
        assert_eq!(reloaded.list_aliases().len(), 2, "{}", format);

        let public_entry = reloaded.get_entry("public").unwrap();
        assert!(!public_entry.has_key);
        assert_eq!(public_entry.certificate_chain, vec![public.leaf_der.clone()]);
        assert!(reloaded.get_entry("keyed").unwrap().has_key);
    }
}

#[test]
fn test_wrong_passphrase_is_rejected() {
    let passphrase = SecretString::new("right");
    let wrong = SecretString::new("wrong");

    for format in BINARY_FORMATS {
        let bytes = format.create_empty(&passphrase).unwrap();
        assert!(format.load(&bytes, &wrong).is_err(), "{} accepted a wrong passphrase", format);
    }
}

#[test]
fn test_java_keystore_fallback_round_trip() {
    let passphrase = SecretString::new("changeit");
    let chain = issue_chain("legacy");

    // a PKCS#12 archive stored where a Java keystore is expected
    let mut seed = ContainerFormat::Pkcs12
        .load(&ContainerFormat::Pkcs12.create_empty(&passphrase).unwrap(), &passphrase)
        .unwrap();
    seed.put_entry("old", &issue_chain("old").material()).unwrap();
    let pkcs12_bytes = seed.serialize(&passphrase).unwrap();

    let mut handle = ContainerFormat::JavaKeystore.load(&pkcs12_bytes, &passphrase).unwrap();
    assert!(handle.is_alternate_format());
    handle.put_entry("legacy", &chain.material()).unwrap();
    let written = handle.serialize(&passphrase).unwrap();

    assert!(JksKeystore::parse(&written, &passphrase).is_err());
    let reloaded = ContainerFormat::JavaKeystore.load(&written, &passphrase).unwrap();
    assert_eq!(
        reloaded.list_aliases().into_iter().collect::<Vec<_>>(),
        vec!["legacy".to_string(), "old".to_string()]
    );
}
