#![allow(dead_code)]

use std::sync::Arc;

use base64::Engine as _;
use p12_keystore::{Certificate, KeyStore, KeyStoreEntry, PrivateKeyChain};
use rcgen::{BasicConstraints, CertificateParams, DnType, IsCa, KeyPair};
use sha1::{Digest, Sha1};
use vault_certstore::containers::pem;
use vault_certstore::secrets::{SecretBytes, SecretString};
use vault_certstore::{CertStoreJobs, CertificateMaterial, InMemorySecretStore, StoreConfig, StoreType};

pub const PFX_PASSWORD: &str = "upload-secret";

/// A leaf certificate issued by its own CA.
pub struct TestChain {
    pub leaf_der: Vec<u8>,
    pub ca_der: Vec<u8>,
    pub key_der: Vec<u8>,
}

impl TestChain {
    pub fn chain(&self) -> Vec<Vec<u8>> {
        vec![self.leaf_der.clone(), self.ca_der.clone()]
    }

    pub fn material(&self) -> CertificateMaterial {
        CertificateMaterial::KeyPair { key: SecretBytes::new(self.key_der.clone()), chain: self.chain() }
    }

    pub fn chain_pem(&self) -> String {
        pem::join_chain(&[pem::encode(&self.leaf_der), pem::encode(&self.ca_der)])
    }

    pub fn key_pem(&self) -> String {
        pem::encode_private_key(&self.key_der)
    }

    /// PFX with the key and full chain.
    pub fn pfx(&self, password: &str) -> Vec<u8> {
        let certs = self
            .chain()
            .iter()
            .map(|der| Certificate::from_der(der).expect("parse test certificate"))
            .collect::<Vec<_>>();
        let local_key_id = Sha1::digest(&self.leaf_der).to_vec();

        let mut keystore = KeyStore::new();
        keystore.add_entry(
            "upload",
            KeyStoreEntry::PrivateKeyChain(PrivateKeyChain::new(&self.key_der, local_key_id, certs)),
        );
        keystore.writer(password).write().expect("write test pfx")
    }

    /// PFX holding the leaf certificate only, without a key.
    pub fn certificate_only_pfx(&self, password: &str) -> Vec<u8> {
        let mut keystore = KeyStore::new();
        keystore.add_entry(
            "upload",
            KeyStoreEntry::Certificate(Certificate::from_der(&self.leaf_der).expect("parse test certificate")),
        );
        keystore.writer(password).write().expect("write test pfx")
    }
}

/// Issue a CA plus a leaf whose common names derive from `name`.
pub fn issue_chain(name: &str) -> TestChain {
    let ca_key = KeyPair::generate().expect("generate CA key");
    let mut ca_params = CertificateParams::new(Vec::<String>::new()).expect("CA params");
    ca_params.distinguished_name.push(DnType::CommonName, format!("{} Test CA", name));
    ca_params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    let ca_cert = ca_params.self_signed(&ca_key).expect("self-sign CA");

    let leaf_key = KeyPair::generate().expect("generate leaf key");
    let mut leaf_params =
        CertificateParams::new(vec![format!("{}.example.com", name)]).expect("leaf params");
    leaf_params.distinguished_name.push(DnType::CommonName, format!("{}.example.com", name));
    let leaf_cert = leaf_params.signed_by(&leaf_key, &ca_cert, &ca_key).expect("sign leaf");

    TestChain {
        leaf_der: leaf_cert.der().to_vec(),
        ca_der: ca_cert.der().to_vec(),
        key_der: leaf_key.serialize_der(),
    }
}

pub fn to_base64(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

pub fn pfx_password() -> SecretString {
    SecretString::new(PFX_PASSWORD)
}

/// Jobs over a fresh in-memory store; the store handle shares its data.
pub fn jobs_for(store_type: StoreType, store_path: &str) -> (CertStoreJobs, InMemorySecretStore) {
    let store = InMemorySecretStore::new();
    let config = StoreConfig::new(store_type, store_path);
    (CertStoreJobs::with_store(config, Arc::new(store.clone())), store)
}

/// Same as [`jobs_for`] with subfolder inventory switched on.
pub fn jobs_with_subfolders(store_type: StoreType, store_path: &str) -> (CertStoreJobs, InMemorySecretStore) {
    let store = InMemorySecretStore::new();
    let mut config = StoreConfig::new(store_type, store_path);
    config.subfolder_inventory = true;
    (CertStoreJobs::with_store(config, Arc::new(store.clone())), store)
}
