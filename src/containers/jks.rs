//! Java keystore (JKS) codec.
//!
//! Reads and writes the Sun `JKS` format, version 1 and 2:
//!
//! ```text
//! u32 magic 0xFEEDFEED | u32 version | u32 count
//! count × entry:
//!   u32 tag (1 = private key, 2 = trusted certificate)
//!   utf alias | u64 creation time (ms)
//!   tag 1: u32 len + EncryptedPrivateKeyInfo | u32 n | n × certificate
//!   tag 2: certificate
//! certificate: [utf "X.509" (v2 only)] | u32 len + DER
//! 20-byte SHA-1 over (password UTF-16BE ‖ "Mighty Aphrodite" ‖ preceding bytes)
//! ```
//!
//! Private keys are protected with the Sun key protector (SHA-1 keystream
//! XOR, OID 1.3.6.1.4.1.42.2.17.1.1) using the store passphrase.

use rand::RngCore;
use sha1::{Digest, Sha1};
use simple_asn1::{ASN1Block, OID};
use std::collections::BTreeMap;

use crate::errors::{CertStoreError, Result};
use crate::secrets::{SecretBytes, SecretString};

const MAGIC: u32 = 0xFEED_FEED;
const VERSION_1: u32 = 1;
const VERSION_2: u32 = 2;
const TAG_PRIVATE_KEY: u32 = 1;
const TAG_TRUSTED_CERT: u32 = 2;
const CERT_TYPE_X509: &str = "X.509";
const INTEGRITY_WHITENER: &[u8] = b"Mighty Aphrodite";
const DIGEST_LEN: usize = 20;
const SALT_LEN: usize = 20;
const KEY_PROTECTOR_OID: [u64; 11] = [1, 3, 6, 1, 4, 1, 42, 2, 17, 1, 1];

fn format_error(message: impl Into<String>) -> CertStoreError {
    CertStoreError::format("JKS", message)
}

/// One alias in a Java keystore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JksEntry {
    /// PKCS#8 private key plus its certificate chain (leaf first)
    PrivateKey { created_ms: u64, key: SecretBytes, chain: Vec<Vec<u8>> },
    /// Certificate without a key
    TrustedCertificate { created_ms: u64, certificate: Vec<u8> },
}

/// Decoded Java keystore, keyed by alias.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JksKeystore {
    entries: BTreeMap<String, JksEntry>,
}

impl JksKeystore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&String, &JksEntry)> {
        self.entries.iter()
    }

    /// Aliases are case-insensitive, as in `java.security.KeyStore`.
    pub fn entry(&self, alias: &str) -> Option<&JksEntry> {
        self.entries.get(&normalize_alias(alias))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert or replace the entry at `alias`, stored lowercased.
    pub fn insert(&mut self, alias: &str, entry: JksEntry) {
        self.entries.insert(normalize_alias(alias), entry);
    }

    /// Parse keystore bytes, verifying the integrity digest and decrypting
    /// private keys with `passphrase`.
    ///
    /// # Errors
    ///
    /// - [`CertStoreError::Format`] for bad magic, truncated data, a digest
    ///   mismatch (wrong passphrase) or an unreadable key entry
    pub fn parse(bytes: &[u8], passphrase: &SecretString) -> Result<Self> {
        if bytes.len() < 12 + DIGEST_LEN {
            return Err(format_error("data too short"));
        }

        let password = password_bytes(passphrase);
        let (body, stored_digest) = bytes.split_at(bytes.len() - DIGEST_LEN);
        if integrity_digest(&password, body).as_slice() != stored_digest {
            return Err(format_error("keystore password was incorrect or data is corrupted"));
        }

        let mut reader = Reader::new(body);
        if reader.u32()? != MAGIC {
            return Err(format_error("not a JKS keystore (bad magic)"));
        }
        let version = reader.u32()?;
        if version != VERSION_1 && version != VERSION_2 {
            return Err(format_error(format!("unsupported keystore version {}", version)));
        }

        let count = reader.u32()?;
        let mut keystore = Self::new();
        for _ in 0..count {
            let tag = reader.u32()?;
            let alias = reader.utf()?;
            let created_ms = reader.u64()?;

            let entry = match tag {
                TAG_PRIVATE_KEY => {
                    let epki_len = reader.u32()? as usize;
                    let epki = reader.bytes(epki_len)?;
                    let protected = parse_encrypted_private_key_info(epki)?;
                    let key = unprotect_key(&protected, &password)?;

                    let chain_len = reader.u32()?;
                    let mut chain = Vec::new();
                    for _ in 0..chain_len {
                        chain.push(reader.certificate(version)?);
                    }
                    if chain.is_empty() {
                        return Err(format_error(format!(
                            "private key entry '{}' has no certificate chain",
                            alias
                        )));
                    }
                    JksEntry::PrivateKey { created_ms, key, chain }
                }
                TAG_TRUSTED_CERT => {
                    JksEntry::TrustedCertificate { created_ms, certificate: reader.certificate(version)? }
                }
                other => return Err(format_error(format!("unknown entry tag {}", other))),
            };
            keystore.insert(&alias, entry);
        }

        if !reader.is_empty() {
            return Err(format_error("trailing data after entries"));
        }
        Ok(keystore)
    }

    /// Encode as JKS version 2, protecting keys with `passphrase`.
    pub fn to_bytes(&self, passphrase: &SecretString) -> Result<Vec<u8>> {
        let password = password_bytes(passphrase);
        let mut out = Vec::new();

        out.extend_from_slice(&MAGIC.to_be_bytes());
        out.extend_from_slice(&VERSION_2.to_be_bytes());
        out.extend_from_slice(&(self.entries.len() as u32).to_be_bytes());

        for (alias, entry) in &self.entries {
            match entry {
                JksEntry::PrivateKey { created_ms, key, chain } => {
                    out.extend_from_slice(&TAG_PRIVATE_KEY.to_be_bytes());
                    write_utf(&mut out, alias)?;
                    out.extend_from_slice(&created_ms.to_be_bytes());

                    let protected = protect_key(key.expose_secret(), &password);
                    let epki = encode_encrypted_private_key_info(protected)?;
                    write_blob(&mut out, &epki)?;

                    out.extend_from_slice(&(chain.len() as u32).to_be_bytes());
                    for cert in chain {
                        write_certificate(&mut out, cert)?;
                    }
                }
                JksEntry::TrustedCertificate { created_ms, certificate } => {
                    out.extend_from_slice(&TAG_TRUSTED_CERT.to_be_bytes());
                    write_utf(&mut out, alias)?;
                    out.extend_from_slice(&created_ms.to_be_bytes());
                    write_certificate(&mut out, certificate)?;
                }
            }
        }

        let digest = integrity_digest(&password, &out);
        out.extend_from_slice(&digest);
        Ok(out)
    }
}

/// Alias form the Sun provider stores and looks up.
pub fn normalize_alias(alias: &str) -> String {
    alias.to_lowercase()
}

/// Java `char[]` passwords are hashed as UTF-16BE.
fn password_bytes(passphrase: &SecretString) -> SecretBytes {
    SecretBytes::new(
        passphrase.expose_secret().encode_utf16().flat_map(u16::to_be_bytes).collect::<Vec<u8>>(),
    )
}

fn integrity_digest(password: &SecretBytes, body: &[u8]) -> [u8; DIGEST_LEN] {
    let mut hasher = Sha1::new();
    hasher.update(password.expose_secret());
    hasher.update(INTEGRITY_WHITENER);
    hasher.update(body);
    hasher.finalize().into()
}

fn keystream(password: &SecretBytes, salt: &[u8], len: usize) -> Vec<u8> {
    let mut stream = Vec::with_capacity(len + DIGEST_LEN);
    let mut block: [u8; DIGEST_LEN] = [0; DIGEST_LEN];
    block.copy_from_slice(&salt[..DIGEST_LEN]);
    while stream.len() < len {
        let mut hasher = Sha1::new();
        hasher.update(password.expose_secret());
        hasher.update(block);
        block = hasher.finalize().into();
        stream.extend_from_slice(&block);
    }
    stream.truncate(len);
    stream
}

fn key_check(password: &SecretBytes, plain_key: &[u8]) -> [u8; DIGEST_LEN] {
    let mut hasher = Sha1::new();
    hasher.update(password.expose_secret());
    hasher.update(plain_key);
    hasher.finalize().into()
}

/// salt ‖ (key XOR keystream) ‖ SHA-1(password ‖ key)
fn protect_key(plain_key: &[u8], password: &SecretBytes) -> Vec<u8> {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);

    let stream = keystream(password, &salt, plain_key.len());
    let mut protected = Vec::with_capacity(SALT_LEN + plain_key.len() + DIGEST_LEN);
    protected.extend_from_slice(&salt);
    protected.extend(plain_key.iter().zip(stream.iter()).map(|(k, s)| k ^ s));
    protected.extend_from_slice(&key_check(password, plain_key));
    protected
}

fn unprotect_key(protected: &[u8], password: &SecretBytes) -> Result<SecretBytes> {
    if protected.len() <= SALT_LEN + DIGEST_LEN {
        return Err(format_error("protected key too short"));
    }
    let (salt, rest) = protected.split_at(SALT_LEN);
    let (encrypted, check) = rest.split_at(rest.len() - DIGEST_LEN);

    let stream = keystream(password, salt, encrypted.len());
    let plain = SecretBytes::new(
        encrypted.iter().zip(stream.iter()).map(|(e, s)| e ^ s).collect::<Vec<u8>>(),
    );

    if key_check(password, plain.expose_secret()).as_slice() != check {
        return Err(format_error("private key could not be recovered with the store passphrase"));
    }
    Ok(plain)
}

fn key_protector_oid() -> OID {
    simple_asn1::oid!(1, 3, 6, 1, 4, 1, 42, 2, 17, 1, 1)
}

fn encode_encrypted_private_key_info(protected: Vec<u8>) -> Result<Vec<u8>> {
    let block = ASN1Block::Sequence(
        0,
        vec![
            ASN1Block::Sequence(
                0,
                vec![ASN1Block::ObjectIdentifier(0, key_protector_oid()), ASN1Block::Null(0)],
            ),
            ASN1Block::OctetString(0, protected),
        ],
    );
    simple_asn1::to_der(&block)
        .map_err(|e| format_error(format!("failed to encode private key info: {:?}", e)))
}

fn parse_encrypted_private_key_info(der: &[u8]) -> Result<Vec<u8>> {
    let blocks = simple_asn1::from_der(der)
        .map_err(|e| format_error(format!("invalid EncryptedPrivateKeyInfo: {:?}", e)))?;

    let items = match blocks.first() {
        Some(ASN1Block::Sequence(_, items)) => items,
        _ => return Err(format_error("EncryptedPrivateKeyInfo is not a SEQUENCE")),
    };

    let algorithm = match items.first() {
        Some(ASN1Block::Sequence(_, alg)) => alg,
        _ => return Err(format_error("missing key protection algorithm")),
    };
    let is_sun_protector = match algorithm.first() {
        Some(ASN1Block::ObjectIdentifier(_, oid)) => {
            oid.as_vec::<u64>().map(|c| c == KEY_PROTECTOR_OID).unwrap_or(false)
        }
        _ => false,
    };
    if !is_sun_protector {
        return Err(format_error("unsupported private key protection algorithm"));
    }

    match items.get(1) {
        Some(ASN1Block::OctetString(_, data)) => Ok(data.clone()),
        _ => Err(format_error("missing encrypted key data")),
    }
}

fn write_utf(out: &mut Vec<u8>, value: &str) -> Result<()> {
    let len = u16::try_from(value.len())
        .map_err(|_| format_error(format!("alias too long ({} bytes)", value.len())))?;
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(value.as_bytes());
    Ok(())
}

fn write_blob(out: &mut Vec<u8>, data: &[u8]) -> Result<()> {
    let len = u32::try_from(data.len()).map_err(|_| format_error("entry too large"))?;
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(data);
    Ok(())
}

fn write_certificate(out: &mut Vec<u8>, der: &[u8]) -> Result<()> {
    write_utf(out, CERT_TYPE_X509)?;
    write_blob(out, der)
}

/// Big-endian cursor over keystore bytes.
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    fn bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(len).filter(|end| *end <= self.data.len());
        match end {
            Some(end) => {
                let slice = &self.data[self.pos..end];
                self.pos = end;
                Ok(slice)
            }
            None => Err(format_error("unexpected end of keystore data")),
        }
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        buf.copy_from_slice(self.bytes(N)?);
        Ok(buf)
    }

    fn u32(&mut self) -> Result<u32> {
        Ok(u32::from_be_bytes(self.array()?))
    }

    fn u64(&mut self) -> Result<u64> {
        Ok(u64::from_be_bytes(self.array()?))
    }

    fn utf(&mut self) -> Result<String> {
        let len = u16::from_be_bytes(self.array()?) as usize;
        let raw = self.bytes(len)?;
        String::from_utf8(raw.to_vec()).map_err(|_| format_error("alias is not valid UTF-8"))
    }

    fn certificate(&mut self, version: u32) -> Result<Vec<u8>> {
        if version == VERSION_2 {
            let cert_type = self.utf()?;
            if cert_type != CERT_TYPE_X509 {
                return Err(format_error(format!("unsupported certificate type '{}'", cert_type)));
            }
        }
        let len = self.u32()? as usize;
        Ok(self.bytes(len)?.to_vec())
    }
}
