#![allow(dead_code)]

use std::collections::HashMap;

use base64::Engine as _;
use openssl::asn1::Asn1Time;
use openssl::bn::BigNum;
use openssl::dsa::Dsa;
use openssl::hash::MessageDigest;
use openssl::pkcs7::{Pkcs7, Pkcs7Flags};
use openssl::pkey::{PKey, Private};
use openssl::rsa::{Padding, Rsa};
use openssl::sign::{RsaPssSaltlen, Signer};
use openssl::stack::Stack;
use openssl::x509::{X509Builder, X509NameBuilder, X509};
use rcgen::{Certificate, CertificateParams, KeyPair};

use iid_engine::{ByteFetcher, FetchError, IdentityEndpoints, TrustAnchorStore};

pub const DOCUMENT: &[u8] = br#"{
  "accountId" : "123456789012",
  "architecture" : "x86_64",
  "availabilityZone" : "eu-west-1b",
  "imageId" : "ami-0abcdef1234567890",
  "instanceId" : "i-0123456789abcdef0",
  "instanceType" : "m5.large",
  "pendingTime" : "2026-10-01T08:00:00Z",
  "privateIp" : "172.31.4.17",
  "region" : "eu-west-1",
  "version" : "2017-09-30"
}"#;

/// A certificate with its private key.
pub struct TestIdentity {
    pub cert: X509,
    pub key: PKey<Private>,
}

impl TestIdentity {
    pub fn cert_pem(&self) -> Vec<u8> {
        self.cert.to_pem().expect("cert pem")
    }
}

fn self_signed(key: PKey<Private>, cn: &str, serial: u32) -> TestIdentity {
    let mut name = X509NameBuilder::new().expect("name builder");
    name.append_entry_by_text("O", "iid-engine tests").expect("O");
    name.append_entry_by_text("CN", cn).expect("CN");
    let name = name.build();
    issued_as(key, &name, serial)
}

fn issued_as(key: PKey<Private>, name: &openssl::x509::X509NameRef, serial: u32) -> TestIdentity {
    let mut builder = X509Builder::new().expect("x509 builder");
    builder.set_version(2).expect("version");
    let serial = BigNum::from_u32(serial).and_then(|bn| bn.to_asn1_integer()).expect("serial");
    builder.set_serial_number(&serial).expect("set serial");
    builder.set_subject_name(name).expect("subject");
    builder.set_issuer_name(name).expect("issuer");
    builder.set_pubkey(&key).expect("pubkey");
    builder.set_not_before(&Asn1Time::days_from_now(0).expect("nbf")).expect("set nbf");
    builder.set_not_after(&Asn1Time::days_from_now(365).expect("naf")).expect("set naf");
    builder.sign(&key, MessageDigest::sha256()).expect("sign cert");
    TestIdentity { cert: builder.build(), key }
}

/// RSA anchor standing in for the raw-path certificate.
pub fn rsa_identity(cn: &str) -> TestIdentity {
    let key = PKey::from_rsa(Rsa::generate(2048).expect("rsa")).expect("pkey");
    self_signed(key, cn, 1001)
}

/// DSA anchor, the key type the provider uses for the envelope path.
pub fn dsa_identity(cn: &str) -> TestIdentity {
    let key = PKey::from_dsa(Dsa::generate(2048).expect("dsa")).expect("pkey");
    self_signed(key, cn, 2002)
}

/// A different key that claims the same issuer and serial as `victim`.
pub fn impersonating_identity(victim: &TestIdentity) -> TestIdentity {
    let key = PKey::from_rsa(Rsa::generate(2048).expect("rsa")).expect("pkey");
    let serial = victim.cert.serial_number().to_bn().expect("bn");
    let serial: u32 = serial.to_dec_str().expect("dec").parse().expect("u32 serial");
    issued_as(key, victim.cert.subject_name(), serial)
}

/// Generate an ES256 self-signed certificate and key in PEM format using rcgen.
pub fn generate_es256_pem_pair() -> (String, String) {
    let alg = &rcgen::PKCS_ECDSA_P256_SHA256;
    let key = KeyPair::generate(alg).expect("keypair");
    let mut params = CertificateParams::new(vec![]);
    params.alg = alg;
    params.key_usages = vec![rcgen::KeyUsagePurpose::DigitalSignature];
    params.key_pair = Some(key);
    let cert = Certificate::from_params(params).expect("cert");
    let cert_pem = cert.serialize_pem().expect("cert pem");
    let key_pem = cert.serialize_private_key_pem();
    (cert_pem, key_pem)
}

/// Self-issued ECDSA signer unrelated to any trust anchor.
pub fn rogue_identity() -> TestIdentity {
    let (cert_pem, key_pem) = generate_es256_pem_pair();
    TestIdentity {
        cert: X509::from_pem(cert_pem.as_bytes()).expect("rogue cert"),
        key: PKey::private_key_from_pem(key_pem.as_bytes()).expect("rogue key"),
    }
}

pub fn store(rsa: &TestIdentity, envelope: &TestIdentity) -> TrustAnchorStore {
    TrustAnchorStore::from_pem(rsa.cert_pem(), envelope.cert_pem()).expect("test store")
}

/// Base64 signature wrapped at 64 columns, the way the service serves it.
pub fn sign_raw(signer: &TestIdentity, digest: MessageDigest, pss: bool, document: &[u8]) -> String {
    let mut s = Signer::new(digest, &signer.key).expect("signer");
    if pss {
        s.set_rsa_padding(Padding::PKCS1_PSS).expect("pss");
        s.set_rsa_pss_saltlen(RsaPssSaltlen::DIGEST_LENGTH).expect("saltlen");
    }
    s.update(document).expect("update");
    let sig = s.sign_to_vec().expect("sign");
    let b64 = base64::engine::general_purpose::STANDARD.encode(sig);
    b64.as_bytes()
        .chunks(64)
        .map(|c| std::str::from_utf8(c).expect("ascii"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// PKCS#7 signed-data over `content`, returned without armor lines.
pub fn sign_envelope(signer: &TestIdentity, content: &[u8], embed_cert: bool) -> Vec<u8> {
    let extra = Stack::new().expect("stack");
    let mut flags = Pkcs7Flags::BINARY;
    if !embed_cert {
        flags |= Pkcs7Flags::NOCERTS;
    }
    let p7 = Pkcs7::sign(&signer.cert, &signer.key, &extra, content, flags).expect("pkcs7 sign");
    strip_armor(&p7.to_pem().expect("pkcs7 pem"))
}

pub fn strip_armor(pem_text: &[u8]) -> Vec<u8> {
    let text = std::str::from_utf8(pem_text).expect("pem utf8");
    text.lines()
        .filter(|l| !l.starts_with("-----"))
        .collect::<Vec<_>>()
        .join("\n")
        .into_bytes()
}

/// In-memory `ByteFetcher`; missing locators fail like a 404.
#[derive(Default)]
pub struct MapFetcher {
    pub entries: HashMap<String, Vec<u8>>,
}

impl MapFetcher {
    pub fn with(mut self, uri: &str, body: impl Into<Vec<u8>>) -> Self {
        self.entries.insert(uri.to_string(), body.into());
        self
    }
}

impl ByteFetcher for MapFetcher {
    fn fetch(&self, uri: &str) -> Result<Vec<u8>, FetchError> {
        self.entries
            .get(uri)
            .cloned()
            .ok_or_else(|| FetchError::Status { uri: uri.to_string(), status: 404 })
    }
}

pub fn test_endpoints() -> IdentityEndpoints {
    IdentityEndpoints::imds("http://169.254.169.254")
}
