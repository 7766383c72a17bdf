//! Fixed trust anchors for both verification paths.
//!
//! The certificates are compiled in. Changing them means rebuilding, which is
//! what we want for an audited root of trust.

use once_cell::sync::OnceCell;
use openssl::hash::MessageDigest;
use openssl::pkey::{Id, PKey, Public};
use openssl::x509::{X509NameRef, X509};
use serde::Serialize;

use crate::domain::error::{EngineError, EngineResult};
use crate::domain::types::KeyFamily;

const RSA_ANCHOR_PEM: &str = include_str!("../../certs/aws-iid-rsa.pem");
const ENVELOPE_ANCHOR_PEM: &str = include_str!("../../certs/aws-iid-pkcs7.pem");

static EMBEDDED: OnceCell<TrustAnchorStore> = OnceCell::new();

/// Summary of a trust anchor for reports and audits.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct AnchorInfo {
    pub name: &'static str,
    pub subject: String,
    pub issuer: String,
    pub serial: String,
    pub key_family: KeyFamily,
    /// Lowercase hex SHA-256 over the DER encoding.
    pub sha256_fingerprint: String,
}

/// A parsed, immutable trust anchor.
#[derive(Debug)]
pub struct TrustAnchor {
    cert: X509,
    key: PKey<Public>,
    info: AnchorInfo,
}

impl TrustAnchor {
    fn from_pem(name: &'static str, pem_text: &[u8]) -> EngineResult<Self> {
        let corrupt = |reason: String| EngineError::TrustAnchorCorrupt { anchor: name, reason };

        let block = pem::parse(pem_text).map_err(|e| corrupt(format!("PEM decode: {e}")))?;
        if block.tag() != "CERTIFICATE" {
            return Err(corrupt(format!("expected a CERTIFICATE block, found '{}'", block.tag())));
        }
        let cert = X509::from_der(block.contents())
            .map_err(|e| corrupt(format!("certificate parse: {e}")))?;
        let key = cert
            .public_key()
            .map_err(|e| corrupt(format!("public key: {e}")))?;
        let fingerprint = cert
            .digest(MessageDigest::sha256())
            .map_err(|e| corrupt(format!("fingerprint: {e}")))?;
        let serial = cert
            .serial_number()
            .to_bn()
            .and_then(|bn| bn.to_hex_str().map(|s| s.to_ascii_lowercase()))
            .map_err(|e| corrupt(format!("serial number: {e}")))?;

        let info = AnchorInfo {
            name,
            subject: name_to_string(cert.subject_name()),
            issuer: name_to_string(cert.issuer_name()),
            serial,
            key_family: key_family(&key),
            sha256_fingerprint: hex::encode(&*fingerprint),
        };

        Ok(Self { cert, key, info })
    }

    pub fn certificate(&self) -> &X509 {
        &self.cert
    }

    pub fn public_key(&self) -> &PKey<Public> {
        &self.key
    }

    pub fn key_family(&self) -> KeyFamily {
        self.info.key_family
    }

    pub fn info(&self) -> &AnchorInfo {
        &self.info
    }
}

/// The two anchors, one per verification path. Built once, read-only after.
#[derive(Debug)]
pub struct TrustAnchorStore {
    rsa: TrustAnchor,
    envelope: TrustAnchor,
}

impl TrustAnchorStore {
    /// Process-wide store over the compiled-in certificates.
    ///
    /// A `TrustAnchorCorrupt` error here means the build is broken and the
    /// caller must stop.
    pub fn embedded() -> EngineResult<&'static TrustAnchorStore> {
        EMBEDDED.get_or_try_init(|| {
            let store = Self::from_pem(RSA_ANCHOR_PEM, ENVELOPE_ANCHOR_PEM)?;
            tracing::debug!(
                rsa = %store.rsa.info.sha256_fingerprint,
                envelope = %store.envelope.info.sha256_fingerprint,
                "embedded trust anchors loaded"
            );
            Ok(store)
        })
    }

    /// Store over caller-supplied PEM certificates.
    pub fn from_pem(rsa_pem: impl AsRef<[u8]>, envelope_pem: impl AsRef<[u8]>) -> EngineResult<Self> {
        Ok(Self {
            rsa: TrustAnchor::from_pem("rsa", rsa_pem.as_ref())?,
            envelope: TrustAnchor::from_pem("envelope", envelope_pem.as_ref())?,
        })
    }

    pub fn rsa_anchor(&self) -> &TrustAnchor {
        &self.rsa
    }

    pub fn envelope_anchor(&self) -> &TrustAnchor {
        &self.envelope
    }
}

fn key_family(key: &PKey<Public>) -> KeyFamily {
    match key.id() {
        Id::RSA => KeyFamily::Rsa,
        Id::DSA => KeyFamily::Dsa,
        Id::EC => KeyFamily::Ec,
        _ => KeyFamily::Other,
    }
}

fn name_to_string(name: &X509NameRef) -> String {
    name.entries()
        .map(|entry| {
            let key = entry.object().nid().short_name().unwrap_or("?");
            let value = String::from_utf8_lossy(entry.data().as_slice());
            format!("{key}={value}")
        })
        .collect::<Vec<_>>()
        .join(", ")
}
