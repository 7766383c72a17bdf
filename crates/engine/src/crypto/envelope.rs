//! Enveloped-signature path: a PKCS#7 signed-data blob carrying both the
//! document and its signature, verified against the envelope trust anchor.

use openssl::error::ErrorStack;
use openssl::pkcs7::{Pkcs7, Pkcs7Flags, Pkcs7Ref};
use openssl::stack::Stack;
use openssl::x509::store::X509StoreBuilder;
use openssl::x509::X509;

use crate::domain::error::{EngineError, EngineResult};
use crate::domain::verify::{EnvelopeVerificationReport, Outcome};

use super::anchors::TrustAnchor;

const ARMOR_TAG: &str = "PKCS7";

/// Stateless verifier bound to the envelope anchor.
#[derive(Debug, Clone, Copy)]
pub struct EnvelopeSignatureVerifier<'a> {
    anchor: &'a TrustAnchor,
}

impl<'a> EnvelopeSignatureVerifier<'a> {
    pub fn new(anchor: &'a TrustAnchor) -> Self {
        Self { anchor }
    }

    /// `envelope` is the base64 body as served, without armor lines.
    pub fn verify_envelope(&self, envelope: &[u8]) -> EngineResult<EnvelopeVerificationReport> {
        let der = decode_armored(&armor(envelope)?)?;
        let p7 = Pkcs7::from_der(&der)
            .map_err(|e| EngineError::EnvelopeFormat(format!("PKCS#7 parse: {e}")))?;
        // d2i stops after the first element and ignores anything behind it.
        if encoded_len(&der, 0) != Some(der.len()) {
            return Err(EngineError::EnvelopeFormat(
                "unexpected trailing bytes after the PKCS#7 structure".into(),
            ));
        }

        let Some(signed) = p7.signed() else {
            return Ok(EnvelopeVerificationReport {
                outcome: Outcome::failed("envelope is not PKCS#7 signed-data"),
                content: None,
                embedded_certificates: 0,
            });
        };
        let embedded_certificates = signed.certificates().map_or(0, |c| c.len());
        if embedded_certificates > 0 {
            tracing::debug!(embedded_certificates, "ignoring certificates carried by the envelope");
        }

        let report = match self.verify_against_anchor(&p7) {
            Ok(content) => EnvelopeVerificationReport {
                outcome: Outcome::Verified,
                content: Some(content),
                embedded_certificates,
            },
            Err(e) => EnvelopeVerificationReport {
                outcome: Outcome::failed(e.to_string()),
                content: self.recover_unverified_content(&p7),
                embedded_certificates,
            },
        };
        Ok(report)
    }

    /// Trust override: discard any certificates carried by the envelope and
    /// verify only against the externally supplied anchor. `NOINTERN` keeps
    /// OpenSSL from looking at the embedded set; `NOVERIFY` skips chain
    /// building because the anchor is itself the root.
    fn verify_against_anchor(&self, p7: &Pkcs7Ref) -> Result<Vec<u8>, ErrorStack> {
        let signers = pinned_signer_set(self.anchor)?;
        let store = X509StoreBuilder::new()?.build();
        let mut content = Vec::new();
        p7.verify(
            &signers,
            &store,
            None,
            Some(&mut content),
            Pkcs7Flags::NOINTERN | Pkcs7Flags::NOVERIFY,
        )?;
        Ok(content)
    }

    /// Pull the payload out without checking the signature, so a caller can
    /// see what a rejected envelope claimed. Never trusted.
    fn recover_unverified_content(&self, p7: &Pkcs7Ref) -> Option<Vec<u8>> {
        let attempt = || -> Result<Vec<u8>, ErrorStack> {
            let signers = pinned_signer_set(self.anchor)?;
            let store = X509StoreBuilder::new()?.build();
            let mut content = Vec::new();
            p7.verify(
                &signers,
                &store,
                None,
                Some(&mut content),
                Pkcs7Flags::NOSIGS | Pkcs7Flags::NOVERIFY,
            )?;
            Ok(content)
        };
        match attempt() {
            Ok(content) => Some(content),
            Err(e) => {
                tracing::warn!(error = %e, "could not recover envelope content");
                None
            }
        }
    }
}

/// The only certificate verification may use: the trust anchor.
fn pinned_signer_set(anchor: &TrustAnchor) -> Result<Stack<X509>, ErrorStack> {
    let mut signers = Stack::new()?;
    signers.push(anchor.certificate().clone())?;
    Ok(signers)
}

const MAX_NESTING: usize = 64;

/// Byte length of the first BER element in `buf`, header included.
/// Handles the indefinite-length form the metadata service emits.
fn encoded_len(buf: &[u8], depth: usize) -> Option<usize> {
    if depth > MAX_NESTING {
        return None;
    }
    let first = *buf.first()?;
    let mut pos = 1;
    if first & 0x1f == 0x1f {
        // high tag number form
        loop {
            let b = *buf.get(pos)?;
            pos += 1;
            if b & 0x80 == 0 {
                break;
            }
        }
    }
    let len_byte = *buf.get(pos)?;
    pos += 1;

    if len_byte == 0x80 {
        if first & 0x20 == 0 {
            return None;
        }
        loop {
            let rest = buf.get(pos..)?;
            if rest.starts_with(&[0, 0]) {
                return Some(pos + 2);
            }
            pos += encoded_len(rest, depth + 1)?;
        }
    }

    let len = if len_byte & 0x80 == 0 {
        usize::from(len_byte)
    } else {
        let n = usize::from(len_byte & 0x7f);
        if n > std::mem::size_of::<usize>() {
            return None;
        }
        let bytes = buf.get(pos..pos.checked_add(n)?)?;
        pos += n;
        bytes
            .iter()
            .try_fold(0usize, |acc, &b| acc.checked_mul(256)?.checked_add(usize::from(b)))?
    };
    let end = pos.checked_add(len)?;
    (end <= buf.len()).then_some(end)
}

/// Wrap the served body in PKCS7 armor.
pub fn armor(body: &[u8]) -> EngineResult<String> {
    let text = std::str::from_utf8(body)
        .map_err(|_| EngineError::EnvelopeFormat("envelope is not valid UTF-8".into()))?
        .trim();
    if text.is_empty() {
        return Err(EngineError::EnvelopeFormat("envelope is empty".into()));
    }
    if text.contains("-----") {
        return Err(EngineError::EnvelopeFormat("envelope must not carry PEM armor".into()));
    }
    Ok(format!("-----BEGIN {ARMOR_TAG}-----\n{text}\n-----END {ARMOR_TAG}-----\n"))
}

/// Decode armored text that must hold exactly one PKCS7 block.
pub fn decode_armored(armored: &str) -> EngineResult<Vec<u8>> {
    let mut blocks = pem::parse_many(armored)
        .map_err(|e| EngineError::EnvelopeFormat(format!("armor decode: {e}")))?;
    if blocks.len() != 1 {
        return Err(EngineError::EnvelopeFormat(format!(
            "expected exactly one {ARMOR_TAG} block, found {}",
            blocks.len()
        )));
    }
    let block = blocks.remove(0);
    if block.tag() != ARMOR_TAG {
        return Err(EngineError::EnvelopeFormat(format!("unexpected block '{}'", block.tag())));
    }
    Ok(block.into_contents())
}
