//! Detached-signature path: base64 signature over the document, checked
//! against the RSA trust anchor under each candidate algorithm.

use base64::Engine as _;
use openssl::rsa::Padding;
use openssl::sign::{RsaPssSaltlen, Verifier};

use crate::domain::error::{EngineError, EngineResult};
use crate::domain::types::{RawVerifyConfig, SigAlgorithm};
use crate::domain::verify::{AlgorithmResult, Outcome, RawVerificationReport};

use super::anchors::TrustAnchor;

/// Stateless verifier bound to one anchor and one candidate set.
#[derive(Debug, Clone)]
pub struct RawSignatureVerifier<'a> {
    anchor: &'a TrustAnchor,
    candidates: Vec<SigAlgorithm>,
}

impl<'a> RawSignatureVerifier<'a> {
    pub fn new(anchor: &'a TrustAnchor, config: &RawVerifyConfig) -> EngineResult<Self> {
        config.validate()?;
        Ok(Self { anchor, candidates: config.candidates.clone() })
    }

    pub fn candidates(&self) -> &[SigAlgorithm] {
        &self.candidates
    }

    /// Evaluate every candidate; never short-circuits.
    ///
    /// A malformed signature is an error: nothing was checked.
    pub fn verify_raw(
        &self,
        document: &[u8],
        signature_b64: impl AsRef<[u8]>,
    ) -> EngineResult<RawVerificationReport> {
        let signature = decode_signature(signature_b64.as_ref())?;

        let results = self
            .candidates
            .iter()
            .map(|&algorithm| {
                let outcome = self.check(algorithm, document, &signature);
                tracing::debug!(%algorithm, verified = outcome.is_verified(), "raw candidate evaluated");
                AlgorithmResult { algorithm, outcome }
            })
            .collect();

        Ok(RawVerificationReport { results })
    }

    fn check(&self, algorithm: SigAlgorithm, document: &[u8], signature: &[u8]) -> Outcome {
        let have = self.anchor.key_family();
        let need = algorithm.key_family();
        if have != need {
            return Outcome::failed(format!(
                "{algorithm} requires a {need} public key, but the trust anchor holds a {have} key"
            ));
        }

        match verify_with(algorithm, self.anchor, document, signature) {
            Ok(true) => Outcome::Verified,
            Ok(false) => Outcome::failed("signature does not match document"),
            Err(e) => Outcome::failed(format!("verification error: {e}")),
        }
    }
}

fn verify_with(
    algorithm: SigAlgorithm,
    anchor: &TrustAnchor,
    document: &[u8],
    signature: &[u8],
) -> Result<bool, openssl::error::ErrorStack> {
    let mut verifier = Verifier::new(algorithm.digest(), anchor.public_key())?;
    if algorithm.is_pss() {
        verifier.set_rsa_padding(Padding::PKCS1_PSS)?;
        verifier.set_rsa_pss_saltlen(RsaPssSaltlen::DIGEST_LENGTH)?;
    }
    verifier.update(document)?;
    verifier.verify(signature)
}

/// Decode the service's base64 signature. Line breaks and other ASCII
/// whitespace are ignored since the service wraps the value.
pub fn decode_signature(signature_b64: &[u8]) -> EngineResult<Vec<u8>> {
    let compact: Vec<u8> = signature_b64
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    if compact.is_empty() {
        return Err(EngineError::SignatureDecode("signature is empty".into()));
    }
    base64::engine::general_purpose::STANDARD
        .decode(&compact)
        .map_err(|e| EngineError::SignatureDecode(e.to_string()))
}
